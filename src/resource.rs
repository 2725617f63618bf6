use crate::database::DatabaseError;
use crate::live::LiveQuery;

/// State of an asynchronous read as seen by the presentation layer
#[derive(Debug, Clone, PartialEq)]
pub enum Resource<T> {
    Loading,
    Success(T),
    Error { message: String },
}

impl<T> Resource<T> {
    /// Data of a `Success`, `None` otherwise
    pub fn data(&self) -> Option<&T> {
        match self {
            Resource::Success(data) => Some(data),
            _ => None,
        }
    }

    pub fn into_data(self) -> Option<T> {
        match self {
            Resource::Success(data) => Some(data),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Resource::Loading)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Resource::Success(_))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Resource::Error { .. })
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, transform: F) -> Resource<U> {
        match self {
            Resource::Loading => Resource::Loading,
            Resource::Success(data) => Resource::Success(transform(data)),
            Resource::Error { message } => Resource::Error { message },
        }
    }
}

impl<T> From<Result<T, DatabaseError>> for Resource<T> {
    fn from(result: Result<T, DatabaseError>) -> Self {
        match result {
            Ok(data) => Resource::Success(data),
            Err(e) => Resource::Error {
                message: e.to_string(),
            },
        }
    }
}

/// Live query wrapped in `Resource` states: `Loading` first, then one
/// `Success` or `Error` per refresh.
pub struct ResourceStream<T> {
    query: LiveQuery<T>,
    started: bool,
}

impl<T> ResourceStream<T> {
    pub fn new(query: LiveQuery<T>) -> Self {
        Self {
            query,
            started: false,
        }
    }

    /// Next state, or `None` when nothing changed since the last call
    pub fn next_state(&mut self) -> Option<Resource<T>> {
        if !self.started {
            self.started = true;
            return Some(Resource::Loading);
        }
        self.query.poll().map(Resource::from)
    }
}
