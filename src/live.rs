//! Live query results.
//!
//! Every committed write on the [`Database`] publishes the table it touched on a
//! [`ChangeFeed`]. A [`LiveQuery`] subscribes to the tables it reads and re-runs
//! its query only after one of them changed. Signals are carried by a
//! `bounded(1)` channel per subscriber, so several writes between two polls
//! collapse into a single refresh that sees the latest state.
//!
//! Writes from another connection (a second process on the same file) never
//! reach the feed. They are caught through SQLite's `data_version` counter,
//! checked on every poll.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use std::cell::RefCell;
use std::rc::Rc;
use tracing::warn;

use crate::database::{Database, DatabaseError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Tasks,
    Goals,
    SubTasks,
}

struct Subscriber {
    tables: Vec<Table>,
    signal: Sender<()>,
}

#[derive(Default)]
pub struct ChangeFeed {
    subscribers: RefCell<Vec<Subscriber>>,
}

impl ChangeFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register interest in a set of tables
    pub fn subscribe(&self, tables: &[Table]) -> Subscription {
        let (signal, receiver) = bounded(1);
        self.subscribers.borrow_mut().push(Subscriber {
            tables: tables.to_vec(),
            signal,
        });
        Subscription { receiver }
    }

    /// Signal every subscriber interested in `table`.
    /// Subscribers whose receiving side was dropped are removed here.
    pub fn publish(&self, table: Table) {
        self.subscribers.borrow_mut().retain(|subscriber| {
            if !subscriber.tables.contains(&table) {
                return true;
            }
            match subscriber.signal.try_send(()) {
                Ok(()) | Err(TrySendError::Full(())) => true,
                Err(TrySendError::Disconnected(())) => false,
            }
        });
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.borrow().len()
    }
}

/// Receiving half of a feed registration. Dropping it unsubscribes.
pub struct Subscription {
    receiver: Receiver<()>,
}

impl Subscription {
    /// Consume a pending change signal, if any
    pub fn has_changed(&self) -> bool {
        self.receiver.try_recv().is_ok()
    }
}

type QueryFn<T> = Box<dyn Fn(&Database) -> Result<T, DatabaseError>>;

pub struct LiveQuery<T> {
    db: Rc<Database>,
    query: QueryFn<T>,
    subscription: Subscription,
    primed: bool,
    seen_version: Option<i64>,
}

impl<T> LiveQuery<T> {
    pub fn new<F>(db: Rc<Database>, tables: &[Table], query: F) -> Self
    where
        F: Fn(&Database) -> Result<T, DatabaseError> + 'static,
    {
        let subscription = db.changes().subscribe(tables);
        Self {
            db,
            query: Box::new(query),
            subscription,
            primed: false,
            seen_version: None,
        }
    }

    /// Run the query now, regardless of pending changes
    pub fn current(&self) -> Result<T, DatabaseError> {
        (self.query)(&self.db)
    }

    /// Initial result on the first call, then a new result only when a
    /// subscribed table changed since the previous poll. Commits from other
    /// connections to the same file count as a change to every table.
    pub fn poll(&mut self) -> Option<Result<T, DatabaseError>> {
        let external = self.external_write();
        if !self.primed {
            self.primed = true;
            self.subscription.has_changed();
            return Some(self.current());
        }
        if self.subscription.has_changed() || external {
            Some(self.current())
        } else {
            None
        }
    }

    /// Whether another connection committed since the last check
    fn external_write(&mut self) -> bool {
        let version = match self.db.data_version() {
            Ok(version) => version,
            Err(e) => {
                warn!(error = %e, "failed to read data version");
                return false;
            }
        };
        let changed = self.seen_version.is_some_and(|seen| seen != version);
        self.seen_version = Some(version);
        changed
    }
}
