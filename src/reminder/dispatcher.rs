use serde::Deserialize;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::io::Write;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::reminder::alarm::ReminderPayload;

pub const REMINDER_CHANNEL_ID: &str = "task_channel";
pub const REMINDER_CHANNEL_NAME: &str = "Task Reminders";
pub const REMINDER_TITLE: &str = "goaldo reminder";
const FALLBACK_TASK_TITLE: &str = "Task Reminder";

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Failed to write notification: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Unknown notification channel: {0}")]
    UnknownChannel(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Importance {
    Default,
    High,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationChannel {
    pub id: String,
    pub name: String,
    pub importance: Importance,
}

impl NotificationChannel {
    pub fn reminders() -> Self {
        Self {
            id: REMINDER_CHANNEL_ID.to_string(),
            name: REMINDER_CHANNEL_NAME.to_string(),
            importance: Importance::High,
        }
    }
}

/// What happens when the user activates a notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TapAction {
    /// Bring the app up on its start screen
    OpenApp { command: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub channel_id: String,
    pub title: String,
    pub body: String,
    pub tap_action: TapAction,
    pub auto_cancel: bool,
}

/// Notification delivery collaborator.
/// Posting under an existing key replaces what is shown for that key.
pub trait Notifier {
    /// Create the channel if it does not exist yet
    fn ensure_channel(&self, channel: &NotificationChannel) -> Result<(), NotifyError>;

    fn post(&self, key: i64, notification: &Notification) -> Result<(), NotifyError>;
}

/// Payload as read off the wire. Fields may be missing in hand-edited or old rows.
#[derive(Debug, Deserialize)]
struct RawPayload {
    task_id: Option<i64>,
    title: Option<String>,
}

/// Decode a delivery payload.
/// No task id means nothing to show; a missing title gets a generic one.
pub fn decode_payload(raw: &str) -> Option<ReminderPayload> {
    let parsed: RawPayload = match serde_json::from_str(raw) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!(error = %e, "unreadable reminder payload");
            return None;
        }
    };
    let task_id = parsed.task_id?;
    Some(ReminderPayload {
        task_id,
        title: parsed.title.unwrap_or_else(|| FALLBACK_TASK_TITLE.to_string()),
    })
}

/// Turns fired alarms into user-visible notifications.
///
/// Works only from the payload snapshot; it never looks the task up, so it
/// can run from a cold process. Delivery is fire-and-forget.
pub struct ReminderDispatcher<N: Notifier> {
    notifier: N,
    notifications_enabled: bool,
    open_command: String,
}

impl<N: Notifier> ReminderDispatcher<N> {
    pub fn new(notifier: N, notifications_enabled: bool) -> Self {
        Self {
            notifier,
            notifications_enabled,
            open_command: "goaldo".to_string(),
        }
    }

    pub fn with_open_command(mut self, command: impl Into<String>) -> Self {
        self.open_command = command.into();
        self
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Handle a raw payload delivered by the alarm facility.
    /// Returns whether a notification was posted.
    pub fn dispatch(&self, raw_payload: &str) -> bool {
        match decode_payload(raw_payload) {
            Some(payload) => self.dispatch_payload(&payload),
            None => {
                debug!("reminder payload without task id, nothing to show");
                false
            }
        }
    }

    pub fn dispatch_payload(&self, payload: &ReminderPayload) -> bool {
        if !self.notifications_enabled {
            info!(task_id = payload.task_id, "notifications disabled in settings, reminder not shown");
            return false;
        }

        let channel = NotificationChannel::reminders();
        if let Err(e) = self.notifier.ensure_channel(&channel) {
            warn!(error = %e, "failed to create reminder channel");
            return false;
        }

        let notification = Notification {
            channel_id: channel.id,
            title: REMINDER_TITLE.to_string(),
            body: payload.title.clone(),
            tap_action: TapAction::OpenApp {
                command: self.open_command.clone(),
            },
            auto_cancel: true,
        };

        match self.notifier.post(payload.task_id, &notification) {
            Ok(()) => {
                info!(task_id = payload.task_id, "reminder shown");
                true
            }
            Err(e) => {
                warn!(task_id = payload.task_id, error = %e, "failed to show reminder");
                false
            }
        }
    }
}

/// Notifier that prints reminders to a terminal stream.
///
/// Keeps the currently shown notification per key in memory only.
pub struct TerminalNotifier<W: Write> {
    out: RefCell<W>,
    channels: RefCell<HashSet<String>>,
    shown: RefCell<HashMap<i64, Notification>>,
}

impl<W: Write> TerminalNotifier<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: RefCell::new(out),
            channels: RefCell::new(HashSet::new()),
            shown: RefCell::new(HashMap::new()),
        }
    }

    pub fn shown(&self) -> HashMap<i64, Notification> {
        self.shown.borrow().clone()
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }
}

impl<W: Write> Notifier for TerminalNotifier<W> {
    fn ensure_channel(&self, channel: &NotificationChannel) -> Result<(), NotifyError> {
        if self.channels.borrow_mut().insert(channel.id.clone()) {
            debug!(channel = %channel.id, "created notification channel");
        }
        Ok(())
    }

    fn post(&self, key: i64, notification: &Notification) -> Result<(), NotifyError> {
        if !self.channels.borrow().contains(&notification.channel_id) {
            return Err(NotifyError::UnknownChannel(notification.channel_id.clone()));
        }
        let TapAction::OpenApp { command } = &notification.tap_action;
        {
            let mut out = self.out.borrow_mut();
            writeln!(
                out,
                "\x07[{}] {} (task #{}, open with `{}`)",
                notification.title, notification.body, key, command
            )?;
            out.flush()?;
        }
        self.shown.borrow_mut().insert(key, notification.clone());
        Ok(())
    }
}
