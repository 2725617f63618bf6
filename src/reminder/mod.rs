//! Local task reminders: trigger derivation, alarm registration and delivery.

pub mod alarm;
pub mod dispatcher;
pub mod runner;
pub mod scheduler;
pub mod trigger;

pub use alarm::{AlarmError, AlarmRegistry, PendingAlarm, ReminderPayload, SqliteAlarmRegistry};
pub use dispatcher::{
    Notification, NotificationChannel, Notifier, NotifyError, ReminderDispatcher, TapAction, TerminalNotifier,
};
pub use runner::{stop_on_interrupt, AlarmRunner};
pub use scheduler::{Clock, ReminderScheduler, ScheduleOutcome, SkipReason, SystemClock};
pub use trigger::{derive_trigger_time, DEFAULT_REMINDER_LEAD};
