use chrono::{DateTime, Utc};
use std::rc::Rc;
use tracing::{debug, error, warn};

use crate::models::Task;
use crate::reminder::alarm::{AlarmRegistry, ReminderPayload};
use crate::reminder::trigger::derive_trigger_time;

/// Source of "now" for scheduling decisions
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Why `schedule` left the alarm registry untouched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Neither a due date nor an explicit trigger time
    NothingToSchedule,
    /// Trigger at or before now
    TriggerInPast,
    /// Exact alarms are not currently allowed
    PermissionDenied,
    /// The registry refused or failed the registration
    RegistrationFailed,
    /// Task was never persisted
    MissingId,
}

/// What `schedule` did for one task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleOutcome {
    Scheduled(DateTime<Utc>),
    Cancelled,
    Skipped(SkipReason),
}

/// Turns a task's reminder settings into zero or one registered alarm.
///
/// Every call recomputes the target state from the task alone, so repeated
/// calls with the same input converge on the same registry state. Nothing
/// here returns an error: failures are logged and reported as an outcome.
pub struct ReminderScheduler {
    alarms: Rc<dyn AlarmRegistry>,
    clock: Rc<dyn Clock>,
}

impl ReminderScheduler {
    pub fn new(alarms: Rc<dyn AlarmRegistry>, clock: Rc<dyn Clock>) -> Self {
        Self { alarms, clock }
    }

    pub fn schedule(&self, task: &Task) -> ScheduleOutcome {
        if !task.has_notification {
            return self.cancel(task);
        }

        if task.notification_time.is_none() && task.due_date.is_none() {
            return ScheduleOutcome::Skipped(SkipReason::NothingToSchedule);
        }

        if task.is_completed || task.is_deleted {
            return self.cancel(task);
        }

        let Some(id) = task.id else {
            warn!(title = %task.title, "cannot schedule reminder for unsaved task");
            return ScheduleOutcome::Skipped(SkipReason::MissingId);
        };

        let Some(trigger_at) = derive_trigger_time(task.notification_time, task.due_date) else {
            return ScheduleOutcome::Skipped(SkipReason::NothingToSchedule);
        };

        let now = self.clock.now();
        if trigger_at <= now {
            debug!(task_id = id, %trigger_at, %now, "reminder trigger already passed, not scheduling");
            return ScheduleOutcome::Skipped(SkipReason::TriggerInPast);
        }

        if !self.alarms.can_schedule_exact() {
            warn!(task_id = id, "cannot schedule exact alarms, permission missing; reminder skipped");
            return ScheduleOutcome::Skipped(SkipReason::PermissionDenied);
        }

        let payload = ReminderPayload {
            task_id: id,
            title: task.title.clone(),
        };
        match self.alarms.register_one_shot(id, trigger_at, &payload) {
            Ok(()) => {
                debug!(task_id = id, %trigger_at, "scheduled reminder");
                ScheduleOutcome::Scheduled(trigger_at)
            }
            Err(e) => {
                error!(task_id = id, error = %e, "failed to schedule reminder");
                ScheduleOutcome::Skipped(SkipReason::RegistrationFailed)
            }
        }
    }

    /// Remove any alarm registered for this task. Safe to repeat.
    pub fn cancel(&self, task: &Task) -> ScheduleOutcome {
        if let Some(id) = task.id {
            self.cancel_by_id(id);
        }
        ScheduleOutcome::Cancelled
    }

    pub fn cancel_by_id(&self, task_id: i64) {
        match self.alarms.cancel(task_id) {
            Ok(()) => debug!(task_id, "cancelled reminder"),
            Err(e) => error!(task_id, error = %e, "failed to cancel reminder"),
        }
    }
}
