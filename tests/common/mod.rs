#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

use goaldo::database::Database;
use goaldo::reminder::{
    AlarmError, AlarmRegistry, Clock, Notification, NotificationChannel, Notifier, NotifyError, ReminderPayload,
    ReminderScheduler,
};
use goaldo::repository::TaskRepository;

/// 2030-01-15 12:00 UTC, far enough ahead that wall-clock code never sees it as past
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2030, 1, 15, 12, 0, 0).unwrap()
}

pub struct FixedClock {
    now: Cell<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { now: Cell::new(now) }
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.get()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegisteredAlarm {
    pub trigger_at: DateTime<Utc>,
    pub payload: ReminderPayload,
}

/// In-memory alarm facility that records every call
#[derive(Default)]
pub struct RecordingAlarms {
    pub alarms: RefCell<BTreeMap<i64, RegisteredAlarm>>,
    pub registrations: Cell<usize>,
    pub cancellations: RefCell<Vec<i64>>,
    pub permission_denied: Cell<bool>,
    pub fail_registration: Cell<bool>,
}

impl RecordingAlarms {
    pub fn get(&self, key: i64) -> Option<RegisteredAlarm> {
        self.alarms.borrow().get(&key).cloned()
    }

    pub fn len(&self) -> usize {
        self.alarms.borrow().len()
    }
}

impl AlarmRegistry for RecordingAlarms {
    fn can_schedule_exact(&self) -> bool {
        !self.permission_denied.get()
    }

    fn register_one_shot(
        &self,
        key: i64,
        trigger_at: DateTime<Utc>,
        payload: &ReminderPayload,
    ) -> Result<(), AlarmError> {
        if self.fail_registration.get() {
            return Err(AlarmError::Rejected("test failure".to_string()));
        }
        self.registrations.set(self.registrations.get() + 1);
        self.alarms.borrow_mut().insert(
            key,
            RegisteredAlarm {
                trigger_at,
                payload: payload.clone(),
            },
        );
        Ok(())
    }

    fn cancel(&self, key: i64) -> Result<(), AlarmError> {
        self.cancellations.borrow_mut().push(key);
        self.alarms.borrow_mut().remove(&key);
        Ok(())
    }
}

/// Notifier that keeps what it was asked to show
#[derive(Default)]
pub struct RecordingNotifier {
    pub channels: RefCell<Vec<NotificationChannel>>,
    pub posted: RefCell<Vec<(i64, Notification)>>,
    pub fail_posts: Cell<bool>,
}

impl Notifier for RecordingNotifier {
    fn ensure_channel(&self, channel: &NotificationChannel) -> Result<(), NotifyError> {
        let mut channels = self.channels.borrow_mut();
        if !channels.iter().any(|c| c.id == channel.id) {
            channels.push(channel.clone());
        }
        Ok(())
    }

    fn post(&self, key: i64, notification: &Notification) -> Result<(), NotifyError> {
        if self.fail_posts.get() {
            return Err(NotifyError::UnknownChannel(notification.channel_id.clone()));
        }
        self.posted.borrow_mut().push((key, notification.clone()));
        Ok(())
    }
}

pub struct Harness {
    pub db: Rc<Database>,
    pub alarms: Rc<RecordingAlarms>,
    pub clock: Rc<FixedClock>,
    pub scheduler: Rc<ReminderScheduler>,
    pub tasks: TaskRepository,
}

/// In-memory database with a recording alarm facility and a fixed clock
pub fn harness() -> Harness {
    let db = Rc::new(Database::open_in_memory().unwrap());
    let alarms = Rc::new(RecordingAlarms::default());
    let clock = Rc::new(FixedClock::new(fixed_now()));
    let scheduler = Rc::new(ReminderScheduler::new(alarms.clone(), clock.clone()));
    let tasks = TaskRepository::new(db.clone(), scheduler.clone(), clock.clone());
    Harness {
        db,
        alarms,
        clock,
        scheduler,
        tasks,
    }
}
