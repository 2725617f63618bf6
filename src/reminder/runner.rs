use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

use crate::reminder::alarm::{AlarmError, SqliteAlarmRegistry};
use crate::reminder::dispatcher::{Notifier, ReminderDispatcher};
use crate::reminder::scheduler::Clock;

/// Delivers due alarms from the alarm store to the dispatcher.
///
/// Stands in for the platform waking the app up: it needs nothing but the
/// alarm store, and alarms that came due while it was not running are
/// delivered on the next pass.
pub struct AlarmRunner<N: Notifier> {
    alarms: Rc<SqliteAlarmRegistry>,
    dispatcher: ReminderDispatcher<N>,
    clock: Rc<dyn Clock>,
    poll_interval: Duration,
}

impl<N: Notifier> AlarmRunner<N> {
    pub fn new(
        alarms: Rc<SqliteAlarmRegistry>,
        dispatcher: ReminderDispatcher<N>,
        clock: Rc<dyn Clock>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            alarms,
            dispatcher,
            clock,
            poll_interval,
        }
    }

    pub fn dispatcher(&self) -> &ReminderDispatcher<N> {
        &self.dispatcher
    }

    /// Fire every alarm due now. Returns how many notifications were posted.
    pub fn fire_due(&self) -> Result<usize, AlarmError> {
        let due = self.alarms.take_due(self.clock.now())?;
        if !due.is_empty() {
            debug!(count = due.len(), "alarms due");
        }
        let posted = due
            .iter()
            .filter(|alarm| self.dispatcher.dispatch(&alarm.payload))
            .count();
        Ok(posted)
    }

    /// Poll until `stop` is set. The flag is checked between passes and
    /// while waiting, so setting it never waits out a whole interval.
    pub fn run(&self, stop: &AtomicBool) {
        info!(interval_secs = self.poll_interval.as_secs(), "reminder watcher started");
        while !stop.load(Ordering::Relaxed) {
            if let Err(e) = self.fire_due() {
                error!(error = %e, "failed to read due alarms");
            }
            let wake_at = Instant::now() + self.poll_interval;
            while !stop.load(Ordering::Relaxed) {
                let now = Instant::now();
                if now >= wake_at {
                    break;
                }
                std::thread::sleep((wake_at - now).min(STOP_CHECK_INTERVAL));
            }
        }
        info!("reminder watcher stopped");
    }
}

const STOP_CHECK_INTERVAL: Duration = Duration::from_millis(100);

/// Flag that flips to true on Ctrl-C or SIGTERM, for handing to [`AlarmRunner::run`].
pub fn stop_on_interrupt() -> std::io::Result<Arc<AtomicBool>> {
    let stop = Arc::new(AtomicBool::new(false));
    signal_hook::flag::register(signal_hook::consts::SIGINT, Arc::clone(&stop))?;
    signal_hook::flag::register(signal_hook::consts::SIGTERM, Arc::clone(&stop))?;
    Ok(stop)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reminder::SystemClock;
    use crate::reminder::TerminalNotifier;

    fn runner(poll_interval: Duration) -> AlarmRunner<TerminalNotifier<Vec<u8>>> {
        let alarms = Rc::new(SqliteAlarmRegistry::open_in_memory(true).unwrap());
        let dispatcher = ReminderDispatcher::new(TerminalNotifier::new(Vec::new()), true);
        AlarmRunner::new(alarms, dispatcher, Rc::new(SystemClock), poll_interval)
    }

    #[test]
    fn run_returns_once_the_flag_is_set_mid_wait() {
        let runner = runner(Duration::from_secs(60));
        let stop = Arc::new(AtomicBool::new(false));
        let setter = {
            let stop = Arc::clone(&stop);
            std::thread::spawn(move || {
                std::thread::sleep(Duration::from_millis(150));
                stop.store(true, Ordering::Relaxed);
            })
        };

        let started = Instant::now();
        runner.run(&stop);
        setter.join().unwrap();
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[cfg(unix)]
    #[test]
    fn interrupt_sets_the_stop_flag() {
        let stop = stop_on_interrupt().unwrap();
        assert!(!stop.load(Ordering::Relaxed));
        signal_hook::low_level::raise(signal_hook::consts::SIGINT).unwrap();
        assert!(stop.load(Ordering::Relaxed));
    }
}
