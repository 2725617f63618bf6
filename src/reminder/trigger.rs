use chrono::{DateTime, Duration, Utc};

/// How long before the due date an implicit reminder fires
pub const DEFAULT_REMINDER_LEAD: Duration = Duration::minutes(5);

/// Instant a reminder should fire at.
///
/// An explicit trigger always wins. Without one, a due date yields
/// `due - DEFAULT_REMINDER_LEAD`. With neither there is nothing to fire.
pub fn derive_trigger_time(
    explicit_trigger: Option<DateTime<Utc>>,
    due_date: Option<DateTime<Utc>>,
) -> Option<DateTime<Utc>> {
    explicit_trigger.or_else(|| due_date.map(|due| due - DEFAULT_REMINDER_LEAD))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, h, m, 0).unwrap()
    }

    #[test]
    fn due_date_alone_fires_five_minutes_early() {
        assert_eq!(derive_trigger_time(None, Some(at(9, 0))), Some(at(8, 55)));
    }

    #[test]
    fn explicit_trigger_ignores_due_date() {
        assert_eq!(derive_trigger_time(Some(at(7, 30)), Some(at(9, 0))), Some(at(7, 30)));
        assert_eq!(derive_trigger_time(Some(at(23, 0)), Some(at(9, 0))), Some(at(23, 0)));
        assert_eq!(derive_trigger_time(Some(at(7, 30)), None), Some(at(7, 30)));
    }

    #[test]
    fn nothing_to_derive_from() {
        assert_eq!(derive_trigger_time(None, None), None);
    }
}
