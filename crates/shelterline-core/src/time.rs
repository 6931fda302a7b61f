use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::error::{CoreError, Result};

/// Current wall-clock time in UTC. All timestamps in the system are UTC.
pub fn now_utc() -> OffsetDateTime {
    OffsetDateTime::now_utc()
}

/// Format a timestamp as RFC3339 for wire payloads and logs.
pub fn to_rfc3339(t: OffsetDateTime) -> Result<String> {
    t.format(&Rfc3339)
        .map_err(|e| CoreError::invalid_date_time(format!("format RFC3339: {e}")))
}

/// Whole minutes from `now` until `t`, clamped at zero once passed.
pub fn minutes_until(now: OffsetDateTime, t: OffsetDateTime) -> i64 {
    let secs = (t - now).whole_seconds();
    (secs.max(0)) / 60
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Duration;

    #[test]
    fn minutes_until_clamps_at_zero() {
        let now = now_utc();
        assert_eq!(minutes_until(now, now - Duration::minutes(5)), 0);
        assert_eq!(minutes_until(now, now + Duration::minutes(90)), 90);
    }
}
