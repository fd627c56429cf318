use chrono::{DateTime, Duration, Utc};

pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Why a start call was refused relative to the exam's declared window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowViolation {
    NotYetOpen,
    Closed,
}

impl std::fmt::Display for WindowViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WindowViolation::NotYetOpen => write!(f, "This exam has not started yet"),
            WindowViolation::Closed => write!(f, "This exam has already ended"),
        }
    }
}

/// Checks `at` against an optional [start, end] window. A missing bound is
/// unconstrained on that side.
pub fn check_window(
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
    at: DateTime<Utc>,
) -> std::result::Result<(), WindowViolation> {
    if let Some(start) = start {
        if at < start {
            return Err(WindowViolation::NotYetOpen);
        }
    }
    if let Some(end) = end {
        if at > end {
            return Err(WindowViolation::Closed);
        }
    }
    Ok(())
}

/// Seconds left on an attempt. Derived from the authoritative server-side
/// start timestamp, not from when the client mounted, so a reload keeps the
/// countdown honest.
pub fn remaining_seconds(
    started_at: DateTime<Utc>,
    duration_minutes: i32,
    at: DateTime<Utc>,
) -> i64 {
    let deadline = started_at + Duration::minutes(duration_minutes as i64);
    (deadline - at).num_seconds().max(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn window_open_when_unbounded() {
        assert_eq!(check_window(None, None, at(0)), Ok(()));
    }

    #[test]
    fn window_refuses_before_start() {
        assert_eq!(
            check_window(Some(at(100)), Some(at(200)), at(50)),
            Err(WindowViolation::NotYetOpen)
        );
    }

    #[test]
    fn window_refuses_after_end() {
        assert_eq!(
            check_window(Some(at(100)), Some(at(200)), at(201)),
            Err(WindowViolation::Closed)
        );
    }

    #[test]
    fn window_accepts_inside_and_at_bounds() {
        assert_eq!(check_window(Some(at(100)), Some(at(200)), at(100)), Ok(()));
        assert_eq!(check_window(Some(at(100)), Some(at(200)), at(150)), Ok(()));
        assert_eq!(check_window(Some(at(100)), Some(at(200)), at(200)), Ok(()));
    }

    #[test]
    fn remaining_counts_down_from_started_at() {
        let started = at(0);
        assert_eq!(remaining_seconds(started, 30, at(0)), 1800);
        assert_eq!(remaining_seconds(started, 30, at(1799)), 1);
        assert_eq!(remaining_seconds(started, 30, at(1800)), 0);
    }

    #[test]
    fn remaining_never_negative() {
        assert_eq!(remaining_seconds(at(0), 30, at(5000)), 0);
    }
}
