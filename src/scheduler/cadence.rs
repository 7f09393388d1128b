use std::time::Duration;

use chrono::{DateTime, Utc};

/// Fixed-interval cadence anchored at the daemon's start.
///
/// Ticks that were missed while a pass overran are skipped rather than replayed.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PollCadence {
    interval: Duration,
}

impl PollCadence {
    pub(crate) fn new(interval: Duration) -> Self {
        // a zero interval would spin
        let interval = interval.max(Duration::from_secs(1));
        Self { interval }
    }

    pub(crate) fn interval(&self) -> Duration {
        self.interval
    }

    /// The first tick strictly after `now`, on the grid `anchor + k * interval`.
    pub(crate) fn next_run_from(&self, anchor: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
        if now < anchor {
            return anchor;
        }
        let Ok(step) = chrono::Duration::from_std(self.interval) else {
            return now;
        };
        let step_ms = step.num_milliseconds().max(1);
        let elapsed_ms = (now - anchor).num_milliseconds();
        let ticks = elapsed_ms / step_ms + 1;
        anchor + chrono::Duration::milliseconds(ticks.saturating_mul(step_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::PollCadence;
    use chrono::{DateTime, Utc};
    use rstest::rstest;
    use std::time::Duration;

    fn parse_utc(ts: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(ts)
            .expect("valid datetime")
            .with_timezone(&Utc)
    }

    #[rstest]
    #[case("2025-06-01T00:00:00Z", "2025-06-01T00:01:00Z")]
    #[case("2025-06-01T00:00:30Z", "2025-06-01T00:01:00Z")]
    #[case("2025-06-01T00:01:00Z", "2025-06-01T00:02:00Z")]
    fn next_run_lands_on_the_grid(#[case] now: &str, #[case] expected: &str) {
        let cadence = PollCadence::new(Duration::from_secs(60));
        let anchor = parse_utc("2025-06-01T00:00:00Z");

        assert_eq!(cadence.next_run_from(anchor, parse_utc(now)), parse_utc(expected));
    }

    #[test]
    fn overrun_skips_missed_ticks() {
        let cadence = PollCadence::new(Duration::from_secs(60));
        let anchor = parse_utc("2025-06-01T00:00:00Z");
        // the pass started at 00:00 took three and a half minutes
        let now = parse_utc("2025-06-01T00:03:30Z");

        assert_eq!(cadence.next_run_from(anchor, now), parse_utc("2025-06-01T00:04:00Z"));
    }

    #[test]
    fn anchor_in_future_is_returned_as_is() {
        let cadence = PollCadence::new(Duration::from_secs(60));
        let anchor = parse_utc("2025-06-01T00:10:00Z");

        assert_eq!(
            cadence.next_run_from(anchor, parse_utc("2025-06-01T00:00:00Z")),
            anchor
        );
    }

    #[test]
    fn zero_interval_is_raised_to_one_second() {
        let cadence = PollCadence::new(Duration::ZERO);
        assert_eq!(cadence.interval(), Duration::from_secs(1));
    }
}
