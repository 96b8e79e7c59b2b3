use std::time::{Duration, Instant};

/// Request timing for a single origin
///
/// Owned by the politeness gate; nothing else writes it.
#[derive(Debug, Clone, Default)]
pub struct OriginState {
    /// Number of requests made to this origin in this process
    pub request_count: u32,

    /// When the last request to this origin was released
    pub last_request_time: Option<Instant>,
}

impl OriginState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that a request was released to this origin
    pub fn record_request(&mut self, now: Instant) {
        self.request_count += 1;
        self.last_request_time = Some(now);
    }

    /// Calculates how long to wait before the next request
    ///
    /// Returns None if `interval` has already elapsed since the last request
    /// (or there was none).
    pub fn time_until_next_request(&self, interval: Duration, now: Instant) -> Option<Duration> {
        let last = self.last_request_time?;
        let elapsed = now.saturating_duration_since(last);
        if elapsed < interval {
            Some(interval - elapsed)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_origin_state() {
        let state = OriginState::new();
        assert_eq!(state.request_count, 0);
        assert!(state.last_request_time.is_none());
    }

    #[test]
    fn test_first_request_never_waits() {
        let state = OriginState::new();
        assert!(state
            .time_until_next_request(Duration::from_secs(5), Instant::now())
            .is_none());
    }

    #[test]
    fn test_record_request() {
        let mut state = OriginState::new();
        let now = Instant::now();

        state.record_request(now);
        assert_eq!(state.request_count, 1);
        assert_eq!(state.last_request_time, Some(now));

        state.record_request(now);
        assert_eq!(state.request_count, 2);
    }

    #[test]
    fn test_time_until_next_request() {
        let mut state = OriginState::new();
        let interval = Duration::from_millis(1000);
        let now = Instant::now();
        state.record_request(now);

        assert_eq!(
            state.time_until_next_request(interval, now),
            Some(Duration::from_millis(1000))
        );

        let soon = now + Duration::from_millis(400);
        assert_eq!(
            state.time_until_next_request(interval, soon),
            Some(Duration::from_millis(600))
        );

        let later = now + Duration::from_millis(1100);
        assert!(state.time_until_next_request(interval, later).is_none());
    }
}
