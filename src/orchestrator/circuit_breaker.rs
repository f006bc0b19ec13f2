use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open { tripped_at: Instant },
    HalfOpen,
}

pub struct CircuitBreaker {
    state: CircuitState,
    failure_count: u8,
    last_failure_time: Option<Instant>,
    trip_threshold: u8,
    trip_window: Duration,
    cooldown: Duration,
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new()
    }
}

impl CircuitBreaker {
    pub fn new() -> Self {
        Self::with_settings(3, Duration::from_secs(300), Duration::from_secs(600))
    }

    pub fn with_settings(trip_threshold: u8, trip_window: Duration, cooldown: Duration) -> Self {
        Self {
            state: CircuitState::Closed,
            failure_count: 0,
            last_failure_time: None,
            trip_threshold: trip_threshold.max(1),
            trip_window,
            cooldown,
        }
    }

    pub fn state(&self) -> CircuitState {
        self.state
    }

    pub fn is_request_allowed(&mut self) -> bool {
        match self.state {
            CircuitState::Closed => true,
            CircuitState::HalfOpen => true,
            CircuitState::Open { tripped_at } => {
                if tripped_at.elapsed() >= self.cooldown {
                    self.state = CircuitState::HalfOpen;
                    true
                } else {
                    false
                }
            }
        }
    }

    pub fn record_success(&mut self) {
        self.failure_count = 0;
        self.last_failure_time = None;
        self.state = CircuitState::Closed;
    }

    pub fn record_failure(&mut self) {
        let now = Instant::now();

        if self.state == CircuitState::HalfOpen {
            self.state = CircuitState::Open { tripped_at: now };
            self.last_failure_time = Some(now);
            tracing::warn!("Circuit breaker re-opened after half-open probe failed");
            return;
        }

        match self.last_failure_time {
            Some(last_fail) if now.duration_since(last_fail) <= self.trip_window => {
                self.failure_count = self.failure_count.saturating_add(1);
            }
            _ => self.failure_count = 1,
        }

        self.last_failure_time = Some(now);

        if self.failure_count >= self.trip_threshold {
            self.state = CircuitState::Open { tripped_at: now };
            tracing::warn!("Circuit breaker tripped, failure_count={}", self.failure_count);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trips_after_threshold() {
        let mut cb = CircuitBreaker::new();
        cb.record_failure();
        cb.record_failure();
        assert!(cb.is_request_allowed());
        cb.record_failure();
        assert!(matches!(cb.state(), CircuitState::Open { .. }));
        assert!(!cb.is_request_allowed());
    }

    #[test]
    fn success_resets() {
        let mut cb = CircuitBreaker::new();
        cb.record_failure();
        cb.record_failure();
        cb.record_success();
        cb.record_failure();
        assert_eq!(cb.state(), CircuitState::Closed);
    }

    #[test]
    fn half_open_after_cooldown() {
        let mut cb = CircuitBreaker::with_settings(1, Duration::from_secs(60), Duration::ZERO);
        cb.record_failure();
        assert!(cb.is_request_allowed());
        assert_eq!(cb.state(), CircuitState::HalfOpen);
        cb.record_failure();
        assert!(matches!(cb.state(), CircuitState::Open { .. }));
    }
}
