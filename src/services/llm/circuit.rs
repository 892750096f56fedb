//! Per-provider circuit breaker backing `ProviderHealth`.
//!
//! Lock-free state read via atomics so the gateway can check a provider's
//! circuit on every call without taking a lock across network I/O.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use crate::models::llm_provider::CircuitState;

pub struct CircuitBreaker {
    failures: AtomicU32,
    open_until_us: AtomicU64,
    probing: AtomicBool,
    threshold: u32,
    cooldown: Duration,
    epoch: Instant,
}

impl CircuitBreaker {
    pub fn new(threshold: u32, cooldown: Duration) -> Self {
        Self {
            failures: AtomicU32::new(0),
            open_until_us: AtomicU64::new(0),
            probing: AtomicBool::new(false),
            threshold,
            cooldown,
            epoch: Instant::now(),
        }
    }

    pub fn state(&self) -> CircuitState {
        let open_until = self.open_until_us.load(Ordering::Acquire);
        let now = self.now_us();
        if open_until > 0 && now < open_until {
            return CircuitState::Open;
        }
        if open_until > 0 && now >= open_until {
            return CircuitState::HalfOpen;
        }
        CircuitState::Closed
    }

    pub fn failure_count(&self) -> u32 {
        self.failures.load(Ordering::Acquire)
    }

    pub fn opened_at(&self) -> Option<Instant> {
        let open_until = self.open_until_us.load(Ordering::Acquire);
        if open_until == 0 {
            return None;
        }
        Some(self.epoch + Duration::from_micros(open_until) - self.cooldown)
    }

    /// True if a call is currently allowed. Closed always allows; open never
    /// does; half-open allows exactly one caller to claim the probe slot (via
    /// a CAS on `probing`) and tells every other concurrent caller no. A
    /// claimed probe must eventually be released through
    /// [`record_success`](Self::record_success),
    /// [`record_failure`](Self::record_failure), or
    /// [`release_probe`](Self::release_probe) — otherwise the slot stays
    /// claimed and the circuit can never probe again.
    pub fn allow_call(&self) -> bool {
        match self.state() {
            CircuitState::Closed => true,
            CircuitState::Open => false,
            CircuitState::HalfOpen => {
                self.probing.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire).is_ok()
            },
        }
    }

    /// Releases a probe slot claimed by `allow_call` without recording an
    /// outcome — for callers that back out before actually reaching the
    /// provider (e.g. no API key configured, or the concurrency semaphore
    /// was full).
    pub fn release_probe(&self) {
        self.probing.store(false, Ordering::Release);
    }

    pub fn record_success(&self) {
        self.failures.store(0, Ordering::Release);
        self.open_until_us.store(0, Ordering::Release);
        self.probing.store(false, Ordering::Release);
    }

    pub fn record_failure(&self) {
        let prev = self.failures.fetch_add(1, Ordering::AcqRel);
        if prev + 1 >= self.threshold {
            let reset_at = self.now_us() + self.cooldown.as_micros() as u64;
            self.open_until_us.store(reset_at, Ordering::Release);
        }
        self.probing.store(false, Ordering::Release);
    }

    fn now_us(&self) -> u64 {
        self.epoch.elapsed().as_micros().min(u64::MAX as u128) as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opens_after_threshold_failures() {
        let cb = CircuitBreaker::new(3, Duration::from_secs(30));
        assert_eq!(cb.state(), CircuitState::Closed);
        cb.record_failure();
        cb.record_failure();
        assert_eq!(cb.state(), CircuitState::Closed);
        cb.record_failure();
        assert_eq!(cb.state(), CircuitState::Open);
        assert!(!cb.allow_call());
    }

    #[test]
    fn success_resets_failure_count() {
        let cb = CircuitBreaker::new(3, Duration::from_secs(30));
        cb.record_failure();
        cb.record_failure();
        cb.record_success();
        assert_eq!(cb.failure_count(), 0);
        assert_eq!(cb.state(), CircuitState::Closed);
    }

    #[test]
    fn half_opens_after_cooldown() {
        let cb = CircuitBreaker::new(1, Duration::from_millis(10));
        cb.record_failure();
        assert_eq!(cb.state(), CircuitState::Open);
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(cb.state(), CircuitState::HalfOpen);
        assert!(cb.allow_call());
    }

    #[test]
    fn exactly_one_probe_is_permitted_after_cooldown() {
        let cb = CircuitBreaker::new(1, Duration::from_millis(10));
        cb.record_failure();
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(cb.state(), CircuitState::HalfOpen);

        assert!(cb.allow_call(), "first caller should claim the probe");
        assert!(!cb.allow_call(), "second concurrent caller should be refused");
        assert!(!cb.allow_call(), "a third caller is still refused while the probe is in flight");
    }

    #[test]
    fn releasing_an_unresolved_probe_lets_another_caller_try() {
        let cb = CircuitBreaker::new(1, Duration::from_millis(10));
        cb.record_failure();
        std::thread::sleep(Duration::from_millis(20));

        assert!(cb.allow_call());
        cb.release_probe();
        assert!(cb.allow_call(), "releasing the probe should let a later caller claim it");
    }

    #[test]
    fn failed_probe_reopens_the_circuit() {
        let cb = CircuitBreaker::new(1, Duration::from_millis(10));
        cb.record_failure();
        std::thread::sleep(Duration::from_millis(20));

        assert!(cb.allow_call());
        cb.record_failure();
        assert_eq!(cb.state(), CircuitState::Open);
    }
}
