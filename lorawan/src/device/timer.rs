//! Duty-cycle timer
//!
//! Single-shot timer that wakes the controller for its next uplink. It is
//! built on an `embedded-hal` count-down timer and polled from the controller
//! step, so expiry is observed in the same execution context as every other
//! state change.

use core::time::Duration;

use embedded_hal::timer::{Cancel, CountDown};
use rand_core::RngCore;

/// Compute the next uplink delay: `base` plus a uniform random `0..=jitter`
///
/// The random part has millisecond resolution.
pub fn duty_cycle_deadline<R: RngCore>(base: Duration, jitter: Duration, rng: &mut R) -> Duration {
    let jitter_ms = u32::try_from(jitter.as_millis()).unwrap_or(u32::MAX);
    if jitter_ms == 0 {
        return base;
    }

    let offset = match jitter_ms.checked_add(1) {
        Some(span) => rng.next_u32() % span,
        None => rng.next_u32(),
    };
    base + Duration::from_millis(u64::from(offset))
}

/// Armed/disarmed wrapper around a count-down timer
#[derive(Debug)]
pub struct DutyCycleTimer<T> {
    /// Hardware timer
    timer: T,
    /// Delay the timer was last armed with, `None` while disarmed
    deadline: Option<Duration>,
}

impl<T> DutyCycleTimer<T>
where
    T: CountDown + Cancel,
    T::Time: From<Duration>,
{
    /// Wrap a count-down timer, initially disarmed
    pub fn new(timer: T) -> Self {
        Self {
            timer,
            deadline: None,
        }
    }

    /// Start the timer, replacing any pending expiry
    pub fn arm(&mut self, deadline: Duration) {
        if self.deadline.is_some() {
            // An idle timer reports an error here, nothing to undo.
            let _ = self.timer.cancel();
        }
        self.timer.start(deadline);
        self.deadline = Some(deadline);
    }

    /// Stop the timer if it is running
    pub fn disarm(&mut self) {
        if self.deadline.take().is_some() {
            let _ = self.timer.cancel();
        }
    }

    /// Check for expiry. Returns `true` once per armed period, disarming the timer.
    pub fn poll(&mut self) -> bool {
        if self.deadline.is_none() {
            return false;
        }

        match self.timer.wait() {
            Ok(()) => {
                self.deadline = None;
                true
            }
            Err(_) => false,
        }
    }

    /// Returns `true` while an expiry is pending
    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Delay the timer was armed with
    pub fn deadline(&self) -> Option<Duration> {
        self.deadline
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::mock::StepRng;

    /// Timer that expires on demand
    struct ManualTimer {
        running: bool,
        expired: bool,
        cancels: usize,
    }

    impl CountDown for ManualTimer {
        type Time = Duration;

        fn start<D>(&mut self, _count: D)
        where
            D: Into<Self::Time>,
        {
            self.running = true;
            self.expired = false;
        }

        fn wait(&mut self) -> nb::Result<(), void::Void> {
            if self.running && self.expired {
                self.running = false;
                Ok(())
            } else {
                Err(nb::Error::WouldBlock)
            }
        }
    }

    impl Cancel for ManualTimer {
        type Error = ();

        fn cancel(&mut self) -> Result<(), ()> {
            self.cancels += 1;
            if self.running {
                self.running = false;
                Ok(())
            } else {
                Err(())
            }
        }
    }

    fn manual_timer() -> DutyCycleTimer<ManualTimer> {
        DutyCycleTimer::new(ManualTimer {
            running: false,
            expired: false,
            cancels: 0,
        })
    }

    #[test]
    fn test_deadline_jitter_bounds() {
        let base = Duration::from_secs(30);
        let jitter = Duration::from_secs(5);

        let mut rng = StepRng::new(0, 0);
        assert_eq!(duty_cycle_deadline(base, jitter, &mut rng), base);

        let mut rng = StepRng::new(5_000, 0);
        assert_eq!(
            duty_cycle_deadline(base, jitter, &mut rng),
            Duration::from_secs(35)
        );

        // Values past the bound wrap back into range
        let mut rng = StepRng::new(5_001, 0);
        assert_eq!(duty_cycle_deadline(base, jitter, &mut rng), base);

        let mut rng = StepRng::new(u64::from(u32::MAX), 0);
        let deadline = duty_cycle_deadline(base, jitter, &mut rng);
        assert!(deadline >= base && deadline <= base + jitter);
    }

    #[test]
    fn test_deadline_without_jitter() {
        let mut rng = StepRng::new(1234, 1);
        let base = Duration::from_millis(500);
        assert_eq!(duty_cycle_deadline(base, Duration::ZERO, &mut rng), base);
    }

    #[test]
    fn test_poll_fires_once() {
        let mut timer = manual_timer();
        assert!(!timer.poll());

        timer.arm(Duration::from_secs(30));
        assert!(timer.is_armed());
        assert!(!timer.poll());

        timer.timer.expired = true;
        assert!(timer.poll());
        assert!(!timer.is_armed());
        assert!(!timer.poll());
    }

    #[test]
    fn test_disarm_cancels_running_timer() {
        let mut timer = manual_timer();
        timer.disarm();
        assert_eq!(timer.timer.cancels, 0);

        timer.arm(Duration::from_secs(10));
        timer.disarm();
        assert_eq!(timer.timer.cancels, 1);
        assert!(!timer.timer.running);
        assert_eq!(timer.deadline(), None);
    }
}
