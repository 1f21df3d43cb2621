use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(1);

pub trait DelaySource: Send + Sync {
    fn sample(&self) -> Duration;
}

pub struct RandomDelay {
    bound_micros: u64,
    rng: Mutex<StdRng>,
}

impl RandomDelay {
    pub fn new(bound: Duration) -> Self {
        Self::with_rng(bound, StdRng::from_entropy())
    }

    #[cfg(test)]
    pub fn seeded(bound: Duration, seed: u64) -> Self {
        Self::with_rng(bound, StdRng::seed_from_u64(seed))
    }

    fn with_rng(bound: Duration, rng: StdRng) -> Self {
        Self {
            bound_micros: u64::try_from(bound.as_micros()).unwrap_or(u64::MAX),
            rng: Mutex::new(rng),
        }
    }

    pub fn bound(&self) -> Duration {
        Duration::from_micros(self.bound_micros)
    }
}

impl DelaySource for RandomDelay {
    fn sample(&self) -> Duration {
        if self.bound_micros == 0 {
            return Duration::ZERO;
        }
        // the lock only covers drawing the number, never the sleep
        let micros = self
            .rng
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .gen_range(0..self.bound_micros);
        Duration::from_micros(micros)
    }
}
