//! Random number plumbing for generation
//!
//! One ChaCha8 stream is threaded `&mut` through the whole run. The
//! base-defense determinism contract is expressed as a scope guard that
//! snapshots the stream on entry and restores it on drop, so the same
//! base at the same coordinates regenerates identically across attempts.

use rand::Rng;
use rand_chacha::ChaCha8Rng;

/// RAII guard that restores the RNG to its entry state when dropped
///
/// Push one around a generation that must be reproducible on retry; the
/// generation still consumes rolls internally, but the caller-visible
/// stream is untouched afterward.
pub struct SeedScope<'a> {
    rng: &'a mut ChaCha8Rng,
    saved: ChaCha8Rng,
}

impl<'a> SeedScope<'a> {
    pub fn new(rng: &'a mut ChaCha8Rng) -> Self {
        let saved = rng.clone();
        Self { rng, saved }
    }

    pub fn rng(&mut self) -> &mut ChaCha8Rng {
        self.rng
    }
}

impl Drop for SeedScope<'_> {
    fn drop(&mut self) {
        *self.rng = self.saved.clone();
    }
}

/// Roll an execution chance expressed as a percentage
///
/// `chance >= 100` always passes, `chance == 0` never does.
pub fn roll_percent(rng: &mut ChaCha8Rng, chance: u8) -> bool {
    if chance >= 100 {
        return true;
    }
    rng.gen_range(0..100) < chance as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_seed_scope_restores_stream() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let before: u64 = rng.clone().gen();

        {
            let mut scope = SeedScope::new(&mut rng);
            // Consume some entropy inside the scope.
            for _ in 0..100 {
                let _: u32 = scope.rng().gen();
            }
        }

        let after: u64 = rng.gen();
        assert_eq!(before, after);
    }

    #[test]
    fn test_roll_percent_extremes() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        for _ in 0..50 {
            assert!(roll_percent(&mut rng, 100));
            assert!(!roll_percent(&mut rng, 0));
        }
    }

    #[test]
    fn test_roll_percent_distribution() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let hits = (0..1000).filter(|_| roll_percent(&mut rng, 50)).count();
        assert!(hits > 400 && hits < 600, "50% roll hit {} of 1000", hits);
    }
}
