//! Random draws used by setup and the scenario handlers
//!
//! Every random decision (scenario choice, branch choice, payload values) goes
//! through [`Draws`], so a test can script the exact sequence of values a
//! virtual user sees.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of uniform values in `[0, 1)`
pub trait Draws: Send {
    /// Next uniform value in `[0, 1)`
    fn unit(&mut self) -> f64;

    /// Integer in `[0, n)`, computed as `floor(unit * n)`
    fn below(&mut self, n: u64) -> u64 {
        let value = (self.unit() * n as f64).floor() as u64;
        value.min(n.saturating_sub(1))
    }

    /// Integer in `[lo, hi]` inclusive
    fn int_in(&mut self, lo: u64, hi: u64) -> u64 {
        lo + self.below(hi - lo + 1)
    }

    /// Uniformly chosen element, `None` for an empty slice
    fn pick<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T>
    where
        Self: Sized,
    {
        if items.is_empty() {
            return None;
        }
        let idx = self.below(items.len() as u64) as usize;
        items.get(idx)
    }
}

/// Production draws: one seeded `StdRng` per virtual user
pub struct RngDraws {
    rng: StdRng,
}

impl RngDraws {
    /// Seed from the thread-local generator
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_rng(&mut rand::rng()),
        }
    }

    /// Deterministic draws for reproducible runs
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RngDraws {
    fn default() -> Self {
        Self::new()
    }
}

impl Draws for RngDraws {
    fn unit(&mut self) -> f64 {
        self.rng.random::<f64>()
    }
}

/// Replays a fixed list of values, then falls back to `0.0`
///
/// Used by tests to force specific branches.
#[derive(Debug, Clone, Default)]
pub struct ScriptedDraws {
    values: Vec<f64>,
    next: usize,
}

impl ScriptedDraws {
    pub fn new(values: impl Into<Vec<f64>>) -> Self {
        Self {
            values: values.into(),
            next: 0,
        }
    }

    /// Number of values consumed so far
    pub fn consumed(&self) -> usize {
        self.next
    }
}

impl Draws for ScriptedDraws {
    fn unit(&mut self) -> f64 {
        let value = self.values.get(self.next).copied().unwrap_or(0.0);
        self.next += 1;
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_below_stays_in_range() {
        let mut draws = ScriptedDraws::new([0.0, 0.5, 0.999_999]);
        assert_eq!(draws.below(10), 0);
        assert_eq!(draws.below(10), 5);
        assert_eq!(draws.below(10), 9);
    }

    #[test]
    fn test_int_in_is_inclusive() {
        let mut draws = ScriptedDraws::new([0.0, 0.999_999_9]);
        assert_eq!(draws.int_in(600, 2399), 600);
        assert_eq!(draws.int_in(600, 2399), 2399);
    }

    #[test]
    fn test_pick_empty_slice() {
        let mut draws = ScriptedDraws::new([0.3]);
        let empty: [u8; 0] = [];
        assert!(draws.pick(&empty).is_none());
        assert_eq!(draws.consumed(), 0);
    }

    #[test]
    fn test_pick_uses_floor() {
        let mut draws = ScriptedDraws::new([0.74]);
        assert_eq!(draws.pick(&["a", "b", "c", "d"]), Some(&"c"));
    }

    #[test]
    fn test_rng_draws_unit_interval() {
        let mut draws = RngDraws::seeded(7);
        for _ in 0..1000 {
            let v = draws.unit();
            assert!((0.0..1.0).contains(&v));
        }
    }

    #[test]
    fn test_scripted_draws_fall_back_to_zero() {
        let mut draws = ScriptedDraws::new([0.9]);
        assert_eq!(draws.unit(), 0.9);
        assert_eq!(draws.unit(), 0.0);
        assert_eq!(draws.consumed(), 2);
    }
}
