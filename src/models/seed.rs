use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Requested seed value meaning "draw a random seed now".
pub const RANDOM_SEED: i64 = -1;
pub const MAX_SEED: i64 = 2_147_483_647;

/// How the seed offered for the next run is derived from this run's seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeedControl {
    #[default]
    Fixed,
    Increment,
    Decrement,
    Randomize,
}

impl SeedControl {
    pub fn as_str(&self) -> &'static str {
        match self {
            SeedControl::Fixed => "fixed",
            SeedControl::Increment => "increment",
            SeedControl::Decrement => "decrement",
            SeedControl::Randomize => "randomize",
        }
    }
}

impl fmt::Display for SeedControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SeedControl {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fixed" => Ok(SeedControl::Fixed),
            "increment" => Ok(SeedControl::Increment),
            "decrement" => Ok(SeedControl::Decrement),
            "randomize" => Ok(SeedControl::Randomize),
            other => Err(format!(
                "unknown seed control '{}', expected fixed, increment, decrement or randomize",
                other
            )),
        }
    }
}

/// Seed session carried between invocations by the caller.
///
/// `next_seed` is advisory: it is what a UI would pre-fill for the next run
/// and never changes the seed of the run that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedState {
    pub next_seed: i64,
    pub control: SeedControl,
}

impl Default for SeedState {
    fn default() -> Self {
        Self {
            next_seed: RANDOM_SEED,
            control: SeedControl::Fixed,
        }
    }
}

impl SeedState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve the seed for the current run and record the suggestion for
    /// the next one. Returns the seed to use now.
    pub fn advance<R: Rng>(
        &mut self,
        requested: i64,
        control: SeedControl,
        rng: &mut R,
    ) -> i64 {
        let current = if requested == RANDOM_SEED {
            rng.gen_range(0..=MAX_SEED)
        } else {
            requested
        };

        self.next_seed = match control {
            SeedControl::Fixed => current,
            SeedControl::Increment => current + 1,
            SeedControl::Decrement => current - 1,
            SeedControl::Randomize => rng.gen_range(0..=MAX_SEED),
        };
        self.control = control;

        current
    }

    /// `next_seed` folded back into the accepted seed range, for reuse as
    /// the requested seed of the next run.
    ///
    /// Stepping past either end wraps around, so incrementing from
    /// [`MAX_SEED`] suggests 0 and decrementing from 0 suggests
    /// [`MAX_SEED`]. A fresh state still suggests [`RANDOM_SEED`].
    pub fn suggested_seed(&self) -> i64 {
        match self.next_seed {
            RANDOM_SEED if self.control != SeedControl::Decrement => RANDOM_SEED,
            seed => seed.rem_euclid(MAX_SEED + 1),
        }
    }
}
