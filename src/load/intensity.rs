use std::fmt;

use serde::{Deserialize, Serialize};

/// Load level in percent. Construction clamps to `0..=100`, so an
/// out-of-range request never surfaces as an error.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "i64", into = "u8")]
pub struct Intensity(u8);

impl Intensity {
    pub const ZERO: Intensity = Intensity(0);
    pub const MAX: Intensity = Intensity(100);

    pub fn new(value: i64) -> Self {
        Intensity(value.clamp(0, 100) as u8)
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Lowers the intensity to `cap` if it exceeds it.
    pub fn capped(self, cap: Intensity) -> Self {
        self.min(cap)
    }
}

impl From<i64> for Intensity {
    fn from(value: i64) -> Self {
        Intensity::new(value)
    }
}

impl From<Intensity> for u8 {
    fn from(value: Intensity) -> Self {
        value.0
    }
}

impl fmt::Display for Intensity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntensitySettings {
    pub cpu: Intensity,
    pub ram: Intensity,
}

impl IntensitySettings {
    pub fn new(cpu: i64, ram: i64) -> Self {
        Self {
            cpu: Intensity::new(cpu),
            ram: Intensity::new(ram),
        }
    }
}

/// Number of busy workers for a CPU intensity:
/// `round(intensity / 100 * parallelism)`, never more than `parallelism`.
pub fn worker_count(intensity: Intensity, parallelism: usize) -> usize {
    // Integer math so exact halves round up instead of drifting below .5.
    let scaled = usize::from(intensity.value())
        .saturating_mul(parallelism)
        .saturating_add(50);
    (scaled / 100).min(parallelism)
}
