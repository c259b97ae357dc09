use derive_more::{Display, From};
use serde::{Deserialize, Serialize};

/// Per-frame build duty in milliseconds, constrained to [0.01, 1000.0]
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Display, From, Serialize, Deserialize)]
pub struct DutyMs(f32);

impl DutyMs {
    const MIN: f32 = 0.01;
    const MAX: f32 = 1000.0;

    pub fn new(value: f32) -> Self {
        Self(value.clamp(Self::MIN, Self::MAX))
    }

    pub fn get(self) -> f32 {
        self.0
    }
}

impl Default for DutyMs {
    fn default() -> Self {
        Self::new(0.5)
    }
}

/// Number of heightmap rows between two budget checks, constrained to [1, 4096]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Display, From, Serialize, Deserialize)]
pub struct RowBatch(u32);

impl RowBatch {
    const MIN: u32 = 1;
    const MAX: u32 = 4096;

    pub fn new(value: u32) -> Self {
        Self(value.clamp(Self::MIN, Self::MAX))
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl Default for RowBatch {
    fn default() -> Self {
        Self::new(10)
    }
}

/// A blend factor constrained to [0.0, 1.0]
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Display, From, Serialize, Deserialize)]
pub struct UnitFraction(f32);

impl UnitFraction {
    const MIN: f32 = 0.0;
    const MAX: f32 = 1.0;

    pub fn new(value: f32) -> Self {
        Self(value.clamp(Self::MIN, Self::MAX))
    }

    pub fn get(self) -> f32 {
        self.0
    }
}

impl Default for UnitFraction {
    fn default() -> Self {
        Self::new(1.0)
    }
}

/// A radius in meters constrained to [0.0, 100.0]
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Display, From, Serialize, Deserialize)]
pub struct Meters(f32);

impl Meters {
    const MIN: f32 = 0.0;
    const MAX: f32 = 100.0;

    pub fn new(value: f32) -> Self {
        Self(value.clamp(Self::MIN, Self::MAX))
    }

    pub fn get(self) -> f32 {
        self.0
    }
}

impl Default for Meters {
    fn default() -> Self {
        Self::new(1.0)
    }
}

/// A signed vertical or lateral offset in meters constrained to [-50.0, 50.0]
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Display, From, Serialize, Deserialize)]
pub struct OffsetMeters(f32);

impl OffsetMeters {
    const MIN: f32 = -50.0;
    const MAX: f32 = 50.0;

    pub fn new(value: f32) -> Self {
        Self(value.clamp(Self::MIN, Self::MAX))
    }

    pub fn get(self) -> f32 {
        self.0
    }
}

impl Default for OffsetMeters {
    fn default() -> Self {
        Self::new(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duty_clamping() {
        assert_eq!(DutyMs::new(-1.0).get(), 0.01);
        assert_eq!(DutyMs::new(0.5).get(), 0.5);
        assert_eq!(DutyMs::new(5000.0).get(), 1000.0);
    }

    #[test]
    fn test_row_batch_clamping() {
        assert_eq!(RowBatch::new(0).get(), 1);
        assert_eq!(RowBatch::new(10).get(), 10);
        assert_eq!(RowBatch::new(100_000).get(), 4096);
    }

    #[test]
    fn test_signed_offsets_keep_sign() {
        assert_eq!(OffsetMeters::new(-0.3).get(), -0.3);
        assert_eq!(OffsetMeters::new(-80.0).get(), -50.0);
        assert_eq!(Meters::new(-0.3).get(), 0.0);
    }

    #[test]
    fn test_display() {
        let duty = DutyMs::new(0.5);
        assert_eq!(format!("{duty}"), "0.5");
    }

    #[test]
    fn test_defaults() {
        assert_eq!(DutyMs::default().get(), 0.5);
        assert_eq!(RowBatch::default().get(), 10);
        assert_eq!(UnitFraction::default().get(), 1.0);
    }
}
