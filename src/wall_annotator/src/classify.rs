//! Per-bar visual category.
//!
//! Rules, applied in order (later rules overwrite earlier ones):
//!
//! 1. Direction: up when `close >= open`.
//! 2. Volume bucket from `volumeZ`:
//!
//! | `volumeZ`    | up | down |
//! |--------------|----|------|
//! | `[0, 1)`     | 1  | 6    |
//! | `[1, 2)`     | 2  | 7    |
//! | `[2, 3)`     | 3  | 8    |
//! | `[3, 4)`     | 4  | 9    |
//! | `[4, ∞)`     | 5  | 10   |
//! | `[-1, 0)`    | 11 | 16   |
//! | `[-2, -1)`   | 12 | 17   |
//! | `[-3, -2)`   | 13 | 18   |
//! | `[-4, -3)`   | 14 | 19   |
//! | `(-∞, -4]`   | 15 | 20   |
//!
//!    `-4` itself belongs to the last row. `NaN` gives 0 (unclassified).
//! 3. `rangeOpenCloseZ` in `[-0.02, 0.02]` → 21.
//! 4. `rangeHighLowZ >= 1` → 22.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::bar::Bar;

/// Category code in `0..=22`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Category(pub u8);

impl Category {
    /// Volume metric unavailable.
    pub const UNCLASSIFIED: Self = Self(0);
    /// Open-to-close change indistinguishable from zero.
    pub const FLAT_BODY: Self = Self(21);
    /// Unusually wide high-to-low range.
    pub const WIDE_RANGE: Self = Self(22);
    pub const MAX: u8 = 22;

    pub const fn code(self) -> u8 {
        self.0
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Half-width of the near-zero band for `rangeOpenCloseZ`.
pub const FLAT_BODY_TOLERANCE: f64 = 0.02;
/// `rangeHighLowZ` at or above this marks a wide-range bar.
pub const WIDE_RANGE_Z: f64 = 1.0;

/// Bucket index `1..=5` for the magnitude of `volumeZ`, and whether it is the
/// negative family. `None` when `z` is NaN.
fn volume_bucket(z: f64) -> Option<(bool, u8)> {
    if z.is_nan() {
        return None;
    }
    let bucket = if z >= 0.0 {
        match z {
            z if z < 1.0 => 1,
            z if z < 2.0 => 2,
            z if z < 3.0 => 3,
            z if z < 4.0 => 4,
            _ => 5,
        }
    } else {
        match z {
            z if z >= -1.0 => 1,
            z if z >= -2.0 => 2,
            z if z >= -3.0 => 3,
            z if z > -4.0 => 4,
            _ => 5,
        }
    };
    Some((z < 0.0, bucket))
}

fn base_code(up: bool, volume_z: f64) -> u8 {
    match volume_bucket(volume_z) {
        None => 0,
        Some((false, b)) if up => b,
        Some((false, b)) => 5 + b,
        Some((true, b)) if up => 10 + b,
        Some((true, b)) => 15 + b,
    }
}

/// Classify one bar.
pub fn classify(bar: &Bar) -> Category {
    let mut code = base_code(bar.is_up(), bar.volume_z);
    if (-FLAT_BODY_TOLERANCE..=FLAT_BODY_TOLERANCE).contains(&bar.range_open_close_z) {
        code = Category::FLAT_BODY.0;
    }
    if bar.range_high_low_z >= WIDE_RANGE_Z {
        code = Category::WIDE_RANGE.0;
    }
    Category(code)
}

/// Classify every bar, aligned with the input.
pub fn classify_all(bars: &[Bar]) -> Vec<Category> {
    bars.iter().map(classify).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bar::{fixtures::bar, normalize, RawBar};
    use proptest::prelude::*;

    fn with_z(up: bool, z: f64) -> Bar {
        let (open, close) = if up { (100.0, 101.0) } else { (100.0, 99.0) };
        bar("2024-01-02", "10:00", open, close, z)
    }

    #[test]
    fn scenario_up_high_volume_and_down_low_volume() {
        let bars = vec![
            bar("2024-01-02", "10:00", 100.0, 101.0, 2.5),
            bar("2024-01-02", "11:00", 100.0, 99.0, -3.5),
        ];
        let codes: Vec<u8> = classify_all(&bars).into_iter().map(Category::code).collect();
        // -3.5 falls in the fourth negative bucket [-4, -3).
        assert_eq!(codes, [3, 19]);
    }

    #[test]
    fn positive_buckets() {
        let cases = [(0.0, 1), (0.99, 1), (1.0, 2), (2.5, 3), (3.0, 4), (4.0, 5), (40.0, 5)];
        for (z, want) in cases {
            assert_eq!(classify(&with_z(true, z)).code(), want, "up z={z}");
            assert_eq!(classify(&with_z(false, z)).code(), want + 5, "down z={z}");
        }
    }

    #[test]
    fn negative_buckets() {
        let cases = [
            (-0.5, 11),
            (-1.0, 11),
            (-1.5, 12),
            (-2.0, 12),
            (-3.0, 13),
            (-3.5, 14),
            (-3.99, 14),
            (-4.0, 15),
            (-9.0, 15),
        ];
        for (z, want) in cases {
            assert_eq!(classify(&with_z(true, z)).code(), want, "up z={z}");
            assert_eq!(classify(&with_z(false, z)).code(), want + 5, "down z={z}");
        }
    }

    #[test]
    fn infinite_z_lands_in_outer_buckets() {
        let mut up = with_z(true, 0.0);
        up.volume_z = f64::INFINITY;
        assert_eq!(classify(&up).code(), 5);
        let mut down = with_z(false, 0.0);
        down.volume_z = f64::NEG_INFINITY;
        assert_eq!(classify(&down).code(), 20);
    }

    #[test]
    fn equal_open_close_is_up() {
        assert_eq!(classify(&bar("2024-01-02", "10:00", 100.0, 100.0, 0.5)).code(), 1);
    }

    #[test]
    fn nan_volume_is_unclassified() {
        assert_eq!(classify(&with_z(true, f64::NAN)), Category::UNCLASSIFIED);
    }

    #[test]
    fn flat_body_override() {
        let mut b = with_z(true, 2.5);
        b.range_open_close_z = 0.02;
        assert_eq!(classify(&b), Category::FLAT_BODY);
        b.range_open_close_z = -0.02;
        assert_eq!(classify(&b), Category::FLAT_BODY);
        b.range_open_close_z = 0.021;
        assert_eq!(classify(&b).code(), 3);
    }

    #[test]
    fn wide_range_wins_over_flat_body() {
        let mut b = with_z(false, -1.5);
        b.range_open_close_z = 0.0;
        b.range_high_low_z = 1.0;
        assert_eq!(classify(&b), Category::WIDE_RANGE);
    }

    #[test]
    fn overrides_apply_without_volume() {
        let mut b = with_z(true, f64::NAN);
        b.range_open_close_z = 0.01;
        assert_eq!(classify(&b), Category::FLAT_BODY);
    }

    #[test]
    fn all_nan_bar_is_unclassified() {
        let b = normalize(&RawBar::default());
        assert_eq!(classify(&b), Category::UNCLASSIFIED);
    }

    proptest! {
        #[test]
        fn category_in_range_and_flat_body_is_justified(
            open in 1.0f64..200.0,
            close in 1.0f64..200.0,
            vz in proptest::num::f64::ANY,
            oc in -1.0f64..1.0,
            hl in -3.0f64..3.0,
        ) {
            let mut b = bar("2024-01-02", "10:00", open, close, 0.0);
            b.volume_z = vz;
            b.range_open_close_z = oc;
            b.range_high_low_z = hl;
            let c = classify(&b).code();
            prop_assert!(c <= Category::MAX);
            if c == Category::FLAT_BODY.0 {
                prop_assert!((-0.02..=0.02).contains(&oc));
            }
            if hl >= 1.0 {
                prop_assert_eq!(c, Category::WIDE_RANGE.0);
            }
        }
    }
}
