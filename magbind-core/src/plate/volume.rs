//! Fixed-point liquid volumes

use core::fmt;
use core::ops::{Add, AddAssign, Mul};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Fractional digits kept by [`Volume`]
pub const VOLUME_DECIMALS: usize = 2;

/// A non-negative volume in hundredths of a microliter (µL × 100)
///
/// Grid values such as `12.4` or `0.65` are parsed exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Volume(u32);

impl Volume {
    /// Empty volume
    pub const ZERO: Volume = Volume(0);

    /// Whole microliters, saturating at the largest representable volume
    pub const fn from_ul(ul: u32) -> Self {
        Self(ul.saturating_mul(100))
    }

    /// Hundredths of a microliter
    pub const fn from_centi_ul(centi_ul: u32) -> Self {
        Self(centi_ul)
    }

    /// Raw value in hundredths of a microliter
    pub const fn centi_ul(self) -> u32 {
        self.0
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub const fn saturating_sub(self, other: Volume) -> Volume {
        Volume(self.0.saturating_sub(other.0))
    }

    pub const fn checked_add(self, other: Volume) -> Option<Volume> {
        match self.0.checked_add(other.0) {
            Some(v) => Some(Volume(v)),
            None => None,
        }
    }

    pub fn min(self, other: Volume) -> Volume {
        if self.0 <= other.0 {
            self
        } else {
            other
        }
    }

    /// Parse a non-negative decimal such as `"250"`, `"12.4"` or `"0.65"`
    ///
    /// At most two fractional digits are accepted; signs, exponents and
    /// empty input are rejected.
    pub fn parse(text: &str) -> Option<Self> {
        let (whole, frac) = match text.split_once('.') {
            Some((w, f)) => (w, f),
            None => (text, ""),
        };
        if whole.is_empty() && frac.is_empty() {
            return None;
        }
        if frac.len() > VOLUME_DECIMALS {
            return None;
        }

        let mut value: u32 = 0;
        for d in whole.bytes() {
            if !d.is_ascii_digit() {
                return None;
            }
            value = value.checked_mul(10)?.checked_add((d - b'0') as u32)?;
        }

        let mut centi: u32 = 0;
        let mut scale = 10;
        for d in frac.bytes() {
            if !d.is_ascii_digit() {
                return None;
            }
            centi += (d - b'0') as u32 * scale;
            scale /= 10;
        }

        value.checked_mul(100)?.checked_add(centi).map(Volume)
    }
}

impl Add for Volume {
    type Output = Volume;

    fn add(self, rhs: Volume) -> Volume {
        Volume(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Volume {
    fn add_assign(&mut self, rhs: Volume) {
        *self = *self + rhs;
    }
}

impl Mul<u32> for Volume {
    type Output = Volume;

    fn mul(self, rhs: u32) -> Volume {
        Volume(self.0.saturating_mul(rhs))
    }
}

impl fmt::Display for Volume {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02} µL", self.0 / 100, self.0 % 100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_decimals() {
        assert_eq!(Volume::parse("250"), Some(Volume::from_ul(250)));
        assert_eq!(Volume::parse("12.4"), Some(Volume::from_centi_ul(1240)));
        assert_eq!(Volume::parse("0.65"), Some(Volume::from_centi_ul(65)));
        assert_eq!(Volume::parse(".5"), Some(Volume::from_centi_ul(50)));
        assert_eq!(Volume::parse("7."), Some(Volume::from_ul(7)));
        assert_eq!(Volume::parse("0"), Some(Volume::ZERO));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(Volume::parse("").is_none());
        assert!(Volume::parse(".").is_none());
        assert!(Volume::parse("-1").is_none());
        assert!(Volume::parse("1.234").is_none());
        assert!(Volume::parse("1e3").is_none());
        assert!(Volume::parse("TRUE").is_none());
        assert!(Volume::parse("99999999999").is_none());
    }

    #[test]
    fn test_arithmetic_saturates() {
        let a = Volume::from_ul(30);
        let b = Volume::from_ul(250);
        assert_eq!(a.saturating_sub(b), Volume::ZERO);
        assert_eq!(b.saturating_sub(a), Volume::from_ul(220));
        assert_eq!(a * 3, Volume::from_ul(90));
        assert_eq!(a.min(b), a);
    }

    #[test]
    fn test_from_ul_saturates() {
        assert_eq!(Volume::from_ul(u32::MAX), Volume::from_centi_ul(u32::MAX));
        assert_eq!(Volume::from_ul(u32::MAX / 100 + 1), Volume::from_centi_ul(u32::MAX));
        assert_eq!(Volume::from_ul(u32::MAX / 100), Volume::from_centi_ul(u32::MAX / 100 * 100));
    }
}
