use crate::error::{IndexError, Result};

/// Fixed-point scale: ~12 fractional bits of `ln(count + 1.1)`.
pub const WEIGHT_SCALE: f64 = 4096.0;
const COUNT_OFFSET: f64 = 1.1;

/// `floor(ln(count + 1.1) * 4096)`, rejected if it does not fit u16.
///
/// Zero maps to 390, so an unseen character still ranks above nothing.
/// Counts above 8_886_109 are rejected.
pub fn quantize(count: u64) -> Result<u16> {
    let value = ((count as f64 + COUNT_OFFSET).ln() * WEIGHT_SCALE).floor();
    if !(0.0..=u16::MAX as f64).contains(&value) {
        return Err(IndexError::WeightOutOfRange { count, value });
    }
    Ok(value as u16)
}

/// Inverse scale used by readers: the stored weight as `ln(count + 1.1)`.
pub fn log_frequency(weight: u16) -> f64 {
    weight as f64 / WEIGHT_SCALE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_values() {
        assert_eq!(quantize(0).unwrap(), 390);
        assert_eq!(quantize(1000).unwrap(), 28298);
        assert_eq!(quantize(800).unwrap(), 27385);
    }

    #[test]
    fn monotonic() {
        let mut prev = 0;
        for count in (0..200_000u64).chain((1..400).map(|k| 200_000 + k * 20_000)) {
            let w = quantize(count).unwrap();
            assert!(w >= prev, "count {count}: {w} < {prev}");
            prev = w;
        }
    }

    #[test]
    fn rejects_counts_past_u16() {
        assert!(quantize(8_000_000).is_ok());
        assert!(matches!(
            quantize(9_000_000),
            Err(IndexError::WeightOutOfRange { count: 9_000_000, .. })
        ));
        assert!(quantize(u64::MAX).is_err());
    }

    #[test]
    fn log_frequency_inverts_scale() {
        let w = quantize(1000).unwrap();
        assert!((log_frequency(w) - (1001.1f64).ln()).abs() < 1.0 / 4096.0);
    }
}
