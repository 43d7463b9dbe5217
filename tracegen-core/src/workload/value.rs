//! Value payload generation

use crate::seed::{components, derive_seed};
use tracegen_common::{AcknowledgedCounter, Variate};

/// Symbols a generated value is drawn from.
pub const CHARSET: &[u8; 73] =
    b"     ,;:.!?0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Random printable payloads with uniformly distributed length
///
/// Length is uniform over `[min_size, max_size]`; each character is drawn
/// independently and uniformly from `CHARSET`.
pub struct ValueGenerator {
    length: Variate,
    charset: Variate,
}

impl ValueGenerator {
    /// Both streams are derived from `seed`.
    pub fn with_seed(min_size: u64, max_size: u64, seed: u64) -> anyhow::Result<Self> {
        if min_size > max_size {
            anyhow::bail!("value min size ({}) must be <= max size ({})", min_size, max_size);
        }

        let length =
            Variate::uniform(min_size, max_size, derive_seed(seed, components::VALUE_LENGTH))?;
        let charset = Variate::uniform(
            0,
            CHARSET.len() as u64 - 1,
            derive_seed(seed, components::VALUE_CHARSET),
        )?;
        Ok(Self { length, charset })
    }

    pub fn next_value(&mut self, frontier: &AcknowledgedCounter) -> String {
        let length = self.length.next_value(frontier);
        (0..length)
            .map(|_| CHARSET[self.charset.next_value(frontier) as usize] as char)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_charset_size() {
        assert_eq!(CHARSET.len(), 73);
        assert!(CHARSET.iter().all(|c| c.is_ascii_graphic() || *c == b' '));
    }

    #[test]
    fn test_lengths_in_range() {
        let frontier = AcknowledgedCounter::new(1);
        let mut gen = ValueGenerator::with_seed(10, 20, 7).unwrap();
        for _ in 0..1000 {
            let value = gen.next_value(&frontier);
            assert!((10..=20).contains(&value.len()), "length {} out of range", value.len());
            assert!(value.bytes().all(|b| CHARSET.contains(&b)));
        }
    }

    #[test]
    fn test_fixed_length() {
        let frontier = AcknowledgedCounter::new(1);
        let mut gen = ValueGenerator::with_seed(64, 64, 0).unwrap();
        assert_eq!(gen.next_value(&frontier).len(), 64);
    }

    #[test]
    fn test_zero_length_allowed() {
        let frontier = AcknowledgedCounter::new(1);
        let mut gen = ValueGenerator::with_seed(0, 0, 0).unwrap();
        assert!(gen.next_value(&frontier).is_empty());
    }

    #[test]
    fn test_deterministic() {
        let frontier = AcknowledgedCounter::new(1);
        let mut a = ValueGenerator::with_seed(5, 50, 99).unwrap();
        let mut b = ValueGenerator::with_seed(5, 50, 99).unwrap();
        for _ in 0..100 {
            assert_eq!(a.next_value(&frontier), b.next_value(&frontier));
        }
    }

    #[test]
    fn test_uses_whole_charset() {
        let frontier = AcknowledgedCounter::new(1);
        let mut gen = ValueGenerator::with_seed(100, 100, 3).unwrap();
        let mut seen = HashSet::new();
        for _ in 0..100 {
            seen.extend(gen.next_value(&frontier).chars());
        }
        // 10_000 draws over 73 slots; the space fills five of them.
        assert_eq!(seen.len(), 69);
    }

    #[test]
    fn test_rejects_inverted_bounds() {
        assert!(ValueGenerator::with_seed(10, 5, 0).is_err());
    }
}
