use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const UPPERCASE: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const BASE36: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

pub const FALLBACK_PACKAGE_PREFIX: &str = "PZA";

/// Produces business identifiers for new records.
///
/// Identifiers are random with no collision retry; the store's uniqueness
/// index is the only guard.
pub trait IdGenerator: Send + Sync {
    /// `Dxx-yy-XXX`
    fn driver_id(&self) -> String;

    /// `PXX-II-nnn` from the sender's initials, or `PZA-XXXXXXXX` when
    /// either name cannot supply an initial.
    fn package_id(&self, first_name: Option<&str>, last_name: Option<&str>) -> String;
}

pub struct RandomIdGenerator {
    segment: u8,
    rng: Mutex<StdRng>,
}

impl RandomIdGenerator {
    /// `segment` is the fixed middle part of driver ids and must be below 100.
    pub fn new(segment: u8) -> Self {
        Self::with_rng(segment, StdRng::from_os_rng())
    }

    pub fn seeded(segment: u8, seed: u64) -> Self {
        Self::with_rng(segment, StdRng::seed_from_u64(seed))
    }

    fn with_rng(segment: u8, rng: StdRng) -> Self {
        Self {
            segment: segment % 100,
            rng: Mutex::new(rng),
        }
    }

    fn draw<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> T {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut rng)
    }
}

impl IdGenerator for RandomIdGenerator {
    fn driver_id(&self) -> String {
        let (digits, letters) = self.draw(|rng| {
            let digits = rng.random_range(0..100u8);
            (digits, pick(rng, UPPERCASE, 3))
        });

        format!("D{digits:02}-{:02}-{letters}", self.segment)
    }

    fn package_id(&self, first_name: Option<&str>, last_name: Option<&str>) -> String {
        match (first_name.and_then(initial), last_name.and_then(initial)) {
            (Some(first), Some(last)) => {
                let (letters, number) = self.draw(|rng| {
                    (pick(rng, UPPERCASE, 2), rng.random_range(100..=999u16))
                });
                format!("P{letters}-{first}{last}-{number}")
            }
            _ => {
                let token = self.draw(|rng| pick(rng, BASE36, 8));
                format!("{FALLBACK_PACKAGE_PREFIX}-{token}")
            }
        }
    }
}

fn pick(rng: &mut StdRng, charset: &[u8], len: usize) -> String {
    (0..len)
        .map(|_| charset[rng.random_range(0..charset.len())] as char)
        .collect()
}

fn initial(name: &str) -> Option<char> {
    name.trim()
        .chars()
        .next()
        .filter(char::is_ascii_alphabetic)
        .map(|c| c.to_ascii_uppercase())
}

#[cfg(test)]
mod tests {
    use regex::Regex;

    use super::*;
    use crate::models::driver::DRIVER_ID_PATTERN;

    fn named_pattern() -> Regex {
        Regex::new(r"^P[A-Z]{2}-[A-Z]{2}-\d{3}$").unwrap()
    }

    fn fallback_pattern() -> Regex {
        Regex::new(r"^PZA-[A-Z0-9]{8}$").unwrap()
    }

    #[test]
    fn driver_ids_match_format() {
        let ids = RandomIdGenerator::seeded(33, 7);
        for _ in 0..500 {
            let id = ids.driver_id();
            assert!(DRIVER_ID_PATTERN.is_match(&id), "{id}");
            assert_eq!(&id[4..6], "33");
        }
    }

    #[test]
    fn single_digit_segment_is_zero_padded() {
        let id = RandomIdGenerator::seeded(5, 1).driver_id();
        assert_eq!(&id[3..7], "-05-");
    }

    #[test]
    fn named_package_ids_carry_initials() {
        let ids = RandomIdGenerator::seeded(33, 11);
        for _ in 0..500 {
            let id = ids.package_id(Some("alice"), Some("Smith"));
            assert!(named_pattern().is_match(&id), "{id}");
            assert_eq!(&id[4..6], "AS");
            let number: u16 = id[7..].parse().unwrap();
            assert!((100..=999).contains(&number));
        }
    }

    #[test]
    fn missing_names_fall_back_to_token() {
        let ids = RandomIdGenerator::seeded(33, 3);
        for (first, last) in [
            (None, None),
            (Some("Alice"), None),
            (Some(""), Some("Smith")),
            (Some("Alice"), Some("   ")),
            (Some("9lives"), Some("Smith")),
        ] {
            let id = ids.package_id(first, last);
            assert!(fallback_pattern().is_match(&id), "{id}");
        }
    }

    #[test]
    fn seeded_generators_are_deterministic() {
        let a = RandomIdGenerator::seeded(33, 42);
        let b = RandomIdGenerator::seeded(33, 42);
        assert_eq!(a.driver_id(), b.driver_id());
        assert_eq!(a.package_id(None, None), b.package_id(None, None));
    }
}
