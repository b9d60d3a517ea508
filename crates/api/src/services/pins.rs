//! One-time PIN generation and expiry.
//!
//! The same six-digit PINs gate registration, password resets, and order
//! confirmation, and all of them expire after [`PIN_TTL_MINUTES`].

use chrono::{DateTime, Duration, Utc};
use rand::Rng;

/// How long an emailed PIN stays valid.
pub const PIN_TTL_MINUTES: i64 = 10;

/// Generate a random six-digit PIN.
///
/// Uniform over `000000..=999999`; leading zeros are preserved, so every
/// PIN is exactly six characters.
#[must_use]
pub fn generate_pin() -> String {
    format!("{:06}", rand::rng().random_range(0..1_000_000))
}

/// The expiry timestamp for a PIN issued at `now`.
#[must_use]
pub fn expiry_from(now: DateTime<Utc>) -> DateTime<Utc> {
    now + Duration::minutes(PIN_TTL_MINUTES)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_pin_is_always_six_digits() {
        for _ in 0..1000 {
            let pin = generate_pin();
            assert_eq!(pin.len(), 6);
            assert!(pin.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn test_pin_is_in_range() {
        for _ in 0..100 {
            let pin: u32 = generate_pin().parse().unwrap();
            assert!(pin < 1_000_000);
        }
    }

    #[test]
    fn test_expiry_is_ten_minutes_out() {
        let now = Utc::now();
        assert_eq!(expiry_from(now) - now, Duration::minutes(10));
    }
}
