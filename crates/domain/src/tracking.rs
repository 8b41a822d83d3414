//! Tracking number generation.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Generates a tracking number from the current time.
///
/// Format: `TRK-YYYYMMDD-XXXXXXXX` with a random hex suffix. The generator
/// makes collisions unlikely; uniqueness is enforced by the storage
/// constraint on the orders table, not here.
pub fn generate_tracking_number() -> String {
    tracking_number_at(Utc::now())
}

/// Generates a tracking number for an explicit timestamp.
pub fn tracking_number_at(at: DateTime<Utc>) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("TRK-{}-{}", at.format("%Y%m%d"), &suffix[..8])
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn embeds_the_date() {
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 12, 0, 0).unwrap();
        let tracking = tracking_number_at(at);
        assert!(tracking.starts_with("TRK-20240309-"));
        assert_eq!(tracking.len(), "TRK-20240309-".len() + 8);
    }

    #[test]
    fn successive_numbers_differ() {
        let a = generate_tracking_number();
        let b = generate_tracking_number();
        assert_ne!(a, b);
    }
}
