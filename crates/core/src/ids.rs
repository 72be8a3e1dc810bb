use chrono::Utc;
use uuid::Uuid;

/// Length of every generated identifier.
pub const ID_LENGTH: usize = 26;

const ENCODING: &[u8; 32] = b"ybndrfg8ejkmcpqxot1uwisza345h769";

/// Generates a random 26-character identifier.
///
/// The 128 random bits of a v4 UUID are rendered five bits at a time using a
/// lowercase base32 alphabet, so every identifier is also a valid role name.
#[must_use]
pub fn new_id() -> String {
    let mut value = Uuid::new_v4().as_u128();
    let mut encoded = [0_u8; ID_LENGTH];

    for slot in encoded.iter_mut().rev() {
        *slot = ENCODING[(value & 0x1f) as usize];
        value >>= 5;
    }

    encoded.iter().map(|byte| char::from(*byte)).collect()
}

/// Returns whether a value has the shape of a generated identifier.
#[must_use]
pub fn is_valid_id(value: &str) -> bool {
    value.len() == ID_LENGTH
        && value
            .bytes()
            .all(|byte| byte.is_ascii_lowercase() || byte.is_ascii_digit())
}

/// Current wall-clock time in milliseconds since the Unix epoch.
#[must_use]
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::{ID_LENGTH, is_valid_id, new_id, now_millis};

    #[test]
    fn generated_ids_are_valid_and_distinct() {
        let first = new_id();
        let second = new_id();

        assert_eq!(first.len(), ID_LENGTH);
        assert!(is_valid_id(first.as_str()));
        assert_ne!(first, second);
    }

    #[test]
    fn malformed_ids_are_rejected() {
        assert!(!is_valid_id("short"));
        assert!(!is_valid_id("ABCDEFGHIJKLMNOPQRSTUVWXYZ"));
        assert!(!is_valid_id("abcdefghijklmnopqrstuvwxy-"));
    }

    #[test]
    fn clock_is_after_2020() {
        assert!(now_millis() > 1_577_836_800_000);
    }
}
