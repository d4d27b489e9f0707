//! Opaque record ids and text timestamps.
//!
//! Ids are the current unix time in milliseconds rendered in base 36 followed by eight random
//! base-36 characters. Timestamps use the process-local clock at second precision and are
//! rendered as `YYYY-MM-DD HH:MM:SS` on every write path.

use chrono::Local;
use rand::Rng;

const ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const SUFFIX_LEN: usize = 8;

/// Text format shared by every generated timestamp.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn base36(mut n: u64) -> String {
    if n == 0 {
        return "0".into();
    }
    let mut digits = Vec::new();
    while n > 0 {
        digits.push(ALPHABET[(n % 36) as usize]);
        n /= 36;
    }
    digits.reverse();
    String::from_utf8_lossy(&digits).into_owned()
}

/// Generate a collision-resistant opaque id.
pub fn uniqid() -> String {
    let millis = Local::now().timestamp_millis().max(0) as u64;
    let mut rng = rand::thread_rng();
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect();
    format!("{}{}", base36(millis), suffix)
}

/// Current local time as `YYYY-MM-DD HH:MM:SS`.
pub fn now_timestamp() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn base36_renders_known_values() {
        assert_eq!(base36(0), "0");
        assert_eq!(base36(35), "z");
        assert_eq!(base36(36), "10");
    }

    #[test]
    fn ids_are_unique_and_alphanumeric() {
        let ids: HashSet<String> = (0..1000).map(|_| uniqid()).collect();
        assert_eq!(ids.len(), 1000);
        assert!(ids.iter().all(|id| id.bytes().all(|b| ALPHABET.contains(&b))));
    }

    #[test]
    fn timestamp_has_second_precision_layout() {
        let ts = now_timestamp();
        assert_eq!(ts.len(), 19);
        assert!(chrono::NaiveDateTime::parse_from_str(&ts, TIMESTAMP_FORMAT).is_ok());
    }
}
