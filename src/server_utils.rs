use rand::distr::Alphanumeric;
use rand::Rng as _;

use crate::constants::DEFAULT_PLAYER_NAME;

pub fn sanitize_name(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return DEFAULT_PLAYER_NAME.to_string();
    }
    trimmed.chars().take(16).collect()
}

/// Opaque identifier handed to a client exactly once; holding it is the
/// only proof of ownership for a player resource.
pub fn make_uid() -> String {
    random_token(24)
}

pub fn make_admin_uid() -> String {
    random_token(32)
}

fn random_token(length: usize) -> String {
    rand::rng()
        .sample_iter(Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_name_applies_trim_empty_and_max_len() {
        assert_eq!(sanitize_name(""), "anonymous");
        assert_eq!(sanitize_name("   "), "anonymous");
        assert_eq!(sanitize_name(" Alice "), "Alice");
        assert_eq!(sanitize_name("12345678901234567890"), "1234567890123456");
    }

    #[test]
    fn uids_are_alphanumeric_and_distinct() {
        let first = make_uid();
        let second = make_uid();
        assert_eq!(first.len(), 24);
        assert!(first.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(first, second);
    }

    #[test]
    fn admin_uid_is_longer_than_player_uids() {
        assert_eq!(make_admin_uid().len(), 32);
    }
}
