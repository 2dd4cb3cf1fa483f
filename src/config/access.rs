//! Chat and user allow-lists.

use std::collections::HashSet;

/// Allow-lists deciding who may talk to the bot.
///
/// An empty list places no restriction on its dimension, so a policy with
/// both lists empty admits everyone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessPolicy {
    allowed_chats: HashSet<i64>,
    allowed_users: HashSet<i64>,
}

impl AccessPolicy {
    /// Creates a policy from chat and user allow-lists.
    #[must_use]
    pub const fn new(allowed_chats: HashSet<i64>, allowed_users: HashSet<i64>) -> Self {
        Self {
            allowed_chats,
            allowed_users,
        }
    }

    /// Returns whether `user_id` writing in `chat_id` may use the bot.
    ///
    /// Each non-empty list must independently admit the caller.
    #[must_use]
    pub fn authorize(&self, user_id: i64, chat_id: i64) -> bool {
        if !self.allowed_chats.is_empty() && !self.allowed_chats.contains(&chat_id) {
            return false;
        }

        if !self.allowed_users.is_empty() && !self.allowed_users.contains(&user_id) {
            return false;
        }

        true
    }

    /// Returns true when neither list is configured.
    #[must_use]
    pub fn is_unrestricted(&self) -> bool {
        self.allowed_chats.is_empty() && self.allowed_users.is_empty()
    }

    /// Number of allowed chats.
    #[must_use]
    pub fn chat_count(&self) -> usize {
        self.allowed_chats.len()
    }

    /// Number of allowed users.
    #[must_use]
    pub fn user_count(&self) -> usize {
        self.allowed_users.len()
    }
}

/// Parses a comma-separated list of numeric ids.
///
/// Blank entries are skipped. On failure the offending entry is returned.
pub fn parse_id_list(raw: &str) -> Result<HashSet<i64>, String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<i64>().map_err(|_| s.to_owned()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(list: &[i64]) -> HashSet<i64> {
        list.iter().copied().collect()
    }

    #[test]
    fn test_unrestricted_allows_everyone() {
        let policy = AccessPolicy::default();
        assert!(policy.is_unrestricted());
        assert!(policy.authorize(1, 2));
        assert!(policy.authorize(-5, 999));
    }

    #[test]
    fn test_chat_only_restriction() {
        let policy = AccessPolicy::new(ids(&[123]), HashSet::new());
        assert!(policy.authorize(999, 123));
        assert!(!policy.authorize(999, 456));
    }

    #[test]
    fn test_user_only_restriction() {
        let policy = AccessPolicy::new(HashSet::new(), ids(&[7, 8]));
        assert!(policy.authorize(7, 1));
        assert!(policy.authorize(8, 2));
        assert!(!policy.authorize(9, 1));
    }

    #[test]
    fn test_both_lists_must_pass() {
        let policy = AccessPolicy::new(ids(&[123]), ids(&[7]));
        assert!(policy.authorize(7, 123));
        assert!(!policy.authorize(7, 456));
        assert!(!policy.authorize(8, 123));
        assert!(!policy.authorize(8, 456));
        assert!(!policy.is_unrestricted());
    }

    #[test]
    fn test_parse_id_list() {
        assert_eq!(parse_id_list("123456,789012").unwrap(), ids(&[123_456, 789_012]));
        assert_eq!(parse_id_list(" 1 , 2 ,, ").unwrap(), ids(&[1, 2]));
        assert_eq!(parse_id_list("42").unwrap(), ids(&[42]));
        assert!(parse_id_list("").unwrap().is_empty());
        assert_eq!(parse_id_list("1,abc,3").unwrap_err(), "abc");
    }
}
