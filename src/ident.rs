//! # Identifier Sanitization
//!
//! WiX element identifiers may only contain ASCII letters, digits, and
//! underscores, and must not start with a digit. File and directory names
//! rarely cooperate, so every name goes through [`sanitize_id`] before it
//! becomes an `Id` attribute, and every produced id is claimed through an
//! [`IdPool`] to keep them unique across the whole document.

use std::collections::HashSet;
use uuid::Uuid;

/// Turns an arbitrary file or directory name into a valid WiX id token.
///
/// - Every character outside `[A-Za-z0-9_]` becomes an underscore.
/// - A leading digit gets an `id_` prefix.
/// - An empty input falls back to a random `id_<hex>` token. This is the
///   only non-deterministic branch; non-empty input always maps to the
///   same output.
pub fn sanitize_id(name: &str) -> String {
    let mut id: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();

    if id.starts_with(|c: char| c.is_ascii_digit()) {
        id.insert_str(0, "id_");
    }

    if id.is_empty() {
        id = format!("id_{}", Uuid::new_v4().simple());
    }

    id
}

/// Run-scoped registry of identifiers already used in the document.
///
/// Passed by mutable reference through the scan, never stored globally, so
/// repeated runs within one process start from a clean slate.
#[derive(Debug, Default)]
pub struct IdPool {
    used: HashSet<String>,
    counter: u32,
}

impl IdPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `base` if it is still free, otherwise `base_<n>` for the
    /// first free `n`. The counter is monotonic across all claims, so a
    /// resolved collision can never reintroduce an earlier id.
    pub fn claim(&mut self, base: &str) -> String {
        let mut id = base.to_string();
        while self.used.contains(&id) {
            self.counter += 1;
            id = format!("{}_{}", base, self.counter);
        }
        self.used.insert(id.clone());
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn replaces_invalid_characters() {
        assert_eq!(sanitize_id("my app-1.0"), "my_app_1_0");
        assert_eq!(sanitize_id("héllo"), "h_llo");
    }

    #[test]
    fn prefixes_leading_digit() {
        assert_eq!(sanitize_id("7zip"), "id_7zip");
    }

    #[test]
    fn empty_name_falls_back_to_random_token() {
        let id = sanitize_id("");
        assert!(id.starts_with("id_"));
        assert!(id.len() > "id_".len());
    }

    #[test]
    fn collisions_get_counter_suffixes() {
        let mut pool = IdPool::new();
        assert_eq!(pool.claim("File_readme"), "File_readme");
        assert_eq!(pool.claim("File_readme"), "File_readme_1");
        assert_eq!(pool.claim("File_readme"), "File_readme_2");
        assert_eq!(pool.claim("File_other"), "File_other");
    }

    proptest! {
        #[test]
        fn sanitized_ids_are_valid_tokens(name in ".*") {
            let id = sanitize_id(&name);
            prop_assert!(!id.is_empty());
            prop_assert!(!id.starts_with(|c: char| c.is_ascii_digit()));
            prop_assert!(id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'));
        }

        #[test]
        fn sanitize_is_deterministic_for_nonempty_names(name in ".+") {
            prop_assert_eq!(sanitize_id(&name), sanitize_id(&name));
        }

        #[test]
        fn claimed_ids_are_pairwise_distinct(
            bases in prop::collection::vec("[A-Za-z_][A-Za-z0-9_]{0,8}", 1..50)
        ) {
            let mut pool = IdPool::new();
            let claimed: Vec<String> = bases.iter().map(|b| pool.claim(b)).collect();
            let unique: std::collections::HashSet<&String> = claimed.iter().collect();
            prop_assert_eq!(unique.len(), claimed.len());
        }
    }
}
