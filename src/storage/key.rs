use crate::prelude::*;
use rand::rngs::OsRng;
use rand::RngCore;
use std::fmt;

/// Random bytes in front of every key; hex-encoded this is 12 characters.
pub const KEY_PREFIX_BYTES: usize = 6;

/// Address of an uploaded object: a random hex prefix followed by the
/// caller's identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UploadKey(String);

impl UploadKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for UploadKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Draws the prefix from the OS CSPRNG. A failing random source is an error,
/// there is no weaker fallback.
pub fn generate_key(identifier: &str) -> Result<UploadKey> {
    let mut prefix = [0u8; KEY_PREFIX_BYTES];
    OsRng.try_fill_bytes(&mut prefix)?;
    Ok(UploadKey(format!("{}{}", hex::encode(prefix), identifier)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;
    use std::collections::HashSet;
    use test_case::test_case;

    #[test_case("file-id" ; "plain identifier")]
    #[test_case("" ; "empty identifier")]
    #[test_case("reports/2024/q1.pdf" ; "path-like identifier")]
    fn key_is_hex_prefix_plus_identifier(identifier: &str) {
        let key = generate_key(identifier).unwrap();
        let pattern = Regex::new(&format!("^[0-9a-f]{{12}}{}$", regex::escape(identifier))).unwrap();
        assert!(pattern.is_match(key.as_str()), "unexpected key {}", key);
    }

    #[test]
    fn same_identifier_yields_distinct_keys() {
        let first = generate_key("file-id").unwrap();
        let second = generate_key("file-id").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn prefixes_do_not_collide_in_practice() {
        let keys: HashSet<_> = (0..1000)
            .map(|_| generate_key("x").unwrap().into_string())
            .collect();
        assert_eq!(keys.len(), 1000);
    }
}
