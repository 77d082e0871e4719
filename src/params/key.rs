use std::fmt;

use sha2::{Digest, Sha256};

use super::canonical::to_canonical_string;
use super::ParameterSet;

/// Lowercase hex SHA-256 digest identifying one canonical parameter set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    /// Hash `name=<canonical json>` pairs, sorted by name and joined by `&`.
    pub fn derive(params: &ParameterSet) -> Self {
        let mut entries: Vec<_> = params.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));

        let canonical = entries
            .into_iter()
            .map(|(name, value)| format!("{}={}", name, to_canonical_string(value)))
            .collect::<Vec<_>>()
            .join("&");

        let mut hasher = Sha256::new();
        hasher.update(canonical.as_bytes());
        Self(hex::encode(hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
