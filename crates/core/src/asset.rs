//! Domain-qualified asset locations.
//!
//! Sounds, shapes and block codes are referenced as `domain:path`
//! (e.g. `slidingwindows:sounds/weather/rain-on-glass-1`). A bare path falls
//! back to [`DEFAULT_DOMAIN`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Domain used when a location omits an explicit one.
pub const DEFAULT_DOMAIN: &str = "game";

/// Error returned when parsing an invalid [`AssetLocation`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssetLocationError {
    /// Nothing but whitespace.
    #[error("asset location cannot be empty")]
    Empty,
    /// Domain part failed validation.
    #[error("asset domain {0:?} is invalid (allowed: a-z0-9_.-, max 64)")]
    InvalidDomain(String),
    /// Path part failed validation.
    #[error("asset path {0:?} is invalid (allowed: a-z0-9_./-, max 256)")]
    InvalidPath(String),
}

/// A domain-qualified asset reference of the form `domain:path`.
///
/// Paths are case-insensitive and stored lowercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AssetLocation {
    domain: String,
    path: String,
}

impl AssetLocation {
    /// Parse a location, defaulting the domain to [`DEFAULT_DOMAIN`].
    pub fn parse(input: &str) -> Result<Self, AssetLocationError> {
        Self::parse_with_default_domain(input, DEFAULT_DOMAIN)
    }

    /// Parse a location using a caller-provided default domain.
    pub fn parse_with_default_domain(
        input: &str,
        default_domain: &str,
    ) -> Result<Self, AssetLocationError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(AssetLocationError::Empty);
        }

        let (domain, path) = match input.split_once(':') {
            Some((d, p)) => (d.trim(), p.trim()),
            None => (default_domain, input),
        };
        let domain = domain.to_ascii_lowercase();
        let path = path.to_ascii_lowercase();

        if domain.is_empty()
            || domain.len() > 64
            || !domain
                .chars()
                .all(|c| matches!(c, 'a'..='z' | '0'..='9' | '_' | '-' | '.'))
        {
            return Err(AssetLocationError::InvalidDomain(domain));
        }
        if path.is_empty()
            || path.len() > 256
            || !path
                .chars()
                .all(|c| matches!(c, 'a'..='z' | '0'..='9' | '_' | '-' | '.' | '/'))
        {
            return Err(AssetLocationError::InvalidPath(path));
        }

        Ok(Self { domain, path })
    }

    /// Build from parts already known to be valid (lowercased as a courtesy).
    pub fn from_parts(domain: &str, path: &str) -> Self {
        Self {
            domain: domain.to_ascii_lowercase(),
            path: path.to_ascii_lowercase(),
        }
    }

    /// Asset domain (mod id).
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Asset path within the domain.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Copy with `suffix` appended to the path.
    pub fn with_path_suffix(&self, suffix: &str) -> Self {
        Self {
            domain: self.domain.clone(),
            path: format!("{}{}", self.path, suffix),
        }
    }
}

impl fmt::Display for AssetLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.domain, self.path)
    }
}

impl FromStr for AssetLocation {
    type Err = AssetLocationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for AssetLocation {
    type Error = AssetLocationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<AssetLocation> for String {
    fn from(value: AssetLocation) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_domain_qualified_location() {
        let loc = AssetLocation::parse("slidingwindows:sounds/weather/rain-on-glass-1").unwrap();
        assert_eq!(loc.domain(), "slidingwindows");
        assert_eq!(loc.path(), "sounds/weather/rain-on-glass-1");
    }

    #[test]
    fn bare_path_uses_default_domain() {
        let loc = AssetLocation::parse("sounds/block/door").unwrap();
        assert_eq!(loc.to_string(), "game:sounds/block/door");
    }

    #[test]
    fn paths_are_lowercased() {
        let loc = AssetLocation::parse("Game:Sounds/Block/Door").unwrap();
        assert_eq!(loc.to_string(), "game:sounds/block/door");
    }

    #[test]
    fn rejects_malformed_input() {
        assert_eq!(AssetLocation::parse("  "), Err(AssetLocationError::Empty));
        assert!(AssetLocation::parse("game:").is_err());
        assert!(AssetLocation::parse(":door").is_err());
        assert!(AssetLocation::parse("game:door?").is_err());
    }

    #[test]
    fn suffix_keeps_domain() {
        let loc = AssetLocation::parse("slidingwindows:window-1x2").unwrap();
        assert_eq!(
            loc.with_path_suffix("-alt").to_string(),
            "slidingwindows:window-1x2-alt"
        );
        assert_eq!(String::from(loc), "slidingwindows:window-1x2");
    }
}
