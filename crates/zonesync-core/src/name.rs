// # Domain names
//
// A `DomainName` is a validated, immutable domain name that keeps the
// exact text it was parsed from. Names may be relative ("example.com")
// or fully qualified ("example.com."); both spellings are accepted
// everywhere and only differ in `is_fqdn()`.
//
// Grammar: dot-separated labels of 1-63 characters from `[A-Za-z0-9-]`,
// never starting or ending with `-`. At most 253 characters, or 254 when
// the trailing root dot is present. The single character "." is the root.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Maximum length of a label
const MAX_LABEL_LEN: usize = 63;

/// Maximum length of a name without the trailing dot
const MAX_NAME_LEN: usize = 253;

/// A validated DNS domain name
///
/// The textual form is the canonical representation: parsing is
/// idempotent and `to_string()` returns exactly the parsed input.
///
/// # Example
///
/// ```rust
/// use zonesync_core::DomainName;
///
/// let name: DomainName = "www.example.com".parse().unwrap();
/// assert!(!name.is_fqdn());
/// assert_eq!(name.to_fqdn().as_str(), "www.example.com.");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DomainName(String);

impl DomainName {
    /// Parse and validate a domain name
    pub fn parse(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if is_valid_domain_name(&name) {
            Ok(Self(name))
        } else {
            Err(Error::invalid_name(if name.is_empty() {
                "<empty>".to_string()
            } else {
                name
            }))
        }
    }

    /// The root domain "."
    pub fn root() -> Self {
        Self(".".to_string())
    }

    /// Whether this is the root domain
    pub fn is_root(&self) -> bool {
        self.0 == "."
    }

    /// Whether the name ends with the root dot
    pub fn is_fqdn(&self) -> bool {
        self.0.ends_with('.')
    }

    /// Fully qualified form of this name (idempotent)
    pub fn to_fqdn(&self) -> Self {
        if self.is_fqdn() {
            self.clone()
        } else {
            Self(format!("{}.", self.0))
        }
    }

    /// Name without the trailing root dot
    ///
    /// The root domain yields the empty string.
    pub fn trim_root(&self) -> &str {
        self.0.strip_suffix('.').unwrap_or(&self.0)
    }

    /// Whether this name is a child of `parent`
    ///
    /// Trailing dots are ignored on both sides, then `parent` must be a
    /// suffix of `self`. The match is on raw text, not on label
    /// boundaries: "example.com" is a child of "le.com".
    pub fn is_child_of(&self, parent: &DomainName) -> bool {
        self.trim_root().ends_with(parent.trim_root())
    }

    /// Borrow the textual form
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DomainName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for DomainName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for DomainName {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(value)
    }
}

impl From<DomainName> for String {
    fn from(name: DomainName) -> Self {
        name.0
    }
}

impl AsRef<str> for DomainName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

fn is_valid_domain_name(name: &str) -> bool {
    if name.is_empty() {
        return false;
    }

    if name == "." {
        return true;
    }

    let relative = name.strip_suffix('.').unwrap_or(name);
    if relative.len() > MAX_NAME_LEN {
        return false;
    }

    relative.split('.').all(is_valid_label)
}

fn is_valid_label(label: &str) -> bool {
    !label.is_empty()
        && label.len() <= MAX_LABEL_LEN
        && label.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-')
        && !label.starts_with('-')
        && !label.ends_with('-')
}
