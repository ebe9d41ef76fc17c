//! Repository name validation.
//!
//! Valid repository names:
//! - One or more `/`-separated components, at most 255 characters in total
//! - Each component is lowercase alphanumerics, optionally joined by a single
//!   `.`, `_` or `-` (a separator never starts or ends a component)
//!
//! The rules keep every name usable as a sequence of storage key segments.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::TypeError;

const MAX_LEN: usize = 255;

/// Validated repository identifier, e.g. `library/alpine`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RepoName(String);

impl RepoName {
    /// Validate `name` and wrap it.
    ///
    /// ```
    /// use dockyard_types::RepoName;
    ///
    /// assert!(RepoName::new("library/alpine").is_ok());
    /// assert!(RepoName::new("my-app_v2.test").is_ok());
    /// assert!(RepoName::new("Library").is_err());
    /// assert!(RepoName::new("a//b").is_err());
    /// ```
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        validate(&name)?;
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The `/`-separated components of the name.
    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }
}

fn validate(name: &str) -> Result<(), TypeError> {
    let invalid = |reason: String| TypeError::InvalidRepoName {
        name: name.to_string(),
        reason,
    };

    if name.is_empty() {
        return Err(invalid("must not be empty".into()));
    }
    if name.len() > MAX_LEN {
        return Err(invalid(format!("longer than {MAX_LEN} characters")));
    }
    for component in name.split('/') {
        if component.is_empty() {
            return Err(invalid("empty path component".into()));
        }
        let mut prev_sep = true;
        for ch in component.chars() {
            match ch {
                'a'..='z' | '0'..='9' => prev_sep = false,
                '.' | '_' | '-' => {
                    if prev_sep {
                        return Err(invalid(format!(
                            "separator {ch:?} must follow an alphanumeric in {component:?}"
                        )));
                    }
                    prev_sep = true;
                }
                other => {
                    return Err(invalid(format!("forbidden character {other:?}")));
                }
            }
        }
        if prev_sep {
            return Err(invalid(format!(
                "component {component:?} must end with an alphanumeric"
            )));
        }
    }
    Ok(())
}

impl fmt::Display for RepoName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for RepoName {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl Serialize for RepoName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for RepoName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::new(s).map_err(serde::de::Error::custom)
    }
}
