use std::fmt;

use crate::error::{StoreError, StoreResult};

/// Storage key: an ordered, non-empty list of path segments.
///
/// Rendered with `/` between segments. Segments are never empty and never
/// `.` or `..`, so every key maps to a path strictly below a backend's root.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Key {
    segments: Vec<String>,
}

impl Key {
    /// Build a key from individual segments. Segments must not contain `/`.
    pub fn from_segments<I, S>(segments: I) -> StoreResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        if segments.is_empty() {
            return Err(StoreError::InvalidKey {
                key: String::new(),
                reason: "key has no segments".into(),
            });
        }
        for segment in &segments {
            check_segment(segment, &segments)?;
        }
        Ok(Self { segments })
    }

    /// Parse a `/`-separated path into a key.
    pub fn parse(path: &str) -> StoreResult<Self> {
        Self::from_segments(path.split('/'))
    }

    /// Append the segments of a `/`-separated path to this key.
    pub fn join(&self, path: &str) -> StoreResult<Self> {
        let tail = Self::parse(path)?;
        let mut segments = self.segments.clone();
        segments.extend(tail.segments);
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// The final segment.
    pub fn name(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or_default()
    }

    /// Returns `true` if `prefix`'s segments are a leading run of this key's.
    pub fn starts_with(&self, prefix: &Key) -> bool {
        self.segments.starts_with(&prefix.segments)
    }

    pub fn as_string(&self) -> String {
        self.segments.join("/")
    }
}

fn check_segment(segment: &str, all: &[String]) -> StoreResult<()> {
    let reason = if segment.is_empty() {
        "empty segment"
    } else if segment == "." || segment == ".." {
        "relative segment"
    } else if segment.contains('/') {
        "segment contains '/'"
    } else if segment.contains('\0') {
        "segment contains NUL"
    } else {
        return Ok(());
    };
    Err(StoreError::InvalidKey {
        key: all.join("/"),
        reason: reason.into(),
    })
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_string())
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Key({})", self.as_string())
    }
}
