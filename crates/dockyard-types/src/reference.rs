use std::fmt;
use std::str::FromStr;

use crate::digest::Digest;
use crate::error::TypeError;

const MAX_TAG_LEN: usize = 128;

/// A validated tag name. Always exactly one storage path segment.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tag(String);

impl Tag {
    pub fn new(tag: impl Into<String>) -> Result<Self, TypeError> {
        let tag = tag.into();
        validate_tag(&tag)?;
        Ok(Self(tag))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Tag {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// A repository-scoped reference to a manifest: a tag or a digest.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ManifestRef {
    Tag(Tag),
    Digest(Digest),
}

impl ManifestRef {
    /// Build a tag reference, validating the tag.
    pub fn tag(tag: impl Into<String>) -> Result<Self, TypeError> {
        Ok(Self::Tag(Tag::new(tag)?))
    }

    /// Interpret a reference string as it appears in a request path.
    ///
    /// Tags cannot contain `:`, so any string with one must be a digest.
    pub fn parse(s: &str) -> Result<Self, TypeError> {
        if s.contains(':') {
            Ok(Self::Digest(Digest::parse(s)?))
        } else {
            Self::tag(s)
        }
    }

    /// Canonical link path under a repository's `_manifests` directory.
    ///
    /// Tags live at `tags/<tag>/current/link`, digests at
    /// `revisions/<alg>/<hex>/link`.
    pub fn link(&self) -> String {
        match self {
            Self::Tag(tag) => format!("tags/{tag}/current/link"),
            Self::Digest(d) => format!("revisions/{}/{}/link", d.algorithm(), d.hex()),
        }
    }

    pub fn is_tag(&self) -> bool {
        matches!(self, Self::Tag(_))
    }
}

fn validate_tag(tag: &str) -> Result<(), TypeError> {
    let invalid = |reason: &str| TypeError::InvalidTag {
        tag: tag.to_string(),
        reason: reason.to_string(),
    };
    let mut chars = tag.chars();
    match chars.next() {
        None => return Err(invalid("must not be empty")),
        Some(c) if c.is_ascii_alphanumeric() || c == '_' => {}
        Some(_) => return Err(invalid("must start with an alphanumeric or '_'")),
    }
    if tag.len() > MAX_TAG_LEN {
        return Err(invalid("longer than 128 characters"));
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-')) {
        return Err(invalid("only alphanumerics, '_', '.' and '-' are allowed"));
    }
    Ok(())
}

impl fmt::Display for ManifestRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tag(tag) => write!(f, "{tag}"),
            Self::Digest(d) => write!(f, "{d}"),
        }
    }
}

impl From<Tag> for ManifestRef {
    fn from(tag: Tag) -> Self {
        Self::Tag(tag)
    }
}

impl From<Digest> for ManifestRef {
    fn from(digest: Digest) -> Self {
        Self::Digest(digest)
    }
}
