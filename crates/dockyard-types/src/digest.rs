use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::TypeError;
use crate::hasher::DigestHasher;

/// Hash algorithms a [`Digest`] may be tagged with.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DigestAlgorithm {
    #[default]
    Sha256,
    Sha512,
}

impl DigestAlgorithm {
    /// The algorithm name as it appears in digest strings and storage keys.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Sha256 => "sha256",
            Self::Sha512 => "sha512",
        }
    }

    /// Number of hex characters in a digest produced by this algorithm.
    pub const fn hex_len(&self) -> usize {
        match self {
            Self::Sha256 => 64,
            Self::Sha512 => 128,
        }
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DigestAlgorithm {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sha256" => Ok(Self::Sha256),
            "sha512" => Ok(Self::Sha512),
            other => Err(TypeError::UnsupportedAlgorithm(other.to_string())),
        }
    }
}

impl Serialize for DigestAlgorithm {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for DigestAlgorithm {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Content identity: an algorithm tag and the lowercase hex of its output.
///
/// Two digests are equal exactly when both the algorithm and the hex value
/// are equal. A `Digest` that names a storage location must come from
/// actually hashing bytes ([`Digest::of`] or [`DigestHasher`]); parsing is
/// reserved for values read back out of the store or supplied by callers
/// for lookups.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Digest {
    algorithm: DigestAlgorithm,
    hex: String,
}

impl Digest {
    /// Hash `data` with `algorithm`.
    pub fn of(algorithm: DigestAlgorithm, data: &[u8]) -> Self {
        let mut hasher = DigestHasher::new(algorithm);
        hasher.update(data);
        hasher.finalize()
    }

    /// SHA-256 digest of `data`.
    pub fn sha256(data: &[u8]) -> Self {
        Self::of(DigestAlgorithm::Sha256, data)
    }

    /// Build from an algorithm name and hex value, validating both.
    pub fn from_parts(algorithm: &str, hex: &str) -> Result<Self, TypeError> {
        let algorithm: DigestAlgorithm = algorithm.parse()?;
        Self::validated(algorithm, hex, || format!("{algorithm}:{hex}"))
    }

    /// Parse a `<alg>:<hex>` string. No whitespace or case folding is applied.
    pub fn parse(s: &str) -> Result<Self, TypeError> {
        let (alg, hex) = s.split_once(':').ok_or_else(|| TypeError::MalformedDigest {
            input: s.to_string(),
            reason: "missing ':' separator".into(),
        })?;
        let algorithm: DigestAlgorithm = alg.parse()?;
        Self::validated(algorithm, hex, || s.to_string())
    }

    /// Wrap hasher output. Callers guarantee `hex` is well-formed.
    pub(crate) fn from_hasher_output(algorithm: DigestAlgorithm, output: &[u8]) -> Self {
        Self {
            algorithm,
            hex: hex::encode(output),
        }
    }

    fn validated(
        algorithm: DigestAlgorithm,
        hex: &str,
        input: impl Fn() -> String,
    ) -> Result<Self, TypeError> {
        if hex.len() != algorithm.hex_len() {
            return Err(TypeError::MalformedDigest {
                input: input(),
                reason: format!(
                    "expected {} hex characters, got {}",
                    algorithm.hex_len(),
                    hex.len()
                ),
            });
        }
        if let Some(ch) = hex
            .chars()
            .find(|c| !matches!(c, '0'..='9' | 'a'..='f'))
        {
            return Err(TypeError::MalformedDigest {
                input: input(),
                reason: format!("invalid character {ch:?} in hex value"),
            });
        }
        Ok(Self {
            algorithm,
            hex: hex.to_string(),
        })
    }

    pub fn algorithm(&self) -> DigestAlgorithm {
        self.algorithm
    }

    /// Lowercase hex value without the algorithm prefix.
    pub fn hex(&self) -> &str {
        &self.hex
    }

    /// Short hex representation (first 12 characters).
    pub fn short_hex(&self) -> &str {
        &self.hex[..12]
    }

    /// Returns `true` if `data` hashes to this digest.
    pub fn verify(&self, data: &[u8]) -> bool {
        Self::of(self.algorithm, data) == *self
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({}:{})", self.algorithm, self.short_hex())
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.algorithm, self.hex)
    }
}

impl FromStr for Digest {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Digest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Digest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const DATA_SHA256: &str =
        "3a6eb0790f39ac87c94f3856b2dd2c5d110e6811602261a9a923d3bb23adc8b7";

    #[test]
    fn sha256_of_known_input() {
        let digest = Digest::sha256(b"data");
        assert_eq!(digest.algorithm(), DigestAlgorithm::Sha256);
        assert_eq!(digest.hex(), DATA_SHA256);
        assert_eq!(digest.to_string(), format!("sha256:{DATA_SHA256}"));
    }

    #[test]
    fn sha256_of_empty_input() {
        assert_eq!(
            Digest::sha256(b"").hex(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn sha512_has_128_hex_chars() {
        let digest = Digest::of(DigestAlgorithm::Sha512, b"data");
        assert_eq!(digest.hex().len(), 128);
        assert!(digest.to_string().starts_with("sha512:"));
    }

    #[test]
    fn parse_display_roundtrip() {
        let digest = Digest::sha256(b"layer");
        let parsed: Digest = digest.to_string().parse().unwrap();
        assert_eq!(parsed, digest);
    }

    #[test]
    fn parse_rejects_missing_separator() {
        let err = Digest::parse(DATA_SHA256).unwrap_err();
        assert!(matches!(err, TypeError::MalformedDigest { .. }));
    }

    #[test]
    fn parse_rejects_unknown_algorithm() {
        let err = Digest::parse(&format!("md5:{DATA_SHA256}")).unwrap_err();
        assert_eq!(err, TypeError::UnsupportedAlgorithm("md5".into()));
    }

    #[test]
    fn parse_rejects_wrong_length() {
        assert!(Digest::parse("sha256:abc").is_err());
        assert!(Digest::parse(&format!("sha512:{DATA_SHA256}")).is_err());
    }

    #[test]
    fn parse_rejects_uppercase_hex() {
        let upper = DATA_SHA256.to_uppercase();
        assert!(Digest::parse(&format!("sha256:{upper}")).is_err());
    }

    #[test]
    fn parse_rejects_surrounding_whitespace() {
        assert!(Digest::parse(&format!("sha256:{DATA_SHA256}\n")).is_err());
        assert!(Digest::parse(&format!(" sha256:{DATA_SHA256}")).is_err());
    }

    #[test]
    fn from_parts_validates() {
        let digest = Digest::from_parts("sha256", DATA_SHA256).unwrap();
        assert_eq!(digest, Digest::sha256(b"data"));
        assert!(Digest::from_parts("sha256", "zz").is_err());
        assert!(Digest::from_parts("crc32", DATA_SHA256).is_err());
    }

    #[test]
    fn verify_detects_tampering() {
        let digest = Digest::sha256(b"data");
        assert!(digest.verify(b"data"));
        assert!(!digest.verify(b"date"));
    }

    #[test]
    fn debug_is_short() {
        let digest = Digest::sha256(b"data");
        assert_eq!(format!("{digest:?}"), "Digest(sha256:3a6eb0790f39)");
    }

    #[test]
    fn serde_roundtrip() {
        let digest = Digest::sha256(b"serde test");
        let json = serde_json::to_string(&digest).unwrap();
        assert_eq!(json, format!("\"{digest}\""));
        let parsed: Digest = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, digest);
    }

    #[test]
    fn serde_rejects_malformed() {
        let result: Result<Digest, _> = serde_json::from_str("\"sha256:nope\"");
        assert!(result.is_err());
    }

    #[test]
    fn algorithm_serde_uses_name() {
        let json = serde_json::to_string(&DigestAlgorithm::Sha512).unwrap();
        assert_eq!(json, "\"sha512\"");
        let parsed: DigestAlgorithm = serde_json::from_str("\"sha256\"").unwrap();
        assert_eq!(parsed, DigestAlgorithm::Sha256);
    }

    proptest! {
        #[test]
        fn digest_is_deterministic(data in proptest::collection::vec(any::<u8>(), 0..512)) {
            prop_assert_eq!(Digest::sha256(&data), Digest::sha256(&data));
        }

        #[test]
        fn one_byte_change_changes_digest(
            data in proptest::collection::vec(any::<u8>(), 1..512),
            index in any::<prop::sample::Index>(),
        ) {
            let mut changed = data.clone();
            let i = index.index(changed.len());
            changed[i] = changed[i].wrapping_add(1);
            prop_assert_ne!(Digest::sha256(&data), Digest::sha256(&changed));
        }
    }
}
