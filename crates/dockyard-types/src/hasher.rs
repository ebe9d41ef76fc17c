use sha2::{Digest as _, Sha256, Sha512};

use crate::digest::{Digest, DigestAlgorithm};

/// Running hash accumulator that finalizes into a [`Digest`].
///
/// Algorithms are compiled in, so constructing a hasher cannot fail.
#[derive(Clone)]
pub enum DigestHasher {
    Sha256(Sha256),
    Sha512(Sha512),
}

impl DigestHasher {
    pub fn new(algorithm: DigestAlgorithm) -> Self {
        match algorithm {
            DigestAlgorithm::Sha256 => Self::Sha256(Sha256::new()),
            DigestAlgorithm::Sha512 => Self::Sha512(Sha512::new()),
        }
    }

    pub fn algorithm(&self) -> DigestAlgorithm {
        match self {
            Self::Sha256(_) => DigestAlgorithm::Sha256,
            Self::Sha512(_) => DigestAlgorithm::Sha512,
        }
    }

    /// Feed more bytes into the accumulator.
    pub fn update(&mut self, data: &[u8]) {
        match self {
            Self::Sha256(h) => h.update(data),
            Self::Sha512(h) => h.update(data),
        }
    }

    /// Consume the accumulator and produce the digest of everything fed so far.
    pub fn finalize(self) -> Digest {
        match self {
            Self::Sha256(h) => Digest::from_hasher_output(DigestAlgorithm::Sha256, &h.finalize()),
            Self::Sha512(h) => Digest::from_hasher_output(DigestAlgorithm::Sha512, &h.finalize()),
        }
    }
}

impl std::fmt::Debug for DigestHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("DigestHasher").field(&self.algorithm()).finish()
    }
}
