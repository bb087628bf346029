//! VRF proofs: a validator's signature over the hash of a slot seed.
//!
//! Text form is `hex(public_key)-hex(signature)-hex(seed_hash)`, which is how
//! the proof travels inside a block.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use stakenet_crypto::{blake2b_256, sign_message, verify_signature};
use stakenet_types::{KeyPair, PublicKey, Signature};

use crate::error::VrfError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VrfProof {
    pub public_key: PublicKey,
    pub signature: Signature,
    pub seed_hash: [u8; 32],
}

/// Sign the hash of `seed` with the validator's key.
pub fn compute_vrf_proof(seed: &[u8], keys: &KeyPair) -> VrfProof {
    let seed_hash = blake2b_256(seed);
    VrfProof {
        public_key: keys.public.clone(),
        signature: sign_message(&seed_hash, &keys.private),
        seed_hash,
    }
}

/// Check `proof` against the claimed validator and seed. Any mismatch is a
/// failure.
pub fn verify_vrf_proof(proof: &VrfProof, public_key: &PublicKey, seed: &[u8]) -> bool {
    proof.check(public_key, seed).is_ok()
}

impl VrfProof {
    /// Like [`verify_vrf_proof`], reporting which check failed.
    pub fn check(&self, public_key: &PublicKey, seed: &[u8]) -> Result<(), VrfError> {
        if &self.public_key != public_key {
            return Err(VrfError::KeyMismatch);
        }
        if self.seed_hash != blake2b_256(seed) {
            return Err(VrfError::SeedMismatch);
        }
        if !verify_signature(&self.seed_hash, &self.signature, public_key) {
            return Err(VrfError::BadSignature);
        }
        Ok(())
    }
}

impl fmt::Display for VrfProof {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{}",
            self.public_key,
            hex::encode(self.signature.as_bytes()),
            hex::encode(self.seed_hash)
        )
    }
}

impl FromStr for VrfProof {
    type Err = VrfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('-').collect();
        let [key, signature, seed_hash] = parts.as_slice() else {
            return Err(VrfError::Malformed(format!(
                "expected 3 segments, found {}",
                parts.len()
            )));
        };
        Ok(Self {
            public_key: key
                .parse()
                .map_err(|e| VrfError::Malformed(format!("public key: {e}")))?,
            signature: Signature(decode_segment(signature, "signature")?),
            seed_hash: decode_segment(seed_hash, "seed hash")?,
        })
    }
}

fn decode_segment<const N: usize>(s: &str, what: &str) -> Result<[u8; N], VrfError> {
    let bytes = hex::decode(s).map_err(|e| VrfError::Malformed(format!("{what}: {e}")))?;
    bytes.try_into().map_err(|b: Vec<u8>| {
        VrfError::Malformed(format!("{what}: expected {N} bytes, got {}", b.len()))
    })
}

impl Serialize for VrfProof {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for VrfProof {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
