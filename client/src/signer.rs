// Calyx Ledger Client
// Copyright (C) 2020 Calyx Project Developers <dev@calyx.network>
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License version 3 as
// published by the Free Software Foundation.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Transaction signing, isolated behind a narrow trait.

use ed25519_dalek::{Signer as _, SigningKey};
use sha2::{Digest as _, Sha256};

use calyx_core::Address;

/// Signs transaction payloads on behalf of one account.
///
/// Production implementations may defer to an external device or service;
/// signing is therefore fallible and may suspend the caller.
pub trait Signer: Send + Sync {
    /// The address whose transactions this signer can sign.
    fn address(&self) -> Address;

    /// Sign the canonical serialization of an unsigned transaction.
    fn sign(&self, payload: &[u8]) -> Result<Vec<u8>, SignerError>;
}

#[derive(Debug, thiserror::Error)]
pub enum SignerError {
    #[error("signing key unavailable: {0}")]
    Unavailable(String),
}

/// In-memory Ed25519 signer.
///
/// Holds the secret key in process memory. Intended for development and
/// tests only; do not use it to hold production keys.
pub struct KeyPairSigner {
    key: SigningKey,
}

impl KeyPairSigner {
    pub fn from_seed(seed: [u8; 32]) -> Self {
        KeyPairSigner {
            key: SigningKey::from_bytes(&seed),
        }
    }

    /// Derive a signer from a human-readable development seed such as
    /// `"alice"`. The same name always yields the same key.
    pub fn from_dev_seed(name: &str) -> Self {
        let digest = Sha256::digest(name.as_bytes());
        let mut seed = [0u8; 32];
        seed.copy_from_slice(&digest);
        KeyPairSigner::from_seed(seed)
    }
}

impl Signer for KeyPairSigner {
    fn address(&self) -> Address {
        Address::from_bytes(self.key.verifying_key().to_bytes())
    }

    fn sign(&self, payload: &[u8]) -> Result<Vec<u8>, SignerError> {
        Ok(self.key.sign(payload).to_bytes().to_vec())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use ed25519_dalek::{Signature, Verifier as _, VerifyingKey};

    #[test]
    fn dev_seed_is_deterministic() {
        let alice = KeyPairSigner::from_dev_seed("alice");
        let alice_again = KeyPairSigner::from_dev_seed("alice");
        let bob = KeyPairSigner::from_dev_seed("bob");
        assert_eq!(alice.address(), alice_again.address());
        assert_ne!(alice.address(), bob.address());
    }

    #[test]
    fn signatures_verify_against_the_address() {
        let signer = KeyPairSigner::from_dev_seed("alice");
        let payload = b"unsigned transaction bytes";
        let signature_bytes = signer.sign(payload).unwrap();

        let key = VerifyingKey::from_bytes(signer.address().as_bytes()).unwrap();
        let signature = Signature::from_slice(&signature_bytes).unwrap();
        key.verify(payload, &signature).unwrap();
    }
}
