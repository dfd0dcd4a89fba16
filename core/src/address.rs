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

//! `Address` type, and the deterministic contract address derivation.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest as _, Sha256};

/// Number of bytes of an [Address].
pub const ADDRESS_LENGTH: usize = 32;

/// Number of leading zero bytes that mark an address as a contract address.
const CONTRACT_PREFIX_LENGTH: usize = 8;

/// Identifier of an account or a contract on the ledger.
///
/// User account addresses are Ed25519 public keys. Contract addresses are
/// derived with [contract_address] and carry a zero-byte prefix that no
/// public key address has in practice.
///
/// The canonical textual form is lowercase hex, which is also how addresses
/// travel in the gateway JSON API.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address([u8; ADDRESS_LENGTH]);

impl Address {
    pub fn from_bytes(bytes: [u8; ADDRESS_LENGTH]) -> Self {
        Address(bytes)
    }

    /// Build an address from a byte slice. Fails if the length is off.
    pub fn from_slice(slice: &[u8]) -> Result<Self, AddressParseError> {
        if slice.len() != ADDRESS_LENGTH {
            return Err(AddressParseError::BadLength(slice.len()));
        }
        let mut bytes = [0u8; ADDRESS_LENGTH];
        bytes.copy_from_slice(slice);
        Ok(Address(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_LENGTH] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Whether this address lies in the contract address space.
    pub fn is_contract(&self) -> bool {
        self.0[..CONTRACT_PREFIX_LENGTH].iter().all(|b| *b == 0)
    }
}

/// Derive the address a contract deployed by `deployer` at `nonce` lives at.
///
/// This is a pure function of its inputs: the address is known the moment the
/// deploy transaction is signed, before it is broadcast or confirmed.
pub fn contract_address(deployer: &Address, nonce: u64) -> Address {
    let mut hasher = Sha256::new();
    hasher.update(deployer.as_bytes());
    hasher.update(nonce.to_be_bytes());
    let digest = hasher.finalize();

    let mut bytes = [0u8; ADDRESS_LENGTH];
    bytes[CONTRACT_PREFIX_LENGTH..].copy_from_slice(&digest[..ADDRESS_LENGTH - CONTRACT_PREFIX_LENGTH]);
    Address(bytes)
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum AddressParseError {
    #[error("expected {} bytes, got {0}", ADDRESS_LENGTH)]
    BadLength(usize),
    #[error("invalid hex encoding")]
    BadHex(#[from] hex::FromHexError),
}

impl std::str::FromStr for Address {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s)?;
        Address::from_slice(&bytes)
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl std::fmt::Debug for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "Address({})", self.to_hex())
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn random_address() -> Address {
        Address::from_bytes(rand::random())
    }

    #[test]
    fn hex_round_trip() {
        let address = random_address();
        let parsed: Address = address.to_hex().parse().unwrap();
        assert_eq!(address, parsed);
    }

    #[test]
    fn from_slice_rejects_bad_length() {
        assert_eq!(
            Address::from_slice(&[1u8; 31]),
            Err(AddressParseError::BadLength(31))
        );
    }

    #[test]
    fn contract_address_is_deterministic() {
        let deployer = random_address();
        assert_eq!(
            contract_address(&deployer, 7),
            contract_address(&deployer, 7)
        );
        assert_ne!(
            contract_address(&deployer, 7),
            contract_address(&deployer, 8)
        );
    }

    #[test]
    fn contract_address_has_zero_prefix() {
        let derived = contract_address(&random_address(), 0);
        assert!(derived.is_contract());
    }

    #[test]
    fn serde_as_hex_string() {
        let address = random_address();
        let json = serde_json::to_string(&address).unwrap();
        assert_eq!(json, format!("\"{}\"", address.to_hex()));
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(address, back);
    }
}
