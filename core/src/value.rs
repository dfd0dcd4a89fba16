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

//! Typed argument values and their canonical byte encoding.
//!
//! Contract call arguments and return values travel as opaque byte strings.
//! The encoding is the ledger's top-level value encoding: unsigned integers
//! are minimal big-endian (the empty string for zero), booleans piggyback on
//! the integer encoding, byte strings are themselves, addresses are their 32
//! raw bytes. Decoding tolerates redundant leading zeros in integers but
//! rejects input that exceeds the target width.

use crate::{Address, ADDRESS_LENGTH};

/// Type of a contract call argument or return value, as declared in the ABI.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ScType {
    #[serde(rename = "bool")]
    Bool,
    #[serde(rename = "u32")]
    U32,
    #[serde(rename = "u64")]
    U64,
    #[serde(rename = "BigUint")]
    BigUint,
    #[serde(rename = "bytes")]
    Bytes,
    #[serde(rename = "Address")]
    Address,
}

impl std::fmt::Display for ScType {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let name = match self {
            ScType::Bool => "bool",
            ScType::U32 => "u32",
            ScType::U64 => "u64",
            ScType::BigUint => "BigUint",
            ScType::Bytes => "bytes",
            ScType::Address => "Address",
        };
        write!(f, "{}", name)
    }
}

/// Arbitrary-width unsigned integer, kept in its canonical encoded form:
/// minimal big-endian bytes, empty for zero.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct BigUint(Vec<u8>);

impl BigUint {
    /// Canonicalizes the input by stripping leading zero bytes.
    pub fn from_be_bytes(bytes: &[u8]) -> Self {
        let first_nonzero = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
        BigUint(bytes[first_nonzero..].to_vec())
    }

    pub fn as_be_bytes(&self) -> &[u8] {
        &self.0
    }

    /// The value as `u64`, if it fits.
    pub fn to_u64(&self) -> Option<u64> {
        if self.0.len() > 8 {
            return None;
        }
        let mut bytes = [0u8; 8];
        bytes[8 - self.0.len()..].copy_from_slice(&self.0);
        Some(u64::from_be_bytes(bytes))
    }
}

impl From<u64> for BigUint {
    fn from(value: u64) -> Self {
        BigUint::from_be_bytes(&value.to_be_bytes())
    }
}

/// A typed value passed to or returned from a contract call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Value {
    Bool(bool),
    U32(u32),
    U64(u64),
    BigUint(BigUint),
    Bytes(Vec<u8>),
    Address(Address),
}

impl Value {
    pub fn sc_type(&self) -> ScType {
        match self {
            Value::Bool(_) => ScType::Bool,
            Value::U32(_) => ScType::U32,
            Value::U64(_) => ScType::U64,
            Value::BigUint(_) => ScType::BigUint,
            Value::Bytes(_) => ScType::Bytes,
            Value::Address(_) => ScType::Address,
        }
    }

    /// Canonical byte encoding of the value.
    pub fn top_encode(&self) -> Vec<u8> {
        match self {
            Value::Bool(false) => Vec::new(),
            Value::Bool(true) => vec![1],
            Value::U32(n) => minimal_be_bytes(&n.to_be_bytes()),
            Value::U64(n) => minimal_be_bytes(&n.to_be_bytes()),
            Value::BigUint(n) => n.as_be_bytes().to_vec(),
            Value::Bytes(bytes) => bytes.clone(),
            Value::Address(address) => address.as_bytes().to_vec(),
        }
    }

    /// Decode a value of the given type from its canonical byte encoding.
    pub fn top_decode(sc_type: ScType, bytes: &[u8]) -> Result<Value, ValueError> {
        match sc_type {
            ScType::Bool => match bytes {
                [] => Ok(Value::Bool(false)),
                [1] => Ok(Value::Bool(true)),
                _ => Err(ValueError::InvalidBool(bytes.to_vec())),
            },
            ScType::U32 => Ok(Value::U32(decode_uint(sc_type, bytes, 4)? as u32)),
            ScType::U64 => Ok(Value::U64(decode_uint(sc_type, bytes, 8)?)),
            ScType::BigUint => Ok(Value::BigUint(BigUint::from_be_bytes(bytes))),
            ScType::Bytes => Ok(Value::Bytes(bytes.to_vec())),
            ScType::Address => Address::from_slice(bytes)
                .map(Value::Address)
                .map_err(|_| ValueError::InvalidAddress(bytes.len())),
        }
    }

    /// Decode a list of values against the declared types, in order.
    pub fn top_decode_all(types: &[ScType], raw: &[Vec<u8>]) -> Result<Vec<Value>, ValueError> {
        if types.len() != raw.len() {
            return Err(ValueError::CountMismatch {
                expected: types.len(),
                got: raw.len(),
            });
        }
        types
            .iter()
            .zip(raw)
            .map(|(sc_type, bytes)| Value::top_decode(*sc_type, bytes))
            .collect()
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{}", b),
            Value::U32(n) => write!(f, "{}", n),
            Value::U64(n) => write!(f, "{}", n),
            Value::BigUint(n) => match n.to_u64() {
                Some(small) => write!(f, "{}", small),
                None => write!(f, "0x{}", hex::encode(n.as_be_bytes())),
            },
            Value::Bytes(bytes) => write!(f, "0x{}", hex::encode(bytes)),
            Value::Address(address) => write!(f, "{}", address),
        }
    }
}

fn minimal_be_bytes(bytes: &[u8]) -> Vec<u8> {
    let first_nonzero = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
    bytes[first_nonzero..].to_vec()
}

fn decode_uint(sc_type: ScType, bytes: &[u8], width: usize) -> Result<u64, ValueError> {
    let stripped = minimal_be_bytes(bytes);
    if stripped.len() > width {
        return Err(ValueError::IntegerTooWide {
            sc_type,
            got: bytes.len(),
        });
    }
    let mut buffer = [0u8; 8];
    buffer[8 - stripped.len()..].copy_from_slice(&stripped);
    Ok(u64::from_be_bytes(buffer))
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ValueError {
    #[error("boolean must be empty or 0x01, got 0x{}", hex::encode(.0))]
    InvalidBool(Vec<u8>),
    #[error("integer encoding of {got} bytes does not fit {sc_type}")]
    IntegerTooWide { sc_type: ScType, got: usize },
    #[error("address must be {} bytes, got {0}", ADDRESS_LENGTH)]
    InvalidAddress(usize),
    #[error("expected {expected} return values, got {got}")]
    CountMismatch { expected: usize, got: usize },
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn integers_encode_minimally() {
        assert_eq!(Value::U64(0).top_encode(), Vec::<u8>::new());
        assert_eq!(Value::U64(42).top_encode(), vec![42]);
        assert_eq!(Value::U64(0x0100).top_encode(), vec![1, 0]);
        assert_eq!(Value::U32(42).top_encode(), vec![42]);
    }

    #[test]
    fn integer_decode_tolerates_leading_zeros() {
        assert_eq!(
            Value::top_decode(ScType::U64, &[0, 0, 42]).unwrap(),
            Value::U64(42)
        );
    }

    #[test]
    fn integer_decode_rejects_overwide_input() {
        let nine_bytes = [1u8; 9];
        assert_eq!(
            Value::top_decode(ScType::U64, &nine_bytes),
            Err(ValueError::IntegerTooWide {
                sc_type: ScType::U64,
                got: 9
            })
        );
        assert!(Value::top_decode(ScType::U32, &[1, 0, 0, 0, 0]).is_err());
    }

    #[test]
    fn booleans() {
        assert_eq!(Value::Bool(false).top_encode(), Vec::<u8>::new());
        assert_eq!(Value::Bool(true).top_encode(), vec![1]);
        assert_eq!(
            Value::top_decode(ScType::Bool, &[]).unwrap(),
            Value::Bool(false)
        );
        assert!(Value::top_decode(ScType::Bool, &[2]).is_err());
    }

    #[test]
    fn biguint_is_canonical() {
        let canonical = BigUint::from_be_bytes(&[0, 0, 1, 0]);
        assert_eq!(canonical.as_be_bytes(), &[1, 0]);
        assert_eq!(canonical.to_u64(), Some(256));
        assert_eq!(BigUint::from(0).as_be_bytes(), &[] as &[u8]);
    }

    #[test]
    fn encode_decode_inverse() {
        let address = Address::from_bytes([7u8; 32]);
        let values = vec![
            Value::Bool(true),
            Value::U32(7),
            Value::U64(1 << 40),
            Value::BigUint(BigUint::from(123_456)),
            Value::Bytes(b"calyx".to_vec()),
            Value::Address(address),
        ];
        for value in values {
            let encoded = value.top_encode();
            let decoded = Value::top_decode(value.sc_type(), &encoded).unwrap();
            assert_eq!(value, decoded);
        }
    }

    #[test]
    fn decode_all_checks_count() {
        let result = Value::top_decode_all(&[ScType::U64], &[]);
        assert_eq!(
            result,
            Err(ValueError::CountMismatch {
                expected: 1,
                got: 0
            })
        );
    }
}
