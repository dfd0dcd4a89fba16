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

//! Contract ABI schema and compiled code loading.
//!
//! The ABI is produced by the contract toolchain as a JSON file next to the
//! compiled WASM blob. The client treats it as the single source of truth
//! for which endpoints exist, their argument and return types, and whether
//! they accept an attached token payment.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::value::{ScType, Value};

/// Typed description of a contract's callable surface.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractAbi {
    pub name: String,
    pub constructor: ConstructorAbi,
    pub endpoints: Vec<EndpointAbi>,
}

impl ContractAbi {
    pub fn from_json(json: &str) -> Result<Self, AbiLoadError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read the ABI from its JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AbiLoadError> {
        let json = std::fs::read_to_string(path)?;
        ContractAbi::from_json(&json)
    }

    /// Look up an endpoint by name.
    pub fn endpoint(&self, name: &str) -> Result<&EndpointAbi, AbiError> {
        self.endpoints
            .iter()
            .find(|endpoint| endpoint.name == name)
            .ok_or_else(|| AbiError::UnknownEndpoint {
                contract: self.name.clone(),
                endpoint: name.to_string(),
            })
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstructorAbi {
    #[serde(default)]
    pub inputs: Vec<ParamAbi>,
    #[serde(default)]
    pub outputs: Vec<OutputAbi>,
}

impl ConstructorAbi {
    pub fn check_inputs(&self, args: &[Value]) -> Result<(), AbiError> {
        check_args("init", &self.inputs, args)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointAbi {
    pub name: String,
    #[serde(default)]
    pub mutability: Mutability,
    #[serde(default)]
    pub payable_in_tokens: bool,
    #[serde(default)]
    pub inputs: Vec<ParamAbi>,
    #[serde(default)]
    pub outputs: Vec<OutputAbi>,
}

impl EndpointAbi {
    pub fn check_inputs(&self, args: &[Value]) -> Result<(), AbiError> {
        check_args(&self.name, &self.inputs, args)
    }

    pub fn output_types(&self) -> Vec<ScType> {
        self.outputs.iter().map(|output| output.sc_type).collect()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mutability {
    Mutable,
    Readonly,
}

impl Default for Mutability {
    fn default() -> Self {
        Mutability::Mutable
    }
}

/// A named, typed endpoint parameter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamAbi {
    pub name: String,
    #[serde(rename = "type")]
    pub sc_type: ScType,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputAbi {
    #[serde(rename = "type")]
    pub sc_type: ScType,
}

fn check_args(endpoint: &str, params: &[ParamAbi], args: &[Value]) -> Result<(), AbiError> {
    if params.len() != args.len() {
        return Err(AbiError::ArityMismatch {
            endpoint: endpoint.to_string(),
            expected: params.len(),
            got: args.len(),
        });
    }
    for (index, (param, arg)) in params.iter().zip(args).enumerate() {
        if param.sc_type != arg.sc_type() {
            return Err(AbiError::TypeMismatch {
                endpoint: endpoint.to_string(),
                index,
                expected: param.sc_type,
                got: arg.sc_type(),
            });
        }
    }
    Ok(())
}

/// Errors raised when a call does not match the contract's declared schema.
///
/// These are client-local: nothing has been signed or sent when they occur.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AbiError {
    #[error("contract {contract} has no endpoint {endpoint}")]
    UnknownEndpoint { contract: String, endpoint: String },
    #[error("{endpoint} takes {expected} arguments, got {got}")]
    ArityMismatch {
        endpoint: String,
        expected: usize,
        got: usize,
    },
    #[error("{endpoint} argument {index} must be {expected}, got {got}")]
    TypeMismatch {
        endpoint: String,
        index: usize,
        expected: ScType,
        got: ScType,
    },
    #[error("endpoint {endpoint} does not accept token payments")]
    NotPayable { endpoint: String },
}

#[derive(Debug, thiserror::Error)]
pub enum AbiLoadError {
    #[error("failed to read ABI file")]
    Io(#[from] std::io::Error),
    #[error("malformed ABI JSON")]
    Json(#[from] serde_json::Error),
}

/// Compiled contract byte code, loaded from disk and treated as opaque.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContractCode(Vec<u8>);

impl ContractCode {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        ContractCode(bytes)
    }

    /// Read the compiled blob from its file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, std::io::Error> {
        Ok(ContractCode(std::fs::read(path)?))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const ABI_JSON: &str = r#"
    {
        "name": "Accumulator",
        "constructor": {
            "inputs": [{ "name": "initial", "type": "u64" }],
            "outputs": []
        },
        "endpoints": [
            {
                "name": "add",
                "mutability": "mutable",
                "inputs": [{ "name": "value", "type": "u64" }],
                "outputs": []
            },
            {
                "name": "getSum",
                "mutability": "readonly",
                "inputs": [],
                "outputs": [{ "type": "u64" }]
            }
        ]
    }
    "#;

    #[test]
    fn parse_abi_json() {
        let abi = ContractAbi::from_json(ABI_JSON).unwrap();
        assert_eq!(abi.name, "Accumulator");
        assert_eq!(abi.constructor.inputs.len(), 1);
        let get_sum = abi.endpoint("getSum").unwrap();
        assert_eq!(get_sum.mutability, Mutability::Readonly);
        assert_eq!(get_sum.output_types(), vec![ScType::U64]);
        assert!(!abi.endpoint("add").unwrap().payable_in_tokens);
    }

    #[test]
    fn unknown_endpoint() {
        let abi = ContractAbi::from_json(ABI_JSON).unwrap();
        match abi.endpoint("mul") {
            Err(AbiError::UnknownEndpoint { endpoint, .. }) => assert_eq!(endpoint, "mul"),
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn arity_and_type_checks() {
        let abi = ContractAbi::from_json(ABI_JSON).unwrap();
        let add = abi.endpoint("add").unwrap();

        assert_eq!(
            add.check_inputs(&[]),
            Err(AbiError::ArityMismatch {
                endpoint: "add".to_string(),
                expected: 1,
                got: 0
            })
        );
        assert_eq!(
            add.check_inputs(&[Value::Bool(true)]),
            Err(AbiError::TypeMismatch {
                endpoint: "add".to_string(),
                index: 0,
                expected: ScType::U64,
                got: ScType::Bool
            })
        );
        assert_eq!(add.check_inputs(&[Value::U64(3)]), Ok(()));
    }
}
