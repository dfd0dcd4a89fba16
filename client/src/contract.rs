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

//! Typed contract handles on top of the raw client operations.
//!
//! One [Contract] value parameterized by an ABI schema and a target address
//! replaces a hand-written wrapper class per contract: every call is
//! validated against the schema before it is signed, arguments are encoded
//! from typed [Value]s, and return data is decoded against the endpoint's
//! declared output types.

use calyx_core::abi::{AbiError, ContractAbi, ContractCode};
use calyx_core::status::TerminalResult;
use calyx_core::value::Value;
use calyx_core::{Address, CallerAccount};

use crate::error::Error;
use crate::interface::{CallParams, ClientT, DeployParams, SubmissionOutcome};
use crate::signer::Signer;

/// Deploys contracts from a compiled blob and its ABI.
pub struct Deployer {
    abi: ContractAbi,
    code: ContractCode,
}

impl Deployer {
    pub fn new(abi: ContractAbi, code: ContractCode) -> Self {
        Deployer { abi, code }
    }

    /// Validate the constructor arguments, deploy, and return a typed
    /// handle bound to the new contract's address.
    ///
    /// The handle is valid even if the outcome is a failure or a timeout,
    /// since the address is determined at signing; it just points at
    /// nothing until a successful deploy lands.
    pub async fn deploy<C: ClientT + Sync + ?Sized>(
        &self,
        client: &C,
        signer: &dyn Signer,
        deployer: &mut CallerAccount,
        args: &[Value],
        params: &DeployParams,
    ) -> Result<(Contract, SubmissionOutcome), Error> {
        self.abi
            .constructor
            .check_inputs(args)
            .map_err(crate::error::ValidationError::from)?;
        let (address, outcome) = client
            .deploy(signer, deployer, &self.code, encode_args(args), params)
            .await?;
        Ok((Contract::new(self.abi.clone(), address), outcome))
    }

    pub fn abi(&self) -> &ContractAbi {
        &self.abi
    }

    pub fn code(&self) -> &ContractCode {
        &self.code
    }
}

/// A deployed contract, seen through its ABI schema.
#[derive(Clone, Debug)]
pub struct Contract {
    abi: ContractAbi,
    address: Address,
}

impl Contract {
    pub fn new(abi: ContractAbi, address: Address) -> Self {
        Contract { abi, address }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn abi(&self) -> &ContractAbi {
        &self.abi
    }

    /// Call a mutating endpoint.
    ///
    /// Arguments and any attached payment are validated against the schema
    /// before signing, so a schema mismatch never consumes a nonce.
    pub async fn call<C: ClientT + Sync + ?Sized>(
        &self,
        client: &C,
        signer: &dyn Signer,
        caller: &mut CallerAccount,
        function: &str,
        args: &[Value],
        params: &CallParams,
    ) -> Result<SubmissionOutcome, Error> {
        let endpoint = self
            .abi
            .endpoint(function)
            .map_err(crate::error::ValidationError::from)?;
        endpoint
            .check_inputs(args)
            .map_err(crate::error::ValidationError::from)?;
        if params.value > 0 && !endpoint.payable_in_tokens {
            return Err(crate::error::ValidationError::from(AbiError::NotPayable {
                endpoint: function.to_string(),
            })
            .into());
        }
        client
            .execute(
                signer,
                caller,
                &self.address,
                function,
                encode_args(args),
                params,
            )
            .await
    }

    /// Run a read-only endpoint and decode the returned values.
    pub async fn query<C: ClientT + Sync + ?Sized>(
        &self,
        client: &C,
        function: &str,
        args: &[Value],
    ) -> Result<Vec<Value>, Error> {
        let endpoint = self
            .abi
            .endpoint(function)
            .map_err(crate::error::ValidationError::from)?;
        endpoint
            .check_inputs(args)
            .map_err(crate::error::ValidationError::from)?;
        let output_types = endpoint.output_types();

        let return_data = client
            .query(&self.address, function, encode_args(args))
            .await?;
        Ok(Value::top_decode_all(&output_types, &return_data)?)
    }

    /// Decode a terminal result's return data against an endpoint's
    /// declared output types.
    pub fn decode_output(
        &self,
        function: &str,
        result: &TerminalResult,
    ) -> Result<Vec<Value>, Error> {
        let endpoint = self
            .abi
            .endpoint(function)
            .map_err(crate::error::ValidationError::from)?;
        Ok(result.decode_outputs(&endpoint.output_types())?)
    }
}

fn encode_args(args: &[Value]) -> Vec<Vec<u8>> {
    args.iter().map(Value::top_encode).collect()
}
