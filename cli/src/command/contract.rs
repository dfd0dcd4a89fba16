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

//! Define the commands supported by the CLI related to contracts.

use std::path::PathBuf;

use super::*;
use calyx_client::contract::{Contract, Deployer};

/// Contract related commands
#[derive(StructOpt, Debug, Clone)]
pub enum Command {
    Deploy(Deploy),
    Call(Call),
    Query(Query),
}

#[async_trait::async_trait]
impl CommandT for Command {
    async fn run(&self, ctx: &CommandContext) -> Result<(), CommandError> {
        match self {
            Command::Deploy(cmd) => cmd.run(ctx).await,
            Command::Call(cmd) => cmd.run(ctx).await,
            Command::Query(cmd) => cmd.run(ctx).await,
        }
    }
}

#[derive(StructOpt, Debug, Clone)]
/// Deploy a compiled contract.
pub struct Deploy {
    /// Path to the contract's ABI JSON file.
    #[structopt(long, value_name = "path")]
    abi: PathBuf,

    /// Path to the compiled contract blob.
    #[structopt(long, value_name = "path")]
    code: PathBuf,

    /// Constructor arguments, one per declared parameter.
    args: Vec<String>,
}

#[async_trait::async_trait]
impl CommandT for Deploy {
    async fn run(&self, ctx: &CommandContext) -> Result<(), CommandError> {
        let abi = ContractAbi::load(&self.abi)?;
        let code = ContractCode::load(&self.code)?;
        let args = parse_typed_args(&abi.constructor.inputs, &self.args)?;
        let deployer = Deployer::new(abi, code);

        let mut account = author_account(ctx).await?;
        announce_tx("Deploying contract...");
        let (contract, outcome) = deployer
            .deploy(
                &ctx.client,
                &ctx.signer,
                &mut account,
                &args,
                &DeployParams {
                    gas_limit: ctx.gas_limit,
                    ..DeployParams::default()
                },
            )
            .await?;
        outcome_ok(outcome)?;
        println!("contract deployed at {}", contract.address());
        Ok(())
    }
}

#[derive(StructOpt, Debug, Clone)]
/// Call a mutating endpoint of a deployed contract.
pub struct Call {
    /// Path to the contract's ABI JSON file.
    #[structopt(long, value_name = "path")]
    abi: PathBuf,

    /// Hex address of the contract.
    #[structopt(value_name = "contract")]
    contract: Address,

    /// Endpoint to call.
    function: String,

    /// Endpoint arguments, one per declared parameter.
    args: Vec<String>,

    /// Token payment to attach to the call.
    #[structopt(long, default_value = "0", value_name = "amount")]
    value: Balance,
}

#[async_trait::async_trait]
impl CommandT for Call {
    async fn run(&self, ctx: &CommandContext) -> Result<(), CommandError> {
        let abi = ContractAbi::load(&self.abi)?;
        let endpoint = abi
            .endpoint(&self.function)
            .map_err(|err| CommandError::Failure(err.to_string()))?;
        let args = parse_typed_args(&endpoint.inputs, &self.args)?;
        let output_types = endpoint.output_types();
        let contract = Contract::new(abi, self.contract);

        let mut account = author_account(ctx).await?;
        announce_tx(&format!("Calling {}...", self.function));
        let outcome = contract
            .call(
                &ctx.client,
                &ctx.signer,
                &mut account,
                &self.function,
                &args,
                &CallParams {
                    gas_limit: ctx.gas_limit,
                    value: self.value,
                    ..CallParams::default()
                },
            )
            .await?;
        let result = outcome_ok(outcome)?;
        for value in result
            .decode_outputs(&output_types)
            .map_err(calyx_client::Error::from)?
        {
            println!("{}", value);
        }
        Ok(())
    }
}

#[derive(StructOpt, Debug, Clone)]
/// Run a read-only query against a deployed contract.
pub struct Query {
    /// Path to the contract's ABI JSON file.
    #[structopt(long, value_name = "path")]
    abi: PathBuf,

    /// Hex address of the contract.
    #[structopt(value_name = "contract")]
    contract: Address,

    /// Endpoint to query.
    function: String,

    /// Endpoint arguments, one per declared parameter.
    args: Vec<String>,
}

#[async_trait::async_trait]
impl CommandT for Query {
    async fn run(&self, ctx: &CommandContext) -> Result<(), CommandError> {
        let abi = ContractAbi::load(&self.abi)?;
        let endpoint = abi
            .endpoint(&self.function)
            .map_err(|err| CommandError::Failure(err.to_string()))?;
        let args = parse_typed_args(&endpoint.inputs, &self.args)?;
        let contract = Contract::new(abi, self.contract);

        for value in contract.query(&ctx.client, &self.function, &args).await? {
            println!("{}", value);
        }
        Ok(())
    }
}
