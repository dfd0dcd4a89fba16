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

//! Define the command line parser and interface.

use structopt::StructOpt;
use thiserror::Error as ThisError;

use calyx_client::signer::KeyPairSigner;
use calyx_client::Client;

mod command;
use command::{account, contract};

/// The type that captures the command line.
#[derive(StructOpt, Clone)]
#[structopt(max_term_width = 80)]
pub struct CommandLine {
    #[structopt(flatten)]
    pub network_options: NetworkOptions,

    #[structopt(flatten)]
    pub tx_options: TxOptions,

    #[structopt(subcommand)]
    pub command: Command,
}

impl CommandLine {
    pub async fn run(self) -> Result<(), CommandError> {
        let client = self.network_options.client().await?;
        let ctx = CommandContext {
            client,
            signer: self.tx_options.signer(),
            gas_limit: self.tx_options.gas_limit,
        };
        self.command.run(&ctx).await
    }
}

/// Network-related command-line options
#[derive(StructOpt, Clone, Debug)]
pub struct NetworkOptions {
    /// Base URL of the gateway node's HTTP API
    #[structopt(
        long,
        default_value = "http://127.0.0.1:7950",
        env = "CALYX_GATEWAY",
        value_name = "url"
    )]
    pub gateway: String,
}

impl NetworkOptions {
    pub async fn client(&self) -> Result<Client, calyx_client::Error> {
        Client::from_gateway(&self.gateway).await
    }
}

/// Transaction-related command-line options
#[derive(StructOpt, Clone)]
pub struct TxOptions {
    /// Development seed the transaction author's key pair is derived from.
    #[structopt(
        long,
        default_value = "alice",
        env = "CALYX_AUTHOR_SEED",
        value_name = "seed"
    )]
    pub author_seed: String,

    /// Gas budget for submitted transactions.
    #[structopt(long, default_value = "50000000", env = "CALYX_GAS_LIMIT", value_name = "gas")]
    pub gas_limit: u64,
}

impl TxOptions {
    /// Return the signer derived from [TxOptions::author_seed].
    pub fn signer(&self) -> KeyPairSigner {
        KeyPairSigner::from_dev_seed(&self.author_seed)
    }
}

/// Context available to every command.
pub struct CommandContext {
    pub client: Client,
    pub signer: KeyPairSigner,
    pub gas_limit: u64,
}

/// Error returned by [CommandT::run].
#[derive(Debug, ThisError)]
pub enum CommandError {
    #[error(transparent)]
    Client(#[from] calyx_client::Error),

    #[error("failed to load contract ABI")]
    AbiLoad(#[from] calyx_client::abi::AbiLoadError),

    #[error("failed to read contract code")]
    Io(#[from] std::io::Error),

    /// The command ran but did not succeed.
    #[error("{0}")]
    Failure(String),
}

/// Every CLI command must implement this trait.
#[async_trait::async_trait]
pub trait CommandT {
    async fn run(&self, ctx: &CommandContext) -> Result<(), CommandError>;
}

#[derive(StructOpt, Clone)]
pub enum Command {
    /// Account related commands
    Account(account::Command),
    /// Contract related commands
    Contract(contract::Command),
}

#[async_trait::async_trait]
impl CommandT for Command {
    async fn run(&self, ctx: &CommandContext) -> Result<(), CommandError> {
        match self {
            Command::Account(cmd) => cmd.run(ctx).await,
            Command::Contract(cmd) => cmd.run(ctx).await,
        }
    }
}
