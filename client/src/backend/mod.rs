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

//! Define trait for client backends and provide gateway and emulator
//! implementations.

use serde::{Deserialize, Serialize};

use calyx_core::status::TerminalResult;
use calyx_core::{Address, Balance, Nonce, TxHash};

use crate::error::Error;
use crate::transaction::SignedTransaction;

mod emulator;
mod gateway;

pub use emulator::{CallContext, ContractLogic, Emulator};
pub use gateway::Gateway;

/// Backend for talking to the ledger.
///
/// The interface is the narrow waist between the protocol sequencing in
/// [crate::Client] and any concrete network provider: broadcast a signed
/// submission, probe its status, simulate a read-only query, and look up
/// account state. Gateway API churn stays behind this trait.
#[async_trait::async_trait]
pub trait Backend: Send + Sync {
    /// Chain parameters fetched when the backend was created.
    fn network_config(&self) -> &NetworkConfig;

    /// Fetch the ledger's view of an account.
    async fn account(&self, address: &Address) -> Result<AccountInfo, Error>;

    /// Submit a signed transaction for execution and return its hash.
    ///
    /// Acceptance only means the gateway took the submission; execution is
    /// observed through [Backend::transaction_status].
    async fn broadcast(&self, transaction: &SignedTransaction) -> Result<TxHash, Error>;

    /// Probe whether a submission has reached a terminal state.
    ///
    /// Safe to call repeatedly; the probe is idempotent and is the caller's
    /// reconciliation path after a transport failure.
    async fn transaction_status(&self, hash: &TxHash) -> Result<SubmissionStatus, Error>;

    /// Run a read-only query against current state, without a transaction.
    async fn simulate_query(&self, request: &QueryRequest) -> Result<QueryResponse, Error>;
}

/// Chain parameters every transaction must carry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkConfig {
    #[serde(rename = "chainID")]
    pub chain_id: String,
    pub min_gas_price: u64,
    pub min_gas_limit: u64,
}

/// The ledger's view of an account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountInfo {
    pub address: Address,
    pub nonce: Nonce,
    pub balance: Balance,
}

/// Status of a broadcast submission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubmissionStatus {
    /// Not yet in a terminal state; poll again.
    Pending,
    /// The ledger reached a final, immutable outcome.
    Completed(TerminalResult),
}

/// A read-only contract call to be simulated by the backend.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    pub contract: Address,
    pub function: String,
    /// Hex-encoded top-encoded arguments.
    pub args: Vec<String>,
}

impl QueryRequest {
    pub fn new(contract: Address, function: impl Into<String>, args: &[Vec<u8>]) -> Self {
        QueryRequest {
            contract,
            function: function.into(),
            args: args.iter().map(hex::encode).collect(),
        }
    }
}

/// Outcome of a simulated query.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResponse {
    pub return_code: String,
    #[serde(default)]
    pub return_message: String,
    /// Hex-encoded return values.
    #[serde(default)]
    pub return_data: Vec<String>,
}
