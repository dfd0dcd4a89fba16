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

//! Provide an abstract trait for the ledger client and the necessary types.
//!
//! The [ClientT] trait defines one method for each protocol operation:
//! deploy, execute, and query, plus account synchronization and the
//! low-level submit used for reconciliation.

use std::time::Duration;

pub use calyx_core::abi::{ContractAbi, ContractCode};
pub use calyx_core::status::{ExitStatus, TerminalResult};
pub use calyx_core::value::{ScType, Value};
pub use calyx_core::{contract_address, Address, Balance, CallerAccount, Nonce, TxHash};

pub use crate::backend::{AccountInfo, NetworkConfig};
pub use crate::error::{Error, ValidationError};
pub use crate::signer::Signer;
pub use crate::transaction::{CallPayload, Invocation, SignedTransaction};

/// Default gas budget for mutating calls.
pub const DEFAULT_GAS_LIMIT: u64 = 50_000_000;

/// How to wait for a broadcast submission to reach a terminal state.
#[derive(Clone, Debug)]
pub struct PollParams {
    /// Pause between two status probes.
    pub interval: Duration,
    /// Total waiting budget. When exhausted the outcome is
    /// [SubmissionOutcome::TimedOut]; the submission is not retracted.
    pub timeout: Duration,
}

impl Default for PollParams {
    fn default() -> Self {
        PollParams {
            interval: Duration::from_millis(500),
            timeout: Duration::from_secs(60),
        }
    }
}

/// Parameters of a deploy submission.
#[derive(Clone, Debug)]
pub struct DeployParams {
    pub gas_limit: u64,
    /// Defaults to the chain's minimum gas price.
    pub gas_price: Option<u64>,
    pub poll: PollParams,
}

impl Default for DeployParams {
    fn default() -> Self {
        DeployParams {
            gas_limit: DEFAULT_GAS_LIMIT,
            gas_price: None,
            poll: PollParams::default(),
        }
    }
}

/// Parameters of a mutating call submission.
#[derive(Clone, Debug)]
pub struct CallParams {
    pub gas_limit: u64,
    /// Defaults to the chain's minimum gas price.
    pub gas_price: Option<u64>,
    /// Token payment attached to the call; requires a payable endpoint.
    pub value: Balance,
    pub poll: PollParams,
}

impl Default for CallParams {
    fn default() -> Self {
        CallParams {
            gas_limit: DEFAULT_GAS_LIMIT,
            gas_price: None,
            value: 0,
            poll: PollParams::default(),
        }
    }
}

/// What waiting on a broadcast submission resolved to.
///
/// `TimedOut` means the client cannot currently determine what happened:
/// the submission may still reach the ledger later. It is deliberately a
/// separate arm from a completed failure, which is the ledger's explicit
/// verdict.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubmissionOutcome {
    Completed {
        tx_hash: TxHash,
        result: TerminalResult,
    },
    TimedOut {
        tx_hash: TxHash,
    },
}

impl SubmissionOutcome {
    pub fn tx_hash(&self) -> TxHash {
        match self {
            SubmissionOutcome::Completed { tx_hash, .. } => *tx_hash,
            SubmissionOutcome::TimedOut { tx_hash } => *tx_hash,
        }
    }

    /// The terminal result, if one was observed.
    pub fn result(&self) -> Option<&TerminalResult> {
        match self {
            SubmissionOutcome::Completed { result, .. } => Some(result),
            SubmissionOutcome::TimedOut { .. } => None,
        }
    }

    pub fn is_timed_out(&self) -> bool {
        matches!(self, SubmissionOutcome::TimedOut { .. })
    }
}

/// Trait for ledger clients submitting contract invocations and reading
/// contract state.
///
/// Mutating operations take the caller's account as `&mut`: the account's
/// local nonce is consumed at signing time, exactly once per submission,
/// whether or not the submission succeeds on chain. Callers issuing
/// concurrent invocations from one account must serialize them; distinct
/// accounts are independent.
#[async_trait::async_trait]
pub trait ClientT {
    /// Chain parameters of the network this client talks to.
    fn network_config(&self) -> &NetworkConfig;

    /// Replace the account's local nonce with the ledger's current view.
    ///
    /// Must be called before an account's first submission and after any
    /// transport failure that left a nonce burned.
    async fn sync_account(&self, account: &mut CallerAccount) -> Result<(), Error>;

    /// Fetch the ledger's view of any account.
    async fn account_info(&self, address: &Address) -> Result<AccountInfo, Error>;

    /// Deploy a contract.
    ///
    /// The returned address is computed locally from (deployer, nonce)
    /// before broadcast and is valid regardless of how long confirmation
    /// takes; the outcome tells whether the deploy actually succeeded.
    async fn deploy(
        &self,
        signer: &dyn Signer,
        deployer: &mut CallerAccount,
        code: &ContractCode,
        constructor_args: Vec<Vec<u8>>,
        params: &DeployParams,
    ) -> Result<(Address, SubmissionOutcome), Error>;

    /// Call a mutating endpoint of a deployed contract.
    async fn execute(
        &self,
        signer: &dyn Signer,
        caller: &mut CallerAccount,
        contract: &Address,
        function: &str,
        args: Vec<Vec<u8>>,
        params: &CallParams,
    ) -> Result<SubmissionOutcome, Error>;

    /// Run a read-only query. No signature, no nonce, no polling; contract
    /// rejection surfaces as [Error::Execution].
    async fn query(
        &self,
        contract: &Address,
        function: &str,
        args: Vec<Vec<u8>>,
    ) -> Result<Vec<Vec<u8>>, Error>;

    /// Broadcast an already signed transaction and wait for its outcome.
    ///
    /// The signed payload is idempotent at the ledger (deduplicated by
    /// nonce), so this is also the retry path after a transport failure.
    async fn submit_transaction(
        &self,
        transaction: &SignedTransaction,
        poll: &PollParams,
    ) -> Result<SubmissionOutcome, Error>;

    /// Poll an earlier submission until terminal state or budget
    /// exhaustion. Reconciliation path when only the hash is known.
    async fn transaction_outcome(
        &self,
        tx_hash: TxHash,
        poll: &PollParams,
    ) -> Result<SubmissionOutcome, Error>;
}
