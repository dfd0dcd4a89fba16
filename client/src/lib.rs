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

//! Client for the Calyx ledger.
//!
//! [Client] implements [ClientT] on top of any [backend::Backend]: the
//! remote [backend::Gateway] for a real network, or the in-memory
//! [backend::Emulator] for development and testing. The sequencing contract
//! is the same against both: build an invocation, assign the account's next
//! nonce, sign, broadcast, poll until a terminal state, decode the outcome.
//!
//! ```no_run
//! # use calyx_client::*;
//! # async fn example(signer: signer::KeyPairSigner) -> Result<(), Error> {
//! let client = Client::from_gateway("http://localhost:7950").await?;
//!
//! let mut account = CallerAccount::new(signer.address());
//! client.sync_account(&mut account).await?;
//!
//! let abi = ContractAbi::load("accumulator.abi.json").unwrap();
//! let code = ContractCode::load("accumulator.wasm").unwrap();
//! let deployer = contract::Deployer::new(abi, code);
//! let (contract, outcome) = deployer
//!     .deploy(&client, &signer, &mut account, &[Value::U64(0)], &DeployParams::default())
//!     .await?;
//! println!("deployed at {}: {:?}", contract.address(), outcome);
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Instant;

pub mod backend;
pub mod contract;
pub mod signer;

mod error;
mod interface;
mod result;
mod transaction;

pub use crate::interface::*;

pub use calyx_core::abi;
pub use calyx_core::value;

use crate::backend::{Backend, SubmissionStatus};

/// Client to interact with the Calyx ledger.
///
/// Implements [ClientT] for the protocol operations. Cheap to clone; all
/// clones share one backend connection.
#[derive(Clone)]
pub struct Client {
    backend: Arc<dyn Backend>,
}

impl Client {
    /// Wrap any backend implementation.
    pub fn new(backend: impl Backend + 'static) -> Self {
        Client {
            backend: Arc::new(backend),
        }
    }

    /// Connect to a gateway node and fetch the chain parameters.
    ///
    /// Fails if the gateway is unreachable.
    pub async fn from_gateway(url: &str) -> Result<Self, Error> {
        Ok(Client::new(backend::Gateway::create(url).await?))
    }

    /// Run against an in-memory ledger emulator.
    ///
    /// The emulator handle stays usable for registering contract doubles
    /// and crediting accounts; it shares state with the client.
    pub fn from_emulator(emulator: backend::Emulator) -> Self {
        Client::new(emulator)
    }

    /// Sign the invocation and consume the account's nonce.
    ///
    /// This is the single point where a nonce is spent: the increment
    /// happens with the signature, before broadcast, because a signed
    /// payload is irrevocably bound to its nonce the moment it may reach
    /// the network. Validation failures before this point leave the
    /// account untouched.
    fn sign_consuming_nonce(
        &self,
        signer: &dyn Signer,
        account: &mut CallerAccount,
        invocation: &Invocation,
    ) -> Result<SignedTransaction, Error> {
        if signer.address() != account.address {
            return Err(ValidationError::SignerAccountMismatch {
                account: account.address,
                signer: signer.address(),
            }
            .into());
        }
        let signed = SignedTransaction::new_signed(signer, invocation)?;
        let consumed = account.consume_nonce();
        debug_assert_eq!(consumed, invocation.nonce);
        Ok(signed)
    }

    fn gas_price(&self, requested: Option<u64>) -> u64 {
        requested.unwrap_or(self.backend.network_config().min_gas_price)
    }
}

#[async_trait::async_trait]
impl ClientT for Client {
    fn network_config(&self) -> &NetworkConfig {
        self.backend.network_config()
    }

    async fn sync_account(&self, account: &mut CallerAccount) -> Result<(), Error> {
        let info = self.backend.account(&account.address).await?;
        account.nonce = info.nonce;
        Ok(())
    }

    async fn account_info(&self, address: &Address) -> Result<AccountInfo, Error> {
        self.backend.account(address).await
    }

    async fn deploy(
        &self,
        signer: &dyn Signer,
        deployer: &mut CallerAccount,
        code: &ContractCode,
        constructor_args: Vec<Vec<u8>>,
        params: &DeployParams,
    ) -> Result<(Address, SubmissionOutcome), Error> {
        let invocation = Invocation {
            target: None,
            payload: CallPayload::Deploy {
                code: code.clone(),
                args: constructor_args,
            },
            value: 0,
            gas_limit: params.gas_limit,
            gas_price: self.gas_price(params.gas_price),
            chain_id: self.backend.network_config().chain_id.clone(),
            nonce: deployer.nonce,
        };
        // The deploy address is a pure function of (sender, nonce) and is
        // known before the network has seen the transaction.
        let address = contract_address(&deployer.address, invocation.nonce);
        let signed = self.sign_consuming_nonce(signer, deployer, &invocation)?;
        let outcome = self.submit_transaction(&signed, &params.poll).await?;
        Ok((address, outcome))
    }

    async fn execute(
        &self,
        signer: &dyn Signer,
        caller: &mut CallerAccount,
        contract: &Address,
        function: &str,
        args: Vec<Vec<u8>>,
        params: &CallParams,
    ) -> Result<SubmissionOutcome, Error> {
        let invocation = Invocation {
            target: Some(*contract),
            payload: CallPayload::Call {
                function: function.to_string(),
                args,
            },
            value: params.value,
            gas_limit: params.gas_limit,
            gas_price: self.gas_price(params.gas_price),
            chain_id: self.backend.network_config().chain_id.clone(),
            nonce: caller.nonce,
        };
        let signed = self.sign_consuming_nonce(signer, caller, &invocation)?;
        self.submit_transaction(&signed, &params.poll).await
    }

    async fn query(
        &self,
        contract: &Address,
        function: &str,
        args: Vec<Vec<u8>>,
    ) -> Result<Vec<Vec<u8>>, Error> {
        let request = backend::QueryRequest::new(*contract, function, &args);
        let response = self.backend.simulate_query(&request).await?;
        let status = ExitStatus::from_return_code(&response.return_code);
        if !status.is_success() {
            return Err(Error::Execution {
                status,
                message: response.return_message,
            });
        }
        response
            .return_data
            .iter()
            .map(|datum| {
                hex::decode(datum)
                    .map_err(|_| Error::Other("malformed query return data".to_string()))
            })
            .collect()
    }

    async fn submit_transaction(
        &self,
        transaction: &SignedTransaction,
        poll: &PollParams,
    ) -> Result<SubmissionOutcome, Error> {
        let tx_hash = self.backend.broadcast(transaction).await?;
        log::info!("broadcast transaction {}", tx_hash);
        self.transaction_outcome(tx_hash, poll).await
    }

    async fn transaction_outcome(
        &self,
        tx_hash: TxHash,
        poll: &PollParams,
    ) -> Result<SubmissionOutcome, Error> {
        let started = Instant::now();
        loop {
            match self.backend.transaction_status(&tx_hash).await? {
                SubmissionStatus::Completed(result) => {
                    log::info!(
                        "transaction {} completed with status {}",
                        tx_hash,
                        result.status
                    );
                    return Ok(SubmissionOutcome::Completed { tx_hash, result });
                }
                SubmissionStatus::Pending => {
                    if started.elapsed() >= poll.timeout {
                        log::warn!(
                            "transaction {} still pending after {:?}",
                            tx_hash,
                            poll.timeout
                        );
                        return Ok(SubmissionOutcome::TimedOut { tx_hash });
                    }
                    tokio::time::sleep(poll.interval).await;
                }
            }
        }
    }
}
