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

//! Provides [Emulator], a backend that runs the ledger in memory.
//!
//! The emulator is not a virtual machine: deployed code is replaced by
//! native [ContractLogic] doubles registered per code blob. What it does
//! enforce faithfully is the client-visible ledger contract: signature
//! verification, strict nonce ordering, deterministic deploy addresses,
//! token payments, and terminal statuses.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use ed25519_dalek::{Signature, Verifier as _, VerifyingKey};

use calyx_core::status::{ExitStatus, TerminalResult};
use calyx_core::{contract_address, Address, Balance, Nonce, TxHash};

use crate::backend::{
    AccountInfo, Backend, NetworkConfig, QueryRequest, QueryResponse, SubmissionStatus,
};
use crate::error::Error;
use crate::transaction::{SignedTransaction, Transaction};

/// Native stand-in for a deployed contract.
///
/// Implementations hold their own storage. Execution errors are returned as
/// plain messages and surface to the client as user-error terminal results,
/// exactly like an assertion failure inside real contract code.
pub trait ContractLogic: Send {
    /// Run the constructor. Called once, at deploy.
    fn init(&mut self, ctx: &CallContext, args: &[Vec<u8>]) -> Result<Vec<Vec<u8>>, String>;

    /// Run a mutating endpoint.
    fn execute(
        &mut self,
        ctx: &CallContext,
        function: &str,
        args: &[Vec<u8>],
    ) -> Result<Vec<Vec<u8>>, String>;

    /// Run a read-only endpoint against current storage.
    fn view(&self, function: &str, args: &[Vec<u8>]) -> Result<Vec<Vec<u8>>, String>;
}

/// Execution context visible to a contract double.
pub struct CallContext {
    pub caller: Address,
    /// Token payment attached to the call.
    pub value: Balance,
}

type LogicFactory = Box<dyn Fn() -> Box<dyn ContractLogic> + Send + Sync>;

/// [Backend] implementation keeping all ledger state in memory.
///
/// # Differences with a real gateway
///
/// * Submissions execute synchronously at broadcast; the configurable
///   confirmation lag only delays when the terminal state becomes visible
///   to status polls.
/// * Accounts that were never seen before simply have nonce and balance
///   zero, as on a real chain.
#[derive(Clone)]
pub struct Emulator {
    network_config: NetworkConfig,
    state: Arc<Mutex<EmulatorState>>,
}

struct EmulatorState {
    /// Number of status polls a submission stays pending before its
    /// terminal state is revealed.
    confirmation_lag: u32,
    accounts: HashMap<Address, AccountState>,
    contracts: HashMap<Address, Box<dyn ContractLogic>>,
    code_registry: Vec<(Vec<u8>, LogicFactory)>,
    submissions: HashMap<TxHash, Submission>,
}

#[derive(Default)]
struct AccountState {
    nonce: Nonce,
    balance: Balance,
}

struct Submission {
    /// Status probes observed so far; compared against the emulator's
    /// current confirmation lag, so lowering the lag reveals pending
    /// submissions immediately.
    polls_observed: u32,
    result: TerminalResult,
}

impl Emulator {
    pub fn new() -> Self {
        Emulator {
            network_config: NetworkConfig {
                chain_id: "emulator".to_string(),
                min_gas_price: 1_000,
                min_gas_limit: 50_000,
            },
            state: Arc::new(Mutex::new(EmulatorState {
                confirmation_lag: 0,
                accounts: HashMap::new(),
                contracts: HashMap::new(),
                code_registry: Vec::new(),
                submissions: HashMap::new(),
            })),
        }
    }

    /// Keep submissions pending for the given number of status polls.
    pub fn set_confirmation_lag(&self, polls: u32) {
        self.state.lock().unwrap().confirmation_lag = polls;
    }

    /// Associate a code blob with the contract double deployed for it.
    pub fn register_code<F>(&self, code: &[u8], factory: F)
    where
        F: Fn() -> Box<dyn ContractLogic> + Send + Sync + 'static,
    {
        self.state
            .lock()
            .unwrap()
            .code_registry
            .push((code.to_vec(), Box::new(factory)));
    }

    /// Credit an account, creating it if needed.
    pub fn credit_account(&self, address: Address, amount: Balance) {
        let mut state = self.state.lock().unwrap();
        state.accounts.entry(address).or_default().balance += amount;
    }
}

impl Default for Emulator {
    fn default() -> Self {
        Emulator::new()
    }
}

#[async_trait::async_trait]
impl Backend for Emulator {
    fn network_config(&self) -> &NetworkConfig {
        &self.network_config
    }

    async fn account(&self, address: &Address) -> Result<AccountInfo, Error> {
        let state = self.state.lock().unwrap();
        let account = state.accounts.get(address);
        Ok(AccountInfo {
            address: *address,
            nonce: account.map_or(0, |a| a.nonce),
            balance: account.map_or(0, |a| a.balance),
        })
    }

    async fn broadcast(&self, transaction: &SignedTransaction) -> Result<TxHash, Error> {
        verify_signature(transaction)?;
        let payload = parse_data_field(transaction.transaction())?;

        let mut state = self.state.lock().unwrap();
        let result = state.apply(transaction, payload);
        let hash = transaction.hash();
        state.submissions.insert(
            hash,
            Submission {
                polls_observed: 0,
                result,
            },
        );
        log::debug!("emulator accepted transaction {}", hash);
        Ok(hash)
    }

    async fn transaction_status(&self, hash: &TxHash) -> Result<SubmissionStatus, Error> {
        let mut state = self.state.lock().unwrap();
        let confirmation_lag = state.confirmation_lag;
        let submission = state
            .submissions
            .get_mut(hash)
            .ok_or(Error::UnknownTransaction(*hash))?;
        if submission.polls_observed < confirmation_lag {
            submission.polls_observed += 1;
            Ok(SubmissionStatus::Pending)
        } else {
            Ok(SubmissionStatus::Completed(submission.result.clone()))
        }
    }

    async fn simulate_query(&self, request: &QueryRequest) -> Result<QueryResponse, Error> {
        let args = decode_hex_args(&request.args)?;
        let state = self.state.lock().unwrap();
        let outcome = match state.contracts.get(&request.contract) {
            Some(logic) => logic.view(&request.function, &args),
            None => Err(format!("no contract at address {}", request.contract)),
        };
        Ok(match outcome {
            Ok(return_data) => QueryResponse {
                return_code: ExitStatus::Success.return_code().to_string(),
                return_message: String::new(),
                return_data: return_data.iter().map(hex::encode).collect(),
            },
            Err(message) => QueryResponse {
                return_code: ExitStatus::UserError.return_code().to_string(),
                return_message: message,
                return_data: Vec::new(),
            },
        })
    }
}

impl EmulatorState {
    /// Execute a submission against the ledger state and produce its
    /// terminal result. Rejections are results too, never panics.
    fn apply(&mut self, transaction: &SignedTransaction, payload: ParsedPayload) -> TerminalResult {
        let sender = transaction.sender();
        let nonce = transaction.nonce();
        let value: Balance = match transaction.transaction().value.parse() {
            Ok(value) => value,
            Err(_) => {
                return TerminalResult::failure(ExitStatus::Failed, "malformed value field");
            }
        };

        let account = self.accounts.entry(sender).or_default();
        if nonce != account.nonce {
            return TerminalResult::failure(
                ExitStatus::Failed,
                format!(
                    "transaction nonce {} does not match account nonce {}",
                    nonce, account.nonce
                ),
            );
        }
        // The nonce is consumed by execution regardless of the outcome.
        account.nonce += 1;

        if account.balance < value {
            return TerminalResult::failure(ExitStatus::UserError, "insufficient funds");
        }

        let ctx = CallContext {
            caller: sender,
            value,
        };
        match payload {
            ParsedPayload::Deploy { code, args } => {
                let factory = self
                    .code_registry
                    .iter()
                    .find(|(registered, _)| *registered == code)
                    .map(|(_, factory)| factory);
                let mut logic = match factory {
                    Some(factory) => factory(),
                    None => {
                        return TerminalResult::failure(
                            ExitStatus::UserError,
                            "contract code is not registered with the emulator",
                        );
                    }
                };
                let address = contract_address(&sender, nonce);
                match logic.init(&ctx, &args) {
                    Ok(return_data) => {
                        self.transfer(sender, address, value);
                        self.contracts.insert(address, logic);
                        TerminalResult::success(return_data)
                    }
                    Err(message) => TerminalResult::failure(ExitStatus::UserError, message),
                }
            }
            ParsedPayload::Call { function, args } => {
                let receiver = transaction.transaction().receiver;
                let outcome = match self.contracts.get_mut(&receiver) {
                    Some(logic) => logic.execute(&ctx, &function, &args),
                    None => {
                        return TerminalResult::failure(
                            ExitStatus::UserError,
                            format!("no contract at address {}", receiver),
                        );
                    }
                };
                match outcome {
                    Ok(return_data) => {
                        self.transfer(sender, receiver, value);
                        TerminalResult::success(return_data)
                    }
                    Err(message) => TerminalResult::failure(ExitStatus::UserError, message),
                }
            }
        }
    }

    fn transfer(&mut self, from: Address, to: Address, value: Balance) {
        if value == 0 {
            return;
        }
        // Balance sufficiency was checked before execution.
        self.accounts.entry(from).or_default().balance -= value;
        self.accounts.entry(to).or_default().balance += value;
    }
}

enum ParsedPayload {
    Deploy { code: Vec<u8>, args: Vec<Vec<u8>> },
    Call { function: String, args: Vec<Vec<u8>> },
}

/// Parse the wire data field the way the ledger does.
///
/// Deploys (transactions to the all-zero address) carry
/// `hex(code)@vm@flags@args…`; calls carry `function@args…`.
fn parse_data_field(transaction: &Transaction) -> Result<ParsedPayload, Error> {
    let data = transaction.data.as_deref().unwrap_or_default();
    let is_deploy = transaction.receiver == Address::from_bytes([0u8; 32]);
    let mut segments = data.split('@');

    if is_deploy {
        let code_hex = segments.next().unwrap_or_default();
        let code = hex::decode(code_hex)
            .map_err(|_| Error::InvalidTransaction("deploy code is not hex".to_string()))?;
        // VM selector and code flags are accepted as-is.
        let _vm_type = segments.next();
        let _code_flags = segments.next();
        let args = decode_arg_segments(segments)?;
        Ok(ParsedPayload::Deploy { code, args })
    } else {
        let function = segments.next().unwrap_or_default().to_string();
        if function.is_empty() {
            return Err(Error::InvalidTransaction(
                "call data has no function name".to_string(),
            ));
        }
        let args = decode_arg_segments(segments)?;
        Ok(ParsedPayload::Call { function, args })
    }
}

fn decode_arg_segments<'a>(
    segments: impl Iterator<Item = &'a str>,
) -> Result<Vec<Vec<u8>>, Error> {
    segments
        .map(|segment| {
            hex::decode(segment)
                .map_err(|_| Error::InvalidTransaction("argument is not hex".to_string()))
        })
        .collect()
}

fn decode_hex_args(args: &[String]) -> Result<Vec<Vec<u8>>, Error> {
    args.iter()
        .map(|arg| {
            hex::decode(arg)
                .map_err(|_| Error::Other("query argument is not hex".to_string()))
        })
        .collect()
}

/// Check the Ed25519 signature against the sender address, as the gateway
/// does before accepting a submission.
fn verify_signature(transaction: &SignedTransaction) -> Result<(), Error> {
    let mut unsigned = transaction.transaction().clone();
    let signature_hex = match unsigned.signature.take() {
        Some(signature) => signature,
        None => {
            return Err(Error::InvalidTransaction("missing signature".to_string()));
        }
    };
    let signature_bytes = hex::decode(&signature_hex)
        .map_err(|_| Error::InvalidTransaction("signature is not hex".to_string()))?;
    let signature = Signature::from_slice(&signature_bytes)
        .map_err(|_| Error::InvalidTransaction("malformed signature".to_string()))?;

    let key = VerifyingKey::from_bytes(unsigned.sender.as_bytes())
        .map_err(|_| Error::InvalidTransaction("sender is not a valid public key".to_string()))?;
    let payload = serde_json::to_vec(&unsigned)
        .map_err(|err| Error::Other(format!("failed to serialize transaction: {}", err)))?;
    key.verify(&payload, &signature)
        .map_err(|_| Error::InvalidTransaction("signature verification failed".to_string()))
}
