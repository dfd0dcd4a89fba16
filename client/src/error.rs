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

use calyx_core::abi::AbiError;
use calyx_core::status::ExitStatus;
use calyx_core::value::ValueError;
use calyx_core::{Address, TxHash};

use crate::signer::SignerError;

/// Error that may be returned by any of the [crate::ClientT] methods.
///
/// Contract-level execution failure is deliberately absent: a submission the
/// ledger executed and reverted is a [calyx_core::status::TerminalResult]
/// with a non-success status, not an error. The one exception is
/// [Error::Execution] for read-only queries, which have no terminal result
/// object to carry the status.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The call does not match the schema or the local account state.
    /// Raised before signing; no nonce was consumed and nothing was sent.
    #[error("invalid call: {0}")]
    Validation(#[from] ValidationError),

    /// The network request failed. For a broadcast this leaves the
    /// submission state unknown and the local nonce burned; reconcile with
    /// [crate::ClientT::sync_account].
    #[error("transport error talking to the gateway: {0}")]
    Transport(String),

    /// The gateway rejected the submission outright, before execution.
    #[error("transaction rejected: {0}")]
    InvalidTransaction(String),

    /// The gateway does not know the given transaction hash.
    #[error("unknown transaction {0}")]
    UnknownTransaction(TxHash),

    /// A read-only query was executed and rejected by the contract.
    #[error("query failed with status {status}: {message}")]
    Execution { status: ExitStatus, message: String },

    /// Decoding the received data failed.
    #[error("decoding the received data failed")]
    Codec(#[from] ValueError),

    #[error("signing failed")]
    Signer(#[from] SignerError),

    /// Other error.
    #[error("other error: {0}")]
    Other(String),
}

impl From<reqwest::Error> for Error {
    fn from(error: reqwest::Error) -> Self {
        Error::Transport(error.to_string())
    }
}

impl From<String> for Error {
    fn from(error: String) -> Self {
        Error::Other(error)
    }
}

impl From<&str> for Error {
    fn from(error: &str) -> Self {
        Error::Other(error.into())
    }
}

/// Local validation failures. None of these have side effects.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error(transparent)]
    Abi(#[from] AbiError),
    /// The account passed in does not belong to the signer.
    #[error("account {account} does not match signer address {signer}")]
    SignerAccountMismatch { account: Address, signer: Address },
}
