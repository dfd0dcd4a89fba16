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

//! Terminal outcome of an executed submission.

use crate::value::{ScType, Value, ValueError};

/// Exit status of a submission the ledger has executed.
///
/// Every variant other than [ExitStatus::Success] is still a *terminal*
/// outcome: the transaction ran, consumed its nonce, and completed with the
/// given status. Contract-level failure is part of the contract's expected
/// behavior space and is never surfaced as a transport error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExitStatus {
    Success,
    /// The contract rejected the call (assertion, bad state, bad payment).
    UserError,
    OutOfGas,
    /// Any other ledger-side failure, including nonce replay rejection.
    Failed,
}

impl ExitStatus {
    /// Map the gateway's return code string to a status.
    pub fn from_return_code(code: &str) -> ExitStatus {
        match code {
            "ok" => ExitStatus::Success,
            "user error" => ExitStatus::UserError,
            "out of gas" => ExitStatus::OutOfGas,
            _ => ExitStatus::Failed,
        }
    }

    pub fn return_code(&self) -> &'static str {
        match self {
            ExitStatus::Success => "ok",
            ExitStatus::UserError => "user error",
            ExitStatus::OutOfGas => "out of gas",
            ExitStatus::Failed => "failed",
        }
    }

    pub fn is_success(&self) -> bool {
        *self == ExitStatus::Success
    }
}

impl std::fmt::Display for ExitStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.return_code())
    }
}

/// The ledger's final outcome for a submission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TerminalResult {
    pub status: ExitStatus,
    /// Raw encoded return values; empty unless the call succeeded.
    pub return_data: Vec<Vec<u8>>,
    /// Diagnostic text from the ledger or the contract.
    pub message: String,
}

impl TerminalResult {
    pub fn success(return_data: Vec<Vec<u8>>) -> Self {
        TerminalResult {
            status: ExitStatus::Success,
            return_data,
            message: String::new(),
        }
    }

    pub fn failure(status: ExitStatus, message: impl Into<String>) -> Self {
        TerminalResult {
            status,
            return_data: Vec::new(),
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Decode the return data against the declared output types.
    pub fn decode_outputs(&self, types: &[ScType]) -> Result<Vec<Value>, ValueError> {
        Value::top_decode_all(types, &self.return_data)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn return_code_round_trip() {
        for status in [
            ExitStatus::Success,
            ExitStatus::UserError,
            ExitStatus::OutOfGas,
        ] {
            assert_eq!(ExitStatus::from_return_code(status.return_code()), status);
        }
        assert_eq!(
            ExitStatus::from_return_code("execution failed"),
            ExitStatus::Failed
        );
    }

    #[test]
    fn decode_outputs() {
        let result = TerminalResult::success(vec![vec![42]]);
        let values = result.decode_outputs(&[ScType::U64]).unwrap();
        assert_eq!(values, vec![Value::U64(42)]);
    }
}
