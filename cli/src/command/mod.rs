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

//! Define the commands supported by the CLI.

use crate::{CommandContext, CommandError, CommandT};
use calyx_client::abi::ParamAbi;
use calyx_client::value::BigUint;
use calyx_client::*;

use structopt::StructOpt;

pub mod account;
pub mod contract;

fn announce_tx(msg: &str) {
    println!("{}", msg);
    println!("⏳ Transactions might take a while to be processed. Please wait...");
}

/// Parse raw command-line arguments into typed values, following the
/// endpoint's declared parameter types.
fn parse_typed_args(params: &[ParamAbi], raw: &[String]) -> Result<Vec<Value>, CommandError> {
    if params.len() != raw.len() {
        return Err(CommandError::Failure(format!(
            "expected {} arguments, got {}",
            params.len(),
            raw.len()
        )));
    }
    params
        .iter()
        .zip(raw)
        .map(|(param, input)| {
            parse_typed_arg(param.sc_type, input).map_err(|reason| {
                CommandError::Failure(format!(
                    "argument {} ({}): {}",
                    param.name, param.sc_type, reason
                ))
            })
        })
        .collect()
}

fn parse_typed_arg(sc_type: ScType, input: &str) -> Result<Value, String> {
    match sc_type {
        ScType::Bool => match input {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            _ => Err("expected true or false".to_string()),
        },
        ScType::U32 => input
            .parse()
            .map(Value::U32)
            .map_err(|_| "expected an unsigned integer".to_string()),
        ScType::U64 => input
            .parse()
            .map(Value::U64)
            .map_err(|_| "expected an unsigned integer".to_string()),
        ScType::BigUint => input
            .parse::<u64>()
            .map(|n| Value::BigUint(BigUint::from(n)))
            .map_err(|_| "expected an unsigned integer".to_string()),
        ScType::Bytes => hex::decode(input.trim_start_matches("0x"))
            .map(Value::Bytes)
            .map_err(|_| "expected hex-encoded bytes".to_string()),
        ScType::Address => input
            .parse()
            .map(Value::Address)
            .map_err(|_| "expected a hex-encoded address".to_string()),
    }
}

/// Print a completed outcome, or turn a failure or timeout into a
/// [CommandError].
fn outcome_ok(outcome: SubmissionOutcome) -> Result<TerminalResult, CommandError> {
    match outcome {
        SubmissionOutcome::Completed { tx_hash, result } => {
            if result.is_success() {
                println!("✓ transaction {} applied", tx_hash);
                Ok(result)
            } else {
                Err(CommandError::Failure(format!(
                    "transaction {} completed with status {}: {}",
                    tx_hash, result.status, result.message
                )))
            }
        }
        SubmissionOutcome::TimedOut { tx_hash } => Err(CommandError::Failure(format!(
            "transaction {} is still pending; it may yet be applied",
            tx_hash
        ))),
    }
}

/// A synced account for the context's signer.
async fn author_account(ctx: &CommandContext) -> Result<CallerAccount, CommandError> {
    let mut account = CallerAccount::new(ctx.signer.address());
    ctx.client.sync_account(&mut account).await?;
    Ok(account)
}
