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

//! Miscellaneous helpers used throughout Calyx client tests.

use calyx_client::backend::Emulator;
use calyx_client::signer::KeyPairSigner;
use calyx_client::{Balance, CallerAccount, ClientT, Signer as _, SubmissionOutcome, TerminalResult};

pub mod fixtures;

/// Deterministic signer for a named development account.
pub fn dev_signer(name: &str) -> KeyPairSigner {
    KeyPairSigner::from_dev_seed(name)
}

/// Signer with a fresh random key.
pub fn random_signer() -> KeyPairSigner {
    KeyPairSigner::from_seed(rand::random())
}

/// Credit the signer's account on the emulator and return a synced
/// [CallerAccount] for it.
///
/// Panics if the sync fails; the emulator backend does not error.
pub async fn funded_account(
    client: &(impl ClientT + Sync),
    emulator: &Emulator,
    signer: &KeyPairSigner,
    balance: Balance,
) -> CallerAccount {
    emulator.credit_account(signer.address(), balance);
    let mut account = CallerAccount::new(signer.address());
    client.sync_account(&mut account).await.unwrap();
    account
}

/// Unwrap an outcome that is expected to have completed successfully.
///
/// Panics with the terminal diagnostic otherwise.
pub fn expect_success(outcome: SubmissionOutcome) -> TerminalResult {
    match outcome {
        SubmissionOutcome::Completed { result, .. } => {
            assert!(
                result.is_success(),
                "submission completed with status {}: {}",
                result.status,
                result.message
            );
            result
        }
        SubmissionOutcome::TimedOut { tx_hash } => {
            panic!("submission {} timed out", tx_hash)
        }
    }
}

/// Unwrap an outcome that is expected to have completed, successfully or
/// not, and return the terminal result.
pub fn expect_completed(outcome: SubmissionOutcome) -> TerminalResult {
    match outcome {
        SubmissionOutcome::Completed { result, .. } => result,
        SubmissionOutcome::TimedOut { tx_hash } => {
            panic!("submission {} timed out", tx_hash)
        }
    }
}
