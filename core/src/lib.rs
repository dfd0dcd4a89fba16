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

//! Basic types used by the Calyx ledger client.
//!
//! Everything here is independent of any concrete network backend: addresses
//! and transaction hashes, the typed argument values and their canonical
//! encoding, the contract ABI schema, and the deterministic contract address
//! derivation.

pub mod abi;
pub mod status;
pub mod value;

mod address;
pub use address::{contract_address, Address, AddressParseError, ADDRESS_LENGTH};

mod hash;
pub use hash::{TxHash, TxHashParseError};

/// Balance of an account, also used for token payments attached to a call.
pub type Balance = u128;

/// Per-account transaction sequence number.
///
/// Assigned to exactly one signed submission; the ledger rejects any reuse.
pub type Nonce = u64;

/// A caller-owned account with its locally tracked nonce.
///
/// The nonce mirrors the ledger's view only if it has been synced before
/// first use and every signed submission since then went through this value.
/// Mutating client operations take `&mut CallerAccount`, which makes the
/// single-writer-per-account discipline a borrow-checker guarantee.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallerAccount {
    pub address: Address,
    pub nonce: Nonce,
}

impl CallerAccount {
    /// A fresh account view with a zero nonce, to be synced against the
    /// ledger before first use.
    pub fn new(address: Address) -> Self {
        CallerAccount { address, nonce: 0 }
    }

    /// Consume the current nonce for a signed submission.
    ///
    /// Called exactly once per signature, at signing time.
    pub fn consume_nonce(&mut self) -> Nonce {
        let nonce = self.nonce;
        self.nonce += 1;
        nonce
    }
}
