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

//! Provides [Invocation] and [SignedTransaction].

use serde::{Deserialize, Serialize};

use calyx_core::abi::ContractCode;
use calyx_core::{Address, Balance, Nonce, TxHash};

use crate::error::Error;
use crate::signer::Signer;

/// Wire version of the transaction format accepted by the gateway.
pub const TRANSACTION_VERSION: u32 = 1;

/// Virtual machine selector in a deploy payload.
const DEPLOY_VM_TYPE: &str = "0500";

/// Default code flags in a deploy payload (upgradeable, non-payable code).
const DEPLOY_CODE_FLAGS: &str = "0100";

/// An immutable description of one contract call, carrying the sequence
/// number it was built against.
///
/// Created fresh per call and consumed by exactly one signature. The nonce
/// is taken from the caller's account; the account itself is advanced by the
/// client at signing time, never here.
#[derive(Clone, Debug)]
pub struct Invocation {
    /// Target contract; `None` for a deploy.
    pub target: Option<Address>,
    pub payload: CallPayload,
    /// Token payment attached to the call. Visible to the contract as an
    /// incoming transfer, not as an argument.
    pub value: Balance,
    pub gas_limit: u64,
    pub gas_price: u64,
    pub chain_id: String,
    pub nonce: Nonce,
}

/// What a transaction asks the ledger to run.
#[derive(Clone, Debug)]
pub enum CallPayload {
    /// Instantiate the given code with encoded constructor arguments.
    Deploy {
        code: ContractCode,
        args: Vec<Vec<u8>>,
    },
    /// Call an endpoint with encoded arguments.
    Call {
        function: String,
        args: Vec<Vec<u8>>,
    },
}

impl CallPayload {
    /// Render the payload into the gateway's `@`-separated data field.
    ///
    /// Calls become `function@hex(arg1)@hex(arg2)…`; deploys become
    /// `hex(code)@vm@flags@hex(arg1)…`.
    pub fn render_data(&self) -> String {
        let (head, args) = match self {
            CallPayload::Deploy { code, args } => (
                format!(
                    "{}@{}@{}",
                    hex::encode(code.as_bytes()),
                    DEPLOY_VM_TYPE,
                    DEPLOY_CODE_FLAGS
                ),
                args,
            ),
            CallPayload::Call { function, args } => (function.clone(), args),
        };
        args.iter()
            .fold(head, |data, arg| format!("{}@{}", data, hex::encode(arg)))
    }
}

/// The transaction as serialized for signing and broadcast.
///
/// The signature is computed over the canonical JSON serialization of this
/// struct with the `signature` field absent.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub nonce: Nonce,
    /// Attached token payment, decimal-encoded.
    pub value: String,
    pub receiver: Address,
    pub sender: Address,
    pub gas_price: u64,
    pub gas_limit: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(rename = "chainID")]
    pub chain_id: String,
    pub version: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

/// Receiver address of deploy transactions.
fn deploy_receiver() -> Address {
    Address::from_bytes([0u8; 32])
}

impl Transaction {
    /// Build the unsigned wire transaction for an invocation.
    pub fn unsigned(invocation: &Invocation, sender: Address) -> Transaction {
        let receiver = invocation.target.unwrap_or_else(deploy_receiver);
        let data = invocation.payload.render_data();
        Transaction {
            nonce: invocation.nonce,
            value: invocation.value.to_string(),
            receiver,
            sender,
            gas_price: invocation.gas_price,
            gas_limit: invocation.gas_limit,
            data: if data.is_empty() { None } else { Some(data) },
            chain_id: invocation.chain_id.clone(),
            version: TRANSACTION_VERSION,
            signature: None,
        }
    }
}

/// A transaction with a signature binding sender, nonce, and payload.
/// Immutable once produced.
#[derive(Clone, Debug)]
pub struct SignedTransaction {
    transaction: Transaction,
    hash: TxHash,
}

impl SignedTransaction {
    /// Sign the invocation on behalf of the signer's account.
    ///
    /// This is the only place a signature comes into existence; callers are
    /// responsible for advancing the account nonce the moment this returns
    /// successfully.
    pub fn new_signed(signer: &dyn Signer, invocation: &Invocation) -> Result<Self, Error> {
        let mut transaction = Transaction::unsigned(invocation, signer.address());
        let unsigned_payload = serialize_transaction(&transaction)?;
        let signature = signer.sign(&unsigned_payload)?;
        transaction.signature = Some(hex::encode(signature));

        let signed_payload = serialize_transaction(&transaction)?;
        let hash = TxHash::digest(&signed_payload);
        Ok(SignedTransaction { transaction, hash })
    }

    pub fn hash(&self) -> TxHash {
        self.hash
    }

    pub fn sender(&self) -> Address {
        self.transaction.sender
    }

    pub fn nonce(&self) -> Nonce {
        self.transaction.nonce
    }

    pub fn transaction(&self) -> &Transaction {
        &self.transaction
    }
}

fn serialize_transaction(transaction: &Transaction) -> Result<Vec<u8>, Error> {
    serde_json::to_vec(transaction)
        .map_err(|err| Error::Other(format!("failed to serialize transaction: {}", err)))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::signer::KeyPairSigner;
    use ed25519_dalek::{Signature, Verifier as _, VerifyingKey};

    fn example_invocation(nonce: Nonce) -> Invocation {
        Invocation {
            target: Some(Address::from_bytes([9u8; 32])),
            payload: CallPayload::Call {
                function: "add".to_string(),
                args: vec![vec![3]],
            },
            value: 0,
            gas_limit: 5_000_000,
            gas_price: 1_000,
            chain_id: "local".to_string(),
            nonce,
        }
    }

    #[test]
    fn render_call_data() {
        let payload = CallPayload::Call {
            function: "add".to_string(),
            args: vec![vec![3], vec![0xab, 0xcd]],
        };
        assert_eq!(payload.render_data(), "add@03@abcd");

        let no_args = CallPayload::Call {
            function: "getSum".to_string(),
            args: vec![],
        };
        assert_eq!(no_args.render_data(), "getSum");
    }

    #[test]
    fn render_deploy_data() {
        let payload = CallPayload::Deploy {
            code: ContractCode::from_bytes(vec![0x00, 0x61]),
            args: vec![vec![42]],
        };
        assert_eq!(payload.render_data(), "0061@0500@0100@2a");
    }

    #[test]
    fn signed_transaction_carries_the_invocation_nonce() {
        let signer = KeyPairSigner::from_dev_seed("alice");
        let tx = SignedTransaction::new_signed(&signer, &example_invocation(7)).unwrap();
        assert_eq!(tx.nonce(), 7);
        assert_eq!(tx.sender(), signer.address());
    }

    #[test]
    fn signature_verifies_over_the_unsigned_payload() {
        let signer = KeyPairSigner::from_dev_seed("alice");
        let signed = SignedTransaction::new_signed(&signer, &example_invocation(0)).unwrap();

        let mut unsigned = signed.transaction().clone();
        let signature_hex = unsigned.signature.take().unwrap();
        let payload = serde_json::to_vec(&unsigned).unwrap();

        let key = VerifyingKey::from_bytes(signer.address().as_bytes()).unwrap();
        let signature = Signature::from_slice(&hex::decode(signature_hex).unwrap()).unwrap();
        key.verify(&payload, &signature).unwrap();
    }

    #[test]
    fn hash_distinguishes_nonces() {
        let signer = KeyPairSigner::from_dev_seed("alice");
        let first = SignedTransaction::new_signed(&signer, &example_invocation(0)).unwrap();
        let second = SignedTransaction::new_signed(&signer, &example_invocation(1)).unwrap();
        assert_ne!(first.hash(), second.hash());
    }
}
