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

//! Contract doubles used as emulator fixtures.
//!
//! The code blobs are opaque markers: the emulator matches them against the
//! registered factory, the way a real ledger matches deployed byte code to
//! the virtual machine that runs it.

use calyx_client::backend::{CallContext, ContractLogic, Emulator};
use calyx_core::abi::{ContractAbi, ContractCode};
use calyx_core::value::{BigUint, ScType, Value};

/// Marker blob standing in for the compiled accumulator contract.
pub const ACCUMULATOR_CODE: &[u8] = b"\0asm calyx fixture: accumulator";

/// Marker blob standing in for the compiled lottery contract.
pub const LOTTERY_CODE: &[u8] = b"\0asm calyx fixture: lottery";

const ACCUMULATOR_ABI_JSON: &str = r#"
{
    "name": "Accumulator",
    "constructor": {
        "inputs": [{ "name": "initial", "type": "u64" }],
        "outputs": []
    },
    "endpoints": [
        {
            "name": "add",
            "mutability": "mutable",
            "inputs": [{ "name": "value", "type": "u64" }],
            "outputs": []
        },
        {
            "name": "getSum",
            "mutability": "readonly",
            "inputs": [],
            "outputs": [{ "type": "u64" }]
        }
    ]
}
"#;

const LOTTERY_ABI_JSON: &str = r#"
{
    "name": "Lottery",
    "constructor": { "inputs": [], "outputs": [] },
    "endpoints": [
        {
            "name": "start",
            "mutability": "mutable",
            "inputs": [{ "name": "ticketPrice", "type": "BigUint" }],
            "outputs": []
        },
        {
            "name": "buyTicket",
            "mutability": "mutable",
            "payableInTokens": true,
            "inputs": [],
            "outputs": []
        },
        {
            "name": "getTicketsSold",
            "mutability": "readonly",
            "inputs": [],
            "outputs": [{ "type": "u32" }]
        }
    ]
}
"#;

pub fn accumulator_abi() -> ContractAbi {
    ContractAbi::from_json(ACCUMULATOR_ABI_JSON).unwrap()
}

pub fn accumulator_code() -> ContractCode {
    ContractCode::from_bytes(ACCUMULATOR_CODE.to_vec())
}

pub fn lottery_abi() -> ContractAbi {
    ContractAbi::from_json(LOTTERY_ABI_JSON).unwrap()
}

pub fn lottery_code() -> ContractCode {
    ContractCode::from_bytes(LOTTERY_CODE.to_vec())
}

/// Register both fixture contracts with the emulator.
pub fn register_fixtures(emulator: &Emulator) {
    emulator.register_code(ACCUMULATOR_CODE, || Box::new(Accumulator::default()));
    emulator.register_code(LOTTERY_CODE, || Box::new(Lottery::default()));
}

/// Double of the accumulator contract: seeded with a value, sums whatever
/// `add` receives.
#[derive(Default)]
pub struct Accumulator {
    sum: u64,
}

impl ContractLogic for Accumulator {
    fn init(&mut self, _ctx: &CallContext, args: &[Vec<u8>]) -> Result<Vec<Vec<u8>>, String> {
        self.sum = decode_u64(args, 0)?;
        Ok(Vec::new())
    }

    fn execute(
        &mut self,
        _ctx: &CallContext,
        function: &str,
        args: &[Vec<u8>],
    ) -> Result<Vec<Vec<u8>>, String> {
        match function {
            "add" => {
                self.sum += decode_u64(args, 0)?;
                Ok(Vec::new())
            }
            other => Err(format!("invalid function: {}", other)),
        }
    }

    fn view(&self, function: &str, _args: &[Vec<u8>]) -> Result<Vec<Vec<u8>>, String> {
        match function {
            "getSum" => Ok(vec![Value::U64(self.sum).top_encode()]),
            other => Err(format!("invalid function: {}", other)),
        }
    }
}

/// Double of the lottery contract: one lottery, started with a ticket
/// price, selling tickets for exactly that price.
#[derive(Default)]
pub struct Lottery {
    ticket_price: Option<BigUint>,
    tickets_sold: u32,
}

impl ContractLogic for Lottery {
    fn init(&mut self, _ctx: &CallContext, _args: &[Vec<u8>]) -> Result<Vec<Vec<u8>>, String> {
        Ok(Vec::new())
    }

    fn execute(
        &mut self,
        ctx: &CallContext,
        function: &str,
        args: &[Vec<u8>],
    ) -> Result<Vec<Vec<u8>>, String> {
        match function {
            "start" => {
                if self.ticket_price.is_some() {
                    return Err("lottery is already active".to_string());
                }
                let price = decode_biguint(args, 0)?;
                if price.as_be_bytes().is_empty() {
                    return Err("ticket price must be higher than 0".to_string());
                }
                self.ticket_price = Some(price);
                Ok(Vec::new())
            }
            "buyTicket" => {
                let price = match &self.ticket_price {
                    Some(price) => price,
                    None => return Err("lottery is currently inactive".to_string()),
                };
                let expected = price
                    .to_u64()
                    .ok_or_else(|| "ticket price out of range".to_string())?;
                if ctx.value != u128::from(expected) {
                    return Err("wrong ticket fee".to_string());
                }
                self.tickets_sold += 1;
                Ok(Vec::new())
            }
            other => Err(format!("invalid function: {}", other)),
        }
    }

    fn view(&self, function: &str, _args: &[Vec<u8>]) -> Result<Vec<Vec<u8>>, String> {
        match function {
            "getTicketsSold" => Ok(vec![Value::U32(self.tickets_sold).top_encode()]),
            other => Err(format!("invalid function: {}", other)),
        }
    }
}

fn decode_u64(args: &[Vec<u8>], index: usize) -> Result<u64, String> {
    let bytes = args
        .get(index)
        .ok_or_else(|| format!("missing argument {}", index))?;
    match Value::top_decode(ScType::U64, bytes) {
        Ok(Value::U64(value)) => Ok(value),
        _ => Err(format!("argument {} is not a u64", index)),
    }
}

fn decode_biguint(args: &[Vec<u8>], index: usize) -> Result<BigUint, String> {
    let bytes = args
        .get(index)
        .ok_or_else(|| format!("missing argument {}", index))?;
    Ok(BigUint::from_be_bytes(bytes))
}
