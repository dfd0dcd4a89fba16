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

//! Define the commands supported by the CLI related to accounts.

use super::*;

/// Account related commands
#[derive(StructOpt, Debug, Clone)]
pub enum Command {
    Address(ShowAddress),
    Show(ShowAccount),
}

#[async_trait::async_trait]
impl CommandT for Command {
    async fn run(&self, ctx: &CommandContext) -> Result<(), CommandError> {
        match self {
            Command::Address(cmd) => cmd.run(ctx).await,
            Command::Show(cmd) => cmd.run(ctx).await,
        }
    }
}

#[derive(StructOpt, Debug, Clone)]
/// Show the address of the configured author key pair.
pub struct ShowAddress {}

#[async_trait::async_trait]
impl CommandT for ShowAddress {
    async fn run(&self, ctx: &CommandContext) -> Result<(), CommandError> {
        println!("address: {}", ctx.signer.address());
        Ok(())
    }
}

#[derive(StructOpt, Debug, Clone)]
/// Show the nonce and balance of an account.
pub struct ShowAccount {
    /// Hex address of the account; defaults to the author's.
    account: Option<Address>,
}

#[async_trait::async_trait]
impl CommandT for ShowAccount {
    async fn run(&self, ctx: &CommandContext) -> Result<(), CommandError> {
        let address = self.account.unwrap_or_else(|| ctx.signer.address());
        let info = ctx.client.account_info(&address).await?;
        println!("address: {}", info.address);
        println!("nonce:   {}", info.nonce);
        println!("balance: {}", info.balance);
        Ok(())
    }
}
