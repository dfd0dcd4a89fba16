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

//! [crate::backend::Backend] implementation for a remote gateway node.

use serde::de::DeserializeOwned;
use serde::Deserialize;

use calyx_core::status::TerminalResult;
use calyx_core::{Address, TxHash};

use crate::backend::{
    AccountInfo, Backend, NetworkConfig, QueryRequest, QueryResponse, SubmissionStatus,
};
use crate::error::Error;
use crate::result::terminal_result_from_entry;
use crate::transaction::SignedTransaction;

const NETWORK_CONFIG_ENDPOINT: &str = "network/config";
const ACCOUNT_ENDPOINT: &str = "address";
const SEND_TRANSACTION_ENDPOINT: &str = "transaction/send";
const TRANSACTION_ENDPOINT: &str = "transaction";
const WITH_RESULTS_QUERY_PARAM: &str = "?withResults=true";
const QUERY_ENDPOINT: &str = "vm-values/query";

/// Client backend talking to a gateway node over its JSON HTTP API.
#[derive(Clone)]
pub struct Gateway {
    base_url: String,
    http: reqwest::Client,
    network_config: NetworkConfig,
}

impl Gateway {
    /// Connect to the gateway at `base_url` and fetch the chain parameters.
    pub async fn create(base_url: impl Into<String>) -> Result<Self, Error> {
        let base_url = base_url.into();
        let http = reqwest::Client::new();
        let config_data: NetworkConfigData =
            get(&http, &endpoint(&base_url, NETWORK_CONFIG_ENDPOINT)).await?;
        log::debug!(
            "connected to gateway {} (chain {})",
            base_url,
            config_data.config.chain_id
        );
        Ok(Gateway {
            base_url,
            http,
            network_config: config_data.config,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        endpoint(&self.base_url, path)
    }

    /// Fetch the full transaction record including execution results.
    async fn transaction_with_results(&self, hash: &TxHash) -> Result<TransactionOnNetwork, Error> {
        let url = self.endpoint(&format!(
            "{}/{}{}",
            TRANSACTION_ENDPOINT, hash, WITH_RESULTS_QUERY_PARAM
        ));
        let data: TransactionInfoData = get(&self.http, &url).await?;
        Ok(data.transaction)
    }
}

#[async_trait::async_trait]
impl Backend for Gateway {
    fn network_config(&self) -> &NetworkConfig {
        &self.network_config
    }

    async fn account(&self, address: &Address) -> Result<AccountInfo, Error> {
        let url = self.endpoint(&format!("{}/{}", ACCOUNT_ENDPOINT, address));
        let data: AccountData = get(&self.http, &url).await?;
        Ok(data.account)
    }

    async fn broadcast(&self, transaction: &SignedTransaction) -> Result<TxHash, Error> {
        let response = self
            .http
            .post(self.endpoint(SEND_TRANSACTION_ENDPOINT))
            .json(transaction.transaction())
            .send()
            .await?
            .json::<GatewayResponse<SendTransactionData>>()
            .await?;
        match response.data {
            Some(data) => Ok(data.tx_hash),
            // The gateway vets signature and nonce plausibility before
            // accepting; a rejection here means nothing was executed.
            None => Err(Error::InvalidTransaction(response.error)),
        }
    }

    async fn transaction_status(&self, hash: &TxHash) -> Result<SubmissionStatus, Error> {
        let url = self.endpoint(&format!("{}/{}/status", TRANSACTION_ENDPOINT, hash));
        let response = self
            .http
            .get(&url)
            .send()
            .await?
            .json::<GatewayResponse<TransactionStatusData>>()
            .await?;
        let status = match response.data {
            Some(data) => data.status,
            None => return Err(Error::UnknownTransaction(*hash)),
        };
        match status.as_str() {
            "pending" | "received" => Ok(SubmissionStatus::Pending),
            _ => {
                let transaction = self.transaction_with_results(hash).await?;
                let result = terminal_result(&transaction)?;
                Ok(SubmissionStatus::Completed(result))
            }
        }
    }

    async fn simulate_query(&self, request: &QueryRequest) -> Result<QueryResponse, Error> {
        let response = self
            .http
            .post(self.endpoint(QUERY_ENDPOINT))
            .json(request)
            .send()
            .await?
            .json::<GatewayResponse<QueryData>>()
            .await?;
        match response.data {
            Some(data) => Ok(data.data),
            None => Err(Error::Transport(response.error)),
        }
    }
}

fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path)
}

async fn get<T: DeserializeOwned>(http: &reqwest::Client, url: &str) -> Result<T, Error> {
    let response = http
        .get(url)
        .send()
        .await?
        .json::<GatewayResponse<T>>()
        .await?;
    match response.data {
        Some(data) => Ok(data),
        None => Err(Error::Transport(response.error)),
    }
}

/// Build the terminal result out of a completed transaction record.
///
/// Successful execution leaves the return code and values in the data field
/// of the first execution-result entry. Failures carry their diagnostic in
/// the entry's return message.
fn terminal_result(transaction: &TransactionOnNetwork) -> Result<TerminalResult, Error> {
    let entry = transaction
        .smart_contract_results
        .iter()
        .find(|entry| entry.data.as_deref().map_or(false, |d| d.starts_with('@')));
    match entry {
        Some(entry) => terminal_result_from_entry(
            entry.data.as_deref().unwrap_or_default(),
            entry.return_message.as_deref(),
        ),
        None if transaction.status == "success" => Ok(TerminalResult::success(Vec::new())),
        None => {
            let message = transaction
                .smart_contract_results
                .iter()
                .find_map(|entry| entry.return_message.clone())
                .unwrap_or_else(|| format!("transaction {}", transaction.status));
            Ok(TerminalResult::failure(
                calyx_core::status::ExitStatus::Failed,
                message,
            ))
        }
    }
}

/// Response envelope wrapping every gateway payload.
#[derive(Debug, Deserialize)]
struct GatewayResponse<T> {
    data: Option<T>,
    #[serde(default)]
    error: String,
}

#[derive(Debug, Deserialize)]
struct NetworkConfigData {
    config: NetworkConfig,
}

#[derive(Debug, Deserialize)]
struct AccountData {
    account: AccountInfo,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendTransactionData {
    tx_hash: TxHash,
}

#[derive(Debug, Deserialize)]
struct TransactionStatusData {
    status: String,
}

#[derive(Debug, Deserialize)]
struct QueryData {
    data: QueryResponse,
}

#[derive(Debug, Deserialize)]
struct TransactionInfoData {
    transaction: TransactionOnNetwork,
}

/// A transaction's record as returned by the gateway, reduced to the fields
/// the client consumes.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransactionOnNetwork {
    status: String,
    #[serde(default)]
    smart_contract_results: Vec<ExecutionResultEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExecutionResultEntry {
    data: Option<String>,
    return_message: Option<String>,
}

#[cfg(test)]
mod test {
    use super::*;
    use calyx_core::status::ExitStatus;

    #[test]
    fn terminal_result_success_with_values() {
        let transaction: TransactionOnNetwork = serde_json::from_str(
            r#"{
                "status": "success",
                "smartContractResults": [{ "data": "@6f6b@06" }]
            }"#,
        )
        .unwrap();
        let result = terminal_result(&transaction).unwrap();
        assert!(result.is_success());
        assert_eq!(result.return_data, vec![vec![6]]);
    }

    #[test]
    fn terminal_result_success_without_entries() {
        let transaction: TransactionOnNetwork =
            serde_json::from_str(r#"{ "status": "success" }"#).unwrap();
        let result = terminal_result(&transaction).unwrap();
        assert!(result.is_success());
        assert!(result.return_data.is_empty());
    }

    #[test]
    fn terminal_result_failure_message() {
        let transaction: TransactionOnNetwork = serde_json::from_str(
            r#"{
                "status": "fail",
                "smartContractResults": [
                    { "data": "@75736572206572726f72", "returnMessage": "out of tickets" }
                ]
            }"#,
        )
        .unwrap();
        let result = terminal_result(&transaction).unwrap();
        assert_eq!(result.status, ExitStatus::UserError);
        assert_eq!(result.message, "out of tickets");
    }
}
