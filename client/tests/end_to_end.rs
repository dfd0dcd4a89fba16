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

//! Test the client against the in-memory emulator backend.
//!
//! Every test builds its own ledger, so tests are independent and run in
//! parallel.

use std::time::Duration;

use calyx_client::backend::Emulator;
use calyx_client::contract::{Contract, Deployer};
use calyx_client::*;
use calyx_test_utils::fixtures;
use calyx_test_utils::*;

fn new_emulator_client() -> (Client, Emulator) {
    let _ = env_logger::try_init();
    let emulator = Emulator::new();
    fixtures::register_fixtures(&emulator);
    let client = Client::from_emulator(emulator.clone());
    (client, emulator)
}

fn fast_poll() -> PollParams {
    PollParams {
        interval: Duration::from_millis(10),
        timeout: Duration::from_secs(5),
    }
}

fn deploy_params() -> DeployParams {
    DeployParams {
        poll: fast_poll(),
        ..DeployParams::default()
    }
}

fn call_params() -> CallParams {
    CallParams {
        poll: fast_poll(),
        ..CallParams::default()
    }
}

async fn deploy_accumulator(
    client: &Client,
    signer: &signer::KeyPairSigner,
    account: &mut CallerAccount,
    initial: u64,
) -> Contract {
    let deployer = Deployer::new(fixtures::accumulator_abi(), fixtures::accumulator_code());
    let (contract, outcome) = deployer
        .deploy(
            client,
            signer,
            account,
            &[Value::U64(initial)],
            &deploy_params(),
        )
        .await
        .unwrap();
    expect_success(outcome);
    contract
}

#[tokio::test]
async fn accumulator_cumulative_sum() {
    let (client, emulator) = new_emulator_client();
    let alice = dev_signer("alice");
    let mut account = funded_account(&client, &emulator, &alice, 1000).await;

    let contract = deploy_accumulator(&client, &alice, &mut account, 0).await;
    assert_eq!(account.nonce, 1);

    let sum = contract.query(&client, "getSum", &[]).await.unwrap();
    assert_eq!(sum, vec![Value::U64(0)]);

    let outcome = contract
        .call(
            &client,
            &alice,
            &mut account,
            "add",
            &[Value::U64(3)],
            &call_params(),
        )
        .await
        .unwrap();
    expect_success(outcome);
    let sum = contract.query(&client, "getSum", &[]).await.unwrap();
    assert_eq!(sum, vec![Value::U64(3)]);

    let outcome = contract
        .call(
            &client,
            &alice,
            &mut account,
            "add",
            &[Value::U64(3)],
            &call_params(),
        )
        .await
        .unwrap();
    expect_success(outcome);
    let sum = contract.query(&client, "getSum", &[]).await.unwrap();
    assert_eq!(sum, vec![Value::U64(6)]);

    assert_eq!(account.nonce, 3);
}

#[tokio::test]
async fn constructor_seeded_value_is_queryable() {
    let (client, emulator) = new_emulator_client();
    let alice = dev_signer("alice");
    let mut account = funded_account(&client, &emulator, &alice, 1000).await;

    let contract = deploy_accumulator(&client, &alice, &mut account, 42).await;

    // No mutating call in between: the value must come from the constructor.
    let sum = contract.query(&client, "getSum", &[]).await.unwrap();
    assert_eq!(sum, vec![Value::U64(42)]);
}

#[tokio::test]
async fn deploy_addresses_are_pure_functions_of_sender_and_nonce() {
    let (client, emulator) = new_emulator_client();
    let alice = dev_signer("alice");
    let mut account = funded_account(&client, &emulator, &alice, 1000).await;

    let expected_first = contract_address(&account.address, 0);
    let expected_second = contract_address(&account.address, 1);

    let first = deploy_accumulator(&client, &alice, &mut account, 0).await;
    let second = deploy_accumulator(&client, &alice, &mut account, 0).await;

    assert_eq!(first.address(), expected_first);
    assert_eq!(second.address(), expected_second);
    assert_ne!(first.address(), second.address());
    assert!(first.address().is_contract());
}

#[tokio::test]
async fn query_does_not_consume_a_nonce() {
    let (client, emulator) = new_emulator_client();
    let alice = dev_signer("alice");
    let mut account = funded_account(&client, &emulator, &alice, 1000).await;

    let contract = deploy_accumulator(&client, &alice, &mut account, 7).await;
    let nonce_before = account.nonce;

    for _ in 0..3 {
        contract.query(&client, "getSum", &[]).await.unwrap();
    }

    assert_eq!(account.nonce, nonce_before);
    let on_ledger = client.account_info(&account.address).await.unwrap();
    assert_eq!(on_ledger.nonce, nonce_before);
}

#[tokio::test]
async fn failed_execution_still_consumes_exactly_one_nonce() {
    let (client, emulator) = new_emulator_client();
    let alice = dev_signer("alice");
    let mut account = funded_account(&client, &emulator, &alice, 1000).await;

    let deployer = Deployer::new(fixtures::lottery_abi(), fixtures::lottery_code());
    let (lottery, outcome) = deployer
        .deploy(&client, &alice, &mut account, &[], &deploy_params())
        .await
        .unwrap();
    expect_success(outcome);

    let outcome = lottery
        .call(
            &client,
            &alice,
            &mut account,
            "start",
            &[Value::BigUint(10u64.into())],
            &call_params(),
        )
        .await
        .unwrap();
    expect_success(outcome);
    let nonce_before = account.nonce;

    // Wrong ticket fee: the contract rejects, the ledger still executed.
    let params = CallParams {
        value: 3,
        ..call_params()
    };
    let outcome = lottery
        .call(&client, &alice, &mut account, "buyTicket", &[], &params)
        .await
        .unwrap();
    let result = expect_completed(outcome);
    assert_eq!(result.status, ExitStatus::UserError);
    assert_eq!(result.message, "wrong ticket fee");

    assert_eq!(account.nonce, nonce_before + 1);
    let on_ledger = client.account_info(&account.address).await.unwrap();
    assert_eq!(on_ledger.nonce, account.nonce);
}

#[tokio::test]
async fn local_validation_failure_leaves_the_nonce_untouched() {
    let (client, emulator) = new_emulator_client();
    let alice = dev_signer("alice");
    let mut account = funded_account(&client, &emulator, &alice, 1000).await;

    let contract = deploy_accumulator(&client, &alice, &mut account, 0).await;
    let nonce_before = account.nonce;

    // Wrong arity.
    let result = contract
        .call(&client, &alice, &mut account, "add", &[], &call_params())
        .await;
    assert!(matches!(result, Err(Error::Validation(_))));

    // Unknown endpoint.
    let result = contract
        .call(
            &client,
            &alice,
            &mut account,
            "mul",
            &[Value::U64(2)],
            &call_params(),
        )
        .await;
    assert!(matches!(result, Err(Error::Validation(_))));

    // Payment attached to a non-payable endpoint.
    let params = CallParams {
        value: 5,
        ..call_params()
    };
    let result = contract
        .call(
            &client,
            &alice,
            &mut account,
            "add",
            &[Value::U64(2)],
            &params,
        )
        .await;
    assert!(matches!(result, Err(Error::Validation(_))));

    assert_eq!(account.nonce, nonce_before);
}

#[tokio::test]
async fn concurrent_buyers_from_distinct_accounts_both_succeed() {
    let (client, emulator) = new_emulator_client();
    let owner = dev_signer("owner");
    let buyer_one = dev_signer("buyer-one");
    let buyer_two = dev_signer("buyer-two");
    let mut owner_account = funded_account(&client, &emulator, &owner, 1000).await;
    let mut account_one = funded_account(&client, &emulator, &buyer_one, 1000).await;
    let mut account_two = funded_account(&client, &emulator, &buyer_two, 1000).await;

    let deployer = Deployer::new(fixtures::lottery_abi(), fixtures::lottery_code());
    let (lottery, outcome) = deployer
        .deploy(&client, &owner, &mut owner_account, &[], &deploy_params())
        .await
        .unwrap();
    expect_success(outcome);
    expect_success(
        lottery
            .call(
                &client,
                &owner,
                &mut owner_account,
                "start",
                &[Value::BigUint(10u64.into())],
                &call_params(),
            )
            .await
            .unwrap(),
    );

    let params = CallParams {
        value: 10,
        ..call_params()
    };
    // Cross-account concurrency is safe by construction: each account has
    // its own nonce sequence.
    let (first, second) = futures::join!(
        lottery.call(
            &client,
            &buyer_one,
            &mut account_one,
            "buyTicket",
            &[],
            &params
        ),
        lottery.call(
            &client,
            &buyer_two,
            &mut account_two,
            "buyTicket",
            &[],
            &params
        ),
    );
    expect_success(first.unwrap());
    expect_success(second.unwrap());

    let sold = lottery
        .query(&client, "getTicketsSold", &[])
        .await
        .unwrap();
    assert_eq!(sold, vec![Value::U32(2)]);
}

#[tokio::test]
async fn replayed_nonce_is_rejected_by_the_ledger() {
    let (client, emulator) = new_emulator_client();
    let alice = dev_signer("alice");
    let mut account = funded_account(&client, &emulator, &alice, 1000).await;

    let contract = deploy_accumulator(&client, &alice, &mut account, 0).await;
    expect_success(
        contract
            .call(
                &client,
                &alice,
                &mut account,
                "add",
                &[Value::U64(1)],
                &call_params(),
            )
            .await
            .unwrap(),
    );

    // Hand-craft a submission reusing the already consumed nonce.
    let replayed = Invocation {
        target: Some(contract.address()),
        payload: CallPayload::Call {
            function: "add".to_string(),
            args: vec![Value::U64(1).top_encode()],
        },
        value: 0,
        gas_limit: DEFAULT_GAS_LIMIT,
        gas_price: client.network_config().min_gas_price,
        chain_id: client.network_config().chain_id.clone(),
        nonce: account.nonce - 1,
    };
    let signed = SignedTransaction::new_signed(&alice, &replayed).unwrap();
    let outcome = client
        .submit_transaction(&signed, &fast_poll())
        .await
        .unwrap();

    // An explicit terminal rejection, not a crash and not a success.
    let result = expect_completed(outcome);
    assert_eq!(result.status, ExitStatus::Failed);
    assert!(result.message.contains("nonce"));

    let sum = contract.query(&client, "getSum", &[]).await.unwrap();
    assert_eq!(sum, vec![Value::U64(1)]);
}

#[tokio::test]
async fn exhausted_poll_budget_yields_timed_out() {
    let (client, emulator) = new_emulator_client();
    let alice = dev_signer("alice");
    let mut account = funded_account(&client, &emulator, &alice, 1000).await;

    let contract = deploy_accumulator(&client, &alice, &mut account, 0).await;

    emulator.set_confirmation_lag(1000);
    let params = CallParams {
        poll: PollParams {
            interval: Duration::from_millis(10),
            timeout: Duration::from_millis(50),
        },
        ..CallParams::default()
    };
    let outcome = contract
        .call(
            &client,
            &alice,
            &mut account,
            "add",
            &[Value::U64(3)],
            &params,
        )
        .await
        .unwrap();

    // Timed out: distinct from success and from completed failure.
    assert!(outcome.is_timed_out());
    assert!(outcome.result().is_none());
    let tx_hash = outcome.tx_hash();

    // The submission was not retracted. Once the ledger confirms it, the
    // same hash resolves to a terminal result.
    emulator.set_confirmation_lag(0);
    let outcome = client
        .transaction_outcome(tx_hash, &fast_poll())
        .await
        .unwrap();
    expect_success(outcome);
    let sum = contract.query(&client, "getSum", &[]).await.unwrap();
    assert_eq!(sum, vec![Value::U64(3)]);
}

#[tokio::test]
async fn sync_account_matches_the_ledger_view() {
    let (client, emulator) = new_emulator_client();
    let alice = dev_signer("alice");
    let mut account = funded_account(&client, &emulator, &alice, 1000).await;

    deploy_accumulator(&client, &alice, &mut account, 0).await;
    deploy_accumulator(&client, &alice, &mut account, 0).await;

    let mut fresh = CallerAccount::new(account.address);
    client.sync_account(&mut fresh).await.unwrap();
    assert_eq!(fresh.nonce, account.nonce);
}

#[tokio::test]
async fn unsigned_sender_mismatch_is_rejected_before_signing() {
    let (client, emulator) = new_emulator_client();
    let alice = dev_signer("alice");
    let mallory = dev_signer("mallory");
    let mut account = funded_account(&client, &emulator, &alice, 1000).await;

    let deployer = Deployer::new(fixtures::accumulator_abi(), fixtures::accumulator_code());
    let result = deployer
        .deploy(
            &client,
            &mallory,
            &mut account,
            &[Value::U64(0)],
            &deploy_params(),
        )
        .await;
    assert!(matches!(
        result,
        Err(Error::Validation(ValidationError::SignerAccountMismatch { .. }))
    ));
    assert_eq!(account.nonce, 0);
}
