//! Deploy the accumulator contract on the emulator, add to it, and read the
//! sum back.
use calyx_client::backend::Emulator;
use calyx_client::contract::Deployer;
use calyx_client::signer::KeyPairSigner;
use calyx_client::*;
use calyx_test_utils::fixtures;

#[tokio::main]
async fn main() -> Result<(), Error> {
    env_logger::init();

    let emulator = Emulator::new();
    fixtures::register_fixtures(&emulator);
    let client = Client::from_emulator(emulator.clone());

    let alice = KeyPairSigner::from_dev_seed("alice");
    emulator.credit_account(alice.address(), 1_000_000);
    let mut account = CallerAccount::new(alice.address());
    client.sync_account(&mut account).await?;

    let deployer = Deployer::new(fixtures::accumulator_abi(), fixtures::accumulator_code());
    let (contract, _) = deployer
        .deploy(
            &client,
            &alice,
            &mut account,
            &[Value::U64(0)],
            &DeployParams::default(),
        )
        .await?;
    println!("deployed accumulator at {}", contract.address());

    contract
        .call(
            &client,
            &alice,
            &mut account,
            "add",
            &[Value::U64(3)],
            &CallParams::default(),
        )
        .await?;
    let sum = contract.query(&client, "getSum", &[]).await?;
    println!("sum: {}", sum[0]);
    Ok(())
}
