//! Runs the deployer against a development node listening on
//! `http://127.0.0.1:8545` whose first account is unlocked.

use {
    clap::Parser,
    deployer::arguments::Arguments,
    serde_json::{Value, json},
    tempfile::TempDir,
};

/// Creation code of a contract whose runtime code is the single byte `0x00`.
const BYTECODE: &str = "6001600c60003960016000f300";

#[tokio::test]
#[ignore]
async fn local_node_deploy() {
    observe::tracing::initialize_reentrant("warn,deployer=debug");

    let workplace = TempDir::new().unwrap();
    std::fs::create_dir_all(workplace.path().join("bin")).unwrap();
    std::fs::create_dir_all(workplace.path().join("abi")).unwrap();
    std::fs::write(workplace.path().join("bin/Empty.bin"), BYTECODE).unwrap();
    std::fs::write(workplace.path().join("abi/Empty.abi"), "[]").unwrap();

    let configs = TempDir::new().unwrap();
    let path = configs.path().join("empty.json");
    let config = json!({
        "home": format!("{}/", workplace.path().display()),
        "gas": 100000,
        "contracts": [{ "name": "Empty", "param_Values": "none" }],
    });
    std::fs::write(&path, config.to_string()).unwrap();

    let args = Arguments::parse_from([
        "deployer",
        "--node-url",
        "http://127.0.0.1:8545",
        "--config-path",
        configs.path().to_str().unwrap(),
        "--batch-interval",
        "1s",
    ]);
    let report = deployer::run(args).await.unwrap();
    assert!(report.is_complete());
    assert_eq!(report.total().succeeded, 1);

    let written: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    let contract = &written["contracts"][0];
    assert_eq!(contract["deployed"], 1);
    assert!(contract["address"].as_str().unwrap().starts_with("0x"));
}
