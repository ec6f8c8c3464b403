use assert_cmd::Command;
use serial_test::serial;

// Hardhat's first development account; never holds real funds.
const DEV_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

#[test]
#[serial]
fn test_deploy_without_key_fails() {
    let dir = tempfile::tempdir().unwrap();

    let output = Command::cargo_bin("deploy")
        .unwrap()
        .arg("--config")
        .arg(dir.path().join("absent.toml"))
        .env_remove("TXN_PRIVATE_KEY")
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("TXN_PRIVATE_KEY"), "stderr: {}", stderr);
}

#[test]
#[serial]
fn test_deploy_missing_artifact_prints_no_address() {
    let dir = tempfile::tempdir().unwrap();

    let output = Command::cargo_bin("deploy")
        .unwrap()
        .arg("--config")
        .arg(dir.path().join("absent.toml"))
        .arg("--artifacts")
        .arg(dir.path())
        .env("TXN_PRIVATE_KEY", DEV_KEY)
        .env("RUST_LOG", "off")
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert!(!String::from_utf8_lossy(&output.stdout).contains("deployed to"));
    assert!(String::from_utf8_lossy(&output.stderr).contains("No artifact for contract"));
}

#[test]
fn test_client_help_lists_commands() {
    let output = Command::cargo_bin("transactions-client").unwrap().arg("--help").output().unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for command in ["connect", "status", "history", "count", "send"] {
        assert!(stdout.contains(command), "missing {} in help", command);
    }
}
