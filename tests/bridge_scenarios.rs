use ethers::types::U256;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use transactions_client::blockchain::mock::{MockFailure, MockTransactionsContract, MockWallet};
use transactions_client::blockchain::{methods, NoWallet};
use transactions_client::bridge::{RecordingNotifier, TransactionBridge, INSTALL_WALLET_NOTICE};
use transactions_client::core::config::BridgeSettings;
use transactions_client::core::{BridgeError, FormField, RawTransaction, TRANSACTION_COUNT_KEY};
use transactions_client::storage::{KeyValueStore, MemoryStore};

struct Harness {
    bridge: Arc<TransactionBridge>,
    wallet: Arc<MockWallet>,
    contract: Arc<MockTransactionsContract>,
    store: Arc<MemoryStore>,
    notices: Arc<RecordingNotifier>,
}

fn harness(wallet: MockWallet, contract: MockTransactionsContract, store: MemoryStore) -> Harness {
    let wallet = Arc::new(wallet);
    let contract = Arc::new(contract);
    let store = Arc::new(store);
    let notices = Arc::new(RecordingNotifier::new());
    let bridge = TransactionBridge::new(
        wallet.clone(),
        contract.clone(),
        store.clone(),
        BridgeSettings::default(),
    )
    .with_notifier(notices.clone());
    Harness { bridge: Arc::new(bridge), wallet, contract, store, notices }
}

fn record(receiver: &str, wei: u64, keyword: &str) -> RawTransaction {
    RawTransaction {
        sender: "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266".to_string(),
        receiver: receiver.to_string(),
        amount: U256::from(wei),
        message: "hello".to_string(),
        timestamp: U256::from(1_700_000_000u64),
        keyword: keyword.to_string(),
    }
}

fn fill_form(bridge: &TransactionBridge, to: &str, amount: &str) {
    bridge.update_form_field(FormField::AddressTo, to);
    bridge.update_form_field(FormField::Amount, amount);
    bridge.update_form_field(FormField::Keyword, "coffee");
    bridge.update_form_field(FormField::Message, "thanks");
}

#[tokio::test]
async fn connect_without_wallet_shows_notice() {
    let h = harness(MockWallet::absent(), MockTransactionsContract::new(), MemoryStore::new());

    let result = h.bridge.connect().await;

    assert!(matches!(result, Ok(None)));
    assert_eq!(h.notices.messages(), vec![INSTALL_WALLET_NOTICE.to_string()]);
    assert_eq!(h.bridge.current_account(), None);
    assert!(h.wallet.requests().is_empty());
}

#[tokio::test]
async fn connect_adopts_first_granted_account() {
    let h = harness(
        MockWallet::with_accounts(["0xAbC0000000000000000000000000000000000001", "0xdef"]),
        MockTransactionsContract::new(),
        MemoryStore::new(),
    );

    let account = h.bridge.connect().await.unwrap();

    assert_eq!(account.as_deref(), Some("0xAbC0000000000000000000000000000000000001"));
    assert_eq!(
        h.bridge.current_account().as_deref(),
        Some("0xAbC0000000000000000000000000000000000001")
    );
    assert_eq!(h.wallet.requests_for(methods::ETH_REQUEST_ACCOUNTS).len(), 1);
}

#[tokio::test]
async fn connect_rejection_is_tagged() {
    let h = harness(
        MockWallet::with_accounts(["0xABC"]).fail_with(MockFailure::UserRejected),
        MockTransactionsContract::new(),
        MemoryStore::new(),
    );

    let err = h.bridge.connect().await.unwrap_err();

    assert!(matches!(err, BridgeError::UserRejected(_)));
    assert_eq!(h.bridge.current_account(), None);
    // no retry
    assert_eq!(h.wallet.requests().len(), 1);
}

#[tokio::test]
async fn existing_connection_adopts_account_and_refreshes_once() {
    let h = harness(
        MockWallet::authorized(["0xABC"]),
        MockTransactionsContract::new().with_records(vec![record("0xdef", 10u64.pow(18), "rent")]),
        MemoryStore::new(),
    );

    let account = h.bridge.check_existing_connection().await.unwrap();

    assert_eq!(account.as_deref(), Some("0xABC"));
    assert_eq!(h.bridge.current_account().as_deref(), Some("0xABC"));
    assert_eq!(h.contract.history_calls(), 1);
    assert_eq!(h.bridge.transactions().len(), 1);
    assert!(h.wallet.requests_for(methods::ETH_REQUEST_ACCOUNTS).is_empty());
}

#[tokio::test]
async fn existing_connection_without_accounts_leaves_state_unset() {
    let h = harness(
        MockWallet::with_accounts(["0xABC"]),
        MockTransactionsContract::new(),
        MemoryStore::new(),
    );

    let account = h.bridge.check_existing_connection().await.unwrap();

    assert_eq!(account, None);
    assert_eq!(h.bridge.current_account(), None);
    assert_eq!(h.contract.history_calls(), 0);
}

#[tokio::test]
async fn existing_connection_survives_history_failure() {
    let h = harness(
        MockWallet::authorized(["0xABC"]),
        MockTransactionsContract::new().fail_with(MockFailure::Network),
        MemoryStore::new(),
    );

    let account = h.bridge.check_existing_connection().await.unwrap();

    assert_eq!(account.as_deref(), Some("0xABC"));
    assert!(h.bridge.transactions().is_empty());
}

#[tokio::test]
async fn refresh_is_idempotent_without_chain_changes() {
    let h = harness(
        MockWallet::authorized(["0xABC"]),
        MockTransactionsContract::new().with_records(vec![
            record("0x1111111111111111111111111111111111111111", 10u64.pow(16), "a"),
            record("0x2222222222222222222222222222222222222222", 5 * 10u64.pow(17), "b"),
        ]),
        MemoryStore::new(),
    );

    h.bridge.check_existing_connection().await.unwrap();
    let first = h.bridge.refresh_transaction_history().await.unwrap();
    let second = h.bridge.refresh_transaction_history().await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first[0].amount, 0.01);
    assert_eq!(first[1].amount, 0.5);
    assert_eq!(first[0].address_to, "0x1111111111111111111111111111111111111111");
}

#[tokio::test]
async fn refresh_without_wallet_shows_notice() {
    let h = harness(
        MockWallet::absent(),
        MockTransactionsContract::new().with_records(vec![record("0xdef", 1, "x")]),
        MemoryStore::new(),
    );

    let records = h.bridge.refresh_transaction_history().await.unwrap();

    assert!(records.is_empty());
    assert_eq!(h.contract.history_calls(), 0);
    assert_eq!(h.notices.messages().len(), 1);
}

#[tokio::test]
async fn startup_writes_on_chain_count_to_storage() {
    let h = harness(
        MockWallet::authorized(["0xABC"]),
        MockTransactionsContract::new().with_count(5),
        MemoryStore::new(),
    );

    h.bridge.initialize().await.unwrap();

    assert_eq!(h.store.get(TRANSACTION_COUNT_KEY).await.unwrap().as_deref(), Some("5"));
}

#[tokio::test]
async fn startup_seeds_count_from_cache() {
    let h = harness(
        MockWallet::absent(),
        MockTransactionsContract::new().with_count(7),
        MemoryStore::with_entry(TRANSACTION_COUNT_KEY, "4"),
    );

    h.bridge.initialize().await.unwrap();

    // state shows the previous session's value, cache now holds the chain's
    assert_eq!(h.bridge.transaction_count(), Some(4));
    assert_eq!(h.store.get(TRANSACTION_COUNT_KEY).await.unwrap().as_deref(), Some("7"));
}

#[tokio::test]
async fn submit_toggles_loading_and_bumps_count() {
    let h = harness(
        MockWallet::authorized(["0xABC"]),
        MockTransactionsContract::new().with_count(5),
        MemoryStore::with_entry(TRANSACTION_COUNT_KEY, "5"),
    );
    h.bridge.initialize().await.unwrap();
    assert_eq!(h.bridge.transaction_count(), Some(5));
    fill_form(&h.bridge, "0xe7f1725E7734CE288F8367e1Bb143E90bb3F0512", "0.01");

    let release = h.contract.gate_confirmation();
    let bridge = h.bridge.clone();
    let submission = tokio::spawn(async move { bridge.submit_transaction().await });

    tokio::time::timeout(Duration::from_secs(5), async {
        while !h.bridge.is_loading() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("loading flag never set");

    release.send(()).unwrap();
    let tx_hash = submission.await.unwrap().unwrap();

    assert!(tx_hash.is_some());
    assert!(!h.bridge.is_loading());
    assert_eq!(h.bridge.transaction_count(), Some(6));
    assert_eq!(h.store.get(TRANSACTION_COUNT_KEY).await.unwrap().as_deref(), Some("6"));
    // history re-fetched after confirmation instead of a full reload
    assert_eq!(h.bridge.transactions().len(), 1);
    assert_eq!(h.bridge.transactions()[0].keyword, "coffee");
}

#[tokio::test]
async fn submit_sends_fixed_gas_value_transfer() {
    let h = harness(
        MockWallet::authorized(["0xABC"]),
        MockTransactionsContract::new(),
        MemoryStore::new(),
    );
    h.bridge.check_existing_connection().await.unwrap();
    fill_form(&h.bridge, "0xe7f1725E7734CE288F8367e1Bb143E90bb3F0512", "0.01");

    h.bridge.submit_transaction().await.unwrap();

    let sent = h.wallet.requests_for(methods::ETH_SEND_TRANSACTION);
    assert_eq!(sent.len(), 1);
    assert_eq!(
        sent[0].params,
        json!([{
            "from": "0xABC",
            "to": "0xe7f1725E7734CE288F8367e1Bb143E90bb3F0512",
            "gas": "0x5208",
            "value": "0x2386f26fc10000",
        }])
    );

    let recorded = h.contract.records();
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].amount, U256::exp10(16));
    assert_eq!(recorded[0].message, "thanks");
    assert_eq!(recorded[0].keyword, "coffee");
    // the form is not reset after submission
    assert_eq!(h.bridge.form().amount, "0.01");
}

#[tokio::test]
async fn submit_with_empty_recipient_reaches_wallet() {
    // Known gap: the recipient is not validated before the wallet sees it.
    let h = harness(
        MockWallet::authorized(["0xABC"]),
        MockTransactionsContract::new(),
        MemoryStore::new(),
    );
    h.bridge.check_existing_connection().await.unwrap();
    fill_form(&h.bridge, "", "0.5");

    let result = h.bridge.submit_transaction().await;

    let sent = h.wallet.requests_for(methods::ETH_SEND_TRANSACTION);
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].params[0]["to"], "");
    assert!(matches!(result, Err(BridgeError::InvalidInput(_))));
    assert!(!h.bridge.is_loading());
}

#[tokio::test]
async fn submit_without_account_is_not_blocked() {
    let h = harness(
        MockWallet::with_accounts(["0xABC"]),
        MockTransactionsContract::new(),
        MemoryStore::new(),
    );
    fill_form(&h.bridge, "0xe7f1725E7734CE288F8367e1Bb143E90bb3F0512", "1");

    h.bridge.submit_transaction().await.unwrap();

    let sent = h.wallet.requests_for(methods::ETH_SEND_TRANSACTION);
    assert_eq!(sent[0].params[0]["from"], serde_json::Value::Null);
}

#[tokio::test]
async fn submit_rejects_unparseable_amount_before_wallet() {
    let h = harness(
        MockWallet::authorized(["0xABC"]),
        MockTransactionsContract::new(),
        MemoryStore::new(),
    );
    fill_form(&h.bridge, "0xe7f1725E7734CE288F8367e1Bb143E90bb3F0512", "lots");

    let err = h.bridge.submit_transaction().await.unwrap_err();

    assert!(matches!(err, BridgeError::InvalidInput(_)));
    assert!(h.wallet.requests_for(methods::ETH_SEND_TRANSACTION).is_empty());
}

#[tokio::test]
async fn submit_rejects_empty_and_negative_amounts_before_wallet() {
    let h = harness(
        MockWallet::authorized(["0xABC"]),
        MockTransactionsContract::new(),
        MemoryStore::new(),
    );

    for amount in ["", "  ", "-1", "-0.01"] {
        fill_form(&h.bridge, "0xe7f1725E7734CE288F8367e1Bb143E90bb3F0512", amount);
        let err = h.bridge.submit_transaction().await.unwrap_err();
        assert!(matches!(err, BridgeError::InvalidInput(_)), "amount {:?}", amount);
    }

    assert!(h.wallet.requests_for(methods::ETH_SEND_TRANSACTION).is_empty());
    assert_eq!(h.contract.submitted(), 0);
    assert!(!h.bridge.is_loading());
}

#[tokio::test]
async fn submit_reverted_confirmation_clears_loading() {
    let h = harness(
        MockWallet::authorized(["0xABC"]),
        MockTransactionsContract::new()
            .with_count(2)
            .fail_confirmation_with(MockFailure::Reverted),
        MemoryStore::new(),
    );
    h.bridge.initialize().await.unwrap();
    fill_form(&h.bridge, "0xe7f1725E7734CE288F8367e1Bb143E90bb3F0512", "0.1");

    let err = h.bridge.submit_transaction().await.unwrap_err();

    assert!(matches!(err, BridgeError::ContractReverted(_)));
    assert!(!h.bridge.is_loading());
    assert_eq!(h.bridge.transaction_count(), None);
}

#[tokio::test]
async fn submit_user_rejection_never_reaches_contract() {
    let h = harness(
        MockWallet::authorized(["0xABC"]).fail_with(MockFailure::UserRejected),
        MockTransactionsContract::new(),
        MemoryStore::new(),
    );
    fill_form(&h.bridge, "0xe7f1725E7734CE288F8367e1Bb143E90bb3F0512", "0.1");

    let err = h.bridge.submit_transaction().await.unwrap_err();

    assert!(matches!(err, BridgeError::UserRejected(_)));
    assert_eq!(h.contract.submitted(), 0);
}

#[tokio::test]
async fn submit_without_wallet_shows_notice() {
    let h = harness(MockWallet::absent(), MockTransactionsContract::new(), MemoryStore::new());
    fill_form(&h.bridge, "0xe7f1725E7734CE288F8367e1Bb143E90bb3F0512", "0.1");

    let result = h.bridge.submit_transaction().await.unwrap();

    assert_eq!(result, None);
    assert_eq!(h.notices.messages(), vec![INSTALL_WALLET_NOTICE.to_string()]);
    assert_eq!(h.contract.submitted(), 0);
}

#[tokio::test]
async fn subscribers_see_published_state() {
    let h = harness(
        MockWallet::authorized(["0xABC"]),
        MockTransactionsContract::new(),
        MemoryStore::new(),
    );
    let mut rx = h.bridge.subscribe();

    h.bridge.check_existing_connection().await.unwrap();

    assert!(rx.has_changed().unwrap());
    assert_eq!(rx.borrow_and_update().current_account.as_deref(), Some("0xABC"));
}

#[tokio::test]
async fn unconfigured_wallet_behaves_as_absent() {
    let notices = Arc::new(RecordingNotifier::new());
    let bridge = TransactionBridge::new(
        Arc::new(NoWallet),
        Arc::new(MockTransactionsContract::new().with_count(3)),
        Arc::new(MemoryStore::new()),
        BridgeSettings::default(),
    )
    .with_notifier(notices.clone());

    assert_eq!(bridge.check_existing_connection().await.unwrap(), None);
    assert_eq!(bridge.prime_transaction_count_cache().await.unwrap(), 3);
    assert_eq!(notices.messages().len(), 1);
}
