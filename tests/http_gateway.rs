//! HTTP gateway client tests against a mock LCD.

mod common;

use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use common::{account_body, ledger_config, node_info_body, start_gateway, TEST_KEY};
use ledger_submitter::ledger::{
    EnvelopeBuilder, ExtractionTarget, FeeBudget, HttpLedgerClient, LedgerClient, LedgerError,
    Operation, Wallet,
};

async fn signed_store_code() -> ledger_submitter::ledger::Envelope {
    let wallet = Wallet::from_private_key(TEST_KEY, "localterra").unwrap();
    EnvelopeBuilder::new()
        .build(
            &wallet,
            Operation::StoreCode {
                wasm_byte_code: b"\0asm".to_vec(),
            },
            FeeBudget::new(10_000_000, "20000000uusd").unwrap(),
        )
        .await
        .unwrap()
}

#[tokio::test]
async fn test_broadcast_posts_envelope_and_parses_result() {
    let (addr, requests) = start_gateway(|req| {
        if req.method == "POST" && req.path == "/txs" {
            let body = json!({
                "height": "4812",
                "txhash": "9A1F6B0E",
                "raw_log": "[]",
                "logs": [{
                    "msg_index": 0,
                    "log": "",
                    "events": [{
                        "type": "store_code",
                        "attributes": [
                            { "key": "sender", "value": "terra1dceg" },
                            { "key": "code_id", "value": "17" }
                        ]
                    }]
                }],
                "gas_wanted": "10000000",
                "gas_used": "2345678"
            });
            (200, body.to_string())
        } else {
            (404, "{}".to_string())
        }
    })
    .await;

    let client = HttpLedgerClient::new(ledger_config(addr)).unwrap();
    let result = client.broadcast(&signed_store_code().await).await.unwrap();

    assert_eq!(result.height, 4812);
    assert_eq!(result.txhash, "9A1F6B0E");
    assert_eq!(result.gas_used, 2_345_678);
    assert!(!result.is_tx_error());
    assert_eq!(result.event_log().extract(&ExtractionTarget::code_id()), Some("17"));

    let sent = requests.lock().unwrap()[0].json();
    assert_eq!(sent["mode"], "block");
    assert_eq!(sent["tx"]["msg"][0]["type"], "wasm/MsgStoreCode");
    assert_eq!(sent["tx"]["msg"][0]["value"]["wasm_byte_code"], "AGFzbQ==");
    assert_eq!(sent["tx"]["fee"]["gas"], "10000000");
    assert_eq!(sent["tx"]["signatures"][0]["sequence"], "0");
    assert_eq!(
        sent["tx"]["signatures"][0]["pub_key"]["type"],
        "tendermint/PubKeySecp256k1"
    );
}

#[tokio::test]
async fn test_broadcast_rejection_is_a_result_not_an_error() {
    let (addr, _) = start_gateway(|_| {
        let body = json!({
            "height": "0",
            "txhash": "77AB",
            "code": 11,
            "codespace": "sdk",
            "raw_log": "out of gas in location: WritePerByte; gasWanted: 5000000, gasUsed: 5000120: out of gas"
        });
        (200, body.to_string())
    })
    .await;

    let client = HttpLedgerClient::new(ledger_config(addr)).unwrap();
    let result = client.broadcast(&signed_store_code().await).await.unwrap();

    assert_eq!(result.code, 11);
    assert_eq!(result.codespace, "sdk");
    assert!(result.raw_log.starts_with("out of gas"));
    assert!(!result.included_in_block());
}

#[tokio::test]
async fn test_broadcast_http_error_does_not_fail_over() {
    let hits = Arc::new(AtomicUsize::new(0));
    let backup_hits = hits.clone();

    let (primary, _) = start_gateway(|_| (502, "bad gateway".to_string())).await;
    let (backup, _) = start_gateway(move |_| {
        backup_hits.fetch_add(1, Ordering::SeqCst);
        (200, json!({ "txhash": "BEEF" }).to_string())
    })
    .await;

    let mut config = ledger_config(primary);
    config.failover_urls = vec![format!("http://{}", backup)];
    let client = HttpLedgerClient::new(config).unwrap();

    let err = client.broadcast(&signed_store_code().await).await.unwrap_err();
    assert!(matches!(err, LedgerError::Rpc(ref msg) if msg.contains("502")));
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_broadcast_fails_over_when_unreachable() {
    let (backup, requests) =
        start_gateway(|_| (200, json!({ "height": "9", "txhash": "BEEF" }).to_string())).await;

    let mut config = ledger_config(backup);
    // Port 9 (discard) is closed on test hosts.
    config.lcd_url = "http://127.0.0.1:9".to_string();
    config.failover_urls = vec![format!("http://{}", backup)];
    let client = HttpLedgerClient::new(config).unwrap();

    let result = client.broadcast(&signed_store_code().await).await.unwrap();
    assert_eq!(result.txhash, "BEEF");
    assert_eq!(requests.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_account_lookup() {
    let (addr, requests) = start_gateway(|_| (200, account_body(12, 7))).await;
    let client = HttpLedgerClient::new(ledger_config(addr)).unwrap();

    let account = client
        .account("terra1dcegyrekltswvyy0xy69ydgxn9x8x32zdtapd8")
        .await
        .unwrap();
    assert_eq!(account.account_number, 12);
    assert_eq!(account.sequence, 7);
    assert_eq!(
        requests.lock().unwrap()[0].path,
        "/cosmos/auth/v1beta1/accounts/terra1dcegyrekltswvyy0xy69ydgxn9x8x32zdtapd8"
    );
}

#[tokio::test]
async fn test_reads_fail_over_on_http_error() {
    let (primary, _) = start_gateway(|_| (500, "{}".to_string())).await;
    let (backup, _) = start_gateway(|_| (200, node_info_body("localterra"))).await;

    let mut config = ledger_config(primary);
    config.failover_urls = vec![format!("http://{}", backup)];
    let client = HttpLedgerClient::new(config).unwrap();

    assert_eq!(client.chain_id().await.unwrap(), "localterra");
}

#[tokio::test]
async fn test_verify_chain_id_mismatch() {
    let (addr, _) = start_gateway(|_| (200, node_info_body("columbus-5"))).await;
    let client = HttpLedgerClient::new(ledger_config(addr)).unwrap();

    match client.verify_chain_id().await.unwrap_err() {
        LedgerError::ChainMismatch { expected, actual } => {
            assert_eq!(expected, "localterra");
            assert_eq!(actual, "columbus-5");
        }
        other => panic!("expected chain mismatch, got {other:?}"),
    }
}

#[tokio::test]
async fn test_contract_query() {
    let (addr, requests) = start_gateway(|req| {
        if req.path.starts_with("/wasm/contracts/terra1bank/store?query_msg=") {
            (200, json!({ "height": "88", "result": { "margin": "250" } }).to_string())
        } else {
            (404, "{}".to_string())
        }
    })
    .await;

    let client = HttpLedgerClient::new(ledger_config(addr)).unwrap();
    let response = client
        .query_contract("terra1bank", &json!({ "position": { "trader": "terra1x" } }))
        .await
        .unwrap();

    assert_eq!(response, json!({ "margin": "250" }));
    assert_eq!(requests.lock().unwrap().len(), 1);
}
