use std::time::Duration;

use eth_wallet_watcher::blockchain::{ChainReader, ChainSource, RpcClient};
use eth_wallet_watcher::error::RpcError;
use eth_wallet_watcher::retry::RetryConfig;

fn fast_retry(max_attempts: u32) -> RetryConfig {
    RetryConfig {
        max_attempts,
        initial_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(10),
        backoff_multiplier: 2.0,
        jitter: false,
    }
}

fn reader_for(endpoint: &str, max_attempts: u32) -> ChainReader {
    ChainReader::new(RpcClient::with_config(
        endpoint.to_string(),
        5,
        fast_retry(max_attempts),
    ))
}

#[tokio::test]
async fn test_current_height_decodes_hex() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"jsonrpc":"2.0","id":1,"result":"0x10d4f"}"#)
        .expect(1)
        .create_async()
        .await;

    let reader = reader_for(&server.url(), 3);
    let height = reader.current_height().await.unwrap();
    assert_eq!(height, 0x10d4f);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_block_with_transactions_parses_payload() {
    let mut server = mockito::Server::new_async().await;
    let body = r#"{
        "jsonrpc": "2.0",
        "id": 1,
        "result": {
            "number": "0x65",
            "hash": "0xdeadbeef",
            "transactions": [
                {"hash": "0xabc", "from": "0x1111111111111111111111111111111111111111", "to": "0x2222222222222222222222222222222222222222"}
            ]
        }
    }"#;
    let _mock = server
        .mock("POST", "/")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body)
        .create_async()
        .await;

    let reader = reader_for(&server.url(), 3);
    let block = reader.block_with_transactions(101).await.unwrap().unwrap();
    assert_eq!(block.hash, "0xdeadbeef");
    assert_eq!(block.height().unwrap(), 101);
    assert_eq!(block.transactions.len(), 1);
    assert_eq!(block.transactions[0].hash, "0xabc");
}

#[tokio::test]
async fn test_block_ahead_of_head_is_none() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"jsonrpc":"2.0","id":1,"result":null}"#)
        .create_async()
        .await;

    let reader = reader_for(&server.url(), 3);
    let block = reader.block_with_transactions(999_999).await.unwrap();
    assert!(block.is_none());
}

#[tokio::test]
async fn test_balance_decodes_wei() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"jsonrpc":"2.0","id":1,"result":"0xde0b6b3a7640000"}"#)
        .create_async()
        .await;

    let reader = reader_for(&server.url(), 3);
    let wei = reader
        .balance("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed")
        .await
        .unwrap();
    assert_eq!(wei, 1_000_000_000_000_000_000u128);
}

#[tokio::test]
async fn test_rpc_error_object_is_not_retried() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32601,"message":"Method not found"}}"#)
        .expect(1)
        .create_async()
        .await;

    let client = RpcClient::with_config(server.url(), 5, fast_retry(5));
    let result = client.call_with_retry("eth_bogusMethod", vec![]).await;

    match result {
        Err(RpcError::Protocol { code, message }) => {
            assert_eq!(code, -32601);
            assert_eq!(message, "Method not found");
        }
        other => panic!("expected protocol error, got {:?}", other),
    }
    // A protocol error aborts on the first attempt.
    mock.assert_async().await;
}

#[tokio::test]
async fn test_non_transient_http_status_is_not_retried() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/")
        .with_status(404)
        .expect(1)
        .create_async()
        .await;

    let client = RpcClient::with_config(server.url(), 5, fast_retry(5));
    let result = client.call_with_retry("eth_blockNumber", vec![]).await;

    assert!(matches!(result, Err(RpcError::Status(404))));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_transient_status_exhausts_retry_budget() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/")
        .with_status(503)
        .expect(3)
        .create_async()
        .await;

    let client = RpcClient::with_config(server.url(), 5, fast_retry(3));
    let result = client.call_with_retry("eth_blockNumber", vec![]).await;

    // The error propagates only after the whole attempt budget is spent.
    assert!(matches!(result, Err(RpcError::Status(503))));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_malformed_body_is_a_decode_error() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body("not json at all")
        .create_async()
        .await;

    let client = RpcClient::with_config(server.url(), 5, fast_retry(3));
    let result = client.call("eth_blockNumber", vec![]).await;
    assert!(matches!(result, Err(RpcError::Decode(_))));
}

#[tokio::test]
async fn test_missing_result_field_is_a_decode_error() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"jsonrpc":"2.0","id":1}"#)
        .create_async()
        .await;

    let client = RpcClient::with_config(server.url(), 5, fast_retry(3));
    let result = client.call("eth_blockNumber", vec![]).await;
    assert!(matches!(result, Err(RpcError::Decode(_))));
}

#[tokio::test]
async fn test_non_numeric_height_is_a_decode_error() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"jsonrpc":"2.0","id":1,"result":"0xnothex"}"#)
        .create_async()
        .await;

    let reader = reader_for(&server.url(), 3);
    let result = reader.current_height().await;
    assert!(matches!(result, Err(RpcError::Decode(_))));
}
