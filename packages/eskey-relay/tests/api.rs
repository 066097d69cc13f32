//! Router-level tests against a recording ledger.

mod common;

use axum::http::StatusCode;
use common::*;
use serde_json::json;
use std::sync::Arc;
use stellar_xdr::curr::{
    AlphaNum4, AssetCode4, ChangeTrustAsset, Limits, OperationBody, ReadXdr, TransactionEnvelope,
};

const RECIPIENT: &str = "GAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAWHF";

// --- Authorization ---

#[tokio::test]
async fn test_missing_relay_key_is_403_without_ledger_calls() {
    let ledger = Arc::new(RecordingLedger::default());
    for path in ["/api/send-eskey", "/trustline", "/claim"] {
        let res = send(app(ledger.clone()), post(path, None, "{}")).await;
        assert_eq!(res.status(), StatusCode::FORBIDDEN, "{path}");
        assert_eq!(
            json(res).await,
            json!({"success": false, "message": "Unauthorized relay key"})
        );
    }
    assert_eq!(ledger.calls(), 0);
}

#[tokio::test]
async fn test_wrong_relay_key_is_403_before_body_parsing() {
    let ledger = Arc::new(RecordingLedger::default());
    let body = json!({"publicKey": RECIPIENT}).to_string();
    let res = send(
        app(ledger.clone()),
        post("/api/send-eskey", Some("not-the-key"), &body),
    )
    .await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = send(
        app(ledger.clone()),
        post("/claim", Some("not-the-key"), "this is not json"),
    )
    .await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert_eq!(ledger.calls(), 0);
}

// --- Validation ---

#[tokio::test]
async fn test_missing_fields_are_400_without_ledger_calls() {
    let ledger = Arc::new(RecordingLedger::default());
    let cases = [
        ("/api/send-eskey", json!({}), "Missing publicKey"),
        ("/api/send-eskey", json!({"publicKey": "  "}), "Missing publicKey"),
        ("/trustline", json!({}), "Missing wallet"),
        ("/claim", json!({"amount": "5"}), "Missing wallet"),
        ("/claim", json!({"wallet": RECIPIENT}), "Missing amount"),
        ("/claim", json!({}), "Missing wallet and amount"),
    ];

    for (path, body, message) in cases {
        let res = send(
            app(ledger.clone()),
            post(path, Some(RELAY_KEY), &body.to_string()),
        )
        .await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST, "{path} {body}");
        assert_eq!(
            json(res).await,
            json!({"success": false, "message": message}),
            "{path} {body}"
        );
    }
    assert_eq!(ledger.calls(), 0);
}

#[tokio::test]
async fn test_malformed_json_is_400() {
    let ledger = Arc::new(RecordingLedger::default());
    let res = send(
        app(ledger.clone()),
        post("/api/send-eskey", Some(RELAY_KEY), "{not json"),
    )
    .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = json(res).await;
    assert_eq!(body["success"], false);
    assert!(body["message"].as_str().unwrap().starts_with("Invalid JSON body"));
    assert_eq!(ledger.calls(), 0);
}

#[tokio::test]
async fn test_invalid_account_and_amount_are_400_without_ledger_calls() {
    let ledger = Arc::new(RecordingLedger::default());

    let res = send(
        app(ledger.clone()),
        post(
            "/api/send-eskey",
            Some(RELAY_KEY),
            &json!({"publicKey": "GNOTAKEY"}).to_string(),
        ),
    )
    .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = json(res).await;
    assert!(body["message"].as_str().unwrap().starts_with("Invalid account"));

    let res = send(
        app(ledger.clone()),
        post(
            "/claim",
            Some(RELAY_KEY),
            &json!({"wallet": RECIPIENT, "amount": "1.123456789"}).to_string(),
        ),
    )
    .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = json(res).await;
    assert!(body["message"].as_str().unwrap().starts_with("Invalid amount"));

    assert_eq!(ledger.calls(), 0);
}

#[tokio::test]
async fn test_non_numeric_amount_types_are_400_without_ledger_calls() {
    let ledger = Arc::new(RecordingLedger::default());
    let cases = [
        ("/api/send-eskey", json!({"publicKey": RECIPIENT, "amount": true})),
        ("/api/send-eskey", json!({"publicKey": RECIPIENT, "amount": ["9"]})),
        ("/api/send-eskey", json!({"publicKey": RECIPIENT, "amount": {"v": 1}})),
        ("/claim", json!({"wallet": RECIPIENT, "amount": true})),
    ];

    for (path, body) in cases {
        let res = send(
            app(ledger.clone()),
            post(path, Some(RELAY_KEY), &body.to_string()),
        )
        .await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST, "{path} {body}");
        let reply = json(res).await;
        assert_eq!(reply["success"], false);
        assert!(
            reply["message"].as_str().unwrap().starts_with("Invalid amount"),
            "{path} {body}"
        );
    }
    assert_eq!(ledger.calls(), 0);
}

#[tokio::test]
async fn test_null_amount_falls_back_to_default() {
    let ledger = Arc::new(RecordingLedger::default());
    let res = send(
        app(ledger.clone()),
        post(
            "/api/send-eskey",
            Some(RELAY_KEY),
            &json!({"publicKey": RECIPIENT, "amount": null}).to_string(),
        ),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(ledger.submitted.lock().unwrap().len(), 1);
}

// --- Payments ---

#[tokio::test]
async fn test_send_eskey_returns_hash() {
    let ledger = Arc::new(RecordingLedger::default());
    let res = send(
        app(ledger.clone()),
        post(
            "/api/send-eskey",
            Some(RELAY_KEY),
            &json!({"publicKey": RECIPIENT}).to_string(),
        ),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers().contains_key("x-request-id"));
    assert_eq!(json(res).await, json!({"success": true, "hash": "ABC123"}));

    let submitted = ledger.submitted.lock().unwrap();
    assert_eq!(submitted.len(), 1);
    let TransactionEnvelope::Tx(v1) = &submitted[0] else {
        panic!("expected v1 envelope");
    };
    assert_eq!(v1.signatures.len(), 1);
    assert_eq!(v1.tx.seq_num.0, 1001);
    assert_eq!(v1.tx.fee, 100);
    match &v1.tx.operations.as_slice()[0].body {
        // Default amount of 1 unit.
        OperationBody::Payment(op) => assert_eq!(op.amount, 10_000_000),
        other => panic!("unexpected operation {other:?}"),
    }
}

#[tokio::test]
async fn test_ledger_failure_is_400_with_message() {
    let ledger = Arc::new(RecordingLedger::failing_submit("insufficient balance"));
    let res = send(
        app(ledger.clone()),
        post(
            "/api/send-eskey",
            Some(RELAY_KEY),
            &json!({"publicKey": RECIPIENT}).to_string(),
        ),
    )
    .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json(res).await,
        json!({"success": false, "message": "insufficient balance"})
    );
    // Single attempt.
    assert_eq!(ledger.submitted.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_missing_recipient_account_stops_before_submit() {
    let ledger = Arc::new(RecordingLedger::failing_load("Resource Missing (status 404)"));
    let res = send(
        app(ledger.clone()),
        post(
            "/api/send-eskey",
            Some(RELAY_KEY),
            &json!({"publicKey": RECIPIENT}).to_string(),
        ),
    )
    .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json(res).await["message"], "Resource Missing (status 404)");
    assert!(ledger.submitted.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_claim_echoes_amount_and_wallet() {
    let ledger = Arc::new(RecordingLedger::default());
    let res = send(
        app(ledger.clone()),
        post(
            "/claim",
            Some(RELAY_KEY),
            &json!({"wallet": RECIPIENT, "amount": "2.5"}).to_string(),
        ),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        json(res).await,
        json!({
            "success": true,
            "hash": "ABC123",
            "sent_amount": "2.5",
            "wallet": RECIPIENT,
        })
    );

    let submitted = ledger.submitted.lock().unwrap();
    let TransactionEnvelope::Tx(v1) = &submitted[0] else {
        panic!("expected v1 envelope");
    };
    match &v1.tx.operations.as_slice()[0].body {
        OperationBody::Payment(op) => assert_eq!(op.amount, 25_000_000),
        other => panic!("unexpected operation {other:?}"),
    }
}

#[tokio::test]
async fn test_claim_accepts_numeric_amount() {
    let ledger = Arc::new(RecordingLedger::default());
    let res = send(
        app(ledger.clone()),
        post(
            "/claim",
            Some(RELAY_KEY),
            &json!({"wallet": RECIPIENT, "amount": 3}).to_string(),
        ),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(json(res).await["sent_amount"], "3");
}

#[tokio::test]
async fn test_claim_accepts_one_stroop_number() {
    let ledger = Arc::new(RecordingLedger::default());
    let res = send(
        app(ledger.clone()),
        post(
            "/claim",
            Some(RELAY_KEY),
            &json!({"wallet": RECIPIENT, "amount": 0.0000001}).to_string(),
        ),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(json(res).await["sent_amount"], "0.0000001");

    let submitted = ledger.submitted.lock().unwrap();
    let TransactionEnvelope::Tx(v1) = &submitted[0] else {
        panic!("expected v1 envelope");
    };
    match &v1.tx.operations.as_slice()[0].body {
        OperationBody::Payment(op) => assert_eq!(op.amount, 1),
        other => panic!("unexpected operation {other:?}"),
    }
}

// --- Trustline ---

#[tokio::test]
async fn test_trustline_returns_unsigned_change_trust() {
    let ledger = Arc::new(RecordingLedger::default());
    let res = send(
        app(ledger.clone()),
        post(
            "/trustline",
            Some(RELAY_KEY),
            &json!({"wallet": RECIPIENT}).to_string(),
        ),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = json(res).await;
    assert_eq!(body["success"], true);
    assert!(body["message"].as_str().unwrap().contains("ESKEY"));

    assert!(ledger.submitted.lock().unwrap().is_empty());
    assert_eq!(*ledger.loads.lock().unwrap(), vec![RECIPIENT.to_string()]);

    let envelope =
        TransactionEnvelope::from_xdr_base64(body["xdr"].as_str().unwrap(), Limits::none())
            .unwrap();
    let TransactionEnvelope::Tx(v1) = envelope else {
        panic!("expected v1 envelope");
    };
    assert!(v1.signatures.is_empty());
    assert_eq!(v1.tx.operations.len(), 1);
    match &v1.tx.operations.as_slice()[0].body {
        OperationBody::ChangeTrust(op) => {
            let ChangeTrustAsset::CreditAlphanum12(_) = &op.line else {
                panic!("ESKEY is a five-character code");
            };
            assert_eq!(op.limit, i64::MAX);
        }
        other => panic!("unexpected operation {other:?}"),
    }
}

#[tokio::test]
async fn test_trustline_rejects_missing_wallet_account() {
    let ledger = Arc::new(RecordingLedger::failing_load("Resource Missing (status 404)"));
    let res = send(
        app(ledger.clone()),
        post(
            "/trustline",
            Some(RELAY_KEY),
            &json!({"wallet": RECIPIENT}).to_string(),
        ),
    )
    .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json(res).await,
        json!({"success": false, "message": "Resource Missing (status 404)"})
    );
}

// --- Open routes ---

#[tokio::test]
async fn test_root_is_plain_text_and_open() {
    let res = send(app(Arc::new(RecordingLedger::default())), get("/")).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert!(text(res).await.contains("ESKEY Relay is running"));
}

#[tokio::test]
async fn test_health_reports_account_and_asset() {
    let res = send(app(Arc::new(RecordingLedger::default())), get("/health")).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = json(res).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["network"], "testnet");
    assert_eq!(body["horizon"], "memory://ledger");
    assert_eq!(body["asset"], format!("ESKEY:{ISSUER}"));
    assert!(body["distribution_account"].as_str().unwrap().starts_with('G'));
    assert!(!body.to_string().contains(&distribution_secret()));
}

#[tokio::test]
async fn test_metrics_exposes_counters() {
    let res = send(app(Arc::new(RecordingLedger::default())), get("/metrics")).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = text(res).await;
    assert!(body.contains("relay_requests_total"));
    assert!(body.contains("relay_unauthorized_total"));
}

#[tokio::test]
async fn test_request_id_is_propagated() {
    let mut req = get("/health");
    req.headers_mut()
        .insert("x-request-id", "caller-123".parse().unwrap());
    let res = send(app(Arc::new(RecordingLedger::default())), req).await;
    assert_eq!(res.headers()["x-request-id"], "caller-123");
}

#[test]
fn test_short_codes_use_alphanum4() {
    let asset = eskey_relay::asset::RelayAsset::new("USD", ISSUER).unwrap();
    let ChangeTrustAsset::CreditAlphanum4(AlphaNum4 { asset_code, .. }) = asset.to_change_trust()
    else {
        panic!("expected alphanum4");
    };
    assert_eq!(asset_code, AssetCode4(*b"USD\0"));
}
