//! HTTP JSON API
//!
//! Thin layer over [`PrivacyClient`]:
//! - POST /api/shield            - `{amount, token?}`
//! - POST /api/transfer          - `{recipient, amount}`
//! - POST /api/unshield          - `{amount, token?}`
//! - POST /api/verify            - `{proof, publicInputs?}`
//! - GET  /api/balance           - `?address=` public balance
//! - GET  /api/shielded-balance  - `?token=` shielded balance
//! - GET  /api/health            - Health check
//!
//! Malformed input is a 400 with `{success: false, error}` (`{valid: false,
//! error}` for verify); backend and upstream failures are a 500.

use axum::{
    body::Bytes,
    extract::{Query, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{Any, CorsLayer};

use crate::client::PrivacyClient;
use crate::common::{generate_correlation_id, log_api_response, PrivacyError};
use crate::proof::{public_inputs_from_json, Proof};
use crate::tokens::NATIVE_TOKEN;

/// Default listen port
pub const DEFAULT_PORT: u16 = 3001;

/// Response header carrying the request's correlation id
pub const CORRELATION_HEADER: &str = "x-correlation-id";

pub type AppState = Arc<PrivacyClient>;

// =============================================================================
// Request Parsing
// =============================================================================

/// Outcome of request validation: the body or a ready 400 response
type Parsed<T> = std::result::Result<T, Response>;

fn bad_request(error: impl Into<String>) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "success": false, "error": error.into() })),
    )
        .into_response()
}

fn error_response(err: PrivacyError) -> Response {
    let status = if err.is_client_error() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (
        status,
        Json(json!({
            "success": false,
            "error": err.to_string(),
            "code": err.error_code()
        })),
    )
        .into_response()
}

fn json_body(body: &Bytes) -> Parsed<Value> {
    match serde_json::from_slice::<Value>(body) {
        Ok(value @ Value::Object(_)) => Ok(value),
        Ok(_) => Err(bad_request("request body must be a JSON object")),
        Err(e) => Err(bad_request(format!("invalid JSON body: {}", e))),
    }
}

/// Positive integer amount in smallest units
fn amount_field(body: &Value) -> Parsed<u64> {
    match body.get("amount").and_then(Value::as_u64) {
        Some(amount) if amount > 0 => Ok(amount),
        _ => Err(bad_request("Invalid amount")),
    }
}

fn token_field(body: &Value) -> String {
    body.get("token")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(NATIVE_TOKEN)
        .to_string()
}

// =============================================================================
// Handlers
// =============================================================================

/// POST /api/shield
async fn handle_shield(State(client): State<AppState>, body: Bytes) -> Response {
    let parsed = json_body(&body).and_then(|b| Ok((amount_field(&b)?, token_field(&b))));
    let (amount, token) = match parsed {
        Ok(fields) => fields,
        Err(resp) => return resp,
    };

    match client.shield(amount, &token).await {
        Ok(result) => Json(result).into_response(),
        Err(e) => error_response(e),
    }
}

/// POST /api/transfer
async fn handle_transfer(State(client): State<AppState>, body: Bytes) -> Response {
    let parsed = json_body(&body).and_then(|b| {
        let recipient = b
            .get("recipient")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::to_string)
            .ok_or_else(|| bad_request("Invalid recipient"))?;
        Ok((recipient, amount_field(&b)?))
    });
    let (recipient, amount) = match parsed {
        Ok(fields) => fields,
        Err(resp) => return resp,
    };

    match client.transfer(&recipient, amount).await {
        Ok(result) => Json(result).into_response(),
        Err(e) => error_response(e),
    }
}

/// POST /api/unshield
async fn handle_unshield(State(client): State<AppState>, body: Bytes) -> Response {
    let parsed = json_body(&body).and_then(|b| Ok((amount_field(&b)?, token_field(&b))));
    let (amount, token) = match parsed {
        Ok(fields) => fields,
        Err(resp) => return resp,
    };

    match client.unshield(amount, &token).await {
        Ok(result) => Json(result).into_response(),
        Err(e) => error_response(e),
    }
}

/// POST /api/verify
async fn handle_verify(State(client): State<AppState>, body: Bytes) -> Response {
    let invalid = |error: &str| {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({ "valid": false, "error": error })),
        )
            .into_response()
    };

    let Ok(body) = serde_json::from_slice::<Value>(&body) else {
        return invalid("invalid JSON body");
    };
    let Some(proof) = body.get("proof").and_then(Proof::from_json) else {
        return invalid("Invalid proof");
    };
    let inputs = match body.get("publicInputs") {
        None | Some(Value::Null) => Vec::new(),
        Some(value) => match public_inputs_from_json(value) {
            Some(inputs) => inputs,
            None => return invalid("publicInputs must be an array of strings"),
        },
    };

    match client.verify_proof(&proof, &inputs).await {
        Ok(valid) => Json(json!({ "valid": valid })).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "valid": false, "error": e.to_string() })),
        )
            .into_response(),
    }
}

#[derive(Debug, Deserialize)]
struct BalanceQuery {
    address: Option<String>,
}

/// GET /api/balance?address=
async fn handle_balance(
    State(client): State<AppState>,
    Query(query): Query<BalanceQuery>,
) -> Response {
    let Some(address) = query.address.filter(|a| !a.trim().is_empty()) else {
        return bad_request("address is required");
    };

    match client.get_balance(&address).await {
        Ok(balance) => Json(json!({
            "success": true,
            "address": address,
            "balance": balance
        }))
        .into_response(),
        Err(e) => error_response(e),
    }
}

#[derive(Debug, Deserialize)]
struct ShieldedBalanceQuery {
    token: Option<String>,
}

/// GET /api/shielded-balance?token=
async fn handle_shielded_balance(
    State(client): State<AppState>,
    Query(query): Query<ShieldedBalanceQuery>,
) -> Response {
    let token = query
        .token
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| NATIVE_TOKEN.to_string());

    match client.shielded_balance(&token).await {
        Ok(balance) => Json(json!({
            "success": true,
            "token": token,
            "balance": balance
        }))
        .into_response(),
        Err(e) => error_response(e),
    }
}

/// GET /api/health
async fn handle_health(State(client): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "privacy-devkit-api",
        "version": env!("CARGO_PKG_VERSION"),
        "network": client.config().network.to_string(),
        "backend": client.backend_kind().await.to_string()
    }))
}

// =============================================================================
// Middleware
// =============================================================================

/// Tag each request with a correlation id and log the response
async fn trace_requests(request: Request, next: Next) -> Response {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let correlation_id = generate_correlation_id();
    let started = Instant::now();

    let mut response = next.run(request).await;

    log_api_response(
        &method,
        &path,
        response.status().as_u16(),
        started.elapsed().as_millis() as u64,
        &correlation_id,
    );
    if let Ok(value) = correlation_id.parse() {
        response.headers_mut().insert(CORRELATION_HEADER, value);
    }
    response
}

// =============================================================================
// Router Setup
// =============================================================================

/// Create the API router with all endpoints
pub fn create_router(client: Arc<PrivacyClient>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(handle_health))
        .route("/api/shield", post(handle_shield))
        .route("/api/transfer", post(handle_transfer))
        .route("/api/unshield", post(handle_unshield))
        .route("/api/verify", post(handle_verify))
        .route("/api/balance", get(handle_balance))
        .route("/api/shielded-balance", get(handle_shielded_balance))
        .layer(middleware::from_fn(trace_requests))
        .layer(cors)
        .with_state(client)
}

/// Start the API server
pub async fn start_server(client: Arc<PrivacyClient>, port: u16) -> Result<(), std::io::Error> {
    let app = create_router(client);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    println!("=== Privacy Devkit API ===");
    println!("Listening on http://{}", addr);
    println!();
    println!("Endpoints:");
    println!("  POST /api/shield            - Shield into the private pool");
    println!("  POST /api/transfer          - Private transfer");
    println!("  POST /api/unshield          - Unshield to public balance");
    println!("  POST /api/verify            - Verify a proof");
    println!("  GET  /api/balance           - Public balance (?address=)");
    println!("  GET  /api/shielded-balance  - Shielded balance (?token=)");
    println!("  GET  /api/health            - Health check");
    println!();

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::PrivacyConfig;
    use crate::rpc::MockLedgerRpc;
    use axum::body::Body;
    use axum::http::Request as HttpRequest;
    use tower::ServiceExt;

    fn app(rpc: MockLedgerRpc) -> Router {
        let client = PrivacyClient::with_rpc(PrivacyConfig::default(), Arc::new(rpc)).unwrap();
        create_router(Arc::new(client))
    }

    async fn send(app: Router, method: &str, uri: &str, body: &str) -> (StatusCode, Value) {
        let request = HttpRequest::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        assert!(response.headers().contains_key(CORRELATION_HEADER));
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = send(app(MockLedgerRpc::new()), "GET", "/api/health", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["backend"], "mock");
    }

    #[tokio::test]
    async fn test_shield_defaults_token() {
        let (status, body) = send(
            app(MockLedgerRpc::new()),
            "POST",
            "/api/shield",
            r#"{"amount": 1000}"#,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert!(body["transactionId"].as_str().unwrap().starts_with("mock-tx-shield-"));
    }

    #[tokio::test]
    async fn test_rejects_bad_amounts_and_recipient() {
        for (uri, body) in [
            ("/api/shield", r#"{"amount": 0}"#),
            ("/api/shield", r#"{"amount": -5}"#),
            ("/api/unshield", r#"{"token": "SOL"}"#),
            ("/api/transfer", r#"{"recipient": "  ", "amount": 10}"#),
            ("/api/transfer", r#"{"recipient": "bob", "amount": "10"}"#),
            ("/api/shield", "not json"),
        ] {
            let (status, json) = send(app(MockLedgerRpc::new()), "POST", uri, body).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri} {body}");
            assert_eq!(json["success"], false);
            assert!(json["error"].is_string());
        }
    }

    #[tokio::test]
    async fn test_transfer() {
        let (status, body) = send(
            app(MockLedgerRpc::new()),
            "POST",
            "/api/transfer",
            r#"{"recipient": " bob ", "amount": 25}"#,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["signature"].is_string());
    }

    #[tokio::test]
    async fn test_verify_envelope() {
        let (status, body) = send(
            app(MockLedgerRpc::new()),
            "POST",
            "/api/verify",
            r#"{"proof": "deadbeef", "publicInputs": []}"#,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "valid": true }));

        let (_, body) = send(
            app(MockLedgerRpc::new()),
            "POST",
            "/api/verify",
            r#"{"proof": "not-hex!"}"#,
        )
        .await;
        assert_eq!(body["valid"], false);

        let (status, body) = send(
            app(MockLedgerRpc::new()),
            "POST",
            "/api/verify",
            r#"{"proof": "deadbeef", "publicInputs": "c"}"#,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["valid"], false);

        let (status, _) = send(app(MockLedgerRpc::new()), "POST", "/api/verify", r#"{}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_balances() {
        let mut rpc = MockLedgerRpc::new();
        rpc.expect_get_balance().returning(|_| Ok(5_000));
        let address = solana_sdk::pubkey::Pubkey::new_unique().to_string();

        let (status, body) = send(
            app(rpc),
            "GET",
            &format!("/api/balance?address={}", address),
            "",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["balance"], 5_000);

        let (status, _) = send(app(MockLedgerRpc::new()), "GET", "/api/balance", "").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) =
            send(app(MockLedgerRpc::new()), "GET", "/api/shielded-balance", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["token"], "SOL");
        assert_eq!(body["balance"], 0);
    }
}
