use super::*;
use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde_json::{json, Value};
use shared::domain::{CategoryId, CompanyId, ProductId};
use std::sync::Arc;
use tokio::{net::TcpListener, sync::Mutex};

#[derive(Clone)]
struct ServerState {
    status: StatusCode,
    reply: Value,
    delay: Duration,
    received: Arc<Mutex<Vec<Value>>>,
}

async fn handle_graphql(
    State(state): State<ServerState>,
    Json(payload): Json<Value>,
) -> (StatusCode, Json<Value>) {
    state.received.lock().await.push(payload);
    if !state.delay.is_zero() {
        tokio::time::sleep(state.delay).await;
    }
    (state.status, Json(state.reply.clone()))
}

async fn spawn_graphql_server(
    status: StatusCode,
    reply: Value,
    delay: Duration,
) -> anyhow::Result<(String, Arc<Mutex<Vec<Value>>>)> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let received = Arc::new(Mutex::new(Vec::new()));
    let state = ServerState {
        status,
        reply,
        delay,
        received: Arc::clone(&received),
    };
    let app = Router::new()
        .route("/graphql", post(handle_graphql))
        .with_state(state);
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok((format!("http://{addr}/graphql"), received))
}

fn rice() -> NewProduct {
    NewProduct {
        name: "Rice".into(),
        category_id: "c-1".into(),
        image: None,
        brand: "Tio".into(),
        supplier: "Acme".into(),
    }
}

#[tokio::test]
async fn create_product_posts_mutation_and_decodes_payload() {
    let reply = json!({
        "data": {
            "createProduct": {
                "id": "p-9",
                "name": "Rice",
                "image": "https://cdn.example/rice.png",
                "category": { "id": "c-1" },
                "brand": "Tio",
                "supplier": "Acme"
            }
        }
    });
    let (endpoint, received) = spawn_graphql_server(StatusCode::OK, reply, Duration::ZERO)
        .await
        .expect("spawn server");
    let remote = GraphqlRemoteService::new(&endpoint, DEFAULT_REQUEST_TIMEOUT).expect("client");

    let created = remote.create_product(&rice()).await.expect("create");
    assert_eq!(created.id, ProductId::new("p-9"));
    assert_eq!(created.category.id, CategoryId::new("c-1"));

    let requests = received.lock().await;
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0]["operationName"], "AddProduct");
    assert_eq!(requests[0]["variables"]["product"]["name"], "Rice");
    assert!(requests[0]["query"]
        .as_str()
        .expect("query text")
        .contains("createProduct"));
}

#[tokio::test]
async fn create_product_surfaces_service_errors() {
    let reply = json!({
        "data": null,
        "errors": [{ "message": "category c-1 not found", "path": ["createProduct"] }]
    });
    let (endpoint, _received) = spawn_graphql_server(StatusCode::OK, reply, Duration::ZERO)
        .await
        .expect("spawn server");
    let remote = GraphqlRemoteService::new(&endpoint, DEFAULT_REQUEST_TIMEOUT).expect("client");

    let err = remote.create_product(&rice()).await.expect_err("must fail");
    assert!(err.is_service_rejection());
    assert!(err.to_string().contains("category c-1 not found"));
}

#[tokio::test]
async fn list_companies_decodes_company_list() {
    let reply = json!({
        "data": {
            "getAllCompanies": [
                { "id": "co-1", "name": "Acme" },
                { "id": "co-2", "name": "Globex" }
            ]
        }
    });
    let (endpoint, received) = spawn_graphql_server(StatusCode::OK, reply, Duration::ZERO)
        .await
        .expect("spawn server");
    let remote = GraphqlRemoteService::new(&endpoint, DEFAULT_REQUEST_TIMEOUT).expect("client");

    let companies = remote.list_companies().await.expect("companies");
    assert_eq!(companies.len(), 2);
    assert_eq!(companies[1].id, CompanyId::new("co-2"));
    assert_eq!(received.lock().await[0]["operationName"], "GetAllCompanies");
}

#[tokio::test]
async fn empty_envelope_is_reported() {
    let (endpoint, _received) =
        spawn_graphql_server(StatusCode::OK, json!({ "data": null }), Duration::ZERO)
            .await
            .expect("spawn server");
    let remote = GraphqlRemoteService::new(&endpoint, DEFAULT_REQUEST_TIMEOUT).expect("client");

    let err = remote.list_companies().await.expect_err("must fail");
    assert!(matches!(err, RemoteError::EmptyResponse), "unexpected: {err}");
}

#[tokio::test]
async fn http_failure_maps_to_status_error() {
    let (endpoint, _received) = spawn_graphql_server(
        StatusCode::UNPROCESSABLE_ENTITY,
        json!({ "message": "bad input" }),
        Duration::ZERO,
    )
    .await
    .expect("spawn server");
    let remote = GraphqlRemoteService::new(&endpoint, DEFAULT_REQUEST_TIMEOUT).expect("client");

    let err = remote.create_product(&rice()).await.expect_err("must fail");
    assert!(matches!(err, RemoteError::Status(422)), "unexpected: {err}");
    assert!(!err.is_service_rejection());
}

#[tokio::test]
async fn slow_backend_maps_to_timeout() {
    let (endpoint, _received) = spawn_graphql_server(
        StatusCode::OK,
        json!({ "data": { "getAllCompanies": [] } }),
        Duration::from_secs(2),
    )
    .await
    .expect("spawn server");
    let remote = GraphqlRemoteService::new(&endpoint, Duration::from_millis(100)).expect("client");

    let err = remote.list_companies().await.expect_err("must time out");
    assert!(matches!(err, RemoteError::Timeout), "unexpected: {err}");
}

#[tokio::test]
async fn unreachable_backend_is_not_a_service_rejection() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let remote = GraphqlRemoteService::new(&format!("http://{addr}/graphql"), DEFAULT_REQUEST_TIMEOUT)
        .expect("client");
    let err = remote.list_companies().await.expect_err("must fail");
    assert!(!err.is_service_rejection());
}

#[tokio::test]
async fn missing_remote_service_always_fails() {
    let err = MissingRemoteService
        .create_product(&rice())
        .await
        .expect_err("must fail");
    assert!(matches!(err, RemoteError::Transport(_)));
}

#[test]
fn rejects_invalid_endpoint() {
    let err = GraphqlRemoteService::new("not a url", DEFAULT_REQUEST_TIMEOUT)
        .err()
        .expect("must reject");
    assert!(err.to_string().contains("invalid graphql endpoint"));
}
