//! Router-level tests of the dynamic REST dispatcher, the token endpoint
//! and the admin → GraphQL refresh flow, against a SQLite-backed external
//! database.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

use tablegate_config::AppConfig;
use tablegate_core::{ApiDefinition, ApiType, DbConnectionDescriptor, DriverKind};
use tablegate_db::PasswordInput;
use tablegate_server::{AppState, build_app};
use tablegate_storage::ApiDefinitionStore as _;

struct Fixture {
    app: Router,
    state: AppState,
    connection_id: Uuid,
    _dir: tempfile::TempDir,
}

async fn fixture() -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("external.db");
    let url = format!("sqlite:{}?mode=rwc", db_path.display());

    let pool = tablegate_db::pool::create_pool(&url).await.unwrap();
    sqlx::query("CREATE TABLE orders (id INTEGER, customer TEXT, total REAL)")
        .execute(&pool)
        .await
        .unwrap();
    sqlx::query("INSERT INTO orders (id, customer, total) VALUES (1, 'ada', 12.5)")
        .execute(&pool)
        .await
        .unwrap();
    sqlx::query("INSERT INTO orders (id, customer, total) VALUES (2, 'grace', 99.0)")
        .execute(&pool)
        .await
        .unwrap();
    pool.close().await;

    let state = AppState::build(AppConfig::default()).await.unwrap();
    let connection = state
        .registry
        .create(
            DbConnectionDescriptor {
                id: Uuid::new_v4(),
                name: "external".to_string(),
                url,
                username: String::new(),
                password: String::new(),
                driver: DriverKind::Sqlite,
            },
            PasswordInput::Unchanged,
        )
        .await
        .unwrap();

    Fixture {
        app: build_app(state.clone()),
        state,
        connection_id: connection.id,
        _dir: dir,
    }
}

impl Fixture {
    async fn add_definition(&self, table: &str, api_type: ApiType, ops: &str, columns: &[&str]) {
        self.state
            .definitions
            .create(ApiDefinition {
                id: Uuid::new_v4(),
                table_name: table.to_string(),
                api_type,
                allowed_operations: ops.parse().unwrap(),
                included_columns: columns.iter().map(|c| c.to_string()).collect(),
                connection_id: self.connection_id,
            })
            .await
            .unwrap();
    }
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn healthz_is_ok() {
    let fx = fixture().await;
    let (status, body) = send(&fx.app, get("/healthz")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn read_returns_all_columns_in_driver_order() {
    let fx = fixture().await;
    fx.add_definition("orders", ApiType::Rest, "GET", &[]).await;

    let (status, body) = send(&fx.app, get("/api/dynamic/orders")).await;
    assert_eq!(status, StatusCode::OK);

    let rows = body.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    let keys: Vec<&String> = rows[0].as_object().unwrap().keys().collect();
    assert_eq!(keys, ["id", "customer", "total"]);
    assert_eq!(rows[0]["customer"], "ada");
}

#[tokio::test]
async fn read_respects_included_columns() {
    let fx = fixture().await;
    fx.add_definition("orders", ApiType::Rest, "GET", &["customer"])
        .await;

    let (status, body) = send(&fx.app, get("/api/dynamic/orders")).await;
    assert_eq!(status, StatusCode::OK);
    for row in body.as_array().unwrap() {
        let keys: Vec<&String> = row.as_object().unwrap().keys().collect();
        assert_eq!(keys, ["customer"]);
    }
}

#[tokio::test]
async fn read_unknown_table_is_404() {
    let fx = fixture().await;
    let (status, body) = send(&fx.app, get("/api/dynamic/ghosts")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn read_without_get_permission_is_405() {
    let fx = fixture().await;
    fx.add_definition("orders", ApiType::Rest, "PUT", &[]).await;

    let (status, _body) = send(&fx.app, get("/api/dynamic/orders")).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn put_inserts_a_row() {
    let fx = fixture().await;
    fx.add_definition("orders", ApiType::Rest, "GET,PUT", &[]).await;

    let (status, body) = send(
        &fx.app,
        json_request(
            "PUT",
            "/api/dynamic/orders",
            json!({"id": 3, "customer": "linus", "total": 7.25}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["rowsAffected"], 1);

    let (_, rows) = send(&fx.app, get("/api/dynamic/orders")).await;
    assert_eq!(rows.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn put_against_get_delete_definition_is_405() {
    let fx = fixture().await;
    fx.add_definition("orders", ApiType::Rest, "GET,DELETE", &[])
        .await;

    let (status, _body) = send(
        &fx.app,
        json_request("PUT", "/api/dynamic/orders", json!({"id": 9})),
    )
    .await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);

    // Nothing was written.
    let (_, rows) = send(&fx.app, get("/api/dynamic/orders")).await;
    assert_eq!(rows.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn put_undefined_table_is_405() {
    let fx = fixture().await;
    let (status, _body) = send(
        &fx.app,
        json_request("PUT", "/api/dynamic/ghosts", json!({"id": 1})),
    )
    .await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn delete_with_conditions_removes_rows() {
    let fx = fixture().await;
    fx.add_definition("orders", ApiType::Rest, "GET,DELETE", &[])
        .await;

    let (status, body) = send(
        &fx.app,
        Request::builder()
            .method("DELETE")
            .uri("/api/dynamic/orders?customer=ada")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["rowsAffected"], 1);

    let (_, rows) = send(&fx.app, get("/api/dynamic/orders")).await;
    assert_eq!(rows.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn delete_without_conditions_is_400() {
    let fx = fixture().await;
    fx.add_definition("orders", ApiType::Rest, "DELETE", &[]).await;

    let (status, body) = send(
        &fx.app,
        Request::builder()
            .method("DELETE")
            .uri("/api/dynamic/orders")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn token_endpoint_round_trip() {
    let fx = fixture().await;
    let (client, secret) = fx
        .state
        .directory
        .create_client(Uuid::new_v4())
        .await
        .unwrap();

    let form = format!(
        "grant_type=client_credentials&client_id={}&client_secret={}",
        client.client_id, secret
    );
    let (status, body) = send(
        &fx.app,
        Request::builder()
            .method("POST")
            .uri("/oauth2/token")
            .header("content-type", "application/x-www-form-urlencoded")
            .body(Body::from(form))
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["expires_in"], 3600);

    let claims = fx
        .state
        .jwt
        .decode(body["access_token"].as_str().unwrap())
        .unwrap();
    assert_eq!(claims.sub, client.client_id);
}

#[tokio::test]
async fn token_endpoint_rejects_bad_grant_then_bad_secret() {
    let fx = fixture().await;
    let (client, _secret) = fx
        .state
        .directory
        .create_client(Uuid::new_v4())
        .await
        .unwrap();

    let (status, body) = send(
        &fx.app,
        Request::builder()
            .method("POST")
            .uri("/oauth2/token")
            .header("content-type", "application/x-www-form-urlencoded")
            .body(Body::from("grant_type=password&client_id=x&client_secret=y"))
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "unsupported_grant_type");

    let form = format!(
        "grant_type=client_credentials&client_id={}&client_secret=wrong",
        client.client_id
    );
    let (status, body) = send(
        &fx.app,
        Request::builder()
            .method("POST")
            .uri("/oauth2/token")
            .header("content-type", "application/x-www-form-urlencoded")
            .body(Body::from(form))
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "invalid_client");
}

#[tokio::test]
async fn definition_mutation_refreshes_graphql_schema() {
    let fx = fixture().await;

    // Before any GraphQL definition the placeholder schema serves.
    let (status, body) = send(
        &fx.app,
        json_request("POST", "/graphql", json!({"query": "{ hello }"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["hello"], "World");

    // Creating a GraphQL definition through the admin API must republish
    // the schema.
    let (status, _body) = send(
        &fx.app,
        json_request(
            "POST",
            "/api/admin/definitions",
            json!({
                "table_name": "orders",
                "api_type": "GraphQL",
                "allowed_operations": "GET",
                "connection_id": fx.connection_id,
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        &fx.app,
        json_request(
            "POST",
            "/graphql",
            json!({"query": "{ orders { id customer total } }"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["orders"][0]["id"], "1");
    assert_eq!(body["data"]["orders"][0]["customer"], "ada");
    assert_eq!(body["data"]["orders"][0]["total"], "12.5");
}

#[tokio::test]
async fn admin_connection_flow() {
    let fx = fixture().await;
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite:{}?mode=rwc", dir.path().join("other.db").display());

    let (status, body) = send(
        &fx.app,
        json_request(
            "POST",
            "/api/admin/connections",
            json!({"name": "other", "url": url, "driver": "sqlite"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body.get("password").is_none(), "password must not be exposed");

    let id = body["id"].as_str().unwrap();
    let (status, body) = send(
        &fx.app,
        Request::builder()
            .method("POST")
            .uri(format!("/api/admin/connections/{id}/test"))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
}

#[tokio::test]
async fn admin_client_secret_shown_once() {
    let fx = fixture().await;

    let (status, body) = send(
        &fx.app,
        json_request(
            "POST",
            "/api/admin/organizations",
            json!({"name": "acme", "status": "Active"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let org_id = body["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &fx.app,
        Request::builder()
            .method("POST")
            .uri(format!("/api/admin/organizations/{org_id}/clients"))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body["client_secret"].is_string());

    // The listing never carries the secret again.
    let (status, body) = send(
        &fx.app,
        get(&format!("/api/admin/organizations/{org_id}/clients")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let clients = body.as_array().unwrap();
    assert_eq!(clients.len(), 1);
    assert!(clients[0].get("client_secret").is_none());
}
