//! End-to-end tests of dynamic schema generation and query execution
//! against a SQLite-backed external database.

use std::sync::Arc;

use tablegate_config::SecretCipher;
use tablegate_core::{
    ApiDefinition, ApiType, DbConnectionDescriptor, DriverKind, Operation, OperationSet,
};
use tablegate_db::{ConnectionHub, SchemaIntrospector};
use tablegate_graphql::{GatewayContext, SharedSchema};
use tablegate_storage::{ApiDefinitionStore, ConnectionStore, MemoryMetadataStore};
use uuid::Uuid;

struct Fixture {
    store: Arc<MemoryMetadataStore>,
    context: Arc<GatewayContext>,
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
    pool.close().await;

    let cipher = SecretCipher::new("graphql-test");
    let store = Arc::new(MemoryMetadataStore::new());

    let connection = ConnectionStore::create(
        store.as_ref(),
        DbConnectionDescriptor {
            id: Uuid::new_v4(),
            name: "external".to_string(),
            url,
            username: String::new(),
            password: String::new(),
            driver: DriverKind::Sqlite,
        },
    )
    .await
    .unwrap();

    let definitions: Arc<dyn ApiDefinitionStore> = store.clone();
    let connections: Arc<dyn ConnectionStore> = store.clone();
    let context = Arc::new(GatewayContext::new(
        definitions,
        connections,
        Arc::new(ConnectionHub::new(cipher.clone())),
        SchemaIntrospector::new(cipher),
    ));

    Fixture {
        store,
        context,
        connection_id: connection.id,
        _dir: dir,
    }
}

fn graphql_definition(table: &str, ops: &str, columns: &[&str], connection_id: Uuid) -> ApiDefinition {
    ApiDefinition {
        id: Uuid::new_v4(),
        table_name: table.to_string(),
        api_type: ApiType::GraphQL,
        allowed_operations: ops.parse().unwrap(),
        included_columns: columns.iter().map(|c| c.to_string()).collect(),
        connection_id,
    }
}

async fn execute(
    schema: &SharedSchema,
    context: &Arc<GatewayContext>,
    query: &str,
) -> async_graphql::Response {
    let request = async_graphql::Request::new(query).data(Arc::clone(context));
    schema.load().execute(request).await
}

#[tokio::test]
async fn schema_exposes_table_type_and_field() {
    let fx = fixture().await;
    ApiDefinitionStore::create(
        fx.store.as_ref(),
        graphql_definition("orders", "GET", &[], fx.connection_id),
    )
    .await
    .unwrap();

    let schema = SharedSchema::initialize(fx.context.clone()).await.unwrap();
    let sdl = schema.sdl();

    assert!(sdl.contains("type Orders"), "missing type in:\n{sdl}");
    assert!(sdl.contains("id: String"), "missing column in:\n{sdl}");
    assert!(sdl.contains("customer: String"), "missing column in:\n{sdl}");
    assert!(sdl.contains("total: String"), "missing column in:\n{sdl}");
    assert!(sdl.contains("orders: [Orders]"), "missing query field in:\n{sdl}");
}

#[tokio::test]
async fn placeholder_schema_without_definitions() {
    let fx = fixture().await;
    let schema = SharedSchema::initialize(fx.context.clone()).await.unwrap();
    let sdl = schema.sdl();

    assert!(sdl.contains("hello"), "placeholder field missing in:\n{sdl}");

    let response = execute(&schema, &fx.context, "{ hello }").await;
    assert!(response.errors.is_empty());
    let data = serde_json::to_value(&response.data).unwrap();
    assert_eq!(data["hello"], "World");
}

#[tokio::test]
async fn rest_definitions_do_not_appear() {
    let fx = fixture().await;
    let mut rest_def = graphql_definition("orders", "GET", &[], fx.connection_id);
    rest_def.api_type = ApiType::Rest;
    ApiDefinitionStore::create(fx.store.as_ref(), rest_def)
        .await
        .unwrap();

    let schema = SharedSchema::initialize(fx.context.clone()).await.unwrap();
    assert!(!schema.sdl().contains("type Orders"));
}

#[tokio::test]
async fn refresh_is_idempotent() {
    let fx = fixture().await;
    ApiDefinitionStore::create(
        fx.store.as_ref(),
        graphql_definition("orders", "GET", &[], fx.connection_id),
    )
    .await
    .unwrap();

    let schema = SharedSchema::initialize(fx.context.clone()).await.unwrap();
    let first = schema.sdl();
    schema.refresh().await.unwrap();
    let second = schema.sdl();
    assert_eq!(first, second);
}

#[tokio::test]
async fn refresh_tracks_definition_changes() {
    let fx = fixture().await;
    let schema = SharedSchema::initialize(fx.context.clone()).await.unwrap();
    assert!(schema.sdl().contains("hello"));

    let def = ApiDefinitionStore::create(
        fx.store.as_ref(),
        graphql_definition("orders", "GET", &[], fx.connection_id),
    )
    .await
    .unwrap();
    schema.refresh().await.unwrap();
    assert!(schema.sdl().contains("type Orders"));

    ApiDefinitionStore::delete(fx.store.as_ref(), def.id)
        .await
        .unwrap();
    schema.refresh().await.unwrap();
    assert!(
        schema.sdl().contains("hello"),
        "removing the last definition must fall back to the placeholder"
    );
}

#[tokio::test]
async fn query_returns_rows_as_strings() {
    let fx = fixture().await;
    ApiDefinitionStore::create(
        fx.store.as_ref(),
        graphql_definition("orders", "GET", &[], fx.connection_id),
    )
    .await
    .unwrap();

    let schema = SharedSchema::initialize(fx.context.clone()).await.unwrap();
    let response = execute(&schema, &fx.context, "{ orders { id customer total } }").await;
    assert!(response.errors.is_empty(), "errors: {:?}", response.errors);

    let data = serde_json::to_value(&response.data).unwrap();
    assert_eq!(data["orders"][0]["id"], "1");
    assert_eq!(data["orders"][0]["customer"], "ada");
    assert_eq!(data["orders"][0]["total"], "12.5");
}

#[tokio::test]
async fn included_columns_bound_the_type() {
    let fx = fixture().await;
    ApiDefinitionStore::create(
        fx.store.as_ref(),
        graphql_definition("orders", "GET", &["customer"], fx.connection_id),
    )
    .await
    .unwrap();

    let schema = SharedSchema::initialize(fx.context.clone()).await.unwrap();
    let sdl = schema.sdl();
    assert!(sdl.contains("customer: String"));
    assert!(!sdl.contains("total: String"));

    let response = execute(&schema, &fx.context, "{ orders { customer } }").await;
    assert!(response.errors.is_empty(), "errors: {:?}", response.errors);
}

#[tokio::test]
async fn reads_are_gated_by_allowed_operations() {
    let fx = fixture().await;
    // Columns are declared explicitly so the schema can still be built;
    // the read itself must be rejected by the executor gate.
    ApiDefinitionStore::create(
        fx.store.as_ref(),
        graphql_definition("orders", "DELETE", &["id"], fx.connection_id),
    )
    .await
    .unwrap();

    let schema = SharedSchema::initialize(fx.context.clone()).await.unwrap();
    let response = execute(&schema, &fx.context, "{ orders { id } }").await;
    assert!(
        !response.errors.is_empty(),
        "a definition without GET must not serve reads"
    );
}

#[tokio::test]
async fn table_without_columns_is_skipped() {
    let fx = fixture().await;
    ApiDefinitionStore::create(
        fx.store.as_ref(),
        graphql_definition("phantom", "GET", &[], fx.connection_id),
    )
    .await
    .unwrap();
    ApiDefinitionStore::create(
        fx.store.as_ref(),
        graphql_definition("orders", "GET", &[], fx.connection_id),
    )
    .await
    .unwrap();

    let schema = SharedSchema::initialize(fx.context.clone()).await.unwrap();
    let sdl = schema.sdl();
    assert!(!sdl.contains("type Phantom"));
    assert!(sdl.contains("type Orders"));
}
