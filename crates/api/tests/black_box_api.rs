use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use reqwest::StatusCode;
use serde_json::json;

use wms_api::app::services::AppServices;
use wms_catalog::{Hub, NewHub, NewSku, Sku};
use wms_core::{HubId, ProductId, SkuId, TenantId};
use wms_infra::store::{HubStore, InMemoryWarehouseStore, InventoryStore, SkuStore, StoreError};
use wms_infra::AdjustPolicy;
use wms_inventory::{HubInventory, InventoryKey, InventoryRowId};

struct TestServer {
    base_url: String,
    store: Arc<InMemoryWarehouseStore>,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    /// Empty in-memory stores.
    async fn spawn() -> Self {
        Self::spawn_with(Arc::new(InMemoryWarehouseStore::new()), AdjustPolicy::default()).await
    }

    /// Hub "H1", SKU "S2", and 10 units of S1 at H1.
    async fn spawn_seeded(policy: AdjustPolicy) -> Self {
        let store = seeded_store().await;
        Self::spawn_with(store, policy).await
    }

    async fn spawn_with(store: Arc<InMemoryWarehouseStore>, policy: AdjustPolicy) -> Self {
        let services = AppServices::from_store(store.clone(), policy);
        Self::spawn_services(services, store).await
    }

    /// Serve a faulty store wrapping `store`; `store` stays reachable for
    /// asserting on what was actually written.
    async fn spawn_faulty(faulty: Arc<FaultyStore>, policy: AdjustPolicy) -> Self {
        let store = faulty.inner.clone();
        let services = AppServices::from_store(faulty, policy);
        Self::spawn_services(services, store).await
    }

    async fn spawn_services(services: AppServices, store: Arc<InMemoryWarehouseStore>) -> Self {
        // Same router as prod, bound to an ephemeral port.
        let app = wms_api::app::build_app(Arc::new(services));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            store,
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn quantity(&self, sku: &str, hub: &str) -> i64 {
        self.store
            .find_inventory(&InventoryKey::new(sku.parse().unwrap(), hub.parse().unwrap()))
            .await
            .unwrap()
            .unwrap()
            .quantity
    }
}

async fn seeded_store() -> Arc<InMemoryWarehouseStore> {
    let store = Arc::new(InMemoryWarehouseStore::new());
    let hub = Hub::create_with_id(
        "H1".parse().unwrap(),
        NewHub {
            tenant_id: TenantId::new(1),
            manager_name: "Ada".to_string(),
            manager_contact: Some("+1-555-0100".to_string()),
            manager_email: "ada@example.com".to_string(),
        },
        Utc::now(),
    )
    .unwrap();
    let sku = Sku::create_with_id("S2".parse().unwrap(), NewSku { product_id: ProductId::new(7) }, Utc::now())
        .unwrap();
    store.insert_hub(hub).await.unwrap();
    store.insert_sku(sku).await.unwrap();
    store
        .insert_inventory(InventoryKey::new("S1".parse().unwrap(), "H1".parse().unwrap()), 10)
        .await
        .unwrap();
    store
}

/// Wraps an in-memory store and injects failures on demand.
#[derive(Default)]
struct FaultyStore {
    inner: Arc<InMemoryWarehouseStore>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    conflicting_inserts: AtomicBool,
    /// Another order takes one unit right after each inventory read.
    concurrent_writer: AtomicBool,
}

impl FaultyStore {
    fn wrapping(inner: Arc<InMemoryWarehouseStore>) -> Self {
        Self {
            inner,
            ..Default::default()
        }
    }

    fn set(flag: &AtomicBool) {
        flag.store(true, Ordering::SeqCst);
    }

    fn check(&self, operation: &'static str, flag: &AtomicBool) -> Result<(), StoreError> {
        if flag.load(Ordering::SeqCst) {
            return Err(StoreError::Database {
                operation,
                message: "connection reset".to_string(),
            });
        }
        Ok(())
    }

    fn check_insert(&self, operation: &'static str) -> Result<(), StoreError> {
        self.check(operation, &self.fail_writes)?;
        if self.conflicting_inserts.load(Ordering::SeqCst) {
            return Err(StoreError::Conflict {
                operation,
                message: "duplicate key".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl HubStore for FaultyStore {
    async fn find_hub(&self, id: &HubId) -> Result<Option<Hub>, StoreError> {
        self.check("find_hub", &self.fail_reads)?;
        self.inner.find_hub(id).await
    }

    async fn list_hubs(&self) -> Result<Vec<Hub>, StoreError> {
        self.check("list_hubs", &self.fail_reads)?;
        self.inner.list_hubs().await
    }

    async fn insert_hub(&self, hub: Hub) -> Result<Hub, StoreError> {
        self.check_insert("insert_hub")?;
        self.inner.insert_hub(hub).await
    }
}

#[async_trait]
impl SkuStore for FaultyStore {
    async fn find_sku(&self, id: &SkuId) -> Result<Option<Sku>, StoreError> {
        self.check("find_sku", &self.fail_reads)?;
        self.inner.find_sku(id).await
    }

    async fn list_skus(&self) -> Result<Vec<Sku>, StoreError> {
        self.check("list_skus", &self.fail_reads)?;
        self.inner.list_skus().await
    }

    async fn insert_sku(&self, sku: Sku) -> Result<Sku, StoreError> {
        self.check_insert("insert_sku")?;
        self.inner.insert_sku(sku).await
    }
}

#[async_trait]
impl InventoryStore for FaultyStore {
    async fn find_inventory(&self, key: &InventoryKey) -> Result<Option<HubInventory>, StoreError> {
        self.check("find_inventory", &self.fail_reads)?;
        let row = self.inner.find_inventory(key).await?;
        if let Some(r) = &row {
            if self.concurrent_writer.load(Ordering::SeqCst) {
                self.inner.update_quantity_if(r.id, r.quantity, r.quantity - 1).await?;
            }
        }
        Ok(row)
    }

    async fn save_inventory(&self, row: &HubInventory) -> Result<(), StoreError> {
        self.check("save_inventory", &self.fail_writes)?;
        self.inner.save_inventory(row).await
    }

    async fn update_quantity_if(
        &self,
        id: InventoryRowId,
        expected: i64,
        new_quantity: i64,
    ) -> Result<u64, StoreError> {
        self.check("update_quantity_if", &self.fail_writes)?;
        self.inner.update_quantity_if(id, expected, new_quantity).await
    }

    async fn insert_inventory(&self, key: InventoryKey, quantity: i64) -> Result<HubInventory, StoreError> {
        self.inner.insert_inventory(key, quantity).await
    }
}

async fn post_json(client: &reqwest::Client, url: String, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
    let res = client.post(url).json(&body).send().await.unwrap();
    let status = res.status();
    (status, res.json().await.unwrap())
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[tokio::test]
async fn health_is_ok_and_echoes_request_id() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .get(srv.url("/health"))
        .header("x-request-id", "req-42")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["x-request-id"], "req-42");
}

#[tokio::test]
async fn validate_order_accepts_known_hub_and_sku() {
    let srv = TestServer::spawn_seeded(AdjustPolicy::default()).await;
    let client = reqwest::Client::new();

    let res = client
        .post(srv.url("/api/v1/orders/validate_order"))
        .json(&json!({ "hub_id": "H1", "sku_id": "S2" }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Validation successful");
}

#[tokio::test]
async fn validate_order_names_the_missing_sku() {
    let srv = TestServer::spawn_seeded(AdjustPolicy::default()).await;
    let client = reqwest::Client::new();

    let res = client
        .post(srv.url("/api/v1/orders/validate_order"))
        .json(&json!({ "hub_id": "H1", "sku_id": "S1" }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "validation_failed");
    assert!(body["message"].as_str().unwrap().starts_with("sku validation failed: "));
}

#[tokio::test]
async fn validate_order_with_both_missing_reports_one_side() {
    let srv = TestServer::spawn_seeded(AdjustPolicy::default()).await;
    let client = reqwest::Client::new();

    let res = client
        .post(srv.url("/api/v1/orders/validate_order"))
        .json(&json!({ "hub_id": "H9", "sku_id": "S9" }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    let msg = body["message"].as_str().unwrap();
    assert!(msg.starts_with("hub validation failed") ^ msg.starts_with("sku validation failed"));
}

#[tokio::test]
async fn validate_order_rejects_blank_ids_and_malformed_bodies() {
    let srv = TestServer::spawn_seeded(AdjustPolicy::default()).await;
    let client = reqwest::Client::new();

    let res = client
        .post(srv.url("/api/v1/orders/validate_order"))
        .json(&json!({ "hub_id": "  ", "sku_id": "S2" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "invalid_id");

    let res = client
        .post(srv.url("/api/v1/orders/validate_order"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert!(res.status().is_client_error());
}

#[tokio::test]
async fn validate_inventory_deducts_and_reports_remaining() {
    let srv = TestServer::spawn_seeded(AdjustPolicy::default()).await;
    let client = reqwest::Client::new();

    let res = client
        .post(srv.url("/api/v1/orders/validate_inventory"))
        .json(&json!({ "sku_id": "S1", "hub_id": "H1", "quantity_ordered": 4 }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Inventory validation and update successful");
    assert_eq!(body["inventory"]["quantity_of_each_product"], 6);
    assert_eq!(srv.quantity("S1", "H1").await, 6);
}

#[tokio::test]
async fn validate_inventory_error_statuses() {
    let srv = TestServer::spawn_seeded(AdjustPolicy::Conditional).await;
    let client = reqwest::Client::new();

    let cases = [
        (json!({ "sku_id": "S1", "hub_id": "H2", "quantity_ordered": 1 }), StatusCode::NOT_FOUND, "inventory_not_found"),
        (json!({ "sku_id": "S1", "hub_id": "H1", "quantity_ordered": 11 }), StatusCode::BAD_REQUEST, "insufficient_inventory"),
        (json!({ "sku_id": "S1", "hub_id": "H1", "quantity_ordered": -1 }), StatusCode::BAD_REQUEST, "invalid_quantity"),
    ];

    for (body, status, code) in cases {
        let res = client
            .post(srv.url("/api/v1/orders/validate_inventory"))
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), status, "{body}");
        let got: serde_json::Value = res.json().await.unwrap();
        assert_eq!(got["error"], code);
    }

    // None of the rejected requests touched the row.
    assert_eq!(srv.quantity("S1", "H1").await, 10);
}

#[tokio::test]
async fn hub_lifecycle_create_list_get() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client.get(srv.url("/api/v1/hubs")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = client
        .post(srv.url("/api/v1/hubs"))
        .json(&json!({ "tenant_id": 3, "manager_name": "Grace", "manager_email": "grace@example.com" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let created: serde_json::Value = res.json().await.unwrap();
    assert_eq!(created["message"], "Hub created successfully");
    let id = created["hub"]["id"].as_str().unwrap().to_string();

    let res = client.get(srv.url(&format!("/api/v1/hubs/{id}"))).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["hub"]["manager_name"], "Grace");
    assert_eq!(body["hub"]["tenant_id"], 3);

    let res = client.get(srv.url("/api/v1/hubs")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["hubs"].as_array().unwrap().len(), 1);

    let res = client.get(srv.url("/api/v1/hubs/nope")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn hub_without_manager_email_is_rejected() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .post(srv.url("/api/v1/hubs"))
        .json(&json!({ "manager_name": "Grace" }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn sku_lifecycle_and_product_id_rule() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client.get(srv.url("/api/v1/skus")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = client
        .post(srv.url("/api/v1/skus"))
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client
        .post(srv.url("/api/v1/skus"))
        .json(&json!({ "product_id": 12 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let created: serde_json::Value = res.json().await.unwrap();
    assert_eq!(created["message"], "SKU created successfully");
    let id = created["sku"]["id"].as_str().unwrap().to_string();

    let res = client.get(srv.url(&format!("/api/v1/skus/{id}"))).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["sku"]["product_id"], 12);

    // A freshly created hub + SKU validate as an order.
    let res = client
        .post(srv.url("/api/v1/hubs"))
        .json(&json!({ "manager_name": "Grace", "manager_email": "grace@example.com" }))
        .send()
        .await
        .unwrap();
    let hub: serde_json::Value = res.json().await.unwrap();
    let res = client
        .post(srv.url("/api/v1/orders/validate_order"))
        .json(&json!({ "hub_id": hub["hub"]["id"], "sku_id": id }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn stale_read_under_conditional_policy_is_a_conflict() {
    let faulty = Arc::new(FaultyStore::wrapping(seeded_store().await));
    FaultyStore::set(&faulty.concurrent_writer);
    let srv = TestServer::spawn_faulty(faulty, AdjustPolicy::Conditional).await;
    let client = reqwest::Client::new();

    let (status, body) = post_json(
        &client,
        srv.url("/api/v1/orders/validate_inventory"),
        json!({ "sku_id": "S1", "hub_id": "H1", "quantity_ordered": 4 }),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");
    // Only the other order's unit is gone; ours was not written.
    assert_eq!(srv.quantity("S1", "H1").await, 9);
}

#[tokio::test]
async fn stale_read_under_last_write_wins_overwrites_the_other_order() {
    let faulty = Arc::new(FaultyStore::wrapping(seeded_store().await));
    FaultyStore::set(&faulty.concurrent_writer);
    let srv = TestServer::spawn_faulty(faulty, AdjustPolicy::LastWriteWins).await;
    let client = reqwest::Client::new();

    let (status, body) = post_json(
        &client,
        srv.url("/api/v1/orders/validate_inventory"),
        json!({ "sku_id": "S1", "hub_id": "H1", "quantity_ordered": 4 }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["inventory"]["quantity_of_each_product"], 6);
    assert_eq!(srv.quantity("S1", "H1").await, 6);
}

#[tokio::test]
async fn read_failures_map_to_server_errors() {
    let faulty = Arc::new(FaultyStore::wrapping(seeded_store().await));
    FaultyStore::set(&faulty.fail_reads);
    let srv = TestServer::spawn_faulty(faulty, AdjustPolicy::default()).await;
    let client = reqwest::Client::new();

    let (status, body) = post_json(
        &client,
        srv.url("/api/v1/orders/validate_inventory"),
        json!({ "sku_id": "S1", "hub_id": "H1", "quantity_ordered": 1 }),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "lookup_failed");

    // Reference validation still reports a failed lookup as an invalid order,
    // with the store cause in the message.
    let (status, body) = post_json(
        &client,
        srv.url("/api/v1/orders/validate_order"),
        json!({ "hub_id": "H1", "sku_id": "S2" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("connection reset"));

    let res = client.get(srv.url("/api/v1/hubs")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "store_error");
}

#[tokio::test]
async fn write_failures_map_to_server_errors() {
    for policy in [AdjustPolicy::LastWriteWins, AdjustPolicy::Conditional] {
        let faulty = Arc::new(FaultyStore::wrapping(seeded_store().await));
        FaultyStore::set(&faulty.fail_writes);
        let srv = TestServer::spawn_faulty(faulty, policy).await;
        let client = reqwest::Client::new();

        let (status, body) = post_json(
            &client,
            srv.url("/api/v1/orders/validate_inventory"),
            json!({ "sku_id": "S1", "hub_id": "H1", "quantity_ordered": 1 }),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{policy}");
        assert_eq!(body["error"], "update_failed");
        assert_eq!(srv.quantity("S1", "H1").await, 10);

        let (status, body) = post_json(
            &client,
            srv.url("/api/v1/hubs"),
            json!({ "manager_name": "Grace", "manager_email": "grace@example.com" }),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "store_error");
    }
}

#[tokio::test]
async fn duplicate_inserts_map_to_conflict() {
    let faulty = Arc::new(FaultyStore::wrapping(Arc::new(InMemoryWarehouseStore::new())));
    FaultyStore::set(&faulty.conflicting_inserts);
    let srv = TestServer::spawn_faulty(faulty, AdjustPolicy::default()).await;
    let client = reqwest::Client::new();

    let (status, body) = post_json(
        &client,
        srv.url("/api/v1/hubs"),
        json!({ "manager_name": "Grace", "manager_email": "grace@example.com" }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");

    let (status, _) = post_json(&client, srv.url("/api/v1/skus"), json!({ "product_id": 3 })).await;
    assert_eq!(status, StatusCode::CONFLICT);
}
