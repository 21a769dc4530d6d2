//! Postgres-backed warehouse store.
//!
//! ## Error Mapping
//!
//! SQLx errors are mapped to `StoreError` as follows:
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError |
//! |------------|----------------------|------------|
//! | Database (unique violation) | `23505` | `Conflict` |
//! | Database (other) | Any other | `Database` |
//! | PoolClosed / Io / other | N/A | `Database` |
//! | `save_inventory` updated 0 rows | N/A | `Missing` |
//!
//! ## Concurrency
//!
//! `save_inventory` rewrites the full row with no version check, so two
//! concurrent read-modify-write cycles on the same row can lose an update.
//! `update_quantity_if` is the conditional alternative: it only writes when the
//! stored quantity still equals the value the caller read.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use tracing::instrument;

use wms_catalog::{Hub, Sku};
use wms_core::{HubId, ProductId, SkuId, TenantId};
use wms_inventory::{HubInventory, InventoryKey, InventoryRowId};

use super::{HubStore, InventoryStore, SkuStore, StoreError};

const SCHEMA: &str = include_str!("../../migrations/0001_warehouse.sql");

/// Postgres-backed store for hubs, SKUs and inventory rows.
///
/// Uses the SQLx connection pool, which is `Send + Sync` and can be shared
/// across request handlers.
#[derive(Debug, Clone)]
pub struct PostgresWarehouseStore {
    pool: Arc<PgPool>,
}

impl PostgresWarehouseStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Open a pool against `database_url`.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    /// Create the tables if they do not exist yet.
    #[instrument(skip(self), err)]
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::raw_sql(SCHEMA)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("ensure_schema", e))?;
        Ok(())
    }
}

#[async_trait]
impl HubStore for PostgresWarehouseStore {
    #[instrument(skip(self), fields(hub_id = %id), err)]
    async fn find_hub(&self, id: &HubId) -> Result<Option<Hub>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, tenant_id, manager_name, manager_contact, manager_email, created_at
            FROM hubs
            WHERE id = $1
            "#,
        )
        .bind(id.as_str())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_hub", e))?;

        row.map(|r| hub_from_row("find_hub", &r)).transpose()
    }

    #[instrument(skip(self), err)]
    async fn list_hubs(&self) -> Result<Vec<Hub>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, tenant_id, manager_name, manager_contact, manager_email, created_at
            FROM hubs
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_hubs", e))?;

        rows.iter().map(|r| hub_from_row("list_hubs", r)).collect()
    }

    #[instrument(skip(self, hub), fields(hub_id = %hub.id), err)]
    async fn insert_hub(&self, hub: Hub) -> Result<Hub, StoreError> {
        sqlx::query(
            r#"
            INSERT INTO hubs (id, tenant_id, manager_name, manager_contact, manager_email, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(hub.id.as_str())
        .bind(to_db_int("insert_hub", hub.tenant_id.get())?)
        .bind(&hub.manager_name)
        .bind(hub.manager_contact.as_deref())
        .bind(&hub.manager_email)
        .bind(hub.created_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_hub", e))?;

        Ok(hub)
    }
}

#[async_trait]
impl SkuStore for PostgresWarehouseStore {
    #[instrument(skip(self), fields(sku_id = %id), err)]
    async fn find_sku(&self, id: &SkuId) -> Result<Option<Sku>, StoreError> {
        let row = sqlx::query("SELECT id, product_id, created_at FROM skus WHERE id = $1")
            .bind(id.as_str())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_sku", e))?;

        row.map(|r| sku_from_row("find_sku", &r)).transpose()
    }

    #[instrument(skip(self), err)]
    async fn list_skus(&self) -> Result<Vec<Sku>, StoreError> {
        let rows = sqlx::query("SELECT id, product_id, created_at FROM skus ORDER BY created_at ASC, id ASC")
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_skus", e))?;

        rows.iter().map(|r| sku_from_row("list_skus", r)).collect()
    }

    #[instrument(skip(self, sku), fields(sku_id = %sku.id), err)]
    async fn insert_sku(&self, sku: Sku) -> Result<Sku, StoreError> {
        sqlx::query("INSERT INTO skus (id, product_id, created_at) VALUES ($1, $2, $3)")
            .bind(sku.id.as_str())
            .bind(to_db_int("insert_sku", sku.product_id.get())?)
            .bind(sku.created_at)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("insert_sku", e))?;

        Ok(sku)
    }
}

#[async_trait]
impl InventoryStore for PostgresWarehouseStore {
    #[instrument(skip(self), fields(sku_id = %key.sku_id, hub_id = %key.hub_id), err)]
    async fn find_inventory(&self, key: &InventoryKey) -> Result<Option<HubInventory>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, sku_id, hub_id, quantity_of_each_product
            FROM hub_inventories
            WHERE sku_id = $1 AND hub_id = $2
            ORDER BY id ASC
            LIMIT 1
            "#,
        )
        .bind(key.sku_id.as_str())
        .bind(key.hub_id.as_str())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_inventory", e))?;

        row.map(|r| inventory_from_row("find_inventory", &r)).transpose()
    }

    #[instrument(skip(self, row), fields(row_id = %row.id, quantity = row.quantity), err)]
    async fn save_inventory(&self, row: &HubInventory) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE hub_inventories
            SET sku_id = $2,
                hub_id = $3,
                quantity_of_each_product = $4,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(row.id.0)
        .bind(row.sku_id.as_str())
        .bind(row.hub_id.as_str())
        .bind(row.quantity)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("save_inventory", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::missing_row("save_inventory", row.id));
        }
        Ok(())
    }

    #[instrument(skip(self), fields(row_id = %id), err)]
    async fn update_quantity_if(
        &self,
        id: InventoryRowId,
        expected: i64,
        new_quantity: i64,
    ) -> Result<u64, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE hub_inventories
            SET quantity_of_each_product = $3,
                updated_at = NOW()
            WHERE id = $1 AND quantity_of_each_product = $2
            "#,
        )
        .bind(id.0)
        .bind(expected)
        .bind(new_quantity)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_quantity_if", e))?;

        Ok(result.rows_affected())
    }

    #[instrument(skip(self), fields(sku_id = %key.sku_id, hub_id = %key.hub_id), err)]
    async fn insert_inventory(
        &self,
        key: InventoryKey,
        quantity: i64,
    ) -> Result<HubInventory, StoreError> {
        let row = sqlx::query(
            r#"
            INSERT INTO hub_inventories (sku_id, hub_id, quantity_of_each_product)
            VALUES ($1, $2, $3)
            RETURNING id, sku_id, hub_id, quantity_of_each_product
            "#,
        )
        .bind(key.sku_id.as_str())
        .bind(key.hub_id.as_str())
        .bind(quantity)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_inventory", e))?;

        inventory_from_row("insert_inventory", &row)
    }
}

fn hub_from_row(operation: &'static str, row: &PgRow) -> Result<Hub, StoreError> {
    let decode = |e: sqlx::Error| decode_error(operation, e);

    let id: String = row.try_get("id").map_err(decode)?;
    let tenant_id: i64 = row.try_get("tenant_id").map_err(decode)?;
    let created_at: DateTime<Utc> = row.try_get("created_at").map_err(decode)?;

    Ok(Hub {
        id: parse_id(operation, &id)?,
        tenant_id: TenantId::new(from_db_int(operation, tenant_id)?),
        manager_name: row.try_get("manager_name").map_err(decode)?,
        manager_contact: row.try_get("manager_contact").map_err(decode)?,
        manager_email: row.try_get("manager_email").map_err(decode)?,
        created_at,
    })
}

fn sku_from_row(operation: &'static str, row: &PgRow) -> Result<Sku, StoreError> {
    let decode = |e: sqlx::Error| decode_error(operation, e);

    let id: String = row.try_get("id").map_err(decode)?;
    let product_id: i64 = row.try_get("product_id").map_err(decode)?;

    Ok(Sku {
        id: parse_id(operation, &id)?,
        product_id: ProductId::new(from_db_int(operation, product_id)?),
        created_at: row.try_get("created_at").map_err(decode)?,
    })
}

fn inventory_from_row(operation: &'static str, row: &PgRow) -> Result<HubInventory, StoreError> {
    let decode = |e: sqlx::Error| decode_error(operation, e);

    let sku_id: String = row.try_get("sku_id").map_err(decode)?;
    let hub_id: String = row.try_get("hub_id").map_err(decode)?;

    Ok(HubInventory {
        id: InventoryRowId(row.try_get("id").map_err(decode)?),
        sku_id: parse_id(operation, &sku_id)?,
        hub_id: parse_id(operation, &hub_id)?,
        quantity: row.try_get("quantity_of_each_product").map_err(decode)?,
    })
}

fn parse_id<T>(operation: &'static str, raw: &str) -> Result<T, StoreError>
where
    T: core::str::FromStr<Err = wms_core::DomainError>,
{
    raw.parse().map_err(|e: wms_core::DomainError| StoreError::Decode {
        operation,
        message: e.to_string(),
    })
}

fn to_db_int(operation: &'static str, value: u64) -> Result<i64, StoreError> {
    i64::try_from(value).map_err(|_| StoreError::Database {
        operation,
        message: format!("value {value} does not fit in BIGINT"),
    })
}

fn from_db_int(operation: &'static str, value: i64) -> Result<u64, StoreError> {
    u64::try_from(value).map_err(|_| StoreError::Decode {
        operation,
        message: format!("negative reference {value}"),
    })
}

fn decode_error(operation: &'static str, err: sqlx::Error) -> StoreError {
    StoreError::Decode {
        operation,
        message: err.to_string(),
    }
}

/// Map SQLx errors to StoreError.
fn map_sqlx_error(operation: &'static str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let message = db_err.message().to_string();
            match db_err.code().as_deref() {
                Some("23505") => StoreError::Conflict { operation, message },
                _ => StoreError::Database { operation, message },
            }
        }
        sqlx::Error::PoolClosed => StoreError::Database {
            operation,
            message: "connection pool closed".to_string(),
        },
        other => StoreError::Database {
            operation,
            message: other.to_string(),
        },
    }
}
