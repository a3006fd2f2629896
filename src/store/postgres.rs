use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::types::Json;
use sqlx::Row;

use super::{OrderStore, StoreError};
use crate::domain::order::{DeliveryAddress, Order, OrderId, OrderItem, OrderStatus};

// One row per aggregate. Items and addresses live in JSONB columns so every
// save is a single-row write.
const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS orders (
    id                  UUID PRIMARY KEY,
    customer_id         BIGINT NOT NULL,
    total_price         NUMERIC NOT NULL CHECK (total_price >= 0),
    status              TEXT NOT NULL,
    created_at          TIMESTAMPTZ NOT NULL,
    cancellation_reason TEXT,
    items               JSONB NOT NULL,
    delivery_addresses  JSONB NOT NULL DEFAULT '[]'::jsonb
);
CREATE INDEX IF NOT EXISTS orders_status_idx ON orders (status);
"#;

const SELECT_COLUMNS: &str = "SELECT id, customer_id, total_price, status, created_at, \
     cancellation_reason, items, delivery_addresses FROM orders";

pub struct PostgresOrderStore {
    pool: PgPool,
}

impl PostgresOrderStore {
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await?;
        Ok(Self { pool })
    }

    /// Create the orders table if it does not exist yet.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::raw_sql(SCHEMA).execute(&self.pool).await?;
        tracing::info!("Order schema ready");
        Ok(())
    }

    fn order_from_row(row: &PgRow) -> Result<Order, StoreError> {
        let status: String = row.try_get("status")?;
        let status = OrderStatus::parse(&status)
            .ok_or_else(|| StoreError::Serialization(format!("unknown order status: {}", status)))?;
        let items: Json<Vec<OrderItem>> = row.try_get("items")?;
        let addresses: Json<Vec<DeliveryAddress>> = row.try_get("delivery_addresses")?;

        Ok(Order {
            id: row.try_get("id")?,
            customer_id: row.try_get("customer_id")?,
            items: items.0,
            total_price: row.try_get("total_price")?,
            status,
            created_at: row.try_get("created_at")?,
            cancellation_reason: row.try_get("cancellation_reason")?,
            delivery_addresses: addresses.0,
        })
    }
}

#[async_trait]
impl OrderStore for PostgresOrderStore {
    async fn find_by_id(&self, id: OrderId) -> Result<Option<Order>, StoreError> {
        let row = sqlx::query(&format!("{} WHERE id = $1", SELECT_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::order_from_row).transpose()
    }

    async fn find_by_id_and_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<Option<Order>, StoreError> {
        let row = sqlx::query(&format!("{} WHERE id = $1 AND status = $2", SELECT_COLUMNS))
            .bind(id)
            .bind(status.as_str())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::order_from_row).transpose()
    }

    async fn save(&self, order: Order) -> Result<Order, StoreError> {
        sqlx::query(
            "INSERT INTO orders (
                id, customer_id, total_price, status, created_at,
                cancellation_reason, items, delivery_addresses
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (id) DO UPDATE SET
                customer_id = EXCLUDED.customer_id,
                total_price = EXCLUDED.total_price,
                status = EXCLUDED.status,
                cancellation_reason = EXCLUDED.cancellation_reason,
                items = EXCLUDED.items,
                delivery_addresses = EXCLUDED.delivery_addresses",
        )
        .bind(order.id)
        .bind(order.customer_id)
        .bind(order.total_price)
        .bind(order.status.as_str())
        .bind(order.created_at)
        .bind(order.cancellation_reason.as_deref())
        .bind(Json(&order.items))
        .bind(Json(&order.delivery_addresses))
        .execute(&self.pool)
        .await?;

        tracing::debug!(order_id = %order.id, status = %order.status, "Saved order row");
        Ok(order)
    }

    async fn find_all(&self) -> Result<Vec<Order>, StoreError> {
        let rows = sqlx::query(&format!("{} ORDER BY created_at ASC", SELECT_COLUMNS))
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(Self::order_from_row).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::AddressFields;
    use rust_decimal::Decimal;

    const ENV_TEST_DB_URL: &str = "ORDER_SERVICE_TEST_DATABASE_URL";

    /// DB-backed, skipped if ORDER_SERVICE_TEST_DATABASE_URL is not set.
    #[tokio::test]
    async fn test_postgres_round_trip_and_guarded_read() -> anyhow::Result<()> {
        let url = match std::env::var(ENV_TEST_DB_URL) {
            Ok(v) => v,
            Err(_) => {
                eprintln!("SKIP: {} not set", ENV_TEST_DB_URL);
                return Ok(());
            }
        };

        let store = match PostgresOrderStore::connect(&url, 2).await {
            Ok(store) => store,
            Err(e) => {
                eprintln!("SKIP: cannot connect to DB: {e}");
                return Ok(());
            }
        };
        store.migrate().await?;

        let mut order = Order::place(
            9,
            Decimal::new(1999, 2),
            vec![OrderItem { product_id: 101, quantity: 2 }],
        );
        order.add_delivery_address(AddressFields::new(
            "Haut str", "10", "Berlin", "Berlin", "10115",
        ));
        let saved = store.save(order).await?;

        let loaded = store.find_by_id(saved.id).await?.expect("order should exist");
        assert_eq!(loaded.items, saved.items);
        assert_eq!(loaded.delivery_addresses, saved.delivery_addresses);
        assert_eq!(loaded.total_price, saved.total_price);
        assert_eq!(loaded.created_at, saved.created_at);
        assert_eq!(loaded, saved);

        assert!(store
            .find_by_id_and_status(saved.id, OrderStatus::OrderPlaced)
            .await?
            .is_some());
        assert!(store
            .find_by_id_and_status(saved.id, OrderStatus::Delivered)
            .await?
            .is_none());

        let mut cancelled = loaded;
        cancelled.cancel("changed mind");
        store.save(cancelled).await?;

        let reloaded = store.find_by_id(saved.id).await?.expect("order should exist");
        assert_eq!(reloaded.status, OrderStatus::Cancelled);
        assert_eq!(reloaded.cancellation_reason.as_deref(), Some("changed mind"));

        Ok(())
    }
}
