//! Database repository for the order aggregate.
//!
//! Orders own their line items: items are only ever created, read, or deleted
//! through an order, and `total_price` is a derived column recomputed from the
//! items after every mutation inside the same transaction.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqliteConnection};
use tracing::instrument;

use crate::{
    api::models::orders::OrderStatus,
    db::{
        errors::Result,
        handlers::repository::Repository,
        models::orders::{
            OrderCreateDBRequest, OrderDBResponse, OrderItemCreateDBRequest, OrderItemDBResponse,
        },
    },
    types::{OrderId, OrderItemId, UserId},
};

/// Filter for listing orders
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    /// Restrict to orders owned by this user
    pub user_id: Option<UserId>,
}

impl OrderFilter {
    pub fn for_user(user_id: UserId) -> Self {
        Self { user_id: Some(user_id) }
    }
}

// Database entity models
#[derive(Debug, Clone, FromRow)]
struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub status: OrderStatus,
    pub total_price: f64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub quantity: i64,
    pub flavor: String,
    pub size: String,
    pub unit_price: f64,
}

impl From<Order> for OrderDBResponse {
    fn from(order: Order) -> Self {
        Self {
            id: order.id,
            user_id: order.user_id,
            status: order.status,
            total_price: order.total_price,
            created_at: order.created_at,
        }
    }
}

impl From<OrderItem> for OrderItemDBResponse {
    fn from(item: OrderItem) -> Self {
        Self {
            id: item.id,
            order_id: item.order_id,
            quantity: item.quantity,
            flavor: item.flavor,
            size: item.size,
            unit_price: item.unit_price,
        }
    }
}

pub struct Orders<'c> {
    db: &'c mut SqliteConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for Orders<'c> {
    type CreateRequest = OrderCreateDBRequest;
    type Response = OrderDBResponse;
    type Id = OrderId;
    type Filter = OrderFilter;

    #[instrument(skip(self, request), fields(user_id = request.user_id), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let order = sqlx::query_as::<_, Order>(
            "INSERT INTO orders (user_id) VALUES (?) RETURNING *",
        )
        .bind(request.user_id)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(OrderDBResponse::from(order))
    }

    #[instrument(skip(self), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(order.map(OrderDBResponse::from))
    }

    #[instrument(skip(self, filter), fields(user_id = filter.user_id), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let orders = match filter.user_id {
            Some(user_id) => {
                sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE user_id = ? ORDER BY id")
                    .bind(user_id)
                    .fetch_all(&mut *self.db)
                    .await?
            }
            None => {
                sqlx::query_as::<_, Order>("SELECT * FROM orders ORDER BY id")
                    .fetch_all(&mut *self.db)
                    .await?
            }
        };

        Ok(orders.into_iter().map(OrderDBResponse::from).collect())
    }

    /// Delete an order; line items go with it via ON DELETE CASCADE.
    #[instrument(skip(self), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM orders WHERE id = ?").bind(id).execute(&mut *self.db).await?;

        Ok(result.rows_affected() > 0)
    }
}

impl<'c> Orders<'c> {
    pub fn new(db: &'c mut SqliteConnection) -> Self {
        Self { db }
    }

    /// Update an order's status and return the fresh row.
    #[instrument(skip(self), err)]
    pub async fn set_status(&mut self, id: OrderId, status: OrderStatus) -> Result<OrderDBResponse> {
        let order = sqlx::query_as::<_, Order>(
            "UPDATE orders SET status = ? WHERE id = ? RETURNING *",
        )
        .bind(status)
        .bind(id)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(OrderDBResponse::from(order))
    }

    /// List an order's line items in insertion order.
    #[instrument(skip(self), err)]
    pub async fn items(&mut self, order_id: OrderId) -> Result<Vec<OrderItemDBResponse>> {
        let items = sqlx::query_as::<_, OrderItem>(
            "SELECT * FROM order_items WHERE order_id = ? ORDER BY id",
        )
        .bind(order_id)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(items.into_iter().map(OrderItemDBResponse::from).collect())
    }

    #[instrument(skip(self), err)]
    pub async fn get_item(&mut self, item_id: OrderItemId) -> Result<Option<OrderItemDBResponse>> {
        let item = sqlx::query_as::<_, OrderItem>("SELECT * FROM order_items WHERE id = ?")
            .bind(item_id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(item.map(OrderItemDBResponse::from))
    }

    /// Insert a line item and bring the order's total back in sync.
    #[instrument(skip(self, request), err)]
    pub async fn add_item(
        &mut self,
        order_id: OrderId,
        request: &OrderItemCreateDBRequest,
    ) -> Result<OrderItemDBResponse> {
        let item = sqlx::query_as::<_, OrderItem>(
            r#"
            INSERT INTO order_items (order_id, quantity, flavor, size, unit_price)
            VALUES (?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(order_id)
        .bind(request.quantity)
        .bind(&request.flavor)
        .bind(&request.size)
        .bind(request.unit_price)
        .fetch_one(&mut *self.db)
        .await?;

        self.recompute_total(order_id).await?;

        Ok(OrderItemDBResponse::from(item))
    }

    /// Delete a line item and bring the parent order's total back in sync.
    #[instrument(skip(self), err)]
    pub async fn remove_item(&mut self, order_id: OrderId, item_id: OrderItemId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM order_items WHERE id = ?")
            .bind(item_id)
            .execute(&mut *self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Ok(false);
        }

        self.recompute_total(order_id).await?;
        Ok(true)
    }

    #[instrument(skip(self), err)]
    pub async fn count_items(&mut self, order_id: OrderId) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM order_items WHERE order_id = ?")
            .bind(order_id)
            .fetch_one(&mut *self.db)
            .await?;

        Ok(count)
    }

    /// Recompute `total_price` as the full sum over the order's items.
    ///
    /// Always re-sums instead of applying a delta, so the stored total cannot
    /// drift from the items no matter what sequence of mutations ran before.
    #[instrument(skip(self), err)]
    pub async fn recompute_total(&mut self, order_id: OrderId) -> Result<f64> {
        let total: f64 = sqlx::query_scalar(
            r#"
            UPDATE orders
            SET total_price = (
                SELECT COALESCE(SUM(unit_price * quantity), 0.0)
                FROM order_items
                WHERE order_id = orders.id
            )
            WHERE id = ?
            RETURNING total_price
            "#,
        )
        .bind(order_id)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(total)
    }
}
