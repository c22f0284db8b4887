//! API models for orders.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    db::models::orders::{OrderDBResponse, OrderItemDBResponse},
    types::{OrderId, OrderItemId, UserId},
};

/// Lifecycle state of an order.
///
/// Orders start out `PENDING` and move exactly once to either `CANCELLED` or
/// `FINALIZED`; both are terminal. Stored as uppercase TEXT in SQLite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(rename_all = "UPPERCASE")]
pub enum OrderStatus {
    Pending,
    Cancelled,
    Finalized,
}

impl OrderStatus {
    /// Terminal orders accept no further mutations.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Cancelled | OrderStatus::Finalized)
    }
}

/// Request to create a new order
#[derive(Debug, Clone, Deserialize)]
pub struct OrderCreate {
    /// The user the order is placed for
    pub user_id: UserId,
}

/// Request to add a line item to an order
#[derive(Debug, Clone, Deserialize)]
pub struct OrderItemCreate {
    pub quantity: i64,
    pub flavor: String,
    pub size: String,
    pub unit_price: f64,
}

/// An order as returned by the API
#[derive(Debug, Clone, Serialize)]
pub struct OrderResponse {
    pub id: OrderId,
    pub user_id: UserId,
    pub status: OrderStatus,
    pub total_price: f64,
    pub created_at: DateTime<Utc>,
}

impl From<OrderDBResponse> for OrderResponse {
    fn from(order: OrderDBResponse) -> Self {
        Self {
            id: order.id,
            user_id: order.user_id,
            status: order.status,
            total_price: order.total_price,
            created_at: order.created_at,
        }
    }
}

/// A line item as returned by the API
#[derive(Debug, Clone, Serialize)]
pub struct OrderItemResponse {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub quantity: i64,
    pub flavor: String,
    pub size: String,
    pub unit_price: f64,
}

impl From<OrderItemDBResponse> for OrderItemResponse {
    fn from(item: OrderItemDBResponse) -> Self {
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

/// An order together with its line items
#[derive(Debug, Clone, Serialize)]
pub struct OrderDetailResponse {
    #[serde(flatten)]
    pub order: OrderResponse,
    pub items: Vec<OrderItemResponse>,
}

impl OrderDetailResponse {
    pub fn new(order: OrderDBResponse, items: Vec<OrderItemDBResponse>) -> Self {
        Self {
            order: OrderResponse::from(order),
            items: items.into_iter().map(OrderItemResponse::from).collect(),
        }
    }
}

/// Response after adding a line item
#[derive(Debug, Clone, Serialize)]
pub struct AddItemResponse {
    pub item_id: OrderItemId,
    pub order: OrderResponse,
}

/// Response after removing a line item
#[derive(Debug, Clone, Serialize)]
pub struct RemoveItemResponse {
    pub remaining_items: i64,
    pub order: OrderResponse,
}
