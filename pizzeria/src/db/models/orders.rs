//! Database models for orders and their line items.

use chrono::{DateTime, Utc};

use crate::{
    api::models::orders::OrderStatus,
    types::{OrderId, OrderItemId, UserId},
};

/// Database request for creating a new order
#[derive(Debug, Clone)]
pub struct OrderCreateDBRequest {
    pub user_id: UserId,
}

/// Database response for an order
#[derive(Debug, Clone)]
pub struct OrderDBResponse {
    pub id: OrderId,
    pub user_id: UserId,
    pub status: OrderStatus,
    pub total_price: f64,
    pub created_at: DateTime<Utc>,
}

/// Database request for adding a line item to an order
#[derive(Debug, Clone)]
pub struct OrderItemCreateDBRequest {
    pub quantity: i64,
    pub flavor: String,
    pub size: String,
    pub unit_price: f64,
}

/// Database response for an order line item
#[derive(Debug, Clone)]
pub struct OrderItemDBResponse {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub quantity: i64,
    pub flavor: String,
    pub size: String,
    pub unit_price: f64,
}
