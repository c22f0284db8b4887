//! Order lifecycle and line item handlers.
//!
//! Every handler runs in a single transaction: authorization is checked
//! against the loaded order, the mutation and the total recomputation commit
//! together or not at all.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::{info, instrument};

use crate::{
    AppState,
    api::models::{
        orders::{
            AddItemResponse, OrderCreate, OrderDetailResponse, OrderItemCreate, OrderResponse,
            OrderStatus, RemoveItemResponse,
        },
        users::CurrentUser,
    },
    auth::permissions::{require_admin, require_self_or_admin},
    db::{
        errors::DbError,
        handlers::{Orders, Repository, orders::OrderFilter},
        models::orders::{OrderCreateDBRequest, OrderDBResponse, OrderItemCreateDBRequest},
    },
    errors::{Error, Result},
    types::{OrderId, OrderItemId},
};

/// Load an order or return 404.
async fn get_order_or_404(orders: &mut Orders<'_>, id: OrderId) -> Result<OrderDBResponse> {
    orders.get_by_id(id).await?.ok_or(Error::NotFound {
        resource: "Order",
        id: id.to_string(),
    })
}

/// Reject mutations of orders that already reached a terminal status.
fn ensure_mutable(order: &OrderDBResponse) -> Result<()> {
    if order.status.is_terminal() {
        return Err(Error::Conflict {
            message: format!("Order {} is already {:?}, no further changes allowed", order.id, order.status),
        });
    }
    Ok(())
}

/// Create a new order for a user.
///
/// Regular users may only order for themselves; admins may order on behalf
/// of anyone.
#[instrument(skip(state, caller, request), fields(caller_id = caller.id, user_id = request.user_id))]
pub async fn create_order(
    State(state): State<AppState>,
    caller: CurrentUser,
    Json(request): Json<OrderCreate>,
) -> Result<(StatusCode, Json<OrderResponse>)> {
    require_self_or_admin(&caller, request.user_id, "create an order for", format!("user {}", request.user_id))?;

    let mut tx = state.db.begin().await.map_err(DbError::from)?;
    let order = Orders::new(&mut tx).create(&OrderCreateDBRequest { user_id: request.user_id }).await?;
    tx.commit().await.map_err(DbError::from)?;

    info!("Created order {} for user {}", order.id, order.user_id);
    Ok((StatusCode::CREATED, Json(OrderResponse::from(order))))
}

/// Fetch one order with its line items.
#[instrument(skip(state, caller), fields(caller_id = caller.id))]
pub async fn get_order(
    State(state): State<AppState>,
    caller: CurrentUser,
    Path(order_id): Path<OrderId>,
) -> Result<Json<OrderDetailResponse>> {
    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let mut orders = Orders::new(&mut conn);

    let order = get_order_or_404(&mut orders, order_id).await?;
    require_self_or_admin(&caller, order.user_id, "view", format!("order {order_id}"))?;

    let items = orders.items(order_id).await?;
    Ok(Json(OrderDetailResponse::new(order, items)))
}

/// List every order in the system. Admin only.
#[instrument(skip(state, caller), fields(caller_id = caller.id))]
pub async fn list_all_orders(State(state): State<AppState>, caller: CurrentUser) -> Result<Json<Vec<OrderResponse>>> {
    require_admin(&caller, "list", "all orders".to_string())?;

    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let orders = Orders::new(&mut conn).list(&OrderFilter::default()).await?;

    Ok(Json(orders.into_iter().map(OrderResponse::from).collect()))
}

/// List the caller's own orders.
#[instrument(skip(state, caller), fields(caller_id = caller.id))]
pub async fn list_my_orders(State(state): State<AppState>, caller: CurrentUser) -> Result<Json<Vec<OrderResponse>>> {
    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let orders = Orders::new(&mut conn).list(&OrderFilter::for_user(caller.id)).await?;

    Ok(Json(orders.into_iter().map(OrderResponse::from).collect()))
}

async fn transition(
    state: &AppState,
    caller: &CurrentUser,
    order_id: OrderId,
    target: OrderStatus,
    action: &'static str,
) -> Result<OrderResponse> {
    let mut tx = state.db.begin().await.map_err(DbError::from)?;
    let mut orders = Orders::new(&mut tx);

    let order = get_order_or_404(&mut orders, order_id).await?;
    require_self_or_admin(caller, order.user_id, action, format!("order {order_id}"))?;
    ensure_mutable(&order)?;

    let order = orders.set_status(order_id, target).await?;
    tx.commit().await.map_err(DbError::from)?;

    info!("Order {} is now {:?}", order.id, order.status);
    Ok(OrderResponse::from(order))
}

/// Cancel a pending order. Terminal; the order accepts no further changes.
#[instrument(skip(state, caller), fields(caller_id = caller.id))]
pub async fn cancel_order(
    State(state): State<AppState>,
    caller: CurrentUser,
    Path(order_id): Path<OrderId>,
) -> Result<Json<OrderResponse>> {
    let order = transition(&state, &caller, order_id, OrderStatus::Cancelled, "cancel").await?;
    Ok(Json(order))
}

/// Finalize a pending order. Terminal; the order accepts no further changes.
#[instrument(skip(state, caller), fields(caller_id = caller.id))]
pub async fn finalize_order(
    State(state): State<AppState>,
    caller: CurrentUser,
    Path(order_id): Path<OrderId>,
) -> Result<Json<OrderResponse>> {
    let order = transition(&state, &caller, order_id, OrderStatus::Finalized, "finalize").await?;
    Ok(Json(order))
}

/// Add a line item to a pending order; the order total updates atomically.
#[instrument(skip(state, caller, request), fields(caller_id = caller.id))]
pub async fn add_item(
    State(state): State<AppState>,
    caller: CurrentUser,
    Path(order_id): Path<OrderId>,
    Json(request): Json<OrderItemCreate>,
) -> Result<(StatusCode, Json<AddItemResponse>)> {
    if request.quantity < 1 {
        return Err(Error::BadRequest {
            message: "Item quantity must be at least 1".to_string(),
        });
    }
    if request.unit_price < 0.0 {
        return Err(Error::BadRequest {
            message: "Item unit price must not be negative".to_string(),
        });
    }

    let mut tx = state.db.begin().await.map_err(DbError::from)?;
    let mut orders = Orders::new(&mut tx);

    let order = get_order_or_404(&mut orders, order_id).await?;
    require_self_or_admin(&caller, order.user_id, "modify", format!("order {order_id}"))?;
    ensure_mutable(&order)?;

    let item = orders
        .add_item(
            order_id,
            &OrderItemCreateDBRequest {
                quantity: request.quantity,
                flavor: request.flavor,
                size: request.size,
                unit_price: request.unit_price,
            },
        )
        .await?;
    let order = get_order_or_404(&mut orders, order_id).await?;
    tx.commit().await.map_err(DbError::from)?;

    Ok((
        StatusCode::CREATED,
        Json(AddItemResponse {
            item_id: item.id,
            order: OrderResponse::from(order),
        }),
    ))
}

/// Remove a line item; the parent order's total updates atomically.
///
/// The item is addressed by its own id; the parent order is resolved from it
/// for the authorization and terminal-status checks.
#[instrument(skip(state, caller), fields(caller_id = caller.id))]
pub async fn remove_item(
    State(state): State<AppState>,
    caller: CurrentUser,
    Path(item_id): Path<OrderItemId>,
) -> Result<Json<RemoveItemResponse>> {
    let mut tx = state.db.begin().await.map_err(DbError::from)?;
    let mut orders = Orders::new(&mut tx);

    let item = orders.get_item(item_id).await?.ok_or(Error::NotFound {
        resource: "Order item",
        id: item_id.to_string(),
    })?;

    let order = get_order_or_404(&mut orders, item.order_id).await?;
    require_self_or_admin(&caller, order.user_id, "modify", format!("order {}", order.id))?;
    ensure_mutable(&order)?;

    orders.remove_item(order.id, item_id).await?;
    let remaining_items = orders.count_items(order.id).await?;
    let order = get_order_or_404(&mut orders, order.id).await?;
    tx.commit().await.map_err(DbError::from)?;

    Ok(Json(RemoveItemResponse {
        remaining_items,
        order: OrderResponse::from(order),
    }))
}

/// Delete an order outright; its line items go with it.
#[instrument(skip(state, caller), fields(caller_id = caller.id))]
pub async fn delete_order(
    State(state): State<AppState>,
    caller: CurrentUser,
    Path(order_id): Path<OrderId>,
) -> Result<StatusCode> {
    let mut tx = state.db.begin().await.map_err(DbError::from)?;
    let mut orders = Orders::new(&mut tx);

    let order = get_order_or_404(&mut orders, order_id).await?;
    require_self_or_admin(&caller, order.user_id, "delete", format!("order {order_id}"))?;

    orders.delete(order_id).await?;
    tx.commit().await.map_err(DbError::from)?;

    info!("Deleted order {}", order_id);
    Ok(StatusCode::NO_CONTENT)
}
