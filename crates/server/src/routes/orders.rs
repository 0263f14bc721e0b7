//! Order route handlers: placement, buyer and seller views, and the status
//! lifecycle.

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::instrument;

use shopmate_core::{BusinessId, OrderId, OrderStatus};

use crate::db::OrderRepository;
use crate::error::{AppError, Result};
use crate::middleware::{RequireAuth, RequireBuyer, RequireSeller};
use crate::response::{ApiResponse, Created};
use crate::services::{OrderLine, OrderService};
use crate::state::AppState;

/// Order placement request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderBody {
    pub business_id: BusinessId,
    pub items: Vec<OrderLine>,
}

/// Status update request body.
#[derive(Debug, Deserialize)]
pub struct UpdateStatusBody {
    pub status: OrderStatus,
}

/// Place an order against one business.
#[instrument(skip_all, fields(user_id = %user.id, business_id = %body.business_id))]
pub async fn create(
    State(state): State<AppState>,
    RequireBuyer(user): RequireBuyer,
    Json(body): Json<CreateOrderBody>,
) -> Result<impl IntoResponse> {
    let order = OrderService::new(state.pool())
        .create_order(user.id, body.business_id, &body.items)
        .await?;

    Ok(Created(ApiResponse::data(order)))
}

/// The caller's orders as a buyer, newest first.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn list(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<impl IntoResponse> {
    let orders = OrderRepository::new(state.pool())
        .list_for_buyer(user.id)
        .await?;

    Ok(ApiResponse::data(orders))
}

/// One order in full. Only the buyer and the seller party may look.
#[instrument(skip_all, fields(user_id = %user.id, order_id = %id))]
pub async fn get(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<OrderId>,
) -> Result<impl IntoResponse> {
    let detail = OrderRepository::new(state.pool())
        .get_detail(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Order not found".to_owned()))?;

    if detail.order.buyer_id != user.id && detail.order.seller_id != user.id {
        return Err(AppError::Forbidden(
            "You are not a party to this order".to_owned(),
        ));
    }

    Ok(ApiResponse::data(detail))
}

/// Incoming orders for the calling seller, newest first, with buyer identity.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn list_for_seller(
    State(state): State<AppState>,
    RequireSeller(user): RequireSeller,
) -> Result<impl IntoResponse> {
    let orders = OrderRepository::new(state.pool())
        .list_for_seller(user.id)
        .await?;

    Ok(ApiResponse::data(orders))
}

/// Advance an order through its status lifecycle. Only the order's seller
/// may do this, and only along legal transitions.
#[instrument(skip_all, fields(user_id = %user.id, order_id = %id, status = %body.status))]
pub async fn update_status(
    State(state): State<AppState>,
    RequireSeller(user): RequireSeller,
    Path(id): Path<OrderId>,
    Json(body): Json<UpdateStatusBody>,
) -> Result<impl IntoResponse> {
    let repo = OrderRepository::new(state.pool());

    let order = repo
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Order not found".to_owned()))?;

    if order.seller_id != user.id {
        return Err(AppError::Forbidden(
            "You are not the seller of this order".to_owned(),
        ));
    }

    if !order.status.can_transition_to(body.status) {
        return Err(AppError::Validation(format!(
            "Cannot change order status from {} to {}",
            order.status, body.status
        )));
    }

    let order = repo.update_status(id, body.status).await?;
    Ok(ApiResponse::data(order))
}
