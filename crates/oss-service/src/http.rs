//! JSON RPC surface for OSS's six order/stock operations (spec.md §6).
//!
//! Non-goals exclude committing protobuf/gRPC wire-framing code to this
//! repo (spec.md §1: "Deliberately out of scope ... protobuf
//! generation"), so the `Order` RPC service is exposed as an
//! `axum::Router` instead of a hand-rolled tonic codec, reusing the same
//! HTTP stack `cart-service` uses. The underlying `OrderService` trait
//! (oss-core) is transport-agnostic, so a tonic front end could be
//! grafted on later without touching the state machine.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use oss_core::OrderService;
use oss_domain::{Error, Order, OrderItem, OrderStatus};
use serde::{Deserialize, Serialize};

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<dyn OrderService>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/order/create", post(create_order))
        .route("/order/:order_id", get(get_order))
        .route("/order/:order_id/pay", post(pay_order))
        .route("/order/:order_id/cancel", post(cancel_order))
        .route("/orders/list", post(list_orders))
        .route("/stocks/:sku_id", get(stocks_info))
        .with_state(state)
}

#[derive(Deserialize)]
struct OrderItemWire {
    sku_id: i64,
    count: i64,
}

#[derive(Serialize)]
struct OrderItemOut {
    sku_id: i64,
    count: i64,
}

impl From<OrderItem> for OrderItemOut {
    fn from(item: OrderItem) -> Self {
        Self {
            sku_id: item.sku_id,
            count: item.count,
        }
    }
}

#[derive(Deserialize)]
struct CreateOrderRequest {
    user: i64,
    items: Vec<OrderItemWire>,
}

#[derive(Serialize)]
struct CreateOrderResponse {
    order_id: i64,
}

async fn create_order(
    State(state): State<AppState>,
    Json(request): Json<CreateOrderRequest>,
) -> Result<Json<CreateOrderResponse>, ApiError> {
    let items = request
        .items
        .into_iter()
        .map(|item| OrderItem {
            sku_id: item.sku_id,
            count: item.count,
        })
        .collect();

    let order_id = state.service.create_order(request.user, items).await?;
    Ok(Json(CreateOrderResponse { order_id }))
}

#[derive(Serialize)]
struct OrderResponse {
    status: OrderStatus,
    user: i64,
    items: Vec<OrderItemOut>,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        Self {
            status: order.status,
            user: order.user_id,
            items: order.items.into_iter().map(OrderItemOut::from).collect(),
        }
    }
}

async fn get_order(
    State(state): State<AppState>,
    Path(order_id): Path<i64>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order = state.service.get_order(order_id).await?;
    Ok(Json(order.into()))
}

async fn pay_order(
    State(state): State<AppState>,
    Path(order_id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.service.pay_order(order_id).await?;
    Ok(StatusCode::OK)
}

async fn cancel_order(
    State(state): State<AppState>,
    Path(order_id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.service.cancel_order(order_id).await?;
    Ok(StatusCode::OK)
}

#[derive(Deserialize)]
struct OrdersListRequest {
    order_ids: Vec<i64>,
}

#[derive(Serialize)]
struct OrdersListResponse {
    orders: Vec<OrderResponse>,
}

async fn list_orders(
    State(state): State<AppState>,
    Json(request): Json<OrdersListRequest>,
) -> Result<Json<OrdersListResponse>, ApiError> {
    let orders = state.service.get_orders(&request.order_ids).await?;
    Ok(Json(OrdersListResponse {
        orders: orders.into_iter().map(OrderResponse::from).collect(),
    }))
}

#[derive(Serialize)]
struct StocksInfoResponse {
    count: i64,
}

async fn stocks_info(
    State(state): State<AppState>,
    Path(sku_id): Path<i64>,
) -> Result<Json<StocksInfoResponse>, ApiError> {
    let count = state.service.available_stocks(sku_id).await?;
    Ok(Json(StocksInfoResponse { count }))
}

/// Wraps `oss_domain::Error` so it can be returned directly from a
/// handler. Only `PRODUCTS_OUT_OF_STOCK`/`EXCEEDS_RESERVED_AMOUNT` map to
/// 412; everything else maps to 500, matching spec.md §6's literal gRPC
/// error-mapping table translated to the nearest HTTP status.
struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            Error::ProductsOutOfStock | Error::ExceedsReservedAmount => {
                StatusCode::PRECONDITION_FAILED
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.0.to_string()).into_response()
    }
}
