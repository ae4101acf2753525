//! Cart HTTP API (spec.md §6), grounded on
//! `cart/internals/transport/handler.go`'s five routes and
//! `validation.go`'s path/body checks, restyled as an `axum::Router`.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use cart_core::{CartAggregator, Error};
use serde::{Deserialize, Serialize};

#[derive(Clone)]
pub struct AppState {
    pub aggregator: Arc<CartAggregator>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/user/:user_id/cart/:sku_id", post(add_product))
        .route("/user/:user_id/cart/:sku_id", delete(remove_product))
        .route("/user/:user_id/cart", delete(delete_cart))
        .route("/user/:user_id/cart", get(get_cart))
        .route("/cart/checkout", post(checkout))
        .with_state(state)
}

#[derive(Deserialize)]
struct AddProductRequest {
    count: u16,
}

async fn add_product(
    State(state): State<AppState>,
    Path((user_id, sku_id)): Path<(i64, i64)>,
    body: Result<Json<AddProductRequest>, axum::extract::rejection::JsonRejection>,
) -> Response {
    let Json(request) = match body {
        Ok(json) => json,
        Err(err) => return (StatusCode::BAD_REQUEST, err.to_string()).into_response(),
    };

    if request.count == 0 {
        return (StatusCode::BAD_REQUEST, "product count must not be 0").into_response();
    }

    match state
        .aggregator
        .add_to_cart(user_id, sku_id, request.count)
        .await
    {
        Ok(()) => StatusCode::OK.into_response(),
        Err(err) => {
            let status = match &err {
                Error::ProductNotFound => StatusCode::NOT_FOUND,
                Error::OutOfStock => StatusCode::PRECONDITION_FAILED,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            (status, err.to_string()).into_response()
        }
    }
}

async fn remove_product(
    State(state): State<AppState>,
    Path((user_id, sku_id)): Path<(i64, i64)>,
) -> Response {
    // The source this was distilled from never special-cases this route's
    // errors (`deleteProductHandler` maps anything to 500), so a missing
    // cart surfaces the same way here rather than as 404.
    match state.aggregator.remove_from_cart(user_id, sku_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response(),
    }
}

async fn delete_cart(State(state): State<AppState>, Path(user_id): Path<i64>) -> Response {
    state.aggregator.delete_cart(user_id).await;
    StatusCode::NO_CONTENT.into_response()
}

#[derive(Serialize)]
struct CartItemOut {
    sku_id: i64,
    name: String,
    price: u32,
    count: u16,
}

#[derive(Serialize)]
struct GetCartResponse {
    total_price: u32,
    items: Vec<CartItemOut>,
}

async fn get_cart(State(state): State<AppState>, Path(user_id): Path<i64>) -> Response {
    match state.aggregator.get_cart(user_id).await {
        Ok((total_price, items)) => {
            let items = items
                .into_iter()
                .map(|item| CartItemOut {
                    sku_id: item.sku_id,
                    name: item.name,
                    price: item.price,
                    count: item.count,
                })
                .collect();
            Json(GetCartResponse { total_price, items }).into_response()
        }
        Err(err) => {
            let status = match &err {
                Error::UserNotFound | Error::UserCartEmpty => StatusCode::NOT_FOUND,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            (status, err.to_string()).into_response()
        }
    }
}

#[derive(Deserialize)]
struct CheckoutRequest {
    user: i64,
}

#[derive(Serialize)]
struct CheckoutResponse {
    #[serde(rename = "orderID")]
    order_id: i64,
}

async fn checkout(
    State(state): State<AppState>,
    Json(request): Json<CheckoutRequest>,
) -> Response {
    // Matches `checkoutHandler`: every failure along the
    // get-cart/create-order/delete-cart chain maps to 500.
    match state.aggregator.checkout(request.user).await {
        Ok(order_id) => Json(CheckoutResponse { order_id }).into_response(),
        Err(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response(),
    }
}
