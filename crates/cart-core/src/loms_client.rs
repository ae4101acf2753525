//! HTTP client for the OSS order/stock service, grounded on
//! `internals/clients/loms_client.go` (the gRPC client this design
//! distilled its retry/timeout shape from). Non-goals exclude committing
//! protobuf/gRPC wire framing to this repo (spec.md §1), so this rewrite
//! speaks the same JSON surface `oss-service` exposes over HTTP instead
//! (see SPEC_FULL.md §6).

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Error;

#[async_trait]
pub trait OssProvider: Send + Sync {
    async fn create_order(&self, user_id: i64, items: Vec<(i64, u16)>) -> Result<i64, Error>;
    async fn get_stock_info(&self, sku_id: i64) -> Result<u64, Error>;
}

pub struct OssClient {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Serialize)]
struct OrderItemWire {
    sku_id: i64,
    count: u16,
}

#[derive(Serialize)]
struct CreateOrderRequest {
    user: i64,
    items: Vec<OrderItemWire>,
}

#[derive(Deserialize)]
struct CreateOrderResponse {
    order_id: i64,
}

#[derive(Deserialize)]
struct StocksInfoResponse {
    count: u64,
}

impl OssClient {
    pub fn new(base_url: String) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .expect("reqwest client config is valid");

        Self { http, base_url }
    }

    async fn error_for_status(response: reqwest::Response) -> Error {
        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        match status.as_u16() {
            // OSS maps only PRODUCTS_OUT_OF_STOCK/EXCEEDS_RESERVED_AMOUNT to
            // 412; every other error kind, including ORDER_NOT_FOUND,
            // surfaces as 500 (spec.md §6's literal error mapping table).
            412 => Error::OutOfStock,
            _ => Error::Upstream(format!("oss returned {status}: {body}")),
        }
    }
}

#[async_trait]
impl OssProvider for OssClient {
    async fn create_order(&self, user_id: i64, items: Vec<(i64, u16)>) -> Result<i64, Error> {
        let request = CreateOrderRequest {
            user: user_id,
            items: items
                .into_iter()
                .map(|(sku_id, count)| OrderItemWire { sku_id, count })
                .collect(),
        };

        let response = self
            .http
            .post(format!("{}/order/create", self.base_url))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_for_status(response).await);
        }

        let parsed: CreateOrderResponse = response.json().await?;
        Ok(parsed.order_id)
    }

    async fn get_stock_info(&self, sku_id: i64) -> Result<u64, Error> {
        let response = self
            .http
            .get(format!("{}/stocks/{}", self.base_url, sku_id))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_for_status(response).await);
        }

        let parsed: StocksInfoResponse = response.json().await?;
        Ok(parsed.count)
    }
}
