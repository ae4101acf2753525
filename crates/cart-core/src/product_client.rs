//! HTTP client for the third-party product catalog, fronted by the TTL
//! cache (spec.md §4.9.2). Grounded on
//! `internals/clients/product_client.go`: same request shape
//! (`{"token", "sku"}` against a fixed `/get_product` path, kept here as
//! a configurable base URL), same 404 -> not-found mapping, same
//! retry-on-429/420 policy capped at 3 total attempts.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::cache::ProductCache;
use crate::error::Error;
use crate::model::ProductInfo;

const MAX_ATTEMPTS: u32 = 3;

#[async_trait]
pub trait ProductProvider: Send + Sync {
    async fn get_product(&self, sku_id: i64) -> Result<ProductInfo, Error>;
}

pub struct ProductClient {
    http: reqwest::Client,
    cache: ProductCache,
    base_url: String,
    token: String,
}

#[derive(Serialize)]
struct ProductRequest<'a> {
    token: &'a str,
    sku: i64,
}

#[derive(Deserialize)]
struct ProductResponse {
    name: String,
    price: u32,
}

impl ProductClient {
    pub fn new(base_url: String, token: String, cache: ProductCache, timeout: Duration) -> Self {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("reqwest client config is valid");

        Self {
            http,
            cache,
            base_url,
            token,
        }
    }

    async fn fetch(&self, sku_id: i64) -> Result<Vec<u8>, Error> {
        let url = format!("{}/get_product", self.base_url);
        let body = ProductRequest {
            token: &self.token,
            sku: sku_id,
        };

        for attempt in 0..MAX_ATTEMPTS {
            let response = self.http.post(&url).json(&body).send().await?;
            let status = response.status().as_u16();

            if status == 429 || status == 420 {
                if attempt + 1 == MAX_ATTEMPTS {
                    return Err(Error::UpstreamUnavailable);
                }
                continue;
            }

            if status == 404 {
                return Err(Error::ProductNotFound);
            }

            if status != 200 {
                return Err(Error::Upstream(format!(
                    "failed to get product info: status code {status}"
                )));
            }

            return Ok(response.bytes().await?.to_vec());
        }

        Err(Error::UpstreamUnavailable)
    }
}

#[async_trait]
impl ProductProvider for ProductClient {
    async fn get_product(&self, sku_id: i64) -> Result<ProductInfo, Error> {
        let key = sku_id.to_string();

        if let Some(cached) = self.cache.get(&key).await {
            let parsed: ProductResponse = serde_json::from_slice(&cached)?;
            return Ok(ProductInfo {
                name: parsed.name,
                price: parsed.price,
            });
        }

        let body = self.fetch(sku_id).await?;
        let parsed: ProductResponse = serde_json::from_slice(&body)?;
        self.cache.add(key, body).await;

        Ok(ProductInfo {
            name: parsed.name,
            price: parsed.price,
        })
    }
}
