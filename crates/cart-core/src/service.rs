//! The cart aggregator (C9): add-to-cart fan-out, and the read/checkout
//! fan-out throttled by the rate limiter. Grounded on
//! `internals/service/cart_service.go`'s `SaveProductItem` and
//! `calculateTotal`, with the source's `errgrp.ErrGr` (launch N, wait for
//! all, cancel the rest on first error) replaced by `tokio::try_join!`
//! and `futures::future::try_join_all`, which give the same
//! cancel-on-first-error behavior within a single task: the still-
//! in-flight sibling futures are simply dropped.

use std::sync::Arc;

use crate::error::Error;
use crate::limiter::RateLimiter;
use crate::loms_client::OssProvider;
use crate::model::CartItem;
use crate::product_client::ProductProvider;
use crate::store::CartStore;

pub struct CartAggregator {
    products: Arc<dyn ProductProvider>,
    oss: Arc<dyn OssProvider>,
    store: CartStore,
    limiter: RateLimiter,
}

impl CartAggregator {
    pub fn new(
        products: Arc<dyn ProductProvider>,
        oss: Arc<dyn OssProvider>,
        store: CartStore,
        limiter: RateLimiter,
    ) -> Self {
        Self {
            products,
            oss,
            store,
            limiter,
        }
    }

    /// Fetches product info and available stock concurrently; the first
    /// of the two to fail aborts the other. Fails with
    /// [`Error::OutOfStock`] if the available count is short, otherwise
    /// upserts the line into the user's cart.
    pub async fn add_to_cart(&self, user_id: i64, sku_id: i64, count: u16) -> Result<(), Error> {
        let product_fut = self.products.get_product(sku_id);
        let stock_fut = self.oss.get_stock_info(sku_id);
        let (product, available) = tokio::try_join!(product_fut, stock_fut)?;

        if available < count as u64 {
            return Err(Error::OutOfStock);
        }

        self.store
            .add_item(user_id, sku_id, product.name, count)
            .await;
        Ok(())
    }

    pub async fn remove_from_cart(&self, user_id: i64, sku_id: i64) -> Result<(), Error> {
        self.store.remove_item(user_id, sku_id).await
    }

    pub async fn delete_cart(&self, user_id: i64) {
        self.store.delete_cart(user_id).await
    }

    /// Loads the user's lines, then concurrently enriches each with a
    /// catalog lookup throttled by the rate limiter, and returns the
    /// result sorted by `sku_id` ascending with the total price summed.
    pub async fn get_cart(&self, user_id: i64) -> Result<(u32, Vec<CartItem>), Error> {
        let lines = self.store.items(user_id).await?;

        let enriched = futures::future::try_join_all(lines.into_iter().map(
            |(sku_id, _name, count)| async move {
                self.limiter.wait().await;
                let product = self.products.get_product(sku_id).await?;
                Ok::<CartItem, Error>(CartItem {
                    sku_id,
                    name: product.name,
                    price: product.price,
                    count,
                })
            },
        ))
        .await?;

        let mut items = enriched;
        items.sort_by_key(|item| item.sku_id);
        let total = items
            .iter()
            .map(|item| item.price * item.count as u32)
            .sum();

        Ok((total, items))
    }

    /// Reads and enriches the cart, creates the order in OSS with the
    /// enriched item list, then clears the cart. Returns the new order
    /// id.
    pub async fn checkout(&self, user_id: i64) -> Result<i64, Error> {
        let (_, items) = self.get_cart(user_id).await?;
        let order_items = items.iter().map(|item| (item.sku_id, item.count)).collect();

        let order_id = self.oss.create_order(user_id, order_items).await?;
        self.store.delete_cart(user_id).await;
        Ok(order_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use crate::cache::ProductCache;
    use crate::model::ProductInfo;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    struct FakeProducts(HashMap<i64, ProductInfo>);

    #[async_trait]
    impl ProductProvider for FakeProducts {
        async fn get_product(&self, sku_id: i64) -> Result<ProductInfo, Error> {
            self.0.get(&sku_id).cloned().ok_or(Error::ProductNotFound)
        }
    }

    struct FakeOss {
        stock: Mutex<HashMap<i64, u64>>,
        next_order_id: Mutex<i64>,
    }

    #[async_trait]
    impl OssProvider for FakeOss {
        async fn create_order(&self, _user_id: i64, _items: Vec<(i64, u16)>) -> Result<i64, Error> {
            let mut next = self.next_order_id.lock().unwrap();
            *next += 1;
            Ok(*next)
        }

        async fn get_stock_info(&self, sku_id: i64) -> Result<u64, Error> {
            Ok(*self.stock.lock().unwrap().get(&sku_id).unwrap_or(&0))
        }
    }

    fn aggregator(products: HashMap<i64, ProductInfo>, stock: HashMap<i64, u64>) -> CartAggregator {
        CartAggregator::new(
            Arc::new(FakeProducts(products)),
            Arc::new(FakeOss {
                stock: Mutex::new(stock),
                next_order_id: Mutex::new(0),
            }),
            CartStore::new(),
            RateLimiter::new(Duration::from_secs(1), 10),
        )
    }

    #[tokio::test]
    async fn add_to_cart_out_of_stock_is_rejected() {
        let agg = aggregator(
            HashMap::from([(
                1002,
                ProductInfo {
                    name: "shoe".to_string(),
                    price: 100,
                },
            )]),
            HashMap::from([(1002, 0)]),
        );

        let err = agg.add_to_cart(2, 1002, 1).await.unwrap_err();
        assert!(matches!(err, Error::OutOfStock));
    }

    #[tokio::test]
    async fn get_cart_sorts_and_sums_total() {
        let agg = aggregator(
            HashMap::from([
                (
                    773297411,
                    ProductInfo {
                        name: "Кроссовки Nike JORDAN".to_string(),
                        price: 2202,
                    },
                ),
                (
                    100,
                    ProductInfo {
                        name: "socks".to_string(),
                        price: 50,
                    },
                ),
            ]),
            HashMap::from([(773297411, 100), (100, 100)]),
        );

        agg.add_to_cart(2, 773297411, 5).await.unwrap();
        agg.add_to_cart(2, 100, 2).await.unwrap();

        let (total, items) = agg.get_cart(2).await.unwrap();
        assert_eq!(items.iter().map(|i| i.sku_id).collect::<Vec<_>>(), vec![100, 773297411]);
        assert_eq!(total, 2202 * 5 + 50 * 2);
    }

    #[tokio::test]
    async fn checkout_creates_order_and_clears_cart() {
        let agg = aggregator(
            HashMap::from([(
                1002,
                ProductInfo {
                    name: "shoe".to_string(),
                    price: 180,
                },
            )]),
            HashMap::from([(1002, 180)]),
        );

        agg.add_to_cart(1, 1002, 1).await.unwrap();
        let order_id = agg.checkout(1).await.unwrap();
        assert_eq!(order_id, 1);

        assert!(matches!(agg.get_cart(1).await, Err(Error::UserNotFound)));
    }
}
