//! Volatile, per-process cart storage (spec.md §3's `CartLine`), grounded
//! on `InMemoryCartStorage` from the source this design was distilled
//! from: a user's cart is a map of `sku_id -> count`, plus a
//! process-wide remembered `name` per SKU so a cart line can be read back
//! without re-querying the catalog.

use std::collections::HashMap;

use tokio::sync::RwLock;

use crate::error::Error;

struct Line {
    name: String,
    count: u16,
}

#[derive(Default)]
pub struct CartStore {
    carts: RwLock<HashMap<i64, HashMap<i64, Line>>>,
}

impl CartStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `count` to the `(user_id, sku_id)` line, creating it (and
    /// remembering `name`) if it doesn't exist yet.
    pub async fn add_item(&self, user_id: i64, sku_id: i64, name: String, count: u16) {
        let mut carts = self.carts.write().await;
        let cart = carts.entry(user_id).or_default();
        match cart.get_mut(&sku_id) {
            Some(line) => line.count += count,
            None => {
                cart.insert(sku_id, Line { name, count });
            }
        }
    }

    /// Removes a line outright. Unlike the source this was distilled
    /// from, a user with no cart at all is reported as
    /// [`Error::UserNotFound`] rather than silently succeeding, matching
    /// spec.md's error taxonomy for a missing user.
    pub async fn remove_item(&self, user_id: i64, sku_id: i64) -> Result<(), Error> {
        let mut carts = self.carts.write().await;
        let cart = carts.get_mut(&user_id).ok_or(Error::UserNotFound)?;
        cart.remove(&sku_id);
        Ok(())
    }

    pub async fn delete_cart(&self, user_id: i64) {
        self.carts.write().await.remove(&user_id);
    }

    /// Returns every `(sku_id, name, count)` line for the user, sorted by
    /// `sku_id` ascending (spec.md §8 property 5).
    ///
    /// A user with no cart at all is [`Error::UserNotFound`]; a user with
    /// a cart that has been emptied out (every line removed, or never
    /// populated) is [`Error::UserCartEmpty`].
    pub async fn items(&self, user_id: i64) -> Result<Vec<(i64, String, u16)>, Error> {
        let carts = self.carts.read().await;
        let cart = carts.get(&user_id).ok_or(Error::UserNotFound)?;
        if cart.is_empty() {
            return Err(Error::UserCartEmpty);
        }

        let mut items: Vec<(i64, String, u16)> = cart
            .iter()
            .map(|(sku_id, line)| (*sku_id, line.name.clone(), line.count))
            .collect();
        items.sort_by_key(|(sku_id, _, _)| *sku_id);
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn add_item_accumulates_count() {
        let store = CartStore::new();
        store.add_item(1, 1002, "shoe".to_string(), 2).await;
        store.add_item(1, 1002, "shoe".to_string(), 3).await;

        let items = store.items(1).await.unwrap();
        assert_eq!(items, vec![(1002, "shoe".to_string(), 5)]);
    }

    #[tokio::test]
    async fn items_sorted_ascending_by_sku() {
        let store = CartStore::new();
        store.add_item(2, 500, "b".to_string(), 1).await;
        store.add_item(2, 100, "a".to_string(), 1).await;

        let items = store.items(2).await.unwrap();
        assert_eq!(items.iter().map(|i| i.0).collect::<Vec<_>>(), vec![100, 500]);
    }

    #[tokio::test]
    async fn unknown_user_is_not_found() {
        let store = CartStore::new();
        assert!(matches!(store.items(99).await, Err(Error::UserNotFound)));
    }

    #[tokio::test]
    async fn emptied_cart_is_empty_not_not_found() {
        let store = CartStore::new();
        store.add_item(3, 1, "x".to_string(), 1).await;
        store.remove_item(3, 1).await.unwrap();
        assert!(matches!(store.items(3).await, Err(Error::UserCartEmpty)));
    }
}
