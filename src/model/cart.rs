use serde::{Deserialize, Serialize};

use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartEntry {
    pub product_id: String,
    pub quantity: u32,
}

/// The session's shopping cart. Never persisted.
///
/// Entries are unique by product id; adding a product already in the cart grows its
/// quantity instead of adding a second line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cart {
    entries: Vec<CartEntry>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, product_id: &str, quantity: u32) -> Result<()> {
        if quantity == 0 {
            return Err(Error::InvalidInput("cart quantity must be positive".to_string()));
        }

        if let Some(entry) = self.entries.iter_mut().find(|e| e.product_id == product_id) {
            entry.quantity = entry.quantity.saturating_add(quantity);
            return Ok(());
        }

        self.entries.push(CartEntry {
            product_id: product_id.to_string(),
            quantity,
        });
        Ok(())
    }

    pub fn remove(&mut self, product_id: &str) {
        self.entries.retain(|e| e.product_id != product_id);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn entries(&self) -> &[CartEntry] {
        &self.entries
    }

    pub fn quantity_of(&self, product_id: &str) -> Option<u32> {
        self.entries
            .iter()
            .find(|e| e.product_id == product_id)
            .map(|e| e.quantity)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
