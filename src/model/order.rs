use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Lifecycle;
use crate::{Error, Result};

/// Fulfilment state of an order. Delivered and cancelled are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl Lifecycle for OrderStatus {
    const ENTITY: &'static str = "order";

    fn allows(self, next: Self) -> bool {
        matches!(
            (self, next),
            (OrderStatus::Pending, OrderStatus::Confirmed)
                | (OrderStatus::Pending, OrderStatus::Cancelled)
                | (OrderStatus::Confirmed, OrderStatus::Shipped)
                | (OrderStatus::Shipped, OrderStatus::Delivered)
        )
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "confirmed" => Ok(OrderStatus::Confirmed),
            "shipped" => Ok(OrderStatus::Shipped),
            "delivered" => Ok(OrderStatus::Delivered),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(Error::InvalidInput(format!("unknown order status '{}'", other))),
        }
    }
}

/// One line of an order. `total` is whatever the caller computed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: String,
    pub product_id: String,
    pub quantity: u32,
    pub price_per_unit: f64,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrderItem {
    pub product_id: String,
    pub quantity: u32,
    pub price_per_unit: f64,
    pub total: f64,
}

impl NewOrderItem {
    /// Builds a line with `total = quantity * price_per_unit`.
    pub fn priced(product_id: impl Into<String>, quantity: u32, price_per_unit: f64) -> Self {
        NewOrderItem {
            product_id: product_id.into(),
            quantity,
            price_per_unit,
            total: f64::from(quantity) * price_per_unit,
        }
    }

    pub(crate) fn into_item(self, id: String) -> OrderItem {
        OrderItem {
            id,
            product_id: self.product_id,
            quantity: self.quantity,
            price_per_unit: self.price_per_unit,
            total: self.total,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub customer_id: String,
    pub items: Vec<OrderItem>,
    pub total: f64,
    pub status: OrderStatus,
    pub shipping_address: String,
    pub created_at: DateTime<Utc>,
}

/// Caller-supplied order. Orders always start pending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    pub customer_id: String,
    pub items: Vec<NewOrderItem>,
    pub total: f64,
    pub shipping_address: String,
}

impl NewOrder {
    /// Builds an order whose total is the sum of its item totals.
    pub fn from_items(customer_id: impl Into<String>, items: Vec<NewOrderItem>, shipping_address: impl Into<String>) -> Self {
        let total = items.iter().map(|i| i.total).sum();
        NewOrder {
            customer_id: customer_id.into(),
            items,
            total,
            shipping_address: shipping_address.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fulfilment_transitions() {
        assert!(OrderStatus::Pending.transition(OrderStatus::Confirmed).is_ok());
        assert!(OrderStatus::Pending.transition(OrderStatus::Cancelled).is_ok());
        assert!(OrderStatus::Confirmed.transition(OrderStatus::Shipped).is_ok());
        assert!(OrderStatus::Shipped.transition(OrderStatus::Delivered).is_ok());

        assert!(OrderStatus::Pending.transition(OrderStatus::Delivered).is_err());
        assert!(OrderStatus::Delivered.transition(OrderStatus::Pending).is_err());
        assert!(OrderStatus::Cancelled.transition(OrderStatus::Confirmed).is_err());
    }

    #[test]
    fn test_from_items_sums_totals() {
        let order = NewOrder::from_items(
            "customer1",
            vec![NewOrderItem::priced("product1", 50, 12.0), NewOrderItem::priced("product2", 3, 8.0)],
            "Kabulonga, Lusaka",
        );
        assert_eq!(order.items[0].total, 600.0);
        assert_eq!(order.total, 624.0);
    }

    #[test]
    fn test_parse_status() {
        assert_eq!("shipped".parse::<OrderStatus>().unwrap(), OrderStatus::Shipped);
        assert!("lost".parse::<OrderStatus>().is_err());
    }
}
