use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Lifecycle;
use crate::{Error, Result};

/// Review state of a marketplace listing.
///
/// New listings wait for an admin; approved listings can sell out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
    Pending,
    Approved,
    Rejected,
    Sold,
}

impl ProductStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            ProductStatus::Pending => "pending",
            ProductStatus::Approved => "approved",
            ProductStatus::Rejected => "rejected",
            ProductStatus::Sold => "sold",
        }
    }
}

impl Lifecycle for ProductStatus {
    const ENTITY: &'static str = "product";

    fn allows(self, next: Self) -> bool {
        matches!(
            (self, next),
            (ProductStatus::Pending, ProductStatus::Approved)
                | (ProductStatus::Pending, ProductStatus::Rejected)
                | (ProductStatus::Approved, ProductStatus::Sold)
        )
    }
}

impl fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProductStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(ProductStatus::Pending),
            "approved" => Ok(ProductStatus::Approved),
            "rejected" => Ok(ProductStatus::Rejected),
            "sold" => Ok(ProductStatus::Sold),
            other => Err(Error::InvalidInput(format!("unknown product status '{}'", other))),
        }
    }
}

/// Produce a farmer offers on the marketplace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub farmer_id: String,
    pub farm_id: String,
    pub crop_id: String,
    pub name: String,
    pub category: String,
    pub quantity: f64,
    pub unit: String,
    pub price_per_unit: f64,
    pub description: String,
    pub image: String,
    pub status: ProductStatus,
    pub location: String,
    pub created_at: DateTime<Utc>,
}

/// Caller-supplied listing fields. Status is not among them: listings start pending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub farmer_id: String,
    pub farm_id: String,
    pub crop_id: String,
    pub name: String,
    pub category: String,
    pub quantity: f64,
    pub unit: String,
    pub price_per_unit: f64,
    pub description: String,
    pub image: String,
    pub location: String,
}

impl NewProduct {
    pub(crate) fn into_product(self, id: String, created_at: DateTime<Utc>) -> Product {
        Product {
            id,
            farmer_id: self.farmer_id,
            farm_id: self.farm_id,
            crop_id: self.crop_id,
            name: self.name,
            category: self.category,
            quantity: self.quantity,
            unit: self.unit,
            price_per_unit: self.price_per_unit,
            description: self.description,
            image: self.image,
            status: ProductStatus::Pending,
            location: self.location,
            created_at,
        }
    }
}

/// Listing edits a farmer can make. Status moves go through the review operations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPatch {
    pub farm_id: Option<String>,
    pub crop_id: Option<String>,
    pub name: Option<String>,
    pub category: Option<String>,
    pub quantity: Option<f64>,
    pub unit: Option<String>,
    pub price_per_unit: Option<f64>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub location: Option<String>,
}

impl ProductPatch {
    pub fn apply(self, product: &mut Product) {
        if let Some(farm_id) = self.farm_id {
            product.farm_id = farm_id;
        }
        if let Some(crop_id) = self.crop_id {
            product.crop_id = crop_id;
        }
        if let Some(name) = self.name {
            product.name = name;
        }
        if let Some(category) = self.category {
            product.category = category;
        }
        if let Some(quantity) = self.quantity {
            product.quantity = quantity;
        }
        if let Some(unit) = self.unit {
            product.unit = unit;
        }
        if let Some(price) = self.price_per_unit {
            product.price_per_unit = price;
        }
        if let Some(description) = self.description {
            product.description = description;
        }
        if let Some(image) = self.image {
            product.image = image;
        }
        if let Some(location) = self.location {
            product.location = location;
        }
    }
}
