//! Aggregates behind the dashboard, analytics and farm comparison views.
//!
//! Everything here is a pure function of a [`Collections`] snapshot.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::engine::Collections;
use crate::model::{ProductStatus, Role, User};

/// Headline numbers for the signed-in user's dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum DashboardStats {
    #[serde(rename_all = "camelCase")]
    Farmer {
        farms: usize,
        crops: usize,
        products_listed: usize,
        /// Totals of every order that contains one of the farmer's products.
        revenue: f64,
    },
    #[serde(rename_all = "camelCase")]
    Customer {
        orders: usize,
        total_spent: f64,
        available_products: usize,
    },
    #[serde(rename_all = "camelCase")]
    Admin {
        farms: usize,
        users: usize,
        approved_products: usize,
        platform_revenue: f64,
    },
}

pub fn dashboard(data: &Collections, user: &User) -> DashboardStats {
    let approved = data.products_with_status(ProductStatus::Approved).count();
    match user.role {
        Role::Farmer => DashboardStats::Farmer {
            farms: data.farms_for_farmer(&user.id).count(),
            crops: data.crops_for_farmer(&user.id).count(),
            products_listed: data.products_for_farmer(&user.id).count(),
            revenue: data.orders_for_farmer(&user.id).map(|o| o.total).sum(),
        },
        Role::Customer => {
            let orders: Vec<_> = data.orders_for_customer(&user.id).collect();
            DashboardStats::Customer {
                orders: orders.len(),
                total_spent: orders.iter().map(|o| o.total).sum(),
                available_products: approved,
            }
        }
        Role::Admin => DashboardStats::Admin {
            farms: data.farms.len(),
            users: data.users.len(),
            approved_products: approved,
            platform_revenue: total_revenue(data),
        },
    }
}

pub fn total_revenue(data: &Collections) -> f64 {
    data.orders.iter().map(|o| o.total).sum()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CropTypeShare {
    pub crop_type: String,
    pub count: usize,
    pub area: f64,
}

/// Count and planted area per crop type, in order of first appearance.
pub fn crop_breakdown(data: &Collections) -> Vec<CropTypeShare> {
    let mut shares: Vec<CropTypeShare> = Vec::new();
    for crop in &data.crops {
        match shares.iter_mut().find(|s| s.crop_type == crop.crop_type) {
            Some(share) => {
                share.count += 1;
                share.area += crop.area;
            }
            None => shares.push(CropTypeShare {
                crop_type: crop.crop_type.clone(),
                count: 1,
                area: crop.area,
            }),
        }
    }
    shares
}

/// Number of farms per province, keyed by the last segment of each farm's location.
pub fn farms_by_province(data: &Collections) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for farm in &data.farms {
        *counts.entry(farm.province().to_string()).or_insert(0) += 1;
    }
    counts
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRevenue {
    pub product_id: String,
    pub name: String,
    pub revenue: f64,
}

/// Sales per product across all orders. Products that never sold are left out.
///
/// Only the first line for a product in each order counts; later duplicate lines in
/// the same order are ignored.
pub fn product_revenue(data: &Collections) -> Vec<ProductRevenue> {
    data.products
        .iter()
        .map(|product| ProductRevenue {
            product_id: product.id.clone(),
            name: product.name.clone(),
            revenue: data
                .orders
                .iter()
                .filter_map(|o| o.items.iter().find(|i| i.product_id == product.id))
                .map(|i| i.total)
                .sum(),
        })
        .filter(|p| p.revenue > 0.0)
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FarmComparison {
    pub farm_id: String,
    pub name: String,
    pub size: f64,
    pub crops: usize,
    pub products: usize,
    pub crop_area: f64,
}

/// Side-by-side figures for the selected farms, in the order given.
///
/// An unknown id yields an "Unknown" row of size zero.
pub fn compare_farms(data: &Collections, farm_ids: &[&str]) -> Vec<FarmComparison> {
    farm_ids
        .iter()
        .map(|&farm_id| {
            let farm = data.farm(farm_id);
            let crops: Vec<_> = data.crops.iter().filter(|c| c.farm_id == farm_id).collect();
            FarmComparison {
                farm_id: farm_id.to_string(),
                name: farm.map_or_else(|| "Unknown".to_string(), |f| f.name.clone()),
                size: farm.map_or(0.0, |f| f.size),
                crops: crops.len(),
                products: data.products.iter().filter(|p| p.farm_id == farm_id).count(),
                crop_area: crops.iter().map(|c| c.area).sum(),
            }
        })
        .collect()
}
