//! The demo dataset a fresh store starts from.
//!
//! A collection with no persisted value is filled from here, one collection at a time.

use chrono::{DateTime, NaiveDate, Utc};

use crate::engine::Collections;
use crate::model::*;

const AVATAR: &str = "https://images.pexels.com/photos/1516680/pexels-photo-1516680.jpeg?auto=compress&cs=tinysrgb&w=150&h=150&dpr=1";

fn at(ts: &str) -> DateTime<Utc> {
    ts.parse().unwrap_or(DateTime::<Utc>::MIN_UTC)
}

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or(NaiveDate::MIN)
}

fn user(id: &str, name: &str, email: &str, phone: &str, role: Role, location: &str, created_at: &str) -> User {
    User {
        id: id.into(),
        name: name.into(),
        email: email.into(),
        phone: phone.into(),
        role,
        location: location.into(),
        avatar: Some(AVATAR.into()),
        created_at: at(created_at),
    }
}

pub fn users() -> Vec<User> {
    vec![
        user("admin1", "Admin User", "admin@ulimi.com", "+260 977 123456", Role::Admin, "Lusaka", "2024-01-01T00:00:00Z"),
        user("farmer1", "Joseph Mwanza", "joseph@farmer.com", "+260 955 789123", Role::Farmer, "Lusaka Province", "2024-01-15T10:30:00Z"),
        user("farmer2", "Mary Banda", "mary@farmer.com", "+260 966 456789", Role::Farmer, "Copperbelt Province", "2024-01-20T14:15:00Z"),
        user("customer1", "Peter Sakala", "peter@customer.com", "+260 977 321654", Role::Customer, "Lusaka", "2024-02-01T09:00:00Z"),
        user("customer2", "Grace Mulenga", "grace@customer.com", "+260 955 987654", Role::Customer, "Ndola", "2024-02-05T11:30:00Z"),
    ]
}

pub fn farms() -> Vec<Farm> {
    vec![
        Farm {
            id: "farm1".into(),
            name: "Mwanza Family Farm".into(),
            farmer_id: "farmer1".into(),
            location: "Chongwe District, Lusaka".into(),
            size: 25.0,
            soil_type: "Clay loam".into(),
            coordinates: Coordinates { lat: -15.7942, lng: 28.6423 },
            created_at: at("2024-01-15T10:30:00Z"),
        },
        Farm {
            id: "farm2".into(),
            name: "Green Valley Farm".into(),
            farmer_id: "farmer1".into(),
            location: "Kafue District, Lusaka".into(),
            size: 40.0,
            soil_type: "Sandy loam".into(),
            coordinates: Coordinates { lat: -15.7694, lng: 28.1814 },
            created_at: at("2024-02-01T08:00:00Z"),
        },
        Farm {
            id: "farm3".into(),
            name: "Banda Organic Farm".into(),
            farmer_id: "farmer2".into(),
            location: "Kitwe District, Copperbelt".into(),
            size: 15.0,
            soil_type: "Loamy".into(),
            coordinates: Coordinates { lat: -12.8024, lng: 28.2132 },
            created_at: at("2024-01-20T14:15:00Z"),
        },
    ]
}

pub fn crops() -> Vec<Crop> {
    vec![
        Crop {
            id: "crop1".into(),
            farm_id: "farm1".into(),
            crop_type: "Maize".into(),
            variety: "SC627".into(),
            planting_date: day(2024, 11, 15),
            expected_harvest: day(2025, 4, 15),
            status: CropStatus::Growing,
            area: 10.0,
            inputs: vec![CropInput {
                id: "input1".into(),
                input_type: InputType::Fertilizer,
                name: "NPK 10:20:10".into(),
                amount: 50.0,
                unit: "kg".into(),
                cost: 1250.0,
                date: day(2024, 11, 20),
            }],
            harvest_yield: None,
        },
        Crop {
            id: "crop2".into(),
            farm_id: "farm1".into(),
            crop_type: "Tomatoes".into(),
            variety: "Roma".into(),
            planting_date: day(2024, 10, 1),
            expected_harvest: day(2024, 12, 15),
            status: CropStatus::Flowering,
            area: 5.0,
            inputs: vec![CropInput {
                id: "input2".into(),
                input_type: InputType::Pesticide,
                name: "Fungicide".into(),
                amount: 2.0,
                unit: "liters".into(),
                cost: 400.0,
                date: day(2024, 11, 1),
            }],
            harvest_yield: None,
        },
        Crop {
            id: "crop3".into(),
            farm_id: "farm3".into(),
            crop_type: "Cabbage".into(),
            variety: "Green Express".into(),
            planting_date: day(2024, 9, 1),
            expected_harvest: day(2024, 12, 1),
            status: CropStatus::Harvesting,
            area: 8.0,
            inputs: vec![],
            harvest_yield: None,
        },
    ]
}

pub fn products() -> Vec<Product> {
    vec![
        Product {
            id: "product1".into(),
            farmer_id: "farmer1".into(),
            farm_id: "farm1".into(),
            crop_id: "crop2".into(),
            name: "Fresh Roma Tomatoes".into(),
            category: "Vegetables".into(),
            quantity: 500.0,
            unit: "kg".into(),
            price_per_unit: 12.0,
            description: "Fresh, organic Roma tomatoes perfect for cooking".into(),
            image: "https://images.pexels.com/photos/533280/pexels-photo-533280.jpeg?auto=compress&cs=tinysrgb&w=400&h=300&dpr=1".into(),
            status: ProductStatus::Approved,
            location: "Chongwe District, Lusaka".into(),
            created_at: at("2024-11-01T10:00:00Z"),
        },
        Product {
            id: "product2".into(),
            farmer_id: "farmer2".into(),
            farm_id: "farm3".into(),
            crop_id: "crop3".into(),
            name: "Organic Cabbage".into(),
            category: "Vegetables".into(),
            quantity: 200.0,
            unit: "kg".into(),
            price_per_unit: 8.0,
            description: "Organically grown green cabbage, chemical-free".into(),
            image: "https://images.pexels.com/photos/2255935/pexels-photo-2255935.jpeg?auto=compress&cs=tinysrgb&w=400&h=300&dpr=1".into(),
            status: ProductStatus::Approved,
            location: "Kitwe District, Copperbelt".into(),
            created_at: at("2024-11-05T14:30:00Z"),
        },
        // Listed against farm2 but made from crop1, which grows on farm1.
        Product {
            id: "product3".into(),
            farmer_id: "farmer1".into(),
            farm_id: "farm2".into(),
            crop_id: "crop1".into(),
            name: "White Maize".into(),
            category: "Grains".into(),
            quantity: 1000.0,
            unit: "kg".into(),
            price_per_unit: 6.0,
            description: "High-quality white maize for immediate delivery".into(),
            image: "https://images.pexels.com/photos/547263/pexels-photo-547263.jpeg?auto=compress&cs=tinysrgb&w=400&h=300&dpr=1".into(),
            status: ProductStatus::Pending,
            location: "Kafue District, Lusaka".into(),
            created_at: at("2024-11-10T09:15:00Z"),
        },
    ]
}

pub fn orders() -> Vec<Order> {
    vec![Order {
        id: "order1".into(),
        customer_id: "customer1".into(),
        items: vec![OrderItem {
            id: "item1".into(),
            product_id: "product1".into(),
            quantity: 50,
            price_per_unit: 12.0,
            total: 600.0,
        }],
        total: 600.0,
        status: OrderStatus::Confirmed,
        shipping_address: "Kabulonga, Lusaka".into(),
        created_at: at("2024-11-08T16:45:00Z"),
    }]
}

/// Sensor readings stamped with `now`, the moment the store is created.
pub fn sensors(now: DateTime<Utc>) -> Vec<IoTSensor> {
    let sensor = |id: &str, farm_id: &str, sensor_type, name: &str, value, unit: &str| IoTSensor {
        id: id.into(),
        farm_id: farm_id.into(),
        sensor_type,
        name: name.into(),
        value,
        unit: unit.into(),
        status: SensorStatus::Online,
        last_update: now,
    };
    vec![
        sensor("sensor1", "farm1", SensorType::SoilMoisture, "Field 1 Moisture Sensor", 65.0, "%"),
        sensor("sensor2", "farm1", SensorType::PhLevel, "Field 1 pH Sensor", 6.8, "pH"),
        sensor("sensor3", "farm1", SensorType::WaterTank, "Main Water Tank", 80.0, "%"),
        sensor("sensor4", "farm3", SensorType::SoilMoisture, "Organic Field Moisture", 70.0, "%"),
    ]
}

/// All five persisted collections at their demo values.
pub fn dataset() -> Collections {
    Collections {
        farms: farms(),
        crops: crops(),
        products: products(),
        orders: orders(),
        users: users(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dataset_sizes() {
        let data = dataset();
        assert_eq!(data.farms.len(), 3);
        assert_eq!(data.crops.len(), 3);
        assert_eq!(data.products.len(), 3);
        assert_eq!(data.orders.len(), 1);
        assert_eq!(data.users.len(), 5);
        assert_eq!(sensors(Utc::now()).len(), 4);
    }

    #[test]
    fn test_all_timestamps_parse() {
        let data = dataset();
        let stamps = data
            .users
            .iter()
            .map(|u| u.created_at)
            .chain(data.farms.iter().map(|f| f.created_at))
            .chain(data.products.iter().map(|p| p.created_at))
            .chain(data.orders.iter().map(|o| o.created_at));
        for ts in stamps {
            assert_ne!(ts, DateTime::<Utc>::MIN_UTC);
        }
        for c in &data.crops {
            assert_ne!(c.planting_date, NaiveDate::MIN);
            assert!(c.expected_harvest > c.planting_date);
        }
    }

    #[test]
    fn test_references_resolve() {
        let data = dataset();
        for crop in &data.crops {
            assert!(data.farms.iter().any(|f| f.id == crop.farm_id));
        }
        for product in &data.products {
            assert!(data.farms.iter().any(|f| f.id == product.farm_id));
            assert!(data.crops.iter().any(|c| c.id == product.crop_id));
        }
        for order in &data.orders {
            assert!(data.users.iter().any(|u| u.id == order.customer_id));
        }
    }
}
