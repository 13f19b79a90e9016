use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorType {
    SoilMoisture,
    PhLevel,
    WaterTank,
    Temperature,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorStatus {
    Online,
    Offline,
}

/// A field sensor reading. Reference data only: the store never mutates sensors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IoTSensor {
    pub id: String,
    pub farm_id: String,
    #[serde(rename = "type")]
    pub sensor_type: SensorType,
    pub name: String,
    pub value: f64,
    pub unit: String,
    pub status: SensorStatus,
    pub last_update: DateTime<Utc>,
}
