use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// A parcel of land owned by exactly one farmer. Size is in hectares.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Farm {
    pub id: String,
    pub name: String,
    pub farmer_id: String,
    pub location: String,
    pub size: f64,
    pub soil_type: String,
    pub coordinates: Coordinates,
    pub created_at: DateTime<Utc>,
}

impl Farm {
    /// The province part of the location: its last comma-separated segment.
    pub fn province(&self) -> &str {
        match self.location.rsplit(',').next().map(str::trim) {
            Some(p) if !p.is_empty() => p,
            _ => "Unknown",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFarm {
    pub name: String,
    pub farmer_id: String,
    pub location: String,
    pub size: f64,
    pub soil_type: String,
    pub coordinates: Coordinates,
}

impl NewFarm {
    pub(crate) fn into_farm(self, id: String, created_at: DateTime<Utc>) -> Farm {
        Farm {
            id,
            name: self.name,
            farmer_id: self.farmer_id,
            location: self.location,
            size: self.size,
            soil_type: self.soil_type,
            coordinates: self.coordinates,
            created_at,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FarmPatch {
    pub name: Option<String>,
    pub farmer_id: Option<String>,
    pub location: Option<String>,
    pub size: Option<f64>,
    pub soil_type: Option<String>,
    pub coordinates: Option<Coordinates>,
}

impl FarmPatch {
    pub fn apply(self, farm: &mut Farm) {
        if let Some(name) = self.name {
            farm.name = name;
        }
        if let Some(farmer_id) = self.farmer_id {
            farm.farmer_id = farmer_id;
        }
        if let Some(location) = self.location {
            farm.location = location;
        }
        if let Some(size) = self.size {
            farm.size = size;
        }
        if let Some(soil_type) = self.soil_type {
            farm.soil_type = soil_type;
        }
        if let Some(coordinates) = self.coordinates {
            farm.coordinates = coordinates;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn farm(location: &str) -> Farm {
        Farm {
            id: "farm1".into(),
            name: "Mwanza Family Farm".into(),
            farmer_id: "farmer1".into(),
            location: location.into(),
            size: 25.0,
            soil_type: "Clay loam".into(),
            coordinates: Coordinates { lat: -15.7942, lng: 28.6423 },
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_province() {
        assert_eq!(farm("Chongwe District, Lusaka").province(), "Lusaka");
        assert_eq!(farm("Kitwe").province(), "Kitwe");
        assert_eq!(farm("").province(), "Unknown");
    }

    #[test]
    fn test_patch_only_touches_size() {
        let before = farm("Chongwe District, Lusaka");
        let mut after = before.clone();
        FarmPatch { size: Some(99.0), ..Default::default() }.apply(&mut after);

        assert_eq!(after.size, 99.0);
        after.size = before.size;
        assert_eq!(after, before);
    }

    #[test]
    fn test_json_uses_camel_case() {
        let value = serde_json::to_value(farm("Kafue District, Lusaka")).unwrap();
        assert_eq!(value["farmerId"], "farmer1");
        assert_eq!(value["soilType"], "Clay loam");
        assert_eq!(value["coordinates"]["lat"], -15.7942);
    }
}
