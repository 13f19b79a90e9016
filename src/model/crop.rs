use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::Lifecycle;
use crate::{Error, Result};

/// Growth stage of a crop. Stages only move forward, but may skip ahead
/// (leafy crops never flower).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CropStatus {
    Planted,
    Growing,
    Flowering,
    Harvesting,
    Harvested,
}

impl CropStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            CropStatus::Planted => "planted",
            CropStatus::Growing => "growing",
            CropStatus::Flowering => "flowering",
            CropStatus::Harvesting => "harvesting",
            CropStatus::Harvested => "harvested",
        }
    }
}

impl Lifecycle for CropStatus {
    const ENTITY: &'static str = "crop";

    fn allows(self, next: Self) -> bool {
        next > self
    }
}

impl fmt::Display for CropStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CropStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "planted" => Ok(CropStatus::Planted),
            "growing" => Ok(CropStatus::Growing),
            "flowering" => Ok(CropStatus::Flowering),
            "harvesting" => Ok(CropStatus::Harvesting),
            "harvested" => Ok(CropStatus::Harvested),
            other => Err(Error::InvalidInput(format!("unknown crop status '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputType {
    Fertilizer,
    Pesticide,
    Water,
    Labor,
}

/// A cost line recorded against a crop. Never edited once recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CropInput {
    pub id: String,
    #[serde(rename = "type")]
    pub input_type: InputType,
    pub name: String,
    pub amount: f64,
    pub unit: String,
    pub cost: f64,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCropInput {
    #[serde(rename = "type")]
    pub input_type: InputType,
    pub name: String,
    pub amount: f64,
    pub unit: String,
    pub cost: f64,
    pub date: NaiveDate,
}

impl NewCropInput {
    pub(crate) fn into_input(self, id: String) -> CropInput {
        CropInput {
            id,
            input_type: self.input_type,
            name: self.name,
            amount: self.amount,
            unit: self.unit,
            cost: self.cost,
            date: self.date,
        }
    }
}

/// A planting on one farm. Area is in hectares and is not checked against the farm size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Crop {
    pub id: String,
    pub farm_id: String,
    #[serde(rename = "type")]
    pub crop_type: String,
    pub variety: String,
    pub planting_date: NaiveDate,
    pub expected_harvest: NaiveDate,
    pub status: CropStatus,
    pub area: f64,
    #[serde(default)]
    pub inputs: Vec<CropInput>,
    #[serde(rename = "yield", default, skip_serializing_if = "Option::is_none")]
    pub harvest_yield: Option<f64>,
}

impl Crop {
    /// Total cost of every input recorded against this crop.
    pub fn input_cost(&self) -> f64 {
        self.inputs.iter().map(|i| i.cost).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCrop {
    pub farm_id: String,
    #[serde(rename = "type")]
    pub crop_type: String,
    pub variety: String,
    pub planting_date: NaiveDate,
    pub expected_harvest: NaiveDate,
    pub status: CropStatus,
    pub area: f64,
    #[serde(default)]
    pub inputs: Vec<CropInput>,
    #[serde(rename = "yield", default, skip_serializing_if = "Option::is_none")]
    pub harvest_yield: Option<f64>,
}

impl NewCrop {
    pub(crate) fn into_crop(self, id: String) -> Crop {
        Crop {
            id,
            farm_id: self.farm_id,
            crop_type: self.crop_type,
            variety: self.variety,
            planting_date: self.planting_date,
            expected_harvest: self.expected_harvest,
            status: self.status,
            area: self.area,
            inputs: self.inputs,
            harvest_yield: self.harvest_yield,
        }
    }
}

/// Partial update for a [`Crop`]. Inputs are appended through the store, not patched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CropPatch {
    pub farm_id: Option<String>,
    #[serde(rename = "type")]
    pub crop_type: Option<String>,
    pub variety: Option<String>,
    pub planting_date: Option<NaiveDate>,
    pub expected_harvest: Option<NaiveDate>,
    pub status: Option<CropStatus>,
    pub area: Option<f64>,
    #[serde(rename = "yield")]
    pub harvest_yield: Option<f64>,
}

impl CropPatch {
    /// Applies the patch. A rejected status move leaves the crop untouched.
    pub fn apply(self, crop: &mut Crop) -> Result<()> {
        let status = match self.status {
            Some(next) => crop.status.transition(next)?,
            None => crop.status,
        };
        crop.status = status;
        if let Some(farm_id) = self.farm_id {
            crop.farm_id = farm_id;
        }
        if let Some(crop_type) = self.crop_type {
            crop.crop_type = crop_type;
        }
        if let Some(variety) = self.variety {
            crop.variety = variety;
        }
        if let Some(date) = self.planting_date {
            crop.planting_date = date;
        }
        if let Some(date) = self.expected_harvest {
            crop.expected_harvest = date;
        }
        if let Some(area) = self.area {
            crop.area = area;
        }
        if let Some(y) = self.harvest_yield {
            crop.harvest_yield = Some(y);
        }
        Ok(())
    }
}
