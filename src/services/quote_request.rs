// src/services/quote_request.rs
//
// Walk-through form input. Every field is optional on the wire: numbers
// arrive as numbers or strings from the form, and anything unparseable is
// read as zero so the calculator falls back to its minimums.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ServiceType {
    #[default]
    Truck,
    LaborOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LocationType {
    House,
    Apartment,
    Business,
    StorageUnit,
    UnloadingTruckPod,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ParkingDistance {
    #[default]
    Close,
    Medium,
    Far,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PackingLevel {
    #[default]
    None,
    AFew,
    Moderate,
    QuiteABit,
    Lots,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JunkRemovalAmount {
    #[default]
    None,
    Small,
    Medium,
    Large,
    FullLoad,
}

impl JunkRemovalAmount {
    pub fn label(&self) -> &'static str {
        match self {
            JunkRemovalAmount::None => "None",
            JunkRemovalAmount::Small => "Small",
            JunkRemovalAmount::Medium => "Medium",
            JunkRemovalAmount::Large => "Large",
            JunkRemovalAmount::FullLoad => "Full Load",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LocationDetails {
    #[serde(deserialize_with = "lenient::or_default")]
    pub location_type: Option<LocationType>,
    #[serde(deserialize_with = "lenient::number")]
    pub house_square_feet: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub apartment_square_feet: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub business_square_feet: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub storage_unit_square_feet: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub truck_pod_length_feet: f64,
    /// 0-100; above 80 means packed tighter than a typical furnished home.
    #[serde(deserialize_with = "lenient::number")]
    pub how_furnished: f64,
    #[serde(deserialize_with = "lenient::count")]
    pub stairs: u32,
    #[serde(deserialize_with = "lenient::flag")]
    pub has_elevator: bool,
    #[serde(deserialize_with = "lenient::or_default")]
    pub parking_distance: ParkingDistance,
}

impl LocationDetails {
    /// Footprint used by the square-footage formulas for this location type.
    pub fn square_feet(&self) -> f64 {
        match self.location_type {
            Some(LocationType::House) => self.house_square_feet,
            Some(LocationType::Apartment) => self.apartment_square_feet,
            Some(LocationType::Business) => self.business_square_feet,
            Some(LocationType::StorageUnit) => self.storage_unit_square_feet,
            Some(LocationType::UnloadingTruckPod) | None => 0.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SpecialItems {
    #[serde(deserialize_with = "lenient::flag")]
    pub piano: bool,
    #[serde(deserialize_with = "lenient::flag")]
    pub grand_piano: bool,
    #[serde(deserialize_with = "lenient::flag")]
    pub pool_table: bool,
    #[serde(deserialize_with = "lenient::count")]
    pub gun_safes: u32,
    #[serde(deserialize_with = "lenient::count")]
    pub tvs: u32,
    #[serde(deserialize_with = "lenient::count")]
    pub appliances: u32,
    #[serde(deserialize_with = "lenient::count")]
    pub exercise_equipment: u32,
    #[serde(deserialize_with = "lenient::flag")]
    pub hot_tub: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MoveQuoteRequest {
    #[serde(deserialize_with = "lenient::or_default")]
    pub service_type: ServiceType,
    pub pickup: LocationDetails,
    pub delivery: LocationDetails,
    pub additional_stop: Option<LocationDetails>,
    pub special_items: SpecialItems,
    #[serde(deserialize_with = "lenient::or_default")]
    pub packing: PackingLevel,
    #[serde(deserialize_with = "lenient::or_default")]
    pub junk_removal: JunkRemovalAmount,
    #[serde(deserialize_with = "lenient::count")]
    pub crew_size: u32,
    /// Operator override; when positive it replaces the square-footage estimate.
    #[serde(deserialize_with = "lenient::number")]
    pub manual_labor_hours: f64,
    #[serde(deserialize_with = "lenient::flag")]
    pub waive_travel: bool,
    #[serde(deserialize_with = "lenient::flag")]
    pub fixed_budget: bool,
    #[serde(deserialize_with = "lenient::number")]
    pub fixed_budget_amount: f64,
}

impl MoveQuoteRequest {
    /// True when the request describes an actual move rather than an add-on only.
    pub fn includes_move(&self) -> bool {
        self.pickup.location_type.is_some() || self.manual_labor_hours > 0.0
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DistanceLeg {
    #[serde(deserialize_with = "lenient::number")]
    pub miles: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub minutes: f64,
}

impl DistanceLeg {
    pub fn new(miles: f64, minutes: f64) -> Self {
        DistanceLeg { miles, minutes }
    }
}

/// Route legs precomputed by the maps lookup: shop to pickup, pickup to
/// delivery, and delivery back to the shop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DistanceData {
    pub to_pickup: DistanceLeg,
    pub pickup_to_delivery: DistanceLeg,
    pub delivery_to_return: DistanceLeg,
}

mod lenient {
    use serde::de::DeserializeOwned;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    fn to_f64(value: &Value) -> f64 {
        let n = match value {
            Value::Number(n) => n.as_f64().unwrap_or(0.0),
            Value::String(s) => s.trim().replace(',', "").parse::<f64>().unwrap_or(0.0),
            _ => 0.0,
        };
        if n.is_finite() && n > 0.0 {
            n
        } else {
            0.0
        }
    }

    pub fn number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(to_f64(&value))
    }

    pub fn count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(to_f64(&value).floor().min(u32::MAX as f64) as u32)
    }

    pub fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(match value {
            Value::Bool(b) => b,
            Value::String(s) => matches!(s.trim().to_ascii_lowercase().as_str(), "true" | "yes" | "on" | "1"),
            Value::Number(n) => n.as_f64().map_or(false, |n| n != 0.0),
            _ => false,
        })
    }

    /// Unknown enum strings read as the field's default.
    pub fn or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned + Default,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(serde_json::from_value(value).unwrap_or_default())
    }
}
