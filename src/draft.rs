//! Add/edit form model.
//!
//! A [`PropertyDraft`] holds every client-supplied field of a property
//! record. Drafts are normalized and validated with [`PropertyDraft::prepare`]
//! before being sent to the backend; the backend assigns the id.

use crate::error::{ApiError, ApiResult};
use crate::models::{PropertyDetails, PropertyId, PropertyRecord, PropertyStatus};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_geolocation"))]
pub struct PropertyDraft {
    #[validate(length(min = 1, message = "title is required"))]
    pub title: String,
    #[validate(length(min = 1, message = "address is required"))]
    pub address: String,
    #[validate(length(min = 1, message = "price is required"))]
    pub price: String,
    pub date: Option<NaiveDate>,
    #[validate(range(min = 1, max = 5, message = "rating must be between 1 and 5"))]
    pub rating: u8,
    pub status: PropertyStatus,

    pub area_pyeong: Option<f64>,
    pub area_m2: Option<f64>,
    pub room_count: u32,
    pub bathroom_count: u32,
    pub floor_number: Option<i32>,
    pub total_floors: Option<i32>,
    pub direction: Option<String>,
    pub building_type: Option<String>,
    pub build_year: Option<i32>,

    pub maintenance_fee: Option<String>,
    pub heating_type: Option<String>,

    pub parking_available: bool,
    pub elevator_available: bool,

    pub nearest_station: Option<String>,
    pub walking_minutes: Option<u32>,

    pub advantages: Vec<String>,
    pub disadvantages: Vec<String>,
    pub details: PropertyDetails,

    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

fn validate_geolocation(draft: &PropertyDraft) -> Result<(), ValidationError> {
    if draft.latitude.is_some() != draft.longitude.is_some() {
        return Err(ValidationError::new("geolocation")
            .with_message("latitude and longitude must be set together".into()));
    }
    Ok(())
}

impl Default for PropertyDraft {
    fn default() -> Self {
        Self {
            title: String::new(),
            address: String::new(),
            price: String::new(),
            date: Some(Local::now().date_naive()),
            rating: 3,
            status: PropertyStatus::default(),
            area_pyeong: None,
            area_m2: None,
            room_count: 1,
            bathroom_count: 1,
            floor_number: None,
            total_floors: None,
            direction: None,
            building_type: None,
            build_year: None,
            maintenance_fee: None,
            heating_type: None,
            parking_available: false,
            elevator_available: false,
            nearest_station: None,
            walking_minutes: None,
            advantages: Vec::new(),
            disadvantages: Vec::new(),
            details: PropertyDetails::default(),
            latitude: None,
            longitude: None,
        }
    }
}

fn trim_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn trim_list(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

fn parse_bool(value: &str) -> Result<bool, String> {
    match value.trim() {
        "true" | "yes" | "y" | "1" => Ok(true),
        "false" | "no" | "n" | "0" => Ok(false),
        other => Err(format!("expected a boolean, got {:?}", other)),
    }
}

fn parse_optional<T: std::str::FromStr>(value: &str) -> Result<Option<T>, String> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse()
        .map(Some)
        .map_err(|_| format!("invalid number: {:?}", value))
}

fn optional_text(value: &str) -> Option<String> {
    Some(value.to_string())
}

impl PropertyDraft {
    pub fn new(
        title: impl Into<String>,
        address: impl Into<String>,
        price: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            address: address.into(),
            price: price.into(),
            ..Self::default()
        }
    }

    /// Trim text, drop blank list entries, and turn empty optionals into `None`
    pub fn normalize(mut self) -> Self {
        self.title = self.title.trim().to_string();
        self.address = self.address.trim().to_string();
        self.price = self.price.trim().to_string();
        self.direction = trim_optional(self.direction);
        self.building_type = trim_optional(self.building_type);
        self.maintenance_fee = trim_optional(self.maintenance_fee);
        self.heating_type = trim_optional(self.heating_type);
        self.nearest_station = trim_optional(self.nearest_station);
        self.advantages = trim_list(self.advantages);
        self.disadvantages = trim_list(self.disadvantages);
        self.details.options = trim_list(self.details.options);
        self.details.memo = trim_optional(self.details.memo);
        self
    }

    /// Normalize then validate; the result is what gets submitted
    pub fn prepare(self) -> ApiResult<Self> {
        let draft = self.normalize();
        draft
            .validate()
            .map_err(|errors| ApiError::Validation(errors.to_string()))?;
        Ok(draft)
    }

    /// Apply a single `field=value` edit, using the wire field names.
    ///
    /// List fields (`advantages`, `disadvantages`, `options`) append.
    pub fn set_field(&mut self, field: &str, value: &str) -> Result<(), String> {
        match field {
            "title" => self.title = value.to_string(),
            "address" => self.address = value.to_string(),
            "price" => self.price = value.to_string(),
            "date" => {
                self.date = if value.trim().is_empty() {
                    None
                } else {
                    Some(
                        NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
                            .map_err(|e| format!("invalid date {:?}: {}", value, e))?,
                    )
                }
            }
            "rating" => {
                self.rating = value
                    .trim()
                    .parse()
                    .map_err(|_| format!("invalid rating: {:?}", value))?
            }
            "status" => self.status = value.parse()?,
            "areaPyeong" => self.area_pyeong = parse_optional(value)?,
            "areaM2" => self.area_m2 = parse_optional(value)?,
            "roomCount" => self.room_count = parse_optional(value)?.unwrap_or(1),
            "bathroomCount" => self.bathroom_count = parse_optional(value)?.unwrap_or(1),
            "floorNumber" => self.floor_number = parse_optional(value)?,
            "totalFloors" => self.total_floors = parse_optional(value)?,
            "direction" => self.direction = optional_text(value),
            "buildingType" => self.building_type = optional_text(value),
            "buildYear" => self.build_year = parse_optional(value)?,
            "maintenanceFee" => self.maintenance_fee = optional_text(value),
            "heatingType" => self.heating_type = optional_text(value),
            "parkingAvailable" => self.parking_available = parse_bool(value)?,
            "elevatorAvailable" => self.elevator_available = parse_bool(value)?,
            "nearestStation" => self.nearest_station = optional_text(value),
            "walkingMinutes" => self.walking_minutes = parse_optional(value)?,
            "advantages" => self.advantages.push(value.to_string()),
            "disadvantages" => self.disadvantages.push(value.to_string()),
            "options" => self.details.options.push(value.to_string()),
            "memo" => self.details.memo = optional_text(value),
            "petAllowed" => self.details.pet_allowed = parse_bool(value)?,
            "shortTermRent" => self.details.short_term_rent = parse_bool(value)?,
            "latitude" => self.latitude = parse_optional(value)?,
            "longitude" => self.longitude = parse_optional(value)?,
            other => return Err(format!("unknown field: {}", other)),
        }
        Ok(())
    }

    /// Materialize the draft as a stored record
    pub fn into_record(self, id: PropertyId) -> PropertyRecord {
        PropertyRecord {
            id,
            title: self.title,
            address: self.address,
            price: self.price,
            date: self.date,
            rating: self.rating,
            status: self.status,
            area_pyeong: self.area_pyeong,
            area_m2: self.area_m2,
            room_count: self.room_count,
            bathroom_count: self.bathroom_count,
            floor_number: self.floor_number,
            total_floors: self.total_floors,
            direction: self.direction,
            building_type: self.building_type,
            build_year: self.build_year,
            maintenance_fee: self.maintenance_fee,
            heating_type: self.heating_type,
            parking_available: self.parking_available,
            elevator_available: self.elevator_available,
            nearest_station: self.nearest_station,
            walking_minutes: self.walking_minutes,
            advantages: self.advantages,
            disadvantages: self.disadvantages,
            details: self.details,
            latitude: self.latitude,
            longitude: self.longitude,
            property_images: Vec::new(),
        }
    }
}

impl From<&PropertyRecord> for PropertyDraft {
    fn from(record: &PropertyRecord) -> Self {
        Self {
            title: record.title.clone(),
            address: record.address.clone(),
            price: record.price.clone(),
            date: record.date,
            rating: record.rating,
            status: record.status,
            area_pyeong: record.area_pyeong,
            area_m2: record.area_m2,
            room_count: record.room_count,
            bathroom_count: record.bathroom_count,
            floor_number: record.floor_number,
            total_floors: record.total_floors,
            direction: record.direction.clone(),
            building_type: record.building_type.clone(),
            build_year: record.build_year,
            maintenance_fee: record.maintenance_fee.clone(),
            heating_type: record.heating_type.clone(),
            parking_available: record.parking_available,
            elevator_available: record.elevator_available,
            nearest_station: record.nearest_station.clone(),
            walking_minutes: record.walking_minutes,
            advantages: record.advantages.clone(),
            disadvantages: record.disadvantages.clone(),
            details: record.details.clone(),
            latitude: record.latitude,
            longitude: record.longitude,
        }
    }
}
