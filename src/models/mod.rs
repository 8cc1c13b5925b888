pub mod status;

pub use status::PropertyStatus;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Server-assigned property identifier
pub type PropertyId = i64;

/// Server-assigned image identifier
pub type ImageId = i64;

/// A point on the map
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// Free-form extras attached to a property record
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDetails {
    #[serde(default)]
    pub options: Vec<String>,
    pub memo: Option<String>,
    #[serde(default)]
    pub pet_allowed: bool,
    #[serde(default)]
    pub short_term_rent: bool,
}

/// Image attached to a property
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PropertyImage {
    pub id: ImageId,
    pub property_id: PropertyId,
    pub image_path: String,
    pub original_filename: String,
    #[serde(default)]
    pub is_main_image: bool,
    #[serde(default)]
    pub display_order: i32,
}

/// Core property note as returned by the backend
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PropertyRecord {
    pub id: PropertyId,
    pub title: String,
    pub address: String,
    pub price: String,
    pub date: Option<NaiveDate>,
    pub rating: u8,
    pub status: PropertyStatus,

    pub area_pyeong: Option<f64>,
    pub area_m2: Option<f64>,
    #[serde(default = "default_count")]
    pub room_count: u32,
    #[serde(default = "default_count")]
    pub bathroom_count: u32,
    pub floor_number: Option<i32>,
    pub total_floors: Option<i32>,
    pub direction: Option<String>,
    pub building_type: Option<String>,
    pub build_year: Option<i32>,

    pub maintenance_fee: Option<String>,
    pub heating_type: Option<String>,

    #[serde(default)]
    pub parking_available: bool,
    #[serde(default)]
    pub elevator_available: bool,

    pub nearest_station: Option<String>,
    pub walking_minutes: Option<u32>,

    #[serde(default)]
    pub advantages: Vec<String>,
    #[serde(default)]
    pub disadvantages: Vec<String>,
    #[serde(default)]
    pub details: PropertyDetails,

    pub latitude: Option<f64>,
    pub longitude: Option<f64>,

    #[serde(default)]
    pub property_images: Vec<PropertyImage>,
}

fn default_count() -> u32 {
    1
}

impl PropertyRecord {
    /// Location of the record, only when both coordinates are present
    pub fn location(&self) -> Option<GeoPoint> {
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => Some(GeoPoint {
                latitude,
                longitude,
            }),
            _ => None,
        }
    }

    /// The designated cover image, if any
    pub fn main_image(&self) -> Option<&PropertyImage> {
        self.property_images.iter().find(|img| img.is_main_image)
    }
}

/// Logged-in user profile
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub name: String,
    pub email: String,
}

/// Bearer token plus the user it belongs to
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    pub token: String,
    pub user: User,
}
