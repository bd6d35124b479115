/// Structured index queries and distances
use crate::error::ServiceError;
use crate::models::Location;
use serde_json::{json, Value};
use std::fmt;
use std::str::FromStr;

/// Mean earth radius in meters, as used by the index for arc distances
pub const EARTH_RADIUS_METERS: f64 = 6_371_008.7714;

/// Radius applied when a geo query does not specify one
pub const DEFAULT_RADIUS: Distance = Distance {
    value: 200.0,
    unit: DistanceUnit::Kilometers,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DistanceUnit {
    Meters,
    Kilometers,
    Miles,
}

impl DistanceUnit {
    fn suffix(self) -> &'static str {
        match self {
            DistanceUnit::Meters => "m",
            DistanceUnit::Kilometers => "km",
            DistanceUnit::Miles => "mi",
        }
    }

    fn meters_per_unit(self) -> f64 {
        match self {
            DistanceUnit::Meters => 1.0,
            DistanceUnit::Kilometers => 1_000.0,
            DistanceUnit::Miles => 1_609.344,
        }
    }
}

/// A distance magnitude with unit, rendered as e.g. `200km`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Distance {
    pub value: f64,
    pub unit: DistanceUnit,
}

impl Distance {
    pub fn kilometers(value: f64) -> Self {
        Self {
            value,
            unit: DistanceUnit::Kilometers,
        }
    }

    pub fn as_meters(&self) -> f64 {
        self.value * self.unit.meters_per_unit()
    }
}

impl Default for Distance {
    fn default() -> Self {
        DEFAULT_RADIUS
    }
}

impl fmt::Display for Distance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.value, self.unit.suffix())
    }
}

impl FromStr for Distance {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        // "km" before "m" so the longer suffix wins
        let (number, unit) = if let Some(n) = s.strip_suffix("km") {
            (n, DistanceUnit::Kilometers)
        } else if let Some(n) = s.strip_suffix("mi") {
            (n, DistanceUnit::Miles)
        } else if let Some(n) = s.strip_suffix('m') {
            (n, DistanceUnit::Meters)
        } else {
            (s, DistanceUnit::Kilometers)
        };

        let value: f64 = number
            .trim()
            .parse()
            .map_err(|_| ServiceError::Validation(format!("Invalid distance '{}'", s)))?;

        if !value.is_finite() || value <= 0.0 {
            return Err(ServiceError::Validation(format!(
                "Distance must be positive, got '{}'",
                s
            )));
        }

        Ok(Self { value, unit })
    }
}

/// Query against a document collection
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    /// Documents whose geo-point `field` lies within `radius` of `center`
    GeoRadius {
        field: String,
        center: Location,
        radius: Distance,
    },
    /// Documents whose numeric `field` is >= `gte`
    NumericRange { field: String, gte: f64 },
}

impl Query {
    pub fn geo_radius(field: &str, center: Location, radius: Option<Distance>) -> Self {
        Query::GeoRadius {
            field: field.to_string(),
            center,
            radius: radius.unwrap_or(DEFAULT_RADIUS),
        }
    }

    pub fn numeric_range(field: &str, gte: f64) -> Self {
        Query::NumericRange {
            field: field.to_string(),
            gte,
        }
    }

    /// Render as Elasticsearch query DSL
    pub fn to_dsl(&self) -> Value {
        match self {
            Query::GeoRadius {
                field,
                center,
                radius,
            } => json!({
                "geo_distance": {
                    "distance": radius.to_string(),
                    field.as_str(): { "lat": center.lat, "lon": center.lon }
                }
            }),
            Query::NumericRange { field, gte } => json!({
                "range": {
                    field.as_str(): { "gte": gte }
                }
            }),
        }
    }

    /// Evaluate against a single document
    pub fn matches(&self, doc: &Value) -> bool {
        match self {
            Query::GeoRadius {
                field,
                center,
                radius,
            } => field_value(doc, field)
                .and_then(as_location)
                .map(|point| haversine_meters(*center, point) <= radius.as_meters())
                .unwrap_or(false),
            // Scores are stored from f32, so compare at that precision
            Query::NumericRange { field, gte } => field_value(doc, field)
                .and_then(Value::as_f64)
                .map(|v| v as f32 >= *gte as f32)
                .unwrap_or(false),
        }
    }
}

/// Resolve a dotted field path within a document
fn field_value<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(doc, |current, segment| current.get(segment))
}

fn as_location(value: &Value) -> Option<Location> {
    Some(Location {
        lat: value.get("lat")?.as_f64()?,
        lon: value.get("lon")?.as_f64()?,
    })
}

/// Great-circle distance between two points in meters
pub fn haversine_meters(a: Location, b: Location) -> f64 {
    let (lat1, lat2) = (a.lat.to_radians(), b.lat.to_radians());
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lon = (b.lon - a.lon).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_METERS * h.sqrt().min(1.0).asin()
}
