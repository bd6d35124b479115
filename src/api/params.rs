/// Lenient parsing of numeric request parameters
///
/// Coordinates that are missing, unparsable, non-finite or out of range
/// degrade to 0.0 instead of rejecting the request.
use crate::index::Distance;
use tracing::warn;

pub const MAX_LATITUDE: f64 = 90.0;
pub const MAX_LONGITUDE: f64 = 180.0;

/// Parse a coordinate within `[-limit, limit]`, defaulting to 0.0
pub fn parse_coordinate(raw: Option<&str>, limit: f64, name: &str) -> f64 {
    let raw = match raw.map(str::trim) {
        Some(raw) if !raw.is_empty() => raw,
        _ => {
            warn!("Missing {}, defaulting to 0", name);
            return 0.0;
        }
    };

    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() && value.abs() <= limit => value,
        _ => {
            warn!("Invalid {} '{}', defaulting to 0", name, raw);
            0.0
        }
    }
}

pub fn parse_latitude(raw: Option<&str>) -> f64 {
    parse_coordinate(raw, MAX_LATITUDE, "lat")
}

pub fn parse_longitude(raw: Option<&str>) -> f64 {
    parse_coordinate(raw, MAX_LONGITUDE, "lon")
}

/// Parse a radius override in kilometres. `None` selects the default radius.
pub fn parse_range_km(raw: Option<&str>) -> Option<Distance> {
    let raw = raw.map(str::trim).filter(|r| !r.is_empty())?;

    match format!("{}km", raw).parse::<Distance>() {
        Ok(radius) => Some(radius),
        Err(e) => {
            warn!("Invalid range '{}', using default radius: {}", raw, e);
            None
        }
    }
}
