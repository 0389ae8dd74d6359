use campus_tour_protocol::{LatLon, MinimapPoint};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::model::Place;
use crate::views::minimap::normalize_coord;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("expected an array of place records or an object with a \"places\" array")]
    NotAnArray,
}

type Record = Map<String, Value>;

const PANORAMA_KEYS: &[&str] = &["streetViewImage", "streetviewImage", "streetview", "panorama"];
const PRIORITY_KEYS: &[&str] = &["priority", "order", "sort"];
const MINIMAP_X_KEYS: &[&str] = &["minimapX", "minimap_x", "minimapx"];
const MINIMAP_Y_KEYS: &[&str] = &["minimapY", "minimap_y", "minimapy"];

/// Parse place records exported from the data sheet.
///
/// Accepts either a top-level array or an object wrapping it under
/// `places`. Entries that are not JSON objects are skipped. An empty array
/// is not an error here; the controller reports it as missing data.
pub fn parse_places(data: &[u8]) -> Result<Vec<Place>, IngestError> {
    let value: Value = serde_json::from_slice(data)?;
    let entries = match value {
        Value::Array(items) => items,
        Value::Object(mut obj) => match obj.remove("places") {
            Some(Value::Array(items)) => items,
            _ => return Err(IngestError::NotAnArray),
        },
        _ => return Err(IngestError::NotAnArray),
    };

    let mut places = Vec::with_capacity(entries.len());
    for (i, entry) in entries.iter().enumerate() {
        match entry.as_object() {
            Some(record) => places.push(place_from_record(record)),
            None => tracing::warn!(index = i, "skipping place entry that is not an object"),
        }
    }
    tracing::debug!(count = places.len(), "ingested place records");
    Ok(places)
}

/// Build a [`Place`] from one loosely typed source record.
pub fn place_from_record(record: &Record) -> Place {
    let coord = match (number(record, "lat"), number(record, "lon")) {
        (Some(lat), Some(lon)) => Some(LatLon::new(lat, lon)),
        _ => None,
    };

    let minimap = match (
        first_present(record, MINIMAP_X_KEYS).and_then(to_finite),
        first_present(record, MINIMAP_Y_KEYS).and_then(to_finite),
    ) {
        (Some(x), Some(y)) => Some(MinimapPoint::new(normalize_coord(x), normalize_coord(y))),
        _ => None,
    };

    Place {
        coord,
        panorama: first_text(record, PANORAMA_KEYS),
        yaw: number(record, "streetViewYaw"),
        pitch: number(record, "streetViewPitch"),
        fov: number(record, "streetViewFov"),
        category: first_text(record, &["category"]),
        building: first_text(record, &["building"]),
        classroom: first_text(record, &["classroomname"]),
        title: first_text(record, &["title"]),
        location: first_text(record, &["location"]),
        minimap_category: first_text(record, &["minimapCategory"]),
        priority: explicit_priority(record),
        row_index: number(record, "__rowIndex"),
        minimap,
        image: first_text(record, &["imageUrl", "image"]),
    }
}

/// Resolve the explicit ordering hint of a record.
///
/// Candidates are the exact keys `priority`, `order`, `sort` (in that
/// order), then any key equal to one of them after trimming and
/// lowercasing. The first candidate that parses as a finite number wins.
pub fn explicit_priority(record: &Record) -> Option<f64> {
    let exact = PRIORITY_KEYS.iter().filter_map(|k| record.get(*k));
    let fuzzy = record
        .iter()
        .filter(|(k, _)| {
            let norm = k.trim().to_lowercase();
            PRIORITY_KEYS.contains(&norm.as_str()) && !PRIORITY_KEYS.contains(&k.as_str())
        })
        .map(|(_, v)| v);
    exact.chain(fuzzy).find_map(to_finite)
}

fn number(record: &Record, key: &str) -> Option<f64> {
    record.get(key).and_then(to_finite)
}

fn first_present<'a>(record: &'a Record, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| record.get(*k))
        .find(|v| !v.is_null())
}

/// First key holding a non-empty string (numbers are stringified).
fn first_text(record: &Record, keys: &[&str]) -> Option<String> {
    keys.iter().filter_map(|k| record.get(*k)).find_map(|v| match v {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
        _ => None,
    })
}

/// Finite number from a JSON number or a numeric string.
pub fn to_finite(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_float_prefix(s),
        _ => None,
    }?;
    n.is_finite().then_some(n)
}

/// Parse the longest numeric prefix of `s`, ignoring leading whitespace.
///
/// `"12.5px"` parses as `12.5`; `"px"` does not parse.
pub fn parse_float_prefix(s: &str) -> Option<f64> {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }
    let int_start = end;
    while bytes.get(end).is_some_and(u8::is_ascii_digit) {
        end += 1;
    }
    let mut digits = end - int_start;
    if bytes.get(end) == Some(&b'.') {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while bytes.get(frac_end).is_some_and(u8::is_ascii_digit) {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        if digits > 0 {
            end = frac_end;
        }
    }
    if digits == 0 {
        return None;
    }
    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while bytes.get(exp_end).is_some_and(u8::is_ascii_digit) {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }
    s[..end].parse().ok()
}
