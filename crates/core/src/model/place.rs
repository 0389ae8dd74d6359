use std::fmt;

use campus_tour_protocol::{LatLon, MinimapPoint};
use serde::{Deserialize, Serialize};

/// Identity of an ingested place: its position in the ingested sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlaceId(pub usize);

impl PlaceId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for PlaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One campus location, optionally carrying a 360° panorama.
///
/// Records are read-only once ingested. Loosely typed source fields (numeric
/// strings, alias keys, the priority hint) are resolved once by
/// [`crate::ingest`]; everything here is already normalized.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub coord: Option<LatLon>,
    /// Raw panorama reference as written in the source data.
    pub panorama: Option<String>,
    pub yaw: Option<f64>,
    pub pitch: Option<f64>,
    pub fov: Option<f64>,
    pub category: Option<String>,
    pub building: Option<String>,
    pub classroom: Option<String>,
    pub title: Option<String>,
    pub location: Option<String>,
    pub minimap_category: Option<String>,
    /// Explicit ordering hint (`priority` / `order` / `sort`).
    pub priority: Option<f64>,
    /// Row of the record in the source sheet.
    pub row_index: Option<f64>,
    /// Minimap placement, percent of the minimap image.
    pub minimap: Option<MinimapPoint>,
    /// Fallback card image.
    pub image: Option<String>,
}

/// Trimmed text of an optional label, empty when absent.
pub(crate) fn text(field: &Option<String>) -> &str {
    field.as_deref().map(str::trim).unwrap_or("")
}

impl Place {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_coord(mut self, lat: f64, lon: f64) -> Self {
        self.coord = Some(LatLon::new(lat, lon));
        self
    }

    pub fn with_panorama(mut self, raw: impl Into<String>) -> Self {
        self.panorama = Some(raw.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_classroom(mut self, classroom: impl Into<String>) -> Self {
        self.classroom = Some(classroom.into());
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_building(mut self, building: impl Into<String>) -> Self {
        self.building = Some(building.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_minimap_category(mut self, slug: impl Into<String>) -> Self {
        self.minimap_category = Some(slug.into());
        self
    }

    pub fn with_priority(mut self, priority: f64) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_row_index(mut self, row: f64) -> Self {
        self.row_index = Some(row);
        self
    }

    pub fn with_minimap(mut self, x: f64, y: f64) -> Self {
        self.minimap = Some(MinimapPoint::new(x, y));
        self
    }

    pub fn with_orientation(mut self, yaw: f64, pitch: f64, fov: f64) -> Self {
        self.yaw = Some(yaw);
        self.pitch = Some(pitch);
        self.fov = Some(fov);
        self
    }

    /// Label shown on cards, toasts and navigation buttons.
    pub fn display_name(&self) -> &str {
        [&self.classroom, &self.title, &self.location]
            .into_iter()
            .map(text)
            .find(|s| !s.is_empty())
            .unwrap_or("スポット")
    }

    /// Secondary line under the current spot's title.
    pub fn meta_line(&self) -> String {
        let parts: Vec<&str> = [text(&self.location), text(&self.category)]
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect();
        if parts.is_empty() {
            "360°ビューをお楽しみください".to_string()
        } else {
            parts.join(" · ")
        }
    }

    /// Location label for the map marker popup.
    pub fn popup_label(&self) -> String {
        let classroom = text(&self.classroom);
        if !classroom.is_empty() {
            return classroom.to_string();
        }
        let building = text(&self.building);
        let location = text(&self.location);
        if !building.is_empty() && !location.is_empty() && building != location {
            return format!("{building} {location}");
        }
        [building, location, text(&self.title)]
            .into_iter()
            .find(|s| !s.is_empty())
            .unwrap_or("")
            .to_string()
    }
}
