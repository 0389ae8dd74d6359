use campus_tour_protocol::{MinimapPoint, Rgb};
use serde::Serialize;

use crate::classify::{Classifier, category_slug, minimap_category};
use crate::config::{AssetLayout, PresentationConfig};
use crate::model::{Place, PlaceId};

/// Normalize a minimap coordinate to percent of the image.
///
/// Values in `[0, 1]` are fractions; everything else is already a percent.
/// The result is clamped to `[0, 100]`.
pub fn normalize_coord(value: f64) -> f64 {
    let scaled = if (0.0..=1.0).contains(&value) {
        value * 100.0
    } else {
        value
    };
    scaled.clamp(0.0, 100.0)
}

/// One clickable dot on the building minimap.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MinimapMarker {
    pub place: PlaceId,
    pub at: MinimapPoint,
    pub slug: String,
    pub color: Rgb,
}

/// Minimap slug of a place: its minimap category (or category), normalized.
pub fn minimap_slug(place: &Place) -> String {
    category_slug(minimap_category(place))
}

/// Base image of the minimap for a slug.
pub fn minimap_icon(slug: &str, layout: &AssetLayout) -> String {
    let root = layout.root.trim_end_matches('/');
    let dir = layout.minimap_dir.trim_matches('/');
    let name = if slug.is_empty() {
        layout.default_minimap_icon.as_str()
    } else {
        slug
    };
    format!("{root}/{dir}/{name}.png")
}

/// Markers for every panorama place with a minimap position, optionally
/// limited to one slug. Order follows ingestion.
pub fn build_minimap_markers(
    places: &[Place],
    classifier: &Classifier,
    presentation: &PresentationConfig,
    active_slug: Option<&str>,
) -> Vec<MinimapMarker> {
    let filter = active_slug.map(category_slug).unwrap_or_default();
    places
        .iter()
        .enumerate()
        .filter(|(_, place)| classifier.has_panorama(place))
        .filter_map(|(i, place)| {
            let at = place.minimap?;
            let slug = minimap_slug(place);
            if !filter.is_empty() && slug != filter {
                return None;
            }
            Some(MinimapMarker {
                place: PlaceId(i),
                at,
                color: presentation.minimap_color(&slug),
                slug,
            })
        })
        .collect()
}

/// Context for entering from a minimap dot: panorama places sharing the
/// clicked place's slug, else every panorama place.
pub fn minimap_context(places: &[Place], classifier: &Classifier, clicked: PlaceId) -> Vec<PlaceId> {
    let panoramas = || {
        places
            .iter()
            .enumerate()
            .filter(|(_, place)| classifier.has_panorama(place))
    };
    let Some(slug) = places.get(clicked.index()).map(minimap_slug) else {
        return Vec::new();
    };
    let same: Vec<PlaceId> = panoramas()
        .filter(|(_, place)| minimap_slug(place) == slug)
        .map(|(i, _)| PlaceId(i))
        .collect();
    if same.is_empty() {
        panoramas().map(|(i, _)| PlaceId(i)).collect()
    } else {
        same
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fractions_scale_and_percentages_clamp() {
        assert_eq!(normalize_coord(0.5), 50.0);
        assert_eq!(normalize_coord(1.0), 100.0);
        assert_eq!(normalize_coord(42.0), 42.0);
        assert_eq!(normalize_coord(250.0), 100.0);
        assert_eq!(normalize_coord(-3.0), 0.0);
    }

    #[test]
    fn icon_path_falls_back_to_default() {
        let layout = AssetLayout::default();
        assert_eq!(minimap_icon("kaede", &layout), "images/minimap/kaede.png");
        assert_eq!(minimap_icon("", &layout), "images/minimap/asunaro.png");
    }

    fn sample() -> Vec<Place> {
        vec![
            Place::new()
                .with_panorama("a.jpg")
                .with_minimap_category("kaede")
                .with_minimap(10.0, 20.0),
            Place::new()
                .with_panorama("b.jpg")
                .with_category("Satsuki.png")
                .with_minimap(30.0, 40.0),
            Place::new().with_category("kaede").with_minimap(5.0, 5.0),
            Place::new().with_panorama("c.jpg").with_category("kaede"),
            Place::new()
                .with_panorama("d.jpg")
                .with_category("gym")
                .with_minimap(1.5, 2.5),
        ]
    }

    #[test]
    fn markers_require_panorama_and_position() {
        let markers = build_minimap_markers(
            &sample(),
            &Classifier::default(),
            &PresentationConfig::default(),
            None,
        );
        let ids: Vec<PlaceId> = markers.iter().map(|m| m.place).collect();
        assert_eq!(ids, vec![PlaceId(0), PlaceId(1), PlaceId(4)]);
        assert_eq!(markers[0].color.to_hex(), "#34a853");
        assert_eq!(markers[1].slug, "satsuki");
        assert_eq!(markers[2].color.to_hex(), "#2d9bf0");
    }

    #[test]
    fn markers_filter_by_active_slug() {
        let markers = build_minimap_markers(
            &sample(),
            &Classifier::default(),
            &PresentationConfig::default(),
            Some("Kaede"),
        );
        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].place, PlaceId(0));
    }

    #[test]
    fn context_prefers_same_slug() {
        let places = sample();
        let c = Classifier::default();
        assert_eq!(
            minimap_context(&places, &c, PlaceId(0)),
            vec![PlaceId(0), PlaceId(3)]
        );
        assert_eq!(minimap_context(&places, &c, PlaceId(9)), Vec::<PlaceId>::new());
    }
}
