use std::collections::HashMap;

use campus_tour_protocol::{Bounds, LatLon, Rgb};
use serde::Serialize;

use crate::classify::Classifier;
use crate::config::PresentationConfig;
use crate::model::place::text;
use crate::model::{Place, PlaceId};

/// All places sharing one map coordinate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkerGroup {
    pub coord: LatLon,
    /// Members in ingestion order.
    pub places: Vec<PlaceId>,
    pub primary_category: String,
    pub color: Rgb,
    /// Thumbnail of the first panorama place, else of the first member.
    pub preview_thumbnail: Option<String>,
}

impl MarkerGroup {
    pub fn title(&self) -> String {
        format!("{}件の場所", self.places.len())
    }

    pub fn contains(&self, id: PlaceId) -> bool {
        self.places.contains(&id)
    }
}

/// Group places into map markers by coordinate rounded to six decimals.
///
/// Groups appear in the order their first member was ingested. Places
/// without a finite coordinate get no marker.
pub fn group_by_coordinates(
    places: &[Place],
    classifier: &Classifier,
    presentation: &PresentationConfig,
) -> Vec<MarkerGroup> {
    let mut slots: HashMap<String, usize> = HashMap::new();
    let mut buckets: Vec<(LatLon, Vec<PlaceId>)> = Vec::new();

    for (i, place) in places.iter().enumerate() {
        let Some(coord) = place.coord.filter(LatLon::is_finite) else {
            continue;
        };
        let slot = *slots.entry(coord.grid_key()).or_insert_with(|| {
            buckets.push((coord, Vec::new()));
            buckets.len() - 1
        });
        buckets[slot].1.push(PlaceId(i));
    }

    buckets
        .into_iter()
        .map(|(coord, ids)| {
            let categories: Vec<&str> = ids
                .iter()
                .map(|id| {
                    let category = text(&places[id.index()].category);
                    if category.is_empty() {
                        presentation.default_category.as_str()
                    } else {
                        category
                    }
                })
                .collect();
            let primary_category = most_common(&categories)
                .unwrap_or(presentation.default_category.as_str())
                .to_string();
            let preview = ids
                .iter()
                .find(|id| classifier.has_panorama(&places[id.index()]))
                .or(ids.first())
                .and_then(|id| classifier.card_thumbnail(&places[id.index()]));
            MarkerGroup {
                coord,
                color: presentation.category_color(&primary_category),
                primary_category,
                preview_thumbnail: preview,
                places: ids,
            }
        })
        .collect()
}

/// Most frequent item; ties go to the one seen first.
pub fn most_common<'a>(items: &[&'a str]) -> Option<&'a str> {
    let mut counts: Vec<(&'a str, usize)> = Vec::new();
    for &item in items {
        match counts.iter_mut().find(|(seen, _)| *seen == item) {
            Some((_, n)) => *n += 1,
            None => counts.push((item, 1)),
        }
    }
    let mut best: Option<(&'a str, usize)> = None;
    for (item, n) in counts {
        if best.is_none_or(|(_, max)| n > max) {
            best = Some((item, n));
        }
    }
    best.map(|(item, _)| item)
}

/// Bounds enclosing every place with a finite coordinate.
pub fn fit_bounds(places: &[Place]) -> Option<Bounds> {
    let mut coords = places
        .iter()
        .filter_map(|p| p.coord)
        .filter(LatLon::is_finite);
    let first = coords.next()?;
    Some(coords.fold(Bounds::from_point(first), |mut bounds, c| {
        bounds.extend(c);
        bounds
    }))
}
