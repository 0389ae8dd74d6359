use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use icu_collator::options::CollatorOptions;
use icu_collator::{Collator, CollatorBorrowed};
use icu_locale_core::locale;

use crate::classify::Classifier;
use crate::config::TourConfig;
use crate::model::Place;
use crate::model::place::text;

/// Bucket for spots in one of the flagship buildings.
const FLAGSHIP_BUCKET: u8 = 0;
const DEFAULT_BUCKET: u8 = 10;

/// Sort key of a place under an [`OrderingPolicy`].
///
/// Fields are compared in declaration order by
/// [`OrderingPolicy::compare_keys`], each one breaking ties of the previous.
/// Optional numbers sort present-before-absent, then ascending.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderKey {
    pub group_rank: usize,
    pub priority: Option<f64>,
    pub bucket: u8,
    pub row_index: Option<f64>,
    /// Lowercased display name, collated rather than compared bytewise.
    pub name: String,
}

fn cmp_present_first(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.total_cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// English collation of spot names.
///
/// Accented Latin sorts next to its base letter and hiragana next to the
/// matching katakana. Falls back to code point order if the collation data
/// cannot be loaded.
#[derive(Clone)]
pub struct NameCollator {
    collator: Option<Arc<CollatorBorrowed<'static>>>,
}

impl NameCollator {
    pub fn english() -> Self {
        let collator = match Collator::try_new(locale!("en").into(), CollatorOptions::default()) {
            Ok(collator) => Some(Arc::new(collator)),
            Err(err) => {
                tracing::warn!(error = %err, "name collation unavailable, using code point order");
                None
            }
        };
        Self { collator }
    }

    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        match &self.collator {
            Some(collator) => collator.compare(a, b).then_with(|| a.cmp(b)),
            None => a.cmp(b),
        }
    }
}

impl fmt::Debug for NameCollator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NameCollator")
            .field("collated", &self.collator.is_some())
            .finish()
    }
}

/// Display order of panorama spots.
///
/// Keeps each building's spots contiguous (known groups first, in the
/// configured order), then honors explicit priorities, lets flagship
/// buildings lead, and falls back to sheet row and name.
#[derive(Debug, Clone)]
pub struct OrderingPolicy {
    classifier: Classifier,
    group_order: Vec<String>,
    flagship_buildings: Vec<String>,
    names: NameCollator,
}

impl Default for OrderingPolicy {
    fn default() -> Self {
        Self::new(&TourConfig::default())
    }
}

impl OrderingPolicy {
    pub fn new(config: &TourConfig) -> Self {
        Self {
            classifier: Classifier::new(config),
            group_order: config.ordering.group_order.clone(),
            flagship_buildings: config.ordering.flagship_buildings.clone(),
            names: NameCollator::english(),
        }
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// Position of a group slug in the configured order; unknown groups
    /// share the rank after the last known one.
    pub fn group_rank(&self, slug: &str) -> usize {
        self.group_order
            .iter()
            .position(|g| g == slug)
            .unwrap_or(self.group_order.len())
    }

    pub fn bucket(&self, place: &Place) -> u8 {
        let building = text(&place.building);
        if self.flagship_buildings.iter().any(|b| b == building) {
            FLAGSHIP_BUCKET
        } else {
            DEFAULT_BUCKET
        }
    }

    pub fn key(&self, place: &Place) -> OrderKey {
        OrderKey {
            group_rank: self.group_rank(&self.classifier.group_slug(place)),
            priority: place.priority,
            bucket: self.bucket(place),
            row_index: place.row_index,
            name: place.display_name().to_lowercase(),
        }
    }

    pub fn compare_keys(&self, a: &OrderKey, b: &OrderKey) -> Ordering {
        a.group_rank
            .cmp(&b.group_rank)
            .then_with(|| cmp_present_first(a.priority, b.priority))
            .then_with(|| a.bucket.cmp(&b.bucket))
            .then_with(|| cmp_present_first(a.row_index, b.row_index))
            .then_with(|| self.names.compare(&a.name, &b.name))
    }

    pub fn compare(&self, a: &Place, b: &Place) -> Ordering {
        self.compare_keys(&self.key(a), &self.key(b))
    }
}
