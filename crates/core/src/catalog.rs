use crate::model::{Place, PlaceId};
use crate::ordering::{OrderKey, OrderingPolicy};

/// The navigable sequence: every place with a usable panorama, in display
/// order. Always rebuilt from scratch, never patched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    ids: Vec<PlaceId>,
}

impl Catalog {
    pub fn build(places: &[Place], policy: &OrderingPolicy) -> Self {
        let classifier = policy.classifier();
        let mut keyed: Vec<(PlaceId, OrderKey)> = places
            .iter()
            .enumerate()
            .filter(|(_, place)| classifier.has_panorama(place))
            .map(|(i, place)| (PlaceId(i), policy.key(place)))
            .collect();
        // Stable: equal keys keep ingestion order.
        keyed.sort_by(|(_, a), (_, b)| policy.compare_keys(a, b));
        let ids: Vec<PlaceId> = keyed.into_iter().map(|(id, _)| id).collect();
        tracing::debug!(
            total = places.len(),
            panoramas = ids.len(),
            "built street-view catalog"
        );
        Self { ids }
    }

    pub fn ids(&self) -> &[PlaceId] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, id: PlaceId) -> bool {
        self.ids.contains(&id)
    }

    pub fn position(&self, id: PlaceId) -> Option<usize> {
        self.ids.iter().position(|x| *x == id)
    }

    pub fn first(&self) -> Option<PlaceId> {
        self.ids.first().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn spot(title: &str, category: &str) -> Place {
        Place::new()
            .with_title(title)
            .with_category(category)
            .with_panorama(format!("{title}.jpg"))
    }

    #[test]
    fn priority_then_group_scenario() {
        let places = vec![
            spot("A", "satsuki"),
            spot("B", "satsuki").with_priority(1.0),
            spot("C", "kaede"),
        ];
        let catalog = Catalog::build(&places, &OrderingPolicy::default());
        assert_eq!(catalog.ids(), &[PlaceId(1), PlaceId(0), PlaceId(2)]);
    }

    #[test]
    fn excludes_places_without_panorama() {
        let places = vec![
            spot("A", "satsuki"),
            Place::new().with_title("no pano").with_category("satsuki"),
            spot("C", "kaede").with_panorama("  "),
        ];
        let catalog = Catalog::build(&places, &OrderingPolicy::default());
        assert_eq!(catalog.ids(), &[PlaceId(0)]);
        assert!(!catalog.contains(PlaceId(1)));
    }

    #[test]
    fn ties_keep_input_order() {
        let places = vec![spot("same", "gym"), spot("Same", "gym"), spot("SAME", "gym")];
        let catalog = Catalog::build(&places, &OrderingPolicy::default());
        assert_eq!(catalog.ids(), &[PlaceId(0), PlaceId(1), PlaceId(2)]);
    }

    fn arb_place() -> impl Strategy<Value = Place> {
        let category = prop::sample::select(vec!["satsuki", "kaede", "hiiragi", "gym", "", "広場"]);
        let building = prop::sample::select(vec!["", "さつき校舎", "かえで校舎", "別館"]);
        (
            category,
            building,
            prop::option::of(-3.0f64..3.0),
            prop::option::of(0u8..20),
            "[a-cA-C]{0,3}",
            prop::bool::weighted(0.8),
        )
            .prop_map(|(category, building, priority, row, name, pano)| {
                let mut place = Place::new().with_category(category).with_building(building);
                place.priority = priority;
                place.row_index = row.map(f64::from);
                place.title = Some(name.clone());
                if pano {
                    place.panorama = Some(format!("{name}.jpg"));
                }
                place
            })
    }

    proptest! {
        #[test]
        fn build_is_deterministic_and_filters(places in prop::collection::vec(arb_place(), 0..24)) {
            let policy = OrderingPolicy::default();
            let catalog = Catalog::build(&places, &policy);
            prop_assert_eq!(&catalog, &Catalog::build(&places, &policy));
            for (i, place) in places.iter().enumerate() {
                prop_assert_eq!(
                    catalog.contains(PlaceId(i)),
                    policy.classifier().has_panorama(place)
                );
            }
        }

        #[test]
        fn resorting_sorted_catalog_is_identity(places in prop::collection::vec(arb_place(), 0..24)) {
            let policy = OrderingPolicy::default();
            let catalog = Catalog::build(&places, &policy);
            let sorted: Vec<Place> = catalog
                .ids()
                .iter()
                .map(|id| places[id.index()].clone())
                .collect();
            let again = Catalog::build(&sorted, &policy);
            let identity: Vec<PlaceId> = (0..sorted.len()).map(PlaceId).collect();
            prop_assert_eq!(again.ids(), identity.as_slice());
        }

        #[test]
        fn comparator_is_a_total_order(
            a in arb_place(),
            b in arb_place(),
            c in arb_place(),
        ) {
            let policy = OrderingPolicy::default();
            let ab = policy.compare(&a, &b);
            prop_assert_eq!(ab, policy.compare(&b, &a).reverse());
            prop_assert_eq!(policy.compare(&a, &a), std::cmp::Ordering::Equal);
            if ab.is_le() && policy.compare(&b, &c).is_le() {
                prop_assert!(policy.compare(&a, &c).is_le());
            }
        }
    }

    #[test]
    fn empty_input_builds_empty_catalog() {
        let catalog = Catalog::build(&[], &OrderingPolicy::default());
        assert!(catalog.is_empty());
        assert_eq!(catalog.first(), None);
    }
}
