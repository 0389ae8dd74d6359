use serde::Serialize;

use crate::config::CardGroup;
use crate::model::PlaceId;
use crate::model::place::text;
use crate::navigation::TourController;

/// One spot in the location carousel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CarouselCard {
    pub place: PlaceId,
    pub name: String,
    /// The location line, unless it just repeats the name.
    pub subtitle: Option<String>,
    pub thumbnail: Option<String>,
    pub active: bool,
}

/// Consecutive cards sharing a known building group. Cards outside every
/// known group form runs without a group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardRun {
    pub group: Option<CardGroup>,
    pub cards: Vec<CarouselCard>,
}

/// Carousel contents for the current navigation sequence.
pub fn build_carousel(controller: &TourController) -> Vec<CardRun> {
    let classifier = controller.classifier();
    let presentation = &controller.config().presentation;
    let current = controller.current();
    let mut runs: Vec<CardRun> = Vec::new();

    for id in controller.sequence() {
        let Some(place) = controller.place(id) else {
            continue;
        };
        let name = place.display_name().to_string();
        let location = text(&place.location);
        let subtitle = (!location.is_empty() && location.to_lowercase() != name.to_lowercase())
            .then(|| location.to_string());
        let card = CarouselCard {
            place: id,
            subtitle,
            thumbnail: classifier.card_thumbnail(place),
            active: current == Some(id),
            name,
        };

        let group = presentation
            .card_group(&classifier.group_slug(place))
            .cloned();
        match runs.last_mut() {
            Some(run) if run.group == group => run.cards.push(card),
            _ => runs.push(CardRun {
                group,
                cards: vec![card],
            }),
        }
    }
    runs
}
