//! Integration test: ingest a campus export, build the catalog and walk the
//! street-view cursor through it the way the map page does.

use campus_tour_core::deep_link::{overlay_url, pano_param};
use campus_tour_core::ingest::parse_places;
use campus_tour_core::views::cards::build_carousel;
use campus_tour_core::views::info_panel::info_panel;
use campus_tour_core::{Cursor, PlaceId, TourController};
use campus_tour_protocol::{Notice, ViewerCommand};
use pretty_assertions::assert_eq;

fn loaded() -> TourController {
    let data = include_bytes!("fixtures/places.json");
    let places = parse_places(data).expect("fixture should parse");
    let mut controller = TourController::default();
    let commands = controller.load_places(places);
    assert!(
        commands
            .iter()
            .any(|c| matches!(c, ViewerCommand::FitBounds { max_zoom, .. } if *max_zoom == 18.0)),
        "loading should frame the map"
    );
    controller
}

fn ids(raw: &[usize]) -> Vec<PlaceId> {
    raw.iter().copied().map(PlaceId).collect()
}

#[test]
fn catalog_follows_building_order() {
    let controller = loaded();
    assert_eq!(controller.places().len(), 8, "non-object entries are skipped");
    assert_eq!(controller.catalog().ids(), ids(&[1, 0, 2, 7, 4, 3, 6]).as_slice());
    assert!(!controller.catalog().contains(PlaceId(5)));
}

#[test]
fn markers_merge_shared_coordinates() {
    let controller = loaded();
    let groups = controller.marker_groups();
    assert_eq!(groups.len(), 7);
    assert_eq!(groups[0].places, ids(&[0, 1]));
    assert_eq!(groups[0].title(), "2件の場所");
}

#[test]
fn walking_the_catalog_wraps() {
    let mut controller = loaded();
    controller.toggle();
    assert_eq!(controller.current(), Some(PlaceId(1)));

    let mut visited = Vec::new();
    for _ in 0..controller.catalog().len() {
        controller.next();
        visited.extend(controller.current());
    }
    assert_eq!(visited, ids(&[0, 2, 7, 4, 3, 6, 1]));

    controller.previous();
    assert_eq!(controller.current(), Some(PlaceId(6)));
    let panel = info_panel(&controller);
    assert_eq!(panel.title, "図書館");
    assert_eq!(panel.next.location.as_deref(), Some("101教室"));
}

#[test]
fn marker_then_toggle_uses_marker_context() {
    let mut controller = loaded();
    let commands = controller.select_marker(0);
    assert!(commands.iter().any(|c| matches!(
        c,
        ViewerCommand::ShowMarkerPopup { label, .. } if label == "さつき校舎"
    )));
    controller.toggle();
    assert_eq!(
        controller.cursor(),
        &Cursor::Active {
            current: PlaceId(0),
            context: ids(&[0, 1]),
        }
    );
}

#[test]
fn minimap_click_scopes_context_to_building() {
    let mut controller = loaded();
    controller.enter_from_minimap(PlaceId(1));
    assert_eq!(controller.cursor().context(), ids(&[0, 1]).as_slice());
    let dots: Vec<PlaceId> = controller.minimap_markers().iter().map(|m| m.place).collect();
    assert_eq!(dots, ids(&[0, 1]));
}

#[test]
fn deep_link_from_landing_page() {
    let mut controller = loaded();
    let url = overlay_url("Map/images/part2/kaede_front.jpg");
    let query = url.split_once('?').map(|(_, q)| q).unwrap_or_default();
    let pano = pano_param(query).expect("pano parameter");
    let commands = controller.open_deep_link(&pano);
    assert_eq!(controller.current(), Some(PlaceId(2)));
    assert!(commands.contains(&ViewerCommand::LoadPanorama {
        path: "images/part2/kaede_front.jpg".into(),
        yaw: 90.0,
        pitch: 0.0,
        hfov: 100.0,
        min_hfov: 45.0,
        max_hfov: 120.0,
    }));
}

#[test]
fn place_without_panorama_only_notices() {
    let mut controller = loaded();
    controller.enter(PlaceId(2), None);
    let before = controller.cursor().clone();
    let commands = controller.enter(PlaceId(5), None);
    assert_eq!(
        commands,
        vec![ViewerCommand::ShowNotice {
            notice: Notice::NoPanorama,
            duration_ms: 5000,
        }]
    );
    assert_eq!(controller.cursor(), &before);
}

#[test]
fn carousel_groups_by_building() {
    let controller = loaded();
    let labels: Vec<String> = build_carousel(&controller)
        .iter()
        .map(|run| {
            run.group
                .as_ref()
                .map(|g| g.style.label.clone())
                .unwrap_or_default()
        })
        .collect();
    assert_eq!(labels, vec!["さつき", "かえで", "あすなろ", "大学院", "屋外", "図書館"]);
}

#[test]
fn commands_serialize_for_the_host() {
    let mut controller = loaded();
    let commands = controller.toggle();
    let json = serde_json::to_value(&commands).expect("commands serialize");
    assert_eq!(json[0]["kind"], "mode_changed");
    assert_eq!(json[0]["active"], true);
}
