//! Street-view navigation controller.
//!
//! [`TourController`] owns the place records, the catalog and the cursor.
//! Every operation runs to completion and returns the [`ViewerCommand`]s the
//! host must apply, in order. Failures are recovered locally into a single
//! notice command.

use campus_tour_protocol::{HostMessage, LatLon, ViewerCommand};

use crate::catalog::Catalog;
use crate::classify::Classifier;
use crate::config::{EmbedMode, TourConfig};
use crate::deep_link;
use crate::error::TourError;
use crate::model::{Cursor, Place, PlaceId};
use crate::ordering::OrderingPolicy;
use crate::timers::{AutoRotate, LoadingIndicator};
use crate::views::markers::{MarkerGroup, fit_bounds, group_by_coordinates};
use crate::views::minimap::{self, MinimapMarker};

#[derive(Debug)]
pub struct TourController {
    config: TourConfig,
    policy: OrderingPolicy,
    places: Vec<Place>,
    catalog: Catalog,
    markers: Vec<MarkerGroup>,
    /// Index into `markers` of the last clicked marker.
    selected_marker: Option<usize>,
    cursor: Cursor,
    viewer_available: bool,
    hfov: f64,
    autorotate: AutoRotate,
    loading: LoadingIndicator,
    now_ms: f64,
}

impl Default for TourController {
    fn default() -> Self {
        Self::new(TourConfig::default())
    }
}

impl TourController {
    pub fn new(config: TourConfig) -> Self {
        Self {
            policy: OrderingPolicy::new(&config),
            places: Vec::new(),
            catalog: Catalog::default(),
            markers: Vec::new(),
            selected_marker: None,
            cursor: Cursor::Inactive,
            viewer_available: true,
            hfov: config.viewer.default_hfov,
            autorotate: AutoRotate::new(&config.viewer),
            loading: LoadingIndicator::new(&config.viewer),
            now_ms: 0.0,
            config,
        }
    }

    pub fn config(&self) -> &TourConfig {
        &self.config
    }

    pub fn classifier(&self) -> &Classifier {
        self.policy.classifier()
    }

    pub fn policy(&self) -> &OrderingPolicy {
        &self.policy
    }

    pub fn places(&self) -> &[Place] {
        &self.places
    }

    pub fn place(&self, id: PlaceId) -> Option<&Place> {
        self.places.get(id.index())
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    pub fn is_active(&self) -> bool {
        self.cursor.is_active()
    }

    pub fn current(&self) -> Option<PlaceId> {
        self.cursor.current()
    }

    pub fn marker_groups(&self) -> &[MarkerGroup] {
        &self.markers
    }

    pub fn selected_marker(&self) -> Option<&MarkerGroup> {
        self.selected_marker.and_then(|i| self.markers.get(i))
    }

    /// Places of the last clicked marker, or empty.
    pub fn last_marker_items(&self) -> &[PlaceId] {
        self.selected_marker()
            .map(|g| g.places.as_slice())
            .unwrap_or(&[])
    }

    pub fn hfov(&self) -> f64 {
        self.hfov
    }

    pub fn autorotate(&self) -> &AutoRotate {
        &self.autorotate
    }

    pub fn is_loading(&self) -> bool {
        self.loading.is_loading()
    }

    /// Whether any timer is waiting to fire.
    pub fn has_pending_timers(&self) -> bool {
        self.autorotate.is_pending() || self.loading.is_pending()
    }

    pub fn set_viewer_available(&mut self, available: bool) {
        self.viewer_available = available;
    }

    pub fn set_embed_mode(&mut self, mode: EmbedMode) {
        self.config.viewer.embed_mode = mode;
    }

    pub fn has_panorama(&self, id: PlaceId) -> bool {
        self.place(id)
            .is_some_and(|p| self.classifier().has_panorama(p))
    }

    /// Minimap dots for the current spot's building, or all of them.
    pub fn minimap_markers(&self) -> Vec<MinimapMarker> {
        let slug = self
            .current()
            .and_then(|id| self.place(id))
            .map(minimap::minimap_slug)
            .filter(|s| !s.is_empty());
        minimap::build_minimap_markers(
            &self.places,
            self.classifier(),
            &self.config.presentation,
            slug.as_deref(),
        )
    }

    // ---- data ----

    /// Install the initial place set and frame the map around it.
    pub fn load_places(&mut self, places: Vec<Place>) -> Vec<ViewerCommand> {
        let mut commands = self.exit();
        self.places = places;
        self.rebuild();
        self.selected_marker = None;
        commands.extend([
            ViewerCommand::SelectMarker { at: None },
            ViewerCommand::HideMarkerPopup,
        ]);
        if self.places.is_empty() {
            commands.extend(self.recover(TourError::NoData));
            return commands;
        }
        commands.extend(self.fit_command());
        tracing::debug!(
            places = self.places.len(),
            markers = self.markers.len(),
            "loaded places"
        );
        commands
    }

    /// Swap in a new place set, keeping the open panorama when it still
    /// exists under the same path.
    pub fn replace_places(&mut self, places: Vec<Place>) -> Vec<ViewerCommand> {
        let previous = match &self.cursor {
            Cursor::Inactive => None,
            Cursor::Active { current, context } => Some((
                self.panorama_path(*current),
                context
                    .iter()
                    .filter_map(|id| self.panorama_path(*id))
                    .collect::<Vec<_>>(),
            )),
        };

        self.places = places;
        self.rebuild();
        self.selected_marker = None;
        let mut commands = vec![
            ViewerCommand::SelectMarker { at: None },
            ViewerCommand::HideMarkerPopup,
        ];
        if self.places.is_empty() {
            commands.extend(self.exit());
            commands.extend(self.recover(TourError::NoData));
            return commands;
        }

        match previous {
            None => {}
            Some((None, _)) => commands.extend(self.exit()),
            Some((Some(current_path), context_paths)) => match self.find_by_path(&current_path) {
                Some(current) => {
                    let mut context: Vec<PlaceId> = context_paths
                        .iter()
                        .filter_map(|path| self.find_by_path(path))
                        .collect();
                    if context.is_empty() {
                        context = self.catalog.ids().to_vec();
                    }
                    tracing::debug!(place = %current, "kept current panorama across reload");
                    self.cursor = Cursor::Active { current, context };
                    commands.push(ViewerCommand::HighlightMinimapMarker {
                        place: Some(current.index()),
                    });
                }
                None => {
                    tracing::debug!(path = %current_path, "current panorama gone after reload");
                    commands.extend(self.exit());
                }
            },
        }
        commands.extend(self.fit_command());
        commands
    }

    /// Replace one record and rebuild everything derived from it.
    pub fn update_place(&mut self, id: PlaceId, place: Place) -> Vec<ViewerCommand> {
        if id.index() >= self.places.len() {
            return self.recover(TourError::UnknownPlace(id));
        }
        self.places[id.index()] = place;
        let selected_key = self.selected_marker().map(|g| g.coord.grid_key());
        self.rebuild();
        self.selected_marker =
            selected_key.and_then(|key| self.markers.iter().position(|g| g.coord.grid_key() == key));

        if self.current().is_some_and(|current| !self.has_panorama(current)) {
            tracing::debug!(place = %id, "current place lost its panorama");
            return self.exit();
        }
        Vec::new()
    }

    fn rebuild(&mut self) {
        self.catalog = Catalog::build(&self.places, &self.policy);
        self.markers = group_by_coordinates(
            &self.places,
            self.policy.classifier(),
            &self.config.presentation,
        );
    }

    fn fit_command(&self) -> Option<ViewerCommand> {
        fit_bounds(&self.places).map(|bounds| ViewerCommand::FitBounds {
            bounds,
            max_zoom: self.config.map.max_fit_zoom,
            duration_ms: self.config.map.fly_duration_ms,
        })
    }

    fn panorama_path(&self, id: PlaceId) -> Option<String> {
        self.place(id)
            .and_then(|p| self.classifier().resolve_panorama_path(p))
    }

    fn find_by_path(&self, path: &str) -> Option<PlaceId> {
        self.places
            .iter()
            .position(|p| self.classifier().resolve_panorama_path(p).as_deref() == Some(path))
            .map(PlaceId)
    }

    // ---- navigation ----

    /// Open the panorama of `id`. `context` narrows what the user navigates
    /// through; without it (or when none of it has a panorama) the whole
    /// catalog is used.
    pub fn enter(&mut self, id: PlaceId, context: Option<&[PlaceId]>) -> Vec<ViewerCommand> {
        match self.try_enter(id, context) {
            Ok(commands) => commands,
            Err(err) => self.recover(err),
        }
    }

    fn try_enter(
        &mut self,
        id: PlaceId,
        context: Option<&[PlaceId]>,
    ) -> Result<Vec<ViewerCommand>, TourError> {
        let place = self.place(id).ok_or(TourError::UnknownPlace(id))?;
        let path = self
            .classifier()
            .resolve_panorama_path(place)
            .ok_or_else(|| TourError::NoPanorama {
                name: place.display_name().to_string(),
            })?;

        if self.config.viewer.embed_mode == EmbedMode::Embedded {
            tracing::debug!(place = %id, "asking host to open panorama overlay");
            return Ok(vec![ViewerCommand::PostToHost {
                message: HostMessage::open(path),
            }]);
        }
        if !self.viewer_available {
            return Err(TourError::ViewerUnavailable);
        }

        let name = place.display_name().to_string();
        let slug = minimap::minimap_slug(place);
        let viewer = &self.config.viewer;
        let hfov = viewer.clamp_hfov(place.fov.unwrap_or(viewer.default_hfov));
        let load = ViewerCommand::LoadPanorama {
            path,
            yaw: place.yaw.unwrap_or(0.0),
            pitch: place.pitch.unwrap_or(0.0),
            hfov,
            min_hfov: viewer.min_hfov,
            max_hfov: viewer.max_hfov,
        };

        let mut context: Vec<PlaceId> = context
            .unwrap_or(&[])
            .iter()
            .copied()
            .filter(|c| self.has_panorama(*c))
            .collect();
        if context.is_empty() {
            context = self.catalog.ids().to_vec();
        }

        let was_active = self.cursor.is_active();
        self.cursor = Cursor::Active { current: id, context };
        self.hfov = hfov;

        let mut commands = Vec::with_capacity(10);
        if !was_active {
            commands.push(ViewerCommand::ModeChanged { active: true });
            commands.push(ViewerCommand::HideMarkerPopup);
        }
        commands.push(ViewerCommand::ShowToast {
            text: name,
            duration_ms: self.config.presentation.toast_ms,
        });
        commands.push(ViewerCommand::SetMinimapBase {
            icon: minimap::minimap_icon(&slug, &self.config.assets),
        });
        commands.push(ViewerCommand::HighlightMinimapMarker {
            place: Some(id.index()),
        });
        commands.push(load);
        commands.push(self.loading.start(self.now_ms));
        commands.push(self.autorotate.command());
        tracing::debug!(place = %id, "entered street view");
        Ok(commands)
    }

    /// Leave navigation mode. Stops rotation and clears every timer.
    ///
    /// Safe at any time: when already inactive it only drops pending timers.
    pub fn exit(&mut self) -> Vec<ViewerCommand> {
        if !self.cursor.is_active() {
            self.autorotate.cancel_resume();
            return self.loading.cancel().into_iter().collect();
        }
        self.cursor = Cursor::Inactive;
        let mut commands = vec![self.autorotate.disable()];
        commands.extend(self.loading.cancel());
        commands.extend([
            ViewerCommand::ModeChanged { active: false },
            ViewerCommand::HighlightMinimapMarker { place: None },
            ViewerCommand::HideToast,
        ]);
        tracing::debug!("left street view");
        commands
    }

    /// The sequence next/previous walk through: the catalog, else the
    /// current context, else the last clicked marker's places.
    pub fn sequence(&self) -> Vec<PlaceId> {
        let with_panorama = |ids: &[PlaceId]| -> Vec<PlaceId> {
            ids.iter().copied().filter(|id| self.has_panorama(*id)).collect()
        };
        [
            self.catalog.ids(),
            self.cursor.context(),
            self.last_marker_items(),
        ]
        .into_iter()
        .map(with_panorama)
        .find(|seq| !seq.is_empty())
        .unwrap_or_default()
    }

    /// The place `step(delta)` would open.
    pub fn nav_target(&self, delta: i64) -> Option<PlaceId> {
        nav_target_in(&self.sequence(), self.current(), delta)
    }

    /// Move `delta` places through the sequence, wrapping at both ends.
    pub fn step(&mut self, delta: i64) -> Vec<ViewerCommand> {
        let sequence = self.sequence();
        match nav_target_in(&sequence, self.current(), delta) {
            Some(target) => self.enter(target, Some(&sequence)),
            None => Vec::new(),
        }
    }

    pub fn next(&mut self) -> Vec<ViewerCommand> {
        self.step(1)
    }

    pub fn previous(&mut self) -> Vec<ViewerCommand> {
        self.step(-1)
    }

    /// The street-view button: leave when active, otherwise open the last
    /// marker's first panorama or the first catalog entry.
    pub fn toggle(&mut self) -> Vec<ViewerCommand> {
        if self.cursor.is_active() {
            return self.exit();
        }
        let marker_items = self.last_marker_items().to_vec();
        if let Some(first) = marker_items.iter().copied().find(|id| self.has_panorama(*id)) {
            return self.enter(first, Some(&marker_items));
        }
        match self.catalog.first() {
            Some(first) => {
                let catalog = self.catalog.ids().to_vec();
                self.enter(first, Some(&catalog))
            }
            None => self.recover(TourError::NoSpots),
        }
    }

    /// Open a deep-linked panorama. Unknown references are ignored.
    pub fn open_deep_link(&mut self, pano: &str) -> Vec<ViewerCommand> {
        match deep_link::find_target(&self.places, self.classifier(), pano) {
            Some(id) => self.enter(id, None),
            None => {
                tracing::debug!(pano, "deep link matches no place");
                Vec::new()
            }
        }
    }

    /// Leave and ask the host page to close the overlay.
    pub fn request_close(&mut self, target_section_id: Option<String>) -> Vec<ViewerCommand> {
        let mut commands = self.exit();
        commands.push(ViewerCommand::PostToHost {
            message: HostMessage::CloseOverlay { target_section_id },
        });
        commands
    }

    // ---- map & minimap ----

    /// A map marker was clicked.
    pub fn select_marker(&mut self, index: usize) -> Vec<ViewerCommand> {
        let Some(group) = self.markers.get(index) else {
            tracing::warn!(index, "ignoring click on unknown marker");
            return Vec::new();
        };
        let coord = group.coord;
        let street: Vec<PlaceId> = group
            .places
            .iter()
            .copied()
            .filter(|id| self.has_panorama(*id))
            .collect();
        let label = group
            .places
            .first()
            .and_then(|id| self.place(*id))
            .map(Place::popup_label)
            .unwrap_or_default();

        self.selected_marker = Some(index);
        let mut commands = vec![
            ViewerCommand::SelectMarker { at: Some(coord) },
            ViewerCommand::FlyTo {
                center: coord,
                zoom: self.config.map.focus_zoom,
                duration_ms: self.config.map.fly_duration_ms,
            },
        ];
        if street.is_empty() {
            commands.push(ViewerCommand::HideMarkerPopup);
            return commands;
        }
        if let Cursor::Active { context, .. } = &mut self.cursor {
            *context = street;
        }
        commands.push(ViewerCommand::ShowMarkerPopup { at: coord, label });
        commands
    }

    /// Marker click reported by coordinate.
    pub fn select_marker_at(&mut self, at: LatLon) -> Vec<ViewerCommand> {
        match self.markers.iter().position(|g| g.coord.approx_eq(&at)) {
            Some(index) => self.select_marker(index),
            None => Vec::new(),
        }
    }

    pub fn clear_marker_selection(&mut self) -> Vec<ViewerCommand> {
        self.selected_marker = None;
        vec![
            ViewerCommand::SelectMarker { at: None },
            ViewerCommand::HideMarkerPopup,
        ]
    }

    /// A click on empty map. Ignored while a panorama is open.
    pub fn map_background_click(&mut self) -> Vec<ViewerCommand> {
        if self.cursor.is_active() {
            return Vec::new();
        }
        self.clear_marker_selection()
    }

    /// A carousel card was picked: fly there and open it unless current.
    pub fn select_card(&mut self, id: PlaceId) -> Vec<ViewerCommand> {
        let Some(place) = self.place(id) else {
            return self.recover(TourError::UnknownPlace(id));
        };
        let mut commands: Vec<ViewerCommand> = place
            .coord
            .filter(LatLon::is_finite)
            .map(|center| ViewerCommand::FlyTo {
                center,
                zoom: self.config.map.focus_zoom,
                duration_ms: self.config.map.card_fly_duration_ms,
            })
            .into_iter()
            .collect();
        if self.current() != Some(id) {
            let sequence = self.sequence();
            commands.extend(self.enter(id, Some(&sequence)));
        }
        commands
    }

    /// A minimap dot was clicked: open it among its building's spots.
    pub fn enter_from_minimap(&mut self, id: PlaceId) -> Vec<ViewerCommand> {
        let context = minimap::minimap_context(&self.places, self.classifier(), id);
        self.enter(id, Some(&context))
    }

    // ---- viewer ----

    /// Change the field of view by `delta` degrees within the configured
    /// limits. Needs an open panorama.
    pub fn adjust_zoom(&mut self, delta: f64) -> Vec<ViewerCommand> {
        if !self.cursor.is_active() || !delta.is_finite() {
            return Vec::new();
        }
        self.hfov = self.config.viewer.clamp_hfov(self.hfov + delta);
        vec![ViewerCommand::SetHfov { hfov: self.hfov }]
    }

    pub fn zoom_in(&mut self) -> Vec<ViewerCommand> {
        self.adjust_zoom(-self.config.viewer.zoom_step)
    }

    pub fn zoom_out(&mut self) -> Vec<ViewerCommand> {
        self.adjust_zoom(self.config.viewer.zoom_step)
    }

    pub fn toggle_autorotate(&mut self) -> Vec<ViewerCommand> {
        let command = self.autorotate.toggle();
        if self.cursor.is_active() {
            vec![command]
        } else {
            Vec::new()
        }
    }

    pub fn interaction_start(&mut self) {
        self.autorotate.interaction_start();
    }

    pub fn interaction_end(&mut self, now_ms: f64) {
        self.now_ms = now_ms;
        self.autorotate.interaction_end(now_ms);
    }

    pub fn panorama_loaded(&mut self) -> Vec<ViewerCommand> {
        self.loading.loaded().into_iter().collect()
    }

    /// Advance time and fire due timers.
    pub fn tick(&mut self, now_ms: f64) -> Vec<ViewerCommand> {
        self.now_ms = now_ms;
        let mut commands = Vec::new();
        if let Some(resume) = self.autorotate.tick(now_ms) {
            if self.cursor.is_active() {
                commands.push(resume);
            }
        }
        commands.extend(self.loading.tick(now_ms));
        commands
    }

    fn recover(&self, err: TourError) -> Vec<ViewerCommand> {
        tracing::warn!(error = %err, "street view operation failed");
        vec![ViewerCommand::ShowNotice {
            notice: err.notice(),
            duration_ms: self.config.presentation.notice_ms,
        }]
    }
}

/// Target of moving `delta` places from `current` through `sequence`.
///
/// A missing current item counts as the first one. Returns `None` when the
/// sequence has at most one place or the move is a full loop.
pub fn nav_target_in(sequence: &[PlaceId], current: Option<PlaceId>, delta: i64) -> Option<PlaceId> {
    let len = sequence.len();
    if len <= 1 || delta == 0 {
        return None;
    }
    let step = delta.rem_euclid(len as i64) as usize;
    if step == 0 {
        return None;
    }
    let index = current
        .and_then(|c| sequence.iter().position(|id| *id == c))
        .unwrap_or(0);
    sequence.get((index + step) % len).copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use campus_tour_protocol::Notice;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn spot(title: &str, category: &str) -> Place {
        Place::new()
            .with_title(title)
            .with_category(category)
            .with_panorama(format!("{title}.jpg"))
    }

    fn controller(places: Vec<Place>) -> TourController {
        let mut c = TourController::default();
        c.load_places(places);
        c
    }

    fn pqr() -> TourController {
        controller(vec![
            spot("P", "kaede").with_row_index(1.0),
            spot("Q", "kaede").with_row_index(2.0),
            spot("R", "kaede").with_row_index(3.0),
        ])
    }

    fn notices(commands: &[ViewerCommand]) -> Vec<Notice> {
        commands
            .iter()
            .filter_map(|c| match c {
                ViewerCommand::ShowNotice { notice, .. } => Some(*notice),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn previous_wraps_around() {
        let mut c = pqr();
        c.enter(PlaceId(1), None);
        c.step(-1);
        assert_eq!(c.current(), Some(PlaceId(0)));
        c.step(-1);
        assert_eq!(c.current(), Some(PlaceId(2)));
    }

    #[test]
    fn step_zero_changes_nothing() {
        let mut c = pqr();
        c.enter(PlaceId(1), None);
        assert!(c.step(0).is_empty());
        assert_eq!(c.current(), Some(PlaceId(1)));
        assert!(c.step(3).is_empty());
        assert_eq!(c.current(), Some(PlaceId(1)));
    }

    #[test]
    fn step_from_inactive_counts_from_first() {
        let mut c = pqr();
        c.step(1);
        assert_eq!(c.current(), Some(PlaceId(1)));
        assert_eq!(c.cursor().context(), &[PlaceId(0), PlaceId(1), PlaceId(2)]);
    }

    #[test]
    fn entering_without_panorama_leaves_state_and_notices_once() {
        let mut c = controller(vec![spot("A", "kaede"), Place::new().with_title("B")]);
        let commands = c.enter(PlaceId(1), None);
        assert_eq!(notices(&commands), vec![Notice::NoPanorama]);
        assert_eq!(commands.len(), 1);
        assert_eq!(c.cursor(), &Cursor::Inactive);

        c.enter(PlaceId(0), None);
        let commands = c.enter(PlaceId(1), None);
        assert_eq!(commands.len(), 1);
        assert_eq!(c.current(), Some(PlaceId(0)));
    }

    #[test]
    fn unknown_id_is_a_notice() {
        let mut c = pqr();
        let commands = c.enter(PlaceId(99), None);
        assert_eq!(notices(&commands), vec![Notice::NoPanorama]);
        assert!(!c.is_active());
    }

    #[test]
    fn enter_emits_viewer_commands() {
        let mut c = controller(vec![
            spot("A", "kaede")
                .with_minimap_category("kaede")
                .with_orientation(30.0, -5.0, 200.0),
        ]);
        let commands = c.enter(PlaceId(0), None);
        assert_eq!(
            commands,
            vec![
                ViewerCommand::ModeChanged { active: true },
                ViewerCommand::HideMarkerPopup,
                ViewerCommand::ShowToast {
                    text: "A".into(),
                    duration_ms: 5000
                },
                ViewerCommand::SetMinimapBase {
                    icon: "images/minimap/kaede.png".into()
                },
                ViewerCommand::HighlightMinimapMarker { place: Some(0) },
                ViewerCommand::LoadPanorama {
                    path: "images/part2/A.jpg".into(),
                    yaw: 30.0,
                    pitch: -5.0,
                    hfov: 120.0,
                    min_hfov: 45.0,
                    max_hfov: 120.0,
                },
                ViewerCommand::LoadingChanged { loading: true },
                ViewerCommand::StartAutoRotate { deg_per_sec: 0.7 },
            ]
        );
    }

    #[test]
    fn context_filters_to_panoramas_or_falls_back() {
        let mut c = controller(vec![
            spot("A", "kaede").with_row_index(1.0),
            Place::new().with_title("B"),
            spot("C", "kaede").with_row_index(2.0),
        ]);
        c.enter(PlaceId(2), Some(&[PlaceId(1), PlaceId(2)]));
        assert_eq!(c.cursor().context(), &[PlaceId(2)]);
        c.enter(PlaceId(0), Some(&[PlaceId(1)]));
        assert_eq!(c.cursor().context(), &[PlaceId(0), PlaceId(2)]);
    }

    #[test]
    fn exit_clears_state_and_timers() {
        let mut c = pqr();
        c.enter(PlaceId(0), None);
        c.interaction_start();
        c.interaction_end(10.0);
        assert!(c.has_pending_timers());
        let commands = c.exit();
        assert_eq!(c.cursor(), &Cursor::Inactive);
        assert!(!c.has_pending_timers());
        assert!(!c.autorotate().is_enabled());
        assert!(commands.contains(&ViewerCommand::ModeChanged { active: false }));
        assert!(commands.contains(&ViewerCommand::HideToast));
        assert!(c.exit().is_empty());
    }

    #[test]
    fn exit_while_inactive_drops_pending_resume() {
        let mut c = pqr();
        c.interaction_start();
        c.interaction_end(0.0);
        assert!(c.has_pending_timers());
        assert!(c.exit().is_empty());
        assert!(!c.has_pending_timers());
        assert!(c.autorotate().is_enabled());
        assert!(c.tick(10_000.0).is_empty());
    }

    #[test]
    fn embedded_mode_posts_to_host() {
        let mut c = pqr();
        c.set_embed_mode(EmbedMode::Embedded);
        let commands = c.enter(PlaceId(0), None);
        assert_eq!(
            commands,
            vec![ViewerCommand::PostToHost {
                message: HostMessage::open("images/part2/P.jpg")
            }]
        );
        assert!(!c.is_active());
    }

    #[test]
    fn unavailable_viewer_is_reported() {
        let mut c = pqr();
        c.set_viewer_available(false);
        let commands = c.enter(PlaceId(0), None);
        assert_eq!(notices(&commands), vec![Notice::ViewerUnavailable]);
        assert!(!c.is_active());
    }

    #[test]
    fn toggle_prefers_marker_then_catalog() {
        let mut c = controller(vec![
            spot("A", "satsuki").with_coord(1.0, 1.0),
            spot("B", "kaede").with_coord(2.0, 2.0),
            Place::new().with_title("info").with_coord(2.0, 2.0),
        ]);
        c.toggle();
        assert_eq!(c.current(), Some(PlaceId(0)));
        c.toggle();
        assert!(!c.is_active());

        c.select_marker(1);
        c.toggle();
        assert_eq!(c.current(), Some(PlaceId(1)));
        assert_eq!(c.cursor().context(), &[PlaceId(1)]);
    }

    #[test]
    fn toggle_without_spots_notices() {
        let mut c = controller(vec![Place::new().with_title("x")]);
        assert_eq!(notices(&c.toggle()), vec![Notice::NoSpots]);
    }

    #[test]
    fn load_empty_reports_no_data() {
        let mut c = TourController::default();
        assert_eq!(notices(&c.load_places(Vec::new())), vec![Notice::NoData]);
    }

    #[test]
    fn background_click_ignored_while_active() {
        let mut c = controller(vec![spot("A", "kaede").with_coord(1.0, 1.0)]);
        c.select_marker(0);
        c.enter(PlaceId(0), None);
        assert!(c.map_background_click().is_empty());
        assert!(c.selected_marker().is_some());
        c.exit();
        c.map_background_click();
        assert!(c.selected_marker().is_none());
    }

    #[test]
    fn zoom_is_clamped() {
        let mut c = pqr();
        assert!(c.zoom_in().is_empty());
        c.enter(PlaceId(0), None);
        assert_eq!(c.zoom_out(), vec![ViewerCommand::SetHfov { hfov: 120.0 }]);
        for _ in 0..10 {
            c.zoom_in();
        }
        assert_eq!(c.hfov(), 45.0);
    }

    #[test]
    fn autorotate_resumes_only_while_active() {
        let mut c = pqr();
        c.enter(PlaceId(0), None);
        c.interaction_start();
        c.interaction_end(100.0);
        assert_eq!(
            c.tick(360.0),
            vec![ViewerCommand::StartAutoRotate { deg_per_sec: 0.7 }]
        );
        assert_eq!(
            c.tick(1200.0),
            vec![ViewerCommand::LoadingChanged { loading: false }]
        );

        c.interaction_start();
        c.interaction_end(2000.0);
        c.exit();
        assert!(c.tick(3000.0).is_empty());
    }

    #[test]
    fn update_place_exits_when_panorama_removed() {
        let mut c = pqr();
        c.enter(PlaceId(1), None);
        let commands = c.update_place(PlaceId(1), Place::new().with_title("Q"));
        assert!(commands.contains(&ViewerCommand::ModeChanged { active: false }));
        assert!(!c.is_active());
        assert_eq!(c.catalog().len(), 2);
    }

    #[test]
    fn replace_places_relocates_current() {
        let mut c = pqr();
        c.enter(PlaceId(1), None);
        c.replace_places(vec![spot("Q", "kaede"), spot("Z", "satsuki")]);
        assert_eq!(c.current(), Some(PlaceId(0)));

        c.replace_places(vec![spot("Z", "satsuki")]);
        assert!(!c.is_active());
    }

    #[test]
    fn deep_link_opens_matching_place() {
        let mut c = pqr();
        c.open_deep_link("images/part2/R.jpg");
        assert_eq!(c.current(), Some(PlaceId(2)));
        assert!(c.open_deep_link("nothing.jpg").is_empty());
    }

    #[test]
    fn request_close_posts_section() {
        let mut c = pqr();
        c.enter(PlaceId(0), None);
        let commands = c.request_close(Some("access".into()));
        assert!(!c.is_active());
        assert_eq!(
            commands.last(),
            Some(&ViewerCommand::PostToHost {
                message: HostMessage::CloseOverlay {
                    target_section_id: Some("access".into())
                }
            })
        );
    }

    #[test]
    fn nav_target_labels_neighbors() {
        let mut c = pqr();
        c.enter(PlaceId(0), None);
        assert_eq!(c.nav_target(1), Some(PlaceId(1)));
        assert_eq!(c.nav_target(-1), Some(PlaceId(2)));
    }

    proptest! {
        #[test]
        fn stepping_len_times_returns_to_start(len in 2usize..12, start in 0usize..12) {
            let start = start % len;
            let places = (0..len)
                .map(|i| spot(&format!("s{i:02}"), "kaede").with_row_index(i as f64))
                .collect();
            let mut c = controller(places);
            c.enter(PlaceId(start), None);
            for _ in 0..len {
                c.step(1);
            }
            prop_assert_eq!(c.current(), Some(PlaceId(start)));
        }

        #[test]
        fn nav_target_stays_in_sequence(len in 0usize..8, current in 0usize..10, delta in -20i64..20) {
            let seq: Vec<PlaceId> = (0..len).map(PlaceId).collect();
            match nav_target_in(&seq, Some(PlaceId(current)), delta) {
                Some(target) => prop_assert!(seq.contains(&target)),
                None => prop_assert!(len <= 1 || delta.rem_euclid(len as i64) == 0),
            }
        }
    }
}
