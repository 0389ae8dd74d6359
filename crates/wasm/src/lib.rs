use std::sync::Mutex;

use campus_tour_core::config::ConfigError;
use campus_tour_core::deep_link::pano_param;
use campus_tour_core::ingest::parse_places;
use campus_tour_core::views::{cards, info_panel};
use campus_tour_core::{EmbedMode, Place, PlaceId, TourConfig, TourController};
use campus_tour_protocol::{HostMessage, IncomingMessage, LatLon, ViewerCommand};
use serde::Serialize;
use thiserror::Error;
use wasm_bindgen::prelude::*;

static CONTROLLER: Mutex<Option<TourController>> = Mutex::new(None);

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("controller not initialized; call init_controller() first")]
    NotInitialized,
    #[error("controller state is poisoned")]
    Poisoned,
    #[error("unknown embed mode: {0}")]
    UnknownEmbedMode(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

fn with_controller<T>(f: impl FnOnce(&mut TourController) -> T) -> Result<T, BridgeError> {
    let mut guard = CONTROLLER.lock().map_err(|_| BridgeError::Poisoned)?;
    let controller = guard.as_mut().ok_or(BridgeError::NotInitialized)?;
    Ok(f(controller))
}

fn read_controller<T>(f: impl FnOnce(&TourController) -> T) -> Result<T, BridgeError> {
    let guard = CONTROLLER.lock().map_err(|_| BridgeError::Poisoned)?;
    let controller = guard.as_ref().ok_or(BridgeError::NotInitialized)?;
    Ok(f(controller))
}

fn run(f: impl FnOnce(&mut TourController) -> Vec<ViewerCommand>) -> Result<String, BridgeError> {
    let commands = with_controller(f)?;
    Ok(serde_json::to_string(&commands)?)
}

fn to_json<T: Serialize>(f: impl FnOnce(&TourController) -> T) -> Result<String, BridgeError> {
    let value = read_controller(f)?;
    Ok(serde_json::to_string(&value)?)
}

/// Absent or malformed data loads as an empty set, which the controller
/// reports as a notice instead of failing the call.
fn places_or_empty(data: &[u8]) -> Vec<Place> {
    parse_places(data).unwrap_or_else(|err| {
        tracing::warn!(error = %err, "place data unusable, loading nothing");
        Vec::new()
    })
}

fn init_inner(config_toml: Option<&str>) -> Result<(), BridgeError> {
    let config = match config_toml.filter(|s| !s.trim().is_empty()) {
        Some(toml) => TourConfig::from_toml_str(toml)?,
        None => TourConfig::default(),
    };
    let mut guard = CONTROLLER.lock().map_err(|_| BridgeError::Poisoned)?;
    *guard = Some(TourController::new(config));
    tracing::debug!("tour controller initialized");
    Ok(())
}

fn parse_embed_mode(mode: &str) -> Result<EmbedMode, BridgeError> {
    match mode {
        "standalone" => Ok(EmbedMode::Standalone),
        "embedded" => Ok(EmbedMode::Embedded),
        "overlay" => Ok(EmbedMode::Overlay),
        other => Err(BridgeError::UnknownEmbedMode(other.to_string())),
    }
}

/// Create the controller. `config_toml` overrides the built-in defaults.
#[wasm_bindgen]
pub fn init_controller(config_toml: Option<String>) -> Result<(), JsError> {
    Ok(init_inner(config_toml.as_deref())?)
}

/// Tell the controller how the page is hosted: `standalone`, `embedded`
/// (inside the landing page iframe) or `overlay`.
#[wasm_bindgen]
pub fn set_embed_mode(mode: &str) -> Result<(), JsError> {
    let mode = parse_embed_mode(mode)?;
    Ok(with_controller(|c| c.set_embed_mode(mode))?)
}

#[wasm_bindgen]
pub fn set_viewer_available(available: bool) -> Result<(), JsError> {
    Ok(with_controller(|c| c.set_viewer_available(available))?)
}

/// Load place records (JSON bytes). Returns viewer commands as JSON.
#[wasm_bindgen]
pub fn load_places(data: &[u8]) -> Result<String, JsError> {
    let places = places_or_empty(data);
    Ok(run(|c| c.load_places(places))?)
}

#[wasm_bindgen]
pub fn replace_places(data: &[u8]) -> Result<String, JsError> {
    let places = places_or_empty(data);
    Ok(run(|c| c.replace_places(places))?)
}

/// Open a place. `context_json` is an optional JSON array of place indices.
#[wasm_bindgen]
pub fn enter(place: usize, context_json: Option<String>) -> Result<String, JsError> {
    let context: Option<Vec<PlaceId>> = context_json
        .as_deref()
        .map(serde_json::from_str)
        .transpose()?;
    Ok(run(|c| c.enter(PlaceId(place), context.as_deref()))?)
}

#[wasm_bindgen]
pub fn exit() -> Result<String, JsError> {
    Ok(run(TourController::exit)?)
}

#[wasm_bindgen]
pub fn step(delta: i32) -> Result<String, JsError> {
    Ok(run(|c| c.step(i64::from(delta)))?)
}

#[wasm_bindgen]
pub fn toggle() -> Result<String, JsError> {
    Ok(run(TourController::toggle)?)
}

#[wasm_bindgen]
pub fn select_marker(index: usize) -> Result<String, JsError> {
    Ok(run(|c| c.select_marker(index))?)
}

/// Marker click as reported by the map, which only knows the coordinate.
#[wasm_bindgen]
pub fn select_marker_at(lat: f64, lon: f64) -> Result<String, JsError> {
    Ok(run(|c| c.select_marker_at(LatLon::new(lat, lon)))?)
}

#[wasm_bindgen]
pub fn map_background_click() -> Result<String, JsError> {
    Ok(run(TourController::map_background_click)?)
}

#[wasm_bindgen]
pub fn select_card(place: usize) -> Result<String, JsError> {
    Ok(run(|c| c.select_card(PlaceId(place)))?)
}

#[wasm_bindgen]
pub fn enter_from_minimap(place: usize) -> Result<String, JsError> {
    Ok(run(|c| c.enter_from_minimap(PlaceId(place)))?)
}

#[wasm_bindgen]
pub fn zoom(delta: f64) -> Result<String, JsError> {
    Ok(run(|c| c.adjust_zoom(delta))?)
}

#[wasm_bindgen]
pub fn toggle_autorotate() -> Result<String, JsError> {
    Ok(run(TourController::toggle_autorotate)?)
}

#[wasm_bindgen]
pub fn interaction_start() -> Result<(), JsError> {
    Ok(with_controller(TourController::interaction_start)?)
}

#[wasm_bindgen]
pub fn interaction_end(now_ms: f64) -> Result<(), JsError> {
    Ok(with_controller(|c| c.interaction_end(now_ms))?)
}

#[wasm_bindgen]
pub fn panorama_loaded() -> Result<String, JsError> {
    Ok(run(TourController::panorama_loaded)?)
}

#[wasm_bindgen]
pub fn tick(now_ms: f64) -> Result<String, JsError> {
    Ok(run(|c| c.tick(now_ms))?)
}

/// Open the panorama named by the page's `?pano=` query, if any.
#[wasm_bindgen]
pub fn open_from_query(query: &str) -> Result<String, JsError> {
    let Some(pano) = pano_param(query) else {
        return Ok("[]".to_string());
    };
    Ok(run(|c| c.open_deep_link(&pano))?)
}

/// The map's exit button inside the overlay.
#[wasm_bindgen]
pub fn request_close(target_section_id: Option<String>) -> Result<String, JsError> {
    Ok(run(|c| c.request_close(target_section_id))?)
}

/// What the landing page should do with one received message.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HostAction {
    message: HostMessage,
    #[serde(skip_serializing_if = "Option::is_none")]
    return_section: Option<String>,
}

/// `None` when the message asks for nothing, such as an open without a panorama.
fn host_action(json: &str) -> Result<Option<HostAction>, BridgeError> {
    let incoming: IncomingMessage = serde_json::from_str(json)?;
    let message = HostMessage::from(incoming);
    if !message.is_actionable() {
        tracing::debug!(?message, "ignoring host message");
        return Ok(None);
    }
    let return_section = message.return_section().map(str::to_owned);
    Ok(Some(HostAction {
        message,
        return_section,
    }))
}

/// Normalize a message received by the landing page into its tagged form,
/// with the section to scroll back to on close. `null` means ignore it.
#[wasm_bindgen]
pub fn normalize_host_message(json: &str) -> Result<String, JsError> {
    Ok(serde_json::to_string(&host_action(json)?)?)
}

#[wasm_bindgen]
pub fn panel_state() -> Result<String, JsError> {
    Ok(to_json(info_panel::info_panel)?)
}

#[wasm_bindgen]
pub fn carousel() -> Result<String, JsError> {
    Ok(to_json(cards::build_carousel)?)
}

#[wasm_bindgen]
pub fn marker_groups() -> Result<String, JsError> {
    Ok(to_json(|c| c.marker_groups().to_vec())?)
}

#[wasm_bindgen]
pub fn minimap_markers() -> Result<String, JsError> {
    Ok(to_json(TourController::minimap_markers)?)
}

#[wasm_bindgen]
pub fn cursor() -> Result<String, JsError> {
    Ok(to_json(|c| c.cursor().clone())?)
}
