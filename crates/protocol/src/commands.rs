use std::fmt;

use serde::{Deserialize, Serialize};

use crate::messages::HostMessage;
use crate::types::{Bounds, LatLon};

/// A single, stateless instruction for the rendering collaborators.
///
/// The controller emits a `Vec<ViewerCommand>` for every operation. Hosts
/// apply them in order: map commands go to the map engine, panorama commands
/// to the panorama engine, the rest to page chrome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ViewerCommand {
    /// Street mode switched on or off.
    ModeChanged { active: bool },

    /// Replace the displayed panorama.
    LoadPanorama {
        path: String,
        yaw: f64,
        pitch: f64,
        hfov: f64,
        min_hfov: f64,
        max_hfov: f64,
    },

    /// Set the panorama horizontal field of view, in degrees.
    SetHfov { hfov: f64 },

    /// Start continuous horizontal rotation.
    StartAutoRotate { deg_per_sec: f64 },

    StopAutoRotate,

    /// Toggle the loading visual of the panorama canvas.
    LoadingChanged { loading: bool },

    /// Move the map camera.
    FlyTo {
        center: LatLon,
        zoom: f64,
        duration_ms: u32,
    },

    /// Fit the map camera to the given bounds.
    FitBounds {
        bounds: Bounds,
        max_zoom: f64,
        duration_ms: u32,
    },

    /// Ring the marker at a coordinate, or clear the ring.
    SelectMarker { at: Option<LatLon> },

    ShowMarkerPopup { at: LatLon, label: String },

    HideMarkerPopup,

    /// Swap the minimap base image.
    SetMinimapBase { icon: String },

    /// Highlight the minimap marker of a place, or clear the highlight.
    HighlightMinimapMarker { place: Option<usize> },

    /// Transient caption naming the current spot.
    ShowToast { text: String, duration_ms: u32 },

    HideToast,

    /// User-visible explanation of why an operation did nothing.
    ShowNotice { notice: Notice, duration_ms: u32 },

    /// Post a message to the hosting page.
    PostToHost { message: HostMessage },
}

/// Recoverable conditions surfaced to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Notice {
    /// The requested place has no usable panorama.
    NoPanorama,
    /// The panorama engine failed to initialize.
    ViewerUnavailable,
    /// No place records were supplied.
    NoData,
    /// Nothing in the catalog or marker group can be opened.
    NoSpots,
}

impl Notice {
    pub fn message(&self) -> &'static str {
        match self {
            Notice::NoPanorama => "この場所には360°画像が登録されていません。",
            Notice::ViewerUnavailable => "360°ビュー用ライブラリの読み込みに失敗しました。",
            Notice::NoData => "No data available. Please check the data source.",
            Notice::NoSpots => "360°スポットが登録されていません。",
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}
