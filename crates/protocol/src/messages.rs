use serde::{Deserialize, Serialize};

/// Section the host page scrolls back to when no target is given.
pub const DEFAULT_RETURN_SECTION: &str = "rooms";

/// Cross-frame message exchanged between the embedded map and its host page.
///
/// This is the whole wire contract with the hosting page: a `type` tag plus
/// one payload field naming either a panorama path or a page section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum HostMessage {
    /// Ask the host to open the map overlay directly on a panorama.
    #[serde(rename = "reitaku:openMapOverlay")]
    OpenPanorama { pano: String },

    /// Ask the host to close the overlay and return to a page section.
    #[serde(rename = "reitaku:closeMapOverlay")]
    CloseOverlay {
        #[serde(
            rename = "targetSectionId",
            default,
            skip_serializing_if = "Option::is_none"
        )]
        target_section_id: Option<String>,
    },
}

impl HostMessage {
    pub fn open(pano: impl Into<String>) -> Self {
        Self::OpenPanorama { pano: pano.into() }
    }

    pub fn close() -> Self {
        Self::CloseOverlay {
            target_section_id: None,
        }
    }

    /// Open requests with an empty panorama are ignored by the host.
    pub fn is_actionable(&self) -> bool {
        match self {
            Self::OpenPanorama { pano } => !pano.trim().is_empty(),
            Self::CloseOverlay { .. } => true,
        }
    }

    /// Section to scroll to after a close request.
    pub fn return_section(&self) -> Option<&str> {
        match self {
            Self::OpenPanorama { .. } => None,
            Self::CloseOverlay { target_section_id } => Some(
                target_section_id
                    .as_deref()
                    .filter(|s| !s.is_empty())
                    .unwrap_or(DEFAULT_RETURN_SECTION),
            ),
        }
    }
}

/// Bare-string close request sent by older map builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum LegacyMessage {
    #[serde(rename = "closeMapOverlay")]
    CloseMapOverlay,
}

/// Anything a host may receive: a tagged message or the legacy string form.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum IncomingMessage {
    Tagged(HostMessage),
    Legacy(LegacyMessage),
}

impl From<IncomingMessage> for HostMessage {
    fn from(value: IncomingMessage) -> Self {
        match value {
            IncomingMessage::Tagged(msg) => msg,
            IncomingMessage::Legacy(LegacyMessage::CloseMapOverlay) => HostMessage::close(),
        }
    }
}
