use campus_tour_protocol::Notice;
use thiserror::Error;

use crate::model::PlaceId;

/// Recoverable failures of a controller operation.
///
/// These never escape the controller: each one is logged and turned into a
/// single [`Notice`] for the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TourError {
    #[error("unknown place {0}")]
    UnknownPlace(PlaceId),
    #[error("place \"{name}\" has no panorama")]
    NoPanorama { name: String },
    #[error("panorama viewer is unavailable")]
    ViewerUnavailable,
    #[error("no place data loaded")]
    NoData,
    #[error("no panorama spots to open")]
    NoSpots,
}

impl TourError {
    pub fn notice(&self) -> Notice {
        match self {
            // An id that does not resolve can only be opened as "nothing".
            TourError::UnknownPlace(_) | TourError::NoPanorama { .. } => Notice::NoPanorama,
            TourError::ViewerUnavailable => Notice::ViewerUnavailable,
            TourError::NoData => Notice::NoData,
            TourError::NoSpots => Notice::NoSpots,
        }
    }
}
