//! Place catalog, ordering policy, and street-view navigation for the
//! campus tour map.

pub mod catalog;
pub mod classify;
pub mod config;
pub mod deep_link;
pub mod error;
pub mod ingest;
pub mod model;
pub mod navigation;
pub mod ordering;
pub mod timers;
pub mod views;

pub use catalog::Catalog;
pub use classify::Classifier;
pub use config::{EmbedMode, LayeredConfig, TourConfig};
pub use error::TourError;
pub use model::{Cursor, Place, PlaceId};
pub use navigation::TourController;
pub use ordering::OrderingPolicy;
