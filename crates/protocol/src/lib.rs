pub mod commands;
pub mod messages;
pub mod theme;
pub mod types;

pub use commands::{Notice, ViewerCommand};
pub use messages::{HostMessage, IncomingMessage};
pub use theme::{GroupStyle, Rgb};
pub use types::{Bounds, LatLon, MinimapPoint};
