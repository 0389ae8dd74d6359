//! Presentation models derived from controller state: map markers, the
//! building minimap, carousel cards and the side panel.

pub mod cards;
pub mod info_panel;
pub mod markers;
pub mod minimap;
