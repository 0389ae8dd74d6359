pub mod cursor;
pub mod place;

pub use cursor::Cursor;
pub use place::{Place, PlaceId};
