use serde::{Deserialize, Serialize};

use super::PlaceId;

/// Street-view navigation state.
///
/// Only `Active` carries a current item, so an inactive cursor can never
/// point at a place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Cursor {
    #[default]
    Inactive,
    Active {
        current: PlaceId,
        /// Places relevant to the current interaction, in display order.
        context: Vec<PlaceId>,
    },
}

impl Cursor {
    pub fn is_active(&self) -> bool {
        matches!(self, Cursor::Active { .. })
    }

    pub fn current(&self) -> Option<PlaceId> {
        match self {
            Cursor::Inactive => None,
            Cursor::Active { current, .. } => Some(*current),
        }
    }

    pub fn context(&self) -> &[PlaceId] {
        match self {
            Cursor::Inactive => &[],
            Cursor::Active { context, .. } => context,
        }
    }
}
