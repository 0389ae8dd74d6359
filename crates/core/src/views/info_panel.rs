use serde::Serialize;

use crate::navigation::TourController;

const NO_SELECTION_TITLE: &str = "スポット未選択";
const NO_SELECTION_META: &str = "360°スポットを選択してください。";
const EMPTY_CAROUSEL: &str = "360°スポットが登録されていません。";

/// Label of a previous/next button.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavButton {
    pub label: String,
    /// Name of the spot the button leads to.
    pub location: Option<String>,
}

impl NavButton {
    fn new(base: &str, location: Option<String>) -> Self {
        let label = match &location {
            Some(name) => format!("{base}: {name}"),
            None => base.to_string(),
        };
        Self { label, location }
    }
}

/// Text of the street-view side panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InfoPanel {
    pub title: String,
    pub meta: String,
    pub category: String,
    pub prev: NavButton,
    pub next: NavButton,
    pub nav_disabled: bool,
    /// Shown instead of the carousel when nothing can be opened.
    pub empty_message: Option<String>,
}

pub fn info_panel(controller: &TourController) -> InfoPanel {
    let sequence = controller.sequence();
    let name_of = |delta: i64| {
        controller
            .nav_target(delta)
            .and_then(|id| controller.place(id))
            .map(|p| p.display_name().to_string())
    };
    let current = controller.current().and_then(|id| controller.place(id));

    let (title, meta, category) = match current {
        Some(place) => (
            place.display_name().to_string(),
            place.meta_line(),
            place
                .category
                .clone()
                .filter(|c| !c.is_empty())
                .unwrap_or_else(|| "スポット".to_string()),
        ),
        None => (
            NO_SELECTION_TITLE.to_string(),
            NO_SELECTION_META.to_string(),
            String::new(),
        ),
    };

    InfoPanel {
        title,
        meta,
        category,
        prev: NavButton::new("前のスポット", name_of(-1)),
        next: NavButton::new("次のスポット", name_of(1)),
        nav_disabled: !controller.is_active() || sequence.len() <= 1,
        empty_message: sequence.is_empty().then(|| EMPTY_CAROUSEL.to_string()),
    }
}
