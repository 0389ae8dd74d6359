//! Panorama detection, asset path resolution, and group slugs.

use crate::config::{AssetLayout, GroupOverride, TourConfig};
use crate::model::Place;
use crate::model::place::text;

/// Classifies place records against one asset layout and override table.
#[derive(Debug, Clone)]
pub struct Classifier {
    layout: AssetLayout,
    overrides: Vec<GroupOverride>,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(&TourConfig::default())
    }
}

fn is_absolute_url(path: &str) -> bool {
    let lower = path.get(..8).unwrap_or(path).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

impl Classifier {
    pub fn new(config: &TourConfig) -> Self {
        Self {
            layout: config.assets.clone(),
            overrides: config.ordering.group_overrides.clone(),
        }
    }

    pub fn layout(&self) -> &AssetLayout {
        &self.layout
    }

    /// Whether the place has a usable panorama reference.
    pub fn has_panorama(&self, place: &Place) -> bool {
        self.resolve_panorama_path(place).is_some()
    }

    /// Normalize the raw panorama reference into a fetchable path or URL.
    ///
    /// Pure string transform; the file is never checked for existence.
    pub fn resolve_panorama_path(&self, place: &Place) -> Option<String> {
        self.resolve_asset(place.panorama.as_deref()?)
    }

    fn resolve_asset(&self, raw: &str) -> Option<String> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        let normalized = trimmed.replace('\\', "/");
        if is_absolute_url(&normalized) {
            return Some(normalized);
        }
        let root = self.layout.root.trim_end_matches('/');
        let rooted_prefix = format!("{root}/");
        if normalized.starts_with(&rooted_prefix) {
            return Some(normalized);
        }
        if !self.layout.reserved_prefix.is_empty()
            && normalized.starts_with(&self.layout.reserved_prefix)
        {
            return Some(format!("{rooted_prefix}{normalized}"));
        }
        if let Some(stripped) = normalized.strip_prefix('/') {
            return Some(stripped.to_string());
        }
        if normalized.contains('/') {
            return Some(format!("{rooted_prefix}{normalized}"));
        }
        Some(format!(
            "{rooted_prefix}{}/{normalized}",
            self.layout.default_subdir.trim_matches('/')
        ))
    }

    /// Thumbnail next to a panorama: `<root>/partN/x.jpg` becomes
    /// `<root>/partN/thumbs/x.jpg`.
    pub fn resolve_thumbnail_path(&self, place: &Place) -> Option<String> {
        let panorama = self.resolve_panorama_path(place)?;
        if is_absolute_url(&panorama) {
            return Some(panorama);
        }
        Some(self.thumbnail_of(&panorama).unwrap_or(panorama))
    }

    fn thumbnail_of(&self, panorama: &str) -> Option<String> {
        let root = self.layout.root.trim_end_matches('/');
        let rest = panorama.strip_prefix(root)?.strip_prefix('/')?;
        let (dir, file) = rest.split_once('/')?;
        let prefix = self.layout.reserved_prefix.as_str();
        let is_part_dir = dir.len() > prefix.len()
            && dir
                .get(..prefix.len())
                .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
            && dir.bytes().skip(prefix.len()).all(|b| b.is_ascii_digit());
        if !is_part_dir || file.is_empty() {
            return None;
        }
        if file
            .get(..7)
            .is_some_and(|head| head.eq_ignore_ascii_case("thumbs/"))
        {
            return Some(panorama.to_string());
        }
        Some(format!("{root}/{dir}/thumbs/{file}"))
    }

    /// Image for cards and marker previews: the panorama thumbnail, else
    /// the record's own card image.
    pub fn card_thumbnail(&self, place: &Place) -> Option<String> {
        if let Some(thumb) = self.resolve_thumbnail_path(place) {
            return Some(thumb);
        }
        let normalized = place.image.as_deref()?.trim().replace('\\', "/");
        if normalized.is_empty() {
            return None;
        }
        let root = self.layout.root.trim_end_matches('/');
        if is_absolute_url(&normalized)
            || normalized.starts_with(&format!("{root}/"))
            || normalized.starts_with("icons/")
        {
            return Some(normalized);
        }
        if !self.layout.reserved_prefix.is_empty()
            && normalized.starts_with(&self.layout.reserved_prefix)
        {
            return Some(format!("{root}/{normalized}"));
        }
        Some(
            normalized
                .strip_prefix('/')
                .map(str::to_string)
                .unwrap_or(normalized),
        )
    }

    /// Group key used to cluster and order places.
    ///
    /// The override table is matched against all of the place's text labels
    /// joined together; otherwise the minimap category (or category) slug.
    pub fn group_slug(&self, place: &Place) -> String {
        let joined = [
            &place.classroom,
            &place.title,
            &place.location,
            &place.building,
            &place.minimap_category,
            &place.category,
        ]
        .into_iter()
        .map(text)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
        .replace('＆', "&");

        if let Some(rule) = self
            .overrides
            .iter()
            .find(|rule| !rule.contains.is_empty() && joined.contains(&rule.contains))
        {
            return rule.group.clone();
        }
        category_slug(minimap_category(place))
    }
}

/// The label used for minimap placement: `minimapCategory`, else `category`.
pub fn minimap_category(place: &Place) -> &str {
    let explicit = place.minimap_category.as_deref().unwrap_or("");
    if explicit.is_empty() {
        place.category.as_deref().unwrap_or("")
    } else {
        explicit
    }
}

/// Lowercase `[a-z0-9_-]` slug of a category label, without file extension.
pub fn category_slug(category: &str) -> String {
    let base = category.trim().to_lowercase();
    let without_ext = match base.rfind('.') {
        Some(dot)
            if dot + 1 < base.len()
                && base[dot + 1..]
                    .bytes()
                    .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit()) =>
        {
            &base[..dot]
        }
        _ => base.as_str(),
    };
    without_ext
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '_' || *c == '-')
        .collect()
}
