//! Deep links from the landing page into a specific panorama.
//!
//! The host page opens the map as `Map/index.html?pano=<path>` where
//! `<path>` is the panorama reference relative to the map directory. The map
//! then opens the first place whose resolved panorama contains it.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};

use crate::classify::Classifier;
use crate::model::{Place, PlaceId};

/// Directory of the map page relative to the landing page.
pub const MAP_DIR: &str = "Map/";
/// Query parameter carrying the panorama reference.
pub const PANO_PARAM: &str = "pano";

/// URL of the map overlay opened on one panorama.
pub fn overlay_url(pano: &str) -> String {
    let normalized = pano.trim().replace('\\', "/");
    let relative = normalized.strip_prefix(MAP_DIR).unwrap_or(&normalized);
    format!("{MAP_DIR}index.html?{PANO_PARAM}={}", encode_component(relative))
}

/// Characters `encodeURIComponent` leaves alone, besides alphanumerics.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Percent-encode everything except the unreserved URI component set.
pub fn encode_component(s: &str) -> String {
    utf8_percent_encode(s, COMPONENT).to_string()
}

/// Decode a query-string value; `+` is a space and malformed escapes are
/// kept as written.
pub fn decode_component(s: &str) -> String {
    let spaced = s.replace('+', " ");
    percent_decode_str(&spaced).decode_utf8_lossy().into_owned()
}

/// The decoded `pano` parameter of a query string (with or without `?`).
pub fn pano_param(query: &str) -> Option<String> {
    query
        .trim_start_matches('?')
        .split('&')
        .filter_map(|pair| pair.split_once('=').or(Some((pair, ""))))
        .find(|(key, _)| decode_component(key) == PANO_PARAM)
        .map(|(_, value)| decode_component(value))
        .filter(|value| !value.is_empty())
}

/// First place whose resolved panorama path contains `needle`.
pub fn find_target(places: &[Place], classifier: &Classifier, needle: &str) -> Option<PlaceId> {
    if needle.is_empty() {
        return None;
    }
    places
        .iter()
        .position(|place| {
            classifier
                .resolve_panorama_path(place)
                .is_some_and(|path| path.contains(needle))
        })
        .map(PlaceId)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlay_url_strips_map_dir_and_encodes() {
        assert_eq!(
            overlay_url("Map/images/part2/satsuki_out.jpg"),
            "Map/index.html?pano=images%2Fpart2%2Fsatsuki_out.jpg"
        );
        assert_eq!(
            overlay_url("images\\part2\\a b.jpg"),
            "Map/index.html?pano=images%2Fpart2%2Fa%20b.jpg"
        );
        assert_eq!(encode_component("広場"), "%E5%BA%83%E5%A0%B4");
        assert_eq!(encode_component("a-b_c.d!e~f*g'h(i)"), "a-b_c.d!e~f*g'h(i)");
        assert_eq!(encode_component("a+b&c=d"), "a%2Bb%26c%3Dd");
    }

    #[test]
    fn pano_param_decodes_value() {
        assert_eq!(
            pano_param("?pano=images%2Fpart2%2Fsatsuki_out.jpg").as_deref(),
            Some("images/part2/satsuki_out.jpg")
        );
        assert_eq!(
            pano_param("lang=ja&pano=%E5%BA%83%E5%A0%B4+1").as_deref(),
            Some("広場 1")
        );
        assert_eq!(pano_param("?pano="), None);
        assert_eq!(pano_param("?other=1"), None);
        assert_eq!(decode_component("100%"), "100%");
        assert_eq!(decode_component("%zz%2"), "%zz%2");
        assert_eq!(decode_component("a%2Bb+c"), "a+b c");
    }

    #[test]
    fn round_trips_through_overlay_url() {
        let url = overlay_url("Map/images/part2/かえで.jpg");
        let query = url.split_once('?').map(|(_, q)| q).unwrap_or("");
        assert_eq!(pano_param(query).as_deref(), Some("images/part2/かえで.jpg"));
    }

    #[test]
    fn finds_first_containing_place() {
        let places = vec![
            Place::new().with_title("no pano"),
            Place::new().with_panorama("kaede_front.jpg"),
            Place::new().with_panorama("part2/kaede_front.jpg"),
        ];
        let c = Classifier::default();
        assert_eq!(
            find_target(&places, &c, "images/part2/kaede_front.jpg"),
            Some(PlaceId(1))
        );
        assert_eq!(find_target(&places, &c, "missing.jpg"), None);
        assert_eq!(find_target(&places, &c, ""), None);
    }
}
