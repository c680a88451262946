//! Player markers and their deterministic identity
//!
//! A marker's identity and display color are pure functions of its name:
//! the SHA-256 digest of the UTF-8 name yields a UUID (first 16 bytes) and
//! a palette index (digest as a big-endian integer modulo the palette
//! size). Regenerating the same sheet therefore produces the same marker
//! set without any persisted state.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::error::{Error, Result};

/// Display colors assigned to markers without an explicit override.
///
/// Near-black, near-white, and gray entries are left out for legibility
/// against rendered map tiles.
pub const PALETTE: [&str; 12] = [
    "#0000AA", "#00AA00", "#00AAAA", "#AA0000", "#AA00AA", "#FFAA00", "#5555FF", "#55FF55",
    "#55FFFF", "#FF5555", "#FF55FF", "#FFFF55",
];

/// File name of the generated marker file, under `<dest>/map/`
pub const MARKER_FILE_NAME: &str = "playersData.js";

/// Leading text of the generated marker file
pub const MARKER_FILE_PREFIX: &str = "var playersData = ";

/// One point-of-interest marker, as serialized into `playersData.js`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerMarker {
    /// Stable identity, derived from the name when not supplied
    #[serde(default)]
    pub uuid: Option<Uuid>,

    /// Display name
    #[serde(default)]
    pub name: Option<String>,

    /// Coordinate space the marker belongs to
    #[serde(default)]
    pub dimension_id: i64,

    /// World position (x, y, z)
    pub position: [f64; 3],

    /// Hex RGB display color
    #[serde(default)]
    pub color: Option<String>,

    /// Whether the marker is shown
    #[serde(default = "default_visible")]
    pub visible: bool,
}

fn default_visible() -> bool {
    true
}

impl PlayerMarker {
    /// Create a marker with the given name and position, visible by
    /// default, with identity and color still pending derivation
    pub fn new(name: impl Into<String>, position: [f64; 3], dimension_id: i64) -> Self {
        Self {
            uuid: None,
            name: Some(name.into()),
            dimension_id,
            position,
            color: None,
            visible: true,
        }
    }

    /// The string the identity and color derivations hash: the name, or
    /// the existing identity when the name is absent
    fn identity_seed(&self) -> Result<String> {
        if let Some(name) = &self.name {
            Ok(name.clone())
        } else if let Some(uuid) = &self.uuid {
            Ok(uuid.to_string())
        } else {
            Err(Error::Invalid {
                message: "marker has neither a name nor an identity".to_string(),
            })
        }
    }

    /// Derive and store the stable identity
    pub fn derive_identity(&mut self) -> Result<()> {
        self.uuid = Some(uuid_from_name(&self.identity_seed()?));
        Ok(())
    }

    /// Assign the display color: an explicit color always wins, otherwise
    /// the deterministic palette derivation applies
    pub fn assign_color(&mut self, explicit: Option<String>) -> Result<()> {
        self.color = match explicit {
            Some(color) => Some(color),
            None => Some(palette_color(&self.identity_seed()?).to_string()),
        };
        Ok(())
    }
}

/// UUID-shaped identity from a name: the first 16 digest bytes
pub fn uuid_from_name(name: &str) -> Uuid {
    let digest = Sha256::digest(name.as_bytes());
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&digest[..16]);
    Uuid::from_bytes(bytes)
}

/// Palette color from a name: the digest as a big-endian integer modulo
/// the palette size
pub fn palette_color(name: &str) -> &'static str {
    let digest = Sha256::digest(name.as_bytes());
    let index = digest
        .iter()
        .fold(0usize, |acc, byte| (acc * 256 + usize::from(*byte)) % PALETTE.len());
    PALETTE[index]
}

#[derive(Serialize)]
struct MarkerFile<'a> {
    players: &'a [PlayerMarker],
}

#[derive(Deserialize)]
struct MarkerFileOwned {
    players: Vec<PlayerMarker>,
}

/// Render a marker list into the text of `playersData.js`: a single
/// assignment of a JSON object to a fixed variable name
pub fn render_marker_file(markers: &[PlayerMarker]) -> Result<String> {
    let body = serde_json::to_string_pretty(&MarkerFile { players: markers })?;
    Ok(format!("{}{}", MARKER_FILE_PREFIX, body))
}

/// Parse marker-file text back into a marker list
pub fn parse_marker_file(text: &str) -> Result<Vec<PlayerMarker>> {
    let body = text
        .split_once('=')
        .map(|(_, rest)| rest)
        .ok_or_else(|| Error::Invalid {
            message: "marker file is not an assignment".to_string(),
        })?;
    let file: MarkerFileOwned = serde_json::from_str(body)?;
    Ok(file.players)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_identity_is_deterministic() {
        let first = uuid_from_name("Notch");
        let second = uuid_from_name("Notch");
        assert_eq!(first, second);
        assert_ne!(first, uuid_from_name("notch"));
    }

    #[test]
    fn test_color_is_deterministic_and_from_palette() {
        let first = palette_color("Notch");
        assert_eq!(first, palette_color("Notch"));
        assert!(PALETTE.contains(&first));
    }

    #[rstest]
    #[case("Alice")]
    #[case("Bob")]
    #[case("??\u{2728}")]
    fn test_derivations_stable_across_calls(#[case] name: &str) {
        let mut a = PlayerMarker::new(name, [0.0, 0.0, 0.0], 0);
        let mut b = PlayerMarker::new(name, [9.0, 9.0, 9.0], 1);
        a.derive_identity().unwrap();
        b.derive_identity().unwrap();
        a.assign_color(None).unwrap();
        b.assign_color(None).unwrap();
        assert_eq!(a.uuid, b.uuid);
        assert_eq!(a.color, b.color);
    }

    #[test]
    fn test_explicit_color_overrides_derived() {
        let mut marker = PlayerMarker::new("Alice", [0.0, 0.0, 0.0], 0);
        marker.assign_color(Some("#123456".to_string())).unwrap();
        assert_eq!(marker.color.as_deref(), Some("#123456"));
    }

    #[test]
    fn test_identity_falls_back_to_existing_uuid_when_unnamed() {
        let mut marker = PlayerMarker::new("x", [0.0, 0.0, 0.0], 0);
        marker.name = None;
        marker.uuid = Some(uuid_from_name("x"));
        marker.derive_identity().unwrap();
        assert!(marker.uuid.is_some());
        assert!(marker.assign_color(None).is_ok());
        assert!(PALETTE.contains(&marker.color.as_deref().unwrap()));
    }

    #[test]
    fn test_unnamed_unidentified_marker_is_an_error() {
        let mut marker = PlayerMarker::new("x", [0.0, 0.0, 0.0], 0);
        marker.name = None;
        assert!(marker.derive_identity().is_err());
    }

    #[test]
    fn test_marker_file_round_trip() {
        let mut markers = vec![
            PlayerMarker::new("Alice", [10.5, 64.0, -3.5], 0),
            PlayerMarker::new("Bob", [-100.5, 0.0, 7.5], 1),
        ];
        for marker in &mut markers {
            marker.derive_identity().unwrap();
            marker.assign_color(None).unwrap();
        }
        markers[1].visible = false;

        let text = render_marker_file(&markers).unwrap();
        assert!(text.starts_with(MARKER_FILE_PREFIX));

        let parsed = parse_marker_file(&text).unwrap();
        assert_eq!(parsed, markers);
    }

    #[test]
    fn test_marker_serializes_with_camel_case_keys() {
        let mut marker = PlayerMarker::new("Alice", [1.5, 0.0, 2.5], 3);
        marker.derive_identity().unwrap();
        marker.assign_color(None).unwrap();
        let json = serde_json::to_value(&marker).unwrap();
        assert!(json.get("dimensionId").is_some());
        assert!(json.get("uuid").is_some());
        assert!(json.get("visible").is_some());
        assert_eq!(json["position"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_parse_rejects_non_assignment() {
        assert!(parse_marker_file("{\"players\": []}").is_err());
    }
}
