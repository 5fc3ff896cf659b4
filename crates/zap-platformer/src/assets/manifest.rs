use std::collections::HashMap;
use serde::{Deserialize, Serialize};

/// Sprite sheets, named sprites and sound files for a level.
/// Loaded from JSON by the host; the level only needs the names resolved.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssetManifest {
    pub sheets: Vec<SheetDescriptor>,
    /// Sprite name → sheet index + first cell.
    #[serde(default)]
    pub sprites: HashMap<String, SpriteDescriptor>,
    /// Sound cue name → audio file.
    #[serde(default)]
    pub sounds: HashMap<String, SoundDescriptor>,
}

/// One sprite sheet image laid out on a cell grid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetDescriptor {
    pub name: String,
    pub path: String,
    pub cols: u32,
    pub rows: u32,
}

/// A named sprite: a run of animation frames along a sheet row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpriteDescriptor {
    pub sheet: u32,
    pub col: u32,
    pub row: u32,
    #[serde(default = "default_frames")]
    pub frames: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SoundDescriptor {
    pub path: String,
    #[serde(default = "default_volume")]
    pub volume: f32,
}

fn default_frames() -> u32 {
    1
}

fn default_volume() -> f32 {
    1.0
}

impl AssetManifest {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_manifest_with_defaults() {
        let json = r#"{
            "sheets": [ { "name": "enemies", "path": "enemies.png", "cols": 16, "rows": 4 } ],
            "sprites": {
                "goomba": { "sheet": 0, "col": 0, "row": 0, "frames": 4 },
                "pipe": { "sheet": 0, "col": 8, "row": 2 }
            },
            "sounds": { "stomp": { "path": "stomp.ogg" } }
        }"#;
        let manifest = AssetManifest::from_json(json).unwrap();
        assert_eq!(manifest.sheets[0].cols, 16);
        assert_eq!(manifest.sprites["goomba"].frames, 4);
        assert_eq!(manifest.sprites["pipe"].frames, 1);
        assert_eq!(manifest.sounds["stomp"].volume, 1.0);
    }

    #[test]
    fn malformed_manifest_is_an_error() {
        assert!(AssetManifest::from_json(r#"{ "sprites": 3 }"#).is_err());
    }
}
