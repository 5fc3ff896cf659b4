use std::collections::HashMap;

use crate::assets::manifest::AssetManifest;

/// Resolved sprite location. `PLACEHOLDER` stands in for anything missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpriteHandle {
    pub sheet: u32,
    pub col: u32,
    pub row: u32,
    pub frames: u32,
}

impl SpriteHandle {
    /// A blank single-frame sprite outside every sheet.
    pub const PLACEHOLDER: SpriteHandle = SpriteHandle {
        sheet: u32::MAX,
        col: 0,
        row: 0,
        frames: 1,
    };

    pub fn is_placeholder(&self) -> bool {
        self.sheet == u32::MAX
    }

    /// Absolute column of `frame`, wrapping within the sprite's frames.
    pub fn frame_col(&self, frame: u32) -> u32 {
        self.col + frame % self.frames.max(1)
    }
}

/// Name-based sprite lookup built from an [`AssetManifest`].
#[derive(Debug, Clone, Default)]
pub struct SpriteRegistry {
    sprites: HashMap<String, SpriteHandle>,
    sounds: HashMap<String, String>,
}

impl SpriteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_manifest(manifest: &AssetManifest) -> Self {
        let mut sprites = HashMap::with_capacity(manifest.sprites.len());
        for (name, desc) in &manifest.sprites {
            if desc.sheet as usize >= manifest.sheets.len() {
                log::warn!("sprite '{}' references missing sheet {}", name, desc.sheet);
                continue;
            }
            sprites.insert(
                name.clone(),
                SpriteHandle {
                    sheet: desc.sheet,
                    col: desc.col,
                    row: desc.row,
                    frames: desc.frames.max(1),
                },
            );
        }
        let sounds = manifest
            .sounds
            .iter()
            .map(|(name, desc)| (name.clone(), desc.path.clone()))
            .collect();
        Self { sprites, sounds }
    }

    pub fn get(&self, name: &str) -> Option<SpriteHandle> {
        self.sprites.get(name).copied()
    }

    /// Look up a sprite, substituting the placeholder (with a warning) if
    /// it is missing. Callers resolve once and keep the handle.
    pub fn resolve(&self, name: &str) -> SpriteHandle {
        match self.get(name) {
            Some(handle) => handle,
            None => {
                log::warn!("missing sprite '{}', using placeholder", name);
                SpriteHandle::PLACEHOLDER
            }
        }
    }

    pub fn sound_path(&self, cue: &str) -> Option<&str> {
        self.sounds.get(cue).map(String::as_str)
    }
}

/// Sprites the level draws, resolved once at level start.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelSprites {
    pub background: SpriteHandle,
    pub ground: SpriteHandle,
    pub pipe: SpriteHandle,
    pub block: SpriteHandle,
    pub mario_small: SpriteHandle,
    pub mario_big: SpriteHandle,
    pub goomba: SpriteHandle,
    pub koopa: SpriteHandle,
    pub boss: SpriteHandle,
    pub mushroom: SpriteHandle,
}

impl LevelSprites {
    pub fn resolve(registry: &SpriteRegistry) -> Self {
        Self {
            background: registry.resolve("background"),
            ground: registry.resolve("ground"),
            pipe: registry.resolve("pipe"),
            block: registry.resolve("block"),
            mario_small: registry.resolve("mario_small"),
            mario_big: registry.resolve("mario_big"),
            goomba: registry.resolve("goomba"),
            koopa: registry.resolve("koopa"),
            boss: registry.resolve("boss"),
            mushroom: registry.resolve("mushroom"),
        }
    }

    pub fn by_name(&self, name: &str) -> SpriteHandle {
        match name {
            "background" => self.background,
            "ground" => self.ground,
            "pipe" => self.pipe,
            "block" => self.block,
            "mario_small" => self.mario_small,
            "mario_big" => self.mario_big,
            "goomba" => self.goomba,
            "koopa" => self.koopa,
            "boss" => self.boss,
            "mushroom" => self.mushroom,
            _ => SpriteHandle::PLACEHOLDER,
        }
    }
}

impl Default for LevelSprites {
    fn default() -> Self {
        Self::resolve(&SpriteRegistry::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest() -> AssetManifest {
        AssetManifest::from_json(
            r#"{
                "sheets": [ { "name": "enemies", "path": "enemies.png", "cols": 16, "rows": 4 } ],
                "sprites": {
                    "goomba": { "sheet": 0, "col": 2, "row": 1, "frames": 4 },
                    "ghost": { "sheet": 5, "col": 0, "row": 0 }
                },
                "sounds": { "stomp": { "path": "stomp.ogg" } }
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn resolves_known_sprites() {
        let reg = SpriteRegistry::from_manifest(&manifest());
        let goomba = reg.resolve("goomba");
        assert_eq!((goomba.sheet, goomba.col, goomba.row), (0, 2, 1));
        assert_eq!(goomba.frame_col(5), 3);
        assert_eq!(reg.sound_path("stomp"), Some("stomp.ogg"));
    }

    #[test]
    fn missing_or_broken_sprites_fall_back_to_placeholder() {
        let reg = SpriteRegistry::from_manifest(&manifest());
        assert!(reg.resolve("nonexistent").is_placeholder());
        // Bad sheet index is dropped at load.
        assert!(reg.resolve("ghost").is_placeholder());
        assert!(reg.sound_path("kick").is_none());
    }

    #[test]
    fn level_sprites_default_to_placeholders() {
        let sprites = LevelSprites::default();
        assert!(sprites.boss.is_placeholder());
        let reg = SpriteRegistry::from_manifest(&manifest());
        let sprites = LevelSprites::resolve(&reg);
        assert_eq!(sprites.by_name("goomba"), reg.resolve("goomba"));
    }
}
