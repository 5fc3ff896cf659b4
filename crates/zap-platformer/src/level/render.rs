//! Render output. The level composites into any [`RenderSurface`]; the
//! bundled [`InstanceSurface`] packs draws into a flat, `Pod` instance
//! buffer grouped by layer for a GPU or canvas host.

use bytemuck::{Pod, Zeroable};

use crate::assets::registry::SpriteHandle;
use crate::components::layer::RenderLayer;
use crate::core::geometry::Rect;

pub const SKY_COLOR: [u8; 3] = [92, 148, 252];

/// Something the level can draw into, in screen space.
pub trait RenderSurface {
    /// Called before the draws of each layer, back to front.
    fn begin_layer(&mut self, _layer: RenderLayer) {}
    fn fill(&mut self, color: [u8; 3]);
    fn draw_sprite(&mut self, sprite: SpriteHandle, frame: u32, dest: Rect, flip_x: bool, alpha: f32);
    fn draw_text(&mut self, text: &str, x: f32, y: f32);
}

/// One sprite draw: 8 floats = 32 bytes stride.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct RenderInstance {
    /// Screen-space left edge.
    pub x: f32,
    /// Screen-space top edge.
    pub y: f32,
    pub w: f32,
    /// Negative when horizontally flipped.
    pub h_flip: f32,
    pub h: f32,
    /// Sheet column after frame lookup.
    pub col: f32,
    pub row: f32,
    /// 0.0 = invisible, 1.0 = opaque.
    pub alpha: f32,
}

impl RenderInstance {
    pub const FLOATS: usize = 8;
    pub const STRIDE_BYTES: usize = Self::FLOATS * 4;
}

/// Contiguous run of instances drawn on one layer from one sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayerBatch {
    pub layer: RenderLayer,
    pub sheet: u32,
    pub start: u32,
    pub end: u32,
}

/// A frame's draws. Text is kept aside for the host's font renderer.
#[derive(Debug, Default)]
pub struct InstanceSurface {
    pub clear_color: [u8; 3],
    pub instances: Vec<RenderInstance>,
    pub batches: Vec<LayerBatch>,
    pub text: Vec<(String, f32, f32)>,
    layer: RenderLayer,
}

impl InstanceSurface {
    pub fn new() -> Self {
        Self {
            instances: Vec::with_capacity(256),
            ..Default::default()
        }
    }

    pub fn clear(&mut self) {
        self.clear_color = [0, 0, 0];
        self.instances.clear();
        self.batches.clear();
        self.text.clear();
        self.layer = RenderLayer::Sky;
    }

    pub fn instance_count(&self) -> u32 {
        self.instances.len() as u32
    }

    /// Raw bytes for upload.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.instances)
    }
}

impl RenderSurface for InstanceSurface {
    fn begin_layer(&mut self, layer: RenderLayer) {
        self.layer = layer;
    }

    fn fill(&mut self, color: [u8; 3]) {
        self.clear_color = color;
    }

    fn draw_sprite(&mut self, sprite: SpriteHandle, frame: u32, dest: Rect, flip_x: bool, alpha: f32) {
        if sprite.is_placeholder() {
            return;
        }
        let index = self.instances.len() as u32;
        self.instances.push(RenderInstance {
            x: dest.x,
            y: dest.y,
            w: dest.w,
            h_flip: if flip_x { -1.0 } else { 1.0 },
            h: dest.h,
            col: sprite.frame_col(frame) as f32,
            row: sprite.row as f32,
            alpha,
        });
        match self.batches.last_mut() {
            Some(b) if b.layer == self.layer && b.sheet == sprite.sheet && b.end == index => b.end += 1,
            _ => self.batches.push(LayerBatch {
                layer: self.layer,
                sheet: sprite.sheet,
                start: index,
                end: index + 1,
            }),
        }
    }

    fn draw_text(&mut self, text: &str, x: f32, y: f32) {
        self.text.push((text.to_string(), x, y));
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    const SHEET0: SpriteHandle = SpriteHandle { sheet: 0, col: 4, row: 1, frames: 2 };
    const SHEET1: SpriteHandle = SpriteHandle { sheet: 1, col: 0, row: 0, frames: 1 };

    #[test]
    fn render_instance_is_8_floats() {
        assert_eq!(std::mem::size_of::<RenderInstance>(), RenderInstance::STRIDE_BYTES);
    }

    #[test]
    fn batches_split_on_layer_and_sheet() {
        let mut s = InstanceSurface::new();
        let r = Rect::new(0.0, 0.0, 10.0, 10.0);
        s.begin_layer(RenderLayer::Terrain);
        s.draw_sprite(SHEET0, 0, r, false, 1.0);
        s.draw_sprite(SHEET0, 1, r, false, 1.0);
        s.draw_sprite(SHEET1, 0, r, false, 1.0);
        s.begin_layer(RenderLayer::Entities);
        s.draw_sprite(SHEET1, 0, r, true, 0.5);
        assert_eq!(s.instance_count(), 4);
        assert_eq!(s.batches.len(), 3);
        assert_eq!(s.batches[0], LayerBatch { layer: RenderLayer::Terrain, sheet: 0, start: 0, end: 2 });
        assert_eq!(s.instances[1].col, 5.0);
        assert_eq!(s.instances[3].h_flip, -1.0);
        assert_eq!(s.as_bytes().len(), 4 * RenderInstance::STRIDE_BYTES);
    }

    #[test]
    fn placeholders_draw_nothing() {
        let mut s = InstanceSurface::new();
        s.draw_sprite(SpriteHandle::PLACEHOLDER, 0, Rect::ZERO, false, 1.0);
        assert_eq!(s.instance_count(), 0);
        s.fill(SKY_COLOR);
        s.draw_text("TIME 300", 600.0, 20.0);
        assert_eq!(s.clear_color, SKY_COLOR);
        s.clear();
        assert!(s.text.is_empty());
    }
}
