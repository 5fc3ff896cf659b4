/// Render layer. Controls compositing order for a level frame.
///
/// Layers are drawn back-to-front: Sky first, Hud last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(u8)]
pub enum RenderLayer {
    Sky = 0,
    Background = 1,
    Terrain = 2,
    #[default]
    Entities = 3,
    DeathPending = 4,
    Hud = 5,
}

impl RenderLayer {
    pub const COUNT: usize = 6;

    /// Every layer in draw order.
    pub const ALL: [RenderLayer; Self::COUNT] = [
        RenderLayer::Sky,
        RenderLayer::Background,
        RenderLayer::Terrain,
        RenderLayer::Entities,
        RenderLayer::DeathPending,
        RenderLayer::Hud,
    ];

    pub fn from_u8(value: u8) -> Option<Self> {
        Self::ALL.get(value as usize).copied()
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}
