use crate::api::context::{Commands, Intent, TickContext};
use crate::api::types::{Direction, EntityId};
use crate::components::physics::{ActorFault, ActorPhysics};
use crate::core::geometry::Rect;
use crate::core::scene::SceneEntity;

pub const MUSHROOM_SIZE: (f32, f32) = (40.0, 40.0);
pub const MUSHROOM_SPEED: f32 = 3.0;
pub const MUSHROOM_GRAVITY: f32 = 1.0;
pub const POWERUP_SCORE: u32 = 1000;

/// A mushroom that slides along the terrain until collected.
#[derive(Debug, Clone)]
pub struct PowerUp {
    pub id: EntityId,
    pub physics: ActorPhysics,
}

impl SceneEntity for PowerUp {
    fn id(&self) -> EntityId {
        self.id
    }
}

impl PowerUp {
    /// Spawn centred on `x` with its bottom edge at `y`.
    pub fn mushroom(id: EntityId, x: f32, y: f32, direction: Direction) -> Self {
        let (w, h) = MUSHROOM_SIZE;
        let rect = Rect::from_bottom_left(x - w / 2.0, y, w, h);
        let mut physics = ActorPhysics::walker(rect, direction, MUSHROOM_SPEED);
        physics.gravity = MUSHROOM_GRAVITY;
        Self { id, physics }
    }

    pub fn rect(&self) -> Rect {
        self.physics.rect
    }

    pub fn update(&mut self, ctx: &TickContext, cmds: &mut Commands) -> Result<(), ActorFault> {
        self.physics.validate()?;
        if ctx.is_zero_step() {
            return Ok(());
        }
        self.physics.step(ctx.platforms);
        self.physics.enforce_level_bounds(ctx.level_width);
        if self.physics.rect.top() > ctx.level_height {
            cmds.push(Intent::Despawn(self.id));
        }
        Ok(())
    }
}
