//! Entity simulation: spawning from level records, fixed-tick physics,
//! monster AI, and the per-frame handoff to the renderer.

pub mod entity;
pub mod monster;
pub mod physics;
pub mod sight;

use glam::Vec2;

use crate::renderer::software::sprites::{AttachSurface, SpriteFrame};
use crate::world::geometry::Level;
use crate::world::texture::TextureBank;
use crate::world::view::View;

pub use entity::{Entity, EntityError, EntityKind, Keys};
pub use physics::{do_gravity, do_physics, move_entity};
pub use sight::point_can_see_point;

/// Eye height above a mover's feet; also the clearance a mover needs.
pub const VIEW_HEIGHT: f32 = 64.0;

/// All mutable simulation state.  The portal graph itself stays
/// immutable; entities only carry indices into it.
pub struct World {
    pub entities: Vec<Entity>,
    /// Index of the player entity, once spawned.
    pub player: Option<usize>,
    /// Monotonic simulation clock in milliseconds.
    pub time_ms: u64,
    /// Mouse velocity sampled by the input layer, pixels per second.
    pub mouse_speed: Vec2,
}

impl World {
    pub fn new() -> Self {
        Self {
            entities: Vec::new(),
            player: None,
            time_ms: 0,
            mouse_speed: Vec2::ZERO,
        }
    }

    pub fn player(&self) -> Option<&Entity> {
        self.player.map(|i| &self.entities[i])
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-frame world pass: run due AI thinks, publish every textured
/// entity as a billboard, and produce the camera view from the player.
///
/// `sprites` must have been cleared by the caller; registrations last
/// one frame only.
pub fn setup_frame(
    world: &mut World,
    level: &Level,
    bank: &TextureBank,
    sprites: &mut SpriteFrame,
) -> Option<View> {
    for i in 0..world.entities.len() {
        let e = &world.entities[i];
        if matches!(e.kind, EntityKind::Monster(_)) && world.time_ms >= e.next_think {
            monster::think(world, level, i);
        }
    }

    let player_angle = world.player().map(|p| p.angle);

    for e in &world.entities {
        let Some(tid) = e.texture else {
            continue;
        };
        let tex = bank.get(tid);
        let angle = match (e.follow, player_angle) {
            (true, Some(a)) => a,
            _ => e.angle,
        };
        let half = angle.perp() * (tex.w as f32 / 2.0);
        sprites.add_sprite(
            level,
            [e.pos - half, e.pos + half],
            tex.h as f32,
            e.vpos,
            AttachSurface::None,
            tid,
        );
    }

    world.player().map(|p| View {
        pos: p.pos,
        dir: p.angle,
        eye_level: p.vpos + VIEW_HEIGHT,
        platform: p.platform,
    })
}
