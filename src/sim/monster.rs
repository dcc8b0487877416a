use glam::Vec2;

use crate::sim::{Entity, EntityKind, VIEW_HEIGHT, World, point_can_see_point};
use crate::world::geometry::Level;
use crate::world::texture::TextureId;

/// Think cadence while idle or tracking, milliseconds.
const WIT: u64 = 100;
/// Delay between acquiring the player and the first shot.
const AIMTIME: u64 = 200;
/// Delay between shots.
const RELOADTIME: u64 = 1000;
/// How long the muzzle-flash pose is held.
const FIRETIME: u64 = 50;
/// Beyond this the monster closes in instead of shooting.
const SHOOTRANGE: f32 = 300.0;
/// Gun height above the monster's feet.
const MUZZLEHEIGHT: f32 = 64.0;
/// Walk animation half-period lives in the clock divisor below.
const WALK_FRAME_MS: u64 = 276;

/// Pose sprites, in the order of [`MONSTER_FRAME_PATHS`].
const STAND: usize = 0;
const WALK1: usize = 1;
const WALK2: usize = 2;
const AIM: usize = 3;
const FIRE: usize = 4;

pub const MONSTER_FRAME_PATHS: [&str; 5] = [
    "monster_stand.tga",
    "monster_walk1.tga",
    "monster_walk2.tga",
    "monster_aim.tga",
    "monster_fire.tga",
];

/// Per-monster AI state, embedded in its entity.
#[derive(Clone, Debug)]
pub struct MonsterState {
    pub frames: [TextureId; 5],
    /// Next moment a shot may be taken, once the player is sighted.
    pub shoot_time: Option<u64>,
    /// Set for one think after firing, to drop back to the aim pose.
    pub aim_recover: bool,
}

impl MonsterState {
    pub fn new(frames: [TextureId; 5]) -> Self {
        Self {
            frames,
            shoot_time: None,
            aim_recover: false,
        }
    }
}

/// One AI decision for the monster at `idx`.  Steering goes through
/// `wish_dir`; the physics tick does the actual moving.
pub(crate) fn think(world: &mut World, level: &Level, idx: usize) {
    let time = world.time_ms;
    let target = world.player().map(|p| (p.pos, p.vpos));

    let e = &mut world.entities[idx];
    let mut m = match &e.kind {
        EntityKind::Monster(m) => m.clone(),
        _ => return,
    };
    e.wish_dir = Vec2::ZERO;

    decide(e, &mut m, level, target, time);
    e.kind = EntityKind::Monster(m);
}

fn decide(
    e: &mut Entity,
    m: &mut MonsterState,
    level: &Level,
    target: Option<(Vec2, f32)>,
    time: u64,
) {
    if m.aim_recover {
        m.aim_recover = false;
        e.texture = Some(m.frames[AIM]);
        e.next_think = time + WIT;
        return;
    }
    e.next_think = time + WIT;

    let Some((player_pos, player_vpos)) = target else {
        e.texture = Some(m.frames[STAND]);
        m.shoot_time = None;
        return;
    };

    let visible = point_can_see_point(
        level,
        player_pos,
        player_vpos + VIEW_HEIGHT,
        e.pos,
        e.vpos + MUZZLEHEIGHT,
    );
    if !visible {
        e.texture = Some(m.frames[STAND]);
        e.next_think = time + WIT * 5;
        m.shoot_time = None;
        return;
    }

    let delta = player_pos - e.pos;
    let dist = delta.length();
    if dist > SHOOTRANGE {
        m.shoot_time = None;
        let frame = if (time / WALK_FRAME_MS) % 2 == 0 {
            WALK1
        } else {
            WALK2
        };
        e.texture = Some(m.frames[frame]);
        e.angle = delta / dist;
        e.wish_dir = e.angle;
        return;
    }

    match m.shoot_time {
        Some(t) if time >= t => {
            m.shoot_time = Some(time + RELOADTIME);
            m.aim_recover = true;
            e.texture = Some(m.frames[FIRE]);
            e.next_think = time + FIRETIME;
        }
        Some(_) => {
            e.texture = Some(m.frames[AIM]);
        }
        None => {
            m.shoot_time = Some(time + AIMTIME);
            e.texture = Some(m.frames[AIM]);
        }
    }
}

/*====================================================================*/
/*                               Tests                                */
/*====================================================================*/
