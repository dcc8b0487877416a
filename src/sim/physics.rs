use glam::{Vec2, vec2};

use crate::geom::ray_walk;
use crate::sim::{Entity, EntityKind, Keys, VIEW_HEIGHT, World};
use crate::world::geometry::{Level, PlatformId};

/// Highest ledge a mover can climb without jumping.
pub const STEP_HEIGHT: f32 = 64.0;
/// Bias pushing a deflected mover off the wall it hit, so the next
/// micro-step does not snag the same edge.
const PUSH_EXTRA: f32 = 0.5;
/// Slide resolution attempts per movement call.
const MAX_SLIDE_PASSES: usize = 8;

pub const GRAVITY: f32 = 2048.0; // units per second^2
pub const RUN_SPEED: f32 = 200.0; // units per second
pub const MONSTER_RUN_SPEED: f32 = 100.0;
pub const TURN_SPEED: f32 = -3.0; // radians per second
pub const MOUSE_SENS: f32 = 0.01; // radians per pixel

/// Rotate a vector clockwise by `angle` radians.
fn rotate(v: Vec2, angle: f32) -> Vec2 {
    let (s, c) = angle.sin_cos();
    vec2(v.x * c + v.y * s, -v.x * s + v.y * c)
}

/// Gravity integration for one tick; a no-op while grounded.  Landing
/// clamps to the current platform's floor and zeroes vertical speed.
pub fn do_gravity(level: &Level, e: &mut Entity, dt_ms: u64) {
    if e.on_ground {
        return;
    }
    let dtf = dt_ms as f32 * 0.001;
    e.vvel -= GRAVITY * dtf;
    e.vpos += e.vvel * dtf;

    let floor = level.platform(e.platform).floor_h;
    if e.vpos <= floor {
        e.vpos = floor;
        e.on_ground = true;
        e.vvel = 0.0;
    }
}

/// Can the mover pass through the portal into `next`?
fn can_enter(level: &Level, e: &Entity, next: PlatformId) -> bool {
    if level.is_outside(next) {
        return false;
    }
    let p = level.platform(next);
    e.vpos + VIEW_HEIGHT < p.ceil_h
        && p.ceil_h - p.floor_h >= VIEW_HEIGHT
        && p.floor_h <= e.vpos + STEP_HEIGHT
}

/// Sliding movement resolver.
///
/// Casts the requested displacement as a ray through the portal graph.
/// Admissible crossings are taken (stepping up onto higher floors as
/// they come); the first inadmissible one stops the mover at the
/// boundary and deflects the remainder along the wall, with a small
/// push away from it.  The deflected remainder is retried up to
/// [`MAX_SLIDE_PASSES`] times, which bounds the work even in
/// degenerate geometry.
pub fn move_entity(level: &Level, e: &mut Entity, dir: Vec2, dist: f32) {
    let mut dir = dir;
    let mut dist = dist;

    'pass: for _ in 0..MAX_SLIDE_PASSES {
        if dist <= f32::EPSILON {
            return;
        }

        let start = e.pos;
        let mut platform = e.platform;
        let mut origin = start;
        let mut walked = 0.0f32;

        loop {
            let Some(hit) = ray_walk(level, platform, dir, origin, walked) else {
                // Malformed geometry; abandon this movement step.
                return;
            };

            if dist <= hit.distance {
                e.pos = start + dir * dist;
                e.platform = platform;
                settle(level, e);
                return;
            }

            if can_enter(level, e, hit.platform) {
                let floor = level.platform(hit.platform).floor_h;
                if floor > e.vpos {
                    // Stair step, already known to be within reach.
                    e.vpos = floor;
                }
                platform = hit.platform;
                origin = hit.pos;
                walked = hit.distance;
                continue;
            }

            // Blocked: stop at the wall and slide the leftover motion
            // along it.
            e.pos = hit.pos;
            e.platform = platform;
            settle(level, e);

            let remaining = dist - hit.distance;
            let edge = level.edge(hit.edge);
            let push = if edge.right == platform {
                -PUSH_EXTRA
            } else {
                PUSH_EXTRA
            };
            let deflected = dir - edge.normal * (push + dir.dot(edge.normal));
            let len = deflected.length();
            if len <= f32::EPSILON {
                return;
            }
            dir = deflected / len;
            dist = remaining * len;
            continue 'pass;
        }
    }
}

/// Vertical resolution after a horizontal move: walking off a ledge
/// puts the mover in the air with no vertical speed.
fn settle(level: &Level, e: &mut Entity) {
    let floor = level.platform(e.platform).floor_h;
    if floor < e.vpos && e.on_ground {
        e.on_ground = false;
        e.vvel = 0.0;
    }
}

fn player_tick(level: &Level, e: &mut Entity, mouse_speed: Vec2, dt_ms: u64) {
    if e.keys.is_empty() && e.on_ground && mouse_speed.x == 0.0 {
        return;
    }
    let dtf = dt_ms as f32 * 0.001;

    let mut turn = 0.0;
    if e.keys.contains(Keys::TURN_RIGHT) {
        turn += TURN_SPEED;
    }
    if e.keys.contains(Keys::TURN_LEFT) {
        turn -= TURN_SPEED;
    }
    turn -= mouse_speed.x * MOUSE_SENS;
    if turn != 0.0 {
        e.angle = rotate(e.angle, turn * dtf);
    }

    let forward = e.angle;
    let right = forward.perp();

    let mut ff = 0.0f32;
    let mut rf = 0.0f32;
    if e.keys.contains(Keys::FORWARD) {
        ff += 1.0;
    }
    if e.keys.contains(Keys::BACK) {
        ff -= 1.0;
    }
    if e.keys.contains(Keys::RIGHT) {
        rf += 1.0;
    }
    if e.keys.contains(Keys::LEFT) {
        rf -= 1.0;
    }

    if ff != 0.0 || rf != 0.0 {
        if ff != 0.0 && rf != 0.0 {
            ff *= std::f32::consts::FRAC_1_SQRT_2;
            rf *= std::f32::consts::FRAC_1_SQRT_2;
        }
        let wish = forward * ff + right * rf;
        move_entity(level, e, wish, RUN_SPEED * dtf);
    }
    do_gravity(level, e, dt_ms);
}

fn monster_tick(level: &Level, e: &mut Entity, dt_ms: u64) {
    if e.wish_dir == Vec2::ZERO {
        return;
    }
    let dir = e.wish_dir;
    move_entity(level, e, dir, MONSTER_RUN_SPEED * dt_ms as f32 * 0.001);
    do_gravity(level, e, dt_ms);
}

/// One fixed physics tick for every simulated entity.
pub fn do_physics(world: &mut World, level: &Level, dt_ms: u64) {
    let mouse_speed = world.mouse_speed;
    for e in &mut world.entities {
        match e.kind {
            EntityKind::Player => player_tick(level, e, mouse_speed, dt_ms),
            EntityKind::Monster(_) => monster_tick(level, e, dt_ms),
            EntityKind::Spawn | EntityKind::Static => {}
        }
    }
}

/*====================================================================*/
/*                               Tests                                */
/*====================================================================*/
