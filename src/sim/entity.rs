use bitflags::bitflags;
use glam::{Vec2, vec2};

use crate::geom::locate_platform;
use crate::sim::World;
use crate::sim::monster::{MONSTER_FRAME_PATHS, MonsterState};
use crate::world::geometry::{Level, PlatformId};
use crate::world::texture::{TextureId, TextureSource};

bitflags! {
    /// Player movement input, one bit per held key.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct Keys: u32 {
        const FORWARD = 1;
        const RIGHT = 2;
        const LEFT = 4;
        const BACK = 8;
        const TURN_RIGHT = 16;
        const TURN_LEFT = 32;
    }
}

/// Closed set of mover behaviours, dispatched by match in the physics
/// and AI passes.
#[derive(Clone, Debug)]
pub enum EntityKind {
    /// Marker used only to place the player; never simulated.
    Spawn,
    Player,
    /// Decoration billboard with no behaviour.
    Static,
    Monster(MonsterState),
}

#[derive(Clone, Debug)]
pub struct Entity {
    pub kind: EntityKind,
    pub pos: Vec2,
    /// Unit facing vector.
    pub angle: Vec2,
    /// Feet height.
    pub vpos: f32,
    /// Vertical velocity, used while airborne.
    pub vvel: f32,
    pub on_ground: bool,
    pub keys: Keys,
    /// AI steering request, consumed by the physics tick.
    pub wish_dir: Vec2,
    pub platform: PlatformId,
    pub texture: Option<TextureId>,
    /// Billboard always faces the player instead of `angle`.
    pub follow: bool,
    pub next_think: u64,
}

impl Entity {
    fn new(kind: EntityKind, pos: Vec2, angle: Vec2) -> Self {
        Self {
            kind,
            pos,
            angle,
            vpos: 0.0,
            vvel: 0.0,
            on_ground: true,
            keys: Keys::empty(),
            wish_dir: Vec2::ZERO,
            platform: 0,
            texture: None,
            follow: false,
            next_think: 0,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EntityError {
    #[error("entity record is missing key `{0}`")]
    MissingKey(&'static str),

    #[error("malformed value `{value}` for key `{key}`")]
    BadValue { key: &'static str, value: String },

    #[error("unknown entity type `{0}`")]
    UnknownType(String),

    #[error("no spawn point in level")]
    NoSpawnPoint,
}

/// Look up `key` in a `\`-separated record of `key=value` fields.
/// Keys compare case-insensitively.
pub fn find_value_for_key<'a>(record: &'a str, key: &str) -> Option<&'a str> {
    record.split('\\').find_map(|field| {
        let (k, v) = field.split_once('=')?;
        k.eq_ignore_ascii_case(key).then_some(v)
    })
}

fn require<'a>(record: &'a str, key: &'static str) -> Result<&'a str, EntityError> {
    find_value_for_key(record, key).ok_or(EntityError::MissingKey(key))
}

fn parse_f32(key: &'static str, value: &str) -> Result<f32, EntityError> {
    value.trim().parse().map_err(|_| EntityError::BadValue {
        key,
        value: value.to_owned(),
    })
}

impl World {
    /// Spawn one entity from a map-editor record such as
    /// `type=static\coords=96 64\angle=90\texture=barrel.tga\follow=1`.
    pub fn add_entity(
        &mut self,
        level: &Level,
        textures: &mut dyn TextureSource,
        record: &str,
    ) -> Result<(), EntityError> {
        let kind = require(record, "type")?;
        let coords = require(record, "coords")?;
        let angle_deg = parse_f32("angle", require(record, "angle")?)?;

        let mut parts = coords.split_whitespace();
        let pos = match (parts.next(), parts.next()) {
            (Some(x), Some(y)) => vec2(parse_f32("coords", x)?, parse_f32("coords", y)?),
            _ => {
                return Err(EntityError::BadValue {
                    key: "coords",
                    value: coords.to_owned(),
                });
            }
        };
        let rad = angle_deg.to_radians();
        let angle = vec2(rad.cos(), rad.sin());

        let mut e = match kind.to_ascii_lowercase().as_str() {
            "spawn" => Entity::new(EntityKind::Spawn, pos, angle),
            "static" => {
                let mut e = Entity::new(EntityKind::Static, pos, angle);
                e.follow = require(record, "follow")?.trim() != "0";
                e.texture = Some(textures.texture_from_path(require(record, "texture")?));
                e
            }
            "monster" => {
                let frames =
                    MONSTER_FRAME_PATHS.map(|path| textures.texture_from_path(path));
                let mut e = Entity::new(
                    EntityKind::Monster(MonsterState::new(frames)),
                    pos,
                    angle,
                );
                e.texture = Some(frames[0]);
                e.follow = true;
                e.next_think = self.time_ms;
                e
            }
            other => return Err(EntityError::UnknownType(other.to_owned())),
        };

        if !matches!(e.kind, EntityKind::Spawn) {
            e.platform = locate_platform(level, e.pos);
            e.vpos = level.platform(e.platform).floor_h;
        }
        self.entities.push(e);
        Ok(())
    }

    /// Create the player entity at the level's spawn marker.
    pub fn spawn_player(&mut self, level: &Level) -> Result<usize, EntityError> {
        let spawn = self
            .entities
            .iter()
            .find(|e| matches!(e.kind, EntityKind::Spawn))
            .ok_or(EntityError::NoSpawnPoint)?;

        let mut p = Entity::new(EntityKind::Player, spawn.pos, spawn.angle);
        p.platform = locate_platform(level, p.pos);
        if level.is_outside(p.platform) {
            log::warn!("spawn point lies outside the map");
        }
        p.vpos = level.platform(p.platform).floor_h;

        let idx = self.entities.len();
        self.entities.push(p);
        self.player = Some(idx);
        Ok(idx)
    }
}

/*====================================================================*/
/*                               Tests                                */
/*====================================================================*/
#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::fixtures::two_room_level;
    use crate::world::texture::NO_TEXTURE;

    struct StubTextures;
    impl TextureSource for StubTextures {
        fn texture_from_path(&mut self, _path: &str) -> TextureId {
            NO_TEXTURE
        }
    }

    #[test]
    fn record_lookup_is_case_insensitive() {
        let rec = r"type=static\Coords=96 64\ANGLE=90";
        assert_eq!(find_value_for_key(rec, "type"), Some("static"));
        assert_eq!(find_value_for_key(rec, "coords"), Some("96 64"));
        assert_eq!(find_value_for_key(rec, "angle"), Some("90"));
        assert_eq!(find_value_for_key(rec, "texture"), None);
    }

    #[test]
    fn lookup_matches_whole_keys_only() {
        let rec = r"subtype=a\type=b";
        assert_eq!(find_value_for_key(rec, "type"), Some("b"));
    }

    #[test]
    fn spawn_and_player_placement() {
        let level = two_room_level(0.0, 128.0, 16.0, 128.0);
        let mut world = World::new();
        world
            .add_entity(&level, &mut StubTextures, r"type=spawn\coords=200 64\angle=180")
            .unwrap();
        let idx = world.spawn_player(&level).unwrap();

        let p = &world.entities[idx];
        assert!(matches!(p.kind, EntityKind::Player));
        assert_eq!(p.platform, 2);
        assert_eq!(p.vpos, 16.0);
        assert!((p.angle.x + 1.0).abs() < 1e-5);
        assert!(p.angle.y.abs() < 1e-5);
    }

    #[test]
    fn static_entity_requires_texture_key() {
        let level = two_room_level(0.0, 128.0, 0.0, 128.0);
        let mut world = World::new();
        let err = world
            .add_entity(&level, &mut StubTextures, r"type=static\coords=64 64\angle=0\follow=1")
            .unwrap_err();
        assert!(matches!(err, EntityError::MissingKey("texture")));
    }

    #[test]
    fn unknown_type_is_rejected() {
        let level = two_room_level(0.0, 128.0, 0.0, 128.0);
        let mut world = World::new();
        let err = world
            .add_entity(&level, &mut StubTextures, r"type=dragon\coords=64 64\angle=0")
            .unwrap_err();
        assert!(matches!(err, EntityError::UnknownType(t) if t == "dragon"));
    }
}
