use glam::Vec2;

use crate::world::geometry::PlatformId;

/// Camera state handed to the renderer each frame.  Position and eye
/// level come from the player entity; `platform` anchors the portal
/// walk so no point-location query is needed per frame.
#[derive(Clone, Copy, Debug)]
pub struct View {
    pub pos: Vec2,
    /// Unit facing direction.
    pub dir: Vec2,
    /// Absolute eye height in world units.
    pub eye_level: f32,
    /// Platform containing `pos`.
    pub platform: PlatformId,
}

impl View {
    pub fn new(pos: Vec2, dir: Vec2, eye_level: f32, platform: PlatformId) -> Self {
        Self {
            pos,
            dir,
            eye_level,
            platform,
        }
    }
}
