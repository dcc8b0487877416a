pub mod software;

pub use software::Software;
pub use software::sprites::{AttachSurface, Sprite, SpriteFrame, SpriteId};

use crate::world::texture::TextureBank;
use crate::world::{Level, View};

/// Packed 0x00RRGGBB pixel, the only format the software path emits.
pub type Rgba = u32;

/// Colour key treated as fully transparent in sprite textures.
pub const TRANSPARENT: Rgba = 0x00FF_00FF;

/// A renderer turns the portal graph plus a view into pixels.
///
/// `begin_frame` fixes the output resolution (projection tables are
/// rebuilt when it changes), `render` draws one frame, `end_frame`
/// hands the finished buffer to the caller for presentation.
pub trait Renderer {
    fn begin_frame(&mut self, width: usize, height: usize);

    fn render(&mut self, level: &Level, bank: &TextureBank, sprites: &SpriteFrame, view: &View);

    fn end_frame(&mut self, submit: impl FnOnce(&[Rgba], usize, usize));
}
