pub mod geometry;
pub mod texture;
pub mod view;

#[cfg(test)]
pub mod fixtures;

pub use geometry::{Edge, EdgeId, Level, PLATFORM_OUTSIDE, Platform, PlatformId, Vertex, VertexId};
pub use texture::{NO_TEXTURE, Texture, TextureBank, TextureId};
pub use view::View;
