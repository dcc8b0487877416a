mod renderer;
mod span;
pub mod sprites;

pub use renderer::Software;
