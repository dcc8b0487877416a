//! Level file parsing and asset loading.

pub mod file;
pub mod loader;
pub mod tga;

pub use file::{LevelError, RawLevel};
pub use loader::{LevelAssets, LoadError, build_level, load_level, optimise_platforms};
