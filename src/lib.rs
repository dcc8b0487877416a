pub mod geom;
pub mod lvl;
pub mod renderer;
pub mod sim;
pub mod world;
