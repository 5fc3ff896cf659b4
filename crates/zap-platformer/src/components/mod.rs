pub mod animation;
pub mod layer;
pub mod physics;
pub mod terrain;
