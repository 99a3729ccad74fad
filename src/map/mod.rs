pub mod controller;
pub mod geometry;
pub mod projection;
pub mod renderer;
pub mod spatial;

pub use controller::{DetailLevel, LabelSize, LevelController, MapViewState, SwitchOutcome, SwitchTicket};
pub use projection::{Projection, ZoomTransform};
pub use renderer::{MapLayers, MapRenderer};
pub use spatial::RegionGrid;
