//! Pick-and-place interaction for grid-based tabletop scenes: pointer
//! pick-up with grid snapping, and a lamp that steps between cells.

pub mod camera;
pub mod debug;
pub mod ecs;
pub mod grid;
pub mod input;
pub mod spatial;
pub mod table;
