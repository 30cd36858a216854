mod vertex;
mod curve;
mod builder;

pub use vertex::TerrainVertex;
pub use curve::{CurveEvaluator, CurveInterpolation, CurveKey, HeightCurve};
pub use builder::{build_terrain_mesh, TerrainMesh};
