mod levels;

pub use levels::{decimation_step, LodInfo, LodLevels, MAX_LOD};
