pub mod noise;
pub mod falloff;
pub mod height;
pub mod color;
pub mod map;

pub use noise::{generate_noise_map, noise2d, hash2d, NoiseSettings, NormalizeMode};
pub use falloff::generate_falloff_map;
pub use height::{Grid, HeightGrid, ColorGrid, TextureData};
pub use color::{Rgba, TerrainRegion, ColorMode, build_color_map};
pub use map::{ChunkData, MapGenerator, MAP_CHUNK_SIZE};
