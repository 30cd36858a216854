// ============================================
// Editor Preview - Одиночная генерация без потоков
// ============================================

use serde::{Deserialize, Serialize};

use crate::terrain::config::{ConfigError, TerrainConfig};
use crate::terrain::generation::{generate_falloff_map, ChunkData, MapGenerator, TextureData};
use crate::terrain::mesh::{build_terrain_mesh, TerrainMesh};

/// Что показывать в превью
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrawMode {
    /// Карта высот в оттенках серого
    NoiseMap,
    #[default]
    ColorMap,
    /// Меш с цветной текстурой
    Mesh,
    /// Меш с текстурой из карты высот
    NoiseMesh,
    FalloffMap,
}

impl DrawMode {
    pub fn has_mesh(self) -> bool {
        matches!(self, DrawMode::Mesh | DrawMode::NoiseMesh)
    }
}

#[derive(Debug, Clone)]
pub struct Preview {
    pub mode: DrawMode,
    pub data: ChunkData,
    pub texture: TextureData,
    pub mesh: Option<TerrainMesh>,
}

/// Синхронно сгенерировать чанк в начале координат (в обход JobScheduler).
/// Меш строится на `config.editor_lod`.
pub fn generate_preview(config: &TerrainConfig, mode: DrawMode) -> Result<Preview, ConfigError> {
    let config = config.clone().validated()?;
    let generator = MapGenerator::new(&config)?;
    let data = generator.generate_map_data([0.0, 0.0]);

    let texture = match mode {
        DrawMode::NoiseMap | DrawMode::NoiseMesh => data.height_map.to_texture(),
        DrawMode::ColorMap | DrawMode::Mesh => data.color_map.to_texture(),
        DrawMode::FalloffMap => match generator.falloff_map() {
            Some(falloff) => falloff.to_texture(),
            None => generate_falloff_map(generator.size()).to_texture(),
        },
    };

    let mesh = mode
        .has_mesh()
        .then(|| build_terrain_mesh(&data.height_map, config.vertical_scale, &config.height_curve, config.editor_lod));

    Ok(Preview { mode, data, texture, mesh })
}
