// ============================================
// Map Generator - Карта высот + цветов для чанка
// ============================================

use std::sync::Arc;

use crate::terrain::config::{ConfigError, TerrainConfig};

use super::color::{build_color_map, ColorMode, TerrainRegion};
use super::falloff::{apply_falloff, generate_falloff_map};
use super::height::{ColorGrid, HeightGrid};
use super::noise::{generate_noise_map, NoiseSettings};

/// Размер карты чанка. 240 делится на 2, 4, 6, 8, 10, 12
pub const MAP_CHUNK_SIZE: usize = 241;

/// Данные чанка. Создаются один раз и больше не меняются.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkData {
    pub height_map: Arc<HeightGrid>,
    pub color_map: Arc<ColorGrid>,
}

/// Построитель карт высот (thread-safe, разделяется между потоками через Arc)
#[derive(Debug, Clone)]
pub struct MapGenerator {
    size: usize,
    noise: NoiseSettings,
    color_mode: ColorMode,
    regions: Vec<TerrainRegion>,
    /// Маска спада, None если выключена
    falloff_map: Option<Arc<HeightGrid>>,
}

impl MapGenerator {
    pub fn new(config: &TerrainConfig) -> Result<Self, ConfigError> {
        Self::with_size(config, MAP_CHUNK_SIZE)
    }

    /// Генератор с нестандартным размером карты (для превью и тестов)
    pub fn with_size(config: &TerrainConfig, size: usize) -> Result<Self, ConfigError> {
        let config = config.clone().validated()?;
        let falloff_map = config.use_falloff.then(|| Arc::new(generate_falloff_map(size)));
        Ok(Self {
            size,
            noise: config.noise,
            color_mode: config.color_mode,
            regions: config.regions,
            falloff_map,
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Только карта высот (шум + маска спада)
    pub fn generate_height_map(&self, center: [f32; 2]) -> HeightGrid {
        let offset = [center[0] + self.noise.offset[0], center[1] + self.noise.offset[1]];
        let mut heights = generate_noise_map(self.size, self.size, &self.noise, offset);
        if let Some(falloff) = &self.falloff_map {
            apply_falloff(&mut heights, falloff);
        }
        heights
    }

    /// Полные данные чанка с центром `center` (в пространстве чанков)
    pub fn generate_map_data(&self, center: [f32; 2]) -> ChunkData {
        let heights = self.generate_height_map(center);
        let colors = build_color_map(&heights, &self.regions, self.color_mode);
        ChunkData {
            height_map: Arc::new(heights),
            color_map: Arc::new(colors),
        }
    }

    pub fn falloff_map(&self) -> Option<&HeightGrid> {
        self.falloff_map.as_deref()
    }
}
