// ============================================
// Terrain Config - Настройки генерации из JSON
// ============================================
// Все поля имеют значения по умолчанию, поэтому частичный JSON тоже работает.
// Числовые параметры вне диапазона зажимаются, структурные ошибки - ConfigError.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::terrain::generation::{ColorMode, NoiseSettings, Rgba, TerrainRegion};
use crate::terrain::generation::noise::MIN_NOISE_SCALE;
use crate::terrain::lod::{LodInfo, LodLevels, MAX_LOD};
use crate::terrain::mesh::HeightCurve;
use crate::terrain::preview::DrawMode;

use super::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    pub noise: NoiseSettings,
    /// Множитель высоты меша
    pub vertical_scale: f32,
    pub height_curve: HeightCurve,
    pub use_falloff: bool,
    pub color_mode: ColorMode,
    /// Регионы по возрастанию порога
    pub regions: Vec<TerrainRegion>,
    /// Уровни детализации по возрастанию дистанции
    pub lod_levels: Vec<LodInfo>,
    /// Минимальное смещение зрителя для пересчёта видимых чанков
    pub move_threshold: f32,
    /// Мир -> пространство чанков
    pub world_scale: f32,
    /// 0 = по числу ядер
    pub worker_threads: usize,
    /// lod для превью в редакторе
    pub editor_lod: u32,
    pub draw_mode: DrawMode,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            noise: NoiseSettings::default(),
            vertical_scale: 10.0,
            height_curve: HeightCurve::linear(),
            use_falloff: false,
            color_mode: ColorMode::Discrete,
            regions: default_regions(),
            lod_levels: LodInfo::DEFAULT_LEVELS.to_vec(),
            move_threshold: 25.0,
            world_scale: 20.0,
            worker_threads: 0,
            editor_lod: 0,
            draw_mode: DrawMode::ColorMap,
        }
    }
}

/// Вода -> песок -> трава -> скалы -> снег
fn default_regions() -> Vec<TerrainRegion> {
    vec![
        TerrainRegion::new("deep water", 0.0, Rgba::rgb(0.20, 0.38, 0.78)),
        TerrainRegion::new("water", 0.3, Rgba::rgb(0.22, 0.42, 0.85)),
        TerrainRegion::new("sand", 0.4, Rgba::rgb(0.84, 0.82, 0.55)),
        TerrainRegion::new("grass", 0.45, Rgba::rgb(0.34, 0.60, 0.10)),
        TerrainRegion::new("grass 2", 0.55, Rgba::rgb(0.24, 0.42, 0.07)),
        TerrainRegion::new("rock", 0.6, Rgba::rgb(0.37, 0.28, 0.24)),
        TerrainRegion::new("rock 2", 0.7, Rgba::rgb(0.29, 0.24, 0.23)),
        TerrainRegion::new("snow", 0.9, Rgba::rgb(1.0, 1.0, 1.0)),
    ]
}

impl TerrainConfig {
    /// Загрузить из JSON строки (без проверки)
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Загрузить из файла и проверить
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_json(&content)?.validated()
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Зажать числовые параметры и проверить списки
    pub fn validated(mut self) -> Result<Self, ConfigError> {
        self.sanitize();
        self.validate()?;
        Ok(self)
    }

    fn sanitize(&mut self) {
        let noise = &mut self.noise;
        if !(noise.scale > 0.0) {
            log::warn!("noise scale {} is not positive, clamping to {}", noise.scale, MIN_NOISE_SCALE);
            noise.scale = MIN_NOISE_SCALE;
        }
        if noise.octaves < 1 {
            log::warn!("octave count {} clamped to 1", noise.octaves);
            noise.octaves = 1;
        }
        if !(noise.lacunarity >= 1.0) {
            log::warn!("lacunarity {} clamped to 1.0", noise.lacunarity);
            noise.lacunarity = 1.0;
        }
        if !(0.0..=1.0).contains(&noise.persistence) {
            let clamped = if noise.persistence > 1.0 { 1.0 } else { 0.0 };
            log::warn!("persistence {} clamped to {}", noise.persistence, clamped);
            noise.persistence = clamped;
        }
        if !(self.move_threshold >= 0.0) {
            log::warn!("move threshold {} clamped to 0", self.move_threshold);
            self.move_threshold = 0.0;
        }
        if !(self.world_scale > 0.0) {
            log::warn!("world scale {} is not positive, using 1.0", self.world_scale);
            self.world_scale = 1.0;
        }
        if self.editor_lod > MAX_LOD {
            log::warn!("editor lod {} clamped to {}", self.editor_lod, MAX_LOD);
            self.editor_lod = MAX_LOD;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.regions.is_empty() {
            return Err(ConfigError::EmptyRegions);
        }
        for (index, region) in self.regions.iter().enumerate() {
            if !region.height.is_finite() {
                return Err(ConfigError::InvalidThreshold { index });
            }
            if index > 0 && region.height < self.regions[index - 1].height {
                return Err(ConfigError::RegionsNotAscending { index });
            }
        }
        LodLevels::validate(&self.lod_levels)?;
        self.height_curve.validate()?;
        Ok(())
    }

    /// Проверенные уровни детализации
    pub fn lod_levels(&self) -> Result<LodLevels, ConfigError> {
        LodLevels::new(self.lod_levels.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::generation::NormalizeMode;

    #[test]
    fn test_default_config_is_valid() {
        let config = TerrainConfig::default().validated().unwrap();
        assert_eq!(config.lod_levels().unwrap().max_view_distance(), 600.0);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r##"{
            "noise": { "seed": 99, "octaves": 6, "normalize_mode": "local" },
            "color_mode": "gradient",
            "regions": [
                { "name": "water", "height": 0.0, "color": "#2060c0" },
                { "name": "land", "height": 0.5, "color": [0.2, 0.6, 0.1] }
            ]
        }"##;
        let config = TerrainConfig::from_json(json).unwrap().validated().unwrap();
        assert_eq!(config.noise.seed, 99);
        assert_eq!(config.noise.octaves, 6);
        assert_eq!(config.noise.normalize_mode, NormalizeMode::Local);
        assert_eq!(config.noise.lacunarity, 2.0);
        assert_eq!(config.color_mode, ColorMode::Gradient);
        assert_eq!(config.regions.len(), 2);
        assert_eq!(config.vertical_scale, 10.0);
    }

    #[test]
    fn test_out_of_range_numbers_are_clamped() {
        let mut config = TerrainConfig::default();
        config.noise.scale = -1.0;
        config.noise.octaves = 0;
        config.noise.lacunarity = 0.5;
        config.noise.persistence = 1.5;
        config.move_threshold = -3.0;
        let config = config.validated().unwrap();
        assert_eq!(config.noise.scale, MIN_NOISE_SCALE);
        assert_eq!(config.noise.octaves, 1);
        assert_eq!(config.noise.lacunarity, 1.0);
        assert_eq!(config.noise.persistence, 1.0);
        assert_eq!(config.move_threshold, 0.0);
    }

    #[test]
    fn test_structural_errors_fail_fast() {
        let mut config = TerrainConfig::default();
        config.regions.swap(1, 2);
        assert!(matches!(config.validated(), Err(ConfigError::RegionsNotAscending { index: 2 })));

        let mut config = TerrainConfig::default();
        config.lod_levels.clear();
        assert!(matches!(config.validated(), Err(ConfigError::EmptyLodLevels)));

        let mut config = TerrainConfig::default();
        config.lod_levels.reverse();
        assert!(matches!(config.validated(), Err(ConfigError::LodThresholdsNotAscending { index: 1 })));
    }

    #[test]
    fn test_json_roundtrip_keeps_values() {
        let mut config = TerrainConfig::default();
        config.noise.seed = -12;
        config.use_falloff = true;
        let json = config.to_json().unwrap();
        assert_eq!(TerrainConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_bad_json_is_parse_error() {
        assert!(matches!(TerrainConfig::from_json("{ not json"), Err(ConfigError::Parse(_))));
    }
}
