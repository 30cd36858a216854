// ============================================
// LOD Levels - Уровни детализации
// ============================================

use serde::{Deserialize, Serialize};

use crate::terrain::config::ConfigError;

/// Максимальный lod: шаг 12 всё ещё делит 240
pub const MAX_LOD: u32 = 6;

/// Шаг прореживания сетки: lod 0 -> 1, иначе 2 * lod
#[inline]
pub fn decimation_step(lod: u32) -> usize {
    if lod == 0 { 1 } else { lod as usize * 2 }
}

/// Уровень детализации: lod активен, пока расстояние <= visible_distance
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LodInfo {
    pub lod: u32,
    pub visible_distance: f32,
}

impl LodInfo {
    pub const DEFAULT_LEVELS: [LodInfo; 4] = [
        LodInfo { lod: 0, visible_distance: 200.0 },
        LodInfo { lod: 1, visible_distance: 300.0 },
        LodInfo { lod: 2, visible_distance: 450.0 },
        LodInfo { lod: 4, visible_distance: 600.0 },
    ];

    pub fn new(lod: u32, visible_distance: f32) -> Self {
        Self { lod, visible_distance }
    }

    pub fn step(&self) -> usize {
        decimation_step(self.lod)
    }
}

/// Проверенный список уровней: непустой, пороги строго возрастают
#[derive(Clone, Debug, PartialEq)]
pub struct LodLevels {
    levels: Vec<LodInfo>,
}

impl LodLevels {
    pub fn new(levels: Vec<LodInfo>) -> Result<Self, ConfigError> {
        Self::validate(&levels)?;
        Ok(Self { levels })
    }

    pub fn validate(levels: &[LodInfo]) -> Result<(), ConfigError> {
        if levels.is_empty() {
            return Err(ConfigError::EmptyLodLevels);
        }
        for (index, level) in levels.iter().enumerate() {
            if !level.visible_distance.is_finite() || level.visible_distance < 0.0 {
                return Err(ConfigError::InvalidThreshold { index });
            }
            if level.lod > MAX_LOD {
                return Err(ConfigError::LodOutOfRange { index, lod: level.lod });
            }
            if index > 0 && level.visible_distance <= levels[index - 1].visible_distance {
                return Err(ConfigError::LodThresholdsNotAscending { index });
            }
        }
        Ok(())
    }

    /// Порог последнего уровня = максимальная дальность видимости
    pub fn max_view_distance(&self) -> f32 {
        self.levels.last().map_or(0.0, |l| l.visible_distance)
    }

    /// Первый уровень, чей порог не меньше расстояния; иначе последний
    pub fn select(&self, distance: f32) -> usize {
        let last = self.levels.len() - 1;
        self.levels[..last]
            .iter()
            .position(|l| distance <= l.visible_distance)
            .unwrap_or(last)
    }

    pub fn get(&self, index: usize) -> Option<&LodInfo> {
        self.levels.get(index)
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LodInfo> {
        self.levels.iter()
    }
}
