// ============================================
// Config Errors - Ошибки конфигурации
// ============================================

use std::fmt;

/// Структурные ошибки конфигурации. Числовые диапазоны не ошибка - они зажимаются.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(String),
    EmptyRegions,
    RegionsNotAscending { index: usize },
    EmptyLodLevels,
    LodThresholdsNotAscending { index: usize },
    LodOutOfRange { index: usize, lod: u32 },
    InvalidThreshold { index: usize },
    EmptyHeightCurve,
    HeightCurveNotSorted { index: usize },
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Parse(e.to_string())
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "failed to read config: {}", e),
            ConfigError::Parse(e) => write!(f, "failed to parse config: {}", e),
            ConfigError::EmptyRegions => write!(f, "region list is empty"),
            ConfigError::RegionsNotAscending { index } => {
                write!(f, "region {} has a lower height threshold than the previous one", index)
            }
            ConfigError::EmptyLodLevels => write!(f, "lod level list is empty"),
            ConfigError::LodThresholdsNotAscending { index } => {
                write!(f, "lod level {} does not have a strictly increasing distance threshold", index)
            }
            ConfigError::LodOutOfRange { index, lod } => {
                write!(f, "lod level {} uses lod {} which does not divide the chunk grid", index, lod)
            }
            ConfigError::InvalidThreshold { index } => {
                write!(f, "threshold {} is negative or not finite", index)
            }
            ConfigError::EmptyHeightCurve => write!(f, "height curve has no keys"),
            ConfigError::HeightCurveNotSorted { index } => {
                write!(f, "height curve key {} is out of order", index)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            _ => None,
        }
    }
}
