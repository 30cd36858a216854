use std::sync::Arc;

use crate::terrain::cache::ChunkCoord;
use crate::terrain::config::ConfigError;
use crate::terrain::generation::TextureData;
use crate::terrain::mesh::TerrainMesh;

/// Изменение, которое внешний рендерер должен применить
#[derive(Debug, Clone, PartialEq)]
pub enum ChunkEvent {
    VisibilityChanged {
        coord: ChunkCoord,
        visible: bool,
    },
    /// Активный меш чанка сменился
    MeshChanged {
        coord: ChunkCoord,
        lod_index: usize,
        mesh: Arc<TerrainMesh>,
    },
    /// Пришли данные чанка, текстуру можно строить
    TextureReady {
        coord: ChunkCoord,
        texture: Arc<TextureData>,
    },
}

impl ChunkEvent {
    pub fn coord(&self) -> ChunkCoord {
        match self {
            ChunkEvent::VisibilityChanged { coord, .. }
            | ChunkEvent::MeshChanged { coord, .. }
            | ChunkEvent::TextureReady { coord, .. } => *coord,
        }
    }
}

/// Снимок состояния стримера
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StreamerStats {
    pub chunks: usize,
    pub visible: usize,
    pub jobs_in_flight: usize,
    pub jobs_failed: usize,
    /// Сколько раз пересчитывалось окно видимости
    pub window_updates: u64,
}

/// Ошибка создания стримера
#[derive(Debug)]
pub enum StreamerError {
    Config(ConfigError),
    ThreadPool(rayon::ThreadPoolBuildError),
}

impl From<ConfigError> for StreamerError {
    fn from(e: ConfigError) -> Self {
        StreamerError::Config(e)
    }
}

impl From<rayon::ThreadPoolBuildError> for StreamerError {
    fn from(e: rayon::ThreadPoolBuildError) -> Self {
        StreamerError::ThreadPool(e)
    }
}

impl std::fmt::Display for StreamerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StreamerError::Config(e) => write!(f, "Config error: {}", e),
            StreamerError::ThreadPool(e) => write!(f, "Thread pool error: {}", e),
        }
    }
}

impl std::error::Error for StreamerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StreamerError::Config(e) => Some(e),
            StreamerError::ThreadPool(e) => Some(e),
        }
    }
}
