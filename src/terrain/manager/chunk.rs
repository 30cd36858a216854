// ============================================
// Terrain Chunk - Живой чанк бесконечного terrain
// ============================================
// Состояние данных: Uninitialized -> Awaiting -> Ready.
// Меши по уровням: NotRequested -> Requested -> Cached.
// Изменяется только на потоке-потребителе (стример и колбэки drain).

use std::sync::Arc;

use ultraviolet::{Vec2, Vec3};

use crate::terrain::cache::ChunkCoord;
use crate::terrain::generation::ChunkData;
use crate::terrain::lod::LodLevels;
use crate::terrain::mesh::TerrainMesh;

/// Квадрат чанка в пространстве чанков
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChunkBounds {
    pub min: Vec2,
    pub max: Vec2,
}

impl ChunkBounds {
    pub fn around(center: Vec2, size: f32) -> Self {
        let half = Vec2::broadcast(size / 2.0);
        Self { min: center - half, max: center + half }
    }

    /// Квадрат расстояния от точки до прямоугольника (0 внутри)
    pub fn sqr_distance(&self, point: Vec2) -> f32 {
        let dx = (self.min.x - point.x).max(0.0).max(point.x - self.max.x);
        let dz = (self.min.y - point.y).max(0.0).max(point.y - self.max.y);
        dx * dx + dz * dz
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum HeightDataState {
    Uninitialized,
    Awaiting,
    Ready(ChunkData),
}

#[derive(Debug, Clone, PartialEq)]
pub enum LodMeshState {
    NotRequested,
    Requested,
    Cached(Arc<TerrainMesh>),
}

/// Результат обновления чанка для стримера
#[derive(Debug, Default)]
pub(super) struct RefreshOutcome {
    /// Новый активный меш
    pub mesh_changed: Option<(usize, Arc<TerrainMesh>)>,
    /// Индекс уровня, для которого нужно запустить сборку меша
    pub request_mesh: Option<usize>,
}

pub struct TerrainChunk {
    coord: ChunkCoord,
    position: Vec2,
    bounds: ChunkBounds,
    pub(super) data: HeightDataState,
    pub(super) meshes: Vec<LodMeshState>,
    active_lod: Option<usize>,
    pub(super) visible: bool,
}

impl TerrainChunk {
    pub fn new(coord: ChunkCoord, chunk_size: f32, lod_count: usize) -> Self {
        let position = coord.center(chunk_size);
        Self {
            coord,
            position,
            bounds: ChunkBounds::around(position, chunk_size),
            data: HeightDataState::Uninitialized,
            meshes: vec![LodMeshState::NotRequested; lod_count],
            active_lod: None,
            visible: false,
        }
    }

    pub fn coord(&self) -> ChunkCoord {
        self.coord
    }

    /// Центр в пространстве чанков
    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Положение в мире для рендерера (y = 0)
    pub fn world_position(&self, world_scale: f32) -> Vec3 {
        Vec3::new(self.position.x, 0.0, self.position.y) * world_scale
    }

    pub fn bounds(&self) -> &ChunkBounds {
        &self.bounds
    }

    pub fn data_state(&self) -> &HeightDataState {
        &self.data
    }

    pub fn data(&self) -> Option<&ChunkData> {
        match &self.data {
            HeightDataState::Ready(data) => Some(data),
            _ => None,
        }
    }

    pub fn has_data(&self) -> bool {
        matches!(self.data, HeightDataState::Ready(_))
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn active_lod(&self) -> Option<usize> {
        self.active_lod
    }

    pub fn active_mesh(&self) -> Option<&Arc<TerrainMesh>> {
        match self.meshes.get(self.active_lod?)? {
            LodMeshState::Cached(mesh) => Some(mesh),
            _ => None,
        }
    }

    pub fn mesh_state(&self, lod_index: usize) -> Option<&LodMeshState> {
        self.meshes.get(lod_index)
    }

    /// Пересчитать видимость и уровень детализации.
    /// Без данных чанк остаётся скрытым.
    pub(super) fn refresh(&mut self, viewer: Vec2, levels: &LodLevels) -> RefreshOutcome {
        let mut outcome = RefreshOutcome::default();
        if !self.has_data() {
            return outcome;
        }

        let distance = self.bounds.sqr_distance(viewer).sqrt();
        self.visible = distance <= levels.max_view_distance();
        if !self.visible {
            return outcome;
        }

        let lod_index = levels.select(distance);
        if self.active_lod == Some(lod_index) {
            return outcome;
        }

        let cached = match &self.meshes[lod_index] {
            LodMeshState::Cached(mesh) => Some(Arc::clone(mesh)),
            _ => None,
        };
        match cached {
            Some(mesh) => {
                self.active_lod = Some(lod_index);
                outcome.mesh_changed = Some((lod_index, mesh));
            }
            // Старый меш остаётся активным до готовности нового
            None if self.meshes[lod_index] == LodMeshState::NotRequested => {
                self.meshes[lod_index] = LodMeshState::Requested;
                outcome.request_mesh = Some(lod_index);
            }
            None => {}
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::generation::{ColorGrid, HeightGrid, Rgba};
    use crate::terrain::lod::LodInfo;

    const SIZE: f32 = 240.0;

    fn levels() -> LodLevels {
        LodLevels::new(LodInfo::DEFAULT_LEVELS.to_vec()).unwrap()
    }

    fn ready_chunk(coord: ChunkCoord) -> TerrainChunk {
        let mut chunk = TerrainChunk::new(coord, SIZE, 4);
        chunk.data = HeightDataState::Ready(ChunkData {
            height_map: Arc::new(HeightGrid::filled(3, 3, 0.5)),
            color_map: Arc::new(ColorGrid::filled(3, 3, Rgba::gray(0.5))),
        });
        chunk
    }

    fn mesh(lod: u32) -> Arc<TerrainMesh> {
        Arc::new(TerrainMesh { lod, ..Default::default() })
    }

    #[test]
    fn test_bounds_distance() {
        let bounds = ChunkBounds::around(Vec2::new(240.0, 0.0), SIZE);
        assert_eq!(bounds.sqr_distance(Vec2::new(240.0, 50.0)), 0.0);
        assert_eq!(bounds.sqr_distance(Vec2::new(0.0, 0.0)), 120.0 * 120.0);
        assert_eq!(bounds.sqr_distance(Vec2::new(400.0, 160.0)), 40.0 * 40.0 + 40.0 * 40.0);
    }

    #[test]
    fn test_chunk_without_data_stays_hidden() {
        let mut chunk = TerrainChunk::new(ChunkCoord::new(0, 0), SIZE, 4);
        let outcome = chunk.refresh(Vec2::zero(), &levels());
        assert!(!chunk.is_visible());
        assert!(outcome.request_mesh.is_none());
        assert_eq!(chunk.world_position(20.0), Vec3::zero());
    }

    #[test]
    fn test_mesh_requested_once() {
        let mut chunk = ready_chunk(ChunkCoord::new(0, 0));
        let first = chunk.refresh(Vec2::zero(), &levels());
        assert_eq!(first.request_mesh, Some(0));
        assert!(chunk.is_visible());

        let second = chunk.refresh(Vec2::new(10.0, 0.0), &levels());
        assert!(second.request_mesh.is_none());
        assert_eq!(chunk.mesh_state(0), Some(&LodMeshState::Requested));
    }

    #[test]
    fn test_lod_swap_keeps_previous_mesh_until_ready() {
        let levels = levels();
        let mut chunk = ready_chunk(ChunkCoord::new(0, 0));
        chunk.refresh(Vec2::zero(), &levels);
        chunk.meshes[0] = LodMeshState::Cached(mesh(0));
        let outcome = chunk.refresh(Vec2::zero(), &levels);
        assert_eq!(outcome.mesh_changed.map(|(i, _)| i), Some(0));
        assert_eq!(chunk.active_lod(), Some(0));

        // Расстояние 250 -> уровень 1, пока меша нет - активен уровень 0
        let far = Vec2::new(370.0, 0.0);
        let outcome = chunk.refresh(far, &levels);
        assert_eq!(outcome.request_mesh, Some(1));
        assert_eq!(chunk.active_lod(), Some(0));
        assert_eq!(chunk.active_mesh().map(|m| m.lod), Some(0));

        chunk.meshes[1] = LodMeshState::Cached(mesh(1));
        let outcome = chunk.refresh(far, &levels);
        assert_eq!(outcome.mesh_changed.map(|(i, _)| i), Some(1));
        assert_eq!(chunk.active_mesh().map(|m| m.lod), Some(1));

        // Возврат к уровню 0 берёт меш из кэша без запроса
        let outcome = chunk.refresh(Vec2::zero(), &levels);
        assert!(outcome.request_mesh.is_none());
        assert_eq!(chunk.active_lod(), Some(0));
    }

    #[test]
    fn test_out_of_range_chunk_is_hidden() {
        let mut chunk = ready_chunk(ChunkCoord::new(4, 0));
        // Ближний край на 960 - 120 = 840 > 600
        let outcome = chunk.refresh(Vec2::zero(), &levels());
        assert!(!chunk.is_visible());
        assert!(outcome.request_mesh.is_none());
        assert!(outcome.mesh_changed.is_none());
    }
}
