// ============================================
// Terrain Streamer - Бесконечный terrain вокруг зрителя
// ============================================
// Окно видимых чанков пересчитывается, только если зритель сместился
// дальше порога. Данные и меши строятся в JobScheduler, результаты
// применяются в process_completed() на потоке-потребителе.
// Чанки не удаляются, только скрываются.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use ultraviolet::Vec2;

use crate::terrain::cache::ChunkCoord;
use crate::terrain::config::TerrainConfig;
use crate::terrain::generation::{ChunkData, MapGenerator, TextureData, MAP_CHUNK_SIZE};
use crate::terrain::jobs::{JobError, JobScheduler};
use crate::terrain::lod::LodLevels;
use crate::terrain::mesh::{build_terrain_mesh, TerrainMesh};

use super::chunk::{HeightDataState, LodMeshState, TerrainChunk};
use super::types::{ChunkEvent, StreamerError, StreamerStats};

/// Сторона чанка в пространстве чанков
pub const CHUNK_SIZE: f32 = (MAP_CHUNK_SIZE - 1) as f32;

pub struct TerrainStreamer {
    config: TerrainConfig,
    generator: Arc<MapGenerator>,
    lod_levels: LodLevels,
    scheduler: JobScheduler<TerrainStreamer>,
    chunks: HashMap<ChunkCoord, TerrainChunk>,
    visible_last_update: HashSet<ChunkCoord>,
    chunks_visible_radius: i32,
    /// Позиция зрителя в пространстве чанков
    viewer: Vec2,
    viewer_at_last_update: Option<Vec2>,
    window_updates: u64,
    events: Vec<ChunkEvent>,
}

impl TerrainStreamer {
    pub fn new(config: TerrainConfig) -> Result<Self, StreamerError> {
        let config = config.validated()?;
        let lod_levels = config.lod_levels()?;
        let generator = MapGenerator::new(&config)?;
        let scheduler = JobScheduler::new(config.worker_threads)?;
        let chunks_visible_radius = (lod_levels.max_view_distance() / CHUNK_SIZE).ceil() as i32;

        log::info!(
            "Terrain streamer: view distance {}, {} chunk radius, {} LOD levels",
            lod_levels.max_view_distance(),
            chunks_visible_radius,
            lod_levels.len()
        );

        Ok(Self {
            config,
            generator: Arc::new(generator),
            lod_levels,
            scheduler,
            chunks: HashMap::new(),
            visible_last_update: HashSet::new(),
            chunks_visible_radius,
            viewer: Vec2::zero(),
            viewer_at_last_update: None,
            window_updates: 0,
            events: Vec::new(),
        })
    }

    /// Тик: применить готовые результаты, затем обработать позицию зрителя
    pub fn tick(&mut self, viewer_world: Vec2) {
        self.process_completed();
        self.update(viewer_world);
    }

    /// Новая позиция зрителя в мировых координатах (плоскость X/Z).
    /// Первый вызов всегда строит окно, дальше - только после смещения больше порога.
    pub fn update(&mut self, viewer_world: Vec2) {
        let viewer = viewer_world / self.config.world_scale;
        if !viewer.x.is_finite() || !viewer.y.is_finite() {
            log::warn!("Ignoring non-finite viewer position {:?}", viewer_world);
            return;
        }
        self.viewer = viewer;

        let threshold_sq = self.config.move_threshold * self.config.move_threshold;
        let moved = match self.viewer_at_last_update {
            None => true,
            Some(last) => (last - self.viewer).mag_sq() > threshold_sq,
        };
        if moved {
            self.viewer_at_last_update = Some(self.viewer);
            self.update_visible_chunks();
        }
    }

    /// Выполнить колбэки завершённых задач. Возвращает их число.
    pub fn process_completed(&mut self) -> usize {
        let scheduler = self.scheduler.clone();
        scheduler.drain(self)
    }

    fn update_visible_chunks(&mut self) {
        self.window_updates += 1;

        let previously_visible = std::mem::take(&mut self.visible_last_update);
        for coord in &previously_visible {
            if let Some(chunk) = self.chunks.get_mut(coord) {
                chunk.visible = false;
            }
        }

        let current = ChunkCoord::containing(self.viewer, CHUNK_SIZE);
        let radius = self.chunks_visible_radius;
        let mut touched = HashSet::with_capacity(((2 * radius + 1) * (2 * radius + 1)) as usize);
        let mut created = 0;

        for dz in -radius..=radius {
            for dx in -radius..=radius {
                let coord = current.offset(dx, dz);
                touched.insert(coord);

                let needs_data = match self.chunks.get(&coord) {
                    Some(chunk) => chunk.data == HeightDataState::Uninitialized,
                    None => {
                        let chunk = TerrainChunk::new(coord, CHUNK_SIZE, self.lod_levels.len());
                        self.chunks.insert(coord, chunk);
                        created += 1;
                        true
                    }
                };

                if needs_data {
                    self.request_data(coord);
                } else {
                    self.refresh_chunk(coord, previously_visible.contains(&coord));
                }
            }
        }

        // Чанки, выпавшие из окна, остаются в реестре скрытыми
        for coord in previously_visible.difference(&touched) {
            self.events.push(ChunkEvent::VisibilityChanged { coord: *coord, visible: false });
        }

        log::debug!(
            "Visible window around {:?}: {} created, {} visible, {} total",
            current,
            created,
            self.visible_last_update.len(),
            self.chunks.len()
        );
    }

    /// Обновить один чанк; `was_visible` - видимость, о которой знает рендерер
    fn refresh_chunk(&mut self, coord: ChunkCoord, was_visible: bool) {
        let Some(chunk) = self.chunks.get_mut(&coord) else {
            return;
        };
        let outcome = chunk.refresh(self.viewer, &self.lod_levels);

        if chunk.visible {
            self.visible_last_update.insert(coord);
        } else {
            self.visible_last_update.remove(&coord);
        }
        if chunk.visible != was_visible {
            self.events.push(ChunkEvent::VisibilityChanged { coord, visible: chunk.visible });
        }
        if let Some((lod_index, mesh)) = outcome.mesh_changed {
            self.events.push(ChunkEvent::MeshChanged { coord, lod_index, mesh });
        }
        if let Some(lod_index) = outcome.request_mesh {
            self.request_mesh(coord, lod_index);
        }
    }

    fn request_data(&mut self, coord: ChunkCoord) {
        let Some(chunk) = self.chunks.get_mut(&coord) else {
            return;
        };
        chunk.data = HeightDataState::Awaiting;

        let generator = Arc::clone(&self.generator);
        let center = chunk.position();
        self.scheduler.submit_or_else(
            format!("map data {},{}", coord.x, coord.z),
            move || {
                let data = generator.generate_map_data([center.x, center.y]);
                let texture = data.color_map.to_texture();
                (data, texture)
            },
            move |streamer: &mut TerrainStreamer, (data, texture)| streamer.on_chunk_data(coord, data, texture),
            move |streamer: &mut TerrainStreamer, error| streamer.on_chunk_data_failed(coord, error),
        );
    }

    fn request_mesh(&mut self, coord: ChunkCoord, lod_index: usize) {
        let Some(chunk) = self.chunks.get(&coord) else {
            return;
        };
        let (Some(data), Some(level)) = (chunk.data(), self.lod_levels.get(lod_index)) else {
            return;
        };

        let height_map = Arc::clone(&data.height_map);
        let curve = self.config.height_curve.clone();
        let vertical_scale = self.config.vertical_scale;
        let lod = level.lod;
        self.scheduler.submit_or_else(
            format!("mesh {},{} lod {}", coord.x, coord.z, lod),
            move || Arc::new(build_terrain_mesh(&height_map, vertical_scale, &curve, lod)),
            move |streamer: &mut TerrainStreamer, mesh| streamer.on_mesh_ready(coord, lod_index, mesh),
            move |streamer: &mut TerrainStreamer, error| streamer.on_mesh_failed(coord, lod_index, error),
        );
    }

    fn on_chunk_data(&mut self, coord: ChunkCoord, data: ChunkData, texture: TextureData) {
        let Some(chunk) = self.chunks.get_mut(&coord) else {
            return;
        };
        if chunk.has_data() {
            log::warn!("Chunk {:?} already has map data, ignoring duplicate", coord);
            return;
        }
        chunk.data = HeightDataState::Ready(data);
        let was_visible = chunk.visible;

        self.events.push(ChunkEvent::TextureReady { coord, texture: Arc::new(texture) });
        self.refresh_chunk(coord, was_visible);
    }

    fn on_chunk_data_failed(&mut self, coord: ChunkCoord, error: JobError) {
        log::warn!("Map data for {:?} failed ({}), will retry on next window update", coord, error.message);
        if let Some(chunk) = self.chunks.get_mut(&coord) {
            chunk.data = HeightDataState::Uninitialized;
        }
    }

    fn on_mesh_ready(&mut self, coord: ChunkCoord, lod_index: usize, mesh: Arc<TerrainMesh>) {
        let Some(chunk) = self.chunks.get_mut(&coord) else {
            return;
        };
        let Some(slot) = chunk.meshes.get_mut(lod_index) else {
            return;
        };
        *slot = LodMeshState::Cached(mesh);
        let was_visible = chunk.visible;
        self.refresh_chunk(coord, was_visible);
    }

    fn on_mesh_failed(&mut self, coord: ChunkCoord, lod_index: usize, error: JobError) {
        log::warn!("Mesh lod {} for {:?} failed ({})", lod_index, coord, error.message);
        if let Some(slot) = self.chunks.get_mut(&coord).and_then(|c| c.meshes.get_mut(lod_index)) {
            *slot = LodMeshState::NotRequested;
        }
    }

    /// Забрать накопленные изменения для рендерера
    pub fn take_events(&mut self) -> Vec<ChunkEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn chunk(&self, coord: ChunkCoord) -> Option<&TerrainChunk> {
        self.chunks.get(&coord)
    }

    pub fn chunks(&self) -> impl Iterator<Item = &TerrainChunk> {
        self.chunks.values()
    }

    pub fn visible_chunks(&self) -> impl Iterator<Item = &TerrainChunk> {
        self.visible_last_update.iter().filter_map(|c| self.chunks.get(c))
    }

    pub fn viewer_position(&self) -> Vec2 {
        self.viewer
    }

    pub fn viewer_chunk(&self) -> ChunkCoord {
        ChunkCoord::containing(self.viewer, CHUNK_SIZE)
    }

    pub fn chunks_visible_radius(&self) -> i32 {
        self.chunks_visible_radius
    }

    pub fn config(&self) -> &TerrainConfig {
        &self.config
    }

    pub fn lod_levels(&self) -> &LodLevels {
        &self.lod_levels
    }

    pub fn stats(&self) -> StreamerStats {
        StreamerStats {
            chunks: self.chunks.len(),
            visible: self.visible_last_update.len(),
            jobs_in_flight: self.scheduler.in_flight(),
            jobs_failed: self.scheduler.failed(),
            window_updates: self.window_updates,
        }
    }

    /// Дождаться завершения фоновых задач (без применения результатов)
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        self.scheduler.wait_idle(timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::lod::LodInfo;

    const TIMEOUT: Duration = Duration::from_secs(60);

    /// Радиус окна 1 -> 9 чанков
    fn test_config() -> TerrainConfig {
        let mut config = TerrainConfig::default();
        config.noise.seed = 3;
        config.noise.octaves = 2;
        config.lod_levels = vec![LodInfo::new(0, 100.0), LodInfo::new(4, 240.0)];
        config.worker_threads = 4;
        config
    }

    fn settle(streamer: &mut TerrainStreamer) {
        for _ in 0..4 {
            assert!(streamer.wait_idle(TIMEOUT));
            streamer.process_completed();
        }
    }

    #[test]
    fn test_first_update_creates_window() {
        let mut streamer = TerrainStreamer::new(test_config()).unwrap();
        assert_eq!(streamer.chunks_visible_radius(), 1);
        streamer.update(Vec2::zero());

        let stats = streamer.stats();
        assert_eq!(stats.chunks, 9);
        assert_eq!(stats.visible, 0);
        assert_eq!(stats.window_updates, 1);
        assert!(streamer.chunks().all(|c| !c.has_data()));
        assert!(streamer.chunk(ChunkCoord::new(-1, 1)).is_some());
    }

    #[test]
    fn test_small_move_is_ignored() {
        let mut streamer = TerrainStreamer::new(test_config()).unwrap();
        streamer.update(Vec2::zero());
        // 400 / 20 = 20 единиц чанков < порога 25
        streamer.update(Vec2::new(400.0, 0.0));
        assert_eq!(streamer.stats().window_updates, 1);
        assert_eq!(streamer.stats().chunks, 9);
        assert_eq!(streamer.viewer_position(), Vec2::new(20.0, 0.0));
    }

    #[test]
    fn test_large_move_extends_window() {
        let mut streamer = TerrainStreamer::new(test_config()).unwrap();
        streamer.update(Vec2::zero());
        // 240 единиц чанков -> соседний чанк
        streamer.update(Vec2::new(240.0 * 20.0, 0.0));
        assert_eq!(streamer.stats().window_updates, 2);
        assert_eq!(streamer.viewer_chunk(), ChunkCoord::new(1, 0));
        assert_eq!(streamer.stats().chunks, 12);
        assert!(streamer.chunk(ChunkCoord::new(2, 0)).is_some());
    }

    #[test]
    fn test_data_and_meshes_arrive() {
        let mut streamer = TerrainStreamer::new(test_config()).unwrap();
        streamer.update(Vec2::zero());
        settle(&mut streamer);

        assert!(streamer.chunks().all(|c| c.has_data()));
        let center = streamer.chunk(ChunkCoord::new(0, 0)).unwrap();
        assert!(center.is_visible());
        assert_eq!(center.active_lod(), Some(0));
        assert_eq!(center.active_mesh().map(|m| m.vertex_count()), Some(241 * 241));

        // Соседние чанки: ближний край на 120 -> уровень 1 (lod 4)
        let side = streamer.chunk(ChunkCoord::new(1, 0)).unwrap();
        assert!(side.is_visible());
        assert_eq!(side.active_lod(), Some(1));
        assert_eq!(side.active_mesh().map(|m| m.vertices_per_line), Some(31));

        let events = streamer.take_events();
        let textures = events.iter().filter(|e| matches!(e, ChunkEvent::TextureReady { .. })).count();
        assert_eq!(textures, 9);
        assert!(events.iter().any(|e| matches!(
            e,
            ChunkEvent::MeshChanged { coord, lod_index: 0, .. } if *coord == ChunkCoord::new(0, 0)
        )));
        assert!(streamer.take_events().is_empty());
        assert_eq!(streamer.stats().visible, 9);
        assert_eq!(streamer.stats().jobs_failed, 0);
    }

    #[test]
    fn test_lod_swaps_when_viewer_moves() {
        let mut streamer = TerrainStreamer::new(test_config()).unwrap();
        streamer.update(Vec2::zero());
        settle(&mut streamer);
        assert_eq!(streamer.chunk(ChunkCoord::new(1, 0)).unwrap().active_lod(), Some(1));

        // Зритель в центре чанка (1, 0)
        streamer.update(Vec2::new(240.0 * 20.0, 0.0));
        settle(&mut streamer);
        let chunk = streamer.chunk(ChunkCoord::new(1, 0)).unwrap();
        assert_eq!(chunk.active_lod(), Some(0));
        assert!(matches!(chunk.mesh_state(1), Some(LodMeshState::Cached(_))));

        // Чанк (-1, 0) выпал из окна и скрыт, но остался в реестре
        let left = streamer.chunk(ChunkCoord::new(-1, 0)).unwrap();
        assert!(!left.is_visible());
        assert!(streamer
            .take_events()
            .iter()
            .any(|e| *e == ChunkEvent::VisibilityChanged { coord: ChunkCoord::new(-1, 0), visible: false }));
    }

    #[test]
    fn test_duplicate_data_is_ignored() {
        let mut streamer = TerrainStreamer::new(test_config()).unwrap();
        streamer.update(Vec2::zero());
        settle(&mut streamer);

        let coord = ChunkCoord::new(0, 0);
        let original = streamer.chunk(coord).unwrap().data().cloned().unwrap();
        let other = MapGenerator::with_size(&test_config(), 5).unwrap().generate_map_data([0.0, 0.0]);
        let texture = other.color_map.to_texture();
        streamer.on_chunk_data(coord, other, texture);
        assert_eq!(streamer.chunk(coord).unwrap().data(), Some(&original));
    }

    #[test]
    fn test_failed_jobs_are_retried() {
        let mut streamer = TerrainStreamer::new(test_config()).unwrap();
        streamer.update(Vec2::zero());
        settle(&mut streamer);

        let coord = ChunkCoord::new(1, 1);
        let error = JobError { label: "test".to_string(), message: "boom".to_string() };
        streamer.chunks.get_mut(&coord).unwrap().data = HeightDataState::Awaiting;
        streamer.on_chunk_data_failed(coord, error.clone());
        assert_eq!(streamer.chunk(coord).unwrap().data_state(), &HeightDataState::Uninitialized);

        streamer.update_visible_chunks();
        assert_eq!(streamer.chunk(coord).unwrap().data_state(), &HeightDataState::Awaiting);
        settle(&mut streamer);
        assert!(streamer.chunk(coord).unwrap().has_data());

        // Провал меша возвращает слот в NotRequested
        let center = ChunkCoord::new(0, 0);
        streamer.on_mesh_failed(center, 1, error);
        assert_eq!(streamer.chunk(center).unwrap().mesh_state(1), Some(&LodMeshState::NotRequested));
    }

    #[test]
    fn test_chunk_left_behind_still_caches_data() {
        let mut streamer = TerrainStreamer::new(test_config()).unwrap();
        streamer.update(Vec2::zero());
        // Зритель уходит на 10 чанков до прихода первых результатов
        streamer.update(Vec2::new(240.0 * 20.0 * 10.0, 0.0));
        assert_eq!(streamer.viewer_chunk(), ChunkCoord::new(10, 0));
        assert_eq!(streamer.stats().chunks, 18);
        settle(&mut streamer);
        streamer.take_events();

        let left = streamer.chunk(ChunkCoord::new(-1, 0)).unwrap();
        assert!(left.has_data());
        assert!(!left.is_visible());
        assert!(left.active_mesh().is_none());
        assert!(streamer.chunk(ChunkCoord::new(10, 0)).unwrap().is_visible());

        // Возврат сразу показывает закэшированные данные
        streamer.update(Vec2::zero());
        let left = streamer.chunk(ChunkCoord::new(-1, 0)).unwrap();
        assert!(left.is_visible());
        assert!(left.has_data());
        let events = streamer.take_events();
        assert!(events.contains(&ChunkEvent::VisibilityChanged { coord: ChunkCoord::new(-1, 0), visible: true }));
        assert!(!events.iter().any(|e| matches!(e, ChunkEvent::TextureReady { .. })));
        assert_eq!(events.iter().map(ChunkEvent::coord).filter(|c| c.x == 10).count(), 3);
    }

    #[test]
    fn test_non_finite_viewer_is_ignored() {
        let mut streamer = TerrainStreamer::new(test_config()).unwrap();
        streamer.update(Vec2::new(f32::NAN, 0.0));
        streamer.update(Vec2::new(0.0, f32::INFINITY));
        assert_eq!(streamer.stats().window_updates, 0);
        assert_eq!(streamer.stats().chunks, 0);

        streamer.update(Vec2::new(100.0, 0.0));
        assert_eq!(streamer.viewer_position(), Vec2::new(5.0, 0.0));
        assert_eq!(streamer.stats().chunks, 9);
    }
}
