// ============================================
// Chunk Coord - Идентификатор чанка
// ============================================

use ultraviolet::Vec2;

/// Целочисленная координата чанка в бесконечной сетке.
/// Используется как ключ реестра, поэтому только точное целочисленное равенство.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct ChunkCoord {
    pub x: i32,
    pub z: i32,
}

impl ChunkCoord {
    pub fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Чанк, ближайший к точке (в пространстве чанков)
    pub fn containing(point: Vec2, chunk_size: f32) -> Self {
        Self {
            x: (point.x / chunk_size).round() as i32,
            z: (point.y / chunk_size).round() as i32,
        }
    }

    /// Центр чанка в пространстве чанков
    pub fn center(&self, chunk_size: f32) -> Vec2 {
        Vec2::new(self.x as f32 * chunk_size, self.z as f32 * chunk_size)
    }

    /// Сдвиг с насыщением на краях диапазона i32
    pub fn offset(&self, dx: i32, dz: i32) -> Self {
        Self { x: self.x.saturating_add(dx), z: self.z.saturating_add(dz) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_containing_rounds_to_nearest_chunk() {
        assert_eq!(ChunkCoord::containing(Vec2::new(0.0, 0.0), 240.0), ChunkCoord::new(0, 0));
        assert_eq!(ChunkCoord::containing(Vec2::new(119.0, -119.0), 240.0), ChunkCoord::new(0, 0));
        assert_eq!(ChunkCoord::containing(Vec2::new(121.0, -121.0), 240.0), ChunkCoord::new(1, -1));
        assert_eq!(ChunkCoord::containing(Vec2::new(-500.0, 720.0), 240.0), ChunkCoord::new(-2, 3));
    }

    #[test]
    fn test_center_and_offset() {
        let coord = ChunkCoord::new(2, -1).offset(-1, 3);
        assert_eq!(coord, ChunkCoord::new(1, 2));
        let center = coord.center(240.0);
        assert_eq!(center.x, 240.0);
        assert_eq!(center.y, 480.0);
    }

    #[test]
    fn test_extreme_coordinates_saturate() {
        let far = ChunkCoord::containing(Vec2::new(f32::MAX, -f32::MAX), 240.0);
        assert_eq!(far, ChunkCoord::new(i32::MAX, i32::MIN));
        assert_eq!(far.offset(3, -3), far);
        assert_eq!(far.offset(-1, 1), ChunkCoord::new(i32::MAX - 1, i32::MIN + 1));
    }

    #[test]
    fn test_registry_key_is_exact() {
        let mut registry = HashMap::new();
        registry.insert(ChunkCoord::new(3, 4), "a");
        registry.insert(ChunkCoord::new(3, 4), "b");
        registry.insert(ChunkCoord::new(4, 3), "c");
        assert_eq!(registry.len(), 2);
        assert_eq!(registry[&ChunkCoord::new(3, 4)], "b");
    }
}
