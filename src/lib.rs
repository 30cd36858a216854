// ============================================
// Endless Terrain - Процедурный terrain вокруг зрителя
// ============================================
// Шум -> карта высот/цветов -> меш с LOD, генерация в фоновых потоках,
// применение результатов на одном потоке-потребителе.

pub mod terrain;

pub use terrain::{generate_preview, DrawMode, TerrainConfig, TerrainStreamer};
