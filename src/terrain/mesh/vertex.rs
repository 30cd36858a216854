// ============================================
// Terrain Vertex - Структура вершины
// ============================================

/// Интерлейс-вершина для передачи внешнему рендереру
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable, Default)]
pub struct TerrainVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl TerrainVertex {
    pub fn new(position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> Self {
        Self { position, normal, uv }
    }

    /// Размер вершины в байтах (stride буфера)
    pub const STRIDE: usize = std::mem::size_of::<TerrainVertex>();
}
