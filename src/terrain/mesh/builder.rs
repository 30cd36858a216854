// ============================================
// Mesh Builder - Меш terrain из карты высот
// ============================================
// Thread-safe: чистая функция, кривая вычисляется собственным CurveEvaluator.

use ultraviolet::Vec3;

use crate::terrain::generation::HeightGrid;
use crate::terrain::lod::decimation_step;

use super::curve::HeightCurve;
use super::vertex::TerrainVertex;

/// Индексированный меш одного уровня детализации. Не меняется после сборки.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TerrainMesh {
    pub lod: u32,
    pub vertices_per_line: usize,
    pub vertices: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub triangles: Vec<u32>,
}

impl TerrainMesh {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len() / 3
    }

    /// Нормали: сумма площадно-взвешенных нормалей граней, затем нормализация
    pub fn compute_normals(&self) -> Vec<[f32; 3]> {
        let mut normals = vec![Vec3::zero(); self.vertices.len()];
        let to_vec = |p: [f32; 3]| Vec3::new(p[0], p[1], p[2]);

        for tri in self.triangles.chunks_exact(3) {
            let (a, b, c) = (tri[0] as usize, tri[1] as usize, tri[2] as usize);
            let pa = to_vec(self.vertices[a]);
            let pb = to_vec(self.vertices[b]);
            let pc = to_vec(self.vertices[c]);
            // Длина векторного произведения = 2 * площадь
            let face = (pb - pa).cross(pc - pa);
            normals[a] += face;
            normals[b] += face;
            normals[c] += face;
        }

        normals
            .into_iter()
            .map(|n| {
                if n.mag_sq() > 0.0 {
                    let n = n.normalized();
                    [n.x, n.y, n.z]
                } else {
                    [0.0, 1.0, 0.0]
                }
            })
            .collect()
    }

    /// Вершины с нормалями для GPU буфера
    pub fn interleaved(&self) -> Vec<TerrainVertex> {
        let normals = self.compute_normals();
        self.vertices
            .iter()
            .zip(&self.uvs)
            .zip(normals)
            .map(|((&position, &uv), normal)| TerrainVertex::new(position, normal, uv))
            .collect()
    }

    pub fn vertex_bytes(&self) -> Vec<u8> {
        bytemuck::cast_slice(&self.interleaved()).to_vec()
    }

    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.triangles)
    }
}

/// Собрать меш.
///
/// `lod` 0 = полное разрешение, иначе шаг 2 * lod. Меш центрирован в начале координат,
/// y = curve(height) * vertical_scale.
pub fn build_terrain_mesh(height_map: &HeightGrid, vertical_scale: f32, curve: &HeightCurve, lod: u32) -> TerrainMesh {
    let mut evaluator = curve.evaluator();
    let width = height_map.width();
    let height = height_map.height();
    if width == 0 || height == 0 {
        return TerrainMesh { lod, ..Default::default() };
    }

    let step = decimation_step(lod);
    let per_line_x = (width - 1) / step + 1;
    let per_line_y = (height - 1) / step + 1;

    let half_x = (width - 1) as f32 / 2.0;
    let half_z = (height - 1) as f32 / 2.0;

    let mut vertices = Vec::with_capacity(per_line_x * per_line_y);
    let mut uvs = Vec::with_capacity(per_line_x * per_line_y);
    let mut triangles = Vec::with_capacity((per_line_x - 1) * (per_line_y - 1) * 6);

    for j in 0..per_line_y {
        let y = j * step;
        for i in 0..per_line_x {
            let x = i * step;
            let h = evaluator.evaluate(height_map.get(x, y)) * vertical_scale;
            vertices.push([half_x - x as f32, h, half_z - y as f32]);
            uvs.push([x as f32 / width as f32, y as f32 / height as f32]);

            if i + 1 < per_line_x && j + 1 < per_line_y {
                let v = (j * per_line_x + i) as u32;
                let line = per_line_x as u32;
                triangles.extend_from_slice(&[v, v + line, v + line + 1]);
                triangles.extend_from_slice(&[v + line + 1, v + 1, v]);
            }
        }
    }

    TerrainMesh {
        lod,
        vertices_per_line: per_line_x,
        vertices,
        uvs,
        triangles,
    }
}
