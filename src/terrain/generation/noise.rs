// ============================================
// Noise Functions - Шумовые функции для генерации
// ============================================
// Фрактальный value noise: детерминированная функция от
// (seed, координаты, параметры). PRNG используется только для смещений октав.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use super::height::HeightGrid;

/// Минимальный масштаб шума (scale <= 0 зажимается сюда)
pub const MIN_NOISE_SCALE: f32 = 0.0001;

/// Диапазон случайных смещений октав
const OCTAVE_OFFSET_RANGE: i32 = 100_000;

/// Режим нормализации суммы октав в [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalizeMode {
    /// По наблюдаемым min/max чанка (возможны швы между чанками)
    Local,
    /// По теоретической максимальной амплитуде (без швов)
    #[default]
    Global,
}

/// Параметры шума
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseSettings {
    pub seed: i32,
    pub scale: f32,
    pub octaves: u32,
    pub persistence: f32,
    pub lacunarity: f32,
    pub offset: [f32; 2],
    pub normalize_mode: NormalizeMode,
}

impl Default for NoiseSettings {
    fn default() -> Self {
        Self {
            seed: 0,
            scale: 25.0,
            octaves: 4,
            persistence: 0.5,
            lacunarity: 2.0,
            offset: [0.0, 0.0],
            normalize_mode: NormalizeMode::Global,
        }
    }
}

/// Hash2D возвращает значение в диапазоне 0.0..1.0
#[inline(always)]
pub fn hash2d(x: i32, y: i32) -> f64 {
    let n = x.wrapping_mul(374761393).wrapping_add(y.wrapping_mul(668265263));
    let n = (n ^ (n >> 13)).wrapping_mul(1274126177);
    let n = n ^ (n >> 16);
    ((n as u32) as f64) / (u32::MAX as f64)
}

#[inline(always)]
fn smoothstep(t: f64) -> f64 {
    t * t * (3.0 - 2.0 * t)
}

/// 2D Value Noise, результат 0.0..1.0
#[inline]
pub fn noise2d(x: f64, y: f64) -> f64 {
    let x0 = x.floor();
    let y0 = y.floor();
    let xi = x0 as i32;
    let yi = y0 as i32;
    let xf = smoothstep(x - x0);
    let yf = smoothstep(y - y0);

    let n00 = hash2d(xi, yi);
    let n10 = hash2d(xi.wrapping_add(1), yi);
    let n01 = hash2d(xi, yi.wrapping_add(1));
    let n11 = hash2d(xi.wrapping_add(1), yi.wrapping_add(1));

    let nx0 = n00 + xf * (n10 - n00);
    let nx1 = n01 + xf * (n11 - n01);

    nx0 + yf * (nx1 - nx0)
}

/// Смещения октав из seed. Порядок выборки фиксирован: (x, y) для каждой октавы.
fn octave_offsets(seed: i32, octaves: u32, offset: [f32; 2]) -> Vec<[f64; 2]> {
    let mut prng = ChaCha8Rng::seed_from_u64(seed as i64 as u64);
    (0..octaves)
        .map(|_| {
            let ox = prng.random_range(-OCTAVE_OFFSET_RANGE..OCTAVE_OFFSET_RANGE) as f64 - offset[0] as f64;
            let oy = prng.random_range(-OCTAVE_OFFSET_RANGE..OCTAVE_OFFSET_RANGE) as f64 - offset[1] as f64;
            [ox, oy]
        })
        .collect()
}

/// Сумма амплитуд всех октав (для Global нормализации)
fn max_possible_height(octaves: u32, persistence: f32) -> f64 {
    let mut amplitude = 1.0;
    let mut total = 0.0;
    for _ in 0..octaves {
        total += amplitude;
        amplitude *= persistence as f64;
    }
    total
}

/// Сгенерировать карту шума width x height.
///
/// `offset` - глобальное смещение (центр чанка + смещение из конфига).
/// Некорректные параметры зажимаются: scale <= 0, octaves < 1, lacunarity < 1.
pub fn generate_noise_map(width: usize, height: usize, settings: &NoiseSettings, offset: [f32; 2]) -> HeightGrid {
    let octaves = settings.octaves.max(1);
    let lacunarity = settings.lacunarity.max(1.0) as f64;
    let persistence = settings.persistence.clamp(0.0, 1.0);
    let scale = if settings.scale <= 0.0 || !settings.scale.is_finite() {
        MIN_NOISE_SCALE
    } else {
        settings.scale
    } as f64;

    let offsets = octave_offsets(settings.seed, octaves, offset);
    let max_height = max_possible_height(octaves, persistence);

    let half_width = width as f64 / 2.0;
    let half_height = height as f64 / 2.0;

    let mut local_min = f64::MAX;
    let mut local_max = f64::MIN;

    let mut raw = Vec::with_capacity(width * height);
    for y in 0..height {
        for x in 0..width {
            let mut amplitude = 1.0;
            let mut frequency = 1.0;
            let mut noise_height = 0.0;

            for octave in &offsets {
                let sample_x = (x as f64 - half_width + octave[0]) / scale * frequency;
                let sample_y = (y as f64 - half_height + octave[1]) / scale * frequency;
                // [0, 1] -> [-1, 1]
                let value = noise2d(sample_x, sample_y) * 2.0 - 1.0;
                noise_height += value * amplitude;

                amplitude *= persistence as f64;
                frequency *= lacunarity;
            }

            local_min = local_min.min(noise_height);
            local_max = local_max.max(noise_height);
            raw.push(noise_height);
        }
    }

    let mut grid = HeightGrid::filled(width, height, 0.0);
    for (cell, &value) in grid.values_mut().iter_mut().zip(&raw) {
        let normalized = match settings.normalize_mode {
            NormalizeMode::Local => inverse_lerp(local_min, local_max, value),
            NormalizeMode::Global => (value + 1.0) / max_height,
        };
        *cell = normalized.clamp(0.0, 1.0) as f32;
    }
    grid
}

#[inline]
fn inverse_lerp(a: f64, b: f64, v: f64) -> f64 {
    if (b - a).abs() < f64::EPSILON {
        0.0
    } else {
        (v - a) / (b - a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(mode: NormalizeMode) -> NoiseSettings {
        NoiseSettings { seed: 42, normalize_mode: mode, ..Default::default() }
    }

    #[test]
    fn test_noise2d_range_and_lattice() {
        for i in 0..1000 {
            let v = noise2d(i as f64 * 0.37 - 150.0, i as f64 * 0.11 + 3.0);
            assert!((0.0..=1.0).contains(&v));
        }
        // В узлах решётки шум совпадает с хэшем
        assert_eq!(noise2d(3.0, -7.0), hash2d(3, -7));
    }

    #[test]
    fn test_noise_map_is_deterministic() {
        for seed in [0, 1, -5, 123456] {
            let s = NoiseSettings { seed, ..Default::default() };
            let a = generate_noise_map(33, 33, &s, [12.0, -40.0]);
            let b = generate_noise_map(33, 33, &s, [12.0, -40.0]);
            let bits_a: Vec<u32> = a.values().iter().map(|v| v.to_bits()).collect();
            let bits_b: Vec<u32> = b.values().iter().map(|v| v.to_bits()).collect();
            assert_eq!(bits_a, bits_b);
        }
    }

    #[test]
    fn test_different_seeds_differ() {
        let a = generate_noise_map(16, 16, &NoiseSettings { seed: 1, ..Default::default() }, [0.0, 0.0]);
        let b = generate_noise_map(16, 16, &NoiseSettings { seed: 2, ..Default::default() }, [0.0, 0.0]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_local_normalization_spans_unit_range() {
        let grid = generate_noise_map(49, 49, &settings(NormalizeMode::Local), [0.0, 0.0]);
        let (lo, hi) = grid.min_max();
        assert_eq!(lo, 0.0);
        assert_eq!(hi, 1.0);
    }

    #[test]
    fn test_global_normalization_is_bounded() {
        for offset in [[0.0, 0.0], [240.0, 0.0], [-48000.0, 96000.0]] {
            let grid = generate_noise_map(41, 41, &settings(NormalizeMode::Global), offset);
            assert!(grid.values().iter().all(|&h| (0.0..=1.0).contains(&h)));
        }
    }

    #[test]
    fn test_invalid_parameters_are_clamped() {
        let s = NoiseSettings { scale: -3.0, octaves: 0, lacunarity: 0.2, ..Default::default() };
        let grid = generate_noise_map(9, 9, &s, [0.0, 0.0]);
        assert!(grid.values().iter().all(|h| h.is_finite() && (0.0..=1.0).contains(h)));
    }

    #[test]
    fn test_global_mode_is_seam_consistent() {
        // Соседние сэмплы в одной карте совпадают со сдвинутой картой:
        // сдвиг offset на 1 эквивалентен сдвигу индекса на 1
        let s = settings(NormalizeMode::Global);
        let a = generate_noise_map(8, 8, &s, [0.0, 0.0]);
        let b = generate_noise_map(8, 8, &s, [-1.0, 0.0]);
        for y in 0..8 {
            for x in 0..7 {
                assert!((a.get(x + 1, y) - b.get(x, y)).abs() < 1e-6);
            }
        }
    }
}
