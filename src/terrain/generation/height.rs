// ============================================
// Grids - Карты высот и цветов
// ============================================

use super::color::Rgba;

/// Плоская 2D сетка (row-major: индекс = y * width + x)
#[derive(Debug, Clone, PartialEq)]
pub struct Grid<T> {
    width: usize,
    height: usize,
    data: Vec<T>,
}

/// Нормализованные высоты [0, 1]
pub type HeightGrid = Grid<f32>;

/// Цвета, параллельные карте высот
pub type ColorGrid = Grid<Rgba>;

impl<T: Copy> Grid<T> {
    pub fn filled(width: usize, height: usize, value: T) -> Self {
        Self { width, height, data: vec![value; width * height] }
    }

    /// Построить сетку из функции (x, y) -> значение
    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> T) -> Self {
        let mut data = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        Self { width, height, data }
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> T {
        self.data[y * self.width + x]
    }

    /// Преобразовать каждое значение
    pub fn map<U: Copy>(&self, f: impl Fn(T) -> U) -> Grid<U> {
        Grid {
            width: self.width,
            height: self.height,
            data: self.data.iter().map(|&v| f(v)).collect(),
        }
    }
}

impl<T> Grid<T> {
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn values(&self) -> &[T] {
        &self.data
    }

    pub(crate) fn values_mut(&mut self) -> &mut [T] {
        &mut self.data
    }
}

impl HeightGrid {
    /// Минимум и максимум по сетке
    pub fn min_max(&self) -> (f32, f32) {
        self.data.iter().fold((f32::MAX, f32::MIN), |(lo, hi), &v| (lo.min(v), hi.max(v)))
    }

    /// Текстура в оттенках серого (чёрный = 0, белый = 1)
    pub fn to_texture(&self) -> TextureData {
        TextureData {
            width: self.width,
            height: self.height,
            pixels: self.data.iter().map(|&h| Rgba::gray(h).to_rgba8()).collect(),
        }
    }
}

impl ColorGrid {
    /// Данные для внешнего построителя текстур
    pub fn to_texture(&self) -> TextureData {
        TextureData {
            width: self.width,
            height: self.height,
            pixels: self.data.iter().map(|c| c.to_rgba8()).collect(),
        }
    }
}

/// RGBA8 пиксели + размеры. Сама текстура строится снаружи.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureData {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<[u8; 4]>,
}

impl TextureData {
    /// Пиксели одним байтовым срезом
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }
}
