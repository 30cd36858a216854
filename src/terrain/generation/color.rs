// ============================================
// Terrain Colors - Цвета по высоте
// ============================================
// Классификация высоты по упорядоченной таблице регионов:
// - Discrete: цвет самого высокого порога, не превышающего высоту
// - Gradient: интерполяция между соседними регионами

use serde::{Deserialize, Serialize};

use super::height::{ColorGrid, HeightGrid};

/// Цвет RGBA, компоненты 0.0..1.0
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "ColorValue", into = "[f32; 4]")]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    pub const TRANSPARENT: Rgba = Rgba { r: 0.0, g: 0.0, b: 0.0, a: 0.0 };

    pub fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self {
            r: r.clamp(0.0, 1.0),
            g: g.clamp(0.0, 1.0),
            b: b.clamp(0.0, 1.0),
            a: a.clamp(0.0, 1.0),
        }
    }

    pub fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self::new(r, g, b, 1.0)
    }

    pub fn gray(v: f32) -> Self {
        Self::rgb(v, v, v)
    }

    /// Линейная интерполяция, t зажимается в [0, 1]
    pub fn lerp(self, other: Rgba, t: f32) -> Rgba {
        let t = t.clamp(0.0, 1.0);
        Rgba {
            r: self.r + (other.r - self.r) * t,
            g: self.g + (other.g - self.g) * t,
            b: self.b + (other.b - self.b) * t,
            a: self.a + (other.a - self.a) * t,
        }
    }

    pub fn to_rgba8(self) -> [u8; 4] {
        let q = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        [q(self.r), q(self.g), q(self.b), q(self.a)]
    }
}

impl From<Rgba> for [f32; 4] {
    fn from(c: Rgba) -> Self {
        [c.r, c.g, c.b, c.a]
    }
}

/// Значение цвета в конфиге (гибкий формат)
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum ColorValue {
    /// [r, g, b, a]
    Rgba([f32; 4]),
    /// [r, g, b]
    Rgb([f32; 3]),
    /// "#RRGGBB" или "#RRGGBBAA"
    Hex(String),
}

impl From<ColorValue> for Rgba {
    fn from(value: ColorValue) -> Self {
        match value {
            ColorValue::Rgba([r, g, b, a]) => Rgba::new(r, g, b, a),
            ColorValue::Rgb([r, g, b]) => Rgba::rgb(r, g, b),
            ColorValue::Hex(s) => {
                let [r, g, b, a] = parse_hex_color(&s);
                Rgba::new(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0, a as f32 / 255.0)
            }
        }
    }
}

fn parse_hex_color(s: &str) -> [u8; 4] {
    let s = s.trim_start_matches('#');
    let channel = |range: std::ops::Range<usize>| {
        s.get(range).and_then(|c| u8::from_str_radix(c, 16).ok())
    };
    match s.len() {
        6 => match (channel(0..2), channel(2..4), channel(4..6)) {
            (Some(r), Some(g), Some(b)) => [r, g, b, 255],
            _ => [255, 0, 255, 255],
        },
        8 => match (channel(0..2), channel(2..4), channel(4..6), channel(6..8)) {
            (Some(r), Some(g), Some(b), Some(a)) => [r, g, b, a],
            _ => [255, 0, 255, 255],
        },
        _ => [255, 0, 255, 255], // Magenta = error
    }
}

/// Регион terrain: порог высоты + цвет
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerrainRegion {
    #[serde(default)]
    pub name: String,
    pub height: f32,
    pub color: Rgba,
}

impl TerrainRegion {
    pub fn new(name: &str, height: f32, color: Rgba) -> Self {
        Self { name: name.to_string(), height, color }
    }
}

/// Режим раскраски
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorMode {
    #[default]
    Discrete,
    Gradient,
}

/// Discrete: цвет последнего региона с порогом <= высоты.
/// Ниже первого порога используется первый регион.
pub fn discrete_color(regions: &[TerrainRegion], height: f32) -> Rgba {
    let mut color = match regions.first() {
        Some(region) => region.color,
        None => return Rgba::TRANSPARENT,
    };
    for region in regions {
        if height >= region.height {
            color = region.color;
        } else {
            break;
        }
    }
    color
}

/// Gradient: первый порог >= высоты, интерполяция от предыдущего региона.
/// Выше последнего порога используется последний регион.
pub fn gradient_color(regions: &[TerrainRegion], height: f32) -> Rgba {
    for (i, region) in regions.iter().enumerate() {
        if height <= region.height {
            if i == 0 {
                return region.color;
            }
            let prev = &regions[i - 1];
            let t = (height - prev.height) / (region.height - prev.height);
            return prev.color.lerp(region.color, t);
        }
    }
    regions.last().map_or(Rgba::TRANSPARENT, |r| r.color)
}

/// Построить карту цветов по карте высот
pub fn build_color_map(heights: &HeightGrid, regions: &[TerrainRegion], mode: ColorMode) -> ColorGrid {
    match mode {
        ColorMode::Discrete => heights.map(|h| discrete_color(regions, h)),
        ColorMode::Gradient => heights.map(|h| gradient_color(regions, h)),
    }
}
