// ============================================
// Height Curve - Кривая отклика высоты
// ============================================
// Ключевые точки (time, value), зажатие за пределами ключей.
// Вычисление идёт через CurveEvaluator: у него свой кэш сегмента,
// поэтому каждая сборка меша создаёт собственный экземпляр.

use serde::{Deserialize, Serialize};

use crate::terrain::config::ConfigError;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CurveKey {
    pub time: f32,
    pub value: f32,
}

impl CurveKey {
    pub fn new(time: f32, value: f32) -> Self {
        Self { time, value }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CurveInterpolation {
    #[default]
    Linear,
    /// Smoothstep внутри сегмента (монотонность сохраняется)
    Smooth,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeightCurve {
    pub keys: Vec<CurveKey>,
    pub interpolation: CurveInterpolation,
}

impl Default for HeightCurve {
    fn default() -> Self {
        Self::linear()
    }
}

impl HeightCurve {
    /// Тождественная кривая 0 -> 0, 1 -> 1
    pub fn linear() -> Self {
        Self::from_keys(vec![CurveKey::new(0.0, 0.0), CurveKey::new(1.0, 1.0)])
    }

    pub fn from_keys(keys: Vec<CurveKey>) -> Self {
        Self { keys, interpolation: CurveInterpolation::Linear }
    }

    pub fn with_interpolation(mut self, interpolation: CurveInterpolation) -> Self {
        self.interpolation = interpolation;
        self
    }

    /// Ключи непустые и отсортированы по времени
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.keys.is_empty() {
            return Err(ConfigError::EmptyHeightCurve);
        }
        for (index, key) in self.keys.iter().enumerate() {
            if !key.time.is_finite() || !key.value.is_finite() {
                return Err(ConfigError::HeightCurveNotSorted { index });
            }
            if index > 0 && key.time < self.keys[index - 1].time {
                return Err(ConfigError::HeightCurveNotSorted { index });
            }
        }
        Ok(())
    }

    pub fn evaluator(&self) -> CurveEvaluator<'_> {
        CurveEvaluator {
            keys: &self.keys,
            interpolation: self.interpolation,
            segment: 0,
        }
    }

    /// Разовое вычисление (без кэша сегмента)
    pub fn evaluate(&self, t: f32) -> f32 {
        self.evaluator().evaluate(t)
    }
}

/// Вычислитель кривой с кэшем последнего сегмента.
/// Не разделяется между потоками: `evaluate` требует `&mut self`.
pub struct CurveEvaluator<'a> {
    keys: &'a [CurveKey],
    interpolation: CurveInterpolation,
    segment: usize,
}

impl CurveEvaluator<'_> {
    pub fn evaluate(&mut self, t: f32) -> f32 {
        let (first, last_key) = match (self.keys.first(), self.keys.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return t,
        };
        if self.keys.len() == 1 || t <= first.time {
            return first.value;
        }
        if t >= last_key.time {
            return last_key.value;
        }

        let last = self.keys.len() - 1;
        let mut i = self.segment.min(last - 1);
        while i > 0 && t < self.keys[i].time {
            i -= 1;
        }
        while i + 1 < last && t >= self.keys[i + 1].time {
            i += 1;
        }
        self.segment = i;

        let a = self.keys[i];
        let b = self.keys[i + 1];
        let dt = b.time - a.time;
        let u = if dt > 0.0 { ((t - a.time) / dt).clamp(0.0, 1.0) } else { 1.0 };
        let u = match self.interpolation {
            CurveInterpolation::Linear => u,
            CurveInterpolation::Smooth => u * u * (3.0 - 2.0 * u),
        };
        a.value + (b.value - a.value) * u
    }
}
