// ============================================
// Falloff Map - Маска спада к краям (острова)
// ============================================

use super::height::HeightGrid;

/// Крутизна кривой спада
const FALLOFF_A: f32 = 3.0;
/// Сдвиг кривой спада (больше = шире суша)
const FALLOFF_B: f32 = 2.2;

/// Карта спада size x size: 0 в центре, ~1 у краёв.
/// Зависит только от размера, считается один раз и переиспользуется.
pub fn generate_falloff_map(size: usize) -> HeightGrid {
    HeightGrid::from_fn(size, size, |x, y| {
        let fx = x as f32 / size as f32 * 2.0 - 1.0;
        let fy = y as f32 / size as f32 * 2.0 - 1.0;
        evaluate(fx.abs().max(fy.abs()))
    })
}

#[inline]
fn evaluate(value: f32) -> f32 {
    let a = value.powf(FALLOFF_A);
    let b = (FALLOFF_B - FALLOFF_B * value).powf(FALLOFF_A);
    a / (a + b)
}

/// Вычесть маску и зажать снизу нулём
pub fn apply_falloff(heights: &mut HeightGrid, falloff: &HeightGrid) {
    debug_assert_eq!(heights.width(), falloff.width());
    debug_assert_eq!(heights.height(), falloff.height());
    for (h, f) in heights.values_mut().iter_mut().zip(falloff.values()) {
        *h = (*h - f).max(0.0);
    }
}
