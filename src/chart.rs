use crate::braille::LayeredCanvas;
use crate::dashboard::PieSlice;
use std::f64::consts::TAU;

/// Rasterize a pie chart onto a `width` x `height` character grid.
///
/// Slices start at twelve o'clock and run clockwise in the given order.
/// Braille pixels are roughly square, so the circle is computed in pixel
/// space.
pub fn rasterize_pie(slices: &[PieSlice], width: usize, height: usize) -> LayeredCanvas {
    let mut canvas = LayeredCanvas::new(width, height);
    let total: f64 = slices.iter().map(|s| s.share).sum();
    if total <= 0.0 || width == 0 || height == 0 {
        return canvas;
    }

    let (pw, ph) = (width * 2, height * 4);
    let radius = (pw.min(ph) as f64 / 2.0 - 0.5).max(0.5);
    let (cx, cy) = (pw as f64 / 2.0, ph as f64 / 2.0);

    // Cumulative end angle of each slice
    let mut acc = 0.0;
    let ends: Vec<f64> = slices
        .iter()
        .map(|s| {
            acc += s.share / total;
            acc * TAU
        })
        .collect();

    for py in 0..ph {
        for px in 0..pw {
            let dx = px as f64 + 0.5 - cx;
            let dy = py as f64 + 0.5 - cy;
            if dx * dx + dy * dy > radius * radius {
                continue;
            }
            let angle = dx.atan2(-dy).rem_euclid(TAU);
            let idx = ends.iter().position(|&end| angle < end).unwrap_or(slices.len() - 1);
            canvas.layer_mut(slices[idx].color).set_pixel(px, py);
        }
    }

    canvas
}
