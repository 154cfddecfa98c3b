use crate::braille::BrailleCanvas;
use glam::DVec2;

/// Draw a line using Bresenham's algorithm
pub fn draw_line(canvas: &mut BrailleCanvas, x0: i32, y0: i32, x1: i32, y1: i32) {
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    let mut x = x0;
    let mut y = y0;

    loop {
        canvas.set_pixel_signed(x, y);

        if x == x1 && y == y1 {
            break;
        }

        let e2 = 2 * err;

        if e2 >= dy {
            if x == x1 {
                break;
            }
            err += dy;
            x += sx;
        }

        if e2 <= dx {
            if y == y1 {
                break;
            }
            err += dx;
            y += sy;
        }
    }
}

/// Scanline fill of projected rings (pixel space) with the even-odd rule.
/// Pixel centers are sampled at `+0.5`; anything off-canvas is clipped.
pub fn fill_rings(canvas: &mut BrailleCanvas, rings: &[Vec<DVec2>]) {
    let (width, height) = canvas.pixel_size();
    if width == 0 || height == 0 {
        return;
    }

    let (min_y, max_y) = rings
        .iter()
        .flatten()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| (lo.min(p.y), hi.max(p.y)));
    if min_y > max_y {
        return;
    }
    let y_start = min_y.floor().max(0.0) as usize;
    let y_end = (max_y.ceil().max(0.0) as usize).min(height);

    let mut crossings: Vec<f64> = Vec::new();
    for py in y_start..y_end {
        let sample_y = py as f64 + 0.5;
        crossings.clear();

        for ring in rings {
            let n = ring.len();
            if n < 3 {
                continue;
            }
            let mut j = n - 1;
            for i in 0..n {
                let (a, b) = (ring[i], ring[j]);
                if (a.y > sample_y) != (b.y > sample_y) {
                    crossings.push(a.x + (sample_y - a.y) * (b.x - a.x) / (b.y - a.y));
                }
                j = i;
            }
        }

        crossings.sort_by(|a, b| a.total_cmp(b));
        for pair in crossings.chunks_exact(2) {
            let x_from = (pair[0] - 0.5).ceil().max(0.0);
            let x_to = (pair[1] - 0.5).floor().min(width as f64 - 1.0);
            if x_to < x_from {
                continue;
            }
            for px in x_from as usize..=x_to as usize {
                canvas.set_pixel(px, py);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(x0: f64, y0: f64, size: f64) -> Vec<DVec2> {
        vec![
            DVec2::new(x0, y0),
            DVec2::new(x0 + size, y0),
            DVec2::new(x0 + size, y0 + size),
            DVec2::new(x0, y0 + size),
            DVec2::new(x0, y0),
        ]
    }

    #[test]
    fn test_horizontal_line() {
        let mut canvas = BrailleCanvas::new(5, 1);
        draw_line(&mut canvas, 0, 0, 9, 0);
        assert_eq!(canvas.to_string(), "⠉⠉⠉⠉⠉");
    }

    #[test]
    fn test_vertical_line() {
        let mut canvas = BrailleCanvas::new(1, 2);
        draw_line(&mut canvas, 0, 0, 0, 7);
        assert_eq!(canvas.to_string(), "⡇\n⡇");
    }

    #[test]
    fn test_fill_covers_interior() {
        let mut canvas = BrailleCanvas::new(2, 1);
        fill_rings(&mut canvas, &[square(0.0, 0.0, 4.0)]);
        assert_eq!(canvas.to_string(), "⣿⣿");
    }

    #[test]
    fn test_fill_clips_offscreen() {
        let mut canvas = BrailleCanvas::new(1, 1);
        fill_rings(&mut canvas, &[square(-10.0, -10.0, 30.0)]);
        assert_eq!(canvas.to_string(), "⣿");
    }

    #[test]
    fn test_fill_even_odd_leaves_hole() {
        let mut canvas = BrailleCanvas::new(4, 2);
        fill_rings(&mut canvas, &[square(0.0, 0.0, 8.0), square(2.0, 2.0, 4.0)]);
        assert_eq!(canvas.to_string(), "⣿⠛⠛⣿\n⣿⣤⣤⣿");
    }

    #[test]
    fn test_fill_without_rings() {
        let mut canvas = BrailleCanvas::new(1, 1);
        fill_rings(&mut canvas, &[]);
        assert_eq!(canvas.glyphs().count(), 0);
    }
}
