//! Diagnostic triangle outline
//!
//! Draws the lattice's base triangle onto the edit frame so the user can see
//! where the mirrors sit before switching the filter on.

use super::frame::{YcFrame, YcPixel};
use super::lattice::LatticeParameters;
use std::f64::consts::FRAC_PI_3;

/// Corners of the base triangle: the origin, one unit along the rotated x
/// axis, and one unit along the axis 60 degrees further on.
pub fn triangle_vertices(params: &LatticeParameters) -> [(i32, i32); 3] {
    let (ox, oy) = params.origin();
    let size = f64::from(params.unit());
    let th = params.angle();

    let corner = |angle: f64| -> (i32, i32) {
        (
            (f64::from(ox) + size * angle.cos()).round() as i32,
            (f64::from(oy) + size * angle.sin()).round() as i32,
        )
    };

    [(ox, oy), corner(th), corner(th + FRAC_PI_3)]
}

/// Bresenham line, clipped to the frame first so far-off endpoints cost
/// nothing and cannot overflow the error terms
pub fn draw_line(frame: &mut YcFrame, x0: i32, y0: i32, x1: i32, y1: i32, color: YcPixel) {
    let Some((cx0, cy0, cx1, cy1)) = clip_line(frame.width(), frame.height(), x0, y0, x1, y1)
    else {
        return;
    };

    let dx = (cx1 - cx0).abs();
    let dy = -((cy1 - cy0).abs());
    let sx = if cx0 < cx1 { 1 } else { -1 };
    let sy = if cy0 < cy1 { 1 } else { -1 };
    let mut err = dx + dy;
    let mut x = cx0;
    let mut y = cy0;

    loop {
        frame.set(x as i32, y as i32, color);
        if x == cx1 && y == cy1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}

/// Cohen-Sutherland clipping against a `width` x `height` frame.
/// Returns the visible part of the segment, or `None` if nothing is visible.
fn clip_line(
    width: u32,
    height: u32,
    x0: i32,
    y0: i32,
    x1: i32,
    y1: i32,
) -> Option<(i64, i64, i64, i64)> {
    const INSIDE: u8 = 0;
    const LEFT: u8 = 1;
    const RIGHT: u8 = 2;
    const BOTTOM: u8 = 4;
    const TOP: u8 = 8;
    // converges in at most 4 rounds for valid input
    const MAX_ITERATIONS: u32 = 16;

    if width == 0 || height == 0 {
        return None;
    }
    let w = i64::from(width);
    let h = i64::from(height);

    let outcode = |x: i64, y: i64| -> u8 {
        let mut code = INSIDE;
        if x < 0 {
            code |= LEFT;
        } else if x >= w {
            code |= RIGHT;
        }
        if y < 0 {
            code |= TOP;
        } else if y >= h {
            code |= BOTTOM;
        }
        code
    };
    // intersection offset; the product can exceed 64 bits for extreme endpoints
    let along = |d: i64, num: i64, den: i64| -> i64 {
        (i128::from(d) * i128::from(num) / i128::from(den)) as i64
    };

    let (mut x0, mut y0) = (i64::from(x0), i64::from(y0));
    let (mut x1, mut y1) = (i64::from(x1), i64::from(y1));
    let mut code0 = outcode(x0, y0);
    let mut code1 = outcode(x1, y1);

    for _ in 0..MAX_ITERATIONS {
        if (code0 | code1) == 0 {
            return Some((x0, y0, x1, y1));
        }
        if (code0 & code1) != 0 {
            return None;
        }

        let code_out = if code0 != 0 { code0 } else { code1 };
        let dx = x1 - x0;
        let dy = y1 - y0;

        let (x, y) = if (code_out & BOTTOM) != 0 {
            if dy == 0 {
                return None;
            }
            (x0 + along(dx, h - 1 - y0, dy), h - 1)
        } else if (code_out & TOP) != 0 {
            if dy == 0 {
                return None;
            }
            (x0 + along(dx, -y0, dy), 0)
        } else if (code_out & RIGHT) != 0 {
            if dx == 0 {
                return None;
            }
            (w - 1, y0 + along(dy, w - 1 - x0, dx))
        } else {
            if dx == 0 {
                return None;
            }
            (0, y0 + along(dy, -x0, dx))
        };

        if code_out == code0 {
            (x0, y0) = (x, y);
            code0 = outcode(x0, y0);
        } else {
            (x1, y1) = (x, y);
            code1 = outcode(x1, y1);
        }
    }

    None
}

/// Outline the base triangle in `YcPixel::HIGHLIGHT`, in place
pub fn draw_triangle_outline(frame: &mut YcFrame, params: &LatticeParameters) {
    let [a, b, c] = triangle_vertices(params);
    for (p, q) in [(a, b), (b, c), (c, a)] {
        draw_line(frame, p.0, p.1, q.0, q.1, YcPixel::HIGHLIGHT);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const C: YcPixel = YcPixel::new(1500, 200, -300);

    fn uniform(width: u32, height: u32) -> YcFrame {
        let mut frame = YcFrame::with_size(width, height);
        frame.fill(C);
        frame
    }

    /// Distance from (px, py) to the segment a-b
    fn segment_distance(p: (i32, i32), a: (i32, i32), b: (i32, i32)) -> f64 {
        let (px, py) = (f64::from(p.0), f64::from(p.1));
        let (ax, ay) = (f64::from(a.0), f64::from(a.1));
        let (bx, by) = (f64::from(b.0), f64::from(b.1));
        let (vx, vy) = (bx - ax, by - ay);
        let len2 = vx * vx + vy * vy;
        let t = if len2 == 0.0 {
            0.0
        } else {
            (((px - ax) * vx + (py - ay) * vy) / len2).clamp(0.0, 1.0)
        };
        (px - (ax + t * vx)).hypot(py - (ay + t * vy))
    }

    #[test]
    fn test_vertices_at_zero_angle() {
        let params = LatticeParameters::from_tracks(50, 50, 40, 0).unwrap();
        assert_eq!(triangle_vertices(&params), [(50, 50), (90, 50), (70, 85)]);
    }

    #[test]
    fn test_outline_only_touches_edges() {
        let params = LatticeParameters::from_tracks(50, 50, 40, 0).unwrap();
        let mut frame = uniform(120, 120);
        draw_triangle_outline(&mut frame, &params);

        let corners = [(50, 50), (90, 50), (70, 85)];
        let edges = [
            (corners[0], corners[1]),
            (corners[1], corners[2]),
            (corners[2], corners[0]),
        ];

        let mut changed = 0;
        for y in 0..120 {
            for x in 0..120 {
                let p = frame.get(x, y).unwrap();
                if p == C {
                    continue;
                }
                changed += 1;
                assert_eq!(p, YcPixel::HIGHLIGHT);
                let near = edges
                    .iter()
                    .any(|&(a, b)| segment_distance((x, y), a, b) <= 1.0);
                assert!(near, "stray pixel at ({}, {})", x, y);
            }
        }

        for &(x, y) in &corners {
            assert_eq!(frame.get(x, y), Some(YcPixel::HIGHLIGHT));
        }
        for x in 50..=90 {
            assert_eq!(frame.get(x, 50), Some(YcPixel::HIGHLIGHT));
        }
        // 41 + 36 + 36 pixels at most, shared corners counted once
        assert!(changed <= 110, "{} pixels changed", changed);
    }

    #[test]
    fn test_lines_are_clipped_to_frame() {
        let mut frame = uniform(10, 10);
        draw_line(&mut frame, -20, 5, 30, 5, YcPixel::HIGHLIGHT);
        for x in 0..10 {
            assert_eq!(frame.get(x, 5), Some(YcPixel::HIGHLIGHT));
        }
        assert_eq!(frame.get(0, 4), Some(C));
    }

    #[test]
    fn test_far_off_endpoints_are_clipped() {
        let mut frame = uniform(10, 10);
        draw_line(&mut frame, -1000, -1000, 1000, 1000, YcPixel::HIGHLIGHT);
        for i in 0..10 {
            assert_eq!(frame.get(i, i), Some(YcPixel::HIGHLIGHT));
        }
        assert_eq!(frame.get(1, 0), Some(C));

        // entirely off to one side
        let mut frame = uniform(10, 10);
        draw_line(&mut frame, -50, -5, 50, -1, YcPixel::HIGHLIGHT);
        assert_eq!(frame, uniform(10, 10));
    }

    #[test]
    fn test_huge_triangle_does_not_overflow() {
        let params = LatticeParameters::new(0, 0, i32::MAX, std::f64::consts::PI).unwrap();
        let mut frame = uniform(8, 8);
        draw_triangle_outline(&mut frame, &params);
        assert_eq!(frame.get(0, 0), Some(YcPixel::HIGHLIGHT));

        draw_line(&mut frame, i32::MIN, i32::MIN, i32::MAX, i32::MAX, YcPixel::HIGHLIGHT);
        assert_eq!(frame.get(7, 7), Some(YcPixel::HIGHLIGHT));
    }

    #[test]
    fn test_rotated_outline_stays_connected() {
        let params = LatticeParameters::from_tracks(60, 60, 45, 375).unwrap();
        let mut frame = uniform(140, 140);
        draw_triangle_outline(&mut frame, &params);
        for (x, y) in triangle_vertices(&params) {
            assert_eq!(frame.get(x, y), Some(YcPixel::HIGHLIGHT));
        }
    }
}
