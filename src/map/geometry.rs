use crate::braille::BrailleCanvas;
use crate::data::Shape;
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

/// Stroke a ring as connected line segments (the closing edge included)
pub fn stroke_ring(canvas: &mut BrailleCanvas, ring: &[DVec2]) {
    if ring.len() < 2 {
        return;
    }
    for pair in ring.windows(2) {
        draw_line(
            canvas,
            pair[0].x.round() as i32,
            pair[0].y.round() as i32,
            pair[1].x.round() as i32,
            pair[1].y.round() as i32,
        );
    }
    let (first, last) = (ring[0], ring[ring.len() - 1]);
    draw_line(
        canvas,
        last.x.round() as i32,
        last.y.round() as i32,
        first.x.round() as i32,
        first.y.round() as i32,
    );
}

/// Scanline-fill one polygon (exterior ring plus holes) in pixel space.
/// Even-odd rule across all rings, so holes are left unfilled.
pub fn fill_polygon(canvas: &mut BrailleCanvas, rings: &[Vec<DVec2>]) {
    let mut min_y = f64::MAX;
    let mut max_y = f64::MIN;
    for ring in rings {
        for p in ring {
            min_y = min_y.min(p.y);
            max_y = max_y.max(p.y);
        }
    }
    if min_y > max_y {
        return;
    }

    let y_start = min_y.ceil().max(0.0) as i32;
    let y_end = max_y.floor().min(canvas.pixel_height() as f64 - 1.0) as i32;
    let mut crossings: Vec<f64> = Vec::new();

    for y in y_start..=y_end {
        let yf = y as f64;
        crossings.clear();

        for ring in rings {
            if ring.len() < 3 {
                continue;
            }
            for i in 0..ring.len() {
                let a = ring[i];
                let b = ring[(i + 1) % ring.len()];
                // Half-open edge rule: horizontal edges contribute nothing,
                // shared vertices count once
                if (a.y <= yf) != (b.y <= yf) {
                    let t = (yf - a.y) / (b.y - a.y);
                    crossings.push(a.x + t * (b.x - a.x));
                }
            }
        }

        crossings.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        for pair in crossings.chunks_exact(2) {
            let x0 = pair[0].ceil() as i32;
            let x1 = pair[1].floor() as i32;
            if x0 <= x1 {
                canvas.fill_span(y, x0, x1);
            }
        }
    }
}

/// Area-weighted centroid of a feature's polygons, for label anchoring.
/// Computed from exterior rings; degenerate rings fall back to a vertex mean.
pub fn centroid_of(polygons: &[Vec<Vec<DVec2>>]) -> Option<DVec2> {
    let mut weighted = DVec2::ZERO;
    let mut total_area = 0.0;

    for rings in polygons {
        let Some(exterior) = rings.first() else {
            continue;
        };
        if let Some((c, area)) = ring_centroid(exterior) {
            weighted += c * area;
            total_area += area;
        }
    }

    if total_area > 0.0 {
        return Some(weighted / total_area);
    }

    // Degenerate geometry: mean of all exterior vertices
    let mut sum = DVec2::ZERO;
    let mut count = 0usize;
    for rings in polygons {
        if let Some(exterior) = rings.first() {
            for p in exterior {
                sum += *p;
                count += 1;
            }
        }
    }
    (count > 0).then(|| sum / count as f64)
}

/// Shoelace centroid of a single ring, with its absolute area as weight
fn ring_centroid(ring: &[DVec2]) -> Option<(DVec2, f64)> {
    if ring.len() < 3 {
        return None;
    }
    let mut area2 = 0.0;
    let mut cx = 0.0;
    let mut cy = 0.0;
    for i in 0..ring.len() {
        let a = ring[i];
        let b = ring[(i + 1) % ring.len()];
        let cross = a.x * b.y - b.x * a.y;
        area2 += cross;
        cx += (a.x + b.x) * cross;
        cy += (a.y + b.y) * cross;
    }
    if area2.abs() < f64::EPSILON {
        return None;
    }
    let centroid = DVec2::new(cx / (3.0 * area2), cy / (3.0 * area2));
    Some((centroid, area2.abs() * 0.5))
}

/// Even-odd point-in-shape test in geographic coordinates
pub fn shape_contains(shape: &Shape, lon: f64, lat: f64) -> bool {
    let mut inside = false;
    shape.for_each_polygon(|rings| {
        for ring in rings {
            if ring.len() < 3 {
                continue;
            }
            for i in 0..ring.len() {
                let (ax, ay) = ring[i];
                let (bx, by) = ring[(i + 1) % ring.len()];
                if (ay > lat) != (by > lat) {
                    let t = (lat - ay) / (by - ay);
                    if ax + t * (bx - ax) > lon {
                        inside = !inside;
                    }
                }
            }
        }
    });
    inside
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring(points: &[(f64, f64)]) -> Vec<DVec2> {
        points.iter().map(|&(x, y)| DVec2::new(x, y)).collect()
    }

    #[test]
    fn test_horizontal_line() {
        let mut canvas = BrailleCanvas::new(5, 1);
        draw_line(&mut canvas, 0, 0, 9, 0);
        let s = canvas.to_string();
        assert!(s.contains('⠉'));
    }

    #[test]
    fn test_fill_square() {
        let mut canvas = BrailleCanvas::new(2, 1);
        // The half-open edge rule fills pixel rows 0..=3 of a [0,4) square
        fill_polygon(
            &mut canvas,
            &[ring(&[(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 4.0)])],
        );
        assert_eq!(canvas.to_string(), "⣿⣿");
    }

    #[test]
    fn test_fill_respects_hole() {
        let exterior = ring(&[(0.0, 0.0), (7.0, 0.0), (7.0, 7.0), (0.0, 7.0)]);
        let hole = ring(&[(2.0, 2.0), (5.0, 2.0), (5.0, 5.0), (2.0, 5.0)]);

        let mut with_hole = BrailleCanvas::new(4, 2);
        fill_polygon(&mut with_hole, &[exterior.clone(), hole]);

        let mut solid = BrailleCanvas::new(4, 2);
        fill_polygon(&mut solid, &[exterior]);

        // Even-odd rule leaves the hole interior unfilled
        assert_ne!(with_hole.to_string(), solid.to_string());
    }

    #[test]
    fn test_centroid_of_square() {
        let polys = vec![vec![ring(&[(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 4.0)])]];
        let c = centroid_of(&polys).unwrap();
        assert!((c.x - 2.0).abs() < 1e-9);
        assert!((c.y - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_shape_contains() {
        let shape = Shape::Polygon(vec![vec![
            (126.0, 36.0),
            (128.0, 36.0),
            (128.0, 38.0),
            (126.0, 38.0),
            (126.0, 36.0),
        ]]);
        assert!(shape_contains(&shape, 127.0, 37.0));
        assert!(!shape_contains(&shape, 125.0, 37.0));
        assert!(!shape_contains(&shape, 127.0, 39.0));
    }
}
