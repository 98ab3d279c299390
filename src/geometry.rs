use std::f32::consts::PI;

use imageproc::point::Point;
use imageproc::rect::Rect;

pub fn distance_from_point_to_point(p1: &Point<f32>, p2: &Point<f32>) -> f32 {
    ((p1.x - p2.x).powf(2.0) + (p1.y - p2.y).powf(2.0)).sqrt()
}

/// Computes the axis-aligned bounding rect of a contour chain.
pub fn bounding_rect(points: &[Point<i32>]) -> Rect {
    let mut min_x = i32::MAX;
    let mut min_y = i32::MAX;
    let mut max_x = i32::MIN;
    let mut max_y = i32::MIN;
    for p in points {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    Rect::at(min_x, min_y).of_size((max_x - min_x + 1) as u32, (max_y - min_y + 1) as u32)
}

/// Computes the enclosed area of a closed polygon via the shoelace formula.
pub fn polygon_area(points: &[Point<i32>]) -> f32 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut sum = 0.0_f64;
    for (i, p) in points.iter().enumerate() {
        let q = &points[(i + 1) % points.len()];
        sum += f64::from(p.x) * f64::from(q.y) - f64::from(q.x) * f64::from(p.y);
    }
    (sum / 2.0).abs() as f32
}

/// Computes the perimeter of a closed polygon as the sum of its segment lengths.
pub fn polygon_perimeter(points: &[Point<i32>]) -> f32 {
    if points.len() < 2 {
        return 0.0;
    }
    let mut sum = 0.0_f64;
    for (i, p) in points.iter().enumerate() {
        let q = &points[(i + 1) % points.len()];
        let dx = f64::from(p.x - q.x);
        let dy = f64::from(p.y - q.y);
        sum += (dx * dx + dy * dy).sqrt();
    }
    sum as f32
}

/// Roundness metric for a closed shape: 1.0 for a perfect circle, π/4 for a
/// square, lower for elongated or ragged shapes.
pub fn roundness(area: f32, perimeter: f32) -> f32 {
    if perimeter <= 0.0 {
        return 0.0;
    }
    4.0 * PI * area / (perimeter * perimeter)
}

/// Orders the corners of a quadrilateral into top-left, top-right,
/// bottom-right, bottom-left. The top-left corner has the smallest coordinate
/// sum, the bottom-right the largest; the top-right has the smallest y - x
/// difference, the bottom-left the largest.
pub fn order_corners(quad: &[Point<f32>; 4]) -> [Point<f32>; 4] {
    let mut by_sum = *quad;
    by_sum.sort_by(|a, b| {
        (a.x + a.y)
            .partial_cmp(&(b.x + b.y))
            .expect("corner coordinates to be finite")
    });
    let top_left = by_sum[0];
    let bottom_right = by_sum[3];

    let mut by_diff = *quad;
    by_diff.sort_by(|a, b| {
        (a.y - a.x)
            .partial_cmp(&(b.y - b.x))
            .expect("corner coordinates to be finite")
    });
    let top_right = by_diff[0];
    let bottom_left = by_diff[3];

    [top_left, top_right, bottom_right, bottom_left]
}

/// Simplifies a closed contour with the Douglas-Peucker algorithm. Vertices
/// farther than `epsilon` from the simplified outline are always retained.
pub fn approx_polygon(points: &[Point<i32>], epsilon: f64) -> Vec<Point<i32>> {
    if points.len() < 3 {
        return points.to_vec();
    }

    // Split the closed chain at two mutually distant points so each half can
    // be simplified as an open polyline.
    let start = farthest_point_index(points, 0);
    let end = farthest_point_index(points, start);
    let (lo, hi) = (start.min(end), start.max(end));

    let first_arc = &points[lo..=hi];
    let second_arc = points[hi..]
        .iter()
        .chain(points[..=lo].iter())
        .copied()
        .collect::<Vec<Point<i32>>>();

    let mut simplified = simplify_arc(first_arc, epsilon);
    simplified.pop();
    let mut back = simplify_arc(&second_arc, epsilon);
    back.pop();
    simplified.append(&mut back);
    simplified
}

fn farthest_point_index(points: &[Point<i32>], from: usize) -> usize {
    let origin = points[from];
    let mut best = from;
    let mut best_distance = -1.0_f64;
    for (i, p) in points.iter().enumerate() {
        let dx = f64::from(p.x - origin.x);
        let dy = f64::from(p.y - origin.y);
        let distance = dx * dx + dy * dy;
        if distance > best_distance {
            best_distance = distance;
            best = i;
        }
    }
    best
}

fn simplify_arc(points: &[Point<i32>], epsilon: f64) -> Vec<Point<i32>> {
    if points.len() <= 2 {
        return points.to_vec();
    }

    let first = points[0];
    let last = points[points.len() - 1];
    let mut max_distance = 0.0_f64;
    let mut max_index = 0;
    for (i, p) in points.iter().enumerate().skip(1).take(points.len() - 2) {
        let distance = perpendicular_distance(p, &first, &last);
        if distance > max_distance {
            max_distance = distance;
            max_index = i;
        }
    }

    if max_distance > epsilon {
        let mut left = simplify_arc(&points[..=max_index], epsilon);
        let right = simplify_arc(&points[max_index..], epsilon);
        left.pop();
        left.extend(right);
        left
    } else {
        vec![first, last]
    }
}

fn perpendicular_distance(p: &Point<i32>, a: &Point<i32>, b: &Point<i32>) -> f64 {
    let abx = f64::from(b.x - a.x);
    let aby = f64::from(b.y - a.y);
    let length = (abx * abx + aby * aby).sqrt();
    if length == 0.0 {
        let dx = f64::from(p.x - a.x);
        let dy = f64::from(p.y - a.y);
        return (dx * dx + dy * dy).sqrt();
    }
    let apx = f64::from(p.x - a.x);
    let apy = f64::from(p.y - a.y);
    (abx * apy - aby * apx).abs() / length
}
