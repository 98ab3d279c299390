use image::{GrayImage, Luma, Rgb, RgbImage};
use imageproc::geometric_transformations::{warp_into, Interpolation, Projection};
use imageproc::point::Point;
use logging_timer::time;

use crate::geometry::{distance_from_point_to_point, order_corners};

#[time]
/// Warps both the color and grayscale images so the detected document
/// quadrilateral fills an axis-aligned rectangle. When no quadrilateral was
/// found (or it is too degenerate to build a projection from) the inputs pass
/// through unchanged; grading continues on the unrectified photo.
pub fn rectify(
    color: &RgbImage,
    gray: &GrayImage,
    quad: Option<[Point<f32>; 4]>,
) -> (RgbImage, GrayImage) {
    let Some(quad) = quad else {
        log::debug!("no document contour found; grading the unrectified image");
        return (color.clone(), gray.clone());
    };

    let [top_left, top_right, bottom_right, bottom_left] = order_corners(&quad);

    let top_width = distance_from_point_to_point(&top_right, &top_left);
    let bottom_width = distance_from_point_to_point(&bottom_right, &bottom_left);
    let width = top_width.max(bottom_width).round().max(1.0) as u32;

    let left_height = distance_from_point_to_point(&bottom_left, &top_left);
    let right_height = distance_from_point_to_point(&bottom_right, &top_right);
    let height = left_height.max(right_height).round().max(1.0) as u32;

    let source = [
        (top_left.x, top_left.y),
        (top_right.x, top_right.y),
        (bottom_right.x, bottom_right.y),
        (bottom_left.x, bottom_left.y),
    ];
    let destination = [
        (0.0, 0.0),
        ((width - 1) as f32, 0.0),
        ((width - 1) as f32, (height - 1) as f32),
        (0.0, (height - 1) as f32),
    ];

    let Some(projection) = Projection::from_control_points(source, destination) else {
        log::warn!("document corners are degenerate; grading the unrectified image");
        return (color.clone(), gray.clone());
    };

    let mut paper = RgbImage::new(width, height);
    warp_into(
        color,
        &projection,
        Interpolation::Bilinear,
        Rgb([0, 0, 0]),
        &mut paper,
    );

    let mut warped = GrayImage::new(width, height);
    warp_into(gray, &projection, Interpolation::Bilinear, Luma([0]), &mut warped);

    (paper, warped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_quad_passes_images_through() {
        let color = RgbImage::from_pixel(40, 60, Rgb([1, 2, 3]));
        let gray = GrayImage::from_pixel(40, 60, Luma([7]));
        let (paper, warped) = rectify(&color, &gray, None);
        assert_eq!(paper, color);
        assert_eq!(warped, gray);
    }

    #[test]
    fn axis_aligned_quad_crops_to_its_own_size() {
        let mut gray = GrayImage::from_pixel(100, 100, Luma([200]));
        for y in 20..70 {
            for x in 10..50 {
                gray.put_pixel(x, y, Luma([10]));
            }
        }
        let color = RgbImage::from_pixel(100, 100, Rgb([200, 200, 200]));
        let quad = [
            Point::new(10.0, 20.0),
            Point::new(49.0, 20.0),
            Point::new(49.0, 69.0),
            Point::new(10.0, 69.0),
        ];
        let (paper, warped) = rectify(&color, &gray, Some(quad));
        assert_eq!(paper.dimensions(), (39, 49));
        assert_eq!(warped.dimensions(), (39, 49));
        // the dark region fills the warped output
        assert_eq!(*warped.get_pixel(5, 5), Luma([10]));
        assert_eq!(*warped.get_pixel(33, 43), Luma([10]));
    }

    #[test]
    fn projection_round_trips_corners() {
        let source = [
            (12.0_f32, 8.0_f32),
            (205.0, 15.0),
            (198.0, 260.0),
            (5.0, 255.0),
        ];
        let destination = [(0.0, 0.0), (199.0, 0.0), (199.0, 249.0), (0.0, 249.0)];
        let projection = Projection::from_control_points(source, destination)
            .expect("projection to exist for a convex quad");
        let inverse = projection.invert();
        for (corner, mapped) in source.iter().zip(destination.iter()) {
            let forward = projection * *corner;
            assert!((forward.0 - mapped.0).abs() < 0.01 && (forward.1 - mapped.1).abs() < 0.01);
            let back = inverse * forward;
            assert!((back.0 - corner.0).abs() < 0.01 && (back.1 - corner.1).abs() < 0.01);
        }
    }
}
