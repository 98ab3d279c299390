use image::GrayImage;
use imageproc::contours::{find_contours_with_threshold, BorderType, Contour};
use imageproc::point::Point;
use logging_timer::time;

use crate::geometry::{approx_polygon, polygon_area, polygon_perimeter};

/// Tolerance for polygon approximation, as a fraction of the contour
/// perimeter.
const APPROX_TOLERANCE: f64 = 0.02;

#[time]
/// Locates the document boundary in an edge map. Outer contours are ranked by
/// enclosed area, largest first, and the first one whose simplified outline
/// has exactly four vertices is taken to be the sheet of paper. Returns `None`
/// when no contour approximates to a quadrilateral.
pub fn find_document_quad(edges: &GrayImage) -> Option<[Point<f32>; 4]> {
    let contours: Vec<Contour<i32>> = find_contours_with_threshold(edges, 0);
    let mut candidates = contours
        .into_iter()
        .filter(|contour| contour.border_type == BorderType::Outer)
        .map(|contour| {
            let area = polygon_area(&contour.points);
            (contour.points, area)
        })
        .collect::<Vec<(Vec<Point<i32>>, f32)>>();
    candidates.sort_by(|a, b| b.1.partial_cmp(&a.1).expect("contour areas to be finite"));

    for (points, area) in candidates {
        let perimeter = polygon_perimeter(&points);
        let approx = approx_polygon(&points, APPROX_TOLERANCE * f64::from(perimeter));
        log::trace!(
            "contour area={} perimeter={} approximated to {} vertices",
            area,
            perimeter,
            approx.len()
        );
        if approx.len() == 4 {
            return Some([
                Point::new(approx[0].x as f32, approx[0].y as f32),
                Point::new(approx[1].x as f32, approx[1].y as f32),
                Point::new(approx[2].x as f32, approx[2].y as f32),
                Point::new(approx[3].x as f32, approx[3].y as f32),
            ]);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use image::Luma;

    use super::*;
    use crate::geometry::order_corners;

    fn draw_rect_outline(img: &mut GrayImage, left: u32, top: u32, width: u32, height: u32) {
        for x in left..left + width {
            img.put_pixel(x, top, Luma([255]));
            img.put_pixel(x, top + height - 1, Luma([255]));
        }
        for y in top..top + height {
            img.put_pixel(left, y, Luma([255]));
            img.put_pixel(left + width - 1, y, Luma([255]));
        }
    }

    #[test]
    fn empty_edge_map_has_no_document() {
        let edges = GrayImage::new(100, 100);
        assert_eq!(find_document_quad(&edges), None);
    }

    #[test]
    fn finds_rectangular_outline() {
        let mut edges = GrayImage::new(200, 200);
        draw_rect_outline(&mut edges, 20, 30, 120, 140);
        let quad = find_document_quad(&edges).expect("document quad to be found");
        let [tl, _, br, _] = order_corners(&quad);
        assert!((tl.x - 20.0).abs() <= 1.0 && (tl.y - 30.0).abs() <= 1.0);
        assert!((br.x - 139.0).abs() <= 1.0 && (br.y - 169.0).abs() <= 1.0);
    }

    #[test]
    fn prefers_largest_quadrilateral() {
        let mut edges = GrayImage::new(300, 300);
        draw_rect_outline(&mut edges, 10, 10, 250, 260);
        draw_rect_outline(&mut edges, 270, 10, 20, 20);
        let quad = find_document_quad(&edges).expect("document quad to be found");
        let [tl, _, br, _] = order_corners(&quad);
        assert!(tl.x < 15.0, "picked the smaller rectangle: {:?}", quad);
        assert!(br.x > 250.0);
    }
}
