use image::imageops::{resize, FilterType};
use image::{GenericImageView, ImageBuffer, Luma, Pixel, Rgb};
use imageproc::drawing::draw_line_segment_mut;
use imageproc::point::Point;

pub const WHITE: Luma<u8> = Luma([u8::MAX]);
pub const BLACK: Luma<u8> = Luma([u8::MIN]);

pub const GREEN: Rgb<u8> = Rgb([0, 255, 0]);
pub const RED: Rgb<u8> = Rgb([255, 0, 0]);

/// Resizes an image to the given width, preserving its aspect ratio.
pub fn resize_to_width<I: GenericImageView>(
    image: &I,
    width: u32,
) -> ImageBuffer<I::Pixel, Vec<<I::Pixel as Pixel>::Subpixel>>
where
    I::Pixel: 'static,
    <I::Pixel as Pixel>::Subpixel: 'static,
{
    let height = ((u64::from(image.height()) * u64::from(width)) / u64::from(image.width()))
        .max(1) as u32;
    resize(image, width, height, FilterType::Triangle)
}

/// Draws the closed outline of a contour chain onto a color canvas.
pub fn draw_contour_outline_mut(canvas: &mut image::RgbImage, points: &[Point<i32>], color: Rgb<u8>) {
    if points.len() < 2 {
        return;
    }
    for pair in points.windows(2) {
        draw_line_segment_mut(
            canvas,
            (pair[0].x as f32, pair[0].y as f32),
            (pair[1].x as f32, pair[1].y as f32),
            color,
        );
    }
    let first = points[0];
    let last = points[points.len() - 1];
    draw_line_segment_mut(
        canvas,
        (last.x as f32, last.y as f32),
        (first.x as f32, first.y as f32),
        color,
    );
}

/// Strips a duplicated closing vertex so the chain can be handed to
/// `imageproc::drawing::draw_polygon_mut`, which rejects closed input.
pub fn open_polygon(points: &[Point<i32>]) -> &[Point<i32>] {
    match (points.first(), points.last()) {
        (Some(first), Some(last)) if points.len() > 1 && first == last => {
            &points[..points.len() - 1]
        }
        _ => points,
    }
}
