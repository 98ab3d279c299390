use image::GrayImage;
use imageproc::contrast::{otsu_level, threshold};
use logging_timer::time;

#[time]
/// Binarizes a grayscale image with Otsu's method, inverted so that dark ink
/// on light paper becomes foreground (255).
pub fn binarize(gray: &GrayImage) -> GrayImage {
    let level = otsu_level(gray);
    log::trace!("otsu threshold level: {}", level);
    let mut mask = threshold(gray, level);
    image::imageops::invert(&mut mask);
    mask
}
