use image::{GrayImage, RgbImage};
use imageproc::edges::canny;
use imageproc::filter::gaussian_blur_f32;
use logging_timer::time;

use crate::pipeline::GradingConfig;

#[time]
/// Produces the document silhouette for an input photo: the Canny edge map of
/// the blurred luminance image, plus the unblurred grayscale image for the
/// later binarization pass.
pub fn obtain_silhouette(input: &RgbImage, config: &GradingConfig) -> (GrayImage, GrayImage) {
    let gray = image::imageops::grayscale(input);
    let blurred = gaussian_blur_f32(&gray, config.blur_sigma);
    let edges = canny(&blurred, config.canny_low_threshold, config.canny_high_threshold);
    (edges, gray)
}
