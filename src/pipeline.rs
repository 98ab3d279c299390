use image::RgbImage;
use logging_timer::time;
use serde::{Deserialize, Serialize};

use crate::answer_key::AnswerKey;
use crate::binarize::binarize;
use crate::bubbles::{find_bubble_candidates, group_into_questions};
use crate::document::find_document_quad;
use crate::image_utils::resize_to_width;
use crate::marks::grade_questions;
use crate::rectify::rectify;
use crate::silhouette::obtain_silhouette;

/// Geometric thresholds and breakpoints used throughout the pipeline. The
/// defaults reproduce the classic values for photographed letter-size sheets;
/// all of them can be overridden from a JSON file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GradingConfig {
    /// Inputs wider than this are downscaled before edge detection.
    pub max_input_width: u32,
    /// Rectified paper narrower than this is upscaled before bubble
    /// detection, since the bubble filters work in absolute pixels.
    pub min_paper_width: u32,
    pub blur_sigma: f32,
    pub canny_low_threshold: f32,
    pub canny_high_threshold: f32,
    pub min_bubble_width: u32,
    pub min_bubble_height: u32,
    pub min_aspect_ratio: f32,
    pub max_aspect_ratio: f32,
    pub min_roundness: f32,
}

impl Default for GradingConfig {
    fn default() -> Self {
        Self {
            max_input_width: 480,
            min_paper_width: 240,
            blur_sigma: 1.1,
            canny_low_threshold: 75.0,
            canny_high_threshold: 200.0,
            min_bubble_width: 20,
            min_bubble_height: 20,
            min_aspect_ratio: 0.9,
            max_aspect_ratio: 1.2,
            min_roundness: 0.7,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Options {
    /// Number of option bubbles per question.
    pub answers_count: usize,
    pub config: GradingConfig,
}

impl Options {
    pub fn new(answers_count: usize) -> Self {
        Self {
            answers_count,
            config: GradingConfig::default(),
        }
    }
}

#[derive(Debug)]
pub struct GradingResult {
    /// Percentage of correct answers, rounded to two decimals.
    pub score: f32,
    pub correct: u32,
    pub total: usize,
    /// Selected option index per question, in question order.
    pub selected_answers: Vec<usize>,
    /// The rectified paper image with the correct answers outlined.
    pub annotated_image: RgbImage,
    /// The input image after the width cap was applied.
    pub normalized_input: RgbImage,
}

#[derive(Debug)]
pub enum GradeError {
    /// The detected bubble count is not a multiple of `answers_count`.
    IncompleteQuestionGroup {
        question: usize,
        expected: usize,
        found: usize,
    },
    /// The number of detected questions disagrees with the answer key.
    QuestionCountMismatch { detected: usize, expected: usize },
    /// The answer key names an option beyond the configured option count.
    AnswerOutOfRange {
        question: usize,
        option: usize,
        answers_count: usize,
    },
}

#[time]
/// Grades a photographed answer sheet against the answer key: locate the
/// sheet, rectify its perspective, binarize, detect and group bubbles, then
/// score the marked options. Failure to find the sheet boundary is not an
/// error; grading falls back to the unrectified photo.
pub fn grade(
    input: &RgbImage,
    answer_key: &AnswerKey,
    options: &Options,
) -> Result<GradingResult, GradeError> {
    let config = &options.config;

    // Every key entry must name one of the bubbles a question group will
    // actually have, or the grader would index past the group.
    for (question, option) in answer_key.answers().iter().enumerate() {
        if *option >= options.answers_count {
            return Err(GradeError::AnswerOutOfRange {
                question,
                option: *option,
                answers_count: options.answers_count,
            });
        }
    }

    let normalized_input = if input.width() > config.max_input_width {
        log::debug!(
            "downscaling input from {}px to {}px wide",
            input.width(),
            config.max_input_width
        );
        resize_to_width(input, config.max_input_width)
    } else {
        input.clone()
    };

    let (edges, gray) = obtain_silhouette(&normalized_input, config);
    let quad = find_document_quad(&edges);
    let (mut paper, mut warped) = rectify(&normalized_input, &gray, quad);

    if paper.width() < config.min_paper_width {
        log::debug!(
            "upscaling paper from {}px to {}px wide",
            paper.width(),
            config.min_paper_width
        );
        paper = resize_to_width(&paper, config.min_paper_width);
        warped = resize_to_width(&warped, config.min_paper_width);
    }

    let mask = binarize(&warped);
    let bubbles = find_bubble_candidates(&mask, config);
    log::debug!("found {} bubble candidates", bubbles.len());
    let groups = group_into_questions(bubbles, options.answers_count)?;

    if groups.len() != answer_key.len() {
        return Err(GradeError::QuestionCountMismatch {
            detected: groups.len(),
            expected: answer_key.len(),
        });
    }

    let (correct, selected_answers) = grade_questions(&groups, &mask, answer_key, &mut paper);
    let total = groups.len();
    let score = if total == 0 {
        0.0
    } else {
        round_to_hundredths(correct as f32 / total as f32 * 100.0)
    };

    Ok(GradingResult {
        score,
        correct,
        total,
        selected_answers,
        annotated_image: paper,
        normalized_input,
    })
}

fn round_to_hundredths(value: f32) -> f32 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_classic_thresholds() {
        let config = GradingConfig::default();
        assert_eq!(config.max_input_width, 480);
        assert_eq!(config.min_paper_width, 240);
        assert_eq!(config.min_bubble_width, 20);
        assert!((config.min_roundness - 0.7).abs() < f32::EPSILON);
    }

    #[test]
    fn config_deserializes_partially() {
        let config: GradingConfig =
            serde_json::from_str(r#"{ "maxInputWidth": 960, "minRoundness": 0.5 }"#)
                .expect("config to parse");
        assert_eq!(config.max_input_width, 960);
        assert!((config.min_roundness - 0.5).abs() < f32::EPSILON);
        // untouched fields keep their defaults
        assert_eq!(config.min_paper_width, 240);
    }

    #[test]
    fn rounds_scores_to_two_decimals() {
        assert_eq!(round_to_hundredths(100.0 / 3.0), 33.33);
        assert_eq!(round_to_hundredths(200.0 / 3.0), 66.67);
        assert_eq!(round_to_hundredths(80.0), 80.0);
    }

    #[test]
    fn key_entry_beyond_option_count_is_a_typed_error() {
        // an "E" answer graded with three options per question
        let sheet = RgbImage::from_pixel(100, 100, image::Rgb([255, 255, 255]));
        let key = AnswerKey::new(vec![0, 4, 1]);
        match grade(&sheet, &key, &Options::new(3)) {
            Err(GradeError::AnswerOutOfRange {
                question,
                option,
                answers_count,
            }) => {
                assert_eq!((question, option, answers_count), (1, 4, 3));
            }
            other => panic!("expected AnswerOutOfRange, got {:?}", other),
        }
    }

    #[test]
    fn blank_image_fails_the_question_count_check() {
        let blank = RgbImage::from_pixel(100, 100, image::Rgb([255, 255, 255]));
        let key = AnswerKey::new(vec![0, 1]);
        match grade(&blank, &key, &Options::new(5)) {
            Err(GradeError::QuestionCountMismatch { detected, expected }) => {
                assert_eq!((detected, expected), (0, 2));
            }
            other => panic!("expected QuestionCountMismatch, got {:?}", other),
        }
    }
}
