use image::GrayImage;
use imageproc::contours::{find_contours_with_threshold, BorderType, Contour};
use imageproc::point::Point;
use imageproc::rect::Rect;
use logging_timer::time;

use crate::geometry::{bounding_rect, polygon_area, polygon_perimeter, roundness};
use crate::pipeline::{GradeError, GradingConfig};

/// A contour accepted as an answer bubble, with the metrics used to filter
/// and order it.
#[derive(Debug, Clone)]
pub struct BubbleContour {
    pub points: Vec<Point<i32>>,
    pub bounds: Rect,
    pub area: f32,
    pub perimeter: f32,
}

impl BubbleContour {
    pub fn from_points(points: Vec<Point<i32>>) -> Self {
        let bounds = bounding_rect(&points);
        let area = polygon_area(&points);
        let perimeter = polygon_perimeter(&points);
        Self {
            points,
            bounds,
            area,
            perimeter,
        }
    }

    pub fn roundness(&self) -> f32 {
        roundness(self.area, self.perimeter)
    }

    fn aspect_ratio(&self) -> f32 {
        self.bounds.width() as f32 / self.bounds.height() as f32
    }
}

/// The option bubbles for a single question, ordered left to right.
pub type QuestionGroup = Vec<BubbleContour>;

#[time]
/// Extracts bubble candidates from the binary mask: outer contours whose
/// bounding box, aspect ratio and roundness look like an answer bubble. Text,
/// specks and page furniture fail at least one of the three checks.
pub fn find_bubble_candidates(mask: &GrayImage, config: &GradingConfig) -> Vec<BubbleContour> {
    let contours: Vec<Contour<i32>> = find_contours_with_threshold(mask, 0);
    contours
        .into_iter()
        .filter(|contour| contour.border_type == BorderType::Outer)
        .filter(|contour| contour.points.len() >= 3)
        .map(|contour| BubbleContour::from_points(contour.points))
        .filter(|bubble| is_bubble_candidate(bubble, config))
        .collect()
}

fn is_bubble_candidate(bubble: &BubbleContour, config: &GradingConfig) -> bool {
    let aspect_ratio = bubble.aspect_ratio();
    bubble.bounds.width() >= config.min_bubble_width
        && bubble.bounds.height() >= config.min_bubble_height
        && aspect_ratio >= config.min_aspect_ratio
        && aspect_ratio <= config.max_aspect_ratio
        && bubble.roundness() > config.min_roundness
}

#[time]
/// Orders bubbles top-to-bottom and partitions them into question groups of
/// `answers_count`, each re-sorted left-to-right. A trailing short group
/// means the sheet and the configured option count disagree, and grading
/// cannot proceed.
pub fn group_into_questions(
    mut bubbles: Vec<BubbleContour>,
    answers_count: usize,
) -> Result<Vec<QuestionGroup>, GradeError> {
    assert!(answers_count > 0, "answers_count must be positive");
    bubbles.sort_by_key(|bubble| bubble.bounds.top());

    let mut groups = vec![];
    let mut bubbles = bubbles.into_iter().peekable();
    while bubbles.peek().is_some() {
        let mut group: QuestionGroup = bubbles.by_ref().take(answers_count).collect();
        if group.len() < answers_count {
            return Err(GradeError::IncompleteQuestionGroup {
                question: groups.len(),
                expected: answers_count,
                found: group.len(),
            });
        }
        group.sort_by_key(|bubble| bubble.bounds.left());
        groups.push(group);
    }
    Ok(groups)
}

#[cfg(test)]
mod tests {
    use std::f32::consts::PI;

    use super::*;

    fn circle_contour(cx: i32, cy: i32, radius: i32) -> BubbleContour {
        let points = (0..48)
            .map(|i| {
                let angle = 2.0 * PI * i as f32 / 48.0;
                Point::new(
                    cx + (radius as f32 * angle.cos()).round() as i32,
                    cy + (radius as f32 * angle.sin()).round() as i32,
                )
            })
            .collect();
        BubbleContour::from_points(points)
    }

    #[test]
    fn accepts_bubble_sized_circles() {
        let bubble = circle_contour(50, 50, 15);
        assert!(is_bubble_candidate(&bubble, &GradingConfig::default()));
    }

    #[test]
    fn rejects_small_specks() {
        let speck = circle_contour(50, 50, 5);
        assert!(!is_bubble_candidate(&speck, &GradingConfig::default()));
    }

    #[test]
    fn rejects_elongated_shapes() {
        let strip = BubbleContour::from_points(vec![
            Point::new(0, 0),
            Point::new(90, 0),
            Point::new(90, 30),
            Point::new(0, 30),
        ]);
        assert!(!is_bubble_candidate(&strip, &GradingConfig::default()));
    }

    #[test]
    fn groups_grid_into_questions() {
        // 5 rows of 5 bubbles, supplied in scrambled order.
        let mut bubbles = vec![];
        for row in 0..5 {
            for column in 0..5 {
                bubbles.push(circle_contour(40 + column * 60, 40 + row * 70, 15));
            }
        }
        bubbles.reverse();
        bubbles.swap(3, 17);

        let groups = group_into_questions(bubbles, 5).expect("grouping to succeed");
        assert_eq!(groups.len(), 5);
        for (row, group) in groups.iter().enumerate() {
            assert_eq!(group.len(), 5);
            for (column, bubble) in group.iter().enumerate() {
                assert_eq!(
                    bubble.bounds.left(),
                    40 + column as i32 * 60 - 15,
                    "row {} column {}",
                    row,
                    column
                );
                assert_eq!(bubble.bounds.top(), 40 + row as i32 * 70 - 15);
            }
        }
    }

    #[test]
    fn short_trailing_group_fails_fast() {
        let bubbles = (0..23)
            .map(|i| circle_contour(40 + (i % 5) * 60, 40 + (i / 5) * 70, 15))
            .collect::<Vec<BubbleContour>>();
        match group_into_questions(bubbles, 5) {
            Err(GradeError::IncompleteQuestionGroup {
                question,
                expected,
                found,
            }) => {
                assert_eq!((question, expected, found), (4, 5, 3));
            }
            other => panic!("expected IncompleteQuestionGroup, got {:?}", other),
        }
    }

    #[test]
    fn finds_filled_circles_in_mask() {
        let mut mask = GrayImage::new(200, 100);
        imageproc::drawing::draw_filled_circle_mut(&mut mask, (50, 50), 16, image::Luma([255]));
        imageproc::drawing::draw_filled_circle_mut(&mut mask, (130, 50), 16, image::Luma([255]));
        let bubbles = find_bubble_candidates(&mask, &GradingConfig::default());
        assert_eq!(bubbles.len(), 2);
    }
}
