use image::{GrayImage, RgbImage};
use imageproc::drawing::draw_polygon_mut;
use logging_timer::time;

use crate::answer_key::AnswerKey;
use crate::bubbles::{BubbleContour, QuestionGroup};
use crate::image_utils::{draw_contour_outline_mut, open_polygon, GREEN, RED, WHITE};

/// The winning bubble for one question: how many foreground pixels it
/// contains and which option it is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkedBubble {
    pub fill_count: u32,
    pub option_index: usize,
}

/// Counts mask-foreground pixels that fall inside the bubble's contour.
fn fill_count(bubble: &BubbleContour, mask: &GrayImage) -> u32 {
    let points = open_polygon(&bubble.points);
    if points.len() < 3 {
        return 0;
    }

    let mut stencil = GrayImage::new(mask.width(), mask.height());
    draw_polygon_mut(&mut stencil, points, WHITE);

    let left = bubble.bounds.left().max(0) as u32;
    let top = bubble.bounds.top().max(0) as u32;
    let right = (bubble.bounds.right().max(0) as u32).min(mask.width().saturating_sub(1));
    let bottom = (bubble.bounds.bottom().max(0) as u32).min(mask.height().saturating_sub(1));

    let mut count = 0;
    for y in top..=bottom {
        for x in left..=right {
            if stencil.get_pixel(x, y).0[0] > 0 && mask.get_pixel(x, y).0[0] > 0 {
                count += 1;
            }
        }
    }
    count
}

/// Selects the marked option for a question: the bubble with the strictly
/// greatest fill count. Ties resolve to the first bubble in left-to-right
/// order.
pub fn marked_option(group: &QuestionGroup, mask: &GrayImage) -> MarkedBubble {
    let mut marked = MarkedBubble {
        fill_count: 0,
        option_index: 0,
    };
    let mut first = true;
    for (option_index, bubble) in group.iter().enumerate() {
        let fill_count = fill_count(bubble, mask);
        if first || fill_count > marked.fill_count {
            marked = MarkedBubble {
                fill_count,
                option_index,
            };
            first = false;
        }
    }
    marked
}

#[time]
/// Grades every question group against the answer key, drawing the outline of
/// the correct option on the paper image as it goes: green when the user
/// marked it, red when they marked something else. Returns the number of
/// correct answers and the selected option per question.
pub fn grade_questions(
    groups: &[QuestionGroup],
    mask: &GrayImage,
    answer_key: &AnswerKey,
    paper: &mut RgbImage,
) -> (u32, Vec<usize>) {
    let mut correct = 0;
    let mut selected_answers = vec![];

    for (question, group) in groups.iter().enumerate() {
        let marked = marked_option(group, mask);
        let correct_option = answer_key
            .get(question)
            .expect("answer key length to match question count");

        let color = if marked.option_index == correct_option {
            correct += 1;
            GREEN
        } else {
            RED
        };
        draw_contour_outline_mut(paper, &group[correct_option].points, color);
        log::debug!(
            "question {}: marked option {} with {} filled pixels (correct: {})",
            question,
            marked.option_index,
            marked.fill_count,
            correct_option
        );
        selected_answers.push(marked.option_index);
    }

    (correct, selected_answers)
}
