pub mod answer_key;
pub mod binarize;
pub mod bubbles;
pub mod document;
pub mod geometry;
pub mod image_utils;
pub mod marks;
pub mod pipeline;
pub mod rectify;
pub mod report;
pub mod silhouette;

pub use crate::answer_key::{AnswerKey, AnswerKeyError, AnswerKeySource};
pub use crate::pipeline::{grade, GradeError, GradingConfig, GradingResult, Options};
pub use crate::report::{ReportError, ReportWriter};
