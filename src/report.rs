use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use crate::answer_key::letter_for_option_index;
use crate::pipeline::GradingResult;

#[derive(Debug)]
pub enum ReportError {
    Csv(PathBuf, csv::Error),
    Io(PathBuf, io::Error),
}

/// Persists one row per graded image: name, score, and the selected answers
/// rendered back as letters.
pub struct ReportWriter {
    path: PathBuf,
    writer: csv::Writer<File>,
}

impl ReportWriter {
    pub fn create(path: &Path) -> Result<Self, ReportError> {
        let writer = csv::Writer::from_path(path)
            .map_err(|e| ReportError::Csv(path.to_path_buf(), e))?;
        Ok(Self {
            path: path.to_path_buf(),
            writer,
        })
    }

    pub fn append(&mut self, name: &str, result: &GradingResult) -> Result<(), ReportError> {
        let mut record = vec![name.to_string(), format!("{:.2}", result.score)];
        record.extend(
            result
                .selected_answers
                .iter()
                .map(|&answer| letter_for_option_index(answer).to_string()),
        );
        self.writer
            .write_record(&record)
            .map_err(|e| ReportError::Csv(self.path.clone(), e))
    }

    pub fn finish(mut self) -> Result<(), ReportError> {
        self.writer
            .flush()
            .map_err(|e| ReportError::Io(self.path.clone(), e))
    }
}
