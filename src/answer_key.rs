use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use calamine::{open_workbook_auto, Reader};

/// Ground truth for a graded sheet: the correct option index per question,
/// in question order. Letters A, B, C… map to 0, 1, 2….
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerKey(Vec<usize>);

impl AnswerKey {
    pub fn new(answers: Vec<usize>) -> Self {
        Self(answers)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, question: usize) -> Option<usize> {
        self.0.get(question).copied()
    }

    pub fn answers(&self) -> &[usize] {
        &self.0
    }
}

#[derive(Debug)]
pub enum AnswerKeyError {
    Io(PathBuf, io::Error),
    UnsupportedExtension(PathBuf),
    /// A cell/line that is not a single option letter. Row and column are
    /// 1-based.
    InvalidEntry {
        path: PathBuf,
        row: usize,
        column: usize,
        value: String,
    },
    EmptyKey(PathBuf),
    Csv(PathBuf, csv::Error),
    Spreadsheet(PathBuf, calamine::Error),
}

/// Where and in which format an answer key lives. Selected by file extension,
/// so the grading core never branches on formats itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerKeySource {
    /// One option letter per line.
    LineText(PathBuf),
    /// A single row of comma-separated option letters.
    DelimitedText(PathBuf),
    /// One option letter per row in the first column of the first sheet.
    Spreadsheet(PathBuf),
}

impl AnswerKeySource {
    pub fn for_path(path: &Path) -> Result<Self, AnswerKeyError> {
        let extension = path
            .extension()
            .and_then(|extension| extension.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("txt") => Ok(Self::LineText(path.to_path_buf())),
            Some("csv") => Ok(Self::DelimitedText(path.to_path_buf())),
            Some("xlsx" | "xls" | "ods") => Ok(Self::Spreadsheet(path.to_path_buf())),
            _ => Err(AnswerKeyError::UnsupportedExtension(path.to_path_buf())),
        }
    }

    pub fn load(&self) -> Result<AnswerKey, AnswerKeyError> {
        match self {
            Self::LineText(path) => load_line_text(path),
            Self::DelimitedText(path) => load_delimited_text(path),
            Self::Spreadsheet(path) => load_spreadsheet(path),
        }
    }
}

/// Parses a single option letter ("a" through "z", either case) into its
/// 0-based option index.
pub fn option_index_for_letter(value: &str) -> Option<usize> {
    let trimmed = value.trim();
    let mut chars = trimmed.chars();
    match (chars.next(), chars.next()) {
        (Some(letter), None) if letter.is_ascii_alphabetic() => {
            Some(letter.to_ascii_uppercase() as usize - 'A' as usize)
        }
        _ => None,
    }
}

/// Renders an option index back to its letter for reports.
pub fn letter_for_option_index(option_index: usize) -> char {
    debug_assert!(option_index < 26);
    (b'A' + option_index as u8) as char
}

fn load_line_text(path: &Path) -> Result<AnswerKey, AnswerKeyError> {
    let text =
        fs::read_to_string(path).map_err(|e| AnswerKeyError::Io(path.to_path_buf(), e))?;
    let mut answers = vec![];
    for (index, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let answer =
            option_index_for_letter(line).ok_or_else(|| AnswerKeyError::InvalidEntry {
                path: path.to_path_buf(),
                row: index + 1,
                column: 1,
                value: line.trim().to_string(),
            })?;
        answers.push(answer);
    }
    require_non_empty(answers, path)
}

fn load_delimited_text(path: &Path) -> Result<AnswerKey, AnswerKeyError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(|e| AnswerKeyError::Csv(path.to_path_buf(), e))?;
    let mut records = reader.records();
    let record = match records.next() {
        Some(record) => record.map_err(|e| AnswerKeyError::Csv(path.to_path_buf(), e))?,
        None => return Err(AnswerKeyError::EmptyKey(path.to_path_buf())),
    };

    let mut answers = vec![];
    for (index, field) in record.iter().enumerate() {
        let answer =
            option_index_for_letter(field).ok_or_else(|| AnswerKeyError::InvalidEntry {
                path: path.to_path_buf(),
                row: 1,
                column: index + 1,
                value: field.trim().to_string(),
            })?;
        answers.push(answer);
    }
    require_non_empty(answers, path)
}

fn load_spreadsheet(path: &Path) -> Result<AnswerKey, AnswerKeyError> {
    let mut workbook =
        open_workbook_auto(path).map_err(|e| AnswerKeyError::Spreadsheet(path.to_path_buf(), e))?;
    let range = match workbook.worksheet_range_at(0) {
        Some(range) => range.map_err(|e| AnswerKeyError::Spreadsheet(path.to_path_buf(), e))?,
        None => return Err(AnswerKeyError::EmptyKey(path.to_path_buf())),
    };

    let mut answers = vec![];
    for (index, row) in range.rows().enumerate() {
        let value = row.first().map(ToString::to_string).unwrap_or_default();
        if value.trim().is_empty() {
            continue;
        }
        let answer =
            option_index_for_letter(&value).ok_or_else(|| AnswerKeyError::InvalidEntry {
                path: path.to_path_buf(),
                row: index + 1,
                column: 1,
                value: value.trim().to_string(),
            })?;
        answers.push(answer);
    }
    require_non_empty(answers, path)
}

fn require_non_empty(answers: Vec<usize>, path: &Path) -> Result<AnswerKey, AnswerKeyError> {
    if answers.is_empty() {
        return Err(AnswerKeyError::EmptyKey(path.to_path_buf()));
    }
    Ok(AnswerKey::new(answers))
}
