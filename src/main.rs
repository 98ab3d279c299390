extern crate log;
extern crate pretty_env_logger;

use std::path::{Path, PathBuf};
use std::process::exit;

use clap::{arg, command, Command};
use rayon::prelude::*;

use omr_grader::answer_key::AnswerKeySource;
use omr_grader::pipeline::{grade, GradingConfig, Options};
use omr_grader::report::ReportWriter;

const IMAGE_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];

fn main() {
    pretty_env_logger::init_custom_env("LOG");

    let matches = cli().get_matches();
    let answers_path = matches
        .get_one::<String>("answers")
        .expect("answer key path is required");
    let input_path = matches
        .get_one::<String>("input")
        .expect("input path is required");
    let answers_count = *matches
        .get_one::<u64>("count")
        .expect("count has a default") as usize;
    let output_dir = matches.get_one::<String>("output").map(PathBuf::from);
    let report_path = matches.get_one::<String>("report").map(PathBuf::from);

    let config = match matches.get_one::<String>("config") {
        Some(config_path) => match load_config(Path::new(config_path)) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error reading config: {}", e);
                exit(1);
            }
        },
        None => GradingConfig::default(),
    };

    let answer_key = match AnswerKeySource::for_path(Path::new(answers_path))
        .and_then(|source| source.load())
    {
        Ok(answer_key) => answer_key,
        Err(e) => {
            eprintln!("Error loading answer key: {:?}", e);
            exit(1);
        }
    };

    let image_paths = match collect_image_paths(Path::new(input_path)) {
        Ok(paths) => paths,
        Err(e) => {
            eprintln!("Error reading input: {}", e);
            exit(1);
        }
    };
    if image_paths.is_empty() {
        eprintln!("No images found at {}", input_path);
        exit(1);
    }

    let options = Options {
        answers_count,
        config,
    };

    // Each image is graded independently; only the answer key is shared.
    let mut outcomes = image_paths
        .par_iter()
        .map(|path| {
            let name = path
                .file_name()
                .map(|name| name.to_string_lossy().to_string())
                .unwrap_or_else(|| path.display().to_string());
            let result = grade_one(path, &answer_key, &options, output_dir.as_deref());
            (name, result)
        })
        .collect::<Vec<(String, Result<omr_grader::GradingResult, String>)>>();
    outcomes.sort_by(|a, b| a.0.cmp(&b.0));

    let mut failures = 0;
    let mut report = match report_path.as_deref().map(ReportWriter::create) {
        Some(Ok(report)) => Some(report),
        Some(Err(e)) => {
            eprintln!("Error creating report: {:?}", e);
            exit(1);
        }
        None => None,
    };

    for (name, outcome) in &outcomes {
        match outcome {
            Ok(result) => {
                println!(
                    "{}: {:.2}% ({} of {} correct)",
                    name, result.score, result.correct, result.total
                );
                if let Some(report) = report.as_mut() {
                    if let Err(e) = report.append(name, result) {
                        eprintln!("Error writing report row for {}: {:?}", name, e);
                        exit(1);
                    }
                }
            }
            Err(e) => {
                eprintln!("{}: {}", name, e);
                failures += 1;
            }
        }
    }

    if let Some(report) = report {
        if let Err(e) = report.finish() {
            eprintln!("Error writing report: {:?}", e);
            exit(1);
        }
    }

    if failures > 0 {
        eprintln!("{} of {} images failed", failures, outcomes.len());
        exit(1);
    }
}

fn grade_one(
    path: &Path,
    answer_key: &omr_grader::AnswerKey,
    options: &Options,
    output_dir: Option<&Path>,
) -> Result<omr_grader::GradingResult, String> {
    let image = image::open(path)
        .map_err(|e| format!("unreadable image: {}", e))?
        .to_rgb8();
    let result = grade(&image, answer_key, options).map_err(|e| format!("{:?}", e))?;

    if let Some(output_dir) = output_dir {
        let stem = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_string())
            .unwrap_or_else(|| "sheet".to_string());
        let output_path = output_dir.join(format!("{}_graded.png", stem));
        result
            .annotated_image
            .save(&output_path)
            .map_err(|e| format!("could not save {}: {}", output_path.display(), e))?;
        log::info!("saved annotated image to {}", output_path.display());
    }

    Ok(result)
}

fn load_config(path: &Path) -> Result<GradingConfig, String> {
    let json = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
    serde_json::from_str(&json).map_err(|e| e.to_string())
}

fn collect_image_paths(input: &Path) -> Result<Vec<PathBuf>, std::io::Error> {
    if !input.is_dir() {
        return Ok(vec![input.to_path_buf()]);
    }

    let mut paths = vec![];
    for entry in std::fs::read_dir(input)? {
        let path = entry?.path();
        let is_image = path
            .extension()
            .and_then(|extension| extension.to_str())
            .map(|extension| {
                IMAGE_EXTENSIONS.contains(&extension.to_ascii_lowercase().as_str())
            })
            .unwrap_or(false);
        if is_image {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

#[allow(clippy::cognitive_complexity)]
fn cli() -> Command {
    command!()
        .arg(arg!(-a --answers <PATH> "Path to the answer key file (.txt, .csv, .xlsx, .xls or .ods)").required(true))
        .arg(arg!(-i --input <PATH> "Path to a sheet image, or a directory of them").required(true))
        .arg(
            arg!(-n --count <N> "Number of option bubbles per question")
                .value_parser(clap::value_parser!(u64).range(1..))
                .default_value("5"),
        )
        .arg(arg!(-o --output <DIR> "Directory to save annotated images into"))
        .arg(arg!(-r --report <PATH> "Path to write a CSV score report"))
        .arg(arg!(-c --config <PATH> "Path to a JSON grading config"))
}
