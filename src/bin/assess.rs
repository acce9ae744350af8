//! Batch assessment of a single patient record.
//!
//! Reads a JSON object mapping attribute keys to numbers and prints the
//! explained prediction.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin assess -- [record.json] [--json]
//! echo '{"age": 71, ...}' | cargo run --bin assess -- --json
//! ```
//!
//! Logs go to stderr so stdout carries only the report.

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::io::Read;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use frailsight::adapters::sanitize::SanitizingMakeWriter;
use frailsight::adapters::ClosedFormModel;
use frailsight::application::{Assessment, AssessmentReport, AssessmentService};
use frailsight::config::AssessmentConfig;
use frailsight::domain::{TornadoChart, WaterfallChart};
use frailsight::{AttributionResult, PatientRecord};

#[derive(Debug, Serialize)]
struct JsonOutput<'a> {
    report: &'a AssessmentReport,
    result: &'a AttributionResult,
    waterfall: &'a WaterfallChart,
    tornado: &'a TornadoChart,
}

impl<'a> From<&'a Assessment> for JsonOutput<'a> {
    fn from(a: &'a Assessment) -> Self {
        Self {
            report: &a.report,
            result: &a.result,
            waterfall: &a.waterfall,
            tornado: &a.tornado,
        }
    }
}

struct Args {
    input: Option<PathBuf>,
    json: bool,
}

fn usage() -> String {
    "Usage: assess [record.json] [--json] (reads stdin when no path is given)".to_string()
}

fn parse_args() -> Result<Args> {
    let mut input = None;
    let mut json = false;

    for arg in env::args().skip(1) {
        match arg.as_str() {
            "--json" => json = true,
            "-h" | "--help" => return Err(anyhow!(usage())),
            s if s.starts_with('-') && s != "-" => {
                return Err(anyhow!("Unknown option {s}\n\n{}", usage()));
            }
            s => {
                if input.is_some() {
                    return Err(anyhow!(usage()));
                }
                if s != "-" {
                    input = Some(PathBuf::from(s));
                }
            }
        }
    }

    Ok(Args { input, json })
}

fn read_input(input: Option<&PathBuf>) -> frailsight::Result<String> {
    let raw = match input {
        Some(path) => fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    Ok(raw)
}

/// Parse a JSON object of attribute keys to numbers. Legacy key aliases are
/// accepted; unknown keys are rejected.
fn parse_record(raw: &str) -> frailsight::Result<PatientRecord> {
    let named: BTreeMap<String, f64> = serde_json::from_str(raw)?;
    Ok(PatientRecord::try_from(named)?)
}

fn main() -> Result<()> {
    let (writer, _guard) = tracing_appender::non_blocking(std::io::stderr());
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(SanitizingMakeWriter::new(writer)))
        .init();

    let args = parse_args()?;
    let raw = read_input(args.input.as_ref()).context("Failed to read patient record")?;
    let record = parse_record(&raw).context("Invalid patient record")?;

    let config = AssessmentConfig::from_env_or_default();
    let model = ClosedFormModel::with_config(&config)?;
    let service = AssessmentService::new(model, &config);

    let assessment = service.assess_validated(&record)?;

    if args.json {
        let output = JsonOutput::from(&assessment);
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print!("{}", assessment.report.to_text());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use frailsight::domain::RecordError;
    use frailsight::{Feature, FrailsightError};

    #[test]
    fn test_parse_record_accepts_aliases() {
        let record = parse_record(r#"{"age": 71, "bl_crp": 9.0, "FTSST": 1}"#)
            .expect("Should parse");
        assert_eq!(record.get(Feature::Crp), Some(9.0));
        assert_eq!(record.get(Feature::Ftsst), Some(1.0));
    }

    #[test]
    fn test_parse_record_errors() {
        let err = parse_record(r#"{"age": 71, "height": 180}"#).unwrap_err();
        assert!(matches!(
            err,
            FrailsightError::Record(RecordError::UnknownAttribute(_))
        ));

        let err = parse_record(r#"{"age": "old"}"#).unwrap_err();
        assert!(matches!(err, FrailsightError::Serialization(_)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let path = PathBuf::from("/nonexistent/frailsight/record.json");
        let err = read_input(Some(&path)).unwrap_err();
        assert!(matches!(err, FrailsightError::Io(_)));
    }
}
