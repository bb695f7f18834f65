use crate::numerical::definite_integral::IntegralReport;
use crate::numerical::integral_error::IntegralError;
use csv::Writer;
use log::{LevelFilter, info};
use simplelog::{
    ColorChoice, CombinedLogger, Config, SharedLogger, TermLogger, TerminalMode, WriteLogger,
};
use std::fs::File;
use std::path::Path;

/// Terminal logger plus an optional log file. A second call is a no-op
/// (the global logger can be set only once per process).
pub fn init_logger(level: LevelFilter, log_file: Option<&str>) -> Result<(), IntegralError> {
    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )];
    if let Some(filename) = log_file {
        let file = File::create(filename)?;
        loggers.push(WriteLogger::new(level, Config::default(), file));
    }
    let _ = CombinedLogger::init(loggers);
    Ok(())
}

/// Maps a level name from the task document; unknown names fall back to `Info`.
pub fn level_from_str(name: &str) -> LevelFilter {
    match name.trim().to_lowercase().as_str() {
        "off" => LevelFilter::Off,
        "error" => LevelFilter::Error,
        "warn" | "warning" => LevelFilter::Warn,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => LevelFilter::Info,
    }
}

/// One row per method: method, subdivisions, dx, approximation, exact, signed error.
/// Missing values are written as empty fields.
pub fn save_report_to_csv<P: AsRef<Path>>(
    report: &IntegralReport,
    filename: P,
) -> Result<(), IntegralError> {
    let file = File::create(filename.as_ref())?;
    let mut writer = Writer::from_writer(file);
    writer.write_record([
        "method",
        "subdivisions",
        "dx",
        "approximation",
        "exact",
        "signed_error",
    ])?;
    let exact = report
        .exact_float
        .map_or(String::new(), |value| value.to_string());
    for (result, error) in report.results.iter().zip(report.signed_errors.iter()) {
        writer.write_record([
            result.method.to_string(),
            result.subdivisions.to_string(),
            result.dx.to_string(),
            result.total.to_string(),
            exact.clone(),
            error.map_or(String::new(), |e| e.to_string()),
        ])?;
    }
    writer.flush()?;
    info!("report saved to {}", filename.as_ref().display());
    Ok(())
}
