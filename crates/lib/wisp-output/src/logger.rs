use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use log::LevelFilter;
use log4rs::append::file::FileAppender;
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;
use serde::Deserialize;

use crate::error::{OutputError, OutputResult};

#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct LogSettings {
    pub log_path: String,
    pub log_level: String,
    pub log_file_name: String,
    pub log_overwrite: bool,
}

pub fn setup_logging(log_level: &str, log_file_path: &Path) -> OutputResult<Config> {
    let log_level = get_logging_level(log_level);
    let log_file = FileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(
            "{d(%Y.%m.%d %H:%M:%S)} | {({l}):5.5} | {({f}:{L}):>40.40} | {m}{n}",
        )))
        .build(log_file_path)
        .map_err(|e| OutputError::io(log_file_path, e))?;

    Config::builder()
        .appender(Appender::builder().build("file", Box::new(log_file)))
        .build(Root::builder().appender("file").build(log_level))
        .map_err(|e| OutputError::Logger(e.to_string()))
}

fn get_logging_level(log_level: &str) -> LevelFilter {
    match log_level.to_lowercase().as_str() {
        "trace" => LevelFilter::Trace,
        "debug" => LevelFilter::Debug,
        "info" => LevelFilter::Info,
        "warn" => LevelFilter::Warn,
        "error" => LevelFilter::Error,
        "off" => LevelFilter::Off,
        _ => LevelFilter::Info,
    }
}

/// Creates the log directory under `base_path` and picks the log file. An existing file is
/// removed when `log_overwrite` is set, otherwise the new file gets a timestamp suffix.
pub fn prepare_log_file(base_path: &Path, log_settings: &LogSettings) -> OutputResult<PathBuf> {
    let log_path = base_path.join(&log_settings.log_path).join("logs");
    if !log_path.exists() {
        fs::create_dir_all(&log_path).map_err(|e| OutputError::io(&log_path, e))?;
    }

    let log_file_path = log_path.join(&log_settings.log_file_name);
    if !log_file_path.exists() {
        return Ok(log_file_path);
    }
    if log_settings.log_overwrite {
        fs::remove_file(&log_file_path).map_err(|e| OutputError::io(&log_file_path, e))?;
        return Ok(log_file_path);
    }
    let stem = Path::new(&log_settings.log_file_name)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("wisp");
    let suffix = Utc::now().format("_%d%m%Y_%H%M%S");
    Ok(log_path.join(format!("{}{}.log", stem, suffix)))
}

/// Installs the file logger. Returns the file the log goes to.
pub fn initiate_logger(base_path: &Path, log_settings: &LogSettings) -> OutputResult<PathBuf> {
    let log_file_path = prepare_log_file(base_path, log_settings)?;
    let config = setup_logging(&log_settings.log_level, &log_file_path)?;
    log4rs::init_config(config).map_err(|e| OutputError::Logger(e.to_string()))?;
    Ok(log_file_path)
}
