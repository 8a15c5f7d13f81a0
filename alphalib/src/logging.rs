use log::LevelFilter;
use log4rs::append::console::ConsoleAppender;
use log4rs::append::file::FileAppender;
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;

use crate::config::LoggingConfig;
use crate::errors::AlphaError;

const PATTERN: &str = "[{d(%Y-%m-%d %H:%M:%S%.3f)}][{l}] {m}{n}";

pub fn parse_level(level: &str) -> Result<LevelFilter, AlphaError> {
    level
        .parse::<LevelFilter>()
        .map_err(|_| AlphaError::Config(format!("unknown log level: {}", level)))
}

/// Console output, plus a log file when one is configured.
pub fn build_config(logging: &LoggingConfig) -> Result<Config, AlphaError> {
    let level = parse_level(&logging.level)?;

    let console = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new(PATTERN)))
        .build();
    let mut builder = Config::builder().appender(Appender::builder().build("console", Box::new(console)));
    let mut root = Root::builder().appender("console");

    if let Some(path) = &logging.file {
        let file = FileAppender::builder()
            .encoder(Box::new(PatternEncoder::new(PATTERN)))
            .build(path)?;
        builder = builder.appender(Appender::builder().build("file", Box::new(file)));
        root = root.appender("file");
    }

    builder
        .build(root.build(level))
        .map_err(|e| AlphaError::Logging(e.to_string()))
}

pub fn init(logging: &LoggingConfig) -> Result<log4rs::Handle, AlphaError> {
    let config = build_config(logging)?;
    log4rs::init_config(config).map_err(|e| AlphaError::Logging(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_parse_case_insensitively() {
        assert_eq!(parse_level("info").unwrap(), LevelFilter::Info);
        assert_eq!(parse_level("DEBUG").unwrap(), LevelFilter::Debug);
        assert!(parse_level("loud").is_err());
    }

    #[test]
    fn builds_console_only_config() {
        let config = build_config(&LoggingConfig::default()).unwrap();
        assert_eq!(config.appenders().len(), 1);
        assert_eq!(config.root().level(), LevelFilter::Info);
    }

    #[test]
    fn adds_file_appender() {
        let path = std::env::temp_dir().join(format!("alphalib-log-{}.log", std::process::id()));
        let config = build_config(&LoggingConfig {
            level: "warn".to_string(),
            file: Some(path.clone()),
        })
        .unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(config.appenders().len(), 2);
        assert_eq!(config.root().appenders().len(), 2);
    }
}
