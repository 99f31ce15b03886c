// src/main.rs

use clap::Parser;
use log::LevelFilter;
use log4rs::{
    append::console::{ConsoleAppender, Target},
    append::file::FileAppender,
    config::{Appender, Logger, Root},
    encode::pattern::PatternEncoder,
    filter::threshold::ThresholdFilter,
    Config,
};
use std::fs;
use std::path::PathBuf;
use twitter2mongodb::constants::LOG_FILE_NAME;
use twitter2mongodb::{
    CommandLineInput, Pipeline, PipelineConfig, PipelineOutput, PipelineStream, StreamEvent,
};

/// Dependencies whose debug output drowns out the pipeline's own.
const QUIET_TARGETS: &[&str] = &["hyper", "hyper_util", "reqwest", "rustls", "mongodb"];

/// Installs log4rs and returns the path of the log file.
///
/// Console output goes to stderr because stdout carries the JSON results and
/// is meant to be piped. The file always records the pipeline at debug level;
/// HTTP, TLS and driver internals are capped at `Warn` in both appenders.
fn setup_logging(verbose: bool) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let console_level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    let console_pattern = if verbose {
        "{d(%H:%M:%S%.3f)} [{l}] {t} - {m}{n}"
    } else {
        "{m}{n}"
    };

    let log_file_path = std::env::temp_dir().join(LOG_FILE_NAME);
    if let Some(parent) = log_file_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let console = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new(console_pattern)))
        .build();
    let file = FileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(
            "{d(%Y-%m-%d %H:%M:%S%.3f)} [{l}] {T} {t} - {m}{n}",
        )))
        .build(&log_file_path)?;

    let loggers = QUIET_TARGETS
        .iter()
        .map(|target| Logger::builder().build(*target, LevelFilter::Warn));

    let config = Config::builder()
        .appender(
            Appender::builder()
                .filter(Box::new(ThresholdFilter::new(console_level)))
                .build("console", Box::new(console)),
        )
        .appender(Appender::builder().build("file", Box::new(file)))
        .loggers(loggers)
        .build(
            Root::builder()
                .appender("console")
                .appender("file")
                .build(LevelFilter::Debug),
        )?;

    log4rs::init_config(config)?;
    Ok(log_file_path)
}

/// Prints each stream event as one JSON line until the stream ends or the
/// user presses Ctrl-C.
async fn follow_stream(mut stream: PipelineStream) -> anyhow::Result<()> {
    let mut written = 0usize;
    let mut failed = 0usize;

    loop {
        let event = tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                log::warn!("Interrupted; stopping stream");
                stream.stop();
                continue;
            }
            event = stream.next_event() => event,
        };

        match event {
            Some(StreamEvent::Data(Ok(record))) => {
                if record.database.was_written() {
                    written += 1;
                }
                println!("{}", record.summary());
            }
            Some(StreamEvent::Data(Err(e))) => {
                failed += 1;
                eprintln!("✗ Event failed ({}): {}", e.kind(), e);
            }
            Some(StreamEvent::Error(e)) => {
                eprintln!("✗ Stream error: {}", e);
            }
            None => break,
        }
    }

    eprintln!("Stream closed: {} written, {} failed", written, failed);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CommandLineInput::parse();

    let log_file = setup_logging(cli.verbose)
        .map_err(|e| anyhow::anyhow!("failed to set up logging: {}", e))?;
    log::info!("Logging to {}", log_file.display());

    let config = PipelineConfig::resolve(cli.into_options())?;
    let pipeline = Pipeline::for_config(&config)?;

    match pipeline.execute(config).await? {
        PipelineOutput::Completed(result) => {
            println!("{}", serde_json::to_string_pretty(&result.summary())?);
        }
        PipelineOutput::Streaming(stream) => follow_stream(stream).await?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setup_logging_creates_log_file() {
        let path = setup_logging(false).unwrap();
        assert!(path.ends_with(LOG_FILE_NAME));
        log::debug!("debug lines reach the file even when the console is quiet");
        assert!(path.exists());
    }
}
