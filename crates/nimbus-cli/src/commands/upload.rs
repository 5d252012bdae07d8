use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::path::Path;
use std::time::Duration;

use nimbus_core::Payload;
use nimbus_core::config::NimbusConfig;
use nimbus_core::types::validate_provider_names;
use nimbus_storage::factory::init_uploaders;
use nimbus_storage::{Coordinator, CoordinatorError, UploadReport, UploadRequest};

pub async fn run(
    file: &Path,
    bucket: &str,
    key: Option<&str>,
    provider_names: &[String],
    config_path: &Path,
    json: bool,
) -> Result<()> {
    let kinds = validate_provider_names(provider_names)?;
    if bucket.trim().is_empty() {
        anyhow::bail!("--bucket must not be empty");
    }
    let key = object_key(file, key)?;

    let config = NimbusConfig::load(config_path)
        .with_context(|| format!("loading config {}", config_path.display()))?;
    let coordinator = Coordinator::new(init_uploaders(&kinds, &config).await?)?;

    let payload = Payload::from_file(file).await?;
    let bytes = payload.len();
    let sha256 = payload.sha256_hex();

    let mut request = UploadRequest::new(bucket, key.clone(), payload);
    if let Some(timeout) = config.nimbus.upload_timeout() {
        request = request.with_timeout(timeout);
    }

    let cancel = request.cancellation_token();
    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted, cancelling uploads");
            cancel.cancel();
        }
    });

    let pb = if json {
        ProgressBar::hidden()
    } else {
        ProgressBar::new_spinner()
    };
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message(format!(
        "Uploading {} ({bytes} bytes) to {} provider(s)",
        file.display(),
        coordinator.len()
    ));
    pb.enable_steady_tick(Duration::from_millis(100));

    let outcome = coordinator.dispatch(&request).await;
    ctrl_c.abort();
    pb.finish_and_clear();

    let report = match outcome {
        Ok(report) => report,
        Err(CoordinatorError::PartialFailure(report) | CoordinatorError::AllFailed(report)) => {
            report
        }
        Err(err) => return Err(err.into()),
    };

    if json {
        let summary = JsonReport::new(bucket, &key, bytes, &sha256, &report);
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        for line in outcome_lines(&report) {
            println!("{line}");
        }
        println!("{}", summary_line(&report));
    }

    if !report.is_success() {
        anyhow::bail!(
            "{} of {} uploads failed",
            report.failed.len(),
            report.total()
        );
    }
    Ok(())
}

/// Object key to write: the explicit `--key`, or the file name.
fn object_key(file: &Path, key: Option<&str>) -> Result<String> {
    let key = match key {
        Some(key) => key.to_string(),
        None => file
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .with_context(|| {
                format!("cannot derive an object key from {}, pass --key", file.display())
            })?,
    };
    if key.trim().is_empty() {
        anyhow::bail!("object key must not be empty");
    }
    Ok(key)
}

fn outcome_lines(report: &UploadReport) -> Vec<String> {
    let mut lines: Vec<String> = report
        .succeeded
        .iter()
        .map(|provider| format!("  ok      {provider}"))
        .collect();
    lines.extend(
        report
            .failed
            .iter()
            .map(|err| format!("  FAILED  {}: {:#}", err.provider, err.cause)),
    );
    lines
}

fn summary_line(report: &UploadReport) -> String {
    format!(
        "{}/{} uploads succeeded",
        report.succeeded.len(),
        report.total()
    )
}

#[derive(Serialize)]
struct JsonReport<'a> {
    bucket: &'a str,
    key: &'a str,
    bytes: usize,
    sha256: &'a str,
    succeeded: Vec<&'a str>,
    failed: Vec<JsonFailure<'a>>,
}

#[derive(Serialize)]
struct JsonFailure<'a> {
    provider: &'a str,
    error: String,
}

impl<'a> JsonReport<'a> {
    fn new(
        bucket: &'a str,
        key: &'a str,
        bytes: usize,
        sha256: &'a str,
        report: &'a UploadReport,
    ) -> Self {
        Self {
            bucket,
            key,
            bytes,
            sha256,
            succeeded: report.succeeded.iter().map(|p| p.as_str()).collect(),
            failed: report
                .failed
                .iter()
                .map(|err| JsonFailure {
                    provider: err.provider.as_str(),
                    error: format!("{:#}", err.cause),
                })
                .collect(),
        }
    }
}
