use anyhow::Result;
use std::path::Path;

use nimbus_core::config::NimbusConfig;

const REDACTED: &str = "[REDACTED]";

pub fn run(config_path: &Path, json: bool) -> Result<()> {
    let config = redacted(NimbusConfig::load(config_path)?);

    if json {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    println!("Config: {}", config_path.display());
    println!();
    match config.nimbus.upload_timeout_secs {
        Some(secs) => println!("  Upload timeout: {secs}s"),
        None => println!("  Upload timeout: none"),
    }
    println!();

    let configured = config.configured_providers();
    if configured.is_empty() {
        println!("  No providers configured.");
        println!();
        println!("  Add a provider section to {}:", config_path.display());
        println!("  [local]");
        println!("  root = \"/path/to/storage\"");
        return Ok(());
    }

    println!("  Providers ({}):", configured.len());
    if let Some(aws) = &config.aws {
        println!(
            "    - aws (profile={}, region={}, credentials={}{})",
            aws.profile,
            aws.region,
            aws.credentials_file,
            aws.endpoint_url
                .as_deref()
                .map(|e| format!(", endpoint={e}"))
                .unwrap_or_default()
        );
    }
    if let Some(azure) = &config.azure {
        println!(
            "    - azure (account={}, key={})",
            azure.account_name, azure.account_key
        );
    }
    if let Some(gcp) = &config.gcp {
        println!(
            "    - gcp (credentials={}, project={})",
            gcp.credentials_file,
            gcp.project_id.as_deref().unwrap_or("from credentials")
        );
    }
    if let Some(local) = &config.local {
        println!("    - local (root={})", local.root);
    }

    Ok(())
}

/// Replace secret values so the config can be printed.
fn redacted(mut config: NimbusConfig) -> NimbusConfig {
    if let Some(azure) = config.azure.as_mut() {
        azure.account_key = REDACTED.to_string();
    }
    config
}
