use std::path::PathBuf;

use anyhow::{Context, Result};
use bistro_cli::{init_tracing, read_upload_request};
use bistro_core::{PreprocessPolicy, UploadConfig};
use bistro_processing::UploadOrchestrator;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "publish_image")]
#[command(about = "Upload restaurant images and print their public URLs")]
struct Args {
    /// Image files, uploaded in order (e.g. main image then additional images)
    #[arg(required = true, value_name = "FILE")]
    files: Vec<PathBuf>,

    /// Preprocess policy: compress or passthrough (default: from UPLOAD_POLICY)
    #[arg(long, value_name = "POLICY")]
    policy: Option<PreprocessPolicy>,

    /// Object key prefix (default: from UPLOAD_KEY_PREFIX)
    #[arg(long, value_name = "PREFIX")]
    prefix: Option<String>,

    /// Print results as JSON instead of one URL per line
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let args = Args::parse();

    let mut config = UploadConfig::from_env().context(
        "Failed to load upload configuration. Set GCS_BUCKET, GCS_CLIENT_EMAIL and GCS_PRIVATE_KEY",
    )?;
    if let Some(policy) = args.policy {
        config.select_policy(policy);
    }
    if let Some(prefix) = args.prefix {
        config.key_prefix = prefix.trim_matches('/').to_string();
    }

    let orchestrator =
        UploadOrchestrator::from_config(&config).context("Invalid key generator settings")?;

    // Sequential, so later files reuse the first token.
    let mut results = Vec::with_capacity(args.files.len());
    for path in &args.files {
        let request = read_upload_request(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let result = orchestrator
            .upload(request)
            .await
            .with_context(|| format!("Failed to publish {}", path.display()))?;

        if !args.json {
            println!("{}", result.public_url);
        }
        results.push(result);
    }

    tracing::info!(count = results.len(), bucket = %config.bucket(), "Publishing finished");

    if args.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    }

    Ok(())
}
