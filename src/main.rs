use anyhow::Context;
use clap::Parser;
use screenshot_etl::domain::model::UploadedImage;
use screenshot_etl::utils::logger;
use screenshot_etl::{build_pipeline, AppConfig, Cli, Command, CsvSink, IngestionPipeline};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // 初始化日誌
    if cli.json_logs {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    let mut config = AppConfig::load(cli.config.as_deref()).context("invalid configuration")?;
    tracing::debug!("Loaded config: {:?}", config);

    match cli.command {
        Command::Serve { bind } => {
            if let Some(bind) = bind {
                config.server.bind_addr = bind;
            }
            let pipeline = build_pipeline(&config)?;
            screenshot_etl::server::serve(&config.server, pipeline).await?;
        }
        Command::Extract { image, csv_out } => {
            let pipeline = match csv_out {
                Some(path) => {
                    let model = Arc::new(screenshot_etl::OllamaVisionModel::new(&config.model)?);
                    Arc::new(IngestionPipeline::new(model, Arc::new(CsvSink::new(path))))
                }
                None => build_pipeline(&config)?,
            };

            let bytes = tokio::fs::read(&image)
                .await
                .with_context(|| format!("cannot read {}", image.display()))?;
            let filename = image
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| image.display().to_string());

            let outcome = pipeline.process(UploadedImage::new(bytes, filename)).await;
            if !outcome.is_success() {
                eprintln!("❌ {} was not forwarded", outcome.filename());
                std::process::exit(1);
            }
            println!("✅ {} processed", outcome.filename());
        }
    }

    Ok(())
}
