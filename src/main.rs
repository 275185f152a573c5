//! CT slicer - decode CT volumes and render windowed slices.
//!
//! This binary wires the scan store, loader, volume cache and slice service
//! together and runs one command against them.

use clap::Parser;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ct_slicer::{
    config::{Cli, Command, Config, InfoArgs, SliceArgs},
    CtService, ErrorResponse, JpegSliceEncoder, LocalScanStore, ScanLoader, SliceRequest,
    VolumeCache, VolumeError,
};

type Service = CtService<ScanLoader<LocalScanStore>>;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.config.verbose);

    if let Err(e) = cli.config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    let service = build_service(&cli.config);

    let result = match cli.command {
        Command::Info(args) => run_info(&service, args).await,
        Command::Slice(args) => run_slice(&service, args).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report_error(&e);
            ExitCode::FAILURE
        }
    }
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "ct_slicer=debug"
    } else {
        "ct_slicer=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn build_service(config: &Config) -> Service {
    info!(
        data_dir = %config.data_dir.display(),
        source_prefix = %config.source_prefix,
        cache_volumes = config.cache_volumes,
        jpeg_quality = config.jpeg_quality,
        "Starting CT slicer"
    );

    let store = LocalScanStore::with_prefix(&config.data_dir, &config.source_prefix);
    let cache = VolumeCache::with_capacity(ScanLoader::new(store), config.cache_volumes);

    CtService::new(cache)
        .with_encoder(JpegSliceEncoder::new(config.jpeg_quality))
        .with_cache_max_age(config.cache_max_age)
}

/// Print the error body the request-handling layer would return.
///
/// Internal errors only expose a generic message, so their detail is logged.
fn report_error(err: &VolumeError) -> ErrorResponse {
    if !err.is_client_error() {
        error!(error_code = err.error_code(), detail = %err, "Command failed");
    }

    let body = ErrorResponse::from(err);
    match serde_json::to_string_pretty(&body) {
        Ok(json) => eprintln!("{}", json),
        Err(_) => eprintln!("{}: {}", body.error, body.message),
    }
    body
}

// =============================================================================
// Info Command
// =============================================================================

async fn run_info(service: &Service, args: InfoArgs) -> Result<(), VolumeError> {
    let info = service.volume_info(&args.scan_id).await?;
    let json = serde_json::to_string_pretty(&info)
        .map_err(|e| VolumeError::internal(format!("failed to serialize volume info: {}", e)))?;
    println!("{}", json);
    Ok(())
}

// =============================================================================
// Slice Command
// =============================================================================

async fn run_slice(service: &Service, args: SliceArgs) -> Result<(), VolumeError> {
    tokio::fs::create_dir_all(&args.output_dir)
        .await
        .map_err(|e| {
            VolumeError::internal(format!(
                "cannot create {}: {}",
                args.output_dir.display(),
                e
            ))
        })?;

    for &index in &args.indices {
        let request = SliceRequest::from_params(&args.scan_id, &args.axis, index, args.wc, args.ww)?;
        let response = service.render_slice(&request).await?;

        let path = args.output_dir.join(args.file_name(index));
        tokio::fs::write(&path, &response.data)
            .await
            .map_err(|e| VolumeError::internal(format!("cannot write {}: {}", path.display(), e)))?;

        info!(
            path = %path.display(),
            width = response.width,
            height = response.height,
            bytes = response.data.len(),
            "Wrote slice"
        );
        println!("{}", path.display());
    }

    Ok(())
}
