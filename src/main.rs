use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use ellips2ortho::cli::Args;
use ellips2ortho::lookup::build_http_client;
use ellips2ortho::{BatchOrchestrator, GeoNamesClient, GeoidModel, NgsGeoidClient, Upload};
use std::process;
use tracing::debug;

fn main() {
    let args = Args::parse();

    if args.list_geoids {
        list_geoid_models();
        process::exit(0);
    }

    setup_logging(&args);

    let runtime = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
        eprintln!("Failed to create async runtime: {}", e);
        process::exit(1);
    });

    match runtime.block_on(run(args)) {
        Ok(()) => process::exit(0),
        Err(error) => {
            eprintln!("{} {:#}", "Error:".bright_red().bold(), error);
            process::exit(1);
        }
    }
}

async fn run(args: Args) -> Result<()> {
    let config = args.service_config();
    let client = build_http_client()?;
    let geoid = NgsGeoidClient::from_config(client.clone(), &config);
    let resolver = GeoNamesClient::from_config(client, &config);
    let mut orchestrator = BatchOrchestrator::new(geoid, resolver, &config)?;

    let mut uploads = Vec::with_capacity(args.files.len());
    for path in &args.files {
        let contents = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        uploads.push(Upload::new(name, contents));
    }

    println!("{}", "Ellipsoidal to Orthometric Heights".bright_green().bold());
    println!(
        "  {} {}",
        "Files:".bright_cyan(),
        uploads.len().to_string().bright_white()
    );
    if let Some(model) = args.geoid {
        println!("  {} {} (code {})", "Geoid:".bright_cyan(), model, model.code());
    }
    if let Some(unit) = args.units {
        println!("  {} {}", "Units:".bright_cyan(), unit);
    }

    let bundle = orchestrator
        .process(&uploads, args.geoid, args.units)
        .await?;

    tokio::fs::write(&args.output, &bundle.data)
        .await
        .with_context(|| format!("Failed to write {}", args.output.display()))?;
    debug!("Wrote {} bytes to {}", bundle.data.len(), args.output.display());

    println!("\n{}", "Conversion Summary".bright_green().bold());
    println!(
        "  {} {}ms",
        "Time elapsed:".bright_cyan(),
        bundle.stats.processing_time.as_millis().to_string().bright_white()
    );
    println!(
        "  {} {}",
        "Files converted:".bright_cyan(),
        bundle.stats.files_processed.to_string().bright_white()
    );
    println!(
        "  {} {}",
        "Rows converted:".bright_cyan(),
        bundle.stats.total_rows.to_string().bright_white().bold()
    );
    for entry in &bundle.entries {
        println!("    {}", entry.name.bright_black());
    }
    println!(
        "  {} {} ({})",
        "Archive:".bright_cyan(),
        args.output.display().to_string().bright_white().bold(),
        bundle.mime_type
    );

    Ok(())
}

/// Set up structured logging based on CLI arguments
fn setup_logging(args: &Args) {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = args.get_log_level();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("ellips2ortho={}", log_level)));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_level(true)
                .with_timer(fmt::time::uptime())
                .with_writer(std::io::stderr),
        )
        .init();

    debug!("Logging initialized at level: {}", log_level);
}

/// Print the supported geoid models with their service codes
fn list_geoid_models() {
    println!("{}", "Supported geoid models:".bright_green().bold());
    println!();
    for model in GeoidModel::ALL {
        println!(
            "  {:>2}. {:<10} {}",
            model.code().to_string().bright_yellow().bold(),
            model.name().bright_cyan(),
            if model.description() != model.name() {
                model.description().bright_black().to_string()
            } else {
                String::new()
            }
        );
    }
    println!();
    println!("To select the correct geoid model for your application, see https://geodesy.noaa.gov/GEOID/");
}
