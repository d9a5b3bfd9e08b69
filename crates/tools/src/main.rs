use std::path::PathBuf;

use clap::{Parser, Subcommand};
use foundation::math::Size;
use tracing::info;
use tracing_subscriber::EnvFilter;

use tools::{RenderView, data_bounds, load_config, load_data, parse_center, render, write_png};

#[derive(Debug, Parser)]
#[command(name = "atlas-heat", about = "Render weighted points as a heatmap")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Render a dataset to a PNG.
    Render {
        /// JSON records, or `{"max", "min", "data"}`.
        #[arg(long)]
        data: PathBuf,
        /// Overlay config JSON (latField, radius, scaleRadius, ...).
        #[arg(long)]
        config: Option<PathBuf>,
        /// View center as LAT,LNG. Omit to fit the view to the data.
        #[arg(long)]
        center: Option<String>,
        #[arg(long, default_value_t = 2.0)]
        zoom: f64,
        #[arg(long, default_value_t = 512)]
        width: u32,
        #[arg(long, default_value_t = 512)]
        height: u32,
        #[arg(long)]
        out: PathBuf,
    },
    /// Print the geographic bounds of a dataset as JSON.
    Bounds {
        #[arg(long)]
        data: PathBuf,
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    if let Err(e) = real_main() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn real_main() -> Result<(), String> {
    match Cli::parse().command {
        Command::Render {
            data,
            config,
            center,
            zoom,
            width,
            height,
            out,
        } => {
            let config = load_config(config.as_deref())?;
            let data = load_data(&data)?;
            let center = center.as_deref().map(parse_center).transpose()?;
            let frame = render(
                config,
                &data,
                RenderView {
                    center,
                    zoom,
                    size: Size::new(width, height),
                },
            )?;
            write_png(&frame, &out)?;
            info!("wrote {out:?} ({} visible points)", frame.visible_points);
            Ok(())
        }
        Command::Bounds { data, config } => {
            let config = load_config(config.as_deref())?;
            let data = load_data(&data)?;
            let bounds = data_bounds(config, &data)?;
            let json = serde_json::to_string_pretty(&bounds)
                .map_err(|e| format!("encode bounds: {e}"))?;
            println!("{json}");
            Ok(())
        }
    }
}
