//! Karo CLI: scaffold, validate, preview, and render motion templates.
//!
//! Usage:
//!   karo init <ID>              Write a starter template definition
//!   karo validate <TEMPLATE>    Validate a definition (and a customization)
//!   karo info <TEMPLATE>        Show the catalog summary of a definition
//!   karo resolve <TEMPLATE>     Print the resolved composition
//!   karo frame <TEMPLATE>       Print the composed frame at a time
//!   karo preview <TEMPLATE>     Play a preview in real time
//!   karo plan <TEMPLATE>        Print the render plan
//!   karo render <TEMPLATE>      Submit a render job and wait for the result

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use karo_common::config::{AppConfig, LoggingConfig};

mod commands;

use commands::CustomizationArgs;

#[derive(Parser)]
#[command(
    name = "karo",
    about = "Motion template composition and preview",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a starter template definition
    Init {
        /// Template id
        id: String,

        /// Display name (defaults to the id)
        #[arg(long)]
        name: Option<String>,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },

    /// Validate a template definition
    Validate {
        /// Path to a definition, or a template id in the templates directory
        template: String,

        #[command(flatten)]
        customization: CustomizationArgs,
    },

    /// Show the catalog summary of a template
    Info {
        /// Path to a definition, or a template id in the templates directory
        template: String,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Resolve tokens and print the composition
    Resolve {
        /// Path to a definition, or a template id in the templates directory
        template: String,

        #[command(flatten)]
        customization: CustomizationArgs,
    },

    /// Compose a single frame
    Frame {
        /// Path to a definition, or a template id in the templates directory
        template: String,

        /// Composition time (seconds)
        #[arg(short, long, default_value = "0")]
        time: f64,

        /// Container width in display pixels (defaults to canvas width)
        #[arg(long)]
        width: Option<f64>,

        #[command(flatten)]
        customization: CustomizationArgs,
    },

    /// Play a preview in real time, logging layer transitions
    Preview {
        /// Path to a definition, or a template id in the templates directory
        template: String,

        /// Frame rate of the preview loop (defaults to the template's fps)
        #[arg(long)]
        fps: Option<u32>,

        /// Wall-clock seconds to run (defaults to one pass of the composition)
        #[arg(long)]
        seconds: Option<f64>,

        /// Container width in display pixels
        #[arg(long)]
        width: Option<f64>,

        /// Stop at the end instead of looping
        #[arg(long)]
        no_loop: bool,

        #[command(flatten)]
        customization: CustomizationArgs,
    },

    /// Print the render plan the server-side renderer would execute
    Plan {
        /// Path to a definition, or a template id in the templates directory
        template: String,

        /// Only list overlays enabled at this time (seconds)
        #[arg(long)]
        at: Option<f64>,

        #[command(flatten)]
        customization: CustomizationArgs,
    },

    /// Submit a render job to the render service
    Render {
        /// Path to a definition, or a template id in the templates directory
        template: String,

        /// Title for the customized copy
        #[arg(long)]
        title: Option<String>,

        /// Output format: mp4|webm|gif
        #[arg(long, default_value = "mp4")]
        format: String,

        /// Render quality: low|medium|high|ultra
        #[arg(long, default_value = "high")]
        quality: String,

        /// Return after submitting instead of polling to completion
        #[arg(long)]
        no_wait: bool,

        /// Give up after this many status polls
        #[arg(long)]
        max_polls: Option<u32>,

        #[command(flatten)]
        customization: CustomizationArgs,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load();

    let logging = if cli.verbose {
        LoggingConfig {
            level: "debug".to_string(),
            ..config.logging.clone()
        }
    } else {
        config.logging.clone()
    };
    karo_common::logging::init_logging(&logging);

    match cli.command {
        Commands::Init { id, name, output } => commands::init::run(id, name, output),
        Commands::Validate {
            template,
            customization,
        } => commands::validate::run(&config, template, customization),
        Commands::Info { template, json } => commands::info::run(&config, template, json),
        Commands::Resolve {
            template,
            customization,
        } => commands::resolve::run(&config, template, customization),
        Commands::Frame {
            template,
            time,
            width,
            customization,
        } => commands::frame::run(&config, template, time, width, customization),
        Commands::Preview {
            template,
            fps,
            seconds,
            width,
            no_loop,
            customization,
        } => {
            commands::preview::run(
                &config,
                template,
                fps,
                seconds,
                width,
                !no_loop,
                customization,
            )
            .await
        }
        Commands::Plan {
            template,
            at,
            customization,
        } => commands::plan::run(&config, template, at, customization),
        Commands::Render {
            template,
            title,
            format,
            quality,
            no_wait,
            max_polls,
            customization,
        } => {
            commands::render::run(
                &config,
                template,
                title,
                format,
                quality,
                !no_wait,
                max_polls,
                customization,
            )
            .await
        }
    }
}
