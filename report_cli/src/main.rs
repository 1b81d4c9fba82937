//! # reportgen
//!
//! Render TOML report manifests with `report-render`.
//!
//! ## Usage
//!
//! ```bash
//! # Local HTML tree under ./report/<name>/<timestamp>/
//! reportgen render weekly.toml
//!
//! # Lookup keys the renderers will assign
//! reportgen keys weekly.toml
//!
//! # Email payload written to an outbox in the run directory
//! reportgen email weekly.toml --to ops@example.com --subject "Weekly"
//! ```

mod manifest;
mod outbox;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use report_render::{EmailRenderer, LocalRenderer};
use tracing::info;

use crate::manifest::Manifest;
use crate::outbox::OutboxTransport;

#[derive(Parser, Debug)]
#[command(name = "reportgen")]
#[command(about = "Render report manifests to a local HTML tree or an email outbox")]
#[command(version)]
struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a manifest to report.html plus its Files/ directory
    Render {
        /// Report manifest (TOML)
        manifest: PathBuf,
        /// Output root; the run lands in <DIR>/<report name>/<timestamp>/
        #[arg(short, long, default_value = "report")]
        output: PathBuf,
    },
    /// Print the lookup key assigned to every item
    Keys {
        /// Report manifest (TOML)
        manifest: PathBuf,
    },
    /// Build the email payload and write it to an outbox
    Email {
        /// Report manifest (TOML)
        manifest: PathBuf,
        /// Recipient address (repeatable)
        #[arg(long = "to", required = true)]
        to: Vec<String>,
        /// Subject line (default: report name)
        #[arg(long)]
        subject: Option<String>,
        /// Output root; the run lands in <DIR>/<report name>/<timestamp>/
        #[arg(short, long, default_value = "report")]
        output: PathBuf,
    },
}

fn render(manifest_path: &Path, output: &Path) -> Result<()> {
    let manifest = Manifest::load_from_path(manifest_path)?;
    let report = manifest.build_report()?;

    let mut renderer = LocalRenderer::new(manifest.render.clone());
    for component in &manifest.widgets {
        renderer.register_widget(component);
    }
    let rendered = renderer
        .render(&report, output)
        .with_context(|| format!("Failed to render `{}`", report.name()))?;

    println!("{}", rendered.html_path.display());
    Ok(())
}

fn keys(manifest_path: &Path) -> Result<()> {
    let report = Manifest::load_from_path(manifest_path)?.build_report()?;
    let keyed = report.uniquely_keyed_items();

    for entry in &keyed.items {
        println!(
            "{}\t{}\t{}",
            entry.lookup_key,
            entry.item.kind().variant_name(),
            entry.item.name()
        );
    }
    // collisions were already logged while keying
    Ok(())
}

fn email(manifest_path: &Path, to: &[String], subject: Option<&str>, output: &Path) -> Result<()> {
    let manifest = Manifest::load_from_path(manifest_path)?;
    let report = manifest.build_report()?;
    let subject = subject.unwrap_or(report.name());

    let renderer = EmailRenderer::with_transport(OutboxTransport, manifest.render.clone());
    let sent = renderer
        .render(&report, to, subject, output)
        .with_context(|| format!("Failed to email `{}`", report.name()))?;

    println!("{}", sent.run_dir.display());
    info!(
        "{} inline images, {} attachments",
        sent.payload.images.len(),
        sent.payload.attachments.len()
    );
    Ok(())
}

fn run(args: Args) -> Result<()> {
    match args.command {
        Command::Render { manifest, output } => render(&manifest, &output),
        Command::Keys { manifest } => keys(&manifest),
        Command::Email {
            manifest,
            to,
            subject,
            output,
        } => email(&manifest, &to, subject.as_deref(), &output),
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    // Logs go to stderr; stdout carries paths and keys
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| args.log_level.parse().unwrap_or_default()),
        )
        .init();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("[reportgen] Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
