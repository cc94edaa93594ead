//! oxide-dispatch CLI
//!
//! Loads a route manifest and answers routing questions about it.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

use oxide_dispatch::Manifest;

/// Inspect a route manifest: resolve requests and build URLs.
#[derive(Parser)]
#[command(name = "oxide-dispatch")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Route manifest (JSON).
    #[arg(short, long, env = "OXIDE_ROUTES", default_value = "routes.json")]
    manifest: PathBuf,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show which route a request would reach.
    Resolve {
        /// Transport verb; anything but GET is read as POST unless
        /// `--method-override` names another verb.
        verb: String,

        /// Request path.
        path: String,

        /// Raw method-override field sent with a non-GET request.
        #[arg(long)]
        method_override: Option<String>,
    },

    /// Build the URL of a named route.
    Url {
        /// Route name or alias.
        name: String,

        /// Positional wildcard values.
        params: Vec<String>,
    },

    /// List every registered route.
    List,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let manifest = Manifest::from_path(&cli.manifest)
        .with_context(|| format!("loading manifest {}", cli.manifest.display()))?;
    let router = manifest.build().context("building router")?;
    info!(routes = router.routes().len(), "manifest loaded");

    let output = match cli.command {
        Commands::Resolve {
            verb,
            path,
            method_override,
        } => {
            let verb =
                oxide_dispatch::effective_verb(Some(verb.as_str()), method_override.as_deref());
            match router.resolve(&verb, &path) {
                Some(resolved) => json!({
                    "verb": verb,
                    "path": path,
                    "route": resolved.route.summary(),
                    "params": resolved.params,
                }),
                None => {
                    info!(verb = %verb, path = %path, "no route matched");
                    json!({ "verb": verb, "path": path, "route": null })
                }
            }
        }
        Commands::Url { name, params } => {
            let url = router.url_for(&name, &params)?;
            json!({ "name": name, "url": url })
        }
        Commands::List => {
            let routes: Vec<_> = router.routes().iter().map(|r| r.summary()).collect();
            json!(routes)
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
