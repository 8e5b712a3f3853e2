//! # stratus: operator entry point for the NDN catalog
//!
//! - `stratus serve --config <path> --prefix <name>` boots the query
//!   adapter against the configured MySQL catalog.
//! - `stratus translate <json>` prints the SQL a JSON query maps to.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::sync::broadcast;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stratus_catalog::adapter::QueryAdapter;
use stratus_catalog::backend::MySqlBackend;
use stratus_catalog::config::Config;
use stratus_catalog::signer::{KeyChain, Signer};
use stratus_catalog::translate;
use stratus_ndn::{ChannelFace, Name};

#[derive(Parser)]
#[command(name = "stratus", version, about = "NDN catalog query service")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve catalog queries under a prefix.
    Serve {
        /// Path to the TOML configuration file.
        #[arg(long, default_value = "stratus.toml")]
        config: PathBuf,

        /// NDN prefix this catalog instance answers under.
        #[arg(long, default_value = "/catalog/lap")]
        prefix: String,
    },

    /// Print the SQL a JSON query translates to.
    Translate { query: String },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "stratus=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Serve { config, prefix } => serve(config, prefix).await,
        Commands::Translate { query } => translate_query(&query),
    }
}

async fn serve(config_path: PathBuf, prefix: String) {
    let config = match Config::load(&config_path) {
        Ok(config) => config,
        Err(error) => {
            tracing::error!("cannot load {}: {error}", config_path.display());
            std::process::exit(1);
        }
    };
    let adapter_config = config.query_adapter;

    let prefix = match Name::from_uri(&prefix) {
        Ok(prefix) => prefix,
        Err(error) => {
            tracing::error!("bad prefix: {error}");
            std::process::exit(1);
        }
    };
    let signing_id = match Name::from_uri(&adapter_config.signing_id) {
        Ok(name) => name,
        Err(error) => {
            tracing::error!("bad signingId: {error}");
            std::process::exit(1);
        }
    };

    let mut keychain = KeyChain::new();
    keychain.create_identity(signing_id.clone());
    let signer = Arc::new(Signer::new(keychain, Some(signing_id)));

    let backend = Arc::new(MySqlBackend::connect(&adapter_config.database));
    let face = Arc::new(ChannelFace::new());

    // Drain outbound packets; the forwarder transport attaches here.
    let mut outbound = face.subscribe();
    tokio::spawn(async move {
        loop {
            match outbound.recv().await {
                Ok(data) => tracing::info!("out: {}", data.name()),
                Err(broadcast::error::RecvError::Lagged(count)) => {
                    tracing::warn!("outbound stream lagged by {count} packets");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    let adapter = QueryAdapter::new(
        face,
        backend,
        signer,
        prefix,
        adapter_config.cache_capacity,
        adapter_config.max_concurrent_queries,
    );
    if let Err(error) = adapter.start().await {
        tracing::error!("cannot start query adapter: {error}");
        std::process::exit(1);
    }

    tokio::signal::ctrl_c().await.ok();
    tracing::info!("shutting down");
    adapter.shutdown().await;
}

fn translate_query(raw: &str) {
    match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(serde_json::Value::Object(members)) => {
            let translated = translate::json_to_sql(&members);
            println!("{}", translated.sql);
            if translated.autocomplete {
                eprintln!("(autocomplete query)");
            }
        }
        _ => {
            eprintln!("not a JSON object: {raw}");
            std::process::exit(1);
        }
    }
}
