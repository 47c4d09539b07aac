//! Server entry point.
//!
//! # Startup sequence
//!
//! 1. Parse CLI args, initialise logging.
//! 2. Load [`ServerConfig`] from disk (returns default on first run), with
//!    CLI flags overriding file values.
//! 3. Spawn the ASR worker pool, sharing one input queue.
//! 4. Spawn the merge/dispatch thread draining worker output.
//! 5. Run the WebSocket accept loop on the tokio runtime until terminated.

mod asr;
mod config;
mod context;
mod deadletter;
mod error;
mod frontend;
mod merger;
mod punctuation;
mod segmenter;

use std::net::SocketAddr;
use std::sync::mpsc as std_mpsc;
use std::sync::Arc;

use clap::Parser;
use log::{info, warn};

use asr::worker::AsrWorker;
use asr::{AsrEngine, NullAsrEngine};
use config::{ServerConfig, ServerPaths};
use context::ServerContext;
use frontend::SocketRegistry;
use merger::{BlockingPunctuationModel, FormatOptions, PunctuationModelSync, ResultTable};
use punctuation::{HttpPunctuationModel, NullPunctuationModel, PunctuationModel};

#[derive(Parser, Debug)]
#[command(name = "capswriter-server")]
struct Args {
    #[arg(long, help = "address to listen on, overrides settings.toml")]
    addr: Option<String>,

    #[arg(long, help = "port to listen on, overrides settings.toml")]
    port: Option<u16>,

    #[cfg(feature = "whisper")]
    #[arg(long, help = "path to a whisper GGML model file")]
    model: Option<String>,

    #[arg(long, help = "punctuation model HTTP endpoint, overrides settings.toml")]
    punctuation_endpoint: Option<String>,

    #[arg(long, help = "number of ASR worker threads, overrides settings.toml")]
    workers: Option<usize>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let paths = ServerPaths::discover();
    let mut config = ServerConfig::load(&paths).unwrap_or_else(|e| {
        eprintln!("failed to load config ({e}); using defaults");
        ServerConfig::default()
    });

    if let Some(addr) = args.addr {
        config.addr = addr;
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(endpoint) = args.punctuation_endpoint {
        config.punctuation_model = Some(endpoint);
    }
    if let Some(workers) = args.workers {
        config.worker_count = workers;
    }

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(config.log_level.clone())).init();
    info!("capswriter-server starting up");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let handle = runtime.handle().clone();

    let punctuation: Arc<dyn PunctuationModel> = match &config.punctuation_model {
        Some(endpoint) => Arc::new(HttpPunctuationModel::new(endpoint.clone())),
        None => Arc::new(NullPunctuationModel),
    };
    let punctuation_sync: Arc<dyn PunctuationModelSync + Send + Sync> =
        Arc::new(BlockingPunctuationModel {
            model: punctuation.clone(),
            handle,
        });

    let (task_tx, task_rx) = std_mpsc::channel();
    let (worker_out_tx, worker_out_rx) = std_mpsc::channel();

    #[cfg(feature = "whisper")]
    let engine_factory: Box<dyn Fn() -> Arc<dyn AsrEngine>> = match &args.model {
        Some(path) => {
            let path = path.clone();
            Box::new(move || match asr::whisper_engine::WhisperAsrEngine::load(&path, None) {
                Ok(engine) => Arc::new(engine),
                Err(e) => {
                    warn!("failed to load whisper model ({e}), falling back to a null engine");
                    Arc::new(NullAsrEngine)
                }
            })
        }
        None => Box::new(|| Arc::new(NullAsrEngine)),
    };
    #[cfg(not(feature = "whisper"))]
    let engine_factory: Box<dyn Fn() -> Arc<dyn AsrEngine>> = Box::new(|| Arc::new(NullAsrEngine));

    let workers = AsrWorker::spawn_pool(config.worker_count, engine_factory, task_rx, worker_out_tx);
    info!("spawned {} ASR worker thread(s)", workers.len());

    let registry = SocketRegistry::default();
    let table = Arc::new(ResultTable::default());
    let format_opts = FormatOptions {
        format_num: config.format_num,
        format_spell: config.format_spell,
    };
    let cut_fraction = config.cut_fraction;

    let dispatch_registry = registry.clone();
    std::thread::spawn(move || {
        merger::run_dispatch_loop(
            worker_out_rx,
            table,
            cut_fraction,
            format_opts,
            punctuation_sync,
            move |result| {
                let wire = capswriter_protocol::WireResult {
                    task_id: result.task_id.clone(),
                    duration: result.duration,
                    time_start: result.time_start,
                    time_submit: result.time_submit,
                    time_complete: result.time_complete,
                    text: result.text.clone(),
                    tokens: result.tokens.clone(),
                    timestamps: result.timestamps.clone(),
                    is_final: result.is_final,
                };
                dispatch_registry.dispatch(&result.socket_id, wire);
            },
        );
    });

    let addr: SocketAddr = format!("{}:{}", config.addr, config.port).parse()?;
    let context = Arc::new(ServerContext::new(config, paths, punctuation, task_tx));

    runtime.block_on(async move { frontend::serve(addr, context, registry).await })?;

    for worker in workers {
        worker.join();
    }
    Ok(())
}
