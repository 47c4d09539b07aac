//! Client entry point.
//!
//! # Startup sequence
//!
//! 1. Parse CLI args, initialise logging.
//! 2. Load [`AppConfig`] (returns defaults on first run).
//! 3. File-mode: if one or more file paths were given, connect, transcribe
//!    each, and exit — no hotkey/audio-capture machinery is started.
//! 4. Mic-mode (default): load the hot-word engine and its file watcher,
//!    start continuous audio capture, connect to the server, arm the
//!    configured shortcuts, and run the hotkey event loop until SIGINT.

mod audio;
mod config;
mod file_transcribe;
mod hotkey;
mod inject;
mod sink;
mod srt;
mod wire;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use capswriter_protocol::Source;
use capswriter_textproc::hotword::{HotwordConfig, HotwordPaths, HotwordWatcher};
use capswriter_textproc::SharedHotwordEngine;
use clap::Parser;
use log::{error, info, warn};
use tokio::sync::mpsc;

use audio::{AudioCapture, RecordingSession};
use config::AppConfig;
use hotkey::{parse_binding, Action, BoundKey, HotkeyEvent, HotkeyListener, ShortcutState};
use sink::{ResultSink, SinkConfig};
use wire::WireClient;

#[derive(Parser, Debug)]
#[command(name = "capswriter-client")]
struct Args {
    #[arg(long, help = "server address, overrides settings.toml")]
    addr: Option<String>,

    #[arg(long, help = "server port, overrides settings.toml")]
    port: Option<u16>,

    #[arg(help = "audio/video files to transcribe; switches to file mode")]
    files: Vec<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = AppConfig::load().unwrap_or_else(|e| {
        eprintln!("failed to load config ({e}); using defaults");
        AppConfig::default()
    });
    if let Some(addr) = args.addr.clone() {
        config.addr = addr;
    }
    if let Some(port) = args.port {
        config.port = port;
    }

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    info!("capswriter-client starting up");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    if !args.files.is_empty() {
        return runtime.block_on(run_file_mode(config, args.files));
    }

    runtime.block_on(run_mic_mode(config))
}

async fn run_file_mode(config: AppConfig, files: Vec<PathBuf>) -> anyhow::Result<()> {
    let wire = WireClient::connect(&config.addr, config.port).await?;
    for file in files {
        info!("transcribing {}", file.display());
        if let Err(e) = file_transcribe::transcribe_file(
            &wire,
            &file,
            config.file_seg_duration,
            config.file_seg_overlap,
        )
        .await
        {
            error!("failed to transcribe {}: {e}", file.display());
        }
    }
    Ok(())
}

async fn run_mic_mode(config: AppConfig) -> anyhow::Result<()> {
    let paths = config::AppPaths::new();
    std::fs::create_dir_all(&paths.config_dir).ok();

    let hotword_paths = HotwordPaths {
        zh: paths.hot_zh_file.clone(),
        en: paths.hot_en_file.clone(),
        rule: paths.hot_rule_file.clone(),
    };
    let hotword_config = HotwordConfig {
        hot_zh: config.hot_zh,
        hot_en: config.hot_en,
        hot_rule: config.hot_rule,
    };
    let engine = capswriter_textproc::hotword::load_engine(&hotword_paths, hotword_config);
    let shared_engine = SharedHotwordEngine::new(engine);
    let _watcher = HotwordWatcher::start(hotword_paths, hotword_config, shared_engine.clone());

    let data_dir = paths.config_dir.join("transcripts");
    let sink = Arc::new(ResultSink::new(
        shared_engine,
        SinkConfig {
            trash_punc: config.trash_punc.clone(),
            paste: config.paste,
            restore_clip: config.restore_clip,
            audio_name_len: config.audio_name_len,
            data_dir: data_dir.clone(),
            keywords_file: paths.keywords_file.clone(),
        },
    ));

    let capture = AudioCapture::new()?;
    let _stream = capture.start()?;
    info!("audio capture started, {} channel(s)", capture.channels());

    let wire = WireClient::connect(&config.addr, config.port).await?;
    info!("connected to {}:{}", config.addr, config.port);

    let default_threshold = config.threshold;
    let mut states: Vec<ShortcutState> = Vec::new();
    let mut bindings: Vec<(usize, BoundKey, bool)> = Vec::new();
    let mut bound_keys: HashMap<usize, BoundKey> = HashMap::new();

    for (index, shortcut) in config.shortcuts.iter().enumerate() {
        if !shortcut.enabled {
            continue;
        }
        let Some(key) = parse_binding(shortcut) else {
            warn!("unrecognised shortcut key {:?}, skipping", shortcut.key);
            continue;
        };
        states.push(ShortcutState::new(shortcut, default_threshold));
        bound_keys.insert(index, key);
        bindings.push((index, key, shortcut.suppress));
    }

    let (hotkey_tx, mut hotkey_rx) = mpsc::channel::<HotkeyEvent>(64);
    let listener = HotkeyListener::start(bindings, hotkey_tx);

    let mut active_session: Option<(usize, RecordingSession)> = None;

    while let Some(event) = hotkey_rx.recv().await {
        let Some(shortcut) = config.shortcuts.get(event.index) else {
            continue;
        };
        let Some(state) = states.get_mut(event.index) else {
            continue;
        };
        let now = Instant::now();
        let action = if event.down {
            state.on_key_down(now)
        } else {
            state.on_key_up(now)
        };

        let Some(action) = action else { continue };

        match action {
            Action::Begin => {
                if active_session.is_some() {
                    warn!("shortcut {} fired while another recording is active, ignoring", event.index);
                    continue;
                }
                let task_id = uuid::Uuid::new_v4().to_string();
                let audio_path = if config.save_audio {
                    Some(audio::recorder::provisional_audio_path(&data_dir, &task_id))
                } else {
                    None
                };
                let session = RecordingSession::start(
                    &capture,
                    task_id.clone(),
                    Source::Mic,
                    config.mic_seg_duration,
                    config.mic_seg_overlap,
                    wire.chunk_sender(),
                    audio_path.clone(),
                );
                let mut result_rx = wire.subscribe(task_id.clone());
                let sink = sink.clone();
                tokio::spawn(async move {
                    while let Some(result) = result_rx.recv().await {
                        if result.is_final {
                            sink.handle_final(&result, audio_path.as_deref());
                            break;
                        }
                    }
                });
                active_session = Some((event.index, session));
            }
            Action::Cancel => {
                if let Some((index, session)) = active_session.take() {
                    if index == event.index {
                        session.cancel();
                    } else {
                        active_session = Some((index, session));
                    }
                }
                if ShortcutState::should_emulate_tap(shortcut, Action::Cancel) {
                    if let Some(key) = bound_keys.get(&event.index) {
                        listener.emulate_tap(*key);
                    }
                }
                maybe_restore_key(&listener, shortcut, &bound_keys, event.index);
            }
            Action::Finish => {
                if let Some((index, session)) = active_session.take() {
                    if index == event.index {
                        // Flushes the final chunk; the listener task
                        // spawned in `Begin` picks up the resulting
                        // `is_final` WireResult and runs the sink.
                        let _ = session.finish().await;
                    } else {
                        active_session = Some((index, session));
                    }
                }
                maybe_restore_key(&listener, shortcut, &bound_keys, event.index);
            }
        }
    }

    Ok(())
}

fn maybe_restore_key(
    listener: &HotkeyListener,
    shortcut: &config::ShortcutConfig,
    bound_keys: &HashMap<usize, BoundKey>,
    index: usize,
) {
    if shortcut.restore && shortcut.suppress {
        if let Some(key) = bound_keys.get(&index) {
            listener.restore_key(*key);
        }
    }
}
