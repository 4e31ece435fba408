use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use log::{debug, info, warn, LevelFilter};
use parking_lot::RwLock;
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    runtime::Handle,
};

use crate::{
    config::Config,
    controller::{Controller, KeyEvent, KeyOutcome},
    discovery::{find_media, TargetPolicy},
    dom::{Document, Element},
    media::MediaTarget,
    overlay::Overlay,
    settings::{SettingsStore, SharedSettings},
    shortcuts::{self, ActionKind},
    utils::format_clock,
};

const SETTINGS_POLL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Parser)]
#[command(version, about)]
pub struct Cli {
    #[arg(
        short,
        long,
        help = "The path to the config file. The default is `config.toml`."
    )]
    pub config: Option<String>,

    #[arg(
        short,
        long,
        help = "The settings file to read and store preferences in. This overrides the value from the config file."
    )]
    pub settings: Option<PathBuf>,

    #[arg(
        short,
        long,
        value_enum,
        help = "How to pick the media element when a page has several. This overrides the value from the config file."
    )]
    pub policy: Option<TargetPolicy>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Load a page and control its media with keys read from stdin.
    Run {
        #[arg(long, help = "The page description to load (TOML).")]
        page: PathBuf,
    },

    /// Show the stored preferences, or update them when any value is given.
    Options {
        #[arg(long)]
        min_speed: Option<f64>,

        #[arg(long)]
        max_speed: Option<f64>,

        #[arg(long)]
        speed_step: Option<f64>,
    },

    /// List the key bindings.
    Keys,
}

pub async fn start() -> anyhow::Result<()> {
    pretty_env_logger::formatted_builder()
        .filter_level(LevelFilter::Info)
        .parse_env("MEDIA_KEYS_LOG")
        .init();

    let cli = Cli::parse();
    let config = Config::from_cli_args(&cli)?;
    let store = SettingsStore::new(&config.settings_path);

    match cli.command {
        Command::Run { page } => run(&config, store, &page).await,
        Command::Options {
            min_speed,
            max_speed,
            speed_step,
        } => options(&store, min_speed, max_speed, speed_step),
        Command::Keys => {
            print_keys();
            Ok(())
        }
    }
}

async fn run(config: &Config, store: SettingsStore, page: &Path) -> anyhow::Result<()> {
    let doc = Document::read_path(page)
        .with_context(|| format!("Failed to load page {}", page.display()))?;
    info!(
        "Loaded page {} with {} media element(s)",
        page.display(),
        find_media(&doc.root()).len()
    );

    let settings: SharedSettings = Arc::new(RwLock::new(store.load()?));
    let watcher = tokio::spawn(watch_settings(store, Arc::clone(&settings)));

    let overlay = Overlay::new(Handle::current());
    let mut controller = Controller::new(settings, config.target_policy, overlay);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("Failed to read from stdin")? {
        if !handle_line(&mut controller, &doc, line.trim())? {
            break;
        }
    }

    watcher.abort();
    controller.feedback().hide();
    Ok(())
}

fn handle_line(
    controller: &mut Controller<Element, Overlay>,
    doc: &Document,
    line: &str,
) -> anyhow::Result<bool> {
    if let Some(command) = line.strip_prefix(':') {
        let mut args = command.split_whitespace();
        match (args.next(), args.next()) {
            (Some("quit"), _) => return Ok(false),
            (Some("state"), _) => {
                print_state(doc);
                if let Some(shown) = controller.feedback().current() {
                    println!(
                        "overlay: {} at ({}, {}) over a {}x{} element",
                        shown.indicator,
                        shown.left,
                        shown.top,
                        shown.anchor.width,
                        shown.anchor.height
                    );
                }
            }
            (Some("click"), Some(id)) => match doc.media_by_id(id) {
                Some(media) => {
                    debug!("User interacted with {media}");
                    controller.note_interaction(media);
                }
                None => warn!("No media element with id {id:?}"),
            },
            _ => warn!("Unknown command :{command}"),
        }
        return Ok(true);
    }

    for token in line.split_whitespace() {
        let event = match token.parse::<KeyEvent>() {
            Ok(event) => event,
            Err(err) => {
                warn!("Skipping key {token:?}: {err}");
                continue;
            }
        };
        let outcome = controller
            .handle_key(&event, &doc.root())
            .with_context(|| format!("Failed to handle key {token:?}"))?;
        match outcome {
            KeyOutcome::Ignored => debug!("Passing {token:?} through to the page"),
            KeyOutcome::Unbound => debug!("No binding for {token:?}"),
            KeyOutcome::NoTarget(action) => info!("No media to {}", action.kind),
            KeyOutcome::Applied { .. } => {}
        }
    }
    Ok(true)
}

async fn watch_settings(store: SettingsStore, settings: SharedSettings) {
    let mut interval = tokio::time::interval(SETTINGS_POLL_INTERVAL);
    let mut last_modified = store.modified();
    loop {
        interval.tick().await;
        let modified = store.modified();
        if modified == last_modified {
            continue;
        }
        last_modified = modified;
        match store.load() {
            Ok(reloaded) => {
                *settings.write() = reloaded;
                info!("Reloaded settings from {}", store.path().display());
            }
            Err(err) => warn!("Failed to reload settings: {err:?}"),
        }
    }
}

fn options(
    store: &SettingsStore,
    min_speed: Option<f64>,
    max_speed: Option<f64>,
    speed_step: Option<f64>,
) -> anyhow::Result<()> {
    let current = store.load()?;
    if min_speed.is_none() && max_speed.is_none() && speed_step.is_none() {
        println!("minSpeed  = {}", current.min_speed);
        println!("maxSpeed  = {}", current.max_speed);
        println!("speedStep = {}", current.speed_step);
        return Ok(());
    }

    let status = store.save(&current.with_speeds(min_speed, max_speed, speed_step))?;
    if status.is_error {
        return Err(anyhow!(status.text));
    }
    info!("{status}");
    Ok(())
}

fn print_keys() {
    let mut keys: Vec<char> = shortcuts::supported_keys().collect();
    keys.sort_unstable();
    for key in keys {
        let Some(kind) = shortcuts::binding(key) else {
            continue;
        };
        match (kind, shortcuts::seek_percentage(key)) {
            (ActionKind::SeekToPercentage, Some(percentage)) => {
                println!("{key}  seek to {:.0}%", percentage * 100.0)
            }
            _ => println!("{key}  {kind}"),
        }
    }
}

fn print_state(doc: &Document) {
    for media in find_media(&doc.root()) {
        let state = media.state();
        let duration = media
            .duration()
            .map(format_clock)
            .unwrap_or_else(|| "--:--".to_string());
        println!(
            "{media} {} {} / {duration} volume {:.0}%{} speed {}x",
            if state.paused { "paused" } else { "playing" },
            format_clock(state.current_time),
            state.volume * 100.0,
            if state.muted { " (muted)" } else { "" },
            state.playback_rate,
        );
    }
}
