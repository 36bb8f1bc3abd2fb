mod api;
mod cli;
mod fallback;
mod logging;
mod notify;
mod render;
mod settings;
mod thread;

#[cfg(test)]
mod test_utils;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing::{debug, info, warn};

use api::{CommandExtractor, LocalAdapter, ProxyClient, RemoteAdapter};
use cli::{Cli, Commands, ConfigArgs, ConfigCommands};
use fallback::FallbackCoordinator;
use notify::{StderrNotifier, SystemClipboard};
use settings::{Settings, SettingsSource};
use thread::ThreadManager;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(Commands::Config(config_args)) = &cli.command {
        return handle_config_command(config_args, &cli);
    }
    run(cli).await
}

fn handle_config_command(args: &ConfigArgs, cli: &Cli) -> Result<()> {
    match args.command {
        ConfigCommands::Path => {
            if let Some(config_dir) = settings::config_dir(cli.config_dir.as_ref()) {
                println!("{}", settings::settings_path(&config_dir).display());
            } else {
                eprintln!("Could not determine config directory");
            }
        }
        ConfigCommands::Show => {
            let settings = load_settings(cli.config_dir.as_ref())?;
            let toml =
                toml::to_string_pretty(&settings).context("Failed to serialize settings")?;
            println!("{}", toml);
        }
        ConfigCommands::Init => {
            let Some(config_dir) = settings::config_dir(cli.config_dir.as_ref()) else {
                bail!("Could not determine config directory");
            };
            let path = settings::settings_path(&config_dir);
            if path.exists() {
                bail!("{} already exists", path.display());
            }
            Settings::default().save(&path)?;
            println!("Wrote {}", path.display());
        }
    }
    Ok(())
}

fn load_settings(custom_dir: Option<&PathBuf>) -> Result<Settings> {
    match settings::config_dir(custom_dir) {
        Some(dir) => Settings::load(&settings::settings_path(&dir)),
        None => Ok(Settings::default()),
    }
}

/// Settings file values with command-line overrides applied.
fn effective_settings(cli: &Cli) -> Settings {
    let mut settings = load_settings(cli.config_dir.as_ref()).unwrap_or_else(|e| {
        warn!("ignoring settings file: {e:#}");
        eprintln!("Warning: {:#}", e);
        Settings::default()
    });
    if let Some(backend) = cli.backend {
        settings.backend_preference = backend;
    }
    if cli.no_fallback {
        settings.backend_fallback = false;
    }
    if let Some(instance) = &cli.instance {
        settings.remote_instance = instance.clone();
    }
    settings
}

fn build_coordinator(settings: &Settings, copy_errors: bool) -> Result<FallbackCoordinator> {
    let Some(extractor) = CommandExtractor::new(&settings.extractor) else {
        bail!("extractor must name a program");
    };
    let proxy = ProxyClient::new(&settings.remote_instance, settings.request_timeout())?;
    debug!(instance = proxy.instance(), "proxy client ready");

    Ok(FallbackCoordinator::new(
        LocalAdapter::new(Arc::new(extractor)),
        RemoteAdapter::new(Arc::new(proxy)),
        Arc::new(StderrNotifier::new(copy_errors)),
        Arc::new(SystemClipboard::new()),
    ))
}

async fn run(cli: Cli) -> Result<()> {
    let Some(video_id) = cli.video_id.clone() else {
        bail!("a video ID is required (see --help)");
    };

    let config_dir = settings::config_dir(cli.config_dir.as_ref());
    let _log_guard = logging::init(config_dir.as_deref(), cli.verbose)?;

    let settings = effective_settings(&cli);
    let snapshot = settings.snapshot();
    info!(
        %video_id,
        preference = %snapshot.preference,
        fallback = snapshot.fallback_enabled,
        "opening comment thread"
    );

    let coordinator = build_coordinator(&settings, cli.copy_errors)?;
    let mut thread = ThreadManager::new(video_id, snapshot, coordinator);

    for _ in 0..cli.pages {
        if !thread.has_more_pages() {
            break;
        }
        let before = thread.next_page_token().map(str::to_owned);
        thread.load_more_top_level();
        thread.settle().await;
        // A failed page leaves the token untouched; retrying would repeat it.
        if thread.next_page_token() == before.as_deref() {
            break;
        }
    }

    if cli.replies {
        thread.expand_all_replies();
        thread.settle().await;
    }

    let comments = thread.comments().to_vec();
    let visible = thread.is_visible();
    thread.teardown();

    if !visible {
        bail!("no comments could be loaded");
    }

    if cli.json {
        let json =
            serde_json::to_string_pretty(&comments).context("Failed to serialize comments")?;
        println!("{}", json);
    } else {
        print!("{}", render::render_thread(&comments, cli.width));
    }
    Ok(())
}
