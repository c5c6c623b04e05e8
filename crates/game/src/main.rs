mod harness;
#[cfg(test)]
mod scenarios;

use std::path::PathBuf;

use landfall::{run_client, ClientConfig, SessionConfig, WorldSetup};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const SAVE_DIR_ENV_VAR: &str = "LANDFALL_SAVE_DIR";
const AI_PLAYERS_ENV_VAR: &str = "LANDFALL_AI_PLAYERS";
const FIXTURE_ENV_VAR: &str = "LANDFALL_FIXTURE";

fn main() {
    init_tracing();
    info!("=== Landfall Startup ===");

    let setup = match resolve_setup_from_env() {
        Ok(setup) => setup,
        Err(message) => {
            error!(error = %message, "startup_failed");
            std::process::exit(1);
        }
    };

    let config = ClientConfig {
        session: SessionConfig {
            save_dir: resolve_save_dir_from_env(),
            ..SessionConfig::default()
        },
        ..ClientConfig::default()
    };

    if let Err(err) = run_client(config, setup) {
        error!(error = %err, "startup_failed");
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

fn resolve_setup_from_env() -> Result<WorldSetup, String> {
    if let Ok(name) = std::env::var(FIXTURE_ENV_VAR) {
        let xml = harness::fixture_xml(&name)
            .ok_or_else(|| format!("no fixture named '{name}' ({FIXTURE_ENV_VAR})"))?;
        return WorldSetup::from_xml(xml).map_err(|error| error.to_string());
    }
    Ok(WorldSetup::dev_map(parse_ai_players_from_env()))
}

fn parse_ai_players_from_env() -> u32 {
    match std::env::var(AI_PLAYERS_ENV_VAR) {
        Ok(raw) => match raw.parse() {
            Ok(count) => count,
            Err(_) => {
                warn!(
                    env_var = AI_PLAYERS_ENV_VAR,
                    value = raw.as_str(),
                    "invalid ai player count; using 0"
                );
                0
            }
        },
        Err(_) => 0,
    }
}

fn resolve_save_dir_from_env() -> PathBuf {
    std::env::var(SAVE_DIR_ENV_VAR)
        .map(PathBuf::from)
        .unwrap_or_else(|_| SessionConfig::default().save_dir)
}
