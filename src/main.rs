// Entrypoint for the CLI application.
// Reads the configuration, starts logging, then hands an API client and the
// on-disk library to the menu loop.

use sound_finder::{api::ApiClient, config::Config, library::Library, logging, ui::main_menu};

fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    // Held until exit so buffered log lines get flushed.
    let _log_guard = logging::init_logging(&config.log_dir)?;
    tracing::debug!(?config, "starting");

    let api = ApiClient::from_config(&config)?;
    let library = Library::from_config(&config);

    // Blocks until the user picks "Exit".
    main_menu(&api, &library)?;
    Ok(())
}
