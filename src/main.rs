// Entrypoint for the CLI application.
// - Keeps `main` small: set up logging, log in, hand the client to the menu.
// - Endpoint and credentials come from `MAGENTO_XMLRPC_URL`,
//   `MAGENTO_USERNAME` and `MAGENTO_API_KEY` (see `MagentoConfig::from_env`).

use anyhow::Context;
use env_logger::Env;
use magento_cli::{ui::main_menu, Magento, MagentoConfig};

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = MagentoConfig::from_env()?;
    log::info!("connecting to {}", config.url);
    let magento = Magento::open(config).context("Failed to log in to Magento")?;

    // Blocks until the user picks "Exit".
    main_menu(&magento)?;
    Ok(())
}
