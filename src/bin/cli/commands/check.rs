use anyhow::{Context, Result};

use linkdeck_lib::anki::CardStore;

use crate::app::App;
use crate::OutputFormat;

pub fn run(app: &App, format: &OutputFormat) -> Result<()> {
    let client = app.client()?;
    let version = client
        .version()
        .with_context(|| format!("AnkiConnect is not reachable at {}", client.url()))?;

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "url": client.url(),
                "version": version,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            println!("AnkiConnect at {} (API version {})", client.url(), version);
        }
    }

    Ok(())
}
