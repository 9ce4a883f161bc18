use std::path::Path;

use anyhow::{Context, Result};
use extension_icon::{ICON_SIZE, OUTPUT_FILE};

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let bytes = extension_icon::generate().context("failed to generate icon")?;

    let path = Path::new(OUTPUT_FILE);
    extension_icon::write_icon(path, &bytes)
        .with_context(|| format!("failed to write {}", path.display()))?;
    log::info!("wrote {} bytes to {}", bytes.len(), path.display());

    println!("Created {OUTPUT_FILE} ({ICON_SIZE}x{ICON_SIZE})");
    Ok(())
}
