//! Procedural generator for the microphone extension icon.
//!
//! [`icon`] rasterizes the glyph into a [`PixelBuffer`], [`png`] turns that
//! buffer into a PNG byte stream.

pub mod error;
pub mod icon;
pub mod pixel;
pub mod png;

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use log::debug;

pub use error::{EncodingError, Result};
pub use icon::{create_icon, MicGlyph, ICON_SIZE};
pub use pixel::{PixelBuffer, Rgba};

/// File the binary writes into the working directory.
pub const OUTPUT_FILE: &str = "extension-icon.png";

/// Render the icon and encode it, checking the finished stream before it is
/// handed back so a malformed file is never written.
pub fn generate() -> Result<Vec<u8>> {
    let pixels = create_icon(ICON_SIZE, Rgba::BACKGROUND)?;
    let bytes = png::encode_rgba(&pixels)?;

    let chunks = png::read_chunks(&bytes)?;
    debug!("verified {} chunks, {} bytes total", chunks.len(), bytes.len());
    Ok(bytes)
}

/// Create (or truncate) `path` and write `bytes` to it.
pub fn write_icon(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    out.write_all(bytes)?;
    out.flush()
}
