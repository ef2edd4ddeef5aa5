use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use image::ImageEncoder;
use thiserror::Error;
use tiny_skia::Pixmap;

const EXPORT_SUBDIR: &str = "Pictures";
const EXPORT_PREFIX: &str = "meme_";
const MAX_NAME_ATTEMPTS: u32 = 1000;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("missing HOME environment variable")]
    MissingHomeDirectory,
    #[error("export filename is empty")]
    EmptyFilename,
    #[error("no free export filename for {0}")]
    NameTaken(String),
    #[error("PNG encoding failed: {0}")]
    Encode(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

pub type ExportResult<T> = std::result::Result<T, ExportError>;

/// Writes rendered canvases as PNG files into one directory.
#[derive(Debug, Clone)]
pub struct ExportService {
    export_dir: PathBuf,
}

impl ExportService {
    pub const fn with_dir(export_dir: PathBuf) -> Self {
        Self { export_dir }
    }

    /// `$HOME/Pictures`, created when missing.
    pub fn with_default_dir() -> ExportResult<Self> {
        let home = std::env::var("HOME").map_err(|_| ExportError::MissingHomeDirectory)?;
        let mut export_dir = PathBuf::from(home);
        export_dir.push(EXPORT_SUBDIR);
        Ok(Self::with_dir(export_dir))
    }

    pub fn export_dir(&self) -> &Path {
        &self.export_dir
    }

    pub fn target_path(&self, filename: &str) -> ExportResult<PathBuf> {
        let filename = filename.trim();
        if filename.is_empty() {
            return Err(ExportError::EmptyFilename);
        }
        Ok(self.export_dir.join(filename))
    }

    /// Encodes `pixmap` and writes it under a fresh name. Existing files are
    /// never replaced: `a.png` becomes `a-1.png`, `a-2.png` and so on.
    pub fn save_png(&self, pixmap: &Pixmap, filename: Option<&str>) -> ExportResult<PathBuf> {
        let filename = filename
            .map(str::to_string)
            .unwrap_or_else(|| default_filename(Utc::now()));
        self.target_path(&filename)?;
        let bytes = encode_png(pixmap)?;

        fs::create_dir_all(&self.export_dir)?;
        let (target, mut file) = self.create_unique(filename.trim())?;
        file.write_all(&bytes)?;
        tracing::info!(path = %target.display(), bytes = bytes.len(), "exported png");
        Ok(target)
    }

    fn create_unique(&self, filename: &str) -> ExportResult<(PathBuf, fs::File)> {
        for attempt in 0..MAX_NAME_ATTEMPTS {
            let target = self.target_path(&numbered_filename(filename, attempt))?;
            match fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&target)
            {
                Ok(file) => return Ok((target, file)),
                Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
                    tracing::debug!(path = %target.display(), "export name taken");
                }
                Err(err) => return Err(err.into()),
            }
        }
        Err(ExportError::NameTaken(filename.to_string()))
    }
}

/// `meme_YYYY-MM-DD-HH-MM-SS.png` for the given UTC instant.
pub fn default_filename(now: DateTime<Utc>) -> String {
    format!("{EXPORT_PREFIX}{}.png", now.format("%Y-%m-%d-%H-%M-%S"))
}

fn numbered_filename(filename: &str, attempt: u32) -> String {
    if attempt == 0 {
        return filename.to_string();
    }
    match filename.rsplit_once('.') {
        Some((stem, extension)) if !stem.is_empty() => format!("{stem}-{attempt}.{extension}"),
        _ => format!("{filename}-{attempt}"),
    }
}

pub fn encode_png(pixmap: &Pixmap) -> ExportResult<Vec<u8>> {
    match pixmap.encode_png() {
        Ok(bytes) => Ok(bytes),
        Err(err) => {
            tracing::warn!(?err, "pixmap png encoder failed, using fallback encoder");
            encode_png_fallback(pixmap)
        }
    }
}

pub fn encode_png_fallback(pixmap: &Pixmap) -> ExportResult<Vec<u8>> {
    let mut rgba = Vec::with_capacity(pixmap.data().len());
    for pixel in pixmap.pixels() {
        let color = pixel.demultiply();
        rgba.extend_from_slice(&[color.red(), color.green(), color.blue(), color.alpha()]);
    }

    let mut out = Vec::new();
    image::codecs::png::PngEncoder::new(&mut out)
        .write_image(
            &rgba,
            pixmap.width(),
            pixmap.height(),
            image::ExtendedColorType::Rgba8,
        )
        .map_err(|err| ExportError::Encode(err.to_string()))?;
    Ok(out)
}
