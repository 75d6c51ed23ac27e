//! Charts, CSV exports, and summaries of finished runs
//!
//! Nothing here touches the numbers: every function is a pure transformation of
//! a [`Trajectory`](crate::simulator::Trajectory) into an [`Artifact`] held in
//! memory. [`write_artifacts`] stages every artifact as a temporary file in the
//! target directory and only then moves them into place. If any file cannot be
//! placed, the ones already placed are removed again.

mod chart;
mod export;
mod summary;

use std::fmt;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::error::OutputError;

pub use chart::{chart_artifact, chart_title, render_chart, render_svg};
pub use export::{csv_artifact, write_csv, write_csv_to};
pub use summary::{CompartmentSummary, RunSummary};

/// Image format of the rendered chart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    #[default]
    Svg,
    /// Axis text needs the `ttf` feature
    Png,
}

impl ImageFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Svg => "svg",
            ImageFormat::Png => "png",
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ImageFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "svg" => Ok(ImageFormat::Svg),
            "png" => Ok(ImageFormat::Png),
            other => Err(format!("unknown image format '{}' (expected svg or png)", other)),
        }
    }
}

/// Chart appearance
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartOptions {
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            format: ImageFormat::Svg,
            width: 1000,
            height: 600,
        }
    }
}

impl ChartOptions {
    pub fn with_format(mut self, format: ImageFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }
}

/// Replace every character outside `[A-Za-z0-9_-]` with `_`
pub fn sanitize_name(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if sanitized.is_empty() {
        "model".to_string()
    } else {
        sanitized
    }
}

/// `simulation_<name>.<extension>`
pub fn output_file_name(model_name: &str, extension: &str) -> String {
    format!("simulation_{}.{}", sanitize_name(model_name), extension)
}

/// Fail early when the target directory is missing
fn ensure_directory(dir: &Path) -> Result<(), OutputError> {
    if dir.is_dir() {
        Ok(())
    } else {
        Err(OutputError::MissingDirectory(dir.to_path_buf()))
    }
}

/// A rendered output file, not yet on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    file_name: String,
    bytes: Vec<u8>,
}

impl Artifact {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Write every artifact into `dir`, or none of them
///
/// Returns the written paths in the order of `artifacts`. Existing files with
/// the same names are replaced.
pub fn write_artifacts(dir: &Path, artifacts: &[Artifact]) -> Result<Vec<PathBuf>, OutputError> {
    ensure_directory(dir)?;

    // Staged files delete themselves when dropped
    let mut staged = Vec::with_capacity(artifacts.len());
    for artifact in artifacts {
        let path = dir.join(&artifact.file_name);
        let file = stage(dir, &artifact.bytes).map_err(|source| write_error(&path, source))?;
        staged.push((file, path));
    }

    let mut written: Vec<PathBuf> = Vec::with_capacity(staged.len());
    for (file, path) in staged {
        if let Err(e) = file.persist(&path) {
            discard(&written);
            return Err(write_error(&path, e.error));
        }
        debug!(path = %path.display(), "artifact placed");
        written.push(path);
    }
    Ok(written)
}

/// Place a single artifact
fn write_artifact(dir: &Path, artifact: &Artifact) -> Result<PathBuf, OutputError> {
    ensure_directory(dir)?;
    let path = dir.join(&artifact.file_name);
    stage(dir, &artifact.bytes)
        .and_then(|file| file.persist(&path).map_err(|e| e.error))
        .map_err(|source| write_error(&path, source))?;
    Ok(path)
}

fn stage(dir: &Path, bytes: &[u8]) -> io::Result<NamedTempFile> {
    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(bytes)?;
    file.as_file().sync_all()?;
    Ok(file)
}

fn discard(written: &[PathBuf]) {
    for path in written {
        if let Err(e) = std::fs::remove_file(path) {
            warn!(path = %path.display(), error = %e, "could not remove output after a failed write");
        }
    }
}

fn write_error(path: &Path, source: io::Error) -> OutputError {
    OutputError::Write {
        path: path.to_path_buf(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_file_name() {
        assert_eq!(output_file_name("Simple_SIR", "svg"), "simulation_Simple_SIR.svg");
        assert_eq!(
            output_file_name("HIV model (v2)/test", "png"),
            "simulation_HIV_model__v2__test.png"
        );
        assert_eq!(output_file_name("", "csv"), "simulation_model.csv");
    }

    #[test]
    fn test_sanitize_non_ascii() {
        assert_eq!(sanitize_name("Modèle-α"), "Mod_le-_");
    }

    #[test]
    fn test_write_artifacts_places_all_files() {
        let dir = tempfile::tempdir().unwrap();
        let artifacts = [
            Artifact::new("a.txt", b"first".to_vec()),
            Artifact::new("b.txt", b"second".to_vec()),
        ];

        let paths = write_artifacts(dir.path(), &artifacts).unwrap();
        assert_eq!(paths, vec![dir.path().join("a.txt"), dir.path().join("b.txt")]);
        assert_eq!(std::fs::read(&paths[1]).unwrap(), b"second");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 2);
    }

    #[test]
    fn test_blocked_target_removes_earlier_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("b.txt")).unwrap();
        let artifacts = [
            Artifact::new("a.txt", b"first".to_vec()),
            Artifact::new("b.txt", b"second".to_vec()),
        ];

        let err = write_artifacts(dir.path(), &artifacts).unwrap_err();
        assert!(matches!(err, OutputError::Write { ref path, .. } if path.ends_with("b.txt")));

        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["b.txt"]);
    }

    #[test]
    fn test_image_format_from_str() {
        assert_eq!("PNG".parse::<ImageFormat>(), Ok(ImageFormat::Png));
        assert_eq!("svg".parse::<ImageFormat>(), Ok(ImageFormat::Svg));
        assert!("jpeg".parse::<ImageFormat>().is_err());
        assert_eq!(ImageFormat::default().extension(), "svg");
    }
}
