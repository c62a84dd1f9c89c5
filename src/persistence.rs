//! Persistence layer for the section record file.
//!
//! The record holds the root sections of a document, recursively, with the
//! text attached to leaves. JSON (pretty, UTF-8 kept as is) is the default;
//! bincode is available for compact records.

use crate::error::{DecomposeError, Result};
use crate::tree::Section;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Save format for record files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordFormat {
    /// JSON format (human-readable, larger).
    #[default]
    Json,
    /// Bincode format (binary, compact).
    Bincode,
}

impl RecordFormat {
    /// Determine format from file extension.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("bin") | Some("bincode") => RecordFormat::Bincode,
            _ => RecordFormat::Json,
        }
    }

    /// File extension written for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            RecordFormat::Json => "json",
            RecordFormat::Bincode => "bin",
        }
    }
}

impl FromStr for RecordFormat {
    type Err = DecomposeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "json" => Ok(RecordFormat::Json),
            "bin" | "bincode" => Ok(RecordFormat::Bincode),
            other => Err(DecomposeError::InvalidConfig(format!(
                "unknown record format '{}'",
                other
            ))),
        }
    }
}

/// Record path for a document inside an output directory.
pub fn record_path(output_dir: &Path, document_name: &str, format: RecordFormat) -> PathBuf {
    output_dir.join(format!("{}.{}", document_name, format.extension()))
}

/// Save sections to a record file, picking the format from the extension.
pub fn save_record(sections: &[Section], path: &Path) -> Result<()> {
    save_record_with_format(sections, path, RecordFormat::from_path(path))
}

/// Save sections with a specific format.
pub fn save_record_with_format(sections: &[Section], path: &Path, format: RecordFormat) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| DecomposeError::io(parent, e))?;
        }
    }

    let data = match format {
        RecordFormat::Json => serde_json::to_string_pretty(sections)?.into_bytes(),
        RecordFormat::Bincode => {
            let config = bincode::config::standard();
            bincode::encode_to_vec(sections, config)
                .map_err(|e| DecomposeError::Serialization(e.to_string()))?
        }
    };

    fs::write(path, &data).map_err(|e| DecomposeError::io(path, e))?;

    Ok(())
}

/// Load sections from a record file.
pub fn load_record(path: &Path) -> Result<Vec<Section>> {
    if !path.exists() {
        return Err(DecomposeError::RecordNotFound(path.to_path_buf()));
    }

    load_record_with_format(path, RecordFormat::from_path(path))
}

/// Load sections with a specific format.
pub fn load_record_with_format(path: &Path, format: RecordFormat) -> Result<Vec<Section>> {
    let data = fs::read(path).map_err(|e| DecomposeError::io(path, e))?;

    let sections = match format {
        RecordFormat::Json => serde_json::from_slice(&data)?,
        RecordFormat::Bincode => {
            let config = bincode::config::standard();
            let (sections, _): (Vec<Section>, usize) = bincode::decode_from_slice(&data, config)
                .map_err(|e| DecomposeError::Serialization(e.to_string()))?;
            sections
        }
    };

    Ok(sections)
}

/// Get the size of a record file in bytes.
pub fn record_size(path: &Path) -> Result<u64> {
    let metadata = fs::metadata(path).map_err(|e| DecomposeError::io(path, e))?;
    Ok(metadata.len())
}
