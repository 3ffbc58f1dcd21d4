//! Sample datasets for trying the insights out
//!
//! Datasets are read from `user_<n>_data.json` files in the data
//! directory. When none matches, a small canned dataset per gig category
//! compiled into the binary is served instead.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::models::Dataset;

/// Canned datasets keyed by gig category (compiled into binary)
const EMBEDDED_SAMPLES: &str = include_str!("../../../config/sample_data.json");

/// Parse the canned datasets
pub fn embedded_samples() -> Result<BTreeMap<String, Dataset>> {
    Ok(serde_json::from_str(EMBEDDED_SAMPLES)?)
}

/// Looks up sample datasets in a data directory
#[derive(Debug, Clone)]
pub struct SampleLibrary {
    data_dir: PathBuf,
}

impl SampleLibrary {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// `user_*_data.json` files in the data directory, sorted by name
    pub fn data_files(&self) -> Result<Vec<PathBuf>> {
        if !self.data_dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut files: Vec<PathBuf> = fs::read_dir(&self.data_dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.is_file()
                    && path
                        .file_name()
                        .and_then(|n| n.to_str())
                        .map(|n| n.starts_with("user_") && n.ends_with("_data.json"))
                        .unwrap_or(false)
            })
            .collect();
        files.sort();
        Ok(files)
    }

    /// First dataset whose income carries `category` (any dataset when
    /// `None`), from files first and then the canned samples
    pub fn find(&self, category: Option<&str>) -> Result<Dataset> {
        let wanted = category.map(str::trim).filter(|c| !c.is_empty());
        let matches = |dataset: &Dataset| match wanted {
            None => true,
            Some(wanted) => dataset
                .income_categories()
                .iter()
                .any(|c| c.eq_ignore_ascii_case(wanted)),
        };

        for path in self.data_files()? {
            let dataset = match Dataset::load(&path) {
                Ok(dataset) => dataset,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Skipping unreadable sample file");
                    continue;
                }
            };
            if matches(&dataset) {
                debug!(path = %path.display(), "Serving sample file");
                return Ok(dataset);
            }
        }

        embedded_samples()?
            .into_values()
            .find(|dataset| matches(dataset))
            .ok_or_else(|| {
                Error::NotFound(format!(
                    "No test data for category: {}",
                    wanted.unwrap_or_default()
                ))
            })
    }
}
