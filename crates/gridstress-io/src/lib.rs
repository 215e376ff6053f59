//! # gridstress-io: network documents
//!
//! Loads and saves [`Network`] descriptions as JSON or YAML documents. The
//! format is picked from the file extension (`.json`, `.yaml`/`.yml`); other
//! extensions are tried as YAML first, then JSON.
//!
//! ```rust,no_run
//! use gridstress_io::load_network;
//! use std::path::Path;
//!
//! fn main() -> anyhow::Result<()> {
//!     let network = load_network(Path::new("test_data/five_bus.yaml"))?;
//!     println!("{} buses, {} snapshots", network.buses().len(), network.horizon());
//!     Ok(())
//! }
//! ```

use anyhow::{Context, Result};
use gridstress_core::Network;
use std::fs;
use std::path::Path;

pub mod document;

pub use document::{document_from_network, network_from_document, NetworkDocument};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Yaml,
}

impl DocumentFormat {
    /// Format implied by the extension, `None` when the extension is not recognized.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Some(DocumentFormat::Json),
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
                Some(DocumentFormat::Yaml)
            }
            _ => None,
        }
    }
}

pub fn parse_document(text: &str, format: Option<DocumentFormat>) -> Result<NetworkDocument> {
    match format {
        Some(DocumentFormat::Json) => {
            serde_json::from_str(text).context("parsing network document json")
        }
        Some(DocumentFormat::Yaml) => {
            serde_yaml::from_str(text).context("parsing network document yaml")
        }
        None => serde_yaml::from_str(text)
            .or_else(|_| serde_json::from_str(text))
            .context("parsing network document"),
    }
}

pub fn load_network(path: &Path) -> Result<Network> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading network file '{}'", path.display()))?;
    let doc = parse_document(&text, DocumentFormat::from_path(path))
        .with_context(|| format!("loading '{}'", path.display()))?;
    network_from_document(&doc)
        .with_context(|| format!("building network from '{}'", path.display()))
}

pub fn write_network_string(network: &Network, format: DocumentFormat) -> Result<String> {
    let doc = document_from_network(network);
    match format {
        DocumentFormat::Json => {
            serde_json::to_string_pretty(&doc).context("serializing network to json")
        }
        DocumentFormat::Yaml => serde_yaml::to_string(&doc).context("serializing network to yaml"),
    }
}

/// Save in the format implied by the extension (JSON when unrecognized).
pub fn save_network(network: &Network, path: &Path) -> Result<()> {
    let format = DocumentFormat::from_path(path).unwrap_or(DocumentFormat::Json);
    let text = write_network_string(network, format)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating directory '{}'", parent.display()))?;
    }
    fs::write(path, text).with_context(|| format!("writing network file '{}'", path.display()))
}

/// Turn an identifier into a single path component: separators become `_`
/// and an empty name becomes `scenario`.
pub fn sanitize_name(value: &str) -> String {
    let filtered: String = value
        .trim()
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | ':') { '_' } else { c })
        .collect();
    if filtered.is_empty() || filtered == "." || filtered == ".." {
        "scenario".to_string()
    } else {
        filtered
    }
}
