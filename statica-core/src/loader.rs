use std::path::{Path, PathBuf};

use log::debug;

use crate::content::{ContentItem, ParseError};
use crate::section::Section;

#[derive(Debug)]
pub enum LoadError {
    IoError { path: PathBuf, source: std::io::Error },
    ParseError { path: PathBuf, source: ParseError },
}

impl std::fmt::Display for LoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadError::IoError { path, source } => {
                write!(f, "Failed to read {}: {}", path.display(), source)
            }
            LoadError::ParseError { path, source } => {
                write!(f, "Failed to parse {}: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoadError::IoError { source, .. } => Some(source),
            LoadError::ParseError { source, .. } => Some(source),
        }
    }
}

/// Reads every content file of one section directory.
pub struct ContentLoader {
    input_dir: PathBuf,
}

impl ContentLoader {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            input_dir: path.as_ref().to_path_buf(),
        }
    }

    /// Parses each regular file directly inside the input directory, in file
    /// name order. Any unreadable or unparsable file fails the whole load.
    pub fn load(&self, section: &Section) -> Result<Vec<ContentItem>, LoadError> {
        debug!("Loading {} from {}", section.name(), self.input_dir.display());

        let mut items = Vec::new();
        for path in self.content_files()? {
            let Some(slug) = path.file_stem().map(|s| s.to_string_lossy().to_string()) else {
                continue;
            };

            let bytes = std::fs::read(&path).map_err(|source| LoadError::IoError {
                path: path.clone(),
                source,
            })?;
            let raw = String::from_utf8_lossy(&bytes);

            let item = ContentItem::from_source(section, &slug, &raw)
                .map_err(|source| LoadError::ParseError { path: path.clone(), source })?;
            items.push(item);
        }

        Ok(items)
    }

    fn content_files(&self) -> Result<Vec<PathBuf>, LoadError> {
        let io_error = |source| LoadError::IoError {
            path: self.input_dir.clone(),
            source,
        };

        let mut paths = Vec::new();
        for entry in std::fs::read_dir(&self.input_dir).map_err(io_error)? {
            let path = entry.map_err(io_error)?.path();
            if path.is_file() && !is_hidden(&path) {
                paths.push(path);
            }
        }
        paths.sort();

        Ok(paths)
    }
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy().starts_with('.'))
        .unwrap_or(false)
}
