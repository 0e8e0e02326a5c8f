use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use walkdir::WalkDir;

use crate::config::SiteConfig;

/// Empties the output directory and repopulates it with assets and static
/// files. Runs before every build.
pub struct Cleaner {
    output_root: PathBuf,
    assets_input: PathBuf,
    assets_output: PathBuf,
    static_input: PathBuf,
}

impl Cleaner {
    pub fn new<P: AsRef<Path>>(output_root: P, assets_input: P, assets_output: P, static_input: P) -> Self {
        Self {
            output_root: output_root.as_ref().to_path_buf(),
            assets_input: assets_input.as_ref().to_path_buf(),
            assets_output: assets_output.as_ref().to_path_buf(),
            static_input: static_input.as_ref().to_path_buf(),
        }
    }

    pub fn from_config(config: &SiteConfig) -> Self {
        Self::new(
            &config.output_dir,
            &config.assets_input,
            &config.assets_output,
            &config.static_dir,
        )
    }

    /// Only failing to empty the output root is an error. Asset and static
    /// copy problems are logged and the build carries on without them.
    pub fn clean(&self) -> io::Result<()> {
        info!("Cleaning {}", self.output_root.display());
        self.empty_output()?;

        match copy_dir(&self.assets_input, &self.assets_output) {
            Ok(count) => debug!("Copied {} asset files", count),
            Err(e) => warn!(
                "Assets not copied from {}: {}",
                self.assets_input.display(),
                e
            ),
        }

        match copy_files(&self.static_input, &self.output_root) {
            Ok(count) => debug!("Copied {} static files", count),
            Err(e) => warn!(
                "Static files not copied from {}: {}",
                self.static_input.display(),
                e
            ),
        }

        Ok(())
    }

    fn empty_output(&self) -> io::Result<()> {
        fs::create_dir_all(&self.output_root)?;

        for entry in fs::read_dir(&self.output_root)? {
            let path = entry?.path();
            if let Err(e) = fs::remove_dir_all(&path) {
                debug!("Removing {} as a file ({})", path.display(), e);
                fs::remove_file(&path)?;
            }
        }

        Ok(())
    }
}

/// Copies `src` recursively to `dest`, which must not exist yet.
fn copy_dir(src: &Path, dest: &Path) -> io::Result<usize> {
    if !src.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("{} is not a directory", src.display()),
        ));
    }
    if dest.exists() {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("{} already exists", dest.display()),
        ));
    }

    let mut copied = 0;
    for entry in WalkDir::new(src) {
        let entry = entry.map_err(io::Error::other)?;
        let relative = entry.path().strip_prefix(src).map_err(io::Error::other)?;
        let target = dest.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            fs::copy(entry.path(), &target)?;
            copied += 1;
        }
    }

    Ok(copied)
}

/// Copies the regular files directly under `src` into `dest`.
fn copy_files(src: &Path, dest: &Path) -> io::Result<usize> {
    let mut copied = 0;
    for entry in fs::read_dir(src)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        if let Some(name) = path.file_name() {
            fs::copy(&path, dest.join(name))?;
            copied += 1;
        }
    }

    Ok(copied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn layout() -> (TempDir, SiteConfig) {
        let tmp = TempDir::new().unwrap();
        let config = SiteConfig::rooted_at(tmp.path());
        fs::create_dir_all(config.assets_input.join("css")).unwrap();
        fs::write(config.assets_input.join("css/site.css"), "body {}").unwrap();
        fs::create_dir_all(&config.static_dir).unwrap();
        fs::write(config.static_dir.join("robots.txt"), "User-agent: *").unwrap();
        fs::create_dir_all(config.static_dir.join("ignored")).unwrap();
        (tmp, config)
    }

    #[test]
    fn test_removes_stale_output_and_copies_assets() {
        let (_tmp, config) = layout();
        fs::create_dir_all(config.output_dir.join("old/post")).unwrap();
        fs::write(config.output_dir.join("old/post/index.html"), "stale").unwrap();
        fs::write(config.output_dir.join("stale.txt"), "stale").unwrap();

        Cleaner::from_config(&config).clean().unwrap();

        let out = &config.output_dir;
        assert!(!out.join("old").exists());
        assert!(!out.join("stale.txt").exists());
        assert_eq!(fs::read_to_string(out.join("assets/css/site.css")).unwrap(), "body {}");
        assert!(out.join("robots.txt").is_file());
        assert!(!out.join("ignored").exists());
    }

    #[test]
    fn test_creates_missing_output_root() {
        let (_tmp, config) = layout();
        assert!(!config.output_dir.exists());

        Cleaner::from_config(&config).clean().unwrap();
        assert!(config.output_dir.join("robots.txt").is_file());
    }

    #[test]
    fn test_missing_sources_are_not_fatal() {
        let tmp = TempDir::new().unwrap();
        let config = SiteConfig::rooted_at(tmp.path());

        Cleaner::from_config(&config).clean().unwrap();
        assert!(config.output_dir.is_dir());
        assert!(!config.assets_output.exists());
    }

    #[test]
    fn test_copy_dir_refuses_existing_destination() {
        let (_tmp, config) = layout();
        fs::create_dir_all(&config.assets_output).unwrap();

        let err = copy_dir(&config.assets_input, &config.assets_output).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
    }
}
