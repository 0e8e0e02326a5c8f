use anyhow::{Context, Result, anyhow};
use log::{error, info, warn};
use statica_core::{RebuildWorker, Site, Watcher};
use std::sync::mpsc;

use crate::config::StaticaConfig;

/// Build once, then rebuild whenever anything under the source folder changes.
pub fn execute(config: &StaticaConfig) -> Result<()> {
    let site_config = config.site_config()?;
    let source_dir = site_config.src_dir.clone();
    let debounce = site_config.debounce;

    if site_config.output_dir.starts_with(&source_dir) {
        warn!(
            "Output {} is inside the watched folder {}; every build will trigger another",
            site_config.output_dir.display(),
            source_dir.display()
        );
    }

    let mut site = Site::new(site_config);
    // A broken initial build should not stop the watch loop
    if let Err(e) = site.build() {
        error!("Build failed: {}", e);
    }

    let (tx, rx) = mpsc::channel();
    let _watcher = Watcher::watch(&source_dir, debounce, tx)
        .with_context(|| format!("Failed to watch {}", source_dir.display()))?;

    let worker = RebuildWorker::spawn(rx, move || site.build().map(|_| ()))?;
    info!("Watching for changes, press Ctrl+C to stop");

    worker
        .join()
        .map_err(|_| anyhow!("Rebuild worker panicked"))?;

    Ok(())
}
