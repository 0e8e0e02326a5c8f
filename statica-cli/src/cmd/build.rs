use anyhow::Result;
use log::info;
use statica_core::Site;

use crate::config::StaticaConfig;

pub fn execute(config: &StaticaConfig) -> Result<()> {
    let site_config = config.site_config()?;
    let output_dir = site_config.output_dir.clone();

    let report = Site::new(site_config).build()?;

    for (section, count) in &report.sections {
        info!("{}: {} items", section, count);
    }
    info!(
        "Site built in {} ({} files)",
        output_dir.display(),
        report.files_written
    );

    Ok(())
}
