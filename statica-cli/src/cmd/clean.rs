use anyhow::Result;
use log::info;
use statica_core::Cleaner;

use crate::config::StaticaConfig;

pub fn execute(config: &StaticaConfig) -> Result<()> {
    let site_config = config.site_config()?;
    Cleaner::from_config(&site_config).clean()?;

    info!("Cleaned {}", site_config.output_dir.display());

    Ok(())
}
