use anyhow::Result;
use statica_dev_server::PreviewServer;

use crate::config::StaticaConfig;

pub fn execute(config: &StaticaConfig) -> Result<()> {
    let server = PreviewServer::new(config.server_config()?);

    tokio::runtime::Runtime::new()?.block_on(server.run())
}
