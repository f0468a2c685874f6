use std::sync::Arc;

use anyhow::Result;
use fleet_api::{redact::redact, Coordinator};

use super::{Cli, Config};

pub async fn main(_cli: &Cli, cfg: &Config, name: &str) -> Result<()> {
    let Some(installation) = cfg.installations.get(name) else {
        anyhow::bail!("no installation named {:?} in config", name);
    };

    let coordinator = Coordinator::new(name, Arc::new(installation.client()), installation.poll_interval());
    let snapshot = coordinator.first_refresh().await?;

    println!("{}", serde_json::to_string_pretty(&redact(&serde_json::to_value(&*snapshot)?))?);

    Ok(())
}
