use std::{collections::BTreeMap, sync::Arc};

use anyhow::Result;
use fleet_api::{server, Coordinator};

use super::{Cli, Config};

pub async fn main(cli: &Cli, cfg: &Config, bind: Option<&str>) -> Result<()> {
    let mut installations = BTreeMap::new();

    for (name, installation) in cfg.installations.iter() {
        let coordinator = Arc::new(Coordinator::new(
            name.as_str(),
            Arc::new(installation.client()),
            installation.poll_interval(),
        ));

        // An installation that can't be polled once at startup never comes up.
        let snapshot = coordinator.first_refresh().await?;
        tracing::info!(
            installation = name.as_str(),
            printers = snapshot.len(),
            poll_interval_secs = installation.poll_interval_secs,
            "installation ready"
        );

        coordinator.spawn();
        installations.insert(name.clone(), coordinator);
    }

    let bind = bind.unwrap_or(cfg.server.bind.as_str());
    server::serve(
        bind,
        installations,
        cfg.server.online_window(),
        cli.create_logger("server"),
    )
    .await
}
