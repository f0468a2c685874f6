use anyhow::Result;

use super::{Cli, Config};

pub async fn main(_cli: &Cli, cfg: &Config) -> Result<()> {
    let mut failed = 0;

    for (name, installation) in cfg.installations.iter() {
        match installation.client().validate().await {
            Ok(printers) => println!("{}: ok, {} printer(s)", name, printers),
            Err(err) => {
                tracing::debug!(installation = name.as_str(), error = format!("{:?}", err), "validation failed");
                println!("{}: {}", name, err);
                failed += 1;
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{} installation(s) failed validation", failed);
    }

    Ok(())
}
