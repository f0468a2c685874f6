use anyhow::Result;
use formlabs::{Client, Credentials};

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let (Some(client_id), Some(client_secret)) = (args.get(1), args.get(2)) else {
        anyhow::bail!("usage: list-printers <client-id> <client-secret>");
    };

    let client = Client::new(Credentials::new(client_id.as_str(), client_secret.as_str()));
    for printer in client.list_printers().await? {
        let serial = printer.get("serial").and_then(|serial| serial.as_str()).unwrap_or("?");
        let status = printer
            .pointer("/printer_status/status")
            .and_then(|status| status.as_str())
            .unwrap_or("unknown");
        eprintln!("{} {}", serial, status);
    }

    Ok(())
}
