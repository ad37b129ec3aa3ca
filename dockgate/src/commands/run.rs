use anyhow::Result;
use dockgate_common::Services;
use dockgate_protocol_http::HTTPProtocolServer;
use tracing::*;

use crate::config::load_config;

#[cfg(target_os = "linux")]
use sd_notify::NotifyState;

pub(crate) async fn command(cli: &crate::Cli) -> Result<()> {
    let version = env!("CARGO_PKG_VERSION");
    info!(%version, "Dockgate");

    let config = load_config(&cli.config)?;
    let services = Services::new(config.clone());

    let address = *config.http.listen;
    let server = HTTPProtocolServer::new(&services).await?;

    if console::user_attended() {
        info!("--------------------------------------------");
        info!("Dockgate is now running.");
        info!("Accepting HTTP connections on {}", config.http.listen);
        info!("--------------------------------------------");
    }

    #[cfg(target_os = "linux")]
    if let Ok(true) = sd_notify::booted() {
        use std::time::Duration;
        tokio::spawn(async {
            if let Err(error) = async {
                sd_notify::notify(false, &[NotifyState::Ready])?;
                loop {
                    sd_notify::notify(false, &[NotifyState::Watchdog])?;
                    tokio::time::sleep(Duration::from_secs(15)).await;
                }
                #[allow(unreachable_code)]
                Ok::<(), anyhow::Error>(())
            }
            .await
            {
                error!(?error, "Failed to communicate with systemd");
            }
        });
    }

    drop(config);

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            std::process::exit(1);
        }
        result = server.run(address) => {
            if let Err(error) = result {
                error!(?error, "HTTP server error");
                std::process::exit(1);
            }
        }
    }

    info!("Exiting");
    Ok(())
}
