use tokio::net::TcpListener;
use tracing::info;

use crate::app::App;
use crate::config::Config;
use crate::http::connection::Connection;

pub async fn run(cfg: &Config, app: App) -> anyhow::Result<()> {
    let listener = TcpListener::bind(&cfg.server.listen_addr).await?;
    info!("Listening on {}", cfg.server.listen_addr);

    loop {
        let (socket, peer) = listener.accept().await?;
        info!(peer = %peer, "Accepted connection");

        let app = app.clone();
        let display_errors = cfg.error.display_errors;
        tokio::spawn(async move {
            let mut conn = Connection::new(socket, app).display_errors(display_errors);
            if let Err(e) = conn.run().await {
                tracing::error!(peer = %peer, error = %e, "Connection error");
            }
        });
    }
}
