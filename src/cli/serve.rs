//! Serve command

use anyhow::Result;
use tracing::info;

use greencampus::server::start_http_server;

use super::CliContext;

pub async fn serve_command(ctx: &CliContext, port: Option<u16>) -> Result<()> {
    let campus = ctx.open_campus()?;
    let settings = campus.config().settings.server.clone();
    let port = port.unwrap_or(settings.port);

    let token = Some(settings.http_token).filter(|t| !t.trim().is_empty());
    let server = start_http_server(campus, &settings.bind, port, token)?;

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");
    server.shutdown();
    Ok(())
}
