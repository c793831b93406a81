use actix_web::{App, HttpServer};
use color_eyre::eyre::{Result, WrapErr};
use tracing::info;
use voting_server::{config::Config, db, log, server};

#[actix_rt::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    log::init();

    let config = Config::from_env().wrap_err("Invalid configuration")?;
    let store = db::connect(&config).await?;

    server::register_db_actor(store);
    server::register_system_actors(&config);

    info!(
        host = config.host.as_str(),
        port = config.port,
        "Starting HTTP server"
    );
    HttpServer::new(|| App::new().configure(server::configure))
        .bind((config.host.as_str(), config.port))
        .wrap_err_with(|| format!("Failed to bind {}:{}", config.host, config.port))?
        .run()
        .await?;

    info!("HTTP server stopped");
    Ok(())
}
