mod api;
mod blockchain;
mod config;
mod error;
mod network;
mod transaction;
mod wallet;

use actix_web::{App, HttpServer, web};
use dotenvy::dotenv;
use log::{error, info};
use std::io;

use api::AppState;
use config::NodeConfig;
use wallet::NodeIdentity;

#[actix_web::main]
async fn main() -> io::Result<()> {
    let _ = dotenv();
    env_logger::init();

    let config = NodeConfig::from_env().map_err(|e| {
        error!("invalid configuration: {e}");
        io::Error::new(io::ErrorKind::InvalidInput, e)
    })?;

    let identity = match &config.node_secret_key {
        Some(secret) => NodeIdentity::from_secret_hex(secret).map_err(|e| {
            error!("NODE_SECRET_KEY is unusable: {e}");
            io::Error::new(io::ErrorKind::InvalidInput, e)
        })?,
        None => NodeIdentity::generate(),
    };

    info!(
        "node {} listening on {}:{} (difficulty={}, peers={})",
        identity.public_key_hex(),
        config.host,
        config.port,
        config.difficulty,
        config.bootstrap_peers.len()
    );
    if config.creator_key.is_none() {
        info!("no creator key configured; only coinbase transactions can mint");
    }

    let state = web::Data::new(AppState::new(&config, identity));

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .configure(api::init_routes)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
