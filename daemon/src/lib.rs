//----------------------------------------------------------------------------------------- std lib
use std::{
    net::{IpAddr, Ipv4Addr},
    sync::Arc,
};
//--------------------------------------------------------------------------------- other libraries
use futures::{future, prelude::*};
use log::{error, info};
use surrealdb::{Surreal, engine::local::Db};
use tarpc::{
    self,
    serde_transport::tcp,
    server::{BaseChannel, Channel as _, incoming::Incoming as _},
    tokio_serde::formats::Json,
};
//----------------------------------------------------------------------------- SONGBOARD libraries
use songboard_core::{
    logger::{init_logger, init_tracing},
    rpc::{SongCatalog as _, SongCatalogClient},
};
use songboard_storage::db::init_database;

pub mod config;
pub mod controller;
pub mod services;
pub mod termination;
#[cfg(test)]
pub mod test_utils;

use crate::{config::Settings, controller::CatalogServer};

/// The number of connections per IP address.
const CHANNELS_PER_IP: u32 = 10;
/// The maximum number of concurrent requests.
pub const MAX_CONCURRENT_REQUESTS: usize = 8;

async fn spawn<F>(fut: F)
where
    F: Future<Output = ()> + Send + 'static,
{
    if size_of::<F>() > 1024 {
        // if the future is too big, box it before spawning
        let fut = Box::pin(fut);
        tokio::spawn(fut);
    } else {
        // if the future is small enough, spawn it directly
        tokio::spawn(fut);
    }
}

/// Check whether something is already listening on the daemon port.
#[must_use]
pub fn is_server_running(port: u16) -> bool {
    std::net::TcpStream::connect((Ipv4Addr::LOCALHOST, port)).is_ok()
}

/// Run the daemon
///
/// also initializes the logger, database, and other necessary components.
///
/// # Arguments
///
/// * `settings` - The settings to use.
/// * `db_dir` - The directory where the database is stored.
///   If the directory does not exist, it will be created.
///
/// # Errors
///
/// If the daemon cannot be started, an error is returned.
///
/// # Panics
///
/// Panics if the peer address of the underlying TCP transport cannot be
/// determined.
#[inline]
#[allow(clippy::redundant_pub_crate)]
pub async fn start_daemon(settings: Settings, db_dir: std::path::PathBuf) -> anyhow::Result<()> {
    // check if a server is already running
    if is_server_running(settings.daemon.rpc_port) {
        anyhow::bail!(
            "A server is already running on port {}",
            settings.daemon.rpc_port
        );
    }

    // Initialize the logger, database, and tracing.
    init_logger(settings.daemon.log_level);
    let db = Arc::new(init_database(db_dir).await?);
    tracing::subscriber::set_global_default(init_tracing())?;

    // initialize the termination handler
    let (terminator, mut interrupt_rx) = termination::create_termination();

    // Initialize the server.
    let server = CatalogServer::new(db, terminator.clone());

    // Start the RPC server.
    let server_addr = (IpAddr::V4(Ipv4Addr::LOCALHOST), settings.daemon.rpc_port);

    let mut listener = match tcp::listen(&server_addr, Json::default).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to start server: {e}");
            return Err(anyhow::anyhow!("Failed to start server: {e}"));
        }
    };
    info!("Listening on {}", listener.local_addr());
    listener.config_mut().max_frame_length(usize::MAX);
    let server_handle = listener
        // Ignore accept errors.
        .filter_map(|r| future::ready(r.ok()))
        .map(BaseChannel::with_defaults)
        // Limit channels per IP.
        .max_channels_per_key(CHANNELS_PER_IP, |t| t.transport().peer_addr().unwrap().ip())
        // Set up the server's handling of incoming connections.
        // serve is generated by the service attribute.
        // It takes as input any type implementing the generated SongCatalog trait.
        .map(|channel| channel.execute(server.clone().serve()).for_each(spawn))
        .buffer_unordered(MAX_CONCURRENT_REQUESTS)
        .for_each(async |()| {})
        // make it fused so we can stop it later
        .fuse();

    // run the server until it is terminated
    tokio::select! {
        () = server_handle => {
            error!("Server stopped unexpectedly");
        },
        // Wait for the server to be stopped.
        // This will be triggered by the signal handler or the shutdown RPC.
        reason = interrupt_rx.wait() => {
            match reason {
                Ok(termination::Interrupted::UserInt) => info!("Stopping server per user request"),
                Ok(termination::Interrupted::OsSigInt) => info!("Stopping server because of an os sig int"),
                Ok(termination::Interrupted::OsSigTerm) => info!("Stopping server because of an os sig term"),
                Ok(termination::Interrupted::OsSigQuit) => info!("Stopping server because of an os sig quit"),
                Err(e) => error!("Stopping server because of an unexpected error: {e}"),
            }
        }
    }

    info!("Cleanup complete, exiting...");

    Ok(())
}

/// Initialize a test client, sends and receives messages over a channel / pipe.
/// This is useful for testing the server without needing to start it.
#[inline]
#[allow(clippy::redundant_pub_crate)]
#[must_use]
pub fn init_test_client_server(db: Arc<Surreal<Db>>) -> SongCatalogClient {
    let (client_transport, server_transport) = tarpc::transport::channel::unbounded();

    let (terminator, _interrupt_rx) = termination::create_termination();
    tokio::spawn(async move {
        let server = CatalogServer::new(db, terminator);
        BaseChannel::with_defaults(server_transport)
            .execute(server.serve())
            .for_each(spawn)
            .await;
    });

    SongCatalogClient::new(tarpc::client::Config::default(), client_transport).spawn()
}
