use std::sync::Arc;
use std::time::Duration;

use args::{Args, Command};
use clap::Parser;
use log::{error, info};
use rustedbytes_scp::{ClientConfig, SshTransport};

mod args;
mod local_file;
mod transfer;

#[tokio::main]
async fn main() {
    let args = Args::parse();

    env_logger::builder().filter_level(args.log_level).init();

    let config = Arc::new(ClientConfig {
        host: args.host,
        port: args.port,
        username: args.username,
        password: args.password,
        host_key_fingerprint: args.host_key_fingerprint,
        inactivity_timeout: Some(Duration::from_secs(args.inactivity_timeout)),
    });

    let mut transport = match SshTransport::connect(config.clone()).await {
        Ok(transport) => transport,
        Err(e) => {
            error!("Failed to connect to {}:{}: {:#}", config.host, config.port, e);
            std::process::exit(1);
        }
    };

    let result = match &args.command {
        Command::Push {
            local_file,
            remote_location,
        } => transfer::push(&mut transport, local_file, remote_location).await,
        Command::Pull {
            remote_path,
            local_dir,
        } => transfer::pull(&mut transport, remote_path, local_dir).await,
    };

    if let Err(e) = transport.disconnect().await {
        error!("Failed to disconnect cleanly: {:#}", e);
    }

    match result {
        Ok(()) => info!("Transfer complete"),
        Err(e) => {
            error!("Transfer failed: {:#}", e);
            std::process::exit(1);
        }
    }
}
