//! Testnet command - starts a local network of peers for the chat demo.

use tokio::signal::unix::{SignalKind, signal};
use tracing_subscriber::EnvFilter;

use parley::{
    NodeConfig,
    testnet::{TestNetwork, TestNetworkConfig, Topology},
};

use crate::cli::{Link, TestnetArgs};

/// Build the adjacency list for `peers` peers from directed links.
pub fn topology(peers: usize, links: &[Link]) -> Result<Topology, String> {
    let mut topology = vec![Vec::new(); peers];
    for link in links {
        if link.from >= peers || link.to >= peers {
            return Err(format!("link {link} refers to a peer outside 0..{peers}"));
        }
        if !topology[link.from].contains(&link.to) {
            topology[link.from].push(link.to);
        }
    }
    Ok(topology)
}

/// Page-style URL a chat client takes to select peer `index`.
pub fn client_url(index: usize) -> String {
    format!("http://localhost:1234/?peer={index}")
}

/// Demo banner: two client URLs differing only in their `peer` parameter.
pub fn instructions() -> Vec<String> {
    let mut lines = vec![
        String::new(),
        "PARLEY CHAT DEMO".to_string(),
        "To run the demo start two chat clients with the urls below:".to_string(),
    ];
    lines.extend((0..2).map(|index| {
        format!(
            "parley chat \"{}\"    (points this client at running peer {index})",
            client_url(index)
        )
    }));
    lines
}

/// Run the test network until interrupted
pub async fn run(args: &TestnetArgs) -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("parley=info")),
        )
        .init();

    let config = TestNetworkConfig {
        topology: topology(args.peers, &args.links)?,
        host: args.host.clone(),
        port_base: args.port_base,
        node: NodeConfig::default(),
    };
    let network = TestNetwork::start(config).await?;

    for (index, address) in network.addresses().iter().enumerate() {
        tracing::info!(peer = index, address = %address, "Peer listening");
    }
    println!("{}", instructions().join("\n"));
    println!();
    println!("Press Ctrl+C to shutdown");

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;
    tokio::select! {
        _ = sigterm.recv() => tracing::info!("Received SIGTERM, shutting down"),
        _ = sigint.recv() => tracing::info!("Received SIGINT, shutting down"),
    }

    network.shutdown().await?;
    println!("Test network shut down");
    Ok(())
}
