//! Client startup: pick a test network peer and dial it.

use parley::{
    Node, Result,
    testnet::{peer_address, peer_from_url, peer_from_value},
};
use tracing::{info, warn};

/// Peer index chosen by `--peer`, falling back to the URL's `peer=` query.
pub fn select_peer(url: Option<&str>, peer: Option<&str>) -> Option<u8> {
    match peer {
        Some(value) => {
            let index = peer_from_value(value);
            if index.is_none() {
                warn!(value, "Ignoring non-numeric peer selector");
            }
            index
        }
        None => url.and_then(peer_from_url),
    }
}

/// Dial the selected peer, once. Returns the dialed address.
pub fn connect(node: &Node, peer: Option<u8>, host: &str, port_base: u16) -> Result<Option<String>> {
    let Some(index) = peer else {
        info!("No peer selected, running offline");
        return Ok(None);
    };
    let address = peer_address(host, port_base, index);
    node.dial(&address)?;
    info!(peer = index, address = %address, "Dialed test network peer");
    Ok(Some(address))
}
