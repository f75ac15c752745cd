/*! Integration tests for Parley.
 *
 * This test suite is organized as a single integration test binary
 * following the pattern described by matklad in
 * https://matklad.github.io/2021/02/27/delete-cargo-integration-tests.html
 *
 * The module structure mirrors the main library structure:
 * - store: persistence and subscriptions through the public API
 * - auth: login behaviour across replicated nodes
 * - node: the facade as applications use it
 * - sync: HTTP transport and replication between nodes
 * - testnet: the local multi-peer network
 */

use tracing_subscriber::EnvFilter;

#[ctor::ctor]
fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("parley=info".parse().unwrap()),
        )
        .with_test_writer()
        .try_init();
}

mod auth;
mod helpers;
mod node;
mod store;
mod sync;
mod testnet;
