/*! Integration tests for drawconnect.
 *
 * This test suite is organized as a single integration test binary
 * following the pattern described by matklad in
 * https://matklad.github.io/2021/02/27/delete-cargo-integration-tests.html
 *
 * The module structure mirrors the main library structure:
 * - store: Tests for UserStore over substitute stores (deadlines, codec, uniqueness)
 * - in_memory: Tests for the InMemory store and its persistence
 * - http: Tests for the HTTP routes, served on a real socket
 */

use tracing_subscriber::EnvFilter;

#[ctor::ctor]
fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("drawconnect=info".parse().unwrap()),
        )
        .with_test_writer()
        .try_init();
}

mod http;
mod store;
