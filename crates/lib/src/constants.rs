//! Constants shared across the Parley library.

use std::time::Duration;

/// Separator between key path segments.
pub const KEY_SEPARATOR: char = '.';

/// Prefix under which user accounts are stored.
pub const USERS_PREFIX: &str = "auth.users";

/// HTTP path of the sync endpoint.
pub const SYNC_PATH: &str = "/api/v0";

/// Default interval between link sync rounds when nothing changes locally.
pub const DEFAULT_SYNC_INTERVAL: Duration = Duration::from_millis(500);

/// Default host the test network binds peers to.
pub const DEFAULT_PEER_HOST: &str = "127.0.0.1";

/// Peer `n` of the test network listens on `DEFAULT_PORT_BASE + n`.
pub const DEFAULT_PORT_BASE: u16 = 11110;

/// Capacity of the store change channel before subscribers start lagging.
pub const CHANGE_CHANNEL_CAPACITY: usize = 1024;

/// Remote records stamped further than this ahead of the local clock are
/// refused, so one peer cannot pin a key with a far-future timestamp.
pub const MAX_CLOCK_SKEW: Duration = Duration::from_secs(60 * 60);
