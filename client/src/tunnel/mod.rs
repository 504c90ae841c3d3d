//! Tunnel lifecycle: one session per connection attempt, supervised by
//! an outer retry loop.

pub mod session;
pub mod supervisor;

pub use session::{SessionError, SessionState, TunnelSession};
pub use supervisor::{Supervisor, RETRY_INTERVAL};
