//! Client configuration

/// Tunnel parameters, immutable once constructed.
///
/// `rtunnel_server_*` locate the transit server the client dials out
/// to; `tcp_*` locate the local service being exposed; `forward_port`
/// is the server-side port that identifies this tunnel instance.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub rtunnel_server_host: String,
    pub rtunnel_server_port: u16,
    pub tcp_host: String,
    pub tcp_port: u16,
    pub forward_port: u16,
}

impl ClientConfig {
    /// The transit server endpoint in `host:port` form, as passed to
    /// name resolution.
    pub fn server_endpoint(&self) -> String {
        format!("{}:{}", self.rtunnel_server_host, self.rtunnel_server_port)
    }
}
