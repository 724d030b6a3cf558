use async_trait::async_trait;
use tracing::{info, warn};

use crate::contract::ReachabilityProbe;

pub const DEFAULT_PROBE_HOST: &str = "www.google.com";

/// Treats the network as reachable when a public host name resolves.
#[derive(Debug, Clone)]
pub struct DnsProbe {
    host: String,
}

impl DnsProbe {
    pub fn new(host: impl Into<String>) -> Self {
        Self { host: host.into() }
    }
}

impl Default for DnsProbe {
    fn default() -> Self {
        Self::new(DEFAULT_PROBE_HOST)
    }
}

#[async_trait]
impl ReachabilityProbe for DnsProbe {
    async fn is_reachable(&self) -> bool {
        match tokio::net::lookup_host((self.host.as_str(), 443)).await {
            Ok(mut addrs) => {
                let reachable = addrs.next().is_some();
                info!(host = %self.host, reachable, "[NETWORK] Resolved probe host");
                reachable
            }
            Err(e) => {
                warn!(host = %self.host, error = %e, "[NETWORK] Probe host did not resolve");
                false
            }
        }
    }
}
