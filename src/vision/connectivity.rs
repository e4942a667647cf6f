//! Network reachability check performed before loading the detector.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::net::TcpStream;

#[async_trait::async_trait]
pub trait Connectivity: Send + Sync {
    async fn is_online(&self) -> bool;
}

/// Probes reachability by opening a TCP connection.
#[derive(Debug, Clone)]
pub struct TcpProbe {
    addr: String,
    timeout: Duration,
}

impl TcpProbe {
    pub fn new(addr: &str, timeout: Duration) -> Self {
        Self {
            addr: addr.to_string(),
            timeout,
        }
    }
}

impl Default for TcpProbe {
    fn default() -> Self {
        Self::new(
            crate::defaults::CONNECTIVITY_PROBE_ADDR,
            Duration::from_millis(crate::defaults::CONNECTIVITY_TIMEOUT_MS),
        )
    }
}

#[async_trait::async_trait]
impl Connectivity for TcpProbe {
    async fn is_online(&self) -> bool {
        matches!(
            tokio::time::timeout(self.timeout, TcpStream::connect(&self.addr)).await,
            Ok(Ok(_))
        )
    }
}

/// Fixed answer, switchable at runtime.
#[derive(Debug, Default)]
pub struct StaticConnectivity {
    offline: AtomicBool,
}

impl StaticConnectivity {
    pub fn online() -> Self {
        Self::default()
    }

    pub fn offline() -> Self {
        let c = Self::default();
        c.set_online(false);
        c
    }

    pub fn set_online(&self, online: bool) {
        self.offline.store(!online, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl Connectivity for StaticConnectivity {
    async fn is_online(&self) -> bool {
        !self.offline.load(Ordering::SeqCst)
    }
}
