//! Shared agent state: sysinfo handles and stream settings.

use std::sync::atomic::AtomicUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};

use sysinfo::{CpuRefreshKind, MemoryRefreshKind, Networks, RefreshKind, System};
use tokio::sync::Mutex;

pub type SharedSystem = Arc<Mutex<System>>;
pub type SharedNetworks = Arc<Mutex<Networks>>;

#[derive(Clone)]
pub struct AppState {
    // Persistent sysinfo handles
    pub sys: SharedSystem,
    pub nets: SharedNetworks,

    // Zero point of the system cpu counter
    pub started: Instant,
    pub interval: Duration,
    pub auth_token: Option<String>,
    pub client_count: Arc<AtomicUsize>,
}

impl AppState {
    pub fn new(interval: Duration, auth_token: Option<String>) -> Self {
        let refresh_kind = RefreshKind::nothing()
            .with_cpu(CpuRefreshKind::everything())
            .with_memory(MemoryRefreshKind::everything());
        let sys = System::new_with_specifics(refresh_kind);
        Self {
            sys: Arc::new(Mutex::new(sys)),
            nets: Arc::new(Mutex::new(Networks::new_with_refreshed_list())),
            started: Instant::now(),
            interval,
            auth_token,
            client_count: Arc::new(AtomicUsize::new(0)),
        }
    }
}
