//! Types that mirror the agent's stats JSON schema.

use serde::Deserialize;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct CpuUsage {
    // cumulative ns consumed by the container
    #[serde(default)]
    pub total_usage: u64,
    #[serde(default)]
    pub percpu_usage: Vec<u64>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct CpuStats {
    #[serde(default)]
    pub cpu_usage: CpuUsage,
    // cumulative ns consumed by the whole host
    #[serde(default)]
    pub system_cpu_usage: u64,
    #[serde(default)]
    pub online_cpus: Option<u32>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct MemoryStats {
    #[serde(default)]
    pub usage: u64,
    #[serde(default)]
    pub limit: u64,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct NetworkStats {
    #[serde(default)]
    pub rx_bytes: u64,
    #[serde(default)]
    pub tx_bytes: u64,
}

/// One decoded frame of a container stats stream.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct StatsRecord {
    #[serde(default)]
    pub read: Option<String>,
    #[serde(default)]
    pub cpu_stats: CpuStats,
    #[serde(default)]
    pub memory_stats: MemoryStats,
    #[serde(default)]
    pub network: NetworkStats,
}

/// The counters the display consumes from a [`StatsRecord`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Sample {
    pub cpu_total: u64,
    pub system_total: u64,
    pub online_cpus: u32,
    pub memory_usage: u64,
    pub memory_limit: u64,
    pub network_rx: u64,
    pub network_tx: u64,
}

impl From<&StatsRecord> for Sample {
    fn from(r: &StatsRecord) -> Self {
        // Older agents only report the per-cpu list
        let online_cpus = r
            .cpu_stats
            .online_cpus
            .unwrap_or(r.cpu_stats.cpu_usage.percpu_usage.len() as u32);
        Self {
            cpu_total: r.cpu_stats.cpu_usage.total_usage,
            system_total: r.cpu_stats.system_cpu_usage,
            online_cpus,
            memory_usage: r.memory_stats.usage,
            memory_limit: r.memory_stats.limit,
            network_rx: r.network.rx_bytes,
            network_tx: r.network.tx_bytes,
        }
    }
}
