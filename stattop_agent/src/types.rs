//! Stats frame sent to clients, one per interval per stream.

use serde::Serialize;

#[derive(Debug, Serialize, Clone, Default)]
pub struct CpuUsage {
    // ns of cpu time used by every process of the container
    pub total_usage: u64,
}

#[derive(Debug, Serialize, Clone, Default)]
pub struct CpuStats {
    pub cpu_usage: CpuUsage,
    // ns of wall time since the agent started, times online cpus
    pub system_cpu_usage: u64,
    pub online_cpus: u32,
}

#[derive(Debug, Serialize, Clone, Default)]
pub struct MemoryStats {
    pub usage: u64,
    pub limit: u64,
}

#[derive(Debug, Serialize, Clone, Default)]
pub struct NetworkStats {
    // host-wide cumulative totals
    pub rx_bytes: u64,
    pub tx_bytes: u64,
}

#[derive(Debug, Serialize, Clone, Default)]
pub struct StatsRecord {
    pub read: String,
    pub cpu_stats: CpuStats,
    pub memory_stats: MemoryStats,
    pub network: NetworkStats,
}
