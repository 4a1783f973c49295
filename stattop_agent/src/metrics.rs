//! Per-container stats using sysinfo. A container is every host process carrying its name.

use std::ffi::OsStr;
use std::time::Duration;

use sysinfo::{Process, ProcessRefreshKind, ProcessesToUpdate};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing::warn;

use crate::state::AppState;
use crate::types::{CpuStats, CpuUsage, MemoryStats, NetworkStats, StatsRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcUsage {
    pub cpu_time_ms: u64,
    pub memory: u64,
}

/// Summed (cpu ns, memory bytes) of a container's processes, or None when it has none.
pub fn aggregate<I>(procs: I) -> Option<(u64, u64)>
where
    I: IntoIterator<Item = ProcUsage>,
{
    procs.into_iter().fold(None, |acc, p| {
        let (cpu, mem) = acc.unwrap_or((0, 0));
        Some((
            cpu.saturating_add(p.cpu_time_ms.saturating_mul(1_000_000)),
            mem.saturating_add(p.memory),
        ))
    })
}

/// Host cpu counter: every cpu has been available for the whole uptime of the agent.
pub fn system_cpu_ns(elapsed: Duration, online_cpus: u32) -> u64 {
    let ns = u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX);
    ns.saturating_mul(u64::from(online_cpus))
}

fn is_member(p: &Process, name: &str) -> bool {
    // threads are already accounted for in their process
    p.thread_kind().is_none() && p.name() == OsStr::new(name)
}

fn refresh_processes(sys: &mut sysinfo::System) {
    sys.refresh_processes_specifics(
        ProcessesToUpdate::All,
        true,
        ProcessRefreshKind::nothing().with_cpu().with_memory(),
    );
}

pub async fn container_exists(state: &AppState, name: &str) -> bool {
    let mut sys = state.sys.lock().await;
    refresh_processes(&mut sys);
    sys.processes().values().any(|p| is_member(p, name))
}

/// One stats frame for `name`, or None once the container has no processes left.
pub async fn collect_stats(state: &AppState, name: &str) -> Option<StatsRecord> {
    let (total_usage, usage, limit, online_cpus) = {
        let mut sys = state.sys.lock().await;
        refresh_processes(&mut sys);
        sys.refresh_memory();
        let (cpu, mem) = aggregate(
            sys.processes()
                .values()
                .filter(|p| is_member(p, name))
                .map(|p| ProcUsage {
                    cpu_time_ms: p.accumulated_cpu_time(),
                    memory: p.memory(),
                }),
        )?;
        let online_cpus = u32::try_from(sys.cpus().len().max(1)).unwrap_or(u32::MAX);
        (cpu, mem, sys.total_memory(), online_cpus)
    };

    let (rx_bytes, tx_bytes) = {
        let mut nets = state.nets.lock().await;
        nets.refresh(true);
        nets.iter().fold((0u64, 0u64), |(rx, tx), (_, data)| {
            (
                rx.saturating_add(data.total_received()),
                tx.saturating_add(data.total_transmitted()),
            )
        })
    };

    let read = OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_else(|e| {
        warn!("timestamp formatting failed: {e}");
        String::new()
    });

    Some(StatsRecord {
        read,
        cpu_stats: CpuStats {
            cpu_usage: CpuUsage { total_usage },
            system_cpu_usage: system_cpu_ns(state.started.elapsed(), online_cpus),
            online_cpus,
        },
        memory_stats: MemoryStats { usage, limit },
        network: NetworkStats { rx_bytes, tx_bytes },
    })
}
