//! CPU percentage from two consecutive cumulative counter readings.

use crate::types::Sample;

/// Percentage of one processing unit consumed between the previous reading and `sample`,
/// scaled by the unit count (a container saturating two cores reports 200%).
///
/// Returns 0.0 when either counter did not advance, which covers the first reading after a
/// counter reset as well as hosts whose system clock went backwards.
pub fn calculate_cpu_percent(previous_cpu: u64, previous_system: u64, sample: &Sample) -> f64 {
    let cpu_delta = sample.cpu_total.checked_sub(previous_cpu).unwrap_or(0);
    let system_delta = sample.system_total.checked_sub(previous_system).unwrap_or(0);
    if cpu_delta == 0 || system_delta == 0 {
        return 0.0;
    }
    (cpu_delta as f64 / system_delta as f64) * f64::from(sample.online_cpus) * 100.0
}
