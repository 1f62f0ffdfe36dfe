//! Conversion of raw CPU/memory amounts into Kubernetes quantity strings

const KI: u64 = 1024;
const MI: u64 = KI * 1024;
const GI: u64 = MI * 1024;

/// Resource a quantity describes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    /// CPU in cores
    Cpu,
    /// Memory in bytes
    Memory,
}

/// Format `amount` of `kind` as a quantity string.
///
/// Memory amounts are truncated to whole bytes first. Amounts are expected to
/// be non-negative.
pub fn format_quantity(kind: ResourceKind, amount: f64) -> String {
    match kind {
        ResourceKind::Cpu => format_cpu(amount),
        // `as` saturates: negatives become 0
        ResourceKind::Memory => format_memory(amount.trunc() as u64),
    }
}

/// Sub-core amounts become truncated millicores, anything else is kept as is
pub fn format_cpu(cores: f64) -> String {
    if cores < 1.0 {
        format!("{}m", (cores * 1000.0).trunc() as i64)
    } else {
        cores.to_string()
    }
}

/// Tiered byte formatting with truncating division
pub fn format_memory(bytes: u64) -> String {
    if bytes < KI {
        format!("{}B", bytes)
    } else if bytes < MI {
        format!("{}k", bytes / KI)
    } else if bytes < GI {
        format!("{}Mi", bytes / MI)
    } else {
        format!("{}Gi", bytes / GI)
    }
}
