//! Host-wide network byte counters.

use serde::Serialize;
use sysinfo::Networks;

/// Totals summed over every interface, loopback included.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NetSnapshot {
    pub bytes_recv: u64,
    pub bytes_sent: u64,
}

impl NetSnapshot {
    /// Per-counter difference. A counter that went backwards (wrap or
    /// interface removal) yields zero rather than underflowing.
    pub fn delta_since(&self, earlier: &NetSnapshot) -> NetSnapshot {
        NetSnapshot {
            bytes_recv: self.bytes_recv.saturating_sub(earlier.bytes_recv),
            bytes_sent: self.bytes_sent.saturating_sub(earlier.bytes_sent),
        }
    }
}

pub trait NetworkCounters {
    fn snapshot(&mut self) -> NetSnapshot;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct HostNetwork;

impl NetworkCounters for HostNetwork {
    fn snapshot(&mut self) -> NetSnapshot {
        let networks = Networks::new_with_refreshed_list();
        networks
            .list()
            .values()
            .fold(NetSnapshot::default(), |acc, data| NetSnapshot {
                bytes_recv: acc.bytes_recv.saturating_add(data.total_received()),
                bytes_sent: acc.bytes_sent.saturating_add(data.total_transmitted()),
            })
    }
}
