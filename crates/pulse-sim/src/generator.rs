//! Synthetic traffic
//!
//! [`PacketGenerator`] produces plausible packet records from a seeded
//! xorshift sequence, so runs with the same seed are identical.
//! [`StatsAccumulator`] folds them into the snapshots a real backend would
//! push.

use std::collections::{HashMap, HashSet};
use std::time::Instant;

use chrono::{DateTime, Utc};
use pulse_engine::ArrivalRateMeter;
use pulse_protocol::models::HIGH_ANOMALY_THRESHOLD;
use pulse_protocol::{AggregateSnapshot, PacketRecord, ProtocolCount, SourceCount};

/// Sources listed in a snapshot
pub const TOP_SOURCES: usize = 5;

const LOCAL_HOSTS: &[&str] = &[
    "192.168.1.10",
    "192.168.1.23",
    "192.168.1.42",
    "192.168.1.105",
    "10.0.0.5",
    "10.0.0.17",
];

const REMOTE_HOSTS: &[&str] = &[
    "8.8.8.8",
    "1.1.1.1",
    "142.250.74.110",
    "151.101.1.69",
    "104.16.132.229",
    "52.84.150.11",
    "203.0.113.66",
];

/// (protocol, relative weight)
const PROTOCOLS: &[(&str, u64)] = &[
    ("TCP", 40),
    ("UDP", 20),
    ("HTTPS", 15),
    ("HTTP", 10),
    ("DNS", 10),
    ("ICMP", 5),
];

const TCP_FLAGS: &[&str] = &["SYN", "SYN, ACK", "ACK", "PSH, ACK", "FIN, ACK", "RST"];

/// Seeded packet source
#[derive(Debug, Clone)]
pub struct PacketGenerator {
    state: u64,
    next_id: u64,
}

impl PacketGenerator {
    /// Create a generator; a zero seed is replaced by a fixed constant
    pub fn new(seed: u64) -> Self {
        Self {
            state: if seed == 0 { 0x9E37_79B9_7F4A_7C15 } else { seed },
            next_id: 1,
        }
    }

    fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }

    /// Uniform in `0..n`
    fn below(&mut self, n: u64) -> u64 {
        self.next_u64() % n.max(1)
    }

    /// Uniform in `[0, 1)`
    fn unit(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
        items[self.below(items.len() as u64) as usize]
    }

    fn protocol(&mut self) -> &'static str {
        let total: u64 = PROTOCOLS.iter().map(|(_, w)| w).sum();
        let mut roll = self.below(total);
        for &(name, weight) in PROTOCOLS {
            if roll < weight {
                return name;
            }
            roll -= weight;
        }
        PROTOCOLS[0].0
    }

    /// Mostly quiet traffic with occasional medium and high scores
    fn score(&mut self) -> f64 {
        let roll = self.unit();
        let jitter = self.unit();
        if roll < 0.04 {
            0.71 + jitter * 0.29
        } else if roll < 0.12 {
            0.51 + jitter * 0.19
        } else {
            jitter * 0.45
        }
    }

    /// Produce the next packet, stamped `timestamp`
    pub fn next_packet(&mut self, timestamp: DateTime<Utc>) -> PacketRecord {
        let id = self.next_id;
        self.next_id += 1;

        let outbound = self.below(2) == 0;
        let local = self.pick(LOCAL_HOSTS);
        let remote = self.pick(REMOTE_HOSTS);
        let (src, dst) = if outbound { (local, remote) } else { (remote, local) };

        let protocol = self.protocol();
        let size = 40 + self.below(1461);
        let ttl = [64u64, 128, 255][self.below(3) as usize];
        let sport = 1024 + self.below(64_000);

        let (info, dport) = match protocol {
            "DNS" => (format!("Standard query A host{}.example.com", self.below(50)), 53),
            "ICMP" => ("Echo (ping) request".to_string(), 0),
            "HTTP" => ("GET /index.html HTTP/1.1".to_string(), 80),
            "HTTPS" => ("Application Data".to_string(), 443),
            "UDP" => (format!("{} -> 5353 Len={}", sport, size.saturating_sub(28)), 5353),
            _ => {
                let flags = self.pick(TCP_FLAGS);
                let dport = [22u64, 80, 443, 3306, 8080][self.below(5) as usize];
                (format!("{} -> {} [{}]", sport, dport, flags), dport)
            }
        };

        let mut headers = vec![
            ("version".to_string(), "4".to_string()),
            ("ttl".to_string(), ttl.to_string()),
            ("checksum".to_string(), format!("0x{:04x}", self.below(0x1_0000))),
        ];
        if dport != 0 {
            headers.push(("srcPort".to_string(), sport.to_string()));
            headers.push(("dstPort".to_string(), dport.to_string()));
        }

        let mut packet =
            PacketRecord::new(id.to_string(), timestamp, src, dst, protocol, size)
                .with_info(info)
                .with_headers(headers)
                .with_anomaly_score(self.score());

        if self.below(4) == 0 {
            let payload: String = (0..16)
                .map(|_| format!("{:02x}", self.below(256)))
                .collect::<Vec<_>>()
                .join(" ");
            packet = packet.with_payload(payload);
        }
        packet
    }
}

/// Running totals turned into snapshots
#[derive(Debug, Clone, Default)]
pub struct StatsAccumulator {
    total: u64,
    bytes: u64,
    anomalies: u64,
    addresses: HashSet<String>,
    protocols: Vec<ProtocolCount>,
    sources: HashMap<String, u64>,
    meter: ArrivalRateMeter,
}

impl StatsAccumulator {
    /// Create empty totals
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one packet in
    pub fn record(&mut self, packet: &PacketRecord, now: Instant) {
        self.total += 1;
        self.bytes += packet.size;
        if packet.anomaly_score > HIGH_ANOMALY_THRESHOLD {
            self.anomalies += 1;
        }
        self.addresses.insert(packet.source_ip.clone());
        self.addresses.insert(packet.destination_ip.clone());
        *self.sources.entry(packet.source_ip.clone()).or_insert(0) += 1;

        match self.protocols.iter_mut().find(|c| c.protocol == packet.protocol) {
            Some(count) => count.count += 1,
            None => self.protocols.push(ProtocolCount {
                protocol: packet.protocol.clone(),
                count: 1,
            }),
        }

        self.meter.record(now);
    }

    /// Current totals as a snapshot
    pub fn snapshot(&self, now: Instant) -> AggregateSnapshot {
        let mut top: Vec<SourceCount> = self
            .sources
            .iter()
            .map(|(ip, count)| SourceCount {
                ip: ip.clone(),
                count: *count,
            })
            .collect();
        top.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.ip.cmp(&b.ip)));
        top.truncate(TOP_SOURCES);

        AggregateSnapshot {
            total_packets: self.total,
            packets_per_second: self.meter.rate(now),
            anomalies: self.anomalies,
            data_volume: format!("{:.2} MB", self.bytes as f64 / (1024.0 * 1024.0)),
            unique_ips: self.addresses.len() as u64,
            protocol_distribution: self.protocols.clone(),
            top_sources: top,
        }
    }

    /// Back to zero
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulse_protocol::Severity;

    #[test]
    fn test_same_seed_same_sequence() {
        let now = Utc::now();
        let mut a = PacketGenerator::new(7);
        let mut b = PacketGenerator::new(7);
        for _ in 0..50 {
            assert_eq!(a.next_packet(now), b.next_packet(now));
        }
    }

    #[test]
    fn test_packets_are_well_formed() {
        let mut generator = PacketGenerator::new(42);
        let now = Utc::now();
        let packets: Vec<_> = (0..500).map(|_| generator.next_packet(now)).collect();

        assert_eq!(packets[0].id.as_str(), "1");
        assert_eq!(packets[499].id.as_str(), "500");
        for p in &packets {
            assert!((40..=1500).contains(&p.size));
            assert!((0.0..=1.0).contains(&p.anomaly_score));
            assert!(PROTOCOLS.iter().any(|(name, _)| *name == p.protocol));
            assert!(p.headers.is_some());
        }
        assert!(packets.iter().any(|p| p.severity() == Severity::High));
        assert!(packets.iter().any(|p| p.severity() == Severity::Low));
    }

    #[test]
    fn test_accumulator_snapshot() {
        let mut stats = StatsAccumulator::new();
        let now = Instant::now();
        let ts = Utc::now();
        let packets = [
            PacketRecord::new("1", ts, "10.0.0.1", "8.8.8.8", "UDP", 524_288),
            PacketRecord::new("2", ts, "10.0.0.1", "1.1.1.1", "TCP", 524_288)
                .with_anomaly_score(0.9),
            PacketRecord::new("3", ts, "10.0.0.2", "8.8.8.8", "UDP", 0),
        ];
        for p in &packets {
            stats.record(p, now);
        }

        let snapshot = stats.snapshot(now);
        assert_eq!(snapshot.total_packets, 3);
        assert_eq!(snapshot.anomalies, 1);
        assert_eq!(snapshot.unique_ips, 4);
        assert_eq!(snapshot.data_volume, "1.00 MB");
        assert_eq!(snapshot.packets_per_second, 3.0);
        assert_eq!(snapshot.protocol_distribution[0].protocol, "UDP");
        assert_eq!(snapshot.protocol_distribution[0].count, 2);
        assert_eq!(snapshot.top_sources[0].ip, "10.0.0.1");
        assert_eq!(snapshot.top_sources[0].count, 2);

        stats.reset();
        assert_eq!(stats.snapshot(now).total_packets, 0);
        assert_eq!(stats.snapshot(now).data_volume, "0.00 MB");
    }

    #[test]
    fn test_top_sources_capped() {
        let mut stats = StatsAccumulator::new();
        let now = Instant::now();
        for i in 0..8 {
            stats.record(
                &PacketRecord::new(i.to_string(), Utc::now(), format!("10.0.0.{}", i), "x", "TCP", 1),
                now,
            );
        }
        assert_eq!(stats.snapshot(now).top_sources.len(), TOP_SOURCES);
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_snapshot_agrees_with_packets(seed in any::<u64>(), count in 0usize..200) {
                let mut generator = PacketGenerator::new(seed);
                let mut stats = StatsAccumulator::new();
                let now = Instant::now();
                let ts = Utc::now();
                for _ in 0..count {
                    stats.record(&generator.next_packet(ts), now);
                }

                let snapshot = stats.snapshot(now);
                prop_assert_eq!(snapshot.total_packets, count as u64);
                let by_protocol: u64 = snapshot.protocol_distribution.iter().map(|c| c.count).sum();
                prop_assert_eq!(by_protocol, count as u64);
                prop_assert!(snapshot.anomalies <= snapshot.total_packets);
                prop_assert!(snapshot.top_sources.len() <= TOP_SOURCES);
                prop_assert!(snapshot
                    .top_sources
                    .windows(2)
                    .all(|w| w[0].count >= w[1].count));
            }
        }
    }
}

