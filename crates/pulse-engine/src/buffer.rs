//! Bounded, newest-first packet working set

use std::collections::VecDeque;

use pulse_protocol::{PacketId, PacketRecord};

/// Default number of records retained
pub const DEFAULT_CAPACITY: usize = 1000;

/// Retained packet records, newest first
///
/// Inserting beyond capacity evicts from the oldest end. Eviction never
/// reorders the records that remain.
#[derive(Debug, Clone)]
pub struct PacketBuffer {
    records: VecDeque<PacketRecord>,
    capacity: usize,
}

impl Default for PacketBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl PacketBuffer {
    /// Create an empty buffer holding at most `capacity` records
    ///
    /// A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            records: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Prepend a record, returning whatever fell off the tail
    pub fn insert(&mut self, record: PacketRecord) -> Vec<PacketRecord> {
        self.records.push_front(record);

        let mut evicted = Vec::new();
        while self.records.len() > self.capacity {
            if let Some(old) = self.records.pop_back() {
                evicted.push(old);
            }
        }
        evicted
    }

    /// Drop every record
    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Iterate newest first
    pub fn iter(&self) -> impl Iterator<Item = &PacketRecord> {
        self.records.iter()
    }

    /// Record at `index` (0 is the newest)
    pub fn get(&self, index: usize) -> Option<&PacketRecord> {
        self.records.get(index)
    }

    /// Look up a record by id
    pub fn find(&self, id: &PacketId) -> Option<&PacketRecord> {
        self.records.iter().find(|r| &r.id == id)
    }

    /// Number of retained records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether nothing is retained
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Maximum number of retained records
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn packet(id: usize) -> PacketRecord {
        PacketRecord::new(id.to_string(), Utc::now(), "10.0.0.1", "10.0.0.2", "TCP", 60)
    }

    #[test]
    fn test_newest_first() {
        let mut buffer = PacketBuffer::new(10);
        buffer.insert(packet(1));
        buffer.insert(packet(2));
        buffer.insert(packet(3));

        let ids: Vec<_> = buffer.iter().map(|r| r.id.as_str().to_string()).collect();
        assert_eq!(ids, vec!["3", "2", "1"]);
        assert_eq!(buffer.get(0).unwrap().id.as_str(), "3");
    }

    #[test]
    fn test_eviction_at_capacity() {
        let mut buffer = PacketBuffer::new(3);
        for id in 1..=3 {
            assert!(buffer.insert(packet(id)).is_empty());
        }

        let evicted = buffer.insert(packet(4));
        assert_eq!(evicted.len(), 1);
        assert_eq!(evicted[0].id.as_str(), "1");
        assert_eq!(buffer.len(), 3);
        assert!(buffer.find(&PacketId::new("1")).is_none());
        assert!(buffer.find(&PacketId::new("4")).is_some());
    }

    #[test]
    fn test_default_capacity_holds_exactly_one_thousand() {
        let mut buffer = PacketBuffer::default();
        for id in 0..1001 {
            buffer.insert(packet(id));
        }
        assert_eq!(buffer.len(), DEFAULT_CAPACITY);
        assert_eq!(buffer.get(0).unwrap().id.as_str(), "1000");
        assert_eq!(buffer.get(999).unwrap().id.as_str(), "1");
    }

    #[test]
    fn test_clear() {
        let mut buffer = PacketBuffer::new(5);
        buffer.insert(packet(1));
        buffer.clear();
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_zero_capacity_is_raised() {
        let mut buffer = PacketBuffer::new(0);
        buffer.insert(packet(1));
        buffer.insert(packet(2));
        assert_eq!(buffer.capacity(), 1);
        assert_eq!(buffer.get(0).unwrap().id.as_str(), "2");
    }
}
