//! Insert-key allocation and the visible-key high-water mark.

/// Two monotone counters shared by the insert path and the readers.
///
/// `issue` hands out fresh insert keys. `limit` is the highest key known to be
/// committed; reads and scans must stay strictly below it. Writes are
/// acknowledged in generation order, so a plain maximum is enough and no
/// out-of-order acknowledgment window is kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcknowledgedCounter {
    issue: u64,
    limit: u64,
}

impl AcknowledgedCounter {
    /// Start allocating at `count_start`; keys below it are treated as loaded.
    pub fn new(count_start: u64) -> Self {
        Self { issue: count_start, limit: count_start.saturating_sub(1) }
    }

    /// Return the next unused insert key and advance.
    pub fn allocate(&mut self) -> u64 {
        let key = self.issue;
        self.issue += 1;
        key
    }

    /// Raise the high-water mark to `key` if it is higher.
    pub fn acknowledge(&mut self, key: u64) {
        if key > self.limit {
            self.limit = key;
        }
    }

    /// Highest key guaranteed visible to readers.
    pub fn last_visible(&self) -> u64 {
        self.limit
    }

    /// Key the next `allocate()` will return.
    pub fn next_issue(&self) -> u64 {
        self.issue
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        let counter = AcknowledgedCounter::new(10);
        assert_eq!(counter.next_issue(), 10);
        assert_eq!(counter.last_visible(), 9);
    }

    #[test]
    fn test_allocate_is_sequential() {
        let mut counter = AcknowledgedCounter::new(5);
        assert_eq!(counter.allocate(), 5);
        assert_eq!(counter.allocate(), 6);
        assert_eq!(counter.allocate(), 7);
        // Allocation alone never exposes keys.
        assert_eq!(counter.last_visible(), 4);
    }

    #[test]
    fn test_acknowledge_never_lowers_limit() {
        let mut counter = AcknowledgedCounter::new(5);
        counter.acknowledge(8);
        assert_eq!(counter.last_visible(), 8);
        counter.acknowledge(6);
        assert_eq!(counter.last_visible(), 8);
        counter.acknowledge(8);
        assert_eq!(counter.last_visible(), 8);
    }

    #[test]
    fn test_zero_start_saturates() {
        let counter = AcknowledgedCounter::new(0);
        assert_eq!(counter.last_visible(), 0);
        assert_eq!(counter.next_issue(), 0);
    }
}
