//! Sequence guard for the repair timer.
//!
//! When a repair fires, the refresh it requests comes back as ordinary draw
//! packets. The guard remembers which sequence that refresh is expected to
//! carry so those packets cannot arm the timer again.

/// Per-window repair bookkeeping keyed on draw sequence numbers
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SequenceGuard {
    /// Sequences up to and including this one never arm the timer
    ignore_sequence: Option<u64>,
    /// Area that satisfies the outstanding repair
    min_pixels: Option<u64>,
}

impl SequenceGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compared by value only, so out of order completions are harmless
    pub fn should_suppress(&self, sequence: u64) -> bool {
        matches!(self.ignore_sequence, Some(ignore) if sequence <= ignore)
    }

    /// Record a newly armed repair
    pub fn arm(&mut self, sequence: u64, pixel_count: u64) {
        self.ignore_sequence = Some(sequence.saturating_add(1));
        self.min_pixels = Some(pixel_count);
    }

    /// Outstanding repair was satisfied by a large enough update
    pub fn reset(&mut self) {
        self.ignore_sequence = None;
        self.min_pixels = None;
    }

    /// Repair fired: keep the watermark for the refresh it triggered
    pub fn retire(&mut self) {
        self.min_pixels = None;
    }

    /// Does an update of this size cover the outstanding repair?
    pub fn satisfies(&self, pixel_count: u64) -> bool {
        self.min_pixels.is_some_and(|min| pixel_count >= min)
    }

    pub fn ignore_sequence(&self) -> Option<u64> {
        self.ignore_sequence
    }

    pub fn min_pixels(&self) -> Option<u64> {
        self.min_pixels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_suppresses_nothing() {
        let guard = SequenceGuard::new();
        assert!(!guard.should_suppress(0));
        assert!(!guard.satisfies(u64::MAX));
    }

    #[test]
    fn test_arm_sets_watermark() {
        let mut guard = SequenceGuard::new();
        guard.arm(10, 5000);
        assert_eq!(guard.ignore_sequence(), Some(11));
        assert!(guard.should_suppress(9));
        assert!(guard.should_suppress(11));
        assert!(!guard.should_suppress(12));
        assert!(guard.satisfies(5000));
        assert!(!guard.satisfies(4999));
    }

    #[test]
    fn test_retire_keeps_watermark() {
        let mut guard = SequenceGuard::new();
        guard.arm(3, 100);
        guard.retire();
        assert!(guard.should_suppress(4));
        assert_eq!(guard.min_pixels(), None);

        guard.reset();
        assert!(!guard.should_suppress(4));
    }
}
