//! Automated review iteration counting.

/// Stateless helper for counting failed automated reviews.
///
/// The tracker only computes values; the engine persists them on the task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IterationTracker;

impl IterationTracker {
    /// Returns the count after one more failed review.
    #[must_use]
    pub const fn increment(count: u32) -> u32 {
        count.saturating_add(1)
    }

    /// Returns `true` once `count` has reached the cap.
    #[must_use]
    pub const fn exceeded(count: u32, max: u32) -> bool {
        count >= max
    }
}
