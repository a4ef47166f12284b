//! Deep-equality change detection.
//!
//! Callers of links and viewports routinely pass freshly built but
//! structurally identical params/options values on every render.
//! [`DeepMemo`] turns that stream into a monotonic version token that
//! bumps only when the value actually changes by structural comparison,
//! so downstream recomputation and resubscription key off the version
//! instead of reference identity.

/// Monotonic version counter over one logical slot of structurally
/// compared values.
///
/// # Invariants
///
/// 1. The returned version never decreases.
/// 2. The version bumps by exactly 1 when the new value differs from the
///    immediately previous one, and not otherwise.
/// 3. Only the most recent value is retained for comparison.
#[derive(Debug, Default)]
pub struct DeepMemo<T> {
    last: Option<T>,
    version: u64,
}

impl<T: PartialEq> DeepMemo<T> {
    /// An empty slot; the first [`version_of`](Self::version_of) call
    /// returns 1.
    #[must_use]
    pub fn new() -> Self {
        Self {
            last: None,
            version: 0,
        }
    }

    /// Record `value` and return its version.
    ///
    /// Returns the previous version when `value` equals the previous
    /// value; otherwise stores `value` and returns a bumped version.
    pub fn version_of(&mut self, value: T) -> u64 {
        match &self.last {
            Some(previous) if *previous == value => self.version,
            _ => {
                self.last = Some(value);
                self.version += 1;
                self.version
            }
        }
    }

    /// Version of the most recently recorded value (0 before any).
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }
}
