//! Fixed-capacity admission counter.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Counts in-flight deliveries against a fixed capacity.
///
/// Acquisition is a single compare-and-swap, so concurrent fetches can never
/// push `in_use` past `capacity`. Release happens when the [`SlotGuard`] is
/// dropped, including when the owning task is aborted.
#[derive(Debug)]
pub struct AdmissionBudget {
    capacity: usize,
    in_use: AtomicUsize,
    peak: AtomicUsize,
}

impl AdmissionBudget {
    /// Creates a budget with `capacity` slots.
    #[must_use]
    pub const fn new(capacity: usize) -> Self {
        Self {
            capacity,
            in_use: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    /// Total slots.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Slots currently held.
    #[must_use]
    pub fn in_use(&self) -> usize {
        self.in_use.load(Ordering::Acquire)
    }

    /// Highest `in_use` ever observed.
    #[must_use]
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::Acquire)
    }

    /// Takes a slot if one is free.
    pub fn try_acquire(&self) -> Option<SlotGuard<'_>> {
        let mut current = self.in_use.load(Ordering::Acquire);
        loop {
            if current >= self.capacity {
                return None;
            }
            match self.in_use.compare_exchange_weak(
                current,
                current + 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => {
                    self.peak.fetch_max(current + 1, Ordering::AcqRel);
                    return Some(SlotGuard { budget: self });
                }
                Err(actual) => current = actual,
            }
        }
    }
}

/// A held admission slot. Dropping it frees the slot.
#[derive(Debug)]
#[must_use = "dropping the guard releases the slot immediately"]
pub struct SlotGuard<'a> {
    budget: &'a AdmissionBudget,
}

impl Drop for SlotGuard<'_> {
    fn drop(&mut self) {
        self.budget.in_use.fetch_sub(1, Ordering::AcqRel);
    }
}
