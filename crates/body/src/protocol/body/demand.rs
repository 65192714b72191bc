use std::sync::atomic::{AtomicU64, Ordering};

/// Outstanding demand granted by a body consumer.
///
/// Demand counts batches, not bytes: delivering one batch takes exactly one unit,
/// whatever its size. The counter saturates at `u64::MAX` and never goes below zero.
#[derive(Debug, Default)]
pub struct Demand {
    value: AtomicU64,
}

impl Demand {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `n` units of demand, returning true if there was none outstanding before.
    pub fn increase(&self, n: u64) -> bool {
        let previous = self
            .value
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| Some(current.saturating_add(n)))
            .unwrap_or_else(|current| current);
        previous == 0
    }

    /// Takes one unit of demand, returning false if none was outstanding.
    pub fn try_decrement(&self) -> bool {
        self.value.fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| current.checked_sub(1)).is_ok()
    }

    #[inline]
    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Acquire)
    }

    #[inline]
    pub fn is_fulfilled(&self) -> bool {
        self.get() == 0
    }

    pub fn reset(&self) {
        self.value.store(0, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_increase_and_decrement() {
        let demand = Demand::new();
        assert!(!demand.try_decrement());

        assert!(demand.increase(2));
        assert!(!demand.increase(1));
        assert_eq!(demand.get(), 3);

        assert!(demand.try_decrement());
        assert!(demand.try_decrement());
        assert!(demand.try_decrement());
        assert!(!demand.try_decrement());
        assert!(demand.is_fulfilled());
    }

    #[test]
    fn test_saturates() {
        let demand = Demand::new();
        demand.increase(u64::MAX);
        demand.increase(5);
        assert_eq!(demand.get(), u64::MAX);
        demand.reset();
        assert_eq!(demand.get(), 0);
    }

    #[test]
    fn test_concurrent_decrements_never_exceed_demand() {
        let demand = Arc::new(Demand::new());
        demand.increase(1000);

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let demand = Arc::clone(&demand);
                std::thread::spawn(move || (0..500).filter(|_| demand.try_decrement()).count())
            })
            .collect();

        let taken: usize = handles.into_iter().map(|handle| handle.join().unwrap()).sum();
        assert_eq!(taken, 1000);
        assert!(demand.is_fulfilled());
    }
}
