//! Admission Control
//!
//! Bounds the number of HTTP lookups in flight at once.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tracing::warn;

use crate::error::{ProxyError, Result};

#[derive(Debug)]
struct Counter {
    in_flight: AtomicUsize,
    max_in_flight: usize,
}

// == Admission Controller ==
/// Shared in-flight counter with a hard ceiling.
///
/// Cloning is cheap; all clones share one counter.
#[derive(Debug, Clone)]
pub struct AdmissionController {
    counter: Arc<Counter>,
}

impl AdmissionController {
    pub fn new(max_in_flight: usize) -> Self {
        Self {
            counter: Arc::new(Counter {
                in_flight: AtomicUsize::new(0),
                max_in_flight,
            }),
        }
    }

    // == Enter ==
    /// Admits one request if the ceiling allows it.
    ///
    /// The slot is taken and checked in one atomic step, so a rejected request
    /// never holds a slot. The returned guard gives the slot back when dropped,
    /// on every exit path.
    pub fn enter(&self) -> Result<AdmissionGuard> {
        let max = self.counter.max_in_flight;
        match self
            .counter
            .in_flight
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                (n < max).then_some(n + 1)
            }) {
            Ok(_) => Ok(AdmissionGuard {
                counter: self.counter.clone(),
            }),
            Err(current) => {
                warn!("Admission rejected: {}/{} requests in flight", current, max);
                Err(ProxyError::CapacitySaturated)
            }
        }
    }

    /// Requests currently admitted.
    pub fn in_flight(&self) -> usize {
        self.counter.in_flight.load(Ordering::Acquire)
    }

    pub fn max_in_flight(&self) -> usize {
        self.counter.max_in_flight
    }
}

// == Admission Guard ==
/// One admitted request. Dropping it releases the slot.
#[derive(Debug)]
#[must_use = "dropping the guard releases the admission slot immediately"]
pub struct AdmissionGuard {
    counter: Arc<Counter>,
}

impl Drop for AdmissionGuard {
    fn drop(&mut self) {
        self.counter.in_flight.fetch_sub(1, Ordering::AcqRel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admits_up_to_ceiling() {
        let admission = AdmissionController::new(2);

        let first = admission.enter().unwrap();
        let second = admission.enter().unwrap();
        assert_eq!(admission.in_flight(), 2);

        assert!(matches!(
            admission.enter(),
            Err(ProxyError::CapacitySaturated)
        ));
        assert_eq!(admission.in_flight(), 2, "Rejection must not take a slot");

        drop(first);
        assert_eq!(admission.in_flight(), 1);
        let third = admission.enter().unwrap();
        assert_eq!(admission.in_flight(), 2);

        drop(second);
        drop(third);
        assert_eq!(admission.in_flight(), 0);
    }

    #[test]
    fn test_rejection_burst_does_not_shift_ceiling() {
        let admission = AdmissionController::new(1);
        let held = admission.enter().unwrap();

        for _ in 0..100 {
            assert!(admission.enter().is_err());
        }
        drop(held);

        assert_eq!(admission.in_flight(), 0);
        assert!(admission.enter().is_ok());
    }

    #[test]
    fn test_guard_released_on_early_return() {
        let admission = AdmissionController::new(1);

        fn failing(admission: &AdmissionController) -> Result<()> {
            let _guard = admission.enter()?;
            Err(ProxyError::KeyAbsent("k".to_string()))
        }

        assert!(failing(&admission).is_err());
        assert_eq!(admission.in_flight(), 0);
    }

    #[test]
    fn test_concurrent_admissions_never_exceed_ceiling() {
        use std::sync::Barrier;
        use std::thread;

        let admission = AdmissionController::new(4);
        let barrier = Arc::new(Barrier::new(16));
        let admitted = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let admission = admission.clone();
                let barrier = barrier.clone();
                let admitted = admitted.clone();
                thread::spawn(move || {
                    let guard = admission.enter();
                    if guard.is_ok() {
                        admitted.fetch_add(1, Ordering::SeqCst);
                    }
                    assert!(admission.in_flight() <= 4);
                    // Hold every guard until all threads have tried
                    barrier.wait();
                    drop(guard);
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(admitted.load(Ordering::SeqCst), 4);
        assert_eq!(admission.in_flight(), 0);
    }
}
