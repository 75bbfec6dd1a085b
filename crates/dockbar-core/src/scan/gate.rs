use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Admits at most one scan at a time. A request made while a scan is in
/// flight is refused, never queued.
#[derive(Debug, Clone, Default)]
pub struct ScanGate {
    busy: Arc<AtomicBool>,
}

impl ScanGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn try_acquire(&self) -> Option<ScanPermit> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| ScanPermit {
                busy: self.busy.clone(),
            })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

/// Held for the lifetime of one scan; releases the gate on drop.
#[derive(Debug)]
pub struct ScanPermit {
    busy: Arc<AtomicBool>,
}

impl Drop for ScanPermit {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}
