//! Per-target in-flight mutation guard.

use std::collections::HashSet;
use std::sync::Mutex;

/// Tracks which mutation targets have a request outstanding.
///
/// Acquiring a permit for a busy target fails, so a repeated trigger while a
/// request is in flight is simply ignored. Because the permit is held across
/// both the remote call and the local apply, mutations on one target are
/// fully serialized: the local apply of one mutation can never interleave
/// with the remote call of the next.
#[derive(Debug, Default)]
pub struct MutationGuard {
    busy: Mutex<HashSet<String>>,
}

impl MutationGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `target`. `None` means a mutation for it is already in flight.
    pub fn try_begin(&self, target: &str) -> Option<MutationPermit<'_>> {
        let mut busy = self.lock();
        if !busy.insert(target.to_string()) {
            return None;
        }
        Some(MutationPermit {
            guard: self,
            target: target.to_string(),
        })
    }

    pub fn is_busy(&self, target: &str) -> bool {
        self.lock().contains(target)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashSet<String>> {
        match self.busy.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// RAII claim on a mutation target; releases the target on drop.
#[derive(Debug)]
pub struct MutationPermit<'a> {
    guard: &'a MutationGuard,
    target: String,
}

impl Drop for MutationPermit<'_> {
    fn drop(&mut self) {
        self.guard.lock().remove(&self.target);
    }
}
