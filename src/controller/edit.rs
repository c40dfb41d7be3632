use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

/// Serializes workspace edits: while one replace command waits for the
/// client to apply its edit, others are refused instead of racing it.
#[derive(Debug, Clone, Default)]
pub struct EditGuard {
    busy: Arc<AtomicBool>,
}

/// Held while an edit is in flight, released on drop.
#[derive(Debug)]
pub struct EditPermit {
    busy: Arc<AtomicBool>,
}

impl EditGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn try_acquire(&self) -> Option<EditPermit> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        Some(EditPermit {
            busy: Arc::clone(&self.busy),
        })
    }
}

impl Drop for EditPermit {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_edit_at_a_time() {
        let guard = EditGuard::new();
        let permit = guard.try_acquire();
        assert!(permit.is_some());
        assert!(guard.clone().try_acquire().is_none());
        drop(permit);
        assert!(guard.try_acquire().is_some());
    }
}
