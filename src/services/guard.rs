//! Spärr mot överlappande destruktiva operationer

use std::sync::atomic::{AtomicBool, Ordering};

use crate::utils::{AppError, AppResult};

/// Flagga för en pågående operation
pub struct OperationGuard {
    name: &'static str,
    running: AtomicBool,
}

impl OperationGuard {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            running: AtomicBool::new(false),
        }
    }

    /// Ta spärren, eller `AppError::Busy` om operationen redan pågår
    pub fn try_acquire(&self) -> AppResult<OperationToken<'_>> {
        self.running
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .map(|_| OperationToken { guard: self })
            .map_err(|_| AppError::Busy(self.name))
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}

/// Spärrarna för de operationer som inte får överlappa. Delas av alla
/// kloner av en `Database`.
pub struct OperationGuards {
    pub backup: OperationGuard,
    pub restore: OperationGuard,
    pub import: OperationGuard,
}

impl Default for OperationGuards {
    fn default() -> Self {
        Self {
            backup: OperationGuard::new("Säkerhetskopiering"),
            restore: OperationGuard::new("Återställning"),
            import: OperationGuard::new("Import"),
        }
    }
}

/// Släpper spärren när den går ur scope
pub struct OperationToken<'a> {
    guard: &'a OperationGuard,
}

impl Drop for OperationToken<'_> {
    fn drop(&mut self) {
        self.guard.running.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_acquire_is_rejected_until_release() {
        let guard = OperationGuard::new("Återställning");

        let token = guard.try_acquire().unwrap();
        assert!(guard.is_running());
        assert!(matches!(guard.try_acquire(), Err(AppError::Busy("Återställning"))));

        drop(token);
        assert!(!guard.is_running());
        assert!(guard.try_acquire().is_ok());
    }
}
