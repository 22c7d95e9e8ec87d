//! Lock-poison handling
//!
//! A poisoned lock means some task panicked while holding it. These helpers turn that into
//! the caller's own error type instead of propagating the panic.

use std::sync::{LockResult, MutexGuard, RwLockReadGuard, RwLockWriteGuard};

/// Convert a poisoned `Mutex::lock()` into an error
///
/// ```
/// use std::sync::Mutex;
/// use surfacewatch::core::sync::handle_mutex_poison;
/// use surfacewatch::store::api::StoreError;
///
/// let jobs = Mutex::new(Vec::<String>::new());
/// let guard = handle_mutex_poison(jobs.lock(), StoreError::Backend).unwrap();
/// assert!(guard.is_empty());
/// ```
pub fn handle_mutex_poison<'a, T, E>(
    result: LockResult<MutexGuard<'a, T>>,
    error_constructor: impl FnOnce(String) -> E,
) -> Result<MutexGuard<'a, T>, E> {
    result.map_err(|_| error_constructor("internal lock poisoned by an earlier panic".to_string()))
}

/// Convert a poisoned `RwLock::read()` into an error
pub fn handle_rwlock_read<'a, T, E>(
    result: LockResult<RwLockReadGuard<'a, T>>,
    error_constructor: impl FnOnce(String) -> E,
) -> Result<RwLockReadGuard<'a, T>, E> {
    result.map_err(|_| {
        error_constructor("internal read lock poisoned by an earlier panic".to_string())
    })
}

/// Convert a poisoned `RwLock::write()` into an error
pub fn handle_rwlock_write<'a, T, E>(
    result: LockResult<RwLockWriteGuard<'a, T>>,
    error_constructor: impl FnOnce(String) -> E,
) -> Result<RwLockWriteGuard<'a, T>, E> {
    result.map_err(|_| {
        error_constructor("internal write lock poisoned by an earlier panic".to_string())
    })
}
