//! Scoped environment overrides for tests that read `FOLIO_*` variables.

use std::env;
use std::sync::{Mutex, MutexGuard, PoisonError};

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Holds the environment lock and restores every touched variable on drop.
pub struct ScopedEnv {
    saved: Vec<(String, Option<String>)>,
    _lock: MutexGuard<'static, ()>,
}

impl ScopedEnv {
    pub fn new() -> Self {
        Self {
            saved: Vec::new(),
            _lock: ENV_LOCK.lock().unwrap_or_else(PoisonError::into_inner),
        }
    }

    #[allow(unsafe_code)]
    pub fn set(mut self, key: &str, value: &str) -> Self {
        self.saved.push((key.to_string(), env::var(key).ok()));
        // SAFETY: every test touching the environment holds ENV_LOCK.
        unsafe { env::set_var(key, value) };
        self
    }
}

impl Drop for ScopedEnv {
    #[allow(unsafe_code)]
    fn drop(&mut self) {
        for (key, previous) in self.saved.drain(..).rev() {
            // SAFETY: ENV_LOCK is still held.
            unsafe {
                match previous {
                    Some(value) => env::set_var(&key, value),
                    None => env::remove_var(&key),
                }
            }
        }
    }
}
