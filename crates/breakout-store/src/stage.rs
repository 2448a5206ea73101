use std::panic::{self, AssertUnwindSafe};

/// Version stamp of one store input, bumped on every replacement.
pub(crate) type Version = u64;

/// Remembers the upstream versions a stage last ran with.
#[derive(Debug, Default)]
pub(crate) struct Memo<K> {
    key: Option<K>,
}

impl<K: PartialEq> Memo<K> {
    /// Returns whether the stage's output reflects `key`.
    pub(crate) fn is_current(&self, key: &K) -> bool {
        self.key.as_ref() == Some(key)
    }

    /// Marks the stage's output as reflecting `key`.
    pub(crate) fn record(&mut self, key: K) {
        self.key = Some(key);
    }
}

/// Runs one stage, turning a panic into `None`.
pub(crate) fn guarded<T>(stage: &str, f: impl FnOnce() -> T) -> Option<T> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(value) => Some(value),
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(ToString::to_string)
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_owned());
            log::error!("stage '{stage}' panicked, keeping previous output: {message}");
            None
        }
    }
}
