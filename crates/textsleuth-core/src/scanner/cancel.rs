/// Cooperative cancellation flag shared between the controller and the
/// scan thread.
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cloneable handle to one scan's cancellation flag.
///
/// The flag only ever goes from `false` to `true`; there is no reset.
/// Clones observe the same flag, so a token can be handed to any thread
/// that needs to stop the scan (a stdin watcher, a signal handler).
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Returns `true` if this call flipped the flag,
    /// `false` if it was already set.
    pub fn cancel(&self) -> bool {
        !self.flag.swap(true, Ordering::AcqRel)
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_is_set_once() {
        let token = CancelToken::new();
        assert!(!token.is_cancelled());
        assert!(token.cancel());
        assert!(!token.cancel());
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_clones_share_the_flag() {
        let token = CancelToken::new();
        let other = token.clone();
        std::thread::spawn(move || other.cancel())
            .join()
            .unwrap();
        assert!(token.is_cancelled());
    }
}
