use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::WalkError;

/// Cooperative interruption flag shared by every task of a walk.
///
/// Tripping the token makes each directory level stop before its next listing,
/// submission or join and unwind with [`WalkError::Interrupted`]. Tasks that
/// are already running finish their current unit.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    pub fn check(&self) -> Result<(), WalkError> {
        if self.is_cancelled() {
            Err(WalkError::Interrupted)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_state() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(token.check().is_ok());

        clone.cancel();
        assert!(token.is_cancelled());
        assert!(matches!(token.check(), Err(WalkError::Interrupted)));
    }
}
