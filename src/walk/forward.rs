use std::sync::{Arc, OnceLock, Weak};

use crate::error::WalkError;

/// Write-once reference to an object that does not exist yet.
///
/// The directory walker hands every member to "the top-level file
/// processor", which is usually the walker itself or a wrapper around it. The
/// cell is created empty, moved into the walker, and bound to the finished
/// top-level processor right after construction. It holds a weak reference so
/// the walker does not keep itself alive.
pub struct ForwardRef<P: ?Sized> {
    target: OnceLock<Weak<P>>,
}

impl<P: ?Sized> ForwardRef<P> {
    pub fn new() -> Self {
        Self {
            target: OnceLock::new(),
        }
    }

    /// Bind the cell. A second bind is rejected.
    pub fn bind(&self, target: &Arc<P>) -> Result<(), WalkError> {
        self.target
            .set(Arc::downgrade(target))
            .map_err(|_| WalkError::invariant("forward reference bound twice"))
    }

    pub fn is_bound(&self) -> bool {
        self.target.get().is_some()
    }

    pub fn get(&self) -> Result<Arc<P>, WalkError> {
        let weak = self
            .target
            .get()
            .ok_or_else(|| WalkError::invariant("forward reference used before it was bound"))?;
        weak.upgrade()
            .ok_or_else(|| WalkError::invariant("forward reference target was dropped"))
    }
}

impl<P: ?Sized> Default for ForwardRef<P> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Named: Send + Sync {
        fn name(&self) -> &str;
    }

    struct Fixed(&'static str);

    impl Named for Fixed {
        fn name(&self) -> &str {
            self.0
        }
    }

    #[test]
    fn test_unbound_reference_is_invariant_violation() {
        let cell: ForwardRef<dyn Named> = ForwardRef::new();
        assert!(!cell.is_bound());
        assert!(matches!(cell.get(), Err(WalkError::Invariant(_))));
    }

    #[test]
    fn test_bind_once() {
        let cell: ForwardRef<dyn Named> = ForwardRef::new();
        let target: Arc<dyn Named> = Arc::new(Fixed("walker"));

        cell.bind(&target).unwrap();
        assert_eq!(cell.get().unwrap().name(), "walker");

        let other: Arc<dyn Named> = Arc::new(Fixed("other"));
        assert!(cell.bind(&other).is_err());
        assert_eq!(cell.get().unwrap().name(), "walker");
    }

    #[test]
    fn test_dropped_target_is_reported() {
        let cell: ForwardRef<dyn Named> = ForwardRef::new();
        {
            let target: Arc<dyn Named> = Arc::new(Fixed("gone"));
            cell.bind(&target).unwrap();
        }
        assert!(cell.get().is_err());
    }
}
