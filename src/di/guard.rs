//! Circular dependency detection.
//!
//! # Design Decisions
//! - Tracks the concrete types under construction on each thread's resolution path
//! - Re-entering a type already on the path fails immediately with the full cycle
//! - RAII token pops the entry even when construction fails

use std::thread::{self, ThreadId};

use parking_lot::Mutex;

use crate::di::error::{DiError, DiResult};
use crate::di::service::TypeKey;

#[derive(Default)]
pub struct CircularDependencyGuard {
    active: Mutex<Vec<(ThreadId, TypeKey)>>,
}

impl CircularDependencyGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `service` as under construction until the returned token drops.
    pub fn enter(&self, service: TypeKey) -> DiResult<ConstructionToken<'_>> {
        let thread = thread::current().id();
        let mut active = self.active.lock();

        if let Some(start) = active
            .iter()
            .position(|(t, key)| *t == thread && *key == service)
        {
            let mut path: Vec<&'static str> = active[start..]
                .iter()
                .filter(|(t, _)| *t == thread)
                .map(|(_, key)| key.name())
                .collect();
            path.push(service.name());
            return Err(DiError::CircularDependency { path });
        }

        active.push((thread, service));
        Ok(ConstructionToken {
            guard: self,
            thread,
            service,
        })
    }

    /// Number of services under construction across all threads.
    pub fn depth(&self) -> usize {
        self.active.lock().len()
    }
}

/// Removes its entry from the guard when dropped.
pub struct ConstructionToken<'a> {
    guard: &'a CircularDependencyGuard,
    thread: ThreadId,
    service: TypeKey,
}

impl Drop for ConstructionToken<'_> {
    fn drop(&mut self) {
        let mut active = self.guard.active.lock();
        if let Some(index) = active
            .iter()
            .rposition(|(t, key)| *t == self.thread && *key == self.service)
        {
            active.remove(index);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct A;
    struct B;

    #[test]
    fn test_reentry_reports_cycle_path() {
        let guard = CircularDependencyGuard::new();
        let _a = guard.enter(TypeKey::of::<A>()).unwrap();
        let _b = guard.enter(TypeKey::of::<B>()).unwrap();

        match guard.enter(TypeKey::of::<A>()) {
            Err(DiError::CircularDependency { path }) => {
                assert_eq!(path.len(), 3);
                assert!(path[0].ends_with("A"));
                assert!(path[1].ends_with("B"));
                assert!(path[2].ends_with("A"));
            }
            _ => panic!("expected circular dependency"),
        };
    }

    #[test]
    fn test_token_drop_releases_entry() {
        let guard = CircularDependencyGuard::new();
        {
            let _a = guard.enter(TypeKey::of::<A>()).unwrap();
            assert_eq!(guard.depth(), 1);
        }
        assert_eq!(guard.depth(), 0);
        assert!(guard.enter(TypeKey::of::<A>()).is_ok());
    }

    #[test]
    fn test_other_threads_do_not_conflict() {
        let guard = CircularDependencyGuard::new();
        let _a = guard.enter(TypeKey::of::<A>()).unwrap();

        std::thread::scope(|s| {
            s.spawn(|| {
                assert!(guard.enter(TypeKey::of::<A>()).is_ok());
            });
        });
    }
}
