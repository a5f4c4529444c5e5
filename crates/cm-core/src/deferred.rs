//! Two-phase deferred evaluation.
//!
//! A [`Deferred<T>`] is the handle returned by the *build* phase of a
//! computation: all configuration has been validated, but the numeric work
//! is captured in a closure that only runs when the caller *forces* the
//! handle. Forcing happens at most once; the outcome (value or error) is
//! cached, so a failed computation never yields a partial result.

use std::sync::{Mutex, OnceLock};

use crate::errors::{Error, Result};

type Thunk<T> = Box<dyn FnOnce() -> Result<T> + Send>;

/// A computation that has been built but not necessarily run.
///
/// # Example
/// ```
/// use cm_core::Deferred;
///
/// let d = Deferred::new(|| Ok(6 * 7));
/// assert!(!d.is_materialized());
/// assert_eq!(*d.force().unwrap(), 42);
/// assert!(d.is_materialized());
/// ```
pub struct Deferred<T> {
    thunk: Mutex<Option<Thunk<T>>>,
    value: OnceLock<Result<T>>,
}

impl<T> Deferred<T> {
    /// Capture `work` without running it.
    pub fn new<F>(work: F) -> Self
    where
        F: FnOnce() -> Result<T> + Send + 'static,
    {
        Self {
            thunk: Mutex::new(Some(Box::new(work))),
            value: OnceLock::new(),
        }
    }

    /// A handle that is already materialised.
    pub fn ready(value: T) -> Self {
        let cell = OnceLock::new();
        let _ = cell.set(Ok(value));
        Self {
            thunk: Mutex::new(None),
            value: cell,
        }
    }

    /// Return `true` once the computation has run (successfully or not).
    pub fn is_materialized(&self) -> bool {
        self.value.get().is_some()
    }

    /// Run the computation if needed and borrow its result.
    ///
    /// Concurrent callers block until the single evaluation finishes and
    /// then observe the same outcome.
    pub fn force(&self) -> Result<&T> {
        self.value
            .get_or_init(|| run(take_thunk(&self.thunk)))
            .as_ref()
            .map_err(Clone::clone)
    }

    /// Consume the handle, running the computation if it has not run yet.
    pub fn into_inner(self) -> Result<T> {
        let Deferred { thunk, value } = self;
        match value.into_inner() {
            Some(outcome) => outcome,
            None => {
                let thunk = thunk.into_inner().unwrap_or_else(|p| p.into_inner());
                run(thunk)
            }
        }
    }
}

impl<T: Send + 'static> Deferred<T> {
    /// Chain further deferred work onto this handle.
    pub fn map<U, F>(self, f: F) -> Deferred<U>
    where
        F: FnOnce(T) -> Result<U> + Send + 'static,
    {
        Deferred::new(move || f(self.into_inner()?))
    }
}

impl<T> std::fmt::Debug for Deferred<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match self.value.get() {
            None => "pending",
            Some(Ok(_)) => "materialized",
            Some(Err(_)) => "failed",
        };
        f.debug_struct("Deferred").field("state", &state).finish()
    }
}

fn take_thunk<T>(slot: &Mutex<Option<Thunk<T>>>) -> Option<Thunk<T>> {
    match slot.lock() {
        Ok(mut guard) => guard.take(),
        Err(poisoned) => poisoned.into_inner().take(),
    }
}

fn run<T>(thunk: Option<Thunk<T>>) -> Result<T> {
    match thunk {
        Some(work) => work(),
        None => Err(Error::Runtime(
            "deferred computation has no pending work".into(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn runs_exactly_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let c = calls.clone();
        let d = Deferred::new(move || {
            c.fetch_add(1, Ordering::SeqCst);
            Ok(1.5)
        });
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(*d.force().unwrap(), 1.5);
        assert_eq!(*d.force().unwrap(), 1.5);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failure_is_cached() {
        let d: Deferred<f64> = Deferred::new(|| Err(Error::Runtime("boom".into())));
        assert!(d.force().is_err());
        assert!(d.is_materialized());
        assert_eq!(d.force().unwrap_err(), Error::Runtime("boom".into()));
    }

    #[test]
    fn map_defers_until_forced() {
        let calls = Arc::new(AtomicUsize::new(0));
        let c = calls.clone();
        let d = Deferred::new(|| Ok(2)).map(move |x| {
            c.fetch_add(1, Ordering::SeqCst);
            Ok(x * 10)
        });
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(d.into_inner().unwrap(), 20);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn ready_and_into_inner() {
        let d = Deferred::ready(String::from("done"));
        assert!(d.is_materialized());
        assert_eq!(d.into_inner().unwrap(), "done");
    }

    #[test]
    fn shared_across_threads() {
        let d = Arc::new(Deferred::new(|| Ok(vec![1, 2, 3])));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let d = d.clone();
                std::thread::spawn(move || d.force().map(|v| v.len()))
            })
            .collect();
        for h in handles {
            assert_eq!(h.join().unwrap().unwrap(), 3);
        }
    }
}
