//! Write-once parse cache.
//!
//! A `LazyParse` starts `Unparsed`. The first successful parse stores the
//! value and every later access returns the same `Arc`, unless the caller
//! reports the cached value as stale. A failed parse is
//! recorded as `Failed` but not kept as the answer: the next access parses
//! again. The cell's mutex is held while parsing, so concurrent first
//! accesses run the parser once.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::Result;

/// State of a lazily parsed value.
#[derive(Debug)]
pub enum ParseState<T> {
    /// Nothing attempted yet.
    Unparsed,
    /// Parsed successfully; immutable from here on.
    Parsed(Arc<T>),
    /// The last attempt failed with this reason.
    Failed(String),
}

impl<T> Clone for ParseState<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Unparsed => Self::Unparsed,
            Self::Parsed(value) => Self::Parsed(Arc::clone(value)),
            Self::Failed(reason) => Self::Failed(reason.clone()),
        }
    }
}

/// Tri-state, write-once parse cache.
#[derive(Debug)]
pub struct LazyParse<T> {
    state: Mutex<ParseState<T>>,
    attempts: AtomicUsize,
}

impl<T> LazyParse<T> {
    /// An empty cache.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ParseState::Unparsed),
            attempts: AtomicUsize::new(0),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ParseState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Return the cached value, running `parse` if nothing is cached yet.
    pub fn get_or_try_parse<F>(&self, parse: F) -> Result<Arc<T>>
    where
        F: FnOnce() -> Result<T>,
    {
        self.get_or_try_parse_where(|_| true, parse)
    }

    /// Like `get_or_try_parse`, but a cached value rejected by `is_current`
    /// is replaced by a fresh parse.
    pub fn get_or_try_parse_where<P, F>(&self, is_current: P, parse: F) -> Result<Arc<T>>
    where
        P: FnOnce(&T) -> bool,
        F: FnOnce() -> Result<T>,
    {
        let mut state = self.lock();
        if let ParseState::Parsed(value) = &*state {
            if is_current(value) {
                return Ok(Arc::clone(value));
            }
        }
        self.attempts.fetch_add(1, Ordering::Relaxed);
        match parse() {
            Ok(value) => {
                let value = Arc::new(value);
                *state = ParseState::Parsed(Arc::clone(&value));
                Ok(value)
            }
            Err(e) => {
                *state = ParseState::Failed(e.to_string());
                Err(e)
            }
        }
    }

    /// The cached value, if parsing already succeeded.
    pub fn get(&self) -> Option<Arc<T>> {
        match &*self.lock() {
            ParseState::Parsed(value) => Some(Arc::clone(value)),
            _ => None,
        }
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> ParseState<T> {
        self.lock().clone()
    }

    /// How many times the parser has been run.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::Relaxed)
    }
}

impl<T> Default for LazyParse<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for LazyParse<T> {
    fn clone(&self) -> Self {
        Self {
            state: Mutex::new(self.state()),
            attempts: AtomicUsize::new(self.attempts()),
        }
    }
}
