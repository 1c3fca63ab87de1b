//! Generation tracking for lock-free readers.
//!
//! Readers register in the current generation by taking a
//! [`GenerationGuard`]. Writers that replace shared state bump the generation
//! and park the superseded state in a [`GenerationHoldList`]; it is dropped
//! once [`GenerationHandler::oldest_used_generation`] has moved past the
//! generation it was retired in.
//!
//! Taking a guard is a reference count increment on the current hold. It never
//! takes a lock, so it is safe on latency sensitive read paths.

use arc_swap::ArcSwap;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use tracing::trace;

/// A generation number. Monotonically increasing, never reused.
pub type Generation = u64;

#[derive(Debug)]
struct GenerationHold {
    generation: Generation,
}

/// Proof that a reader is registered in a generation.
///
/// The registration is released when the guard is dropped. Cloning a guard
/// registers another reader in the same generation.
#[derive(Clone)]
pub struct GenerationGuard {
    hold: Arc<GenerationHold>,
}

impl GenerationGuard {
    /// Returns the generation this guard was taken in.
    #[must_use]
    pub fn generation(&self) -> Generation {
        self.hold.generation
    }
}

impl fmt::Debug for GenerationGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationGuard")
            .field("generation", &self.generation())
            .finish()
    }
}

/// Hands out reader guards and tracks the oldest generation still in use.
pub struct GenerationHandler {
    current: ArcSwap<GenerationHold>,
    /// Superseded holds, oldest first, kept while a guard may reference them.
    retired: Mutex<VecDeque<Arc<GenerationHold>>>,
}

impl GenerationHandler {
    /// Creates a handler starting at generation 0.
    #[must_use]
    pub fn new() -> Self {
        Self {
            current: ArcSwap::from_pointee(GenerationHold { generation: 0 }),
            retired: Mutex::new(VecDeque::new()),
        }
    }

    /// Returns the current generation.
    #[must_use]
    pub fn current_generation(&self) -> Generation {
        self.current.load().generation
    }

    /// Registers a reader in the current generation.
    #[must_use]
    pub fn take_guard(&self) -> GenerationGuard {
        GenerationGuard {
            hold: self.current.load_full(),
        }
    }

    /// Advances to the next generation and returns it.
    ///
    /// Guards taken before this call keep their old generation; guards taken
    /// afterwards get the new one.
    pub fn inc_generation(&self) -> Generation {
        let mut retired = self.retired.lock();
        let next = self.current.load().generation + 1;
        let previous = self.current.swap(Arc::new(GenerationHold { generation: next }));
        if Arc::strong_count(&previous) > 1 {
            retired.push_back(previous);
        }
        Self::release_unused(&mut retired);
        trace!(generation = next, held = retired.len(), "generation advanced");
        next
    }

    /// Returns the oldest generation a live guard may still be using.
    ///
    /// State retired in a generation strictly below this value is no longer
    /// visible to any reader.
    #[must_use]
    pub fn oldest_used_generation(&self) -> Generation {
        let mut retired = self.retired.lock();
        Self::release_unused(&mut retired);
        retired
            .front()
            .map_or_else(|| self.current_generation(), |hold| hold.generation)
    }

    /// Returns the number of outstanding guards (approximate under contention).
    #[must_use]
    pub fn reader_count(&self) -> usize {
        let retired = self.retired.lock();
        let current = self.current.load_full();
        // The handler itself owns one reference and `load_full` took another.
        let current_readers = Arc::strong_count(&current).saturating_sub(2);
        retired
            .iter()
            .map(|hold| Arc::strong_count(hold) - 1)
            .sum::<usize>()
            + current_readers
    }

    fn release_unused(retired: &mut VecDeque<Arc<GenerationHold>>) {
        while retired
            .front()
            .is_some_and(|hold| Arc::strong_count(hold) == 1)
        {
            retired.pop_front();
        }
    }
}

impl Default for GenerationHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for GenerationHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationHandler")
            .field("current_generation", &self.current_generation())
            .field("held_generations", &self.retired.lock().len())
            .finish()
    }
}

/// Values waiting for readers of older generations to go away.
#[derive(Debug)]
pub struct GenerationHoldList<T> {
    held: VecDeque<(Generation, T)>,
}

impl<T> GenerationHoldList<T> {
    /// Creates an empty hold list.
    #[must_use]
    pub fn new() -> Self {
        Self {
            held: VecDeque::new(),
        }
    }

    /// Parks `value`, which readers of `generation` or older may still see.
    pub fn hold(&mut self, generation: Generation, value: T) {
        debug_assert!(
            self.held.back().map_or(true, |(last, _)| *last <= generation),
            "hold list generations must not go backwards"
        );
        self.held.push_back((generation, value));
    }

    /// Drops every value retired before `oldest_used` and returns how many.
    pub fn reclaim(&mut self, oldest_used: Generation) -> usize {
        let mut reclaimed = 0;
        while self
            .held
            .front()
            .is_some_and(|(generation, _)| *generation < oldest_used)
        {
            self.held.pop_front();
            reclaimed += 1;
        }
        reclaimed
    }

    /// Returns the number of held values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.held.len()
    }

    /// Returns true if nothing is held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.held.is_empty()
    }
}

impl<T> Default for GenerationHoldList<T> {
    fn default() -> Self {
        Self::new()
    }
}
