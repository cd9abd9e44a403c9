use std::sync::atomic::{AtomicU8, Ordering};

/// Model lifecycle. Moves forward only: unloaded -> loading -> ready.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelState {
    Unloaded,
    Loading,
    Ready,
}

impl ModelState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => ModelState::Unloaded,
            1 => ModelState::Loading,
            _ => ModelState::Ready,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            ModelState::Unloaded => 0,
            ModelState::Loading => 1,
            ModelState::Ready => 2,
        }
    }
}

#[derive(Debug)]
pub(crate) struct StateCell {
    state: AtomicU8,
}

impl StateCell {
    pub(crate) fn new() -> Self {
        Self {
            state: AtomicU8::new(ModelState::Unloaded.as_u8()),
        }
    }

    pub(crate) fn get(&self) -> ModelState {
        ModelState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Claim the loader. Fails with the current state if another call already did.
    pub(crate) fn begin_loading(&self) -> Result<LoadingGuard<'_>, ModelState> {
        self.state
            .compare_exchange(
                ModelState::Unloaded.as_u8(),
                ModelState::Loading.as_u8(),
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .map(|_| LoadingGuard {
                cell: self,
                finished: false,
            })
            .map_err(ModelState::from_u8)
    }
}

/// Held while loading. Dropping it without `finish` (the load future was
/// discarded) returns the cell to `Unloaded` so a later call can retry.
pub(crate) struct LoadingGuard<'a> {
    cell: &'a StateCell,
    finished: bool,
}

impl LoadingGuard<'_> {
    pub(crate) fn finish(mut self) {
        self.finished = true;
        self.cell
            .state
            .store(ModelState::Ready.as_u8(), Ordering::Release);
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        if !self.finished {
            self.cell
                .state
                .store(ModelState::Unloaded.as_u8(), Ordering::Release);
        }
    }
}
