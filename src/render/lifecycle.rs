use crate::foundation::error::{RecolorError, RecolorResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProgramPhase {
    Uninitialized,
    Initialized,
    Failed,
    Released,
}

/// One-way holder for a lazily built GPU program `P`.
///
/// `Uninitialized` moves to `Initialized` on the first successful build, or to `Failed`
/// when the build errors. `Failed` and `Released` are terminal: the build never runs again.
#[derive(Debug)]
pub enum ProgramState<P> {
    Uninitialized,
    Initialized(P),
    Failed(String),
    Released,
}

impl<P> Default for ProgramState<P> {
    fn default() -> Self {
        Self::Uninitialized
    }
}

impl<P> ProgramState<P> {
    pub fn phase(&self) -> ProgramPhase {
        match self {
            Self::Uninitialized => ProgramPhase::Uninitialized,
            Self::Initialized(_) => ProgramPhase::Initialized,
            Self::Failed(_) => ProgramPhase::Failed,
            Self::Released => ProgramPhase::Released,
        }
    }

    pub fn get_or_init(
        &mut self,
        init: impl FnOnce() -> RecolorResult<P>,
    ) -> RecolorResult<&P> {
        if matches!(self, Self::Uninitialized) {
            match init() {
                Ok(p) => *self = Self::Initialized(p),
                Err(e) => {
                    *self = Self::Failed(e.to_string());
                    return Err(e);
                }
            }
        }
        match &*self {
            Self::Initialized(p) => Ok(p),
            Self::Failed(reason) => Err(RecolorError::precondition(format!(
                "gpu program failed to initialize earlier: {reason}"
            ))),
            Self::Released => Err(RecolorError::precondition(
                "gpu program was already released",
            )),
            Self::Uninitialized => Err(RecolorError::precondition(
                "gpu program is not initialized",
            )),
        }
    }

    pub fn release(&mut self) -> Option<P> {
        match std::mem::replace(self, Self::Released) {
            Self::Initialized(p) => Some(p),
            Self::Uninitialized | Self::Failed(_) | Self::Released => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    #[test]
    fn init_runs_once() {
        let calls = Cell::new(0);
        let mut slot = ProgramState::<u32>::default();
        for _ in 0..3 {
            let p = slot
                .get_or_init(|| {
                    calls.set(calls.get() + 1);
                    Ok(7)
                })
                .unwrap();
            assert_eq!(*p, 7);
        }
        assert_eq!(calls.get(), 1);
        assert_eq!(slot.phase(), ProgramPhase::Initialized);
    }

    #[test]
    fn failed_init_is_terminal() {
        let mut slot = ProgramState::<u32>::default();
        let err = slot
            .get_or_init(|| Err(RecolorError::precondition("bad shader")))
            .unwrap_err();
        assert!(err.to_string().contains("bad shader"));
        assert_eq!(slot.phase(), ProgramPhase::Failed);

        let calls = Cell::new(0);
        let err = slot
            .get_or_init(|| {
                calls.set(calls.get() + 1);
                Ok(9)
            })
            .unwrap_err();
        assert_eq!(calls.get(), 0);
        assert!(matches!(err, RecolorError::Precondition(_)));
        assert!(err.to_string().contains("bad shader"));
        assert_eq!(slot.phase(), ProgramPhase::Failed);

        assert_eq!(slot.release(), None);
        assert_eq!(slot.phase(), ProgramPhase::Released);
    }

    #[test]
    fn release_hands_back_program_exactly_once() {
        let mut slot = ProgramState::<u32>::default();
        slot.get_or_init(|| Ok(1)).unwrap();
        assert_eq!(slot.release(), Some(1));
        assert_eq!(slot.release(), None);
        assert_eq!(slot.phase(), ProgramPhase::Released);
    }

    #[test]
    fn release_without_init_is_fine() {
        let mut slot = ProgramState::<u32>::default();
        assert_eq!(slot.release(), None);
        assert_eq!(slot.release(), None);
        assert_eq!(slot.phase(), ProgramPhase::Released);
    }

    #[test]
    fn released_slot_never_reinitializes() {
        let mut slot = ProgramState::<u32>::default();
        slot.release();
        assert!(slot.get_or_init(|| Ok(3)).is_err());
        assert_eq!(slot.phase(), ProgramPhase::Released);
    }
}
