//! Bundles and the two-phase lifecycle state they carry.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use atto_core::BundleId;

use crate::activator::BundleModule;

/// Lifecycle state of a bundle (or of the framework itself).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BundleState {
    /// Removed; never produced by this runtime since uninstall is not offered.
    Uninstalled,
    /// Known but not resolved.
    Installed,
    /// Installed and ready to start. Initial and quiescent state.
    Resolved,
    /// Start hook running.
    Starting,
    /// Stop hook running.
    Stopping,
    /// Started successfully.
    Active,
}

impl fmt::Display for BundleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Uninstalled => "UNINSTALLED",
            Self::Installed => "INSTALLED",
            Self::Resolved => "RESOLVED",
            Self::Starting => "STARTING",
            Self::Stopping => "STOPPING",
            Self::Active => "ACTIVE",
        })
    }
}

#[derive(Debug, Clone, Copy)]
struct Slot {
    committed: BundleState,
    pending: Option<BundleState>,
}

/// Committed state plus at most one tentative value.
///
/// A transition writes the tentative value first and either commits it or
/// drops it. Dropping an uncommitted [`Transition`] abandons it, leaving the
/// committed value untouched.
#[derive(Debug)]
pub(crate) struct LifecycleState {
    slot: Mutex<Slot>,
}

impl LifecycleState {
    pub(crate) fn new(initial: BundleState) -> Self {
        Self {
            slot: Mutex::new(Slot {
                committed: initial,
                pending: None,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(|e| {
            tracing::warn!("Lifecycle state lock poisoned, recovering");
            e.into_inner()
        })
    }

    pub(crate) fn committed(&self) -> BundleState {
        self.lock().committed
    }

    /// The pending value if a transition is running, otherwise the committed one.
    pub(crate) fn tracked(&self) -> BundleState {
        let slot = self.lock();
        slot.pending.unwrap_or(slot.committed)
    }

    /// Start a transition towards `target`.
    ///
    /// Fails with the pending state if another transition is running.
    pub(crate) fn begin(&self, target: BundleState) -> Result<Transition<'_>, BundleState> {
        let mut slot = self.lock();
        if let Some(pending) = slot.pending {
            return Err(pending);
        }
        slot.pending = Some(target);
        Ok(Transition {
            state: self,
            done: false,
        })
    }
}

/// An in-flight transition. Commit it to persist the tentative value.
#[must_use = "an uncommitted transition is abandoned when dropped"]
pub(crate) struct Transition<'a> {
    state: &'a LifecycleState,
    done: bool,
}

impl Transition<'_> {
    /// Persist `value` as the committed state and end the transition.
    pub(crate) fn commit(mut self, value: BundleState) {
        let mut slot = self.state.lock();
        slot.committed = value;
        slot.pending = None;
        self.done = true;
    }
}

impl Drop for Transition<'_> {
    fn drop(&mut self) {
        if !self.done {
            self.state.lock().pending = None;
        }
    }
}

/// An installed bundle.
///
/// Identity is immutable; the state is only changed by the framework's
/// lifecycle driver.
pub struct Bundle {
    id: BundleId,
    name: String,
    module: Arc<dyn BundleModule>,
    state: LifecycleState,
}

impl Bundle {
    pub(crate) fn new(
        id: BundleId,
        name: impl Into<String>,
        module: Arc<dyn BundleModule>,
        state: BundleState,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            module,
            state: LifecycleState::new(state),
        }
    }

    /// Bundle id; `0` is the framework.
    #[must_use]
    pub fn id(&self) -> BundleId {
        self.id
    }

    /// Unique bundle name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Last committed lifecycle state.
    #[must_use]
    pub fn state(&self) -> BundleState {
        self.state.committed()
    }

    /// State including an unfinished transition, e.g. `Starting` while the
    /// start hook runs.
    #[must_use]
    pub fn tracked_state(&self) -> BundleState {
        self.state.tracked()
    }

    /// Whether this is the framework's own bundle.
    #[must_use]
    pub fn is_framework(&self) -> bool {
        self.id.is_framework()
    }

    /// The bundle's code unit.
    #[must_use]
    pub fn module(&self) -> &Arc<dyn BundleModule> {
        &self.module
    }

    pub(crate) fn lifecycle(&self) -> &LifecycleState {
        &self.state
    }
}

impl fmt::Debug for Bundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bundle")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("state", &self.state.tracked())
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Bundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.name, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commit_persists_the_value() {
        let state = LifecycleState::new(BundleState::Resolved);
        let transition = state.begin(BundleState::Starting).unwrap();
        assert_eq!(state.tracked(), BundleState::Starting);
        assert_eq!(state.committed(), BundleState::Resolved);
        transition.commit(BundleState::Active);
        assert_eq!(state.tracked(), BundleState::Active);
        assert_eq!(state.committed(), BundleState::Active);
    }

    #[test]
    fn dropping_abandons_the_value() {
        let state = LifecycleState::new(BundleState::Active);
        {
            let _transition = state.begin(BundleState::Stopping).unwrap();
            assert_eq!(state.tracked(), BundleState::Stopping);
        }
        assert_eq!(state.tracked(), BundleState::Active);
        assert_eq!(state.committed(), BundleState::Active);
    }

    #[test]
    fn only_one_transition_at_a_time() {
        let state = LifecycleState::new(BundleState::Resolved);
        let first = state.begin(BundleState::Starting).unwrap();
        assert_eq!(
            state.begin(BundleState::Stopping).err(),
            Some(BundleState::Starting)
        );
        drop(first);
        assert!(state.begin(BundleState::Stopping).is_ok());
    }

    #[test]
    fn state_names_are_uppercase() {
        assert_eq!(BundleState::Active.to_string(), "ACTIVE");
        assert_eq!(BundleState::Resolved.to_string(), "RESOLVED");
    }
}
