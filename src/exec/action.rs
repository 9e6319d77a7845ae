// src/exec/action.rs

//! Pluggable build action abstraction.
//!
//! The scheduler does not know what building a unit means. It hands each
//! unit to a `BuildAction` and records whether that succeeded.
//!
//! - [`crate::exec::CommandAction`] is the implementation used by the
//!   `wavebuild` binary.
//! - Tests and library callers can wrap a closure with [`action_fn`].

use std::future::Future;
use std::pin::Pin;

use crate::plan::BuildUnit;

/// What a successful action did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildOutcome {
    /// The unit was built.
    Built,
    /// Nothing changed since the last good build; the work was skipped.
    Skipped,
}

pub type ActionFuture<'a> =
    Pin<Box<dyn Future<Output = anyhow::Result<BuildOutcome>> + Send + 'a>>;

/// Trait abstracting how one unit is built.
///
/// An `Err` (or a panic) marks the unit as failed; it never affects other
/// units. Implementations must only touch files under the unit's source
/// root and must not share mutable state across units.
pub trait BuildAction: Send + Sync {
    fn build<'a>(&'a self, unit: &'a BuildUnit) -> ActionFuture<'a>;
}

/// Adapter turning a closure into a [`BuildAction`].
///
/// The closure receives an owned copy of the unit so the returned future can
/// be `'static`.
pub struct FnAction<F> {
    f: F,
}

pub fn action_fn<F, Fut>(f: F) -> FnAction<F>
where
    F: Fn(BuildUnit) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<BuildOutcome>> + Send + 'static,
{
    FnAction { f }
}

impl<F, Fut> BuildAction for FnAction<F>
where
    F: Fn(BuildUnit) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<BuildOutcome>> + Send + 'static,
{
    fn build<'a>(&'a self, unit: &'a BuildUnit) -> ActionFuture<'a> {
        Box::pin((self.f)(unit.clone()))
    }
}
