//! Entity trait: identity + continuity across state changes.

use crate::event::EventBuffer;

/// Entity marker + minimal interface.
///
/// Entities embed an [`EventBuffer`] by composition (no common base type);
/// the accessors here are the seam the unit-of-work uses to drain pending
/// events at commit time.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;

    /// Pending, not-yet-dispatched events.
    fn events(&self) -> &EventBuffer;

    /// Mutable access for raising and draining events.
    fn events_mut(&mut self) -> &mut EventBuffer;
}
