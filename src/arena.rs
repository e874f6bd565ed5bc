//! Per-message scratch allocator: created immediately before a handler is invoked, dropped
//! immediately after dispatch returns, on every exit path including errors.

use bumpalo::Bump;

/// Thin wrapper around a `bumpalo::Bump`. Handlers borrow it for the
/// duration of their call only; nothing may retain a reference into it past
/// that point, which the borrow checker enforces since [`RequestArena`]
/// itself is dropped at the end of dispatch.
#[derive(Default)]
pub struct RequestArena {
    bump: Bump,
}

impl RequestArena {
    pub fn new() -> Self {
        RequestArena { bump: Bump::new() }
    }

    pub fn allocator(&self) -> &Bump {
        &self.bump
    }
}
