//! The LSP lifecycle state machine: which methods are legal in which
//! state, and the DAG of transitions between states.

/// Lifecycle state of a single session. Mutated only by the server's
/// lifecycle handlers (`initialize`, `initialized`, `shutdown`, `exit`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Uninitialized,
    Initializing,
    Initialized,
    Shutdown,
    ExitingSuccess,
    ExitingFailure,
}

/// Whether a message kind is a request or a notification, for the purposes
/// of lifecycle gating (some methods are only ever one or the other, but the
/// gate itself only cares about the method name and the current state).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    Allow,
    /// Refuse with `ServerNotInitialized` (-32002).
    NotInitialized,
    /// Refuse with `InvalidRequest` (-32600).
    InvalidRequest,
}

impl Status {
    /// Applies the lifecycle table to decide whether `method` may be
    /// handled in the current state, without mutating state: transitions
    /// themselves happen inside the lifecycle handlers once the gate allows
    /// the message through.
    pub fn gate(self, method: &str) -> Gate {
        use Status::*;

        // Exiting states are unreachable during dispatch: the process
        // is terminating and no further messages should be read off the
        // transport. A message arriving here is a caller bug.
        if matches!(self, ExitingSuccess | ExitingFailure) {
            panic!("dispatch invoked while server is exiting (status = {self:?})");
        }

        // `shutdown` is special-cased to InvalidRequest in every state but
        // Initialized, overriding the ServerNotInitialized a plain
        // "any other request" reading of the uninitialized/initializing rows
        // would otherwise produce for it.
        if method == "shutdown" && !matches!(self, Initialized) {
            return Gate::InvalidRequest;
        }

        // `initialize` is only ever legal once, from Uninitialized. Without
        // this, a second `initialize` request while Initialized would fall
        // through to the catch-all `Gate::Allow` below and let a client
        // re-negotiate and overwrite the frozen `client_capabilities` /
        // `offset_encoding` snapshot.
        if method == "initialize" && !matches!(self, Uninitialized) {
            return Gate::InvalidRequest;
        }

        match self {
            Uninitialized => {
                if method == "initialize" || method == "exit" {
                    Gate::Allow
                } else {
                    Gate::NotInitialized
                }
            }
            Initializing => {
                if method == "initialized" || method == "$/progress" || method == "exit" {
                    Gate::Allow
                } else {
                    Gate::InvalidRequest
                }
            }
            Initialized => Gate::Allow,
            Shutdown => {
                if method == "exit" {
                    Gate::Allow
                } else {
                    Gate::InvalidRequest
                }
            }
            ExitingSuccess | ExitingFailure => unreachable!("handled above"),
        }
    }

    /// The state reached after successfully handling `method` from the
    /// current state, if that transition is one of the named lifecycle ones.
    /// Returns `None` when `method` doesn't itself drive a transition (the
    /// overwhelming majority of `initialized`-state traffic).
    pub fn transition(self, method: &str) -> Option<Status> {
        use Status::*;
        match (self, method) {
            (Uninitialized, "initialize") => Some(Initializing),
            (Initializing, "initialized") => Some(Initialized),
            (Initialized, "shutdown") => Some(Shutdown),
            (Initialized, "exit") => Some(ExitingFailure),
            (Shutdown, "exit") => Some(ExitingSuccess),
            _ => None,
        }
    }
}
