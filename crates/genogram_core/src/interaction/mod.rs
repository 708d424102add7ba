//! Transient gesture state: connection, drag and viewport.
//!
//! Nothing in this module is persisted or recorded in history on its own;
//! `service::editor` decides when a finished gesture becomes an undo entry.

pub mod connection;
pub mod drag;
pub mod viewport;

pub use connection::{
    ConnectionOutcome, ConnectionSource, ConnectionState, ConnectionTarget, RejectReason,
};
pub use drag::{family_subtree, DragSession, DragTarget, Modifiers};
pub use viewport::{PanSession, Viewport};
