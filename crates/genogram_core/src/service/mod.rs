//! Editing use cases layered over the graph store.
//!
//! # Responsibility
//! - Provide compound family-building operations and member merging.
//! - Derive generations and tidy layouts.
//! - Expose a session controller that records undo history.
//!
//! # See also
//! - crate::store for the primitives these services compose.

pub mod compound;
pub mod editor;
pub mod layout;
pub mod merge;

pub use compound::{
    add_child_to_relationship, create_child_with_unknown_parent, create_single_parent_adoption,
    create_spouse_and_child, resolve_partner_union, FamilyCreated, PartnerResolution, PALETTE,
    UNKNOWN_PARENT_NAME,
};
pub use editor::{ClipboardEntry, Editor};
pub use layout::{auto_arrange, derive_generations, ArrangeReport};
pub use merge::{merge_members, MergeReport};
