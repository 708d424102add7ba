//! Interactive relationship creation state machine.
//!
//! # Responsibility
//! - Track a click-to-start / click-to-complete connection gesture.
//! - Turn a valid completion into exactly one relationship in the store.
//!
//! # Invariants
//! - A connection starts from exactly one origin: a person or a union bubble.
//! - Person origins complete on a different person and create a union edge.
//! - Bubble origins complete on a person and create a child edge; the child
//!   (and its descendants) end up below both parents' generations.
//! - Rejected completions and cancels never mutate the store.

use crate::model::ids::{PersonId, RelationshipId};
use crate::model::relationship::{Relationship, RelationshipLink, RelationshipType};
use crate::store::GraphStore;
use log::debug;

/// Where a pending connection started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionSource {
    Person(PersonId),
    /// A union bubble; the connection becomes a child edge.
    Union(RelationshipId),
}

impl ConnectionSource {
    /// Builds a source from the host's `(personId, relationshipId)` pair.
    ///
    /// Returns `None` unless exactly one side is set.
    pub fn from_parts(
        person: Option<PersonId>,
        relationship: Option<RelationshipId>,
    ) -> Option<Self> {
        match (person, relationship) {
            (Some(person), None) => Some(Self::Person(person)),
            (None, Some(relationship)) => Some(Self::Union(relationship)),
            _ => None,
        }
    }
}

/// What the second click landed on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionTarget {
    Person(PersonId),
    Bubble(RelationshipId),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Idle,
    Connecting {
        source: ConnectionSource,
        kind: RelationshipType,
    },
}

/// Why a gesture was ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Origin person or union does not exist.
    UnknownSource,
    /// Child edges must start on a union bubble.
    ChildFromPerson,
    /// Union origin cannot accept children.
    NotParentCapable,
    UnknownTarget,
    /// Person-started connections only complete on people.
    BubbleTarget,
    SelfConnection,
    /// The store refused the edge (e.g. child already has parents).
    Refused,
}

impl RejectReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::UnknownSource => "connection origin no longer exists",
            Self::ChildFromPerson => "child connections start from a relationship bubble",
            Self::NotParentCapable => "this relationship cannot have children",
            Self::UnknownTarget => "connection target does not exist",
            Self::BubbleTarget => "connections end on a person, not on a relationship",
            Self::SelfConnection => "a person cannot be connected to itself",
            Self::Refused => "relationship would break the family graph",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionOutcome {
    Created(RelationshipId),
    Rejected(RejectReason),
    /// `complete` was called while idle.
    NotConnecting,
}

impl ConnectionState {
    pub fn is_connecting(&self) -> bool {
        matches!(self, Self::Connecting { .. })
    }

    /// Enters `Connecting`; invalid origins leave the state unchanged.
    pub fn start(
        &mut self,
        store: &GraphStore,
        source: ConnectionSource,
        kind: RelationshipType,
    ) -> Result<(), RejectReason> {
        let kind = match &source {
            ConnectionSource::Person(id) => {
                if store.person(id).is_none() {
                    return Err(RejectReason::UnknownSource);
                }
                if kind == RelationshipType::Child {
                    return Err(RejectReason::ChildFromPerson);
                }
                kind
            }
            ConnectionSource::Union(id) => {
                let rel = store.relationship(id).ok_or(RejectReason::UnknownSource)?;
                if !rel.accepts_children() {
                    return Err(RejectReason::NotParentCapable);
                }
                RelationshipType::Child
            }
        };
        debug!(
            "event=connection_start module=interaction status=ok kind={}",
            kind.as_str()
        );
        *self = Self::Connecting { source, kind };
        Ok(())
    }

    /// Returns to `Idle` without touching the store.
    pub fn cancel(&mut self) {
        if self.is_connecting() {
            debug!("event=connection_cancel module=interaction status=ok");
        }
        *self = Self::Idle;
    }

    /// Completes the gesture on `target`.
    ///
    /// On success exactly one relationship is added and the state returns to
    /// `Idle`. A rejection keeps the pending connection so another target can
    /// be picked.
    pub fn complete(
        &mut self,
        store: &mut GraphStore,
        target: ConnectionTarget,
    ) -> ConnectionOutcome {
        let Self::Connecting { source, kind } = self else {
            return ConnectionOutcome::NotConnecting;
        };

        let target_person = match target {
            ConnectionTarget::Bubble(_) => {
                return ConnectionOutcome::Rejected(RejectReason::BubbleTarget);
            }
            ConnectionTarget::Person(id) => id,
        };
        if store.person(&target_person).is_none() {
            return ConnectionOutcome::Rejected(RejectReason::UnknownTarget);
        }

        let relationship = match source {
            ConnectionSource::Person(from) => {
                if *from == target_person {
                    return ConnectionOutcome::Rejected(RejectReason::SelfConnection);
                }
                Relationship::union(kind.clone(), from.clone(), target_person)
            }
            ConnectionSource::Union(union) => Relationship::child(union.clone(), target_person),
        };

        let attached = store.atomically(|store| {
            let child = match &relationship.link {
                RelationshipLink::Child { child, .. } => Some(child.clone()),
                _ => None,
            };
            let id = store.add_relationship(relationship)?;
            if let Some(child) = child {
                store.lift_generations(&child)?;
            }
            Ok(id)
        });
        match attached {
            Ok(id) => {
                debug!("event=connection_complete module=interaction status=ok");
                *self = Self::Idle;
                ConnectionOutcome::Created(id)
            }
            Err(err) => {
                debug!("event=connection_complete module=interaction status=rejected error={err}");
                ConnectionOutcome::Rejected(RejectReason::Refused)
            }
        }
    }
}
