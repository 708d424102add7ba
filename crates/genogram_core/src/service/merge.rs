//! Member merge (duplicate resolution).
//!
//! # Responsibility
//! - Fold duplicate person records into one surviving target.
//!
//! # Invariants
//! - Sources are archived, never deleted, and point at the target via
//!   `merged_into`.
//! - After a merge no relationship names an archived source.
//! - A merge never puts the target in its own line of descent.
//! - Contact lists are unions without duplicates, target entries first.

use crate::model::ids::{PersonId, RelationshipId};
use crate::store::{GraphStore, StoreError, StoreResult};
use log::{info, warn};

/// Result of one `merge_members` call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    pub merged: Vec<PersonId>,
    /// Sources skipped because they were the target, unknown, archived, or
    /// an ancestor or descendant of the target.
    pub skipped: Vec<PersonId>,
    pub repointed: Vec<RelationshipId>,
    /// Edges removed because they would collapse into a self-loop or give
    /// the target a second parent union.
    pub removed: Vec<RelationshipId>,
}

/// Merges every source into `target` as one transaction.
pub fn merge_members(
    store: &mut GraphStore,
    target: &PersonId,
    sources: &[PersonId],
) -> StoreResult<MergeReport> {
    let report = store.atomically(|store| {
        if store.person(target).is_none() {
            return Err(StoreError::PersonNotFound(target.clone()));
        }
        let mut report = MergeReport::default();
        for source in sources {
            // Folding a lineal relative into the target would make the
            // target its own ancestor.
            let mergeable = source != target
                && store.person(source).is_some_and(|person| person.is_active())
                && !store.is_ancestor_of(source, target)
                && !store.is_ancestor_of(target, source);
            if !mergeable {
                report.skipped.push(source.clone());
                continue;
            }

            let (phones, emails, provenance) = match store.person(source) {
                Some(person) => (
                    person.phones.clone(),
                    person.emails.clone(),
                    person.sources.clone(),
                ),
                None => continue,
            };
            store.edit_person(target, |person| {
                extend_unique(&mut person.phones, phones);
                extend_unique(&mut person.emails, emails);
                extend_unique(&mut person.sources, provenance);
            })?;

            let repoint = store.repoint_person(source, target)?;
            report.repointed.extend(repoint.repointed);
            report.removed.extend(repoint.dropped);

            store.edit_person(source, |person| person.archive_into(target.clone()))?;
            report.merged.push(source.clone());
        }
        Ok(report)
    })?;

    if !report.skipped.is_empty() {
        warn!(
            "event=merge_members module=service status=partial skipped={}",
            report.skipped.len()
        );
    }
    info!(
        "event=merge_members module=service status=ok merged={} repointed={} removed={}",
        report.merged.len(),
        report.repointed.len(),
        report.removed.len()
    );
    Ok(report)
}

fn extend_unique(into: &mut Vec<String>, values: Vec<String>) {
    for value in values {
        let trimmed = value.trim();
        if trimmed.is_empty() || into.iter().any(|existing| existing.trim() == trimmed) {
            continue;
        }
        into.push(trimmed.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::{extend_unique, merge_members};
    use crate::model::person::{MemberStatus, Person};
    use crate::model::relationship::{Relationship, RelationshipType};
    use crate::store::GraphStore;

    #[test]
    fn extend_unique_skips_blank_and_duplicate_values() {
        let mut phones = vec!["555-1".to_string()];
        extend_unique(
            &mut phones,
            vec![" 555-1 ".to_string(), "".to_string(), "555-2".to_string()],
        );
        assert_eq!(phones, vec!["555-1", "555-2"]);
    }

    #[test]
    fn self_merge_and_unknown_sources_are_skipped() {
        let mut store = GraphStore::new();
        let a = store.add_person(Person::new("A")).unwrap();
        let report = merge_members(&mut store, &a, &[a.clone(), "ghost".into()]).unwrap();
        assert!(report.merged.is_empty());
        assert_eq!(report.skipped.len(), 2);
        assert_eq!(store.person(&a).unwrap().status, MemberStatus::Active);
    }

    #[test]
    fn unknown_target_is_an_error() {
        let mut store = GraphStore::new();
        let a = store.add_person(Person::new("A")).unwrap();
        assert!(merge_members(&mut store, &"ghost".into(), &[a]).is_err());
    }

    #[test]
    fn lineal_relatives_are_not_merged() {
        let mut store = GraphStore::new();
        let grandma = store.add_person(Person::new("G")).unwrap();
        let grandpa = store.add_person(Person::new("H")).unwrap();
        let parent = store.add_person(Person::new("P")).unwrap();
        let other = store.add_person(Person::new("O")).unwrap();
        let grandchild = store.add_person(Person::new("K")).unwrap();
        let old = store
            .add_relationship(Relationship::union(
                RelationshipType::Marriage,
                grandma.clone(),
                grandpa,
            ))
            .unwrap();
        store
            .add_relationship(Relationship::child(old, parent.clone()))
            .unwrap();
        let young = store
            .add_relationship(Relationship::union(RelationshipType::Partner, parent, other))
            .unwrap();
        store
            .add_relationship(Relationship::child(young, grandchild.clone()))
            .unwrap();
        let before = store.snapshot();

        let down = merge_members(&mut store, &grandchild, &[grandma.clone()]).unwrap();
        let up = merge_members(&mut store, &grandma, &[grandchild.clone()]).unwrap();

        assert_eq!(down.skipped, vec![grandma]);
        assert_eq!(up.skipped, vec![grandchild]);
        assert!(down.merged.is_empty() && up.merged.is_empty());
        assert_eq!(store.snapshot(), before);
    }
}
