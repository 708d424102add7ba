//! Generation derivation and auto-arrange.
//!
//! # Responsibility
//! - Recompute `generation` from the parent-union graph.
//! - Lay people out in rows per generation with a crossing-reducing order.
//!
//! # Invariants
//! - A person without an incoming child edge is generation 0.
//! - A child is one generation below the deepest member of its parent union.
//! - Cycles in malformed data resolve to 0 instead of recursing forever.
//! - Archived people keep their position and generation.

use crate::model::geometry::Point;
use crate::model::ids::PersonId;
use crate::model::person::Person;
use crate::settings::EditorSettings;
use crate::store::{GraphStore, StoreResult};
use log::info;
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visit {
    InProgress,
    Done(i32),
}

/// Derived generation per active person.
pub fn derive_generations(store: &GraphStore) -> HashMap<PersonId, i32> {
    let mut memo: HashMap<PersonId, Visit> = HashMap::new();
    for person in store.people().iter().filter(|person| person.is_active()) {
        generation_of(store, &person.id, &mut memo);
    }
    memo.into_iter()
        .filter(|(id, _)| store.person(id).is_some_and(Person::is_active))
        .map(|(id, visit)| match visit {
            Visit::Done(generation) => (id, generation),
            Visit::InProgress => (id, 0),
        })
        .collect()
}

fn generation_of(store: &GraphStore, id: &PersonId, memo: &mut HashMap<PersonId, Visit>) -> i32 {
    match memo.get(id) {
        Some(Visit::Done(generation)) => return *generation,
        Some(Visit::InProgress) => return 0,
        None => {}
    }
    memo.insert(id.clone(), Visit::InProgress);

    let parents: Vec<PersonId> = store
        .parent_union_of(id)
        .map(|union| union.link.parents().into_iter().cloned().collect())
        .unwrap_or_default();
    let generation = if parents.is_empty() {
        0
    } else {
        let mut deepest = 0;
        let mut cyclic = false;
        for parent in &parents {
            if matches!(memo.get(parent), Some(Visit::InProgress)) {
                cyclic = true;
                break;
            }
            deepest = deepest.max(generation_of(store, parent, memo));
        }
        if cyclic {
            0
        } else {
            deepest + 1
        }
    };
    memo.insert(id.clone(), Visit::Done(generation));
    generation
}

/// Summary of one auto-arrange pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArrangeReport {
    pub arranged: usize,
    pub generations: usize,
}

/// Recomputes generations and repositions every active person.
///
/// Rows are ordered by the barycentre of each person's parents in the row
/// above; ties fall back to current x, then id.
pub fn auto_arrange(store: &mut GraphStore, settings: &EditorSettings) -> StoreResult<ArrangeReport> {
    let generations = derive_generations(store);
    let mut rows: BTreeMap<i32, Vec<PersonId>> = BTreeMap::new();
    for (id, generation) in &generations {
        rows.entry(*generation).or_default().push(id.clone());
    }

    let mut placed: HashMap<PersonId, f64> = HashMap::new();
    let mut plan: Vec<(PersonId, i32, Point)> = Vec::new();
    for (generation, row) in &rows {
        let mut keyed: Vec<(f64, f64, PersonId)> = row
            .iter()
            .filter_map(|id| {
                let person = store.person(id)?;
                Some((barycentre(store, person, &placed), person.x, id.clone()))
            })
            .collect();
        keyed.sort_by(|a, b| {
            a.0.total_cmp(&b.0)
                .then_with(|| a.1.total_cmp(&b.1))
                .then_with(|| a.2.cmp(&b.2))
        });

        let centre = (keyed.len().saturating_sub(1)) as f64 / 2.0;
        for (index, (_, _, id)) in keyed.into_iter().enumerate() {
            let x = (index as f64 - centre) * settings.column_width;
            let y = f64::from(*generation) * settings.row_height;
            placed.insert(id.clone(), x);
            plan.push((id, *generation, Point::new(x, y)));
        }
    }

    let report = ArrangeReport {
        arranged: plan.len(),
        generations: rows.len(),
    };
    store.atomically(|store| {
        for (id, generation, point) in plan {
            store.set_person_position(&id, point)?;
            store.edit_person(&id, |person| person.generation = generation)?;
        }
        Ok(())
    })?;
    info!(
        "event=auto_arrange module=service status=ok arranged={} generations={}",
        report.arranged, report.generations
    );
    Ok(report)
}

// Parents already placed in an upper row use their new x; anyone else
// (roots, malformed data) keeps their current x.
fn barycentre(store: &GraphStore, person: &Person, placed: &HashMap<PersonId, f64>) -> f64 {
    let Some(union) = store.parent_union_of(&person.id) else {
        return person.x;
    };
    let xs: Vec<f64> = union
        .link
        .parents()
        .into_iter()
        .filter_map(|parent| {
            placed
                .get(parent)
                .copied()
                .or_else(|| store.person(parent).map(|p| p.x))
        })
        .collect();
    if xs.is_empty() {
        return person.x;
    }
    xs.iter().sum::<f64>() / xs.len() as f64
}

#[cfg(test)]
mod tests {
    use super::{auto_arrange, derive_generations};
    use crate::model::person::Person;
    use crate::model::relationship::{Relationship, RelationshipType};
    use crate::settings::EditorSettings;
    use crate::store::GraphStore;

    #[test]
    fn child_is_one_below_deepest_parent() {
        let mut store = GraphStore::new();
        let grandma = store.add_person(Person::new("G")).unwrap();
        let grandpa = store.add_person(Person::new("H")).unwrap();
        let mother = store.add_person(Person::new("M")).unwrap();
        let father = store.add_person(Person::new("F")).unwrap();
        let kid = store.add_person(Person::new("K")).unwrap();
        let old = store
            .add_relationship(Relationship::union(
                RelationshipType::Marriage,
                grandma.clone(),
                grandpa,
            ))
            .unwrap();
        store
            .add_relationship(Relationship::child(old, mother.clone()))
            .unwrap();
        let young = store
            .add_relationship(Relationship::union(
                RelationshipType::Marriage,
                mother.clone(),
                father.clone(),
            ))
            .unwrap();
        store
            .add_relationship(Relationship::child(young, kid.clone()))
            .unwrap();

        let generations = derive_generations(&store);
        assert_eq!(generations[&grandma], 0);
        assert_eq!(generations[&mother], 1);
        assert_eq!(generations[&father], 0);
        assert_eq!(generations[&kid], 2);
    }

    #[test]
    fn arrange_rows_follow_generation() {
        let mut store = GraphStore::new();
        let settings = EditorSettings::default();
        let a = store.add_person(Person::new("A").at(500.0, 9.0)).unwrap();
        let b = store.add_person(Person::new("B").at(-40.0, 3.0)).unwrap();
        let c = store.add_person(Person::new("C")).unwrap();
        let union = store
            .add_relationship(Relationship::union(RelationshipType::Marriage, a.clone(), b.clone()))
            .unwrap();
        store
            .add_relationship(Relationship::child(union, c.clone()))
            .unwrap();

        let report = auto_arrange(&mut store, &settings).unwrap();
        assert_eq!(report.arranged, 3);
        assert_eq!(report.generations, 2);

        let b_after = store.person(&b).unwrap();
        let a_after = store.person(&a).unwrap();
        let c_after = store.person(&c).unwrap();
        assert_eq!(b_after.x, -60.0);
        assert_eq!(a_after.x, 60.0);
        assert_eq!(a_after.y, 0.0);
        assert_eq!(c_after.x, 0.0);
        assert_eq!(c_after.y, settings.row_height);
        assert_eq!(c_after.generation, 1);
    }
}
