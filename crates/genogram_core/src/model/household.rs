//! Household polygon model.
//!
//! A household is a closed polygon drawn over the canvas. It does not
//! reference people; membership is derived by geometry on demand.

use crate::model::geometry::{distance_to_segment, polygon_contains, Point};
use crate::model::ids::HouseholdId;

/// Default fill/stroke colour of new households.
pub const DEFAULT_HOUSEHOLD_COLOR: &str = "#4caf50";
/// Fewest vertices a household keeps when points are removed.
pub const MIN_HOUSEHOLD_POINTS: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct Household {
    pub id: HouseholdId,
    pub name: String,
    pub color: String,
    pub points: Vec<Point>,
}

impl Household {
    pub fn new(name: impl Into<String>, points: Vec<Point>) -> Self {
        Self {
            id: HouseholdId::generate(),
            name: name.into(),
            color: DEFAULT_HOUSEHOLD_COLOR.to_string(),
            points,
        }
    }

    /// Whether `point` lies inside the polygon.
    pub fn contains(&self, point: Point) -> bool {
        polygon_contains(&self.points, point)
    }

    /// Index of the vertex after which a click at `point` is inserted.
    ///
    /// Picks the polygon edge (including the closing edge) with the smallest
    /// distance to `point`; ties keep the earliest edge. Returns `None` for an
    /// empty polygon.
    pub fn nearest_edge_start(&self, point: Point) -> Option<usize> {
        let count = self.points.len();
        match count {
            0 => None,
            1 => Some(0),
            _ => {
                let mut best: Option<(usize, f64)> = None;
                for start in 0..count {
                    let a = self.points[start];
                    let b = self.points[(start + 1) % count];
                    let distance = distance_to_segment(point, a, b);
                    match best {
                        Some((_, best_distance)) if distance >= best_distance => {}
                        _ => best = Some((start, distance)),
                    }
                }
                best.map(|(start, _)| start)
            }
        }
    }

    /// Inserts `point` right after the first endpoint of its nearest edge.
    ///
    /// Returns the index of the new vertex.
    pub fn insert_point(&mut self, point: Point) -> usize {
        let index = match self.nearest_edge_start(point) {
            Some(start) => start + 1,
            None => 0,
        };
        self.points.insert(index, point);
        index
    }
}

/// Partial update for household attributes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HouseholdPatch {
    pub name: Option<String>,
    pub color: Option<String>,
    pub points: Option<Vec<Point>>,
}

impl HouseholdPatch {
    pub fn apply_to(self, household: &mut Household) {
        if let Some(value) = self.name {
            household.name = value;
        }
        if let Some(value) = self.color {
            household.color = value;
        }
        if let Some(value) = self.points {
            household.points = value;
        }
    }
}
