//! Content bounds of a diagram.

use crate::model::geometry::Rect;
use crate::settings::EditorSettings;
use crate::store::GraphSnapshot;

/// Returned when the diagram has nothing to measure.
pub const DEFAULT_BOUNDS: Rect = Rect::new(0.0, 0.0, 800.0, 600.0);

/// Minimal rectangle covering active people (as squares), text boxes and
/// household vertices; `DEFAULT_BOUNDS` when there is none of these.
pub fn compute_content_bounds(snapshot: &GraphSnapshot, settings: &EditorSettings) -> Rect {
    content_bounds(snapshot, settings).unwrap_or(DEFAULT_BOUNDS)
}

/// Like [`compute_content_bounds`] but `None` for an empty diagram.
pub fn content_bounds(snapshot: &GraphSnapshot, settings: &EditorSettings) -> Option<Rect> {
    let people = snapshot
        .people
        .iter()
        .filter(|person| person.is_active())
        .map(|person| Rect::centered_square(person.position(), settings.person_size));
    let text_boxes = snapshot.text_boxes.iter().map(|text_box| text_box.rect());
    let vertices = snapshot
        .households
        .iter()
        .flat_map(|household| household.points.iter())
        .map(|point| Rect::new(point.x, point.y, 0.0, 0.0));

    people
        .chain(text_boxes)
        .chain(vertices)
        .reduce(|acc, rect| acc.union(&rect))
}

#[cfg(test)]
mod tests {
    use super::{compute_content_bounds, content_bounds, DEFAULT_BOUNDS};
    use crate::model::annotation::TextBox;
    use crate::model::geometry::{Point, Rect};
    use crate::model::household::Household;
    use crate::model::person::Person;
    use crate::settings::EditorSettings;
    use crate::store::GraphSnapshot;

    #[test]
    fn empty_diagram_uses_default_rectangle() {
        let snapshot = GraphSnapshot::default();
        assert_eq!(
            compute_content_bounds(&snapshot, &EditorSettings::default()),
            DEFAULT_BOUNDS
        );
        assert!(content_bounds(&snapshot, &EditorSettings::default()).is_none());
    }

    #[test]
    fn bounds_cover_people_boxes_and_vertices() {
        let snapshot = GraphSnapshot::new(
            vec![Person::new("A").at(100.0, 100.0)],
            vec![],
            vec![Household::new(
                "Home",
                vec![
                    Point::new(-50.0, 0.0),
                    Point::new(0.0, -20.0),
                    Point::new(0.0, 0.0),
                ],
            )],
            vec![TextBox::new(200.0, 150.0, 100.0, 40.0, "note")],
        );
        assert_eq!(
            compute_content_bounds(&snapshot, &EditorSettings::default()),
            Rect::new(-50.0, -20.0, 350.0, 210.0)
        );
    }

    #[test]
    fn archived_people_are_ignored() {
        let mut archived = Person::new("Old").at(5000.0, 5000.0);
        archived.archive_into("keeper".into());
        let snapshot = GraphSnapshot::new(
            vec![Person::new("A").at(0.0, 0.0), archived],
            vec![],
            vec![],
            vec![],
        );
        assert_eq!(
            compute_content_bounds(&snapshot, &EditorSettings::default()),
            Rect::new(-30.0, -30.0, 60.0, 60.0)
        );
    }
}
