//! Scene construction for canvas and export.
//!
//! # Responsibility
//! - Turn a graph snapshot into drawable primitives in world coordinates.
//! - Produce the export tree: decorations removed, rich text flattened,
//!   translated so the padded content bounds start at the origin.
//!
//! # Invariants
//! - Archived people and edges touching them are never drawn.
//! - The export tree carries no transform; every coordinate is final.

use crate::export::bounds::compute_content_bounds;
use crate::export::text::{flatten_html, wrap_text, DEFAULT_FONT_SIZE, LINE_HEIGHT_RATIO};
use crate::model::geometry::{Point, Rect};
use crate::model::ids::{EntityRef, PersonId};
use crate::model::person::{Gender, NodeKind, Person};
use crate::model::relationship::{LineStyle, RelationshipLink};
use crate::settings::EditorSettings;
use crate::store::GraphSnapshot;
use std::collections::HashMap;

const BUBBLE_RADIUS: f64 = 6.0;
const TEXT_INSET: f64 = 4.0;
const HANDLE_MARGIN: f64 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeShape {
    Square,
    Circle,
    Diamond,
    Rectangle,
    RoundedRect,
    Triangle,
}

impl NodeShape {
    pub fn for_person(person: &Person) -> Self {
        match &person.kind {
            NodeKind::Person => match person.gender {
                Gender::Male => Self::Square,
                Gender::Female => Self::Circle,
                Gender::Nonbinary | Gender::Unknown => Self::Diamond,
            },
            NodeKind::Organization { .. } => Self::Rectangle,
            NodeKind::Service { .. } | NodeKind::Custom { .. } => Self::RoundedRect,
            NodeKind::Place { .. } => Self::Triangle,
        }
    }
}

/// One person/node symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeGlyph {
    pub id: PersonId,
    pub center: Point,
    pub size: f64,
    pub shape: NodeShape,
    pub label: String,
    /// Age printed inside the symbol.
    pub inner_label: Option<String>,
    pub deceased: bool,
    pub network_member: bool,
}

/// Positioned line of plain text.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub x: f64,
    /// Baseline.
    pub y: f64,
    pub text: String,
    pub font_size: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SceneElement {
    /// Background grid (decoration).
    Grid { area: Rect, spacing: f64 },
    Household {
        points: Vec<Point>,
        color: String,
        label: String,
    },
    Edge {
        points: Vec<Point>,
        color: String,
        style: LineStyle,
    },
    /// Union handle (decoration).
    Bubble { center: Point, radius: f64, color: String },
    Node(NodeGlyph),
    /// Live text box, still holding editor HTML.
    RichText { area: Rect, html: String },
    /// Flattened text box.
    TextBlock { area: Rect, runs: Vec<TextRun> },
    /// Selection outline (decoration).
    SelectionHandle { area: Rect },
}

impl SceneElement {
    pub fn is_decoration(&self) -> bool {
        matches!(
            self,
            Self::Grid { .. } | Self::Bubble { .. } | Self::SelectionHandle { .. }
        )
    }

    fn translate(&mut self, dx: f64, dy: f64) {
        let shift = |rect: &mut Rect| {
            rect.x += dx;
            rect.y += dy;
        };
        match self {
            Self::Grid { area, .. }
            | Self::RichText { area, .. }
            | Self::SelectionHandle { area } => shift(area),
            Self::Household { points, .. } | Self::Edge { points, .. } => {
                for point in points.iter_mut() {
                    *point = point.offset(dx, dy);
                }
            }
            Self::Bubble { center, .. } => *center = center.offset(dx, dy),
            Self::Node(glyph) => glyph.center = glyph.center.offset(dx, dy),
            Self::TextBlock { area, runs } => {
                shift(area);
                for run in runs.iter_mut() {
                    run.x += dx;
                    run.y += dy;
                }
            }
        }
    }
}

/// Decorations to include in a live scene.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneOptions {
    pub show_grid: bool,
    pub show_bubbles: bool,
    pub selection: Option<EntityRef>,
}

/// Drawable primitives in world coordinates, back to front.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scene {
    pub elements: Vec<SceneElement>,
}

/// Export-ready scene.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderTree {
    pub width: f64,
    pub height: f64,
    /// `None` for transparent exports.
    pub background: Option<String>,
    pub foreground: String,
    /// Content bounds in world coordinates, before padding.
    pub content_bounds: Rect,
    pub padding: f64,
    pub elements: Vec<SceneElement>,
}

/// Builds the live scene including requested decorations.
pub fn build_scene(
    snapshot: &GraphSnapshot,
    settings: &EditorSettings,
    options: &SceneOptions,
) -> Scene {
    let size = settings.person_size;
    let centers: HashMap<&PersonId, Point> = snapshot
        .people
        .iter()
        .filter(|person| person.is_active())
        .map(|person| (&person.id, person.position()))
        .collect();

    let mut elements = Vec::new();
    if options.show_grid {
        elements.push(SceneElement::Grid {
            area: compute_content_bounds(snapshot, settings).padded(settings.grid_size * 4.0),
            spacing: settings.grid_size,
        });
    }

    for household in snapshot.households.iter() {
        elements.push(SceneElement::Household {
            points: household.points.clone(),
            color: household.color.clone(),
            label: household.name.clone(),
        });
    }

    // Anchor point on each union where child lines start.
    let mut anchors: HashMap<&str, Point> = HashMap::new();
    for rel in snapshot.relationships.iter() {
        match &rel.link {
            RelationshipLink::Union { from, to } => {
                let (Some(a), Some(b)) = (centers.get(from), centers.get(to)) else {
                    continue;
                };
                elements.push(SceneElement::Edge {
                    points: vec![*a, *b],
                    color: rel.color.clone(),
                    style: rel.line_style,
                });
                anchors.insert(rel.id.as_str(), a.lerp(*b, rel.bubble_position));
            }
            RelationshipLink::SingleParent { parent } => {
                if let Some(center) = centers.get(parent) {
                    anchors.insert(rel.id.as_str(), center.offset(0.0, size / 2.0));
                }
            }
            RelationshipLink::Child { .. } => {}
        }
    }

    for rel in snapshot.relationships.iter() {
        let RelationshipLink::Child { union, child } = &rel.link else {
            continue;
        };
        let (Some(anchor), Some(child_center)) = (anchors.get(union.as_str()), centers.get(child))
        else {
            continue;
        };
        let top = child_center.offset(0.0, -size / 2.0);
        let mid_y = (anchor.y + top.y) / 2.0;
        elements.push(SceneElement::Edge {
            points: vec![
                *anchor,
                Point::new(anchor.x, mid_y),
                Point::new(top.x, mid_y),
                top,
            ],
            color: rel.color.clone(),
            style: rel.line_style,
        });
    }

    if options.show_bubbles {
        for rel in snapshot.relationships.iter() {
            if let Some(center) = anchors.get(rel.id.as_str()) {
                elements.push(SceneElement::Bubble {
                    center: *center,
                    radius: BUBBLE_RADIUS,
                    color: rel.color.clone(),
                });
            }
        }
    }

    for person in snapshot.people.iter().filter(|person| person.is_active()) {
        elements.push(SceneElement::Node(NodeGlyph {
            id: person.id.clone(),
            center: person.position(),
            size,
            shape: NodeShape::for_person(person),
            label: person.name.clone(),
            inner_label: person.age.map(|age| age.to_string()),
            deceased: person.is_deceased,
            network_member: person.network_member,
        }));
    }

    for text_box in snapshot.text_boxes.iter() {
        elements.push(SceneElement::RichText {
            area: text_box.rect(),
            html: text_box.html.clone(),
        });
    }

    if let Some(area) = options
        .selection
        .as_ref()
        .and_then(|selected| selection_area(snapshot, settings, selected))
    {
        elements.push(SceneElement::SelectionHandle {
            area: area.padded(HANDLE_MARGIN),
        });
    }

    Scene { elements }
}

fn selection_area(
    snapshot: &GraphSnapshot,
    settings: &EditorSettings,
    selected: &EntityRef,
) -> Option<Rect> {
    match selected {
        EntityRef::Person(id) => snapshot
            .person(id)
            .filter(|person| person.is_active())
            .map(|person| Rect::centered_square(person.position(), settings.person_size)),
        EntityRef::TextBox(id) => snapshot
            .text_boxes
            .iter()
            .find(|text_box| &text_box.id == id)
            .map(|text_box| text_box.rect()),
        EntityRef::Household(id) => snapshot
            .households
            .iter()
            .find(|household| &household.id == id)
            .and_then(|household| {
                household
                    .points
                    .iter()
                    .map(|point| Rect::new(point.x, point.y, 0.0, 0.0))
                    .reduce(|acc, rect| acc.union(&rect))
            }),
        EntityRef::Relationship(_) => None,
    }
}

/// Flattens one text box into wrapped runs inside `area`.
pub fn flatten_text_box(area: Rect, html: &str) -> Vec<TextRun> {
    let font_size = DEFAULT_FONT_SIZE;
    let line_height = font_size * LINE_HEIGHT_RATIO;
    let text = flatten_html(html);
    if text.is_empty() {
        return Vec::new();
    }
    wrap_text(&text, area.width - TEXT_INSET * 2.0, font_size)
        .into_iter()
        .enumerate()
        .filter(|(_, line)| !line.is_empty())
        .map(|(index, line)| TextRun {
            x: area.x + TEXT_INSET,
            y: area.y + TEXT_INSET + font_size + index as f64 * line_height,
            text: line,
            font_size,
        })
        .collect()
}

/// Export tree: no decorations, flattened text, origin at the padded bounds.
pub fn clean_render_tree(
    snapshot: &GraphSnapshot,
    settings: &EditorSettings,
    transparent_background: bool,
) -> RenderTree {
    let content_bounds = compute_content_bounds(snapshot, settings);
    let padded = content_bounds.padded(settings.export_padding);
    let (dx, dy) = (-padded.x, -padded.y);

    let elements = build_scene(snapshot, settings, &SceneOptions::default())
        .elements
        .into_iter()
        .filter(|element| !element.is_decoration())
        .map(|element| {
            let mut element = match element {
                SceneElement::RichText { area, html } => SceneElement::TextBlock {
                    area,
                    runs: flatten_text_box(area, &html),
                },
                other => other,
            };
            element.translate(dx, dy);
            element
        })
        .collect();

    RenderTree {
        width: padded.width,
        height: padded.height,
        background: (!transparent_background).then(|| settings.theme.background().to_string()),
        foreground: settings.theme.foreground().to_string(),
        content_bounds,
        padding: settings.export_padding,
        elements,
    }
}
