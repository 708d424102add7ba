//! SVG serialization of a render tree.

use crate::export::render::{NodeGlyph, NodeShape, RenderTree, SceneElement, TextRun};
use crate::export::text::DEFAULT_FONT_SIZE;
use crate::model::geometry::Point;
use crate::model::relationship::LineStyle;

const FONT_FAMILY: &str = "Helvetica, Arial, sans-serif";
const STROKE_WIDTH: f64 = 2.0;
const DOUBLE_LINE_GAP: f64 = 3.0;
const ZIGZAG_STEP: f64 = 8.0;
const ZIGZAG_AMPLITUDE: f64 = 4.0;

/// Serializes `tree` to a standalone SVG document.
pub fn render_svg(tree: &RenderTree) -> String {
    let width = tree.width;
    let height = tree.height;
    let mut svg = String::new();
    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width:.2}\" height=\"{height:.2}\" viewBox=\"0 0 {width:.2} {height:.2}\">",
    ));
    if let Some(background) = &tree.background {
        svg.push_str(&format!(
            "<rect width=\"100%\" height=\"100%\" fill=\"{}\"/>",
            escape_xml(background)
        ));
    }
    for element in &tree.elements {
        svg.push_str(&element_svg(element, &tree.foreground));
    }
    svg.push_str("</svg>");
    svg
}

fn element_svg(element: &SceneElement, foreground: &str) -> String {
    match element {
        SceneElement::Grid { area, spacing } => {
            let mut out = String::from("<g stroke=\"#e0e0e0\" stroke-width=\"0.5\">");
            if *spacing > 0.0 {
                let mut x = (area.x / spacing).ceil() * spacing;
                while x <= area.max_x() {
                    out.push_str(&format!(
                        "<line x1=\"{x:.2}\" y1=\"{:.2}\" x2=\"{x:.2}\" y2=\"{:.2}\"/>",
                        area.y,
                        area.max_y()
                    ));
                    x += spacing;
                }
                let mut y = (area.y / spacing).ceil() * spacing;
                while y <= area.max_y() {
                    out.push_str(&format!(
                        "<line x1=\"{:.2}\" y1=\"{y:.2}\" x2=\"{:.2}\" y2=\"{y:.2}\"/>",
                        area.x,
                        area.max_x()
                    ));
                    y += spacing;
                }
            }
            out.push_str("</g>");
            out
        }
        SceneElement::Household {
            points,
            color,
            label,
        } => {
            if points.is_empty() {
                return String::new();
            }
            let color = escape_xml(color);
            let mut out = format!(
                "<path d=\"{} Z\" fill=\"{color}\" fill-opacity=\"0.08\" stroke=\"{color}\" stroke-width=\"{STROKE_WIDTH}\" stroke-dasharray=\"8 4\"/>",
                points_to_path(points)
            );
            if !label.is_empty() {
                out.push_str(&text_svg(
                    points[0].x + 6.0,
                    points[0].y + DEFAULT_FONT_SIZE + 4.0,
                    label,
                    &color,
                    "start",
                ));
            }
            out
        }
        SceneElement::Edge {
            points,
            color,
            style,
        } => edge_svg(points, &escape_xml(color), *style),
        SceneElement::Bubble {
            center,
            radius,
            color,
        } => format!(
            "<circle cx=\"{:.2}\" cy=\"{:.2}\" r=\"{radius:.2}\" fill=\"{}\"/>",
            center.x,
            center.y,
            escape_xml(color)
        ),
        SceneElement::Node(glyph) => node_svg(glyph, foreground),
        SceneElement::RichText { area, html } => {
            let runs = crate::export::render::flatten_text_box(*area, html);
            runs_svg(&runs, foreground)
        }
        SceneElement::TextBlock { runs, .. } => runs_svg(runs, foreground),
        SceneElement::SelectionHandle { area } => format!(
            "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" fill=\"none\" stroke=\"#2196f3\" stroke-dasharray=\"4 2\"/>",
            area.x, area.y, area.width, area.height
        ),
    }
}

fn edge_svg(points: &[Point], color: &str, style: LineStyle) -> String {
    let path = |d: String, dash: &str| {
        format!(
            "<path d=\"{d}\" fill=\"none\" stroke=\"{color}\" stroke-width=\"{STROKE_WIDTH}\"{dash}/>"
        )
    };
    match style {
        LineStyle::Solid => path(points_to_path(points), ""),
        LineStyle::Dashed => path(points_to_path(points), " stroke-dasharray=\"8 4\""),
        LineStyle::Dotted => path(points_to_path(points), " stroke-dasharray=\"2 4\""),
        LineStyle::Double => {
            let mut out = path(points_to_path(&offset_polyline(points, DOUBLE_LINE_GAP)), "");
            out.push_str(&path(
                points_to_path(&offset_polyline(points, -DOUBLE_LINE_GAP)),
                "",
            ));
            out
        }
        LineStyle::Zigzag => path(points_to_path(&zigzag(points)), ""),
    }
}

fn node_svg(glyph: &NodeGlyph, foreground: &str) -> String {
    let Point { x, y } = glyph.center;
    let half = glyph.size / 2.0;
    let stroke = format!("fill=\"none\" stroke=\"{foreground}\" stroke-width=\"{STROKE_WIDTH}\"");
    let mut out = match glyph.shape {
        NodeShape::Square => format!(
            "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" {stroke}/>",
            x - half,
            y - half,
            glyph.size,
            glyph.size
        ),
        NodeShape::Circle => format!("<circle cx=\"{x:.2}\" cy=\"{y:.2}\" r=\"{half:.2}\" {stroke}/>"),
        NodeShape::Diamond => format!(
            "<path d=\"{} Z\" {stroke}/>",
            points_to_path(&[
                Point::new(x, y - half),
                Point::new(x + half, y),
                Point::new(x, y + half),
                Point::new(x - half, y),
            ])
        ),
        NodeShape::Rectangle => format!(
            "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" {stroke}/>",
            x - glyph.size * 0.75,
            y - half * 0.75,
            glyph.size * 1.5,
            glyph.size * 0.75
        ),
        NodeShape::RoundedRect => format!(
            "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" rx=\"10\" ry=\"10\" {stroke}/>",
            x - half,
            y - half,
            glyph.size,
            glyph.size
        ),
        NodeShape::Triangle => format!(
            "<path d=\"{} Z\" {stroke}/>",
            points_to_path(&[
                Point::new(x, y - half),
                Point::new(x + half, y + half),
                Point::new(x - half, y + half),
            ])
        ),
    };
    if glyph.network_member {
        out.push_str(&format!(
            "<circle cx=\"{:.2}\" cy=\"{:.2}\" r=\"4\" fill=\"{foreground}\"/>",
            x + half,
            y - half
        ));
    }
    if glyph.deceased {
        out.push_str(&format!(
            "<path d=\"M {:.2} {:.2} L {:.2} {:.2} M {:.2} {:.2} L {:.2} {:.2}\" stroke=\"{foreground}\" stroke-width=\"{STROKE_WIDTH}\"/>",
            x - half,
            y - half,
            x + half,
            y + half,
            x + half,
            y - half,
            x - half,
            y + half
        ));
    }
    if let Some(inner) = &glyph.inner_label {
        out.push_str(&text_svg(x, y + DEFAULT_FONT_SIZE / 3.0, inner, foreground, "middle"));
    }
    if !glyph.label.is_empty() {
        out.push_str(&text_svg(
            x,
            y + half + DEFAULT_FONT_SIZE + 4.0,
            &glyph.label,
            foreground,
            "middle",
        ));
    }
    out
}

fn runs_svg(runs: &[TextRun], fill: &str) -> String {
    runs.iter()
        .map(|run| {
            format!(
                "<text x=\"{:.2}\" y=\"{:.2}\" font-family=\"{FONT_FAMILY}\" font-size=\"{}\" fill=\"{fill}\">{}</text>",
                run.x,
                run.y,
                run.font_size,
                escape_xml(&run.text)
            )
        })
        .collect()
}

fn text_svg(x: f64, y: f64, text: &str, fill: &str, anchor: &str) -> String {
    format!(
        "<text x=\"{x:.2}\" y=\"{y:.2}\" text-anchor=\"{anchor}\" font-family=\"{FONT_FAMILY}\" font-size=\"{DEFAULT_FONT_SIZE}\" fill=\"{fill}\">{}</text>",
        escape_xml(text)
    )
}

pub fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

fn points_to_path(points: &[Point]) -> String {
    let mut iter = points.iter();
    let Some(first) = iter.next() else {
        return String::new();
    };
    let mut d = format!("M {:.2} {:.2}", first.x, first.y);
    for point in iter {
        d.push_str(&format!(" L {:.2} {:.2}", point.x, point.y));
    }
    d
}

/// Shifts each segment sideways by `offset` (per-segment normal).
fn offset_polyline(points: &[Point], offset: f64) -> Vec<Point> {
    let mut out = Vec::with_capacity(points.len());
    for (index, point) in points.iter().enumerate() {
        let (a, b) = if index + 1 < points.len() {
            (*point, points[index + 1])
        } else if index > 0 {
            (points[index - 1], *point)
        } else {
            return points.to_vec();
        };
        let length = a.distance_to(b);
        if length == 0.0 {
            out.push(*point);
            continue;
        }
        let normal = Point::new(-(b.y - a.y) / length, (b.x - a.x) / length);
        out.push(point.offset(normal.x * offset, normal.y * offset));
    }
    out
}

fn zigzag(points: &[Point]) -> Vec<Point> {
    let mut out = Vec::new();
    for pair in points.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let length = a.distance_to(b);
        out.push(a);
        if length == 0.0 {
            continue;
        }
        let normal = Point::new(-(b.y - a.y) / length, (b.x - a.x) / length);
        let steps = (length / ZIGZAG_STEP).floor() as usize;
        for step in 1..steps {
            let t = step as f64 / steps as f64;
            let side = if step % 2 == 0 { -1.0 } else { 1.0 };
            let base = a.lerp(b, t);
            out.push(base.offset(
                normal.x * ZIGZAG_AMPLITUDE * side,
                normal.y * ZIGZAG_AMPLITUDE * side,
            ));
        }
    }
    if let Some(last) = points.last() {
        out.push(*last);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{escape_xml, points_to_path, render_svg};
    use crate::export::render::clean_render_tree;
    use crate::model::geometry::Point;
    use crate::model::person::Person;
    use crate::settings::EditorSettings;
    use crate::store::GraphSnapshot;

    #[test]
    fn escape_covers_markup_characters() {
        assert_eq!(
            escape_xml("<a href=\"x\">Tom & 'Jerry'</a>"),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &apos;Jerry&apos;&lt;/a&gt;"
        );
    }

    #[test]
    fn path_uses_move_then_line_commands() {
        assert_eq!(
            points_to_path(&[Point::new(0.0, 0.0), Point::new(1.5, 2.0)]),
            "M 0.00 0.00 L 1.50 2.00"
        );
        assert!(points_to_path(&[]).is_empty());
    }

    #[test]
    fn svg_contains_names_escaped_and_background() {
        let snapshot = GraphSnapshot::new(
            vec![Person::new("Ann <Jr>").at(0.0, 0.0)],
            vec![],
            vec![],
            vec![],
        );
        let svg = render_svg(&clean_render_tree(&snapshot, &EditorSettings::default(), false));
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
        assert!(svg.contains("Ann &lt;Jr&gt;"));
        assert!(svg.contains("fill=\"#ffffff\""));
    }
}
