//! Bounds and export pipeline.
//!
//! # Responsibility
//! - Measure diagram content and build decoration-free render trees.
//! - Serialize render trees to SVG; size raster requests for the host.
//!
//! # Invariants
//! - Exports never mutate the graph.
//! - An empty diagram is declined with `ExportError::NoContent`.

pub mod bounds;
pub mod render;
pub mod svg;
pub mod text;

pub use bounds::{compute_content_bounds, content_bounds, DEFAULT_BOUNDS};
pub use render::{
    build_scene, clean_render_tree, NodeGlyph, NodeShape, RenderTree, Scene, SceneElement,
    SceneOptions, TextRun,
};
pub use svg::{escape_xml, render_svg};

use crate::settings::EditorSettings;
use crate::store::GraphSnapshot;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ExportResult<T> = Result<T, ExportError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportError {
    /// Nothing to draw: no active people, text boxes or households.
    NoContent,
}

impl Display for ExportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoContent => write!(f, "nothing to export: the genogram is empty"),
        }
    }
}

impl Error for ExportError {}

/// Vector export.
#[derive(Debug, Clone, PartialEq)]
pub struct SvgExport {
    pub svg: String,
    pub width: f64,
    pub height: f64,
}

/// Raster export request: the host rasterises `svg` at `scale`.
#[derive(Debug, Clone, PartialEq)]
pub struct PngExport {
    pub svg: String,
    /// Output pixel size.
    pub width: u32,
    pub height: u32,
    pub scale: f64,
}

pub fn export_svg(
    snapshot: &GraphSnapshot,
    settings: &EditorSettings,
    transparent_background: bool,
) -> ExportResult<SvgExport> {
    if content_bounds(snapshot, settings).is_none() {
        info!("event=export_svg module=export status=declined reason=no_content");
        return Err(ExportError::NoContent);
    }
    let tree = clean_render_tree(snapshot, settings, transparent_background);
    let svg = render_svg(&tree);
    info!(
        "event=export_svg module=export status=ok elements={}",
        tree.elements.len()
    );
    Ok(SvgExport {
        svg,
        width: tree.width,
        height: tree.height,
    })
}

pub fn export_png(
    snapshot: &GraphSnapshot,
    settings: &EditorSettings,
    transparent_background: bool,
) -> ExportResult<PngExport> {
    let vector = export_svg(snapshot, settings, transparent_background)?;
    let scale = settings.export_scale;
    Ok(PngExport {
        svg: vector.svg,
        width: (vector.width * scale).ceil() as u32,
        height: (vector.height * scale).ceil() as u32,
        scale,
    })
}

#[cfg(test)]
mod tests {
    use super::{export_png, export_svg, ExportError};
    use crate::model::person::Person;
    use crate::settings::EditorSettings;
    use crate::store::GraphSnapshot;

    #[test]
    fn empty_diagram_is_declined() {
        let settings = EditorSettings::default();
        assert_eq!(
            export_svg(&GraphSnapshot::default(), &settings, false),
            Err(ExportError::NoContent)
        );
    }

    #[test]
    fn png_size_is_scaled() {
        let snapshot =
            GraphSnapshot::new(vec![Person::new("A").at(0.0, 0.0)], vec![], vec![], vec![]);
        let png = export_png(&snapshot, &EditorSettings::default(), true).unwrap();
        // 60px square + 2 * 40px padding, at 2x.
        assert_eq!((png.width, png.height), (280, 280));
        assert_eq!(png.scale, 2.0);
    }
}
