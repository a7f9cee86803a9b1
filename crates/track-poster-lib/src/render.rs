//! Poster renderers

use crate::{PosterDrawing, Result};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

/// Draws a composed poster; all coordinates are final
pub trait Renderer {
    fn render(&mut self, drawing: &PosterDrawing) -> Result<()>;
}

/// Writes the poster as an SVG document sized in millimeters
#[derive(Debug, Clone)]
pub struct SvgRenderer {
    output: PathBuf,
}

impl SvgRenderer {
    pub fn new(output: impl AsRef<Path>) -> Self {
        Self {
            output: output.as_ref().to_path_buf(),
        }
    }

    /// Build the SVG document without writing it
    pub fn to_svg(drawing: &PosterDrawing) -> String {
        let (w, h) = (drawing.width, drawing.height);
        let mut s = String::new();
        s.push_str("<?xml version=\"1.0\" encoding=\"utf-8\" ?>\n");
        let _ = writeln!(
            s,
            "<svg xmlns=\"http://www.w3.org/2000/svg\" version=\"1.1\" width=\"{w}mm\" height=\"{h}mm\" viewBox=\"0 0 {w} {h}\">"
        );
        let _ = writeln!(
            s,
            "<rect x=\"0\" y=\"0\" width=\"{w}\" height=\"{h}\" fill=\"{}\"/>",
            svg_escape(&drawing.background)
        );

        for label in &drawing.labels {
            let weight = if label.bold { " font-weight:bold;" } else { "" };
            let _ = writeln!(
                s,
                "<text x=\"{}\" y=\"{}\" fill=\"{}\" style=\"font-size:{}px; font-family:Arial;{weight}\">{}</text>",
                label.position.x,
                label.position.y,
                svg_escape(&label.color),
                label.font_size,
                svg_escape(&label.text)
            );
        }

        for track in &drawing.tracks {
            let color = svg_escape(&track.color);
            for line in &track.lines {
                let mut points = String::new();
                for (i, p) in line.iter().enumerate() {
                    if i > 0 {
                        points.push(' ');
                    }
                    let _ = write!(points, "{:.3},{:.3}", p.x, p.y);
                }
                let _ = writeln!(
                    s,
                    "<polyline fill=\"none\" points=\"{points}\" stroke=\"{color}\" stroke-linecap=\"round\" stroke-linejoin=\"round\" stroke-width=\"0.5\"/>"
                );
            }
        }

        s.push_str("</svg>\n");
        s
    }
}

impl Renderer for SvgRenderer {
    fn render(&mut self, drawing: &PosterDrawing) -> Result<()> {
        std::fs::write(&self.output, Self::to_svg(drawing))?;
        tracing::info!("Wrote poster to {}", self.output.display());
        Ok(())
    }
}

fn svg_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
