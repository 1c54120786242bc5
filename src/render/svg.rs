//! SVG document surface for writing charts to disk.

#![allow(missing_docs)]

use std::fmt::Write as _;
use std::fs;
use std::io::{self, Write as _};
use std::path::{Path, PathBuf};

use super::surface::{DrawSurface, Rect, TextStyle};
use super::theme::Paint;

/// Accumulates drawing calls as SVG elements.
#[derive(Debug, Clone, Default)]
pub struct SvgSurface {
    width: f64,
    height: f64,
    elements: Vec<String>,
    font_family: String,
}

impl SvgSurface {
    #[must_use]
    pub fn new() -> Self {
        Self {
            width: 0.0,
            height: 0.0,
            elements: Vec::new(),
            font_family: "Arial, sans-serif".to_string(),
        }
    }

    #[must_use]
    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    /// Render the complete SVG document.
    #[must_use]
    pub fn to_svg_string(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            w = fmt_num(self.width),
            h = fmt_num(self.height),
        );
        for el in &self.elements {
            out.push_str("  ");
            out.push_str(el);
            out.push('\n');
        }
        out.push_str("</svg>\n");
        out
    }

    /// Write the document via temp file + rename so readers never see a partial chart.
    pub fn write_to(&self, path: &Path) -> io::Result<PathBuf> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let tmp_path = path.with_extension("svg.tmp");
        {
            let mut file = fs::File::create(&tmp_path)?;
            file.write_all(self.to_svg_string().as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&tmp_path, path)?;
        Ok(path.to_path_buf())
    }
}

impl DrawSurface for SvgSurface {
    fn set_size(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
    }

    fn size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    fn clear(&mut self) {
        self.elements.clear();
    }

    fn fill_rect(&mut self, rect: Rect, paint: Paint) {
        self.elements.push(format!(
            r#"<rect x="{}" y="{}" width="{}" height="{}" fill="{}"/>"#,
            fmt_num(rect.x),
            fmt_num(rect.y),
            fmt_num(rect.width),
            fmt_num(rect.height),
            paint.to_css(),
        ));
    }

    fn fill_text(&mut self, text: &str, x: f64, y: f64, style: TextStyle) {
        self.elements.push(format!(
            r#"<text x="{}" y="{}" font-family="{}" font-size="{}" fill="{}">{}</text>"#,
            fmt_num(x),
            fmt_num(y),
            self.font_family,
            fmt_num(style.font_size),
            style.paint.to_css(),
            escape_xml(text),
        ));
    }
}

/// Compact numeric attribute: at most two decimals, no trailing zeros.
fn fmt_num(value: f64) -> String {
    let rounded = (value * 100.0).round() / 100.0;
    let s = format!("{rounded:.2}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" { "0".to_string() } else { s.to_string() }
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    out
}
