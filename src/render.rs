use crate::error::{PosterError, Result};
use crate::fonts::FontBundle;
use crate::layout::{GradientBand, OpaqueEdge, PosterLayout, Shape, TextItem};
use std::fmt;
use std::path::Path;
use tracing::info;

/// Resolution SVG user units are rasterized at when no DPI is requested.
#[cfg(any(feature = "png", feature = "pdf"))]
const SVG_DPI: f32 = 96.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum OutputFormat {
    Png,
    Svg,
    Pdf,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Svg => "svg",
            OutputFormat::Pdf => "pdf",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

pub fn render_svg(layout: &PosterLayout) -> String {
    let mut svg = String::new();
    let (width, height) = (layout.width, layout.height);

    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{}in\" height=\"{}in\" viewBox=\"0 0 {width} {height}\">",
        layout.width_in, layout.height_in
    ));

    if !layout.gradients.is_empty() {
        svg.push_str("<defs>");
        for band in &layout.gradients {
            svg.push_str(&gradient_def(band));
        }
        svg.push_str("</defs>");
    }

    svg.push_str(&format!(
        "<rect width=\"100%\" height=\"100%\" fill=\"{}\"/>",
        escape_xml(&layout.background)
    ));

    for layer in &layout.layers {
        svg.push_str(&format!("<g id=\"{}\">", layer.layer.id()));
        for shape in &layer.shapes {
            svg.push_str(&shape_svg(shape));
        }
        svg.push_str("</g>");
    }

    for band in &layout.gradients {
        svg.push_str(&format!(
            "<rect x=\"0\" y=\"{:.2}\" width=\"{width}\" height=\"{:.2}\" fill=\"url(#{})\"/>",
            band.y, band.height, band.id
        ));
    }

    svg.push_str(&format!(
        "<g id=\"typography\" font-family=\"{}\">",
        escape_xml(&layout.font_family)
    ));
    let rule = &layout.divider;
    svg.push_str(&format!(
        "<line x1=\"{:.2}\" y1=\"{:.2}\" x2=\"{:.2}\" y2=\"{:.2}\" stroke=\"{}\" stroke-width=\"{:.2}\"/>",
        rule.x1,
        rule.y,
        rule.x2,
        rule.y,
        escape_xml(&rule.stroke),
        rule.width
    ));
    for text in &layout.texts {
        svg.push_str(&text_svg(text));
    }
    svg.push_str("</g>");

    svg.push_str("</svg>");
    svg
}

fn gradient_def(band: &GradientBand) -> String {
    let (top, bottom) = match band.opaque {
        OpaqueEdge::Top => (1, 0),
        OpaqueEdge::Bottom => (0, 1),
    };
    let color = escape_xml(&band.color);
    format!(
        "<linearGradient id=\"{}\" x1=\"0\" y1=\"0\" x2=\"0\" y2=\"1\"><stop offset=\"0\" stop-color=\"{color}\" stop-opacity=\"{top}\"/><stop offset=\"1\" stop-color=\"{color}\" stop-opacity=\"{bottom}\"/></linearGradient>",
        band.id
    )
}

fn shape_svg(shape: &Shape) -> String {
    match shape {
        Shape::Area { rings, fill } => {
            let d: Vec<String> = rings
                .iter()
                .filter(|ring| !ring.is_empty())
                .map(|ring| format!("{} Z", points_to_path(ring)))
                .collect();
            format!(
                "<path d=\"{}\" fill=\"{}\" fill-rule=\"evenodd\"/>",
                d.join(" "),
                escape_xml(fill)
            )
        }
        Shape::Line {
            points,
            stroke,
            width,
        } => format!(
            "<path d=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"{width:.2}\" stroke-linecap=\"round\" stroke-linejoin=\"round\"/>",
            points_to_path(points),
            escape_xml(stroke)
        ),
    }
}

fn text_svg(text: &TextItem) -> String {
    let mut out = format!(
        "<text x=\"{:.2}\" y=\"{:.2}\" text-anchor=\"{}\" font-size=\"{:.2}\" font-weight=\"{}\" fill=\"{}\"",
        text.x,
        text.y,
        text.anchor.as_svg(),
        text.size,
        text.weight.css_weight(),
        escape_xml(&text.fill)
    );
    if text.opacity < 1.0 {
        out.push_str(&format!(" fill-opacity=\"{:.2}\"", text.opacity));
    }
    out.push_str(&format!(">{}</text>", escape_xml(&text.text)));
    out
}

fn points_to_path(points: &[(f32, f32)]) -> String {
    if points.is_empty() {
        return String::new();
    }
    let mut d = String::new();
    d.push_str(&format!("M {:.2} {:.2}", points[0].0, points[0].1));
    for point in points.iter().skip(1) {
        d.push_str(&format!(" L {:.2} {:.2}", point.0, point.1));
    }
    d
}

fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Writes `svg` to `path` in the requested format. `dpi` applies to PNG.
pub fn write_output(
    svg: &str,
    format: OutputFormat,
    path: &Path,
    fonts: &FontBundle,
    dpi: f32,
) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    match format {
        OutputFormat::Svg => write_output_svg(svg, path)?,
        OutputFormat::Png => write_output_png(svg, path, fonts, dpi)?,
        OutputFormat::Pdf => write_output_pdf(svg, path, fonts)?,
    }
    info!(path = %path.display(), "poster saved");
    Ok(())
}

pub fn write_output_svg(svg: &str, path: &Path) -> Result<()> {
    std::fs::write(path, svg)?;
    Ok(())
}

#[cfg(any(feature = "png", feature = "pdf"))]
fn usvg_options(fonts: &FontBundle) -> usvg::Options<'static> {
    let mut opt = usvg::Options::default();
    let db = opt.fontdb_mut();
    for file in fonts.files() {
        if let Err(err) = db.load_font_file(file) {
            tracing::warn!(path = %file.display(), "failed to load font: {err}");
        }
    }
    if fonts.files().is_empty() {
        db.load_system_fonts();
    }
    opt.font_family = fonts.family().unwrap_or("monospace").to_string();
    opt
}

#[cfg(any(feature = "png", feature = "pdf"))]
fn parse_tree(svg: &str, fonts: &FontBundle) -> Result<usvg::Tree> {
    usvg::Tree::from_str(svg, &usvg_options(fonts))
        .map_err(|e| PosterError::Render(format!("invalid SVG: {e}")))
}

#[cfg(feature = "png")]
pub fn write_output_png(svg: &str, path: &Path, fonts: &FontBundle, dpi: f32) -> Result<()> {
    let tree = parse_tree(svg, fonts)?;
    let zoom = dpi / SVG_DPI;
    let size = tree.size();
    let width = (size.width() * zoom).ceil() as u32;
    let height = (size.height() * zoom).ceil() as u32;
    let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| PosterError::Render(format!("cannot allocate a {width}x{height} pixmap")))?;

    let mut pixmap_mut = pixmap.as_mut();
    resvg::render(
        &tree,
        resvg::tiny_skia::Transform::from_scale(zoom, zoom),
        &mut pixmap_mut,
    );
    pixmap
        .save_png(path)
        .map_err(|e| PosterError::Render(format!("PNG encoding failed: {e}")))?;
    Ok(())
}

#[cfg(not(feature = "png"))]
pub fn write_output_png(_svg: &str, _path: &Path, _fonts: &FontBundle, _dpi: f32) -> Result<()> {
    Err(PosterError::Render(
        "PNG output not enabled (compile with the 'png' feature)".to_string(),
    ))
}

#[cfg(feature = "pdf")]
pub fn write_output_pdf(svg: &str, path: &Path, fonts: &FontBundle) -> Result<()> {
    use printpdf::{Mm, PdfDocument, Svg, SvgTransform};

    // Text becomes outlines here so the PDF needs no embedded fonts.
    let tree = parse_tree(svg, fonts)?;
    let flattened = tree.to_string(&usvg::WriteOptions::default());
    let size = tree.size();
    let to_mm = |px: f32| Mm(px * 25.4 / SVG_DPI);

    let (doc, page, layer) = PdfDocument::new(
        "City map poster",
        to_mm(size.width()),
        to_mm(size.height()),
        "poster",
    );
    let layer = doc.get_page(page).get_layer(layer);
    let graphic = Svg::parse(&flattened)
        .map_err(|e| PosterError::Render(format!("PDF conversion failed: {e:?}")))?;
    graphic.add_to_layer(
        &layer,
        SvgTransform {
            dpi: Some(SVG_DPI),
            ..Default::default()
        },
    );

    let file = std::fs::File::create(path)?;
    doc.save(&mut std::io::BufWriter::new(file))
        .map_err(|e| PosterError::Render(format!("PDF write failed: {e:?}")))?;
    Ok(())
}

#[cfg(not(feature = "pdf"))]
pub fn write_output_pdf(_svg: &str, _path: &Path, _fonts: &FontBundle) -> Result<()> {
    Err(PosterError::Render(
        "PDF output not enabled (compile with the 'pdf' feature)".to_string(),
    ))
}
