//! Raster and SVG back ends for a [`Projection`].

use crate::error::Result;
use crate::triangle::{Extent, Point, ProjectedPoint, Projection, Segment};
use image::{Rgb, RgbImage};
use log::info;
use std::fs::File;
use std::io::Write;
use std::path::Path;

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

/// Drawing parameters. Sizes are in output pixels.
#[derive(Debug, Clone)]
pub struct PlotStyle {
    pub width: u32,
    pub height: u32,
    pub point_radius: f64,
    /// Opacity of the bulk point layer; anchors are always opaque.
    pub alpha: f64,
    pub line_width: f64,
    pub line_rgb: (u8, u8, u8),
}

impl Default for PlotStyle {
    fn default() -> Self {
        PlotStyle {
            width: 2000,
            height: 1000,
            point_radius: 1.0,
            alpha: 0.2,
            line_width: 1.0,
            line_rgb: (0, 0, 0),
        }
    }
}

/// Plot space to pixel space; y grows downwards in pixels.
#[derive(Debug, Clone, Copy)]
struct Frame {
    sx: f64,
    sy: f64,
    bottom: f64,
}

impl Frame {
    fn new(extent: Extent, width: u32, height: u32) -> Self {
        let w = width.saturating_sub(1) as f64;
        let h = height.saturating_sub(1) as f64;
        Frame {
            sx: if extent.width > 0.0 { w / extent.width } else { 0.0 },
            sy: if extent.height > 0.0 { h / extent.height } else { 0.0 },
            bottom: h,
        }
    }

    fn map(&self, p: Point) -> (f64, f64) {
        (p.x * self.sx, self.bottom - p.y * self.sy)
    }
}

fn blend(img: &mut RgbImage, x: i64, y: i64, rgb: (u8, u8, u8), alpha: f64) {
    if x < 0 || y < 0 || x >= img.width() as i64 || y >= img.height() as i64 {
        return;
    }
    let px = img.get_pixel_mut(x as u32, y as u32);
    let src = [rgb.0, rgb.1, rgb.2];
    for (dst, s) in px.0.iter_mut().zip(src) {
        *dst = (s as f64 * alpha + *dst as f64 * (1.0 - alpha)).round() as u8;
    }
}

fn draw_disc(img: &mut RgbImage, cx: f64, cy: f64, radius: f64, rgb: (u8, u8, u8), alpha: f64) {
    if radius <= 0.5 {
        blend(img, cx.round() as i64, cy.round() as i64, rgb, alpha);
        return;
    }
    let r2 = radius * radius;
    let (x0, x1) = ((cx - radius).floor() as i64, (cx + radius).ceil() as i64);
    let (y0, y1) = ((cy - radius).floor() as i64, (cy + radius).ceil() as i64);
    for y in y0..=y1 {
        for x in x0..=x1 {
            let (dx, dy) = (x as f64 - cx, y as f64 - cy);
            if dx * dx + dy * dy <= r2 {
                blend(img, x, y, rgb, alpha);
            }
        }
    }
}

/// DDA line, stamped with a disc when wider than a pixel.
fn draw_line(img: &mut RgbImage, frame: &Frame, seg: &Segment, style: &PlotStyle) {
    let (x0, y0) = frame.map(seg.from);
    let (x1, y1) = frame.map(seg.to);
    let steps = (x1 - x0).abs().max((y1 - y0).abs()).ceil().max(1.0) as usize;
    let radius = style.line_width / 2.0;
    for i in 0..=steps {
        let t = i as f64 / steps as f64;
        let x = x0 + (x1 - x0) * t;
        let y = y0 + (y1 - y0) * t;
        draw_disc(img, x, y, radius, style.line_rgb, 1.0);
    }
}

fn draw_points(img: &mut RgbImage, frame: &Frame, points: &[ProjectedPoint], radius: f64, alpha: f64) {
    for p in points {
        let (x, y) = frame.map(p.at);
        draw_disc(img, x, y, radius, p.color.rgb(), alpha);
    }
}

/// Rasterize: gridlines, then all points translucent, then anchors opaque.
pub fn render_image(projection: &Projection, style: &PlotStyle) -> RgbImage {
    let mut img = RgbImage::from_pixel(style.width, style.height, WHITE);
    let frame = Frame::new(projection.extent, style.width, style.height);

    for seg in projection.gridlines.iter().chain(std::iter::once(&projection.baseline)) {
        draw_line(&mut img, &frame, seg, style);
    }
    draw_points(&mut img, &frame, &projection.points, style.point_radius, style.alpha);
    draw_points(&mut img, &frame, &projection.anchors, style.point_radius, 1.0);
    img
}

fn svg_line(svg: &mut String, frame: &Frame, seg: &Segment, style: &PlotStyle) {
    let (x1, y1) = frame.map(seg.from);
    let (x2, y2) = frame.map(seg.to);
    let (r, g, b) = style.line_rgb;
    svg.push_str(&format!(
        r#"<line x1="{:.2}" y1="{:.2}" x2="{:.2}" y2="{:.2}" stroke="rgb({},{},{})" stroke-width="{}"/>"#,
        x1, y1, x2, y2, r, g, b, style.line_width
    ));
    svg.push('\n');
}

fn svg_points(svg: &mut String, frame: &Frame, points: &[ProjectedPoint], radius: f64, alpha: f64) {
    for p in points {
        let (x, y) = frame.map(p.at);
        svg.push_str(&format!(
            r#"<circle cx="{:.2}" cy="{:.2}" r="{}" fill="{}" fill-opacity="{}"/>"#,
            x,
            y,
            radius,
            p.color.svg_name(),
            alpha
        ));
        svg.push('\n');
    }
}

/// Same layering as [`render_image`], as an SVG document.
pub fn render_svg(projection: &Projection, style: &PlotStyle) -> String {
    let frame = Frame::new(projection.extent, style.width, style.height);
    let mut svg = String::new();

    svg.push_str(&format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}" viewBox="0 0 {} {}">
<rect width="100%" height="100%" fill="white"/>
"#,
        style.width, style.height, style.width, style.height
    ));

    svg.push_str("<g id=\"grid\">\n");
    for seg in projection.gridlines.iter().chain(std::iter::once(&projection.baseline)) {
        svg_line(&mut svg, &frame, seg, style);
    }
    svg.push_str("</g>\n<g id=\"hits\">\n");
    svg_points(&mut svg, &frame, &projection.points, style.point_radius, style.alpha);
    svg.push_str("</g>\n<g id=\"anchors\">\n");
    svg_points(&mut svg, &frame, &projection.anchors, style.point_radius, 1.0);
    svg.push_str("</g>\n</svg>\n");

    svg
}

fn is_svg(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("svg"))
        .unwrap_or(false)
}

/// Write the plot; the format follows the file extension (SVG or any
/// raster format `image` knows).
pub fn write_plot(projection: &Projection, style: &PlotStyle, path: &Path) -> Result<()> {
    if is_svg(path) {
        info!("Rendering SVG...");
        let svg = render_svg(projection, style);
        info!("Saving to {:?}...", path);
        let mut file = File::create(path)?;
        file.write_all(svg.as_bytes())?;
    } else {
        info!("Rendering image...");
        let img = render_image(projection, style);
        info!("Saving to {:?}...", path);
        img.save(path)?;
    }
    Ok(())
}
