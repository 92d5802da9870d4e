//! SVG rendering of route plans.
//!
//! Draws the route polyline, numbered markers and per-leg distance labels,
//! using an equirectangular projection scaled by the cosine of the mean
//! latitude. Good enough for city-sized routes.

use crate::assembler::RoutePlan;
use crate::error::Result;
use crate::services::MapRenderer;
use crate::waypoint::Waypoint;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

/// SVG route renderer
pub struct SvgRenderer {
    /// Canvas width
    pub width: f64,
    /// Canvas height
    pub height: f64,
    /// Margin
    pub margin: f64,
    /// Marker radius
    pub marker_radius: f64,
    /// Where [`MapRenderer::render`] writes the drawing
    pub output: Option<PathBuf>,
    /// Also convert the SVG to PNG next to it
    pub png: bool,
    last_svg: Option<String>,
}

impl Default for SvgRenderer {
    fn default() -> Self {
        SvgRenderer {
            width: 800.0,
            height: 800.0,
            margin: 50.0,
            marker_radius: 10.0,
            output: None,
            png: false,
            last_svg: None,
        }
    }
}

impl SvgRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn to_file<P: Into<PathBuf>>(path: P) -> Self {
        SvgRenderer { output: Some(path.into()), ..Self::default() }
    }

    pub fn with_png(mut self, png: bool) -> Self {
        self.png = png;
        self
    }

    /// SVG of the most recent render, if not cleared since
    pub fn last_svg(&self) -> Option<&str> {
        self.last_svg.as_deref()
    }

    /// Generate SVG visualization of a plan
    pub fn generate_svg(&self, plan: &RoutePlan) -> String {
        let waypoints = plan.route().waypoints();
        let mut svg = String::new();

        let project = self.projection(waypoints);

        svg.push_str(&format!(
            r##"<?xml version="1.0" encoding="UTF-8"?>
<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}" viewBox="0 0 {} {}">
<style>
    .marker {{ fill: #2196F3; stroke: #0d47a1; stroke-width: 2; }}
    .start {{ fill: #2ecc71; stroke: #27ae60; stroke-width: 2; }}
    .end {{ fill: #e74c3c; stroke: #c0392b; stroke-width: 2; }}
    .path {{ stroke: #2196F3; stroke-width: 4; stroke-opacity: 0.7; fill: none; }}
    .number {{ font-family: Arial; font-size: 11px; fill: #ffffff; font-weight: bold; }}
    .label {{ font-family: Arial; font-size: 10px; fill: #2c3e50; }}
    .leg {{ font-family: Arial; font-size: 10px; fill: #1565c0; }}
    .title {{ font-family: Arial; font-size: 14px; fill: #2c3e50; font-weight: bold; }}
</style>
<rect width="100%" height="100%" fill="#ecf0f1"/>
"##,
            self.width, self.height, self.width, self.height
        ));

        svg.push_str(&format!(
            r##"<text x="{}" y="25" class="title">{:?} route | {} stops | Total: {:.2} km</text>
"##,
            self.margin,
            plan.mode,
            waypoints.len(),
            plan.total_km()
        ));

        if waypoints.len() > 1 {
            let points: Vec<String> = waypoints
                .iter()
                .map(|w| {
                    let (x, y) = project(w);
                    format!("{:.2},{:.2}", x, y)
                })
                .collect();
            svg.push_str(&format!(
                r#"<polyline points="{}" class="path"/>
"#,
                points.join(" ")
            ));

            for (pair, leg) in waypoints.windows(2).zip(plan.summary().legs.iter()) {
                let (x1, y1) = project(&pair[0]);
                let (x2, y2) = project(&pair[1]);
                svg.push_str(&format!(
                    r#"<text x="{:.2}" y="{:.2}" class="leg" text-anchor="middle">{:.2}km</text>
"#,
                    (x1 + x2) / 2.0,
                    (y1 + y2) / 2.0 - 4.0,
                    leg.distance_km
                ));
            }
        }

        let last = waypoints.len().saturating_sub(1);
        for (index, waypoint) in waypoints.iter().enumerate() {
            let (x, y) = project(waypoint);
            let class = if index == 0 {
                "start"
            } else if index == last {
                "end"
            } else {
                "marker"
            };

            svg.push_str(&format!(
                r##"<circle cx="{:.2}" cy="{:.2}" r="{}" class="{}"/>
<text x="{:.2}" y="{:.2}" class="number" text-anchor="middle">{}</text>
<text x="{:.2}" y="{:.2}" class="label" text-anchor="middle">{}</text>
"##,
                x,
                y,
                self.marker_radius,
                class,
                x,
                y + 4.0,
                index + 1,
                x,
                y - self.marker_radius - 4.0,
                escape_xml(&waypoint.name)
            ));
        }

        svg.push_str("</svg>");

        svg
    }

    /// Map waypoints onto the canvas
    fn projection(&self, waypoints: &[Waypoint]) -> impl Fn(&Waypoint) -> (f64, f64) {
        let mut min_lat = f64::INFINITY;
        let mut max_lat = f64::NEG_INFINITY;
        let mut min_lng = f64::INFINITY;
        let mut max_lng = f64::NEG_INFINITY;
        for w in waypoints {
            min_lat = min_lat.min(w.lat);
            max_lat = max_lat.max(w.lat);
            min_lng = min_lng.min(w.lng);
            max_lng = max_lng.max(w.lng);
        }
        if waypoints.is_empty() {
            min_lat = 0.0;
            max_lat = 0.0;
            min_lng = 0.0;
            max_lng = 0.0;
        }

        let lng_factor = ((min_lat + max_lat) / 2.0).to_radians().cos().max(0.01);
        let span_x = ((max_lng - min_lng) * lng_factor).max(1e-9);
        let span_y = (max_lat - min_lat).max(1e-9);
        let scale = ((self.width - 2.0 * self.margin) / span_x).min((self.height - 2.0 * self.margin) / span_y);

        let margin = self.margin;
        let height = self.height;
        move |w: &Waypoint| {
            let x = margin + (w.lng - min_lng) * lng_factor * scale;
            let y = height - margin - (w.lat - min_lat) * scale;
            (x, y)
        }
    }

    /// Save SVG to file
    pub fn save_svg<P: AsRef<Path>>(&self, svg: &str, path: P) -> std::io::Result<()> {
        let mut file = File::create(path)?;
        file.write_all(svg.as_bytes())?;
        Ok(())
    }

    /// Save SVG as PNG using an external converter if available.
    /// Tries `rsvg-convert`, then `magick convert`, then `inkscape`.
    pub fn save_png<P: AsRef<Path>>(&self, svg: &str, path: P) -> std::io::Result<()> {
        let path = path.as_ref();
        let tmp_svg = path.with_extension("svg.tmp");
        self.save_svg(svg, &tmp_svg)?;

        let out = path.to_string_lossy().to_string();
        let input = tmp_svg.to_string_lossy().to_string();
        let attempts: [(&str, Vec<&str>); 3] = [
            ("rsvg-convert", vec!["-o", out.as_str(), input.as_str()]),
            ("magick", vec!["convert", input.as_str(), out.as_str()]),
            ("inkscape", vec![input.as_str(), "--export-type=png", "--export-filename", out.as_str()]),
        ];

        for (program, args) in attempts.iter() {
            if let Ok(status) = Command::new(program).args(args).status() {
                if status.success() {
                    let _ = std::fs::remove_file(&tmp_svg);
                    return Ok(());
                }
            }
            log::debug!("{} unavailable or failed", program);
        }

        let _ = std::fs::remove_file(&tmp_svg);
        Err(std::io::Error::new(
            std::io::ErrorKind::Other,
            "No SVG->PNG converter succeeded (tried rsvg-convert, magick, inkscape)",
        ))
    }

    /// Export data for external plotting
    pub fn export_plot_data(&self, plan: &RoutePlan) -> String {
        let mut data = String::new();

        data.push_str("# Route Plan Data\n");
        data.push_str(&format!("# Mode: {:?}\n", plan.mode));
        data.push_str(&format!("# Total: {:.4} km\n\n", plan.total_km()));

        data.push_str("# Stops: order, id, lat, lng, distance_to_next_km\n");
        let legs = plan.leg_distances();
        for (index, w) in plan.route().waypoints().iter().enumerate() {
            let next = legs.get(index).map(|d| format!("{:.4}", d)).unwrap_or_default();
            data.push_str(&format!("{},{},{},{},{}\n", index + 1, w.id, w.lat, w.lng, next));
        }

        data
    }
}

impl MapRenderer for SvgRenderer {
    fn render(&mut self, plan: &RoutePlan) -> Result<()> {
        let svg = self.generate_svg(plan);

        if let Some(path) = &self.output {
            self.save_svg(&svg, path)?;
            log::info!("route drawing saved to {:?}", path);

            if self.png {
                let png_path = path.with_extension("png");
                self.save_png(&svg, &png_path)?;
                log::info!("route drawing saved to {:?}", png_path);
            }
        }

        self.last_svg = Some(svg);
        Ok(())
    }

    fn clear(&mut self) {
        self.last_svg = None;
        if let Some(path) = &self.output {
            if path.exists() {
                if let Err(e) = std::fs::remove_file(path) {
                    log::warn!("could not remove {:?}: {}", path, e);
                }
            }
        }
    }
}

fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::{RouteAssembler, RouteRequest};
    use crate::error::RouteError;

    fn plan() -> RoutePlan {
        let waypoints = vec![
            Waypoint::new("A", "City Hall", 37.5665, 126.9780),
            Waypoint::new("B", "Seoul Station", 37.5600, 126.9700),
            Waypoint::new("C", "Kim's <Cafe> & Bar", 37.5700, 126.9850),
        ];
        RouteAssembler::default()
            .assemble(&RouteRequest::fixed(waypoints, "A", "C"))
            .unwrap()
    }

    #[test]
    fn test_svg_contents() {
        let svg = SvgRenderer::new().generate_svg(&plan());

        assert!(svg.starts_with("<?xml"));
        assert!(svg.ends_with("</svg>"));
        assert!(svg.contains("<polyline"));
        assert_eq!(svg.matches("<circle").count(), 3);
        assert_eq!(svg.matches("class=\"leg\"").count(), 2);
        assert!(svg.contains("Kim's &lt;Cafe&gt; &amp; Bar"));
    }

    #[test]
    fn test_markers_inside_canvas() {
        let renderer = SvgRenderer::new();
        let plan = plan();
        let project = renderer.projection(plan.route().waypoints());
        for w in plan.route().waypoints() {
            let (x, y) = project(w);
            assert!(x >= renderer.margin - 1e-6 && x <= renderer.width - renderer.margin + 1e-6);
            assert!(y >= renderer.margin - 1e-6 && y <= renderer.height - renderer.margin + 1e-6);
        }
    }

    #[test]
    fn test_render_and_clear() {
        let path = std::env::temp_dir().join(format!("waypoint-router-render-{}.svg", std::process::id()));
        let mut renderer = SvgRenderer::to_file(&path);

        renderer.render(&plan()).unwrap();
        assert!(path.exists());
        assert!(renderer.last_svg().is_some());

        renderer.clear();
        assert!(!path.exists());
        assert!(renderer.last_svg().is_none());
    }

    #[test]
    fn test_png_failure_is_io_error() {
        let dir = std::env::temp_dir().join(format!("waypoint-router-png-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        // The converter input is written next to the PNG; a directory in its
        // place makes the export fail regardless of installed tools.
        std::fs::create_dir_all(dir.join("route.svg.tmp")).unwrap();

        let mut renderer = SvgRenderer::to_file(dir.join("route.svg")).with_png(true);
        let err = renderer.render(&plan()).unwrap_err();
        assert!(matches!(err, RouteError::Io(_)), "got {:?}", err);
        assert!(dir.join("route.svg").exists());
    }

    #[test]
    fn test_plot_data() {
        let data = SvgRenderer::new().export_plot_data(&plan());
        assert!(data.contains("FixedEndpoints"));
        assert!(data.contains("1,A,37.5665,126.978,"));
        assert!(data.lines().last().unwrap().starts_with("3,C,"));
    }
}
