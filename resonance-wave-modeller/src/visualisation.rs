use crate::colour::{ColorScale, Colormap, Rgb};
use crate::domain::SpatialDomain;
use crate::session::{Frame, FrameSink};
use anyhow::{anyhow, Result};
use ndarray::Array2;
use plotters::coord::Shift;
use plotters::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

type DrawResult = std::result::Result<(), Box<dyn std::error::Error>>;

const ORANGE: RGBColor = RGBColor(255, 165, 0);

/// How grid fields are drawn. Line domains always use the wave layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderStyle {
    /// One cell per sample, colored by its own value.
    Points,
    /// One curve per grid row, colored by the row mean.
    Lines,
    /// Row curves with the area down to zero filled.
    Area,
}

pub struct WavefieldVisualiser {
    output_dir: String,
    width: u32,
    height: u32,
    style: RenderStyle,
    experience_colormap: Colormap,
    perception_colormap: Colormap,
}

impl WavefieldVisualiser {
    pub fn new(output_dir: &str, width: u32, height: u32) -> Result<Self> {
        std::fs::create_dir_all(output_dir)
            .map_err(|e| anyhow!("Failed to create output directory '{}': {}", output_dir, e))?;

        Ok(Self {
            output_dir: output_dir.to_string(),
            width,
            height,
            style: RenderStyle::Points,
            experience_colormap: Colormap::Viridis,
            perception_colormap: Colormap::Plasma,
        })
    }

    pub fn with_style(mut self, style: RenderStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_colormaps(mut self, experience: Colormap, perception: Colormap) -> Self {
        self.experience_colormap = experience;
        self.perception_colormap = perception;
        self
    }

    pub fn frame_path(&self, index: usize) -> String {
        format!("{}/frame_{:06}.png", self.output_dir, index)
    }

    /// Draw one frame to `frame_<index>.png`.
    pub fn render(&self, frame: &Frame<'_>) -> Result<()> {
        let filename = self.frame_path(frame.index);
        self.draw(frame, &filename)
            .map_err(|e| anyhow!("Failed to render frame {}: {}", frame.index, e))?;
        debug!("Saved frame: {}", filename);
        Ok(())
    }

    fn draw(&self, frame: &Frame<'_>, filename: &str) -> DrawResult {
        let root = BitMapBackend::new(filename, (self.width, self.height)).into_drawing_area();
        root.fill(&WHITE)?;
        let (left, right) = root.split_horizontally(self.width / 2);

        let snap = frame.snapshot;
        if frame.domain.is_grid() {
            let exp_title = format!("Experience psi_r^2 at t={:.2}", snap.t);
            let per_title = format!("Perception |dpsi_r/dt| at t={:.2}", snap.t);
            self.plot_grid_field(&left, frame.domain, &snap.experience, &exp_title, self.experience_colormap)?;
            self.plot_grid_field(&right, frame.domain, &snap.perception, &per_title, self.perception_colormap)?;
        } else {
            self.plot_experience_waves(&left, frame)?;
            self.plot_perception_wave(&right, frame)?;
        }

        root.present()?;
        Ok(())
    }

    fn plot_experience_waves(&self, area: &DrawingArea<BitMapBackend, Shift>, frame: &Frame<'_>) -> DrawResult {
        let snap = frame.snapshot;
        let xs = frame.domain.x_axis();
        let (x_min, x_max) = frame.domain.x_extent();

        let exp_min = min_of(&snap.experience).min(min_of(&snap.intrinsic));
        let (y_lo, y_hi) = padded_range(exp_min * 1.2, max_of(&snap.experience) * 1.2);

        let title = format!("Experience Waves at t={:.2}", snap.t);
        let mut chart = ChartBuilder::on(area)
            .caption(&title, ("sans-serif", 24))
            .margin(10)
            .x_label_area_size(30)
            .y_label_area_size(50)
            .build_cartesian_2d(x_min..x_max, y_lo..y_hi)?;
        chart.configure_mesh().x_desc("x").y_desc("amplitude").draw()?;

        let row = |field: &Array2<f64>| -> Vec<(f64, f64)> {
            xs.iter().zip(field.row(0).iter()).map(|(&x, &v)| (x, v)).collect()
        };

        chart
            .draw_series(LineSeries::new(row(&snap.intrinsic), CYAN.stroke_width(2)))?
            .label("Intrinsic Wave")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], CYAN));

        for (idx, wave) in snap.externals.iter().enumerate() {
            let series = chart.draw_series(LineSeries::new(row(wave), MAGENTA.mix(0.5).stroke_width(1)))?;
            if idx == 0 {
                series
                    .label("External Waves")
                    .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], MAGENTA.mix(0.5)));
            }
        }

        chart
            .draw_series(LineSeries::new(row(&snap.experience), BLUE.stroke_width(2)))?
            .label("Resonance Wave")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLUE));

        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;
        Ok(())
    }

    fn plot_perception_wave(&self, area: &DrawingArea<BitMapBackend, Shift>, frame: &Frame<'_>) -> DrawResult {
        let snap = frame.snapshot;
        let (x_min, x_max) = frame.domain.x_extent();
        let (y_lo, y_hi) = padded_range(0.0, max_of(&snap.perception) * 1.1);

        let title = format!("Perception Wavefunction at t={:.2}", snap.t);
        let mut chart = ChartBuilder::on(area)
            .caption(&title, ("sans-serif", 24))
            .margin(10)
            .x_label_area_size(30)
            .y_label_area_size(50)
            .build_cartesian_2d(x_min..x_max, y_lo..y_hi)?;
        chart.configure_mesh().x_desc("x").y_desc("|dpsi_r/dt|").draw()?;

        let points: Vec<(f64, f64)> = frame
            .domain
            .x_axis()
            .iter()
            .zip(snap.perception.row(0).iter())
            .map(|(&x, &v)| (x, v))
            .collect();
        chart.draw_series(LineSeries::new(points, ORANGE.stroke_width(2)))?;
        Ok(())
    }

    fn plot_grid_field(
        &self,
        area: &DrawingArea<BitMapBackend, Shift>,
        domain: &SpatialDomain,
        field: &Array2<f64>,
        title: &str,
        colormap: Colormap,
    ) -> DrawResult {
        let scale = ColorScale::new(colormap);
        match self.style {
            RenderStyle::Points => self.plot_cells(area, field, title, &scale),
            RenderStyle::Lines | RenderStyle::Area => self.plot_rows(area, domain, field, title, &scale),
        }
    }

    fn plot_cells(
        &self,
        area: &DrawingArea<BitMapBackend, Shift>,
        field: &Array2<f64>,
        title: &str,
        scale: &ColorScale,
    ) -> DrawResult {
        let (ny, nx) = field.dim();
        let mut chart = ChartBuilder::on(area)
            .caption(title, ("sans-serif", 24))
            .margin(10)
            .x_label_area_size(30)
            .y_label_area_size(40)
            .build_cartesian_2d(0..nx, 0..ny)?;
        chart
            .configure_mesh()
            .x_desc("X (grid points)")
            .y_desc("Y (grid points)")
            .draw()?;

        // Row-major, same order as field.iter()
        let colors = scale.value_colors(field);
        chart.draw_series(field.indexed_iter().zip(colors).map(|(((r, c), _), color)| {
            Rectangle::new([(c, r), (c + 1, r + 1)], to_plotters(color).filled())
        }))?;
        Ok(())
    }

    fn plot_rows(
        &self,
        area: &DrawingArea<BitMapBackend, Shift>,
        domain: &SpatialDomain,
        field: &Array2<f64>,
        title: &str,
        scale: &ColorScale,
    ) -> DrawResult {
        let (x_min, x_max) = domain.x_extent();
        let (y_lo, y_hi) = padded_range(min_of(field).min(0.0), max_of(field) * 1.1);
        let mut chart = ChartBuilder::on(area)
            .caption(title, ("sans-serif", 24))
            .margin(10)
            .x_label_area_size(30)
            .y_label_area_size(50)
            .build_cartesian_2d(x_min..x_max, y_lo..y_hi)?;
        chart.configure_mesh().x_desc("x").y_desc("value").draw()?;

        let xs = domain.x_axis();
        for (row, color) in field.rows().into_iter().zip(scale.row_colors(field)) {
            let color = to_plotters(color);
            let points: Vec<(f64, f64)> = xs.iter().zip(row.iter()).map(|(&x, &v)| (x, v)).collect();
            match self.style {
                RenderStyle::Area => {
                    chart.draw_series(
                        AreaSeries::new(points, 0.0, color.mix(0.4)).border_style(color.stroke_width(2)),
                    )?;
                }
                _ => {
                    chart.draw_series(LineSeries::new(points, color.stroke_width(2)))?;
                }
            }
        }
        Ok(())
    }
}

impl FrameSink for WavefieldVisualiser {
    fn present(&mut self, frame: &Frame<'_>) -> Result<()> {
        self.render(frame)
    }
}

fn to_plotters(color: Rgb) -> RGBColor {
    RGBColor(color.0, color.1, color.2)
}

fn min_of(field: &Array2<f64>) -> f64 {
    field.iter().copied().fold(f64::INFINITY, f64::min)
}

fn max_of(field: &Array2<f64>) -> f64 {
    field.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}

/// Axis range that is never empty, even for a flat field.
fn padded_range(lo: f64, hi: f64) -> (f64, f64) {
    if hi > lo {
        (lo, hi)
    } else {
        (lo - 1.0, lo + 1.0)
    }
}
