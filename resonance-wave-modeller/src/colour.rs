use anyhow::{anyhow, Result};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Perceptual color scales available to the renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Colormap {
    Viridis,
    Plasma,
    Cividis,
    Cool,
    RdYlBu,
}

impl Colormap {
    pub const ALL: [Colormap; 5] = [
        Colormap::Viridis,
        Colormap::Plasma,
        Colormap::Cividis,
        Colormap::Cool,
        Colormap::RdYlBu,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Colormap::Viridis => "viridis",
            Colormap::Plasma => "plasma",
            Colormap::Cividis => "cividis",
            Colormap::Cool => "cool",
            Colormap::RdYlBu => "rd_yl_bu",
        }
    }

    pub fn gradient(self) -> Box<dyn colorgrad::Gradient> {
        match self {
            Colormap::Viridis => Box::new(colorgrad::preset::viridis()),
            Colormap::Plasma => Box::new(colorgrad::preset::plasma()),
            Colormap::Cividis => Box::new(colorgrad::preset::cividis()),
            Colormap::Cool => Box::new(colorgrad::preset::cool()),
            Colormap::RdYlBu => Box::new(colorgrad::preset::rd_yl_bu()),
        }
    }
}

impl fmt::Display for Colormap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Colormap {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Colormap::ALL
            .into_iter()
            .find(|c| c.name() == s)
            .ok_or_else(|| {
                anyhow!(
                    "Unknown colormap '{}'. Must be one of: {:?}",
                    s,
                    Colormap::ALL.map(Colormap::name)
                )
            })
    }
}

/// 8-bit RGB triple, displayed as `rgb(r, g, b)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgb({}, {}, {})", self.0, self.1, self.2)
    }
}

/// Value range used to map a collection linearly onto `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

impl ValueRange {
    pub fn of<'a, I>(values: I) -> Self
    where
        I: IntoIterator<Item = &'a f64>,
    {
        let (min, max) = values
            .into_iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });
        ValueRange { min, max }
    }

    pub fn is_degenerate(&self) -> bool {
        !(self.max > self.min)
    }

    /// Linear position of `value` in the range. A flat range maps to 0.5.
    pub fn normalize(&self, value: f64) -> f64 {
        if self.is_degenerate() {
            return 0.5;
        }
        ((value - self.min) / (self.max - self.min)).clamp(0.0, 1.0)
    }
}

/// Normalize every value against the collection's own min and max.
pub fn normalize<'a, I>(values: I) -> Vec<f64>
where
    I: IntoIterator<Item = &'a f64> + Copy,
{
    let range = ValueRange::of(values);
    values.into_iter().map(|&v| range.normalize(v)).collect()
}

/// One normalized value per row: the row mean placed in the range of the
/// whole field.
pub fn normalize_rows(field: &Array2<f64>) -> Vec<f64> {
    let range = ValueRange::of(field);
    field
        .rows()
        .into_iter()
        .map(|row| range.normalize(row.mean().unwrap_or(0.0)))
        .collect()
}

pub struct ColorScale {
    colormap: Colormap,
    gradient: Box<dyn colorgrad::Gradient>,
}

impl ColorScale {
    pub fn new(colormap: Colormap) -> Self {
        Self {
            colormap,
            gradient: colormap.gradient(),
        }
    }

    pub fn colormap(&self) -> Colormap {
        self.colormap
    }

    /// Color at normalized position `n` in `[0, 1]`.
    pub fn rgb(&self, n: f64) -> Rgb {
        let [r, g, b, _] = self.gradient.at(n.clamp(0.0, 1.0) as f32).to_rgba8();
        Rgb(r, g, b)
    }

    pub fn value_colors<'a, I>(&self, values: I) -> Vec<Rgb>
    where
        I: IntoIterator<Item = &'a f64> + Copy,
    {
        normalize(values).into_iter().map(|n| self.rgb(n)).collect()
    }

    pub fn row_colors(&self, field: &Array2<f64>) -> Vec<Rgb> {
        normalize_rows(field).into_iter().map(|n| self.rgb(n)).collect()
    }
}

/// Color strings for each value of a collection.
pub fn colors_for_values<'a, I>(values: I, colormap: Colormap) -> Vec<String>
where
    I: IntoIterator<Item = &'a f64> + Copy,
{
    ColorScale::new(colormap)
        .value_colors(values)
        .iter()
        .map(Rgb::to_string)
        .collect()
}

/// Color strings for each row of a grid, colored by the row mean.
pub fn colors_for_rows(field: &Array2<f64>, colormap: Colormap) -> Vec<String> {
    ColorScale::new(colormap)
        .row_colors(field)
        .iter()
        .map(Rgb::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn values_map_linearly_onto_unit_interval() {
        let values = [2.0, 4.0, 3.0, 6.0];
        let n = normalize(&values);
        assert_eq!(n, vec![0.0, 0.5, 0.25, 1.0]);
    }

    #[test]
    fn flat_field_falls_back_to_midpoint() {
        let values = [0.0; 8];
        assert!(ValueRange::of(&values).is_degenerate());
        assert!(normalize(&values).iter().all(|&n| n == 0.5));
    }

    #[test]
    fn empty_collection_is_degenerate() {
        let values: [f64; 0] = [];
        assert!(ValueRange::of(&values).is_degenerate());
        assert!(normalize(&values).is_empty());
    }

    #[test]
    fn rows_use_whole_field_range() {
        let field = Array2::from_shape_vec((3, 2), vec![0.0, 2.0, 4.0, 4.0, 8.0, 6.0]).unwrap();
        let n = normalize_rows(&field);
        assert_eq!(n.len(), 3);
        assert_relative_eq!(n[0], 1.0 / 8.0);
        assert_relative_eq!(n[1], 0.5);
        assert_relative_eq!(n[2], 7.0 / 8.0);
    }

    #[test]
    fn colors_are_rgb_strings() {
        let values = [0.0, 1.0, 0.5];
        let colors = colors_for_values(&values, Colormap::Viridis);
        assert_eq!(colors.len(), 3);
        for c in &colors {
            assert!(c.starts_with("rgb(") && c.ends_with(')'), "{}", c);
            assert_eq!(c.matches(", ").count(), 2);
        }
        assert_ne!(colors[0], colors[1]);
    }

    #[test]
    fn row_colors_have_one_entry_per_row() {
        let field = Array2::from_shape_fn((4, 7), |(r, c)| (r * c) as f64);
        assert_eq!(colors_for_rows(&field, Colormap::Cool).len(), 4);
    }

    #[test]
    fn colormap_names_round_trip() {
        for cmap in Colormap::ALL {
            assert_eq!(cmap.name().parse::<Colormap>().unwrap(), cmap);
        }
        assert!("jet".parse::<Colormap>().is_err());
    }

    #[test]
    fn rgb_display_format() {
        assert_eq!(Rgb(68, 1, 84).to_string(), "rgb(68, 1, 84)");
    }
}
