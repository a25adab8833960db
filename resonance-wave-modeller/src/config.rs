use crate::animation::{AnimationController, TimeSequence};
use crate::colour::Colormap;
use crate::domain::SpatialDomain;
use crate::session::{ResonanceParams, Session};
use crate::visualisation::{RenderStyle, WavefieldVisualiser};
use crate::waves::{ExternalWaveSet, WaveParams};
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::f64::consts::{PI, TAU};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

const AMPLITUDE_RANGE: (f64, f64) = (0.1, 2.0);
const WAVENUMBER_RANGE: (f64, f64) = (0.1, 5.0);
const FREQUENCY_RANGE: (f64, f64) = (0.1, 5.0);
const MAX_EXTERNAL_WAVES: usize = 10;
const FPS_RANGE: (f64, f64) = (1.0, 30.0);
const FRAME_DELAY_RANGE_MS: (u64, u64) = (50, 1000);

fn check_range(name: &str, value: f64, (lo, hi): (f64, f64)) -> Result<()> {
    if !(lo..=hi).contains(&value) {
        return Err(anyhow!("{} must be in [{}, {}], got {}", name, lo, hi, value));
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DomainKind {
    Line,
    Grid,
}

/// Spatial sampling
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainConfig {
    pub kind: DomainKind,
    /// Samples along x; also along y unless `points_y` is set.
    pub points: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points_y: Option<usize>,
    #[serde(default = "default_min")]
    pub min: f64,
    #[serde(default = "default_max")]
    pub max: f64,
}

fn default_min() -> f64 {
    -PI
}

fn default_max() -> f64 {
    PI
}

impl Default for DomainConfig {
    fn default() -> Self {
        Self {
            kind: DomainKind::Grid,
            points: 30,
            points_y: None,
            min: default_min(),
            max: default_max(),
        }
    }
}

impl DomainConfig {
    fn validate(&self) -> Result<()> {
        if self.points < 2 {
            return Err(anyhow!("Domain needs at least 2 points per axis, got {}", self.points));
        }
        if let Some(ny) = self.points_y {
            if ny < 2 {
                return Err(anyhow!("Domain needs at least 2 points along y, got {}", ny));
            }
        }
        if !(self.max > self.min) {
            return Err(anyhow!(
                "Domain bounds must satisfy min < max (min={}, max={})",
                self.min,
                self.max
            ));
        }
        Ok(())
    }

    pub fn build(&self) -> SpatialDomain {
        match self.kind {
            DomainKind::Line => SpatialDomain::linspace_line(self.points, self.min, self.max),
            DomainKind::Grid => {
                let ny = self.points_y.unwrap_or(self.points);
                SpatialDomain::linspace_grid(self.points, ny, self.min, self.max)
            }
        }
    }
}

/// Intrinsic wave. `l` is ignored on line domains.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntrinsicConfig {
    pub amplitude: f64,
    pub k: f64,
    #[serde(default)]
    pub l: f64,
    pub omega: f64,
}

impl Default for IntrinsicConfig {
    fn default() -> Self {
        Self {
            amplitude: 1.0,
            k: 2.0,
            l: 1.5,
            omega: 3.0,
        }
    }
}

impl IntrinsicConfig {
    fn validate(&self) -> Result<()> {
        check_range("Intrinsic amplitude", self.amplitude, AMPLITUDE_RANGE)?;
        check_range("Intrinsic k", self.k, WAVENUMBER_RANGE)?;
        if self.l != 0.0 {
            check_range("Intrinsic l", self.l, WAVENUMBER_RANGE)?;
        }
        check_range("Intrinsic omega", self.omega, FREQUENCY_RANGE)?;
        Ok(())
    }

    pub fn build(&self) -> WaveParams {
        WaveParams::intrinsic(self.amplitude, self.k, self.l, self.omega)
    }
}

/// One explicitly configured extrinsic wave
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalWaveConfig {
    pub amplitude: f64,
    pub k: f64,
    #[serde(default)]
    pub l: f64,
    pub omega: f64,
    #[serde(default)]
    pub phi: f64,
}

impl ExternalWaveConfig {
    fn validate(&self, idx: usize) -> Result<()> {
        check_range(&format!("External wave {} amplitude", idx), self.amplitude, AMPLITUDE_RANGE)?;
        check_range(&format!("External wave {} k", idx), self.k, WAVENUMBER_RANGE)?;
        if self.l != 0.0 {
            check_range(&format!("External wave {} l", idx), self.l, WAVENUMBER_RANGE)?;
        }
        check_range(&format!("External wave {} omega", idx), self.omega, FREQUENCY_RANGE)?;
        check_range(&format!("External wave {} phi", idx), self.phi, (0.0, TAU))?;
        Ok(())
    }

    fn build(&self) -> WaveParams {
        WaveParams::extrinsic(self.amplitude, self.k, self.l, self.omega, self.phi)
    }
}

/// Extrinsic waves: an explicit list, or `count` swept waves when the list
/// is empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalsConfig {
    #[serde(default = "default_external_count")]
    pub count: usize,
    #[serde(default)]
    pub waves: Vec<ExternalWaveConfig>,
}

fn default_external_count() -> usize {
    3
}

impl Default for ExternalsConfig {
    fn default() -> Self {
        Self {
            count: default_external_count(),
            waves: vec![ExternalWaveConfig {
                amplitude: 0.8,
                k: 2.5,
                l: 1.8,
                omega: 2.7,
                phi: PI / 4.0,
            }],
        }
    }
}

impl ExternalsConfig {
    fn validate(&self) -> Result<()> {
        if self.waves.is_empty() {
            if self.count == 0 || self.count > MAX_EXTERNAL_WAVES {
                return Err(anyhow!(
                    "External wave count must be in [1, {}], got {}",
                    MAX_EXTERNAL_WAVES,
                    self.count
                ));
            }
            return Ok(());
        }
        if self.waves.len() > MAX_EXTERNAL_WAVES {
            return Err(anyhow!(
                "At most {} external waves may be listed, got {}",
                MAX_EXTERNAL_WAVES,
                self.waves.len()
            ));
        }
        for (idx, wave) in self.waves.iter().enumerate() {
            wave.validate(idx)?;
        }
        Ok(())
    }

    pub fn build(&self) -> ExternalWaveSet {
        if self.waves.is_empty() {
            ExternalWaveSet::sweep(self.count)
        } else {
            ExternalWaveSet::new(self.waves.iter().map(ExternalWaveConfig::build).collect())
        }
    }
}

/// Frame loop settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnimationConfig {
    #[serde(default = "default_frames")]
    pub frames: usize,
    #[serde(default = "default_fps")]
    pub fps: f64,
    #[serde(default = "default_frame_delay_ms")]
    pub frame_delay_ms: u64,
}

fn default_frames() -> usize {
    40
}

fn default_fps() -> f64 {
    5.0
}

fn default_frame_delay_ms() -> u64 {
    200
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            frames: default_frames(),
            fps: default_fps(),
            frame_delay_ms: default_frame_delay_ms(),
        }
    }
}

impl AnimationConfig {
    fn validate(&self) -> Result<()> {
        if self.frames == 0 {
            return Err(anyhow!("frames must be positive, got {}", self.frames));
        }
        check_range("fps", self.fps, FPS_RANGE)?;
        let (lo, hi) = FRAME_DELAY_RANGE_MS;
        if !(lo..=hi).contains(&self.frame_delay_ms) {
            return Err(anyhow!(
                "frame_delay_ms must be in [{}, {}], got {}",
                lo,
                hi,
                self.frame_delay_ms
            ));
        }
        Ok(())
    }

    pub fn frame_delay(&self) -> Duration {
        Duration::from_millis(self.frame_delay_ms)
    }
}

/// Visualization configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisualizationConfig {
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    #[serde(default = "default_image_width")]
    pub image_width: u32,
    #[serde(default = "default_image_height")]
    pub image_height: u32,
    #[serde(default = "default_style")]
    pub style: RenderStyle,
    #[serde(default = "default_experience_colormap")]
    pub experience_colormap: Colormap,
    #[serde(default = "default_perception_colormap")]
    pub perception_colormap: Colormap,
}

fn default_output_dir() -> String {
    "output".to_string()
}

fn default_image_width() -> u32 {
    1400
}

fn default_image_height() -> u32 {
    700
}

fn default_style() -> RenderStyle {
    RenderStyle::Points
}

fn default_experience_colormap() -> Colormap {
    Colormap::Viridis
}

fn default_perception_colormap() -> Colormap {
    Colormap::Plasma
}

impl Default for VisualizationConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            image_width: default_image_width(),
            image_height: default_image_height(),
            style: default_style(),
            experience_colormap: default_experience_colormap(),
            perception_colormap: default_perception_colormap(),
        }
    }
}

impl VisualizationConfig {
    fn validate(&self) -> Result<()> {
        if self.image_width == 0 || self.image_height == 0 {
            return Err(anyhow!(
                "Image dimensions must be positive (width={}, height={})",
                self.image_width,
                self.image_height
            ));
        }
        if self.output_dir.is_empty() {
            return Err(anyhow!("output_dir must not be empty"));
        }
        Ok(())
    }
}

/// Ready-made configurations for the supported display variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Preset {
    /// 2-D grid, one extrinsic wave, one colored point per sample
    Scatter,
    /// 2-D grid drawn as row curves colored by their mean
    Lines,
    /// Row curves with filled area underneath
    Area,
    /// 1-D line with several swept extrinsic waves
    MultiWave,
}

/// Complete run configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub domain: DomainConfig,
    #[serde(default)]
    pub intrinsic: IntrinsicConfig,
    #[serde(default)]
    pub externals: ExternalsConfig,
    #[serde(default)]
    pub animation: AnimationConfig,
    #[serde(default)]
    pub visualization: VisualizationConfig,
}

impl Config {
    /// Load and validate configuration from TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let config = Self::read(path)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config = Self::parse(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML file without validating it, for callers that apply
    /// overrides first and call [`Config::validate`] themselves.
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| anyhow!("Failed to read config file '{}': {}", path.display(), e))?;
        Self::parse(&content)
    }

    fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| anyhow!("Failed to parse TOML config: {}", e))
    }

    pub fn preset(preset: Preset) -> Self {
        let mut config = Config::default();
        match preset {
            Preset::Scatter => {}
            Preset::Lines | Preset::Area => {
                config.visualization.style = if preset == Preset::Lines {
                    RenderStyle::Lines
                } else {
                    RenderStyle::Area
                };
                config.visualization.experience_colormap = Colormap::Cividis;
                config.visualization.perception_colormap = Colormap::Cool;
            }
            Preset::MultiWave => {
                config.domain = DomainConfig {
                    kind: DomainKind::Line,
                    points: 500,
                    ..DomainConfig::default()
                };
                config.intrinsic.l = 0.0;
                config.externals = ExternalsConfig {
                    count: 3,
                    waves: Vec::new(),
                };
                config.animation = AnimationConfig {
                    frames: 60,
                    fps: 10.0,
                    ..AnimationConfig::default()
                };
            }
        }
        config
    }

    /// Validate all configuration parameters
    pub fn validate(&self) -> Result<()> {
        self.domain.validate()?;
        self.intrinsic.validate()?;
        self.externals.validate()?;
        self.animation.validate()?;
        self.visualization.validate()?;

        if self.domain.kind == DomainKind::Line {
            if self.intrinsic.l != 0.0 || self.externals.waves.iter().any(|w| w.l != 0.0) {
                warn!("Line domain ignores the l wavenumber components");
            }
            if self.domain.points_y.is_some() {
                warn!("Line domain ignores points_y");
            }
        }

        Ok(())
    }

    pub fn build_params(&self) -> ResonanceParams {
        ResonanceParams {
            domain: self.domain.build(),
            intrinsic: self.intrinsic.build(),
            externals: self.externals.build(),
        }
    }

    pub fn time_sequence(&self) -> TimeSequence {
        TimeSequence::new(self.animation.frames)
    }

    pub fn build_session(&self) -> Session {
        let controller = AnimationController::new(self.time_sequence(), self.animation.fps);
        Session::new(self.build_params(), controller)
    }

    pub fn build_visualiser(&self) -> Result<WavefieldVisualiser> {
        let vis = &self.visualization;
        Ok(
            WavefieldVisualiser::new(&vis.output_dir, vis.image_width, vis.image_height)?
                .with_style(vis.style)
                .with_colormaps(vis.experience_colormap, vis.perception_colormap),
        )
    }

    /// Log configuration summary
    pub fn log_summary(&self) {
        info!("=== Resonance Configuration ===");
        let (ny, nx) = self.domain.build().dim();
        info!(
            "Domain: {:?} with {}x{} points on [{:.3}, {:.3}]",
            self.domain.kind, nx, ny, self.domain.min, self.domain.max
        );
        info!(
            "Intrinsic: A={}, k={}, l={}, omega={}",
            self.intrinsic.amplitude, self.intrinsic.k, self.intrinsic.l, self.intrinsic.omega
        );
        if self.externals.waves.is_empty() {
            info!("Externals: {} swept wave(s)", self.externals.count);
        } else {
            info!("Externals: {} wave(s)", self.externals.waves.len());
            for (i, w) in self.externals.waves.iter().enumerate() {
                info!(
                    "  External {}: A={}, k={}, l={}, omega={}, phi={:.3}",
                    i, w.amplitude, w.k, w.l, w.omega, w.phi
                );
            }
        }
        info!(
            "Animation: {} frames at {} FPS, sweep delay {} ms",
            self.animation.frames, self.animation.fps, self.animation.frame_delay_ms
        );
        info!(
            "Visualization: {}x{} {:?} ({} / {}) -> {}",
            self.visualization.image_width,
            self.visualization.image_height,
            self.visualization.style,
            self.visualization.experience_colormap,
            self.visualization.perception_colormap,
            self.visualization.output_dir
        );
        info!("===============================");
    }
}
