use crate::domain::SpatialDomain;
use ndarray::{Array2, Zip};
use std::f64::consts::PI;

/// A sinusoidal travelling wave `A sin(k x + l y - omega t + phi)`.
///
/// `l` only contributes on grid domains. The intrinsic wave always has
/// `phi = 0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaveParams {
    pub amplitude: f64,
    pub k: f64,
    pub l: f64,
    pub omega: f64,
    pub phi: f64,
}

impl WaveParams {
    pub fn intrinsic(amplitude: f64, k: f64, l: f64, omega: f64) -> Self {
        WaveParams {
            amplitude,
            k,
            l,
            omega,
            phi: 0.0,
        }
    }

    pub fn extrinsic(amplitude: f64, k: f64, l: f64, omega: f64, phi: f64) -> Self {
        WaveParams {
            amplitude,
            k,
            l,
            omega,
            phi,
        }
    }

    pub fn phase(&self, x: f64, y: Option<f64>, t: f64) -> f64 {
        let spatial = match y {
            Some(y) => self.k * x + self.l * y,
            None => self.k * x,
        };
        spatial - self.omega * t + self.phi
    }

    pub fn value(&self, x: f64, y: Option<f64>, t: f64) -> f64 {
        self.amplitude * self.phase(x, y, t).sin()
    }

    /// Analytic time derivative `-A omega cos(phase)`.
    pub fn rate(&self, x: f64, y: Option<f64>, t: f64) -> f64 {
        -self.amplitude * self.omega * self.phase(x, y, t).cos()
    }

    /// Wave values and their time derivative over the whole domain.
    pub fn sample(&self, domain: &SpatialDomain, t: f64) -> (Array2<f64>, Array2<f64>) {
        let phase = self.phase_field(domain, t);
        let psi = phase.mapv(|p| self.amplitude * p.sin());
        let dpsi_dt = phase.mapv(|p| -self.amplitude * self.omega * p.cos());
        (psi, dpsi_dt)
    }

    fn phase_field(&self, domain: &SpatialDomain, t: f64) -> Array2<f64> {
        match &domain.y {
            Some(y) => Zip::from(&domain.x)
                .and(y)
                .map_collect(|&x, &y| self.phase(x, Some(y), t)),
            None => domain.x.mapv(|x| self.phase(x, None, t)),
        }
    }
}

/// Ordered, non-empty set of extrinsic waves.
#[derive(Debug, Clone, PartialEq)]
pub struct ExternalWaveSet {
    waves: Vec<WaveParams>,
}

impl ExternalWaveSet {
    pub fn new(waves: Vec<WaveParams>) -> Self {
        assert!(!waves.is_empty(), "at least one extrinsic wave is required");
        ExternalWaveSet { waves }
    }

    pub fn single(wave: WaveParams) -> Self {
        Self::new(vec![wave])
    }

    /// Deterministic set of `n` waves with parameters swept evenly across
    /// fixed ranges. Sweeps include both endpoints; `n = 1` takes the start
    /// of every range. Swept waves travel along x only (`l = 0`).
    pub fn sweep(n: usize) -> Self {
        assert!(n > 0, "at least one extrinsic wave is required");
        let waves = (0..n)
            .map(|j| {
                WaveParams::extrinsic(
                    sweep_value(0.5, 1.0, n, j),
                    sweep_value(1.5, 3.0, n, j),
                    0.0,
                    sweep_value(2.0, 4.0, n, j),
                    sweep_value(0.0, PI, n, j),
                )
            })
            .collect();
        ExternalWaveSet { waves }
    }

    pub fn len(&self) -> usize {
        self.waves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waves.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &WaveParams> {
        self.waves.iter()
    }

    pub fn as_slice(&self) -> &[WaveParams] {
        &self.waves
    }
}

fn sweep_value(start: f64, end: f64, n: usize, j: usize) -> f64 {
    if n == 1 {
        start
    } else {
        start + (end - start) * j as f64 / (n - 1) as f64
    }
}
