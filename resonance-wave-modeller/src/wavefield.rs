use crate::domain::SpatialDomain;
use crate::waves::{ExternalWaveSet, WaveParams};
use ndarray::{Array2, Zip};

/// Every field produced at one instant, co-indexed with the domain.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSnapshot {
    pub t: f64,
    pub intrinsic: Array2<f64>,
    pub externals: Vec<Array2<f64>>,
    // psi_i + psi_e + psi_i * psi_e
    pub resonant: Array2<f64>,
    pub experience: Array2<f64>,
    pub perception: Array2<f64>,
}

/// Min, max and mean of one field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

impl FieldStats {
    pub fn of(field: &Array2<f64>) -> Self {
        let min = field.iter().copied().fold(f64::INFINITY, f64::min);
        let max = field.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mean = field.mean().unwrap_or(0.0);
        FieldStats { min, max, mean }
    }
}

impl FieldSnapshot {
    pub fn experience_stats(&self) -> FieldStats {
        FieldStats::of(&self.experience)
    }

    pub fn perception_stats(&self) -> FieldStats {
        FieldStats::of(&self.perception)
    }

    /// Sum of all extrinsic waves.
    pub fn external_sum(&self) -> Array2<f64> {
        let mut sum = Array2::zeros(self.intrinsic.dim());
        for wave in &self.externals {
            sum += wave;
        }
        sum
    }
}

/// Evaluate the resonant field and its observables at time `t`.
///
/// The extrinsic waves are summed into `psi_e`, then combined with the
/// intrinsic wave as `psi_r = psi_i + psi_e + psi_i * psi_e`. Experience is
/// `psi_r^2`; perception is `|d psi_r / dt|` with the cross term
/// differentiated by the product rule. Nothing is cached between calls.
pub fn evaluate(
    domain: &SpatialDomain,
    t: f64,
    intrinsic: &WaveParams,
    externals: &ExternalWaveSet,
) -> FieldSnapshot {
    let (psi_i, dpsi_i) = intrinsic.sample(domain, t);

    let mut psi_e = Array2::<f64>::zeros(domain.dim());
    let mut dpsi_e = Array2::<f64>::zeros(domain.dim());
    let mut waves = Vec::with_capacity(externals.len());
    for wave in externals.iter() {
        let (psi, dpsi) = wave.sample(domain, t);
        psi_e += &psi;
        dpsi_e += &dpsi;
        waves.push(psi);
    }

    let resonant = Zip::from(&psi_i)
        .and(&psi_e)
        .map_collect(|&i, &e| i + e + i * e);

    let experience = resonant.mapv(|r| r * r);

    let perception = Zip::from(&psi_i)
        .and(&dpsi_i)
        .and(&psi_e)
        .and(&dpsi_e)
        .map_collect(|&i, &di, &e, &de| (di + de + di * e + de * i).abs());

    FieldSnapshot {
        t,
        intrinsic: psi_i,
        externals: waves,
        resonant,
        experience,
        perception,
    }
}
