use crate::error::{JoyplotError, JoyplotResult};

/// Centre of the envelope as a fraction of line width.
pub const ENVELOPE_MEAN: f64 = 0.5;

/// Gaussian bump `peak * e^(-(x - mean)^2 / (2 * std_dev^2))`.
///
/// NaN `mean`, `std_dev` or `peak` fall back to `0.0`, `1.0` and `1.0`. `x` is
/// used as given. [`crate::Params::validate`] keeps NaN away from here, so the
/// fallback only matters to direct callers.
pub fn gaussian(mean: f64, std_dev: f64, peak: f64, x: f64) -> f64 {
    let mean = default_if_nan(mean, 0.0);
    let std_dev = default_if_nan(std_dev, 1.0);
    let peak = default_if_nan(peak, 1.0);

    let d = x - mean;
    peak * (-(d * d) / (2.0 * std_dev * std_dev)).exp()
}

fn default_if_nan(v: f64, fallback: f64) -> f64 {
    if v.is_nan() { fallback } else { v }
}

/// Per-sample weights that lift peaks toward the horizontal centre of each line.
///
/// Sample `i` sits at fractional position `i / len` and column
/// `i * sampling_resolution`. Peak weight is 1; overall strength is applied by
/// the mapper.
#[derive(Clone, Debug, PartialEq)]
pub struct Envelope {
    weights: Vec<f64>,
    frame_width: u32,
    sampling_resolution: u32,
    curve_deviation: f64,
}

impl Envelope {
    pub fn compute(
        frame_width: u32,
        sampling_resolution: u32,
        curve_deviation: f64,
    ) -> JoyplotResult<Self> {
        if sampling_resolution == 0 {
            return Err(JoyplotError::validation(
                "envelope sampling_resolution must be >= 1",
            ));
        }

        let n = (frame_width / sampling_resolution) as usize;
        let step = if n == 0 { 0.0 } else { 1.0 / n as f64 };
        let weights = (0..n)
            .map(|i| gaussian(ENVELOPE_MEAN, curve_deviation, 1.0, step * i as f64))
            .collect();

        Ok(Self {
            weights,
            frame_width,
            sampling_resolution,
            curve_deviation,
        })
    }

    /// Weight at sample `index`; indices past the end reuse the last weight.
    pub fn weight(&self, index: usize) -> f64 {
        match self.weights.last() {
            None => 0.0,
            Some(&last) => self.weights.get(index).copied().unwrap_or(last),
        }
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// True when this envelope was computed for exactly these inputs.
    pub fn matches(&self, frame_width: u32, sampling_resolution: u32, curve_deviation: f64) -> bool {
        self.frame_width == frame_width
            && self.sampling_resolution == sampling_resolution
            && self.curve_deviation.to_bits() == curve_deviation.to_bits()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gaussian_peaks_at_mean() {
        assert_eq!(gaussian(0.5, 0.15, 1.0, 0.5), 1.0);
        assert_eq!(gaussian(0.0, 1.0, 3.0, 0.0), 3.0);
        assert!(gaussian(0.5, 0.15, 1.0, 0.2) < gaussian(0.5, 0.15, 1.0, 0.4));
    }

    #[test]
    fn gaussian_substitutes_defaults_for_nan_parameters() {
        let x = 0.7;
        assert_eq!(gaussian(f64::NAN, 1.0, 1.0, x), gaussian(0.0, 1.0, 1.0, x));
        assert_eq!(gaussian(0.5, f64::NAN, 1.0, x), gaussian(0.5, 1.0, 1.0, x));
        assert_eq!(gaussian(0.5, 0.2, f64::NAN, x), gaussian(0.5, 0.2, 1.0, x));
        assert!(gaussian(0.5, 0.2, 1.0, f64::NAN).is_nan());
    }

    #[test]
    fn reference_envelope_480_by_2() {
        let env = Envelope::compute(480, 2, 0.15).unwrap();
        assert_eq!(env.len(), 240);
        assert!((env.weight(120) - 1.0).abs() < 1e-12);
        let edge = (-(0.5f64 * 0.5) / (2.0 * 0.15 * 0.15)).exp();
        assert!((env.weight(0) - edge).abs() < 1e-12);
        assert!((env.weight(0) - 0.0038).abs() < 1e-4);
    }

    #[test]
    fn length_is_floor_of_width_over_resolution() {
        for (w, r) in [(480u32, 1u32), (480, 7), (641, 3), (5, 50), (1, 1)] {
            let env = Envelope::compute(w, r, 0.1).unwrap();
            assert_eq!(env.len(), (w / r) as usize, "w={w} r={r}");
        }
    }

    #[test]
    fn values_are_bounded_symmetric_and_centre_peaked() {
        for (w, r, d) in [(480u32, 2u32, 0.15), (640, 4, 0.05), (320, 1, 0.25)] {
            let env = Envelope::compute(w, r, d).unwrap();
            let n = env.len();
            let w8 = env.weights();
            assert!(w8.iter().all(|&v| v > 0.0 && v <= 1.0));

            let max_i = (0..n)
                .max_by(|&a, &b| w8[a].total_cmp(&w8[b]))
                .unwrap();
            assert_eq!(max_i, n / 2);

            for i in 1..n {
                assert!((w8[i] - w8[n - i]).abs() < 1e-9, "asymmetry at {i}");
            }
        }
    }

    #[test]
    fn out_of_range_lookups_reuse_last_weight() {
        let env = Envelope::compute(10, 2, 0.15).unwrap();
        assert_eq!(env.weight(99), env.weight(env.len() - 1));
        let empty = Envelope::compute(1, 2, 0.15).unwrap();
        assert!(empty.is_empty());
        assert_eq!(empty.weight(0), 0.0);
    }

    #[test]
    fn zero_resolution_is_rejected() {
        assert!(Envelope::compute(480, 0, 0.15).is_err());
    }

    #[test]
    fn matches_tracks_inputs() {
        let env = Envelope::compute(480, 2, 0.15).unwrap();
        assert!(env.matches(480, 2, 0.15));
        assert!(!env.matches(640, 2, 0.15));
        assert!(!env.matches(480, 3, 0.15));
        assert!(!env.matches(480, 2, 0.2));
    }
}
