//! Laplace noise for published counts.
//!
//! The noise draw is deliberately not reproducible: reusing a draw for
//! repeated queries on the same cell would let the noise be averaged away.
//! The RNG is injected so tests can use a seeded generator and check
//! distributional properties; production uses [`LaplaceNoiser::from_entropy`].

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::DisclosureConfig;
use crate::error::Error;
use crate::types::{Result, DEFAULT_EPSILON, DEFAULT_SENSITIVITY};

/// Name of the only mechanism this module implements
pub const MECHANISM: &str = "Laplace";

/// Parameters of the Laplace mechanism
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoiseParams {
    epsilon: f64,
    sensitivity: f64,
}

impl NoiseParams {
    pub fn new(epsilon: f64, sensitivity: f64) -> Result<Self> {
        if !epsilon.is_finite() || epsilon <= 0.0 {
            return Err(Error::InvalidInput(format!(
                "epsilon must be positive and finite, got {}",
                epsilon
            )));
        }
        if !sensitivity.is_finite() || sensitivity <= 0.0 {
            return Err(Error::InvalidInput(format!(
                "sensitivity must be positive and finite, got {}",
                sensitivity
            )));
        }
        Ok(Self {
            epsilon,
            sensitivity,
        })
    }

    pub fn from_config(config: &DisclosureConfig) -> Result<Self> {
        Self::new(config.epsilon, config.sensitivity)
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn sensitivity(&self) -> f64 {
        self.sensitivity
    }

    /// Laplace scale b = sensitivity / epsilon
    pub fn scale(&self) -> f64 {
        self.sensitivity / self.epsilon
    }
}

impl Default for NoiseParams {
    fn default() -> Self {
        Self {
            epsilon: DEFAULT_EPSILON,
            sensitivity: DEFAULT_SENSITIVITY,
        }
    }
}

/// Inverse-CDF Laplace sample for `u` in (-0.5, 0.5)
pub(crate) fn laplace_from_uniform(u: f64, scale: f64) -> f64 {
    debug_assert!(u > -0.5 && u < 0.5, "uniform draw {} outside (-0.5, 0.5)", u);
    -scale * u.signum() * (1.0 - 2.0 * u.abs()).ln()
}

/// Adds calibrated Laplace noise to counts that cleared suppression
#[derive(Debug)]
pub struct LaplaceNoiser<R: Rng> {
    params: NoiseParams,
    rng: R,
}

impl LaplaceNoiser<StdRng> {
    /// Production noiser seeded from the operating system
    pub fn from_entropy(params: NoiseParams) -> Self {
        Self::new(params, StdRng::from_entropy())
    }
}

impl<R: Rng> LaplaceNoiser<R> {
    pub fn new(params: NoiseParams, rng: R) -> Self {
        Self { params, rng }
    }

    pub fn params(&self) -> &NoiseParams {
        &self.params
    }

    /// One Laplace draw at the configured scale
    pub fn sample(&mut self) -> f64 {
        let u = loop {
            let u: f64 = self.rng.gen_range(-0.5..0.5);
            // u = -0.5 would take ln(0)
            if u > -0.5 {
                break u;
            }
        };
        laplace_from_uniform(u, self.params.scale())
    }

    /// Noisy count, clamped at zero
    pub fn add_noise(&mut self, count: u64) -> f64 {
        (count as f64 + self.sample()).max(0.0)
    }

    /// Disclosure text for the parameters this noiser actually uses
    pub fn methodology_text(&self) -> String {
        methodology_text(&self.params)
    }
}

/// Outcome of [`sanity_check`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SanityCheck {
    pub is_valid: bool,
    pub deviation: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// Flag noise far beyond what the mechanism plausibly produces.
///
/// This is an operational guard for pipeline bugs, not a privacy check; a
/// failed check is logged and never blocks publication.
pub fn sanity_check(true_count: u64, noisy_count: f64, epsilon: f64, max_deviation: f64) -> SanityCheck {
    let deviation = (noisy_count - true_count as f64).abs();
    let bound = max_deviation / epsilon;

    if deviation.is_finite() && deviation <= bound {
        return SanityCheck {
            is_valid: true,
            deviation,
            warning: None,
        };
    }

    let message = format!(
        "Noise deviation {:.2} exceeds expected bound {:.2} (epsilon = {})",
        deviation, bound, epsilon
    );
    warn!(true_count, noisy_count, epsilon, deviation, bound, "noise sanity check failed");
    SanityCheck {
        is_valid: false,
        deviation,
        warning: Some(message),
    }
}

/// Public description of the noise mechanism for the given parameters
pub fn methodology_text(params: &NoiseParams) -> String {
    format!(
        "Published counts include random noise from the {} mechanism \
         (epsilon = {}, sensitivity = {}, noise scale = {}). \
         Noisy counts below zero are reported as zero; this clamp is a \
         post-processing step that biases very small counts upward and is \
         not part of the unbiased textbook mechanism.",
        MECHANISM,
        params.epsilon(),
        params.sensitivity(),
        params.scale()
    )
}
