//! Distribution primitives
//!
//! Closed-form approximations chosen for reproducibility over a numerics
//! dependency:
//!
//! - Normal CDF: Abramowitz & Stegun 26.2.17 (|error| < 7.5e-8)
//! - Normal quantile: Beasley-Springer-Moro
//! - Chi-square CDF: regularized lower incomplete gamma for df <= 30,
//!   Wilson-Hilferty cube-root normal approximation above
//! - Beta posterior: conjugate Beta-Binomial with a flat Beta(1, 1) prior
//!
//! Student-t is deliberately not here: the frequentist analyzer uses the
//! normal as its large-sample stand-in, which understates p-values when a
//! variant has fewer than ~30 units.

use rand::Rng;
use rand_distr::{Beta, Distribution};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

const INV_NORM_A: [f64; 4] = [
    2.506_628_238_84,
    -18.615_000_625_29,
    41.391_197_735_34,
    -25.441_060_496_37,
];
const INV_NORM_B: [f64; 4] = [
    -8.473_510_930_9,
    23.083_367_437_43,
    -21.062_241_018_26,
    3.130_829_098_33,
];
const INV_NORM_C: [f64; 9] = [
    0.337_475_482_272_614_7,
    0.976_169_019_091_718_6,
    0.160_797_971_491_820_9,
    0.027_643_881_033_386_3,
    0.003_840_572_937_360_9,
    0.000_395_189_651_191_9,
    0.000_032_176_788_176_8,
    0.000_000_288_816_736_4,
    0.000_000_396_031_518_7,
];

const LANCZOS_G: f64 = 7.0;
const LANCZOS: [f64; 9] = [
    0.999_999_999_999_809_9,
    676.520_368_121_885_1,
    -1_259.139_216_722_402_8,
    771.323_428_777_653_1,
    -176.615_029_162_140_6,
    12.507_343_278_686_905,
    -0.138_571_095_265_720_1,
    9.984_369_578_019_572e-6,
    1.505_632_735_149_311_6e-7,
];

const GAMMA_MAX_ITER: usize = 500;
const GAMMA_EPS: f64 = 1e-14;
const GAMMA_FPMIN: f64 = 1e-300;

/// Wilson-Hilferty takes over above this many degrees of freedom.
pub const CHI_SQUARE_NORMAL_APPROX_DF: f64 = 30.0;

/// Standard normal cumulative distribution function.
#[must_use]
pub fn normal_cdf(z: f64) -> f64 {
    if z.is_nan() {
        return f64::NAN;
    }
    let t = 1.0 / (1.0 + 0.231_641_9 * z.abs());
    let d = 0.398_942_280_4 * (-z * z / 2.0).exp();
    let tail = d
        * t
        * (0.319_381_530
            + t * (-0.356_563_782
                + t * (1.781_477_937 + t * (-1.821_255_978 + t * 1.330_274_429))));
    if z > 0.0 {
        1.0 - tail
    } else {
        tail
    }
}

/// Standard normal quantile (inverse CDF).
///
/// Returns `-inf` for `p <= 0`, `+inf` for `p >= 1`.
#[must_use]
pub fn normal_inverse(p: f64) -> f64 {
    if p.is_nan() {
        return f64::NAN;
    }
    if p <= 0.0 {
        return f64::NEG_INFINITY;
    }
    if p >= 1.0 {
        return f64::INFINITY;
    }

    let y = p - 0.5;
    if y.abs() < 0.42 {
        let r = y * y;
        let [a0, a1, a2, a3] = INV_NORM_A;
        let [b0, b1, b2, b3] = INV_NORM_B;
        let num = y * (((a3 * r + a2) * r + a1) * r + a0);
        let den = (((b3 * r + b2) * r + b1) * r + b0) * r + 1.0;
        return num / den;
    }

    let tail = if y > 0.0 { 1.0 - p } else { p };
    let r = (-tail.ln()).ln();
    let x = INV_NORM_C
        .iter()
        .rev()
        .fold(0.0_f64, |acc, &c| acc.mul_add(r, c));
    if y < 0.0 {
        -x
    } else {
        x
    }
}

/// Two-sided critical value `z(1 - alpha/2)`.
#[must_use]
pub fn z_critical(alpha: f64) -> f64 {
    normal_inverse(1.0 - alpha / 2.0)
}

/// Two-tailed p-value of a standard normal statistic.
#[must_use]
pub fn two_tailed_p_value(z: f64) -> f64 {
    if z.is_infinite() {
        return 0.0;
    }
    (2.0 * (1.0 - normal_cdf(z.abs()))).clamp(0.0, 1.0)
}

/// Natural log of the gamma function (Lanczos, g = 7).
#[must_use]
pub fn ln_gamma(x: f64) -> f64 {
    if x < 0.5 {
        // Reflection formula.
        return (PI / (PI * x).sin()).ln() - ln_gamma(1.0 - x);
    }
    let x = x - 1.0;
    let mut acc = LANCZOS[0];
    for (i, &c) in LANCZOS.iter().enumerate().skip(1) {
        #[allow(clippy::cast_precision_loss)]
        let offset = i as f64;
        acc += c / (x + offset);
    }
    let t = x + LANCZOS_G + 0.5;
    0.5 * (2.0 * PI).ln() + (x + 0.5) * t.ln() - t + acc.ln()
}

/// Regularized lower incomplete gamma `P(a, x)`.
#[must_use]
pub fn regularized_gamma_p(a: f64, x: f64) -> f64 {
    if x <= 0.0 || a <= 0.0 {
        return 0.0;
    }
    if x.is_infinite() {
        return 1.0;
    }
    let prefix = (-x + a * x.ln() - ln_gamma(a)).exp();

    if x < a + 1.0 {
        // Series representation.
        let mut ap = a;
        let mut sum = 1.0 / a;
        let mut del = sum;
        for _ in 0..GAMMA_MAX_ITER {
            ap += 1.0;
            del *= x / ap;
            sum += del;
            if del.abs() < sum.abs() * GAMMA_EPS {
                break;
            }
        }
        return (sum * prefix).clamp(0.0, 1.0);
    }

    // Continued fraction for Q(a, x), modified Lentz.
    let mut b = x + 1.0 - a;
    let mut c = 1.0 / GAMMA_FPMIN;
    let mut d = 1.0 / b;
    let mut h = d;
    for i in 1..=GAMMA_MAX_ITER {
        #[allow(clippy::cast_precision_loss)]
        let i = i as f64;
        let an = -i * (i - a);
        b += 2.0;
        d = an.mul_add(d, b);
        if d.abs() < GAMMA_FPMIN {
            d = GAMMA_FPMIN;
        }
        c = b + an / c;
        if c.abs() < GAMMA_FPMIN {
            c = GAMMA_FPMIN;
        }
        d = 1.0 / d;
        let del = d * c;
        h *= del;
        if (del - 1.0).abs() < GAMMA_EPS {
            break;
        }
    }
    (1.0 - prefix * h).clamp(0.0, 1.0)
}

/// Chi-square cumulative distribution function.
#[must_use]
pub fn chi_square_cdf(x: f64, df: f64) -> f64 {
    if x <= 0.0 || df <= 0.0 {
        return 0.0;
    }
    if df > CHI_SQUARE_NORMAL_APPROX_DF {
        let k = 2.0 / (9.0 * df);
        let z = ((x / df).cbrt() - (1.0 - k)) / k.sqrt();
        return normal_cdf(z);
    }
    regularized_gamma_p(df / 2.0, x / 2.0)
}

/// Chi-square survival function `1 - CDF`, i.e. the upper-tail p-value.
#[must_use]
pub fn chi_square_sf(x: f64, df: f64) -> f64 {
    (1.0 - chi_square_cdf(x, df)).clamp(0.0, 1.0)
}

/// Draw from the standard normal via Box-Muller.
pub fn standard_normal<R: Rng>(rng: &mut R) -> f64 {
    // 1 - U maps [0, 1) onto (0, 1], keeping ln() finite.
    let u1: f64 = 1.0 - rng.gen::<f64>();
    let u2: f64 = rng.gen();
    (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
}

/// Parameters above which Beta draws use the normal approximation.
pub const BETA_NORMAL_APPROX_MIN: f64 = 10.0;

/// Beta posterior of a conversion rate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BetaPosterior {
    /// Prior alpha plus successes
    pub alpha: f64,
    /// Prior beta plus failures
    pub beta: f64,
}

impl BetaPosterior {
    /// Posterior after `successes` out of `trials` under a flat Beta(1, 1) prior.
    #[must_use]
    pub fn from_counts(successes: u64, trials: u64) -> Self {
        Self::with_prior(successes, trials, 1.0, 1.0)
    }

    /// Posterior with an explicit Beta prior.
    ///
    /// `successes` is capped at `trials`.
    #[must_use]
    pub fn with_prior(successes: u64, trials: u64, prior_alpha: f64, prior_beta: f64) -> Self {
        let successes = successes.min(trials);
        #[allow(clippy::cast_precision_loss)]
        let (s, f) = (successes as f64, (trials - successes) as f64);
        Self {
            alpha: prior_alpha + s,
            beta: prior_beta + f,
        }
    }

    /// Posterior mean `a / (a + b)`.
    #[must_use]
    pub fn mean(&self) -> f64 {
        self.alpha / (self.alpha + self.beta)
    }

    /// Posterior variance `ab / ((a + b)^2 (a + b + 1))`.
    #[must_use]
    pub fn variance(&self) -> f64 {
        let sum = self.alpha + self.beta;
        self.alpha * self.beta / (sum * sum * (sum + 1.0))
    }

    /// Posterior standard deviation.
    #[must_use]
    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    /// Normal-approximation credible interval `mean ± z·sd`, clamped to [0, 1].
    #[must_use]
    pub fn credible_interval(&self, z: f64) -> (f64, f64) {
        let mean = self.mean();
        let half = z * self.std_dev();
        ((mean - half).max(0.0), (mean + half).min(1.0))
    }

    /// Build a reusable sampler for this posterior.
    #[must_use]
    pub fn sampler(&self) -> PosteriorSampler {
        if self.alpha > BETA_NORMAL_APPROX_MIN && self.beta > BETA_NORMAL_APPROX_MIN {
            return PosteriorSampler::Normal {
                mean: self.mean(),
                std_dev: self.std_dev(),
            };
        }
        Beta::new(self.alpha, self.beta).map_or(
            PosteriorSampler::Normal {
                mean: self.mean(),
                std_dev: self.std_dev(),
            },
            PosteriorSampler::Exact,
        )
    }
}

/// Draws conversion rates from a Beta posterior.
///
/// Large posteriors use `mean + sd·Z`; small ones (where the normal shape is
/// visibly wrong) use an exact Beta sampler. Every draw is clamped to
/// [0, 1].
#[derive(Debug, Clone)]
pub enum PosteriorSampler {
    /// Normal approximation for `alpha, beta > 10`
    Normal {
        /// Posterior mean
        mean: f64,
        /// Posterior standard deviation
        std_dev: f64,
    },
    /// Exact Beta draw
    Exact(Beta<f64>),
}

impl PosteriorSampler {
    /// Draw one conversion rate.
    pub fn sample<R: Rng>(&self, rng: &mut R) -> f64 {
        let draw = match self {
            Self::Normal { mean, std_dev } => std_dev.mul_add(standard_normal(rng), *mean),
            Self::Exact(beta) => beta.sample(rng),
        };
        if draw.is_nan() {
            return 0.0;
        }
        draw.clamp(0.0, 1.0)
    }
}
