//! Statistical building blocks shared by every analyzer.

pub mod descriptive;
pub mod distributions;
pub mod power;

pub use descriptive::{mean, population_variance, sample_std_dev, standard_error};
pub use distributions::{
    chi_square_cdf, chi_square_sf, normal_cdf, normal_inverse, two_tailed_p_value, z_critical,
    BetaPosterior, PosteriorSampler,
};
pub use power::{achieved_power, required_sample_size, PowerAnalysisParams, PowerAnalysisResult};
