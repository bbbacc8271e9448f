//! explorer::options — configuration of fits, χ² error policies, and MINOS.
use crate::{
    explorer::errors::{ExplorerError, ExplorerResult},
    optimization::loglik_optimizer::MLEOptions,
    statistical_tests::chi_square::BinErrors,
};

/// Settings of the profile-likelihood (MINOS) scan.
///
/// - `up`: rise of the cost (−ℓ) defining the interval; 0.5 gives ±1σ.
/// - `tolerance`: bisection stops once the bracket is narrower than
///   `tolerance` times the initial step.
/// - `max_iter`: bound on bracketing and on bisection steps, each.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MinosOptions {
    pub up: f64,
    pub tolerance: f64,
    pub max_iter: usize,
}

impl MinosOptions {
    /// # Errors
    /// [`ExplorerError::InvalidArgument`] for non-positive `up`/`tolerance`
    /// or `max_iter == 0`.
    pub fn new(up: f64, tolerance: f64, max_iter: usize) -> ExplorerResult<Self> {
        if !(up > 0.0 && up.is_finite()) {
            return Err(ExplorerError::argument(format!("MINOS up must be positive, got {up}")));
        }
        if !(tolerance > 0.0 && tolerance < 1.0) {
            return Err(ExplorerError::argument(format!(
                "MINOS tolerance must lie in (0, 1), got {tolerance}"
            )));
        }
        if max_iter == 0 {
            return Err(ExplorerError::argument("MINOS max_iter must be positive"));
        }
        Ok(Self { up, tolerance, max_iter })
    }
}

impl Default for MinosOptions {
    fn default() -> Self {
        Self { up: 0.5, tolerance: 1e-3, max_iter: 60 }
    }
}

/// Options used by [`DataExplorer`](super::DataExplorer).
///
/// - `fit`: optimizer settings of the likelihood protocol.
/// - `chi2`: optimizer settings of the χ² protocol; verbose by default.
/// - `bin_errors`: per-bin errors of the χ² fit.
/// - `gof_errors`: per-bin errors of the goodness-of-fit test.
/// - `minos`: profile scan settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ExplorerOptions {
    pub fit: MLEOptions,
    pub chi2: MLEOptions,
    pub bin_errors: BinErrors,
    pub gof_errors: BinErrors,
    pub minos: MinosOptions,
}

impl Default for ExplorerOptions {
    fn default() -> Self {
        Self {
            fit: MLEOptions::default(),
            chi2: MLEOptions { verbose: true, ..MLEOptions::default() },
            bin_errors: BinErrors::Auto,
            gof_errors: BinErrors::Expected,
            minos: MinosOptions::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_make_only_the_chi2_fit_verbose() {
        let opts = ExplorerOptions::default();
        assert!(!opts.fit.verbose);
        assert!(opts.chi2.verbose);
        assert_eq!(opts.bin_errors, BinErrors::Auto);
        assert_eq!(opts.gof_errors, BinErrors::Expected);
        assert_eq!(opts.minos, MinosOptions::new(0.5, 1e-3, 60).unwrap());
    }

    #[test]
    fn minos_options_reject_degenerate_settings() {
        assert!(MinosOptions::new(0.0, 1e-3, 10).is_err());
        assert!(MinosOptions::new(0.5, 1.5, 10).is_err());
        assert!(MinosOptions::new(0.5, 1e-3, 0).is_err());
    }
}
