//! Approximate special functions used by the variational engine.
//!
//! These are the simple closed forms the posterior and ELBO
//! were calibrated against, not high-precision implementations:
//!
//! - `Γ(x) ≈ sqrt(2π/x) · (x/e)^x` (Stirling without correction terms),
//!   exactly 1 at x = 1
//! - `ψ(x) ≈ ln x − 1/(2x)`
//!
//! Γ is evaluated in log space so concentrations in the hundreds do not
//! overflow. Arguments below [`MIN_ARGUMENT`] are clamped up to it; callers
//! keep their inputs above it by construction.

use std::f64::consts::PI;

use crate::symbol::ALPHABET_SIZE;

/// Smallest argument the approximations are used at.
pub const MIN_ARGUMENT: f64 = 0.1;

/// ln Γ(x) under the Stirling approximation.
pub fn ln_gamma(x: f64) -> f64 {
    if x == 1.0 {
        return 0.0;
    }
    let x = x.max(MIN_ARGUMENT);
    0.5 * (2.0 * PI / x).ln() + x * (x.ln() - 1.0)
}

/// Γ(x) under the Stirling approximation (may be `inf` for large x).
pub fn gamma(x: f64) -> f64 {
    ln_gamma(x).exp()
}

pub fn digamma(x: f64) -> f64 {
    let x = x.max(MIN_ARGUMENT);
    x.ln() - 1.0 / (2.0 * x)
}

/// KL(Dir(alpha) ‖ Dir(prior)) in closed form with the approximations above.
pub fn dirichlet_kl(alpha: &[f64; ALPHABET_SIZE], prior: &[f64; ALPHABET_SIZE]) -> f64 {
    let total: f64 = alpha.iter().sum();
    let total_prior: f64 = prior.iter().sum();
    let digamma_total = digamma(total);

    let mut kl = ln_gamma(total) - ln_gamma(total_prior);
    for (&a, &p) in alpha.iter().zip(prior) {
        kl += ln_gamma(p) - ln_gamma(a);
        kl += (a - p) * (digamma(a) - digamma_total);
    }
    kl
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gamma_is_exact_at_one() {
        assert_eq!(gamma(1.0), 1.0);
        assert_eq!(ln_gamma(1.0), 0.0);
    }

    #[test]
    fn gamma_tracks_factorial_within_stirling_error() {
        // Γ(5) = 24; uncorrected Stirling undershoots by ~1/(12x).
        let g = gamma(5.0);
        assert!((g - 24.0).abs() / 24.0 < 0.02, "gamma(5) = {g}");
    }

    #[test]
    fn ln_gamma_stays_finite_for_large_arguments() {
        let v = ln_gamma(5000.0);
        assert!(v.is_finite());
        assert!(gamma(5000.0).is_infinite());
    }

    #[test]
    fn digamma_close_to_reference() {
        // ψ(10) = 2.251752589...
        assert!((digamma(10.0) - 2.2517526).abs() < 1e-2);
        assert!(digamma(MIN_ARGUMENT).is_finite());
        assert!(digamma(0.0).is_finite());
    }

    #[test]
    fn kl_to_self_is_zero() {
        let prior = [1.0; 4];
        assert!(dirichlet_kl(&prior, &prior).abs() < 1e-12);
        let a = [3.0, 1.5, 2.0, 7.0];
        assert!(dirichlet_kl(&a, &a).abs() < 1e-9);
    }
}
