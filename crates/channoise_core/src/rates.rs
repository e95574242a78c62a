//! Voltage-dependent rate constants and their two-state aggregation.
//!
//! The elementary rates come from a [`RateProvider`]; everything derived from
//! them (`gamma`, `lambda`, equilibrium occupancy) is recomputed on every
//! call so no intermediate value survives between `initialize` and
//! `advance`.

use crate::error::{ChannelError, Result};
use channoise_data::{KineticParams, NodeState, RateCoefficients, Transition};

/// Denominators below this are treated as the removable singularity of the
/// generalized HH expression.
const SINGULARITY_EPS: f64 = 1e-9;

/// Evaluation of generalized Hodgkin-Huxley coefficients.
pub trait RateLogic {
    fn evaluate(&self, v_m: f64) -> f64;
}

impl RateLogic for RateCoefficients {
    fn evaluate(&self, v_m: f64) -> f64 {
        let numerator = self.a + self.b * v_m;
        let exp_term = if self.h == 0.0 {
            0.0
        } else {
            self.h * ((v_m + self.d) / self.f).exp()
        };
        let denominator = self.c + exp_term;

        if denominator.abs() < SINGULARITY_EPS
            && numerator.abs() < SINGULARITY_EPS
            && exp_term != 0.0
        {
            // L'Hopital: d(num)/dV = b, d(den)/dV = exp_term / f
            return self.b * self.f / exp_term;
        }
        numerator / denominator
    }
}

/// Q10 scaling factor for the parameter set.
#[must_use]
pub fn temperature_factor(params: &KineticParams) -> f64 {
    params
        .q10
        .powf((params.temperature_c - params.reference_temperature_c) / 10.0)
}

/// Source of instantaneous rate constants (1/ms).
///
/// Implementations must be pure: the same inputs always give the same rate.
pub trait RateProvider {
    fn rate(&self, transition: Transition, v_m: f64, params: &KineticParams) -> f64;
}

/// Generalized HH expression with Q10 temperature scaling.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeneralizedRates;

impl RateProvider for GeneralizedRates {
    fn rate(&self, transition: Transition, v_m: f64, params: &KineticParams) -> f64 {
        params.coefficients(transition).evaluate(v_m) * temperature_factor(params)
    }
}

impl<F> RateProvider for F
where
    F: Fn(Transition, f64, &KineticParams) -> f64,
{
    fn rate(&self, transition: Transition, v_m: f64, params: &KineticParams) -> f64 {
        self(transition, v_m, params)
    }
}

/// The four elementary rates at one voltage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElementaryRates {
    pub alpha_m: f64,
    pub beta_m: f64,
    pub alpha_h: f64,
    pub beta_h: f64,
}

impl ElementaryRates {
    /// Queries the provider for all four rates and rejects negative or
    /// non-finite values.
    pub fn evaluate<P: RateProvider + ?Sized>(
        provider: &P,
        v_m: f64,
        params: &KineticParams,
    ) -> Result<Self> {
        let fetch = |transition: Transition| -> Result<f64> {
            let value = provider.rate(transition, v_m, params);
            if value.is_finite() && value >= 0.0 {
                Ok(value)
            } else {
                Err(ChannelError::InvalidRate {
                    transition,
                    v_m,
                    value,
                })
            }
        };
        Ok(Self {
            alpha_m: fetch(Transition::AlphaM)?,
            beta_m: fetch(Transition::BetaM)?,
            alpha_h: fetch(Transition::AlphaH)?,
            beta_h: fetch(Transition::BetaH)?,
        })
    }

    #[must_use]
    pub fn all_zero(&self) -> bool {
        self.alpha_m == 0.0 && self.beta_m == 0.0 && self.alpha_h == 0.0 && self.beta_h == 0.0
    }

    /// Collapses the gate rates onto the closed/open pair.
    #[must_use]
    pub fn aggregate(&self) -> AggregateRates {
        let activation = self.alpha_m + self.beta_m;
        let normalizer = activation.powi(3) * (self.alpha_h + self.beta_h);
        let open_weight = self.alpha_m.powi(3) * self.alpha_h;

        let gamma_open = self.beta_h + 3.0 * self.beta_m;
        let closed_weight = normalizer - open_weight;
        let gamma_closed = if closed_weight > 0.0 {
            open_weight * gamma_open / closed_weight
        } else {
            0.0
        };

        AggregateRates {
            gamma_closed,
            gamma_open,
            open_weight,
            normalizer,
        }
    }
}

/// Directional rates of the reduced closed <-> open model.
///
/// `gamma_closed` is the per-channel closed -> open rate and `gamma_open`
/// the per-channel open -> closed rate. They satisfy detailed balance with
/// the equilibrium occupancy `open_weight / normalizer`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AggregateRates {
    pub gamma_closed: f64,
    pub gamma_open: f64,
    pub open_weight: f64,
    pub normalizer: f64,
}

impl AggregateRates {
    /// Steady-state open probability, `None` when the activation or
    /// inactivation pair is entirely zero.
    #[must_use]
    pub fn equilibrium_open_probability(&self) -> Option<f64> {
        if self.normalizer > 0.0 {
            Some(self.open_weight / self.normalizer)
        } else {
            None
        }
    }

    /// Weight of the closed -> open outcome for the given population.
    #[must_use]
    pub fn opening_propensity(&self, state: &NodeState) -> f64 {
        self.gamma_closed * f64::from(state.closed)
    }

    /// Weight of the open -> closed outcome for the given population.
    #[must_use]
    pub fn closing_propensity(&self, state: &NodeState) -> f64 {
        self.gamma_open * f64::from(state.open)
    }

    /// Total outflow rate of the joint state.
    #[must_use]
    pub fn lambda(&self, state: &NodeState) -> f64 {
        self.opening_propensity(state) + self.closing_propensity(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_hh_alpha_m_singularity_limit() {
        let params = KineticParams::hodgkin_huxley();
        let at_singularity = params.alpha_m.evaluate(-40.0);
        assert!(approx(at_singularity, 1.0), "got {at_singularity}");

        let nearby = params.alpha_m.evaluate(-40.0 + 1e-4);
        assert!((nearby - 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_hh_resting_rates() {
        let params = KineticParams::hodgkin_huxley();
        let rates = ElementaryRates::evaluate(&GeneralizedRates, -65.0, &params).unwrap();
        assert!((rates.beta_m - 4.0).abs() < 1e-12);
        assert!((rates.alpha_h - 0.07).abs() < 1e-12);
        let expected_alpha_m = 2.5 / (2.5f64.exp() - 1.0);
        assert!(approx(rates.alpha_m, expected_alpha_m));
        let expected_beta_h = 1.0 / (1.0 + 3.0f64.exp());
        assert!(approx(rates.beta_h, expected_beta_h));
    }

    #[test]
    fn test_constant_coefficients_ignore_voltage() {
        let coefficients = RateCoefficients::constant(3.0);
        assert_eq!(coefficients.evaluate(-1000.0), 3.0);
        assert_eq!(coefficients.evaluate(1000.0), 3.0);
    }

    #[test]
    fn test_q10_scaling() {
        let mut params = KineticParams::constant(1.0, 1.0, 1.0, 1.0);
        params.q10 = 3.0;
        params.temperature_c = 26.3;
        params.reference_temperature_c = 6.3;
        assert!(approx(temperature_factor(&params), 9.0));
        let rate = GeneralizedRates.rate(Transition::AlphaM, 0.0, &params);
        assert!(approx(rate, 9.0));
    }

    #[test]
    fn test_negative_rate_rejected() {
        let provider =
            |t: Transition, _v: f64, _p: &KineticParams| if t == Transition::BetaH { -1.0 } else { 1.0 };
        let err = ElementaryRates::evaluate(&provider, 0.0, &KineticParams::default()).unwrap_err();
        assert!(matches!(
            err,
            ChannelError::InvalidRate {
                transition: Transition::BetaH,
                ..
            }
        ));
    }

    #[test]
    fn test_nan_rate_rejected() {
        let provider = |_t: Transition, _v: f64, _p: &KineticParams| f64::NAN;
        assert!(ElementaryRates::evaluate(&provider, 0.0, &KineticParams::default()).is_err());
    }

    #[test]
    fn test_aggregate_detailed_balance() {
        let rates = ElementaryRates {
            alpha_m: 2.0,
            beta_m: 1.0,
            alpha_h: 1.0,
            beta_h: 1.0,
        };
        let agg = rates.aggregate();
        assert!(approx(agg.normalizer, 54.0));
        assert!(approx(agg.open_weight, 8.0));
        assert!(approx(agg.gamma_open, 4.0));
        assert!(approx(agg.gamma_closed, 8.0 * 4.0 / 46.0));

        let p = agg.equilibrium_open_probability().unwrap();
        // closed * gamma_closed == open * gamma_open at equilibrium
        assert!(approx((1.0 - p) * agg.gamma_closed, p * agg.gamma_open));
    }

    #[test]
    fn test_aggregate_without_closing_rates() {
        let rates = ElementaryRates {
            alpha_m: 1.0,
            beta_m: 0.0,
            alpha_h: 1.0,
            beta_h: 0.0,
        };
        let agg = rates.aggregate();
        assert_eq!(agg.gamma_open, 0.0);
        assert_eq!(agg.gamma_closed, 0.0);
        assert_eq!(agg.equilibrium_open_probability(), Some(1.0));
    }

    #[test]
    fn test_lambda_weights_population() {
        let agg = AggregateRates {
            gamma_closed: 0.5,
            gamma_open: 2.0,
            open_weight: 1.0,
            normalizer: 5.0,
        };
        let state = NodeState::new(10, 3, None);
        assert!(approx(agg.opening_propensity(&state), 5.0));
        assert!(approx(agg.closing_propensity(&state), 6.0));
        assert!(approx(agg.lambda(&state), 11.0));
    }

    #[test]
    fn test_all_zero() {
        let params = KineticParams::constant(0.0, 0.0, 0.0, 0.0);
        let rates = ElementaryRates::evaluate(&GeneralizedRates, 0.0, &params).unwrap();
        assert!(rates.all_zero());
        assert_eq!(rates.aggregate().equilibrium_open_probability(), None);
    }
}
