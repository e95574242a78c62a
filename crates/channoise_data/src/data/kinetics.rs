use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the four elementary gate transitions of the sodium channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Transition {
    /// Activation gate opening (m: 0 -> 1).
    AlphaM,
    /// Activation gate closing (m: 1 -> 0).
    BetaM,
    /// Inactivation gate recovery (h: 0 -> 1).
    AlphaH,
    /// Inactivation gate closing (h: 1 -> 0).
    BetaH,
}

impl Transition {
    pub const ALL: [Transition; 4] = [
        Transition::AlphaM,
        Transition::BetaM,
        Transition::AlphaH,
        Transition::BetaH,
    ];
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Transition::AlphaM => "alpha_m",
            Transition::BetaM => "beta_m",
            Transition::AlphaH => "alpha_h",
            Transition::BetaH => "beta_h",
        };
        f.write_str(label)
    }
}

/// Coefficients of the generalized Hodgkin-Huxley rate expression
///
/// `rate(V) = (a + b*V) / (c + h*exp((V + d) / f))`
///
/// with `V` in mV and the result in 1/ms. A term with `h == 0` has no
/// exponential and `f` is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateCoefficients {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub f: f64,
    pub h: f64,
}

impl RateCoefficients {
    /// A voltage-independent rate.
    #[must_use]
    pub const fn constant(rate: f64) -> Self {
        Self {
            a: rate,
            b: 0.0,
            c: 1.0,
            d: 0.0,
            f: 1.0,
            h: 0.0,
        }
    }
}

/// Read-only kinetic parameters handed to the rate provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KineticParams {
    pub alpha_m: RateCoefficients,
    pub beta_m: RateCoefficients,
    pub alpha_h: RateCoefficients,
    pub beta_h: RateCoefficients,
    /// Temperature coefficient applied to every rate.
    pub q10: f64,
    pub temperature_c: f64,
    pub reference_temperature_c: f64,
}

impl KineticParams {
    /// Hodgkin & Huxley (1952) squid axon sodium kinetics, resting
    /// potential at -65 mV, rates in 1/ms at 6.3 C.
    #[must_use]
    pub fn hodgkin_huxley() -> Self {
        Self {
            // 0.1 (V + 40) / (1 - exp(-(V + 40) / 10))
            alpha_m: RateCoefficients {
                a: 4.0,
                b: 0.1,
                c: 1.0,
                d: 40.0,
                f: -10.0,
                h: -1.0,
            },
            // 4 exp(-(V + 65) / 18)
            beta_m: RateCoefficients {
                a: 4.0,
                b: 0.0,
                c: 0.0,
                d: 65.0,
                f: 18.0,
                h: 1.0,
            },
            // 0.07 exp(-(V + 65) / 20)
            alpha_h: RateCoefficients {
                a: 0.07,
                b: 0.0,
                c: 0.0,
                d: 65.0,
                f: 20.0,
                h: 1.0,
            },
            // 1 / (1 + exp(-(V + 35) / 10))
            beta_h: RateCoefficients {
                a: 1.0,
                b: 0.0,
                c: 1.0,
                d: 35.0,
                f: -10.0,
                h: 1.0,
            },
            q10: 3.0,
            temperature_c: 6.3,
            reference_temperature_c: 6.3,
        }
    }

    /// Voltage-independent rates with no temperature scaling.
    #[must_use]
    pub fn constant(alpha_m: f64, beta_m: f64, alpha_h: f64, beta_h: f64) -> Self {
        Self {
            alpha_m: RateCoefficients::constant(alpha_m),
            beta_m: RateCoefficients::constant(beta_m),
            alpha_h: RateCoefficients::constant(alpha_h),
            beta_h: RateCoefficients::constant(beta_h),
            q10: 1.0,
            temperature_c: 20.0,
            reference_temperature_c: 20.0,
        }
    }

    #[must_use]
    pub fn coefficients(&self, transition: Transition) -> &RateCoefficients {
        match transition {
            Transition::AlphaM => &self.alpha_m,
            Transition::BetaM => &self.beta_m,
            Transition::AlphaH => &self.alpha_h,
            Transition::BetaH => &self.beta_h,
        }
    }
}

impl Default for KineticParams {
    fn default() -> Self {
        Self::hodgkin_huxley()
    }
}
