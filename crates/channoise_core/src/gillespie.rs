//! Event-driven (Gillespie) simulation of one node's channel population.
//!
//! Each node carries an absolute event clock. `advance` fires every event
//! whose time falls inside the caller's sampling window `[t, t + dt)` and
//! then reports the open count; events keep their exact continuous times and
//! only the observation is discretized.
//!
//! The membrane voltage is held at the value passed to `advance` for every
//! event inside the window, even when several events fire. Callers update
//! `V_m` once per window.
//!
//! The seeding distribution (`alpha_m^3 alpha_h` weighting) and the
//! aggregated closed <-> open rates are one reduction of the 8-state sodium
//! scheme. They are not a verified kinetic model and should be checked
//! against a reference scheme before being used for quantitative work.

use crate::diagnostics::{DiagnosticSink, EventRecord, NullSink, StepRecord};
use crate::error::{ChannelError, Result};
use crate::random::{exponential, UniformSource};
use crate::rates::{ElementaryRates, GeneralizedRates, RateProvider};
use crate::store::NodeStore;
use channoise_data::{KineticParams, NodeIndex, NodeState};

/// One sampling window of the outer simulation loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepWindow {
    step_size: f64,
    step_index: u64,
}

impl StepWindow {
    pub fn new(step_size: f64, step_index: u64) -> Result<Self> {
        if step_size.is_finite() && step_size > 0.0 {
            Ok(Self {
                step_size,
                step_index,
            })
        } else {
            Err(ChannelError::InvalidStep(step_size))
        }
    }

    #[must_use]
    pub fn step_size(&self) -> f64 {
        self.step_size
    }

    #[must_use]
    pub fn step_index(&self) -> u64 {
        self.step_index
    }

    #[must_use]
    pub fn start(&self) -> f64 {
        self.step_size * self.step_index as f64
    }

    /// Computed from the index so it equals the next window's start exactly.
    #[must_use]
    pub fn end(&self) -> f64 {
        self.step_size * (self.step_index + 1) as f64
    }

    /// Half-open membership test.
    #[must_use]
    pub fn contains(&self, t: f64) -> bool {
        self.start() <= t && t < self.end()
    }

    #[must_use]
    pub fn next(&self) -> Self {
        Self {
            step_size: self.step_size,
            step_index: self.step_index + 1,
        }
    }
}

/// Result of sampling the outcome of one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// closed -> open
    Opening,
    /// open -> closed
    Closing,
    /// The draw fell outside both cumulative intervals.
    NoTransition,
}

impl Outcome {
    /// Picks the interval of `cumulative` that contains `u`.
    fn select(cumulative: &[f64; 3], u: f64) -> Self {
        if cumulative[0] <= u && u < cumulative[1] {
            Outcome::Opening
        } else if cumulative[1] <= u && u < cumulative[2] {
            Outcome::Closing
        } else {
            Outcome::NoTransition
        }
    }
}

/// Open count and number of fired events for one advance call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StepOutcome {
    pub open: u32,
    pub events: u32,
}

/// Step engine parameterized by its rate provider.
#[derive(Debug, Clone, Default)]
pub struct GillespieEngine<P = GeneralizedRates> {
    rates: P,
}

impl<P: RateProvider> GillespieEngine<P> {
    pub fn new(rates: P) -> Self {
        Self { rates }
    }

    pub fn rates(&self) -> &P {
        &self.rates
    }

    /// Seeds `node` at the equilibrium population for `v_m0` and schedules
    /// its first event. The slot is only written on success.
    #[allow(clippy::too_many_arguments)]
    pub fn initialize<U: UniformSource + ?Sized>(
        &self,
        store: &mut NodeStore,
        node: NodeIndex,
        n_na: u32,
        v_m0: f64,
        params: &KineticParams,
        source: &mut U,
    ) -> Result<()> {
        store.check_index(node)?;
        let state = self.initialize_state(node, n_na, v_m0, params, source)?;
        *store.slot_mut(node)? = Some(state);
        tracing::debug!(
            node = node,
            closed = state.closed,
            open = state.open,
            next_event = ?state.next_event,
            "Seeded channel population"
        );
        Ok(())
    }

    /// Equilibrium population for `v_m0` with its first event time,
    /// measured from t = 0.
    pub fn initialize_state<U: UniformSource + ?Sized>(
        &self,
        node: NodeIndex,
        n_na: u32,
        v_m0: f64,
        params: &KineticParams,
        source: &mut U,
    ) -> Result<NodeState> {
        if n_na == 0 {
            return Ok(NodeState::new(0, 0, None));
        }

        let rates = ElementaryRates::evaluate(&self.rates, v_m0, params)?;
        if rates.all_zero() {
            return Err(ChannelError::DegenerateRate { node, lambda: 0.0 });
        }
        let aggregate = rates.aggregate();
        let p_open = aggregate
            .equilibrium_open_probability()
            .ok_or(ChannelError::DegenerateRate { node, lambda: 0.0 })?;

        // Truncation biases the open count down; closed takes the remainder.
        let open = ((f64::from(n_na) * p_open) as u32).min(n_na);
        let mut state = NodeState::new(n_na - open, open, None);

        let lambda = aggregate.lambda(&state);
        state.next_event = Some(holding_time(node, lambda, source)?);
        Ok(state)
    }

    /// Fires every event of `node` inside `window` and returns the open count.
    #[allow(clippy::too_many_arguments)]
    pub fn advance<U: UniformSource + ?Sized>(
        &self,
        store: &mut NodeStore,
        node: NodeIndex,
        n_na: u32,
        v_m: f64,
        window: StepWindow,
        params: &KineticParams,
        source: &mut U,
    ) -> Result<u32> {
        self.advance_observed(store, node, n_na, v_m, window, params, source, &mut NullSink)
    }

    /// [`advance`](Self::advance) with a diagnostic sink attached.
    #[allow(clippy::too_many_arguments)]
    pub fn advance_observed<U, S>(
        &self,
        store: &mut NodeStore,
        node: NodeIndex,
        n_na: u32,
        v_m: f64,
        window: StepWindow,
        params: &KineticParams,
        source: &mut U,
        sink: &mut S,
    ) -> Result<u32>
    where
        U: UniformSource + ?Sized,
        S: DiagnosticSink + ?Sized,
    {
        let state = store.get_mut(node)?;
        self.advance_state(node, state, n_na, v_m, window, params, source, sink)
            .map(|outcome| outcome.open)
    }

    /// Event loop on a single slot. Used directly by drivers that split the
    /// store across workers.
    #[allow(clippy::too_many_arguments)]
    pub fn advance_state<U, S>(
        &self,
        node: NodeIndex,
        state: &mut NodeState,
        n_na: u32,
        v_m: f64,
        window: StepWindow,
        params: &KineticParams,
        source: &mut U,
        sink: &mut S,
    ) -> Result<StepOutcome>
    where
        U: UniformSource + ?Sized,
        S: DiagnosticSink + ?Sized,
    {
        if state.total() != u64::from(n_na) {
            return Err(ChannelError::invariant(
                node,
                format!(
                    "stored population {} does not match channel count {n_na}",
                    state.total()
                ),
            ));
        }

        let mut events = 0;
        if state.next_event.is_none() && n_na > 0 {
            // Clock cleared by a degenerate abort; restart it at this window.
            let aggregate = ElementaryRates::evaluate(&self.rates, v_m, params)?.aggregate();
            let holding = holding_time(node, aggregate.lambda(state), source)?;
            state.next_event = Some(window.start() + holding);
            tracing::debug!(
                node = node,
                next_event = window.start() + holding,
                "Event clock rescheduled"
            );
        }
        if let Some(t_occ) = state.next_event {
            if t_occ < window.start() {
                tracing::warn!(
                    node = node,
                    next_event = t_occ,
                    window_start = window.start(),
                    "Event clock behind sampling window, no events fired"
                );
            }
        }

        while let Some(t_occ) = state.next_event.filter(|t| window.contains(*t)) {
            let rates = ElementaryRates::evaluate(&self.rates, v_m, params)?;
            let aggregate = rates.aggregate();

            let lambda = aggregate.lambda(state);
            if !is_usable_rate(lambda) {
                state.next_event = None;
                return Err(ChannelError::DegenerateRate { node, lambda });
            }

            let opening = aggregate.opening_propensity(state);
            let cumulative = [0.0, opening, opening + aggregate.closing_propensity(state)];
            let u = source.uniform()? * lambda;
            let outcome = Outcome::select(&cumulative, u);
            apply(node, state, outcome, n_na)?;

            let updated_lambda = aggregate.lambda(state);
            let holding = match holding_time(node, updated_lambda, source) {
                Ok(holding) => holding,
                Err(e) => {
                    if e.is_degenerate() {
                        state.next_event = None;
                    }
                    return Err(e);
                }
            };
            state.next_event = Some(t_occ + holding);
            events += 1;

            sink.record_event(&EventRecord {
                node,
                time: t_occ,
                outcome,
                lambda,
                closed: state.closed,
                open: state.open,
            });
        }

        sink.record_step(&StepRecord {
            node,
            step_index: window.step_index(),
            window_start: window.start(),
            window_end: window.end(),
            v_m,
            events,
            closed: state.closed,
            open: state.open,
            next_event: state.next_event,
        });

        Ok(StepOutcome {
            open: state.open,
            events,
        })
    }
}

/// Draws an exponential holding time, rejecting a zero or non-finite rate
/// before any variate is consumed.
fn holding_time<U: UniformSource + ?Sized>(
    node: NodeIndex,
    lambda: f64,
    source: &mut U,
) -> Result<f64> {
    if !is_usable_rate(lambda) {
        return Err(ChannelError::DegenerateRate { node, lambda });
    }
    exponential(lambda, source)?.ok_or(ChannelError::DegenerateRate { node, lambda })
}

fn is_usable_rate(lambda: f64) -> bool {
    lambda.is_finite() && lambda > 0.0
}

fn apply(node: NodeIndex, state: &mut NodeState, outcome: Outcome, n_na: u32) -> Result<()> {
    let (closed, open) = match outcome {
        Outcome::Opening => (
            state.closed.checked_sub(1),
            state.open.checked_add(1),
        ),
        Outcome::Closing => (
            state.closed.checked_add(1),
            state.open.checked_sub(1),
        ),
        Outcome::NoTransition => return Ok(()),
    };
    let (Some(closed), Some(open)) = (closed, open) else {
        return Err(ChannelError::invariant(
            node,
            format!("{outcome:?} from closed={} open={}", state.closed, state.open),
        ));
    };
    if u64::from(closed) + u64::from(open) != u64::from(n_na) {
        return Err(ChannelError::invariant(
            node,
            format!("closed={closed} open={open} does not sum to {n_na}"),
        ));
    }
    state.closed = closed;
    state.open = open;
    Ok(())
}
