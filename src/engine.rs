//! Suggestion engine orchestrating the suggest/probe/register protocol.
//!
//! The engine owns the observation history and a surrogate model handle, and
//! drives the loop `suggest` → (evaluation, anywhere) → `register`. The
//! convenience [`OptimizationEngine::maximize`] runs that loop in-process
//! against an attached objective; the decoupled primitives stay available for
//! callers evaluating asynchronously or on other machines, and the store's
//! mutation path is serialized so concurrent `suggest`/`register` calls
//! against one shared engine are sound (suggestions fit against a
//! point-in-time snapshot and tolerate slightly stale reads).

use std::sync::Mutex;

use ndarray::{Array, Array1, Array2, ArrayView1};
use ndarray_rand::{rand::SeedableRng, rand_distr::Uniform, RandomExt};
use rand_xoshiro::Xoshiro256Plus;

use crate::config::EngineConfig;
use crate::criteria::AcquisitionFunction;
use crate::domain::Domain;
use crate::errors::{OptError, Result};
use crate::events::{EventBus, OptEvent, Subscriber};
use crate::observations::{Observation, ObservationStore};
use crate::optimizers::AcqMaximizer;
use crate::surrogate::SurrogateModel;
use crate::transform::DomainTransform;
use crate::types::{EngineState, Objective, OptimResult, Params, ProbeOutcome};

/// Relative jitter magnitude (per-dimension fraction of the bound span)
/// applied to observed inputs when a surrogate fit has to be retried
const FIT_JITTER: f64 = 1e-8;

/// Surrogate handle plus the store version it was last fit against
/// (0 marks a never-fitted model; the store versions from 1)
struct FittedSurrogate {
    model: Box<dyn SurrogateModel>,
    version: u64,
}

/// Builder for [`OptimizationEngine`], in the
/// `maximize(f).configure(..).within(domain, surrogate)` idiom.
pub struct EngineBuilder {
    config: EngineConfig,
    objective: Option<Objective>,
    transform: Option<Box<dyn DomainTransform>>,
}

impl EngineBuilder {
    /// Starts a builder around the objective function to be maximized.
    pub fn maximize<F>(objective: F) -> Self
    where
        F: Fn(&Params) -> anyhow::Result<f64> + Send + Sync + 'static,
    {
        EngineBuilder {
            config: EngineConfig::default(),
            objective: Some(Box::new(objective)),
            transform: None,
        }
    }

    /// Starts a builder without an objective, for the decoupled pattern
    /// where evaluations happen elsewhere and arrive through `register`.
    pub fn ask_tell() -> Self {
        EngineBuilder {
            config: EngineConfig::default(),
            objective: None,
            transform: None,
        }
    }

    /// Configures the engine with a closure taking and returning an
    /// [`EngineConfig`].
    pub fn configure<F: FnOnce(EngineConfig) -> EngineConfig>(mut self, init: F) -> Self {
        self.config = init(self.config);
        self
    }

    /// Attaches a progressive domain reduction policy, invoked once per
    /// completed `maximize` iteration.
    pub fn domain_reduction(mut self, transform: impl DomainTransform + 'static) -> Self {
        self.transform = Some(Box::new(transform));
        self
    }

    /// Builds the engine over `domain` with the given surrogate handle.
    pub fn within(
        self,
        domain: Domain,
        surrogate: impl SurrogateModel + 'static,
    ) -> Result<OptimizationEngine> {
        let config = self.config.check()?;
        let rng = match config.seed {
            Some(seed) => Xoshiro256Plus::seed_from_u64(seed),
            None => Xoshiro256Plus::from_entropy(),
        };
        Ok(OptimizationEngine {
            config,
            store: Mutex::new(ObservationStore::new(domain)),
            surrogate: Mutex::new(FittedSurrogate {
                model: Box::new(surrogate),
                version: 0,
            }),
            bus: EventBus::new(),
            rng: Mutex::new(rng),
            state: Mutex::new(EngineState::Idle),
            objective: self.objective,
            transform: Mutex::new(self.transform),
        })
    }
}

/// Sequential model-based maximizer of an expensive black-box function.
pub struct OptimizationEngine {
    config: EngineConfig,
    store: Mutex<ObservationStore>,
    surrogate: Mutex<FittedSurrogate>,
    bus: EventBus,
    rng: Mutex<Xoshiro256Plus>,
    state: Mutex<EngineState>,
    objective: Option<Objective>,
    transform: Mutex<Option<Box<dyn DomainTransform>>>,
}

impl OptimizationEngine {
    /// Suggests the next promising parameter assignment to evaluate.
    ///
    /// Applies the acquisition decay step, refits the surrogate when
    /// observations arrived since the last fit, and maximizes the
    /// acquisition over the current domain. With zero observations the
    /// surrogate is left untouched and a uniform random draw is returned
    /// (exploration-only until the first observation exists).
    pub fn suggest(&self, acq: &mut AcquisitionFunction) -> Result<Params> {
        let x = self.suggest_point(acq)?;
        let store = self.store.lock().unwrap();
        Ok(store.domain().to_params(&x.view()))
    }

    /// [`OptimizationEngine::suggest`], returning the point in axis order.
    pub fn suggest_point(&self, acq: &mut AcquisitionFunction) -> Result<Array1<f64>> {
        acq.update();
        let (x_data, y_data, domain, version, best_target) = {
            let store = self.store.lock().unwrap();
            let (x, y) = store.as_arrays();
            let best = store.max().map(|o| o.target);
            (x, y, store.domain().clone(), store.version(), best)
        };
        if y_data.is_empty() {
            let mut rng = self.split_rng();
            return Ok(domain.sample_one(&mut rng));
        }
        let best_target = best_target.unwrap_or(f64::NEG_INFINITY);

        let mut fitted = self.surrogate.lock().unwrap();
        if fitted.version != version {
            self.fit_surrogate(fitted.model.as_mut(), &x_data, &y_data, &domain)?;
            fitted.version = version;
        }
        let rng = self.split_rng();
        let is_observed = |x: &ArrayView1<f64>| self.store.lock().unwrap().contains(x);
        AcqMaximizer::new(&domain, &self.config, rng).maximize(
            acq,
            fitted.model.as_ref(),
            best_target,
            &is_observed,
        )
    }

    /// Registers an externally evaluated `(params, target)` pair and fires
    /// `Step`. Parameters are clipped into the current domain; registering
    /// a vector equal to a stored one overwrites its target (last write
    /// wins). Non-finite targets are rejected and leave the store untouched.
    pub fn register(&self, params: &Params, target: f64) -> Result<()> {
        {
            let mut store = self.store.lock().unwrap();
            let x = store.domain().params_to_point(params)?;
            store.add(&x.view(), target)?;
        }
        self.fire_logged(OptEvent::Step);
        Ok(())
    }

    /// Evaluates the attached objective at `params`.
    ///
    /// A failed evaluation (an `Err`, or a non-finite value) registers
    /// nothing, fires `Skip` and leaves the store exactly as before the
    /// call; a successful one goes through [`OptimizationEngine::register`].
    pub fn probe(&self, params: &Params) -> Result<ProbeOutcome> {
        let objective = self.objective.as_ref().ok_or(OptError::MissingObjective)?;
        match objective(params) {
            Ok(target) if target.is_finite() => {
                self.register(params, target)?;
                Ok(ProbeOutcome::Evaluated(target))
            }
            Ok(bad) => {
                log::warn!("objective returned non-finite target {bad}, discarding evaluation");
                self.fire_logged(OptEvent::Skip);
                Ok(ProbeOutcome::Failed)
            }
            Err(failure) => {
                log::debug!("objective evaluation failed: {failure:#}");
                self.fire_logged(OptEvent::Skip);
                Ok(ProbeOutcome::Failed)
            }
        }
    }

    /// Runs the full loop: `init_points` random warmup probes, then
    /// `n_iter` acquisition-driven iterations.
    ///
    /// Fires `Start` once, `Step` after every successful registration,
    /// `Skip` after every failed probe, and `End` once the budget is
    /// exhausted. Equivalent to repeated manual `suggest` → evaluation →
    /// `register`. The engine remains usable afterwards.
    pub fn maximize(
        &self,
        init_points: usize,
        n_iter: usize,
        acq: &mut AcquisitionFunction,
    ) -> Result<OptimResult> {
        if self.objective.is_none() {
            return Err(OptError::MissingObjective);
        }
        log::info!("maximize: {init_points} warmup + {n_iter} acquisition-driven iterations");
        let mut n_steps = 0;
        let mut n_skips = 0;
        *self.state.lock().unwrap() = EngineState::Warmup;
        self.fire_logged(OptEvent::Start);
        for iteration in 0..(init_points + n_iter) {
            if iteration == init_points {
                *self.state.lock().unwrap() = EngineState::Refine;
            }
            let params = if iteration < init_points {
                let mut rng = self.split_rng();
                let store = self.store.lock().unwrap();
                let x = store.random_point(&mut rng);
                store.domain().to_params(&x.view())
            } else {
                self.suggest(acq)?
            };
            match self.probe(&params)? {
                ProbeOutcome::Evaluated(_) => n_steps += 1,
                ProbeOutcome::Failed => n_skips += 1,
            }
            self.apply_domain_reduction()?;
        }
        *self.state.lock().unwrap() = EngineState::Done;
        self.fire_logged(OptEvent::End);
        Ok(OptimResult {
            best: self.max(),
            n_steps,
            n_skips,
        })
    }

    /// Best observation so far, `None` while no evaluation succeeded
    pub fn max(&self) -> Option<Observation> {
        self.store.lock().unwrap().max()
    }

    /// Number of stored observations
    pub fn len(&self) -> usize {
        self.store.lock().unwrap().len()
    }

    /// Whether no observation has been registered yet
    pub fn is_empty(&self) -> bool {
        self.store.lock().unwrap().is_empty()
    }

    /// All observations in insertion order
    pub fn observations(&self) -> (Array2<f64>, Array1<f64>) {
        self.store.lock().unwrap().as_arrays()
    }

    /// Current search domain
    pub fn domain(&self) -> Domain {
        self.store.lock().unwrap().domain().clone()
    }

    /// Replaces the search domain for all subsequent clipping and sampling;
    /// previously recorded observations are retained as given.
    pub fn set_bounds(&self, domain: Domain) -> Result<()> {
        self.store.lock().unwrap().set_domain(domain)
    }

    /// Phase of the convenience maximize loop
    pub fn state(&self) -> EngineState {
        *self.state.lock().unwrap()
    }

    /// Registers `subscriber` under `token` for `event`
    pub fn subscribe(&self, event: OptEvent, token: impl Into<String>, subscriber: Subscriber) {
        self.bus.subscribe(event, token, subscriber);
    }

    /// Removes one registration of `token` for `event` (no-op when absent)
    pub fn unsubscribe(&self, event: OptEvent, token: &str) {
        self.bus.unsubscribe(event, token);
    }

    /// Subscriber failures are isolated from the optimization loop: they are
    /// reported, never propagated.
    fn fire_logged(&self, event: OptEvent) {
        if let Err(failure) = self.bus.fire(event, self) {
            log::warn!("{event:?} subscriber failure ignored by the loop: {failure}");
        }
    }

    /// Splits an independent random stream off the engine's master RNG.
    fn split_rng(&self) -> Xoshiro256Plus {
        let mut master = self.rng.lock().unwrap();
        let child = master.clone();
        master.jump();
        child
    }

    fn fit_surrogate(
        &self,
        model: &mut dyn SurrogateModel,
        x: &Array2<f64>,
        y: &Array1<f64>,
        domain: &Domain,
    ) -> Result<()> {
        match model.fit(&x.view(), &y.view()) {
            Ok(()) => Ok(()),
            Err(failure) => {
                // one retry with jittered inputs, then give up: proceeding
                // with a meaningless surrogate would poison every suggestion
                log::warn!(
                    "surrogate fit failed on {} observations ({failure}), retrying with jittered inputs",
                    y.len()
                );
                let mut rng = self.split_rng();
                let noise = Array::random_using(x.raw_dim(), Uniform::new(-1., 1.), &mut rng);
                let lower = domain.xlimits().column(0).to_owned();
                let scale = (&domain.xlimits().column(1).to_owned() - &lower)
                    .mapv(|span| span * FIT_JITTER);
                let mut x_jittered = x + &(noise * &scale);
                for mut row in x_jittered.rows_mut() {
                    for (j, v) in row.iter_mut().enumerate() {
                        *v = v.clamp(domain.xlimits()[[j, 0]], domain.xlimits()[[j, 1]]);
                    }
                }
                model
                    .fit(&x_jittered.view(), &y.view())
                    .map_err(|reason| OptError::DegenerateSurrogate { reason })
            }
        }
    }

    fn apply_domain_reduction(&self) -> Result<()> {
        let mut transform = self.transform.lock().unwrap();
        if let Some(transform) = transform.as_mut() {
            let mut store = self.store.lock().unwrap();
            let next = transform.transform(&store)?;
            store.set_domain(next)?;
        }
        Ok(())
    }
}
