use anyhow::Result;
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};
use tokio::sync::watch;
use tracing::{info, warn};

use crate::{
    model::{RefreshPhase, ViewModel, WidgetState},
    source::{CurrentConditionsSource, ForecastSource},
};

/// Owns the card's state and runs fetch cycles against both sources.
///
/// State is published through a `watch` channel; the aggregator is its only writer.
#[derive(Debug)]
pub struct ViewModelAggregator {
    current: Arc<dyn CurrentConditionsSource>,
    forecast: Arc<dyn ForecastSource>,
    state: watch::Sender<WidgetState>,
    in_flight: AtomicUsize,
}

impl ViewModelAggregator {
    pub fn new(current: Arc<dyn CurrentConditionsSource>, forecast: Arc<dyn ForecastSource>) -> Self {
        let (state, _) = watch::channel(WidgetState::initial());
        Self { current, forecast, state, in_flight: AtomicUsize::new(0) }
    }

    pub fn subscribe(&self) -> watch::Receiver<WidgetState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> WidgetState {
        self.state.borrow().clone()
    }

    /// Run one fetch cycle.
    ///
    /// The state is flagged as loading before either request is sent and keeps
    /// the previous values until both requests succeed. On failure the phase
    /// becomes [`RefreshPhase::Failed`], the last good view is kept, and the
    /// error is returned. Dropping the future mid-cycle counts as a failure.
    pub async fn refresh(&self) -> Result<ViewModel> {
        let cycle = self.begin();

        match tokio::try_join!(self.current.fetch(), self.forecast.fetch()) {
            Ok((observation, forecast)) => {
                let view = ViewModel::merge(observation, forecast);
                info!(
                    location = %view.observation.location_name,
                    temperature = view.observation.temperature,
                    "weather card refreshed"
                );

                cycle.settle(|state, still_running| {
                    state.view = ViewModel { is_loading: still_running, ..view.clone() };
                    state.phase =
                        if still_running { RefreshPhase::Refreshing } else { RefreshPhase::Idle };
                });
                Ok(view)
            }
            Err(err) => {
                let reason = format!("{err:#}");
                warn!(error = %reason, "weather card refresh failed");
                cycle.settle(|state, still_running| {
                    if !still_running {
                        state.fail(reason);
                    }
                });
                Err(err)
            }
        }
    }

    fn begin(&self) -> Cycle<'_> {
        self.state.send_modify(|state| {
            self.in_flight.fetch_add(1, Ordering::SeqCst);
            state.phase = RefreshPhase::Refreshing;
            state.view.is_loading = true;
        });
        Cycle { agg: self, settled: false }
    }
}

/// One outstanding refresh. The counter only changes under the watch lock,
/// so a count and the state published with it are always consistent.
struct Cycle<'a> {
    agg: &'a ViewModelAggregator,
    settled: bool,
}

impl Cycle<'_> {
    /// Leave the cycle and publish its outcome; `update` learns whether other cycles remain.
    fn settle(mut self, update: impl FnOnce(&mut WidgetState, bool)) {
        self.settled = true;
        let agg = self.agg;
        agg.state.send_modify(|state| {
            let still_running = agg.in_flight.fetch_sub(1, Ordering::SeqCst) > 1;
            update(state, still_running);
        });
    }
}

impl Drop for Cycle<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let agg = self.agg;
        warn!("weather card refresh cancelled");
        agg.state.send_modify(|state| {
            if agg.in_flight.fetch_sub(1, Ordering::SeqCst) == 1 {
                state.fail("refresh cancelled".to_string());
            }
        });
    }
}

impl WidgetState {
    fn fail(&mut self, reason: String) {
        self.phase = RefreshPhase::Failed { reason };
        self.view.is_loading = false;
    }
}
