//! GraphSession: owns one view's graph, layout, pins and focus.
//!
//! Builds and layouts run on the blocking pool. The session lock is never
//! held across a computation, so hover, select and pin calls stay responsive
//! while a refresh is in flight. Results are installed only if their
//! generation is still current.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{broadcast, Mutex};
use tracing::Instrument;

use notemap_core::{
    BuildOutput, CancelToken, CoreError, DataQualityWarning, Dimensionality, EmbeddingSource,
    GraphParams, GraphSnapshot, LayoutStrategy, MapConfig, NoteGraph, NoteId, Position,
    SimilarityGraphBuilder,
};
use notemap_layout::{LayoutEngine, LayoutError, LayoutResult, PinOverlay};

use crate::error::SessionError;
use crate::events::{SessionEvent, EVENT_CHANNEL_CAPACITY};
use crate::highlight::{Focus, HighlightSet};
use crate::state::{PendingBuild, RefreshOutcome, SessionId, SessionInner, SessionState};

/// Cheap to clone; clones share the same session.
#[derive(Clone)]
pub struct GraphSession {
    id: SessionId,
    source: Arc<dyn EmbeddingSource>,
    engine: LayoutEngine,
    inner: Arc<Mutex<SessionInner>>,
    pins: PinOverlay,
    events: broadcast::Sender<SessionEvent>,
}

impl GraphSession {
    /// Creates an empty session. Invalid configuration is rejected.
    pub fn new(source: Arc<dyn EmbeddingSource>, config: MapConfig) -> Result<Self, SessionError> {
        let engine = LayoutEngine::with_seed(config.seed);
        Self::with_engine(source, config, engine)
    }

    /// Like [`new`](Self::new) with custom layout parameters. The engine's
    /// own seed is used; `config.seed` is ignored.
    pub fn with_engine(
        source: Arc<dyn EmbeddingSource>,
        config: MapConfig,
        engine: LayoutEngine,
    ) -> Result<Self, SessionError> {
        config.validate()?;
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let session = GraphSession {
            id: SessionId::new(),
            source,
            engine,
            inner: Arc::new(Mutex::new(SessionInner::new(config))),
            pins: PinOverlay::new(),
            events,
        };
        tracing::info!(session = %session.id, "session created");
        Ok(session)
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    // -----------------------------------------------------------------------
    // Refresh and re-layout
    // -----------------------------------------------------------------------

    /// Rebuilds the graph from the source and lays it out.
    ///
    /// Any in-flight computation is cancelled first and resolves as
    /// [`RefreshOutcome::Superseded`].
    pub async fn refresh(&self) -> Result<RefreshOutcome, SessionError> {
        let (generation, token, params) = {
            let mut inner = self.inner.lock().await;
            let params = inner.config.graph.clone();
            let (generation, token) = begin_build(&mut inner);
            (generation, token, params)
        };
        let span = tracing::info_span!("refresh", session = %self.id, generation);
        self.run_refresh(generation, token, params).instrument(span).await
    }

    /// Replaces the graph parameters and refreshes. Invalid parameters are
    /// rejected and nothing changes.
    ///
    /// If the rebuild fails or is cancelled before anything newer starts,
    /// the previous parameters are put back so the config keeps describing
    /// the installed graph.
    pub async fn update_filters(&self, params: GraphParams) -> Result<RefreshOutcome, SessionError> {
        params.validate()?;
        let (generation, token, previous) = {
            let mut inner = self.inner.lock().await;
            let previous = std::mem::replace(&mut inner.config.graph, params.clone());
            let (generation, token) = begin_build(&mut inner);
            (generation, token, previous)
        };
        let span = tracing::info_span!("update_filters", session = %self.id, generation);
        let outcome = self.run_refresh(generation, token, params).instrument(span).await;

        if matches!(outcome, Err(_) | Ok(RefreshOutcome::Cancelled)) {
            let mut inner = self.inner.lock().await;
            if inner.generation == generation {
                inner.config.graph = previous;
                tracing::info!(session = %self.id, generation, "restored previous graph parameters");
            }
        }
        outcome
    }

    /// Switches the layout strategy, reusing the current graph.
    pub async fn change_strategy(&self, strategy: LayoutStrategy) -> Result<RefreshOutcome, SessionError> {
        self.relayout(move |config| config.strategy = strategy).await
    }

    /// Like [`change_strategy`](Self::change_strategy) with the strategy
    /// given by name. Unknown names are rejected.
    pub async fn change_strategy_by_name(&self, name: &str) -> Result<RefreshOutcome, SessionError> {
        let strategy: LayoutStrategy = name.parse()?;
        self.change_strategy(strategy).await
    }

    pub async fn set_dimensionality(&self, dims: Dimensionality) -> Result<RefreshOutcome, SessionError> {
        self.relayout(move |config| config.dimensionality = dims).await
    }

    async fn run_refresh(
        &self,
        generation: u64,
        token: CancelToken,
        params: GraphParams,
    ) -> Result<RefreshOutcome, SessionError> {
        tracing::info!("refresh started");

        let source = Arc::clone(&self.source);
        let build_token = token.clone();
        let built = tokio::task::spawn_blocking(move || -> Result<Option<BuildOutput>, SessionError> {
            let documents = source.list_documents(params.tags())?;
            let builder = SimilarityGraphBuilder::new(params)?;
            match builder.build_with_cancel(&documents, &build_token) {
                Ok(output) => Ok(Some(output)),
                Err(CoreError::Cancelled) => Ok(None),
                Err(err) => Err(SessionError::from(err)),
            }
        })
        .await
        .map_err(SessionError::from)
        .and_then(|result| result);

        let output = match built {
            Ok(Some(output)) => output,
            Ok(None) => return Ok(self.inner.lock().await.stale_outcome(generation)),
            Err(err) => return self.fail(generation, &token, err).await,
        };

        // Phase boundary: the strategy is read here so a change issued while
        // building is picked up.
        let (pending, strategy, dims, previous) = {
            let mut inner = self.inner.lock().await;
            if !inner.is_current(generation, &token) {
                tracing::info!("discarding stale build");
                return Ok(inner.stale_outcome(generation));
            }
            tracing::debug!(
                nodes = output.graph.node_count(),
                edges = output.graph.edge_count(),
                warnings = output.warnings.len(),
                "graph built"
            );
            let pending = PendingBuild {
                graph: Arc::new(output.graph),
                warnings: Some(output.warnings),
            };
            inner.state = SessionState::LayingOut;
            inner.pending = Some(pending.clone());
            (
                pending,
                inner.config.strategy,
                inner.config.dimensionality,
                inner.layout.clone(),
            )
        };

        self.lay_out(generation, token, pending, strategy, dims, previous).await
    }

    async fn relayout<F>(&self, update: F) -> Result<RefreshOutcome, SessionError>
    where
        F: FnOnce(&mut MapConfig),
    {
        let (generation, token, pending, strategy, dims, previous) = {
            let mut inner = self.inner.lock().await;
            update(&mut inner.config);
            let pending = match inner.state {
                SessionState::Empty | SessionState::Building => {
                    tracing::debug!(session = %self.id, state = ?inner.state, "layout change deferred");
                    return Ok(RefreshOutcome::Deferred);
                }
                SessionState::LayingOut => match inner.pending.clone() {
                    Some(pending) => pending,
                    None => return Ok(RefreshOutcome::Deferred),
                },
                SessionState::Settled => PendingBuild {
                    graph: Arc::clone(&inner.graph),
                    warnings: None,
                },
            };
            let (generation, token) = inner.begin();
            inner.state = SessionState::LayingOut;
            inner.pending = Some(pending.clone());
            (
                generation,
                token,
                pending,
                inner.config.strategy,
                inner.config.dimensionality,
                inner.layout.clone(),
            )
        };
        let span = tracing::info_span!("relayout", session = %self.id, generation, %strategy);
        self.lay_out(generation, token, pending, strategy, dims, previous)
            .instrument(span)
            .await
    }

    async fn lay_out(
        &self,
        generation: u64,
        token: CancelToken,
        pending: PendingBuild,
        strategy: LayoutStrategy,
        dims: Dimensionality,
        previous: Option<LayoutResult>,
    ) -> Result<RefreshOutcome, SessionError> {
        let engine = self.engine.clone();
        let pins = self.pins.clone();
        let graph = Arc::clone(&pending.graph);
        let layout_token = token.clone();
        let laid_out = tokio::task::spawn_blocking(move || {
            engine.layout_with(&graph, strategy, dims, previous.as_ref(), &pins, &layout_token)
        })
        .await;

        match laid_out {
            Ok(Ok(result)) => self.install(generation, &token, pending, result).await,
            Ok(Err(LayoutError::Cancelled)) => Ok(self.inner.lock().await.stale_outcome(generation)),
            Ok(Err(err)) => self.fail(generation, &token, err.into()).await,
            Err(join) => self.fail(generation, &token, join.into()).await,
        }
    }

    /// Installs a finished layout if its generation is still current.
    async fn install(
        &self,
        generation: u64,
        token: &CancelToken,
        pending: PendingBuild,
        mut result: LayoutResult,
    ) -> Result<RefreshOutcome, SessionError> {
        let mut inner = self.inner.lock().await;
        if !inner.is_current(generation, token) {
            tracing::info!("discarding stale layout");
            return Ok(inner.stale_outcome(generation));
        }

        // Pins written after the simulation's last step still win.
        for (id, placement) in result.positions.iter_mut() {
            match self.pins.get(id) {
                Some(position) => {
                    placement.position = position;
                    placement.pinned = true;
                }
                None => placement.pinned = false,
            }
        }

        let mut graph = Arc::unwrap_or_clone(pending.graph);
        graph.apply_positions(|id| result.get(id).map(|p| (p.position, p.pinned)));
        let dropped = self.pins.retain(|id| graph.contains(id));
        if !dropped.is_empty() {
            tracing::info!(count = dropped.len(), "dropped pins of vanished notes");
        }

        let nodes = result.len();
        let strategy = result.strategy;
        inner.graph = Arc::new(graph);
        inner.layout = Some(result);
        inner.pending = None;
        inner.cancel = None;
        inner.state = SessionState::Settled;

        if let Some(warnings) = pending.warnings {
            inner.warnings = warnings;
            if !inner.warnings.is_empty() {
                tracing::warn!(count = inner.warnings.len(), "documents excluded from the graph");
                self.emit(SessionEvent::DataQualityWarnings {
                    warnings: inner.warnings.clone(),
                });
            }
        }
        if let Some(changed) = inner.recompute_highlight() {
            self.emit(SessionEvent::highlight(changed.as_ref()));
        }
        self.emit(SessionEvent::LayoutSettled {
            generation,
            strategy,
            nodes,
        });
        tracing::info!(nodes, %strategy, "layout settled");
        Ok(RefreshOutcome::Settled)
    }

    /// Reports a failure of the current generation, or the stale outcome
    /// when the failing computation was already abandoned.
    async fn fail(
        &self,
        generation: u64,
        token: &CancelToken,
        err: SessionError,
    ) -> Result<RefreshOutcome, SessionError> {
        let mut inner = self.inner.lock().await;
        if !inner.is_current(generation, token) {
            return Ok(inner.stale_outcome(generation));
        }
        tracing::warn!(error = %err, "computation failed");
        inner.abandon(generation);
        Err(err)
    }

    /// Cancels the in-flight computation and restores the previous state.
    /// Returns `false` when nothing was in flight.
    pub async fn cancel(&self) -> bool {
        let mut inner = self.inner.lock().await;
        let Some(token) = inner.cancel.take() else {
            return false;
        };
        token.cancel();
        inner.pending = None;
        inner.state = inner.resting_state();
        let generation = inner.generation;
        tracing::info!(session = %self.id, generation, "refresh cancelled");
        self.emit(SessionEvent::RefreshCancelled { generation });
        true
    }

    /// Cancels in-flight work and releases the graph, layout and pins.
    pub async fn shutdown(&self) {
        let mut inner = self.inner.lock().await;
        if let Some(token) = inner.cancel.take() {
            token.cancel();
        }
        inner.pending = None;
        inner.layout = None;
        inner.graph = Arc::new(NoteGraph::empty());
        inner.focus = Focus::default();
        inner.highlight = None;
        inner.warnings.clear();
        inner.state = SessionState::Empty;
        self.pins.clear();
        tracing::info!(session = %self.id, "session shut down");
    }

    // -----------------------------------------------------------------------
    // Pins
    // -----------------------------------------------------------------------

    /// Fixes a node at `position`. The id must be in the installed or pending
    /// graph. An in-flight layout picks the pin up at its next step.
    pub async fn pin_node(&self, id: NoteId, position: Position) -> Result<(), SessionError> {
        if !position.is_finite() {
            return Err(SessionError::Input(CoreError::InvalidConfig {
                field: "position",
                reason: "must be finite".into(),
            }));
        }
        let mut inner = self.inner.lock().await;
        let installed = inner.graph.contains(&id);
        let pending = inner.pending.as_ref().is_some_and(|p| p.graph.contains(&id));
        if !installed && !pending {
            return Err(SessionError::UnknownNode { id });
        }

        self.pins.pin(id.clone(), position);
        if let Some(placement) = inner.layout.as_mut().and_then(|l| l.positions.get_mut(&id)) {
            placement.position = position;
            placement.pinned = true;
        }
        if installed {
            Arc::make_mut(&mut inner.graph).apply_positions(|n| (n == &id).then_some((position, true)));
        }
        tracing::debug!(session = %self.id, %id, "node pinned");
        Ok(())
    }

    /// Releases a pin. Returns `false` when the node was not pinned.
    pub async fn unpin_node(&self, id: &NoteId) -> bool {
        let mut inner = self.inner.lock().await;
        if !self.pins.unpin(id) {
            return false;
        }
        let mut current = None;
        if let Some(placement) = inner.layout.as_mut().and_then(|l| l.positions.get_mut(id)) {
            placement.pinned = false;
            current = Some(placement.position);
        }
        if let Some(position) = current {
            Arc::make_mut(&mut inner.graph).apply_positions(|n| (n == id).then_some((position, false)));
        }
        tracing::debug!(session = %self.id, %id, "node unpinned");
        true
    }

    pub fn pins(&self) -> HashMap<NoteId, Position> {
        self.pins.snapshot()
    }

    // -----------------------------------------------------------------------
    // Focus and highlight
    // -----------------------------------------------------------------------

    /// Sets or clears the hovered node and returns the resulting highlight.
    pub async fn hover(&self, id: Option<NoteId>) -> Result<Option<HighlightSet>, SessionError> {
        self.set_focus(id, |focus, id| focus.hovered = id).await
    }

    /// Sets or clears the selected node and returns the resulting highlight.
    pub async fn select(&self, id: Option<NoteId>) -> Result<Option<HighlightSet>, SessionError> {
        self.set_focus(id, |focus, id| focus.selected = id).await
    }

    pub async fn clear_focus(&self) {
        let mut inner = self.inner.lock().await;
        inner.focus = Focus::default();
        if let Some(changed) = inner.recompute_highlight() {
            self.emit(SessionEvent::highlight(changed.as_ref()));
        }
    }

    async fn set_focus<F>(&self, id: Option<NoteId>, apply: F) -> Result<Option<HighlightSet>, SessionError>
    where
        F: FnOnce(&mut Focus, Option<NoteId>),
    {
        let mut inner = self.inner.lock().await;
        if let Some(id) = &id {
            if !inner.graph.contains(id) {
                return Err(SessionError::UnknownNode { id: id.clone() });
            }
        }
        apply(&mut inner.focus, id);
        if let Some(changed) = inner.recompute_highlight() {
            self.emit(SessionEvent::highlight(changed.as_ref()));
        }
        Ok(inner.highlight.clone())
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub async fn state(&self) -> SessionState {
        self.inner.lock().await.state
    }

    pub async fn generation(&self) -> u64 {
        self.inner.lock().await.generation
    }

    /// The installed graph. Empty until the first refresh settles.
    pub async fn graph(&self) -> Arc<NoteGraph> {
        Arc::clone(&self.inner.lock().await.graph)
    }

    pub async fn snapshot(&self) -> GraphSnapshot {
        self.inner.lock().await.graph.snapshot()
    }

    pub async fn layout(&self) -> Option<LayoutResult> {
        self.inner.lock().await.layout.clone()
    }

    pub async fn highlight(&self) -> Option<HighlightSet> {
        self.inner.lock().await.highlight.clone()
    }

    pub async fn config(&self) -> MapConfig {
        self.inner.lock().await.config.clone()
    }

    pub async fn warnings(&self) -> Vec<DataQualityWarning> {
        self.inner.lock().await.warnings.clone()
    }

    pub async fn dismiss_warnings(&self) {
        self.inner.lock().await.warnings.clear();
    }

    fn emit(&self, event: SessionEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

/// Starts a new build generation.
fn begin_build(inner: &mut SessionInner) -> (u64, CancelToken) {
    let (generation, token) = inner.begin();
    inner.state = SessionState::Building;
    inner.pending = None;
    (generation, token)
}
