//! Data Access
//!
//! The orchestrator. Every operation family funnels into one generic pass:
//!
//! ```text
//! pre-callback → "ing" event → filters (pre) → driver → filters (post)
//!     → "ed" event → post-callback → extract result → dispose
//! ```
//!
//! The driver call is the only step that can suspend in async variants.
//! The context is disposed on every exit path, after the result is read.

use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use super::args::SchemaSpec;
use super::cancel::Cancellation;
use super::context::{ContextBase, DataContext, OperationKind};
use super::driver::DataDriver;
use super::events::{ErrorEvent, Events};
use super::filter::{FilterChain, FilterSnapshot};
use super::guard::ContextGuard;
use super::hooks::Hooks;
use crate::config::DataAccessConfig;
use crate::errors::{DataAccessError, DataResult};
use crate::naming::{DataAccessNaming, Model, Naming};
use crate::observability::{log_event_at, AccessMetrics, Event, Severity};
use crate::schema::{Schema, SchemaParser};
use crate::sequence::{resolve_sequence, Sequence, SequenceProvider};

/// Entry point for all data operations against one driver
pub struct DataAccess {
    name: String,
    driver: Arc<dyn DataDriver>,
    naming: Arc<dyn Naming>,
    schema: OnceLock<Arc<dyn SchemaParser>>,
    sequence: RwLock<Option<Arc<dyn Sequence>>>,
    sequence_provider: Option<Arc<dyn SequenceProvider>>,
    filters: FilterChain,
    events: Events,
    metrics: AccessMetrics,
    /// Overrides the process-wide log threshold for this instance
    log_level: Option<Severity>,
}

impl DataAccess {
    /// Create an instance with an empty naming map
    pub fn new(name: impl Into<String>, driver: Arc<dyn DataDriver>) -> Self {
        Self {
            name: name.into(),
            driver,
            naming: Arc::new(DataAccessNaming::new()),
            schema: OnceLock::new(),
            sequence: RwLock::new(None),
            sequence_provider: None,
            filters: FilterChain::new(),
            events: Events::new(),
            metrics: AccessMetrics::new(),
            log_level: None,
        }
    }

    /// Create an instance from configuration; `log_level` applies to this instance only
    pub fn from_config(config: &DataAccessConfig, driver: Arc<dyn DataDriver>) -> Self {
        Self::new(config.name.clone(), driver)
            .with_naming(config.naming())
            .with_log_level(config.log_level)
    }

    pub fn with_log_level(mut self, level: Severity) -> Self {
        self.log_level = Some(level);
        self
    }

    pub fn log_level(&self) -> Option<Severity> {
        self.log_level
    }

    pub fn with_naming(mut self, naming: impl Naming + 'static) -> Self {
        self.naming = Arc::new(naming);
        self
    }

    pub fn with_sequence_provider(mut self, provider: Arc<dyn SequenceProvider>) -> Self {
        self.sequence_provider = Some(provider);
        self
    }

    /// Application name of this instance
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn driver(&self) -> &Arc<dyn DataDriver> {
        &self.driver
    }

    pub fn naming(&self) -> &dyn Naming {
        self.naming.as_ref()
    }

    /// Storage name of model `T`
    pub fn name_of<T: Model>(&self) -> DataResult<String> {
        self.naming.resolve(T::NAME)
    }

    pub fn filters(&self) -> &FilterChain {
        &self.filters
    }

    pub fn filters_mut(&mut self) -> &mut FilterChain {
        &mut self.filters
    }

    pub fn events(&self) -> &Events {
        &self.events
    }

    pub fn events_mut(&mut self) -> &mut Events {
        &mut self.events
    }

    pub fn metrics(&self) -> &AccessMetrics {
        &self.metrics
    }

    /// Schema parser, built by the driver on first use
    pub fn schema(&self) -> DataResult<Arc<dyn SchemaParser>> {
        if let Some(parser) = self.schema.get() {
            return Ok(Arc::clone(parser));
        }
        let parser = self.driver.create_schema()?;
        // A concurrent first call may have won; either instance is valid
        Ok(Arc::clone(self.schema.get_or_init(|| parser)))
    }

    /// Sequence generator, resolved from the provider on first use
    pub fn sequence(&self) -> DataResult<Arc<dyn Sequence>> {
        if let Some(sequence) = self
            .sequence
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            return Ok(Arc::clone(sequence));
        }

        let provider = self.sequence_provider.as_ref().ok_or_else(|| {
            DataAccessError::configuration(format!(
                "Data access '{}' has no sequence provider",
                self.name
            ))
        })?;
        let sequence = resolve_sequence(provider.as_ref(), &self.name)?;
        *self.sequence.write().unwrap_or_else(PoisonError::into_inner) = Some(Arc::clone(&sequence));

        self.log(Event::SequenceResolved, &[("name", self.name.as_str())]);
        Ok(sequence)
    }

    /// Replace the sequence generator
    pub fn set_sequence(&self, sequence: Arc<dyn Sequence>) {
        *self.sequence.write().unwrap_or_else(PoisonError::into_inner) = Some(sequence);
    }

    // ==================
    // Pipeline
    // ==================

    pub(crate) fn validate_name(name: &str) -> DataResult<()> {
        if name.trim().is_empty() {
            return Err(DataAccessError::invalid_argument("name must not be empty"));
        }
        Ok(())
    }

    /// Parse or pass through the requested schema; blank expressions mean none
    pub(crate) fn resolve_schema(
        &self,
        name: &str,
        spec: SchemaSpec,
        target: Option<&str>,
    ) -> DataResult<Option<Schema>> {
        match spec {
            SchemaSpec::None => Ok(None),
            SchemaSpec::Parsed(schema) => Ok(Some(schema)),
            SchemaSpec::Expression(expression) if expression.trim().is_empty() => Ok(None),
            SchemaSpec::Expression(expression) => {
                let schema = self.schema()?.parse(name, &expression, target)?;
                self.log(
                    Event::SchemaParsed,
                    &[("name", name), ("expression", expression.as_str())],
                );
                Ok(Some(schema))
            }
        }
    }

    /// Empty write payload: nothing is built and nothing fires
    pub(crate) fn skip(&self, kind: OperationKind, name: &str) {
        self.metrics.record(Event::PipelineSkipped);
        self.log(
            Event::PipelineSkipped,
            &[("operation", kind.as_str()), ("name", name)],
        );
    }

    /// One synchronous pass
    pub(crate) fn run<C, R>(
        &self,
        context: C,
        mut hooks: Hooks<'_, C>,
        extract: impl FnOnce(&mut C) -> R,
    ) -> DataResult<R>
    where
        C: DataContext,
    {
        let mut context = ContextGuard::new(context);

        if let Some(outcome) = self.gate(&mut *context, &mut hooks) {
            self.record(outcome, context.base());
            return Ok(extract(&mut *context));
        }

        let filters = self.filters.snapshot();
        filters.filtering(&mut *context);

        if let Err(error) = context.invoke(self.driver.as_ref()) {
            self.fail(context.base(), &error);
            return Err(error);
        }

        self.complete(&filters, &mut *context, &mut hooks);
        Ok(extract(&mut *context))
    }

    /// One asynchronous pass; only the driver call awaits
    pub(crate) async fn run_async<C, R, E>(
        &self,
        context: C,
        mut hooks: Hooks<'_, C>,
        cancel: &Cancellation,
        extract: E,
    ) -> DataResult<R>
    where
        C: DataContext,
        E: FnOnce(&mut C) -> R + Send,
    {
        let mut context = ContextGuard::new(context);

        if let Some(outcome) = self.gate(&mut *context, &mut hooks) {
            self.record(outcome, context.base());
            return Ok(extract(&mut *context));
        }

        let filters = self.filters.snapshot();
        filters.filtering(&mut *context);

        if let Err(error) = context.invoke_async(self.driver.as_ref(), cancel).await {
            self.fail(context.base(), &error);
            return Err(error);
        }

        self.complete(&filters, &mut *context, &mut hooks);
        Ok(extract(&mut *context))
    }

    /// Pre-callback, then "ing" event; `Some` when either stopped the pass
    fn gate<C: DataContext>(&self, context: &mut C, hooks: &mut Hooks<'_, C>) -> Option<Event> {
        if hooks.intercept(context) {
            return Some(Event::PipelineIntercepted);
        }
        if C::handlers(&self.events).raise_executing(context) {
            return Some(Event::PipelineCancelled);
        }
        None
    }

    fn complete<C: DataContext>(
        &self,
        filters: &FilterSnapshot,
        context: &mut C,
        hooks: &mut Hooks<'_, C>,
    ) {
        filters.filtered(context);
        C::handlers(&self.events).raise_executed(context);
        hooks.notify(context);
        self.record(Event::PipelineComplete, context.base());
    }

    fn fail(&self, base: &ContextBase, error: &DataAccessError) {
        self.events.raise_error(&ErrorEvent {
            kind: base.kind(),
            name: base.name(),
            context_id: base.id(),
            error,
        });
        self.metrics.record(Event::PipelineFailed);

        let context_id = base.id().to_string();
        let message = error.to_string();
        self.log(
            Event::PipelineFailed,
            &[
                ("context_id", context_id.as_str()),
                ("operation", base.kind().as_str()),
                ("name", base.name()),
                ("driver", self.driver.name()),
                ("code", error.code()),
                ("error", message.as_str()),
            ],
        );
    }

    fn log(&self, event: Event, fields: &[(&str, &str)]) {
        log_event_at(self.log_level, event, fields);
    }

    fn record(&self, event: Event, base: &ContextBase) {
        self.metrics.record(event);

        let context_id = base.id().to_string();
        let elapsed = base.elapsed_ms().to_string();
        self.log(
            event,
            &[
                ("context_id", context_id.as_str()),
                ("operation", base.kind().as_str()),
                ("name", base.name()),
                ("elapsed_ms", elapsed.as_str()),
            ],
        );
    }
}
