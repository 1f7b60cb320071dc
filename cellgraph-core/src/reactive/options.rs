//! Per-cell options.
//!
//! A cell can carry two fallback values and two hooks:
//!
//! - a placeholder, read while the cell is pending,
//! - a fallback, read while the cell is in error,
//! - `on_result`, run after every successful current-generation result,
//! - `on_error`, run after every current-generation failure.
//!
//! [`CellOptions::default_value`] sets the placeholder and fallback together.

use std::fmt;
use std::sync::Arc;

use super::snapshot::ArcAny;
use crate::error::CellError;
use crate::graph::CellStatus;

pub(crate) type ResultHook = Arc<dyn Fn(&ArcAny) + Send + Sync>;
pub(crate) type ErrorHook = Arc<dyn Fn(&CellError) + Send + Sync>;

/// Options for [`CellGraph::define`](super::CellGraph::define).
///
/// # Example
///
/// ```rust,ignore
/// let studies = graph.define(
///     "displayed_studies",
///     &["physical_studies", "virtual_studies"],
///     compute,
///     CellOptions::new()
///         .default_value(Vec::new())
///         .on_error(|err| tracing::warn!(%err, "studies unavailable")),
/// )?;
/// ```
pub struct CellOptions<T> {
    placeholder: Option<Arc<T>>,
    fallback: Option<Arc<T>>,
    on_result: Option<Arc<dyn Fn(&T) + Send + Sync>>,
    on_error: Option<ErrorHook>,
}

impl<T> CellOptions<T>
where
    T: Send + Sync + 'static,
{
    /// No fallbacks, no hooks.
    pub fn new() -> Self {
        Self {
            placeholder: None,
            fallback: None,
            on_result: None,
            on_error: None,
        }
    }

    /// Value read while the cell is pending.
    pub fn placeholder(mut self, value: T) -> Self {
        self.placeholder = Some(Arc::new(value));
        self
    }

    /// Value read while the cell is in error.
    pub fn fallback(mut self, value: T) -> Self {
        self.fallback = Some(Arc::new(value));
        self
    }

    /// Value read while the cell is pending or in error.
    pub fn default_value(mut self, value: T) -> Self {
        let value = Arc::new(value);
        self.placeholder = Some(Arc::clone(&value));
        self.fallback = Some(value);
        self
    }

    /// Run `hook` with every result that lands in the current generation.
    pub fn on_result<F>(mut self, hook: F) -> Self
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.on_result = Some(Arc::new(hook));
        self
    }

    /// Run `hook` with every failure that lands in the current generation.
    pub fn on_error<F>(mut self, hook: F) -> Self
    where
        F: Fn(&CellError) + Send + Sync + 'static,
    {
        self.on_error = Some(Arc::new(hook));
        self
    }

    pub(crate) fn erase(self) -> ErasedOptions {
        let on_result = self.on_result.map(|hook| -> ResultHook {
            Arc::new(move |value: &ArcAny| {
                if let Some(value) = (**value).downcast_ref::<T>() {
                    hook(value);
                }
            })
        });

        ErasedOptions {
            placeholder: self.placeholder.map(|v| v as ArcAny),
            fallback: self.fallback.map(|v| v as ArcAny),
            on_result,
            on_error: self.on_error,
        }
    }
}

impl<T: Send + Sync + 'static> Default for CellOptions<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for CellOptions<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CellOptions")
            .field("placeholder", &self.placeholder.is_some())
            .field("fallback", &self.fallback.is_some())
            .field("on_result", &self.on_result.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

/// Options with the value type erased, as stored in the cell table.
#[derive(Default)]
pub(crate) struct ErasedOptions {
    pub(crate) placeholder: Option<ArcAny>,
    pub(crate) fallback: Option<ArcAny>,
    pub(crate) on_result: Option<ResultHook>,
    pub(crate) on_error: Option<ErrorHook>,
}

impl ErasedOptions {
    /// What a read returns for a cell in `status` whose last successful
    /// value is `value`.
    pub(crate) fn readable(&self, status: CellStatus, value: Option<&ArcAny>) -> Option<ArcAny> {
        match status {
            CellStatus::Pending => self.placeholder.clone(),
            CellStatus::Complete => value.cloned(),
            CellStatus::Error => self.fallback.clone(),
        }
    }
}
