//! Data source abstraction for compiled query plans

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::core::error::HateoasError;
use crate::core::paging::PagedResults;
use crate::core::query::QueryPlan;

/// A backend able to execute a [`QueryPlan`] over records of type `E`
///
/// Implementations apply the filter, the sort and the paging window, and
/// report the total number of records matching the filter. They should
/// observe `cancel` at reasonable intervals and stop early when it fires.
///
/// Errors are opaque to the toolkit; returning
/// `HateoasError::Cancelled` wrapped in the `anyhow::Error` is recognised
/// and surfaced as a cancellation.
#[async_trait]
pub trait DataSource<E>: Send + Sync {
    async fn fetch(
        &self,
        plan: &QueryPlan,
        cancel: &CancellationToken,
    ) -> anyhow::Result<PagedResults<E>>;
}

/// Run a plan against a data source, racing it against cancellation
///
/// Nothing is retried. A fetch that fails after cancellation was requested
/// is reported as cancelled rather than as a source failure.
pub async fn execute<E, S>(
    source: &S,
    plan: &QueryPlan,
    cancel: &CancellationToken,
) -> Result<PagedResults<E>, HateoasError>
where
    S: DataSource<E> + ?Sized,
{
    if cancel.is_cancelled() {
        tracing::warn!(resource = plan.resource, "query cancelled before fetch");
        return Err(HateoasError::Cancelled);
    }

    let outcome = tokio::select! {
        biased;
        _ = cancel.cancelled() => None,
        result = source.fetch(plan, cancel) => Some(result),
    };

    match outcome {
        None => {
            tracing::warn!(resource = plan.resource, "query cancelled during fetch");
            Err(HateoasError::Cancelled)
        }
        Some(Ok(page)) => {
            tracing::debug!(
                resource = plan.resource,
                returned = page.items.len(),
                total = page.total_size,
                "query executed"
            );
            Ok(page)
        }
        Some(Err(err)) => match err.downcast::<HateoasError>() {
            Ok(HateoasError::Cancelled) => {
                tracing::warn!(resource = plan.resource, "data source observed cancellation");
                Err(HateoasError::Cancelled)
            }
            Ok(other) => Err(other),
            Err(_) if cancel.is_cancelled() => Err(HateoasError::Cancelled),
            Err(err) => {
                tracing::error!(resource = plan.resource, error = %err, "data source failed");
                Err(HateoasError::Source(err))
            }
        },
    }
}
