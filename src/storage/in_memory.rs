//! In-memory data source for testing and development

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use std::sync::{Arc, RwLock};
use tokio_util::sync::CancellationToken;

use crate::core::descriptor::FieldSource;
use crate::core::error::HateoasError;
use crate::core::paging::PagedResults;
use crate::core::query::QueryPlan;
use crate::core::store::DataSource;

/// Records between two cancellation checks while filtering
const CANCEL_CHECK_INTERVAL: usize = 256;

/// In-memory data source evaluating compiled plans directly
///
/// Records keep their insertion order, which is also the tie-break order
/// for sorting. Uses RwLock for thread-safe access.
#[derive(Clone)]
pub struct InMemoryDataSource<E> {
    records: Arc<RwLock<Vec<E>>>,
}

impl<E> InMemoryDataSource<E> {
    /// Create an empty data source
    pub fn new() -> Self {
        Self::from_records(Vec::new())
    }

    pub fn from_records(records: Vec<E>) -> Self {
        Self {
            records: Arc::new(RwLock::new(records)),
        }
    }

    pub fn insert(&self, record: E) -> Result<()> {
        let mut records = self
            .records
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;
        records.push(record);
        Ok(())
    }

    pub fn len(&self) -> Result<usize> {
        let records = self
            .records
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;
        Ok(records.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// First record matching a predicate
    pub fn find<F>(&self, predicate: F) -> Result<Option<E>>
    where
        E: Clone,
        F: Fn(&E) -> bool,
    {
        let records = self
            .records
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;
        Ok(records.iter().find(|r| predicate(r)).cloned())
    }
}

impl<E> Default for InMemoryDataSource<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<E> DataSource<E> for InMemoryDataSource<E>
where
    E: FieldSource + Clone + Send + Sync,
{
    async fn fetch(&self, plan: &QueryPlan, cancel: &CancellationToken) -> Result<PagedResults<E>> {
        let records = self
            .records
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;

        let mut matched: Vec<&E> = Vec::new();
        for (index, record) in records.iter().enumerate() {
            if index % CANCEL_CHECK_INTERVAL == 0 && cancel.is_cancelled() {
                return Err(HateoasError::Cancelled.into());
            }
            if plan.filter.matches(record) {
                matched.push(record);
            }
        }

        plan.sort.sort_refs(&mut matched);
        if cancel.is_cancelled() {
            return Err(HateoasError::Cancelled.into());
        }

        let page = plan.window.apply(matched);
        Ok(page.map(E::clone))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::descriptor::{FieldDescriptor, FieldSet};
    use crate::core::field::{FieldValue, ValueKind};
    use crate::core::paging::PagingWindow;
    use crate::core::search::SearchCompiler;
    use crate::core::sort::SortCompiler;
    use crate::core::store::execute;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        name: String,
        score: i64,
    }

    impl FieldSource for Row {
        fn field_value(&self, source: &str) -> Option<FieldValue> {
            match source {
                "name" => Some(self.name.clone().into()),
                "score" => Some(self.score.into()),
                _ => None,
            }
        }
    }

    fn fields() -> Arc<FieldSet> {
        Arc::new(FieldSet::new(
            "rows",
            vec![
                FieldDescriptor::new("name", "name", ValueKind::String)
                    .searchable()
                    .sortable(),
                FieldDescriptor::new("score", "score", ValueKind::Integer)
                    .searchable()
                    .sortable(),
            ],
        ))
    }

    fn plan(filter: &[&str], sort: &[&str], offset: usize, limit: usize) -> QueryPlan {
        QueryPlan {
            resource: "rows",
            filter: SearchCompiler::new(fields()).compile(filter).unwrap(),
            sort: SortCompiler::new(fields()).compile(sort).unwrap(),
            window: PagingWindow { offset, limit },
        }
    }

    fn source(count: i64) -> InMemoryDataSource<Row> {
        InMemoryDataSource::from_records(
            (0..count)
                .map(|i| Row {
                    name: format!("row-{:03}", i),
                    score: i % 3,
                })
                .collect(),
        )
    }

    #[tokio::test]
    async fn test_filter_sort_page() {
        let source = source(10);
        let page = execute(
            &source,
            &plan(&["score eq 1"], &["name:desc"], 1, 2),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(page.total_size, 3);
        let names: Vec<_> = page.items.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["row-004", "row-001"]);
    }

    #[tokio::test]
    async fn test_repeated_queries_are_identical() {
        let source = source(50);
        let plan = plan(&[], &["score"], 10, 10);
        let token = CancellationToken::new();
        let first = execute(&source, &plan, &token).await.unwrap();
        let second = execute(&source, &plan, &token).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_cancelled_fetch_returns_no_page() {
        let source = source(1_000);
        let token = CancellationToken::new();
        token.cancel();
        let result = source.fetch(&plan(&[], &[], 0, 10), &token).await;
        let err = result.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<HateoasError>(),
            Some(HateoasError::Cancelled)
        ));
    }

    #[tokio::test]
    async fn test_insert_and_find() {
        let source = InMemoryDataSource::new();
        assert!(source.is_empty().unwrap());
        source
            .insert(Row {
                name: "a".to_string(),
                score: 1,
            })
            .unwrap();
        assert_eq!(source.len().unwrap(), 1);
        assert!(source.find(|r: &Row| r.score == 1).unwrap().is_some());
    }
}
