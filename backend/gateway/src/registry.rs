//! In-memory store of finished label results, newest last, bounded.

use std::collections::VecDeque;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use labelscan_core::AnalysisReport;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

/// What an upload returns and what the report endpoints serve.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelResult {
    pub id: Uuid,
    pub filename: String,
    /// Raw OCR output
    pub text: String,
    pub report: AnalysisReport,
    pub created_at: DateTime<Utc>,
    pub detail_url: String,
}

#[derive(Clone)]
pub struct ReportRegistry {
    results: Arc<RwLock<VecDeque<LabelResult>>>,
    capacity: usize,
}

impl ReportRegistry {
    pub fn new(capacity: usize) -> Self {
        Self {
            results: Arc::new(RwLock::new(VecDeque::new())),
            capacity: capacity.max(1),
        }
    }

    /// Store a result, dropping the oldest once full. Returns the dropped one.
    pub async fn insert(&self, result: LabelResult) -> Option<LabelResult> {
        let mut w = self.results.write().await;
        w.push_back(result);
        if w.len() > self.capacity {
            let evicted = w.pop_front();
            if let Some(old) = &evicted {
                debug!(id = %old.id, "Evicted oldest report");
            }
            return evicted;
        }
        None
    }

    pub async fn get(&self, id: &Uuid) -> Option<LabelResult> {
        let r = self.results.read().await;
        r.iter().find(|res| &res.id == id).cloned()
    }

    /// Most recent first.
    pub async fn list(&self, limit: Option<usize>) -> Vec<LabelResult> {
        let r = self.results.read().await;
        r.iter()
            .rev()
            .take(limit.unwrap_or(usize::MAX))
            .cloned()
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.results.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use labelscan_core::{NormalizedText, RawText};
    use std::collections::BTreeMap;

    fn result(n: u32) -> LabelResult {
        let id = Uuid::new_v4();
        LabelResult {
            id,
            filename: format!("{id}.jpg"),
            text: format!("나트륨 {n}mg"),
            report: AnalysisReport::new(
                RawText::new(""),
                NormalizedText::default(),
                BTreeMap::new(),
                BTreeMap::new(),
                vec![],
            ),
            created_at: Utc::now(),
            detail_url: format!("/api/reports/{id}"),
        }
    }

    #[tokio::test]
    async fn lists_most_recent_first() {
        let registry = ReportRegistry::new(10);
        for n in 1..=3 {
            registry.insert(result(n)).await;
        }
        let texts: Vec<_> = registry.list(None).await.into_iter().map(|r| r.text).collect();
        assert_eq!(texts, ["나트륨 3mg", "나트륨 2mg", "나트륨 1mg"]);
        assert_eq!(registry.list(Some(1)).await.len(), 1);
    }

    #[tokio::test]
    async fn evicts_oldest_when_full() {
        let registry = ReportRegistry::new(2);
        let first = result(1);
        let first_id = first.id;
        registry.insert(first).await;
        registry.insert(result(2)).await;
        let evicted = registry.insert(result(3)).await.unwrap();
        assert_eq!(evicted.id, first_id);
        assert_eq!(registry.len().await, 2);
        assert!(registry.get(&first_id).await.is_none());
    }
}
