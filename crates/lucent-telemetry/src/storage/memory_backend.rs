// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::storage::backend::{BackendStats, MetricsBackend};
use lucent_core::telemetry::{Metric, MetricId, MetricType, MetricsError, MetricsResult};
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory metrics backend over an `RwLock<HashMap>`.
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    storage: RwLock<HashMap<MetricId, Metric>>,
}

fn poisoned(op: &str) -> MetricsError {
    MetricsError::StorageError(format!("Failed to acquire {op} lock"))
}

impl InMemoryBackend {
    /// Creates an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty backend with room for `capacity` metrics.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            storage: RwLock::new(HashMap::with_capacity(capacity)),
        }
    }

    /// Counts stored metrics by type.
    pub fn stats(&self) -> BackendStats {
        let mut stats = BackendStats {
            total_metrics: 0,
            counter_count: 0,
            gauge_count: 0,
            histogram_count: 0,
        };
        if let Ok(storage) = self.storage.read() {
            stats.total_metrics = storage.len();
            for metric in storage.values() {
                match metric.value.metric_type() {
                    MetricType::Counter => stats.counter_count += 1,
                    MetricType::Gauge => stats.gauge_count += 1,
                    MetricType::Histogram => stats.histogram_count += 1,
                }
            }
        }
        stats
    }

    /// Metrics in `namespace`.
    pub fn metrics_by_namespace(&self, namespace: &str) -> Vec<Metric> {
        self.filtered(|m| m.id.namespace == namespace)
    }

    /// Metrics of `metric_type`.
    pub fn metrics_by_type(&self, metric_type: MetricType) -> Vec<Metric> {
        self.filtered(|m| m.value.metric_type() == metric_type)
    }

    fn filtered(&self, keep: impl Fn(&Metric) -> bool) -> Vec<Metric> {
        match self.storage.read() {
            Ok(storage) => storage.values().filter(|m| keep(m)).cloned().collect(),
            Err(_) => Vec::new(),
        }
    }
}

impl MetricsBackend for InMemoryBackend {
    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn put_metric(&self, metric: Metric) -> MetricsResult<()> {
        let mut storage = self.storage.write().map_err(|_| poisoned("write"))?;
        storage.insert(metric.id.clone(), metric);
        Ok(())
    }

    fn get_metric(&self, id: &MetricId) -> MetricsResult<Metric> {
        let storage = self.storage.read().map_err(|_| poisoned("read"))?;
        storage
            .get(id)
            .cloned()
            .ok_or_else(|| MetricsError::MetricNotFound(id.clone()))
    }

    fn contains_metric(&self, id: &MetricId) -> bool {
        self.storage
            .read()
            .map(|storage| storage.contains_key(id))
            .unwrap_or(false)
    }

    fn remove_metric(&self, id: &MetricId) -> MetricsResult<()> {
        let mut storage = self.storage.write().map_err(|_| poisoned("write"))?;
        storage
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| MetricsError::MetricNotFound(id.clone()))
    }

    fn list_metric_ids(&self) -> Vec<MetricId> {
        self.storage
            .read()
            .map(|storage| storage.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn list_all_metrics(&self) -> Vec<Metric> {
        self.filtered(|_| true)
    }

    fn clear_all(&self) -> MetricsResult<()> {
        let mut storage = self.storage.write().map_err(|_| poisoned("write"))?;
        storage.clear();
        Ok(())
    }

    fn metric_count(&self) -> usize {
        self.storage.read().map(|s| s.len()).unwrap_or(0)
    }
}
