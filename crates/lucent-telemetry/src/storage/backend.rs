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

use lucent_core::telemetry::{Metric, MetricId, MetricType, MetricValue, MetricsError, MetricsResult};
use std::fmt::Debug;

/// Interface for metrics storage backends.
pub trait MetricsBackend: Send + Sync + Debug + 'static {
    /// Gets a reference to this object as `Any` for downcasting.
    fn as_any(&self) -> &dyn std::any::Any;

    /// Stores or replaces a metric.
    fn put_metric(&self, metric: Metric) -> MetricsResult<()>;

    /// Retrieves a metric by ID.
    fn get_metric(&self, id: &MetricId) -> MetricsResult<Metric>;

    /// Checks if a metric exists.
    fn contains_metric(&self, id: &MetricId) -> bool;

    /// Removes a metric.
    fn remove_metric(&self, id: &MetricId) -> MetricsResult<()>;

    /// All metric IDs currently stored.
    fn list_metric_ids(&self) -> Vec<MetricId>;

    /// All metrics.
    fn list_all_metrics(&self) -> Vec<Metric>;

    /// Removes every metric.
    fn clear_all(&self) -> MetricsResult<()>;

    /// Number of metrics stored.
    fn metric_count(&self) -> usize;

    /// Increments a counter, saturating, and returns the new value.
    fn increment_counter(&self, id: &MetricId, delta: u64) -> MetricsResult<u64> {
        let mut metric = self.get_metric(id)?;
        match metric.value {
            MetricValue::Counter(ref mut value) => {
                *value = value.saturating_add(delta);
                let result = *value;
                self.put_metric(metric)?;
                Ok(result)
            }
            _ => Err(MetricsError::TypeMismatch {
                expected: MetricType::Counter,
                found: metric.value.metric_type(),
            }),
        }
    }

    /// Sets a gauge value.
    fn set_gauge(&self, id: &MetricId, value: f64) -> MetricsResult<()> {
        let mut metric = self.get_metric(id)?;
        match metric.value {
            MetricValue::Gauge(ref mut gauge_value) => {
                *gauge_value = value;
                self.put_metric(metric)?;
                Ok(())
            }
            _ => Err(MetricsError::TypeMismatch {
                expected: MetricType::Gauge,
                found: metric.value.metric_type(),
            }),
        }
    }

    /// Records one histogram sample in the first bucket whose bound is
    /// `>= sample`, or in the overflow bucket.
    fn record_histogram_sample(&self, id: &MetricId, sample: f64) -> MetricsResult<()> {
        if !sample.is_finite() {
            return Err(MetricsError::InvalidOperation(format!(
                "non-finite histogram sample for {id}"
            )));
        }
        let mut metric = self.get_metric(id)?;
        match metric.value {
            MetricValue::Histogram {
                ref mut count,
                ref mut sum,
                ref bucket_bounds,
                ref mut bucket_counts,
            } => {
                let slot = bucket_bounds
                    .iter()
                    .position(|&bound| sample <= bound)
                    .unwrap_or(bucket_bounds.len());
                if let Some(bucket) = bucket_counts.get_mut(slot) {
                    *bucket += 1;
                }
                *count += 1;
                *sum += sample;
                self.put_metric(metric)?;
                Ok(())
            }
            _ => Err(MetricsError::TypeMismatch {
                expected: MetricType::Histogram,
                found: metric.value.metric_type(),
            }),
        }
    }
}

/// Statistics about a metrics backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendStats {
    /// Total number of metrics stored.
    pub total_metrics: usize,
    /// Number of counters.
    pub counter_count: usize,
    /// Number of gauges.
    pub gauge_count: usize,
    /// Number of histograms.
    pub histogram_count: usize,
}
