//! Test utilities and mock types for almanac development.
//!
//! Provides mock implementations of [`MetricCatalog`], an enum-backed
//! [`DemoCatalog`] that maps each metric through an exhaustive `match`,
//! and date/snapshot fixtures in [`fixtures`].

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

pub use fixtures::{at, daily_snapshots, monthly_snapshots, ymd};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use almanac_core::{
    MetricCatalog, MetricDescriptor, MetricId, NumberFormat, SampleError, ValueWidth,
};

/// Mock implementation of [`MetricCatalog`].
///
/// Metrics are named `metric_0`, `metric_1`, …. Values start absent and
/// are changed with [`set`](MockCatalog::set). [`fail_next`](MockCatalog::fail_next)
/// makes every getter fail until cleared.
pub struct MockCatalog {
    descriptors: Vec<MetricDescriptor>,
    values: Mutex<Vec<Option<f64>>>,
    failing: AtomicBool,
}

impl MockCatalog {
    pub fn new(metric_count: usize) -> Self {
        Self::with_descriptors(
            (0..metric_count)
                .map(|i| MetricDescriptor::new(format!("metric_{i}")))
                .collect(),
        )
    }

    pub fn with_descriptors(descriptors: Vec<MetricDescriptor>) -> Self {
        let n = descriptors.len();
        Self {
            descriptors,
            values: Mutex::new(vec![None; n]),
            failing: AtomicBool::new(false),
        }
    }

    /// Set the value the getter for metric `index` returns.
    pub fn set(&self, index: usize, value: Option<f64>) {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        values[index] = value;
    }

    /// Set every getter's value at once.
    pub fn set_all(&self, value: Option<f64>) {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        values.fill(value);
    }

    /// Make getters fail (`true`) or succeed again (`false`).
    pub fn fail_next(&self, failing: bool) {
        self.failing.store(failing, Ordering::Relaxed);
    }
}

impl MetricCatalog for MockCatalog {
    fn len(&self) -> usize {
        self.descriptors.len()
    }

    fn descriptor(&self, id: MetricId) -> Option<&MetricDescriptor> {
        self.descriptors.get(id.index())
    }

    fn sample(&self, id: MetricId) -> Result<Option<f64>, SampleError> {
        if self.failing.load(Ordering::Relaxed) {
            return Err(SampleError::GetterFailed {
                id,
                reason: "mock failure".into(),
            });
        }
        let values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        values
            .get(id.index())
            .copied()
            .ok_or(SampleError::UnknownMetric { id })
    }
}

/// The metrics of a small city simulation, in declaration order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DemoMetric {
    Population,
    Treasury,
    Happiness,
    TouristVisits,
}

impl DemoMetric {
    pub const ALL: [DemoMetric; 4] = [
        DemoMetric::Population,
        DemoMetric::Treasury,
        DemoMetric::Happiness,
        DemoMetric::TouristVisits,
    ];

    pub fn id(self) -> MetricId {
        MetricId(self as u32)
    }

    pub fn from_id(id: MetricId) -> Option<Self> {
        Self::ALL.get(id.index()).copied()
    }

    fn descriptor(self) -> MetricDescriptor {
        match self {
            DemoMetric::Population => MetricDescriptor::new("population")
                .category("citizens")
                .unit("people")
                .format(NumberFormat::Compact)
                .width(ValueWidth::Eight),
            DemoMetric::Treasury => MetricDescriptor::new("treasury")
                .category("economy")
                .unit("credits")
                .format(NumberFormat::Compact)
                .width(ValueWidth::Eight),
            DemoMetric::Happiness => MetricDescriptor::new("happiness")
                .category("citizens")
                .unit("%")
                .format(NumberFormat::Percent),
            DemoMetric::TouristVisits => MetricDescriptor::new("tourist_visits")
                .category("tourism")
                .unit("visits"),
        }
    }
}

/// Mutable state of the demo city.
#[derive(Clone, Debug, Default)]
pub struct DemoCity {
    pub population: f64,
    pub treasury: f64,
    pub happiness: Option<f64>,
    pub tourism_enabled: bool,
    pub tourist_visits: f64,
}

/// A catalog over [`DemoCity`] whose getters are one exhaustive `match`.
pub struct DemoCatalog {
    descriptors: Vec<MetricDescriptor>,
    city: Mutex<DemoCity>,
}

impl DemoCatalog {
    pub fn new(city: DemoCity) -> Self {
        Self {
            descriptors: DemoMetric::ALL.iter().map(|m| m.descriptor()).collect(),
            city: Mutex::new(city),
        }
    }

    /// Mutate the city state.
    pub fn update(&self, f: impl FnOnce(&mut DemoCity)) {
        f(&mut self.city.lock().unwrap_or_else(PoisonError::into_inner));
    }
}

impl MetricCatalog for DemoCatalog {
    fn len(&self) -> usize {
        DemoMetric::ALL.len()
    }

    fn descriptor(&self, id: MetricId) -> Option<&MetricDescriptor> {
        self.descriptors.get(id.index())
    }

    fn sample(&self, id: MetricId) -> Result<Option<f64>, SampleError> {
        let metric = DemoMetric::from_id(id).ok_or(SampleError::UnknownMetric { id })?;
        let city = self.city.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(match metric {
            DemoMetric::Population => Some(city.population),
            DemoMetric::Treasury => Some(city.treasury),
            DemoMetric::Happiness => city.happiness,
            DemoMetric::TouristVisits => Some(city.tourist_visits),
        })
    }

    fn is_available(&self, id: MetricId) -> bool {
        match DemoMetric::from_id(id) {
            Some(DemoMetric::TouristVisits) => {
                self.city
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .tourism_enabled
            }
            Some(_) => true,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use almanac_core::verify_catalog;

    #[test]
    fn demo_catalog_is_complete() {
        let catalog = DemoCatalog::new(DemoCity::default());
        verify_catalog(&catalog).unwrap();
        for metric in DemoMetric::ALL {
            assert_eq!(DemoMetric::from_id(metric.id()), Some(metric));
        }
    }

    #[test]
    fn mock_catalog_is_complete() {
        verify_catalog(&MockCatalog::new(3)).unwrap();
    }
}
