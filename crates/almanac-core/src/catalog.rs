//! The metric catalog contract and a static, declaration-ordered implementation.
//!
//! The catalog is owned outside the core. The core only needs, for each
//! [`MetricId`], a getter and a display descriptor, plus a capability
//! predicate that reports whether the underlying system is active.

use std::collections::HashSet;
use std::fmt;

use indexmap::IndexMap;

use crate::error::{CatalogError, SampleError};
use crate::id::MetricId;

/// Number-format hint used when labelling the value axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum NumberFormat {
    /// Whole numbers.
    #[default]
    Integer,
    /// Fixed number of decimal places.
    Fixed(u8),
    /// Values are already percentages; a `%` suffix is appended.
    Percent,
    /// Large magnitudes shortened with `k`, `M`, `G` suffixes.
    Compact,
}

/// Persisted width of a metric value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ValueWidth {
    /// Stored as a 4-byte `f32`.
    #[default]
    Four,
    /// Stored as an 8-byte `f64`.
    Eight,
}

impl ValueWidth {
    /// Number of bytes the value occupies on disk.
    pub fn bytes(self) -> usize {
        match self {
            Self::Four => 4,
            Self::Eight => 8,
        }
    }

    /// Parse a width from its on-disk byte count.
    pub fn from_bytes(n: u8) -> Option<Self> {
        match n {
            4 => Some(Self::Four),
            8 => Some(Self::Eight),
            _ => None,
        }
    }
}

/// Display descriptor for one metric.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MetricDescriptor {
    /// Stable, unique key (survives reordering of display labels).
    pub key: String,
    /// Category label shown next to the metric in pickers.
    pub category: String,
    /// Unit label (e.g. `"people"`, `"%"`).
    pub unit: String,
    /// Number-format hint for axis labels.
    pub format: NumberFormat,
    /// Width used by the persisted record format.
    pub width: ValueWidth,
}

impl MetricDescriptor {
    /// A descriptor with the given key and default category, unit and format.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            category: String::new(),
            unit: String::new(),
            format: NumberFormat::default(),
            width: ValueWidth::default(),
        }
    }

    /// Set the category label.
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Set the unit label.
    pub fn unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = unit.into();
        self
    }

    /// Set the number-format hint.
    pub fn format(mut self, format: NumberFormat) -> Self {
        self.format = format;
        self
    }

    /// Set the persisted width.
    pub fn width(mut self, width: ValueWidth) -> Self {
        self.width = width;
        self
    }
}

/// Source of metric values and descriptors.
///
/// Implementations must be complete: every id in `0..len()` has exactly one
/// descriptor and one getter, stable for the lifetime of a session.
/// [`verify_catalog`] checks this at startup.
pub trait MetricCatalog: Send + Sync {
    /// Number of declared metrics.
    fn len(&self) -> usize;

    /// Whether the catalog declares no metrics.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Display descriptor for `id`, or `None` if out of range.
    fn descriptor(&self, id: MetricId) -> Option<&MetricDescriptor>;

    /// Evaluate the getter for `id`.
    ///
    /// `Ok(None)` means the producing system is inactive; `Err` is a
    /// transient failure that aborts the current snapshot.
    fn sample(&self, id: MetricId) -> Result<Option<f64>, SampleError>;

    /// Capability predicate: whether `id` can currently be produced at all.
    ///
    /// Unavailable metrics are recorded as absent without calling the getter.
    fn is_available(&self, _id: MetricId) -> bool {
        true
    }

    /// All ids in declaration order.
    fn ids(&self) -> Box<dyn Iterator<Item = MetricId> + '_> {
        Box::new((0..self.len() as u32).map(MetricId))
    }
}

/// Verify the catalog invariants required by the core.
///
/// Called once at session start. Failure disables the session but is not
/// fatal to the process.
pub fn verify_catalog(catalog: &dyn MetricCatalog) -> Result<(), CatalogError> {
    let len = catalog.len();
    if len == 0 {
        return Err(CatalogError::Empty);
    }
    if u32::try_from(len).is_err() {
        return Err(CatalogError::TooManyMetrics { count: len });
    }
    let mut seen = HashSet::with_capacity(len);
    for id in catalog.ids() {
        let descriptor = catalog
            .descriptor(id)
            .ok_or(CatalogError::MissingDescriptor { id })?;
        if descriptor.key.is_empty() {
            return Err(CatalogError::EmptyKey { id });
        }
        if !seen.insert(descriptor.key.as_str()) {
            return Err(CatalogError::DuplicateKey {
                key: descriptor.key.clone(),
            });
        }
    }
    Ok(())
}

type Getter = Box<dyn Fn() -> Result<Option<f64>, String> + Send + Sync>;
type Capability = Box<dyn Fn() -> bool + Send + Sync>;

struct Entry {
    descriptor: MetricDescriptor,
    getter: Getter,
    capability: Option<Capability>,
}

/// A catalog built once from boxed getters, in declaration order.
///
/// `MetricId(n)` is the n-th metric passed to the builder.
pub struct StaticCatalog {
    entries: IndexMap<String, Entry>,
}

impl StaticCatalog {
    /// Start building a catalog.
    pub fn builder() -> StaticCatalogBuilder {
        StaticCatalogBuilder {
            entries: IndexMap::new(),
            duplicate: None,
        }
    }

    /// Look up a metric id by its stable key.
    pub fn id_of(&self, key: &str) -> Option<MetricId> {
        self.entries.get_index_of(key).map(|i| MetricId(i as u32))
    }
}

impl fmt::Debug for StaticCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticCatalog")
            .field("keys", &self.entries.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl MetricCatalog for StaticCatalog {
    fn len(&self) -> usize {
        self.entries.len()
    }

    fn descriptor(&self, id: MetricId) -> Option<&MetricDescriptor> {
        self.entries.get_index(id.index()).map(|(_, e)| &e.descriptor)
    }

    fn sample(&self, id: MetricId) -> Result<Option<f64>, SampleError> {
        let (_, entry) = self
            .entries
            .get_index(id.index())
            .ok_or(SampleError::UnknownMetric { id })?;
        (entry.getter)().map_err(|reason| SampleError::GetterFailed { id, reason })
    }

    fn is_available(&self, id: MetricId) -> bool {
        match self.entries.get_index(id.index()) {
            Some((_, entry)) => entry.capability.as_ref().is_none_or(|c| c()),
            None => false,
        }
    }
}

/// Builder for [`StaticCatalog`].
pub struct StaticCatalogBuilder {
    entries: IndexMap<String, Entry>,
    duplicate: Option<String>,
}

impl StaticCatalogBuilder {
    /// Register a metric with an infallible getter.
    pub fn metric<F>(self, descriptor: MetricDescriptor, getter: F) -> Self
    where
        F: Fn() -> Option<f64> + Send + Sync + 'static,
    {
        self.fallible_metric(descriptor, move || Ok(getter()))
    }

    /// Register a metric whose getter can fail transiently.
    pub fn fallible_metric<F>(mut self, descriptor: MetricDescriptor, getter: F) -> Self
    where
        F: Fn() -> Result<Option<f64>, String> + Send + Sync + 'static,
    {
        self.insert(descriptor, Box::new(getter), None);
        self
    }

    /// Register a metric gated by a capability predicate.
    pub fn gated_metric<F, C>(mut self, descriptor: MetricDescriptor, getter: F, capability: C) -> Self
    where
        F: Fn() -> Option<f64> + Send + Sync + 'static,
        C: Fn() -> bool + Send + Sync + 'static,
    {
        self.insert(
            descriptor,
            Box::new(move || Ok(getter())),
            Some(Box::new(capability)),
        );
        self
    }

    fn insert(&mut self, descriptor: MetricDescriptor, getter: Getter, capability: Option<Capability>) {
        let key = descriptor.key.clone();
        if self.entries.contains_key(&key) {
            self.duplicate.get_or_insert(key);
            return;
        }
        self.entries.insert(
            key,
            Entry {
                descriptor,
                getter,
                capability,
            },
        );
    }

    /// Finish the catalog, running [`verify_catalog`] on the result.
    pub fn build(self) -> Result<StaticCatalog, CatalogError> {
        if let Some(key) = self.duplicate {
            return Err(CatalogError::DuplicateKey { key });
        }
        let catalog = StaticCatalog {
            entries: self.entries,
        };
        verify_catalog(&catalog)?;
        Ok(catalog)
    }
}
