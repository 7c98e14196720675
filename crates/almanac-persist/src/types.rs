//! Data types for archive headers and load/save results.

use almanac_core::{MetricCatalog, MetricId, ValueWidth};
use almanac_store::SamplingMode;

/// Everything the archive header records.
///
/// # Examples
///
/// ```
/// use almanac_core::ValueWidth;
/// use almanac_persist::ArchiveHeader;
/// use almanac_store::SamplingMode;
///
/// let header = ArchiveHeader::new(
///     SamplingMode::Monthly,
///     vec![ValueWidth::Four, ValueWidth::Eight],
/// );
/// assert_eq!(header.metric_count(), 2);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArchiveHeader {
    /// Sampling mode the session ran with.
    pub mode: SamplingMode,
    /// Persisted width of each metric, in catalog order.
    pub widths: Vec<ValueWidth>,
}

impl ArchiveHeader {
    /// A header with explicit widths.
    pub fn new(mode: SamplingMode, widths: Vec<ValueWidth>) -> Self {
        Self { mode, widths }
    }

    /// A header taking each metric's width from its descriptor.
    pub fn for_catalog(mode: SamplingMode, catalog: &dyn MetricCatalog) -> Self {
        let widths = (0..catalog.len() as u32)
            .map(|i| {
                catalog
                    .descriptor(MetricId(i))
                    .map_or(ValueWidth::default(), |d| d.width)
            })
            .collect();
        Self { mode, widths }
    }

    /// Number of metrics per record.
    pub fn metric_count(&self) -> usize {
        self.widths.len()
    }
}

/// Outcome of [`save_store`](crate::save_store).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SaveReport {
    /// Snapshots written.
    pub records: usize,
    /// Blocks written.
    pub blocks: usize,
}

/// Outcome of [`load_into`](crate::load_into).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadReport {
    /// Format version of the archive.
    pub version: u8,
    /// Header of the archive.
    pub header: ArchiveHeader,
    /// Snapshots now in the store.
    pub loaded: usize,
    /// Records skipped because they could not be decoded.
    pub skipped: usize,
    /// Whether the stream ended mid-block or mid-record.
    pub truncated: bool,
    /// Largest number of trailing metrics dropped from a single record
    /// because the current catalog is shorter.
    pub dropped_metrics: usize,
}
