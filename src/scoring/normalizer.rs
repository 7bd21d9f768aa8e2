use std::collections::BTreeSet;
use tracing::debug;

use crate::models::{FeatureRecord, FieldName, NormalizedFeatureRecord};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnStats {
    pub min: f64,
    pub max: f64,
}

impl ColumnStats {
    /// `None` for an empty column.
    pub fn of(values: &[f64]) -> Option<Self> {
        let mut iter = values.iter().copied();
        let first = iter.next()?;
        let (min, max) = iter.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v)));
        Some(Self { min, max })
    }

    pub fn is_degenerate(&self) -> bool {
        self.max <= self.min
    }

    /// Zero-variance columns map to themselves.
    pub fn scale(&self, v: f64) -> f64 {
        if self.is_degenerate() {
            v
        } else {
            (v - self.min) / (self.max - self.min)
        }
    }
}

/// Min-max scales a whole column against its own population.
pub fn min_max(values: &[f64]) -> Vec<f64> {
    match ColumnStats::of(values) {
        Some(stats) => values.iter().map(|v| stats.scale(*v)).collect(),
        None => Vec::new(),
    }
}

/// Population-wide min-max scaling, one column at a time.
#[derive(Debug, Clone)]
pub struct Normalizer {
    fields: BTreeSet<FieldName>,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(FieldName::ALL)
    }
}

impl Normalizer {
    pub fn new(fields: impl IntoIterator<Item = FieldName>) -> Self {
        Self {
            fields: fields.into_iter().collect(),
        }
    }

    pub fn fields(&self) -> &BTreeSet<FieldName> {
        &self.fields
    }

    /// Fields outside the configured set pass through unscaled.
    pub fn normalize(&self, records: &[FeatureRecord]) -> Vec<NormalizedFeatureRecord> {
        let mut out: Vec<NormalizedFeatureRecord> = records
            .iter()
            .map(|r| NormalizedFeatureRecord {
                wallet_id: r.wallet_id.clone(),
                values: FieldName::ALL.map(|f| r.value(f)),
            })
            .collect();

        for field in &self.fields {
            let column: Vec<f64> = records.iter().map(|r| r.value(*field)).collect();
            let Some(stats) = ColumnStats::of(&column) else {
                continue;
            };

            debug!(
                "Column {}: min={} max={}{}",
                field,
                stats.min,
                stats.max,
                if stats.is_degenerate() { " (degenerate)" } else { "" }
            );

            for row in out.iter_mut() {
                let v = row.values[field.index()];
                row.values[field.index()] = stats.scale(v);
            }
        }

        out
    }
}
