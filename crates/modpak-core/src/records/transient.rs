use super::record::{Record, RecordSet};
use super::schema::RecordSchema;
use super::{SchemaError, StoreError};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
#[error("stress period {period} out of range for a simulation with {nper} periods")]
pub struct PeriodError {
    pub period: usize,
    pub nper: usize,
}

#[derive(Debug, Error, PartialEq)]
#[error("record index {index} out of range (set holds {len} records)")]
pub struct IndexError {
    pub index: usize,
    pub len: usize,
}

/// Explicit per-period state held in a [`Transient`] store.
#[derive(Debug, Clone, PartialEq)]
pub enum PeriodEntry<T> {
    /// Data defined for this period.
    Data(T),
    /// Explicit "no entries this period" marker, overriding carry-forward.
    Clear,
}

/// Resolved state of one stress period after carry-forward.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Effective<'a, T> {
    /// The nearest prior (or same-period) explicit data.
    Explicit(&'a T),
    /// The nearest prior marker cleared all entries.
    Clear,
    /// No explicit entry exists at or before this period.
    Empty,
}

impl<'a, T> Effective<'a, T> {
    pub fn data(&self) -> Option<&'a T> {
        match self {
            Effective::Explicit(data) => Some(data),
            _ => None,
        }
    }
}

/// Generic stress-period store: a sparse mapping from period index to an
/// explicit entry, with carry-forward resolution for absent keys.
///
/// Periods are 0-based and contiguous in `0..nper`. A period with no key
/// inherits the nearest prior [`PeriodEntry`]; before the first key the
/// effective state is [`Effective::Empty`]. This is the central
/// space-saving convention of the on-disk format and the store preserves
/// it exactly: an un-set period is serialized via the carry-forward
/// sentinel, never duplicated.
#[derive(Debug, Clone, PartialEq)]
pub struct Transient<T> {
    nper: usize,
    entries: BTreeMap<usize, PeriodEntry<T>>,
}

impl<T> Transient<T> {
    pub fn new(nper: usize) -> Self {
        Transient {
            nper,
            entries: BTreeMap::new(),
        }
    }

    pub fn nper(&self) -> usize {
        self.nper
    }

    /// Sets the explicit state for one period.
    pub fn set(&mut self, period: usize, entry: PeriodEntry<T>) -> Result<(), PeriodError> {
        self.check_period(period)?;
        self.entries.insert(period, entry);
        Ok(())
    }

    /// The explicit entry for `period`, if one was set (no carry-forward).
    pub fn entry(&self, period: usize) -> Option<&PeriodEntry<T>> {
        self.entries.get(&period)
    }

    /// Resolves carry-forward: scans keys at or before `period` in
    /// descending order and returns the nearest explicit state.
    pub fn effective(&self, period: usize) -> Result<Effective<'_, T>, PeriodError> {
        self.check_period(period)?;
        match self.entries.range(..=period).next_back() {
            Some((_, PeriodEntry::Data(data))) => Ok(Effective::Explicit(data)),
            Some((_, PeriodEntry::Clear)) => Ok(Effective::Clear),
            None => Ok(Effective::Empty),
        }
    }

    /// Periods with an explicit entry, in ascending order.
    pub fn explicit_periods(&self) -> impl Iterator<Item = usize> + '_ {
        self.entries.keys().copied()
    }

    fn check_period(&self, period: usize) -> Result<(), PeriodError> {
        if period >= self.nper {
            return Err(PeriodError {
                period,
                nper: self.nper,
            });
        }
        Ok(())
    }
}

/// Stress-period record store: a [`Transient`] of [`RecordSet`]s guarded by
/// one fixed [`RecordSchema`].
///
/// Every explicit record set must conform to the store's schema; the schema
/// (field names, order, types, auxiliary columns) cannot change for the
/// store's lifetime.
#[derive(Debug, Clone, PartialEq)]
pub struct TransientList {
    schema: RecordSchema,
    inner: Transient<RecordSet>,
}

impl TransientList {
    pub fn new(nper: usize, schema: RecordSchema) -> Self {
        TransientList {
            schema,
            inner: Transient::new(nper),
        }
    }

    pub fn nper(&self) -> usize {
        self.inner.nper()
    }

    pub fn schema(&self) -> &RecordSchema {
        &self.schema
    }

    /// Sets an explicit record set for one period. The set's schema must
    /// equal the store's schema.
    pub fn set_records(&mut self, period: usize, records: RecordSet) -> Result<(), StoreError> {
        if records.schema() != &self.schema {
            return Err(SchemaError::SchemaMismatch.into());
        }
        self.inner.set(period, PeriodEntry::Data(records))?;
        Ok(())
    }

    /// Marks a period as explicitly cleared (zero active records).
    pub fn set_clear(&mut self, period: usize) -> Result<(), StoreError> {
        self.inner.set(period, PeriodEntry::Clear)?;
        Ok(())
    }

    pub fn entry(&self, period: usize) -> Option<&PeriodEntry<RecordSet>> {
        self.inner.entry(period)
    }

    pub fn effective(&self, period: usize) -> Result<Effective<'_, RecordSet>, StoreError> {
        Ok(self.inner.effective(period)?)
    }

    pub fn explicit_periods(&self) -> impl Iterator<Item = usize> + '_ {
        self.inner.explicit_periods()
    }

    /// Sets record slot `index` of `period`, growing the set by one when
    /// `index == len`.
    ///
    /// If the period has no explicit entry yet, the resolved effective set
    /// is copied first, so the mutation never bleeds into the prior period
    /// it was carried from. Subsequent periods then carry forward from the
    /// new explicit entry.
    pub fn add_record(
        &mut self,
        period: usize,
        index: usize,
        values: Record,
    ) -> Result<(), StoreError> {
        if !matches!(self.inner.entry(period), Some(PeriodEntry::Data(_))) {
            let copied = match self.inner.effective(period)? {
                Effective::Explicit(set) => set.clone(),
                Effective::Clear | Effective::Empty => RecordSet::new(self.schema.clone()),
            };
            self.inner.set(period, PeriodEntry::Data(copied))?;
        }
        let Some(PeriodEntry::Data(set)) = self.inner.entries.get_mut(&period) else {
            unreachable!()
        };
        if index > set.len() {
            return Err(IndexError {
                index,
                len: set.len(),
            }
            .into());
        }
        set.set_slot(index, values)?;
        Ok(())
    }

    /// Maximum number of records active in any single stress period.
    pub fn max_active(&self) -> usize {
        let mut max = 0;
        for period in 0..self.nper() {
            if let Ok(Effective::Explicit(set)) = self.effective(period) {
                max = max.max(set.len());
            }
        }
        max
    }
}
