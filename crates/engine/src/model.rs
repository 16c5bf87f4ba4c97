//! The authoritative grid dataset.
//!
//! `DataModel` owns:
//! - the schema and the ordered rows (each with a stable synthetic id)
//! - the pending overlay of deferred edits, layered over committed storage
//! - per-row versions, bumped on every committed or pending write
//! - derived validation errors, kept current as effective values change
//! - per-row readonly flags and opaque per-cell style classes
//! - the observer list
//!
//! Lookups by unknown id or key return `None` (or `false` for writes). The
//! model never rejects a value for its shape; a mismatched value is stored
//! and reported through validation.

use std::collections::BTreeMap;

use cellgrid_core::address::{self, AddressSpace, CellAddress};
use cellgrid_core::{CellValue, RowData, RowId, Schema};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::events::{ModelEvent, Observers, SubscriptionId};
use crate::validation::{
    check_value, duplicate_issue, uniqueness_key, CellIssue, PatternCache, ValidationError,
};

#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub id: RowId,
    pub raw: RowData,
    /// 1-based position, recomputed on every structural change.
    pub display_index: usize,
}

/// A row taken out by `remove_row`, with the index it occupied and the
/// overlay entries it carried.
#[derive(Debug, Clone, PartialEq)]
pub struct RemovedRow {
    pub row: Row,
    pub index: usize,
    pub pending: BTreeMap<String, CellValue>,
}

#[derive(Debug, Default)]
pub struct DataModel {
    schema: Schema,
    rows: Vec<Row>,
    positions: FxHashMap<RowId, usize>,
    next_id: u64,
    pending: FxHashMap<RowId, FxHashMap<String, CellValue>>,
    versions: FxHashMap<RowId, u64>,
    readonly_rows: FxHashSet<RowId>,
    styles: FxHashMap<RowId, FxHashMap<String, String>>,
    errors: FxHashMap<(RowId, String), CellIssue>,
    patterns: PatternCache,
    observers: Observers,
}

impl DataModel {
    pub fn new(schema: Schema) -> Self {
        Self { schema, ..Default::default() }
    }

    pub fn with_data(mut self, data: Vec<RowData>) -> Self {
        self.set_data(data);
        self
    }

    // ========================================================================
    // Wholesale replacement
    // ========================================================================

    /// Replace every row. Rows get fresh ids; overlay, versions, readonly
    /// flags, styles and validation are reset.
    pub fn set_data(&mut self, data: Vec<RowData>) {
        self.rows.clear();
        self.positions.clear();
        self.pending.clear();
        self.versions.clear();
        self.readonly_rows.clear();
        self.styles.clear();
        self.errors.clear();

        for raw in data {
            let id = self.allocate_id();
            self.rows.push(Row { id, raw, display_index: 0 });
        }
        self.reindex_from(0);
        self.revalidate_all();
        log::debug!("data replaced: {} rows", self.rows.len());
        self.observers.emit(ModelEvent::DataReplaced);
    }

    /// Replace the columns and revalidate under the new types. Overlay
    /// entries for keys that no longer exist are dropped.
    pub fn set_schema(&mut self, schema: Schema) {
        self.schema = schema;
        let schema = &self.schema;
        for entries in self.pending.values_mut() {
            entries.retain(|key, _| schema.index_of(key).is_some());
        }
        self.pending.retain(|_, entries| !entries.is_empty());
        self.revalidate_all();
        self.observers.emit(ModelEvent::SchemaReplaced);
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    // ========================================================================
    // Rows
    // ========================================================================

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn row(&self, row_id: RowId) -> Option<&Row> {
        self.rows.get(*self.positions.get(&row_id)?)
    }

    pub fn row_at(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }

    pub fn row_id_at(&self, index: usize) -> Option<RowId> {
        self.rows.get(index).map(|r| r.id)
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn row_index(&self, row_id: RowId) -> Option<usize> {
        self.positions.get(&row_id).copied()
    }

    pub fn row_version(&self, row_id: RowId) -> Option<u64> {
        self.positions
            .contains_key(&row_id)
            .then(|| self.versions.get(&row_id).copied().unwrap_or(0))
    }

    /// Insert a row at `index` (clamped to the row count). `forced_id`
    /// reproduces an earlier identity, as when undoing a delete.
    pub fn insert_row_at(&mut self, data: RowData, index: usize, forced_id: Option<RowId>) -> RowId {
        let id = match forced_id {
            Some(id) if !self.positions.contains_key(&id) => {
                self.next_id = self.next_id.max(id.0);
                id
            }
            Some(id) => {
                log::warn!("row id {id} already present, assigning a fresh id");
                self.allocate_id()
            }
            None => self.allocate_id(),
        };
        let index = index.min(self.rows.len());
        self.rows.insert(index, Row { id, raw: data, display_index: 0 });
        self.reindex_from(index);
        self.revalidate_row(index);
        self.observers.emit(ModelEvent::RowInserted { row_id: id, index });
        id
    }

    /// Remove a row, dropping its overlay, version, flags and styles.
    pub fn remove_row(&mut self, row_id: RowId) -> Option<RemovedRow> {
        let index = self.positions.remove(&row_id)?;
        let row = self.rows.remove(index);
        let pending = self.pending.remove(&row_id).map(|p| p.into_iter().collect()).unwrap_or_default();
        self.versions.remove(&row_id);
        self.readonly_rows.remove(&row_id);
        self.styles.remove(&row_id);
        self.errors.retain(|(id, _), _| *id != row_id);
        self.reindex_from(index);

        let unique: Vec<usize> = (0..self.schema.len())
            .filter(|&c| self.schema.column_at(c).is_some_and(|col| col.unique))
            .collect();
        for c in unique {
            self.revalidate_column(c);
        }

        self.observers.emit(ModelEvent::RowRemoved { row_id, index });
        Some(RemovedRow { row, index, pending })
    }

    /// Committed storage of every row, in order.
    pub fn raw_snapshot(&self) -> Vec<(RowId, RowData)> {
        self.rows.iter().map(|r| (r.id, r.raw.clone())).collect()
    }

    // ========================================================================
    // Cells
    // ========================================================================

    /// Effective value: pending if present, else committed. Formula columns
    /// evaluate their function over the row's effective values.
    pub fn get_cell(&self, row_id: RowId, key: &str) -> Option<CellValue> {
        let (r, c) = self.cell_location(row_id, key)?;
        if let Some(formula) = self.schema.column_at(c).and_then(|col| col.formula.as_ref()) {
            return Some(formula.evaluate(&|k| self.lookup_effective(r, k)));
        }
        Some(self.effective_at(r, key, c))
    }

    /// Committed value, ignoring the overlay.
    pub fn get_raw_cell(&self, row_id: RowId, key: &str) -> Option<CellValue> {
        let (r, c) = self.cell_location(row_id, key)?;
        Some(self.rows[r].raw.get(key, c).cloned().unwrap_or_default())
    }

    /// Write a cell. Committed writes go to raw storage and clear any
    /// overlay entry; deferred writes go to the overlay unless they equal
    /// the committed value, in which case the entry is removed.
    pub fn set_cell(&mut self, row_id: RowId, key: &str, value: CellValue, committed: bool) -> bool {
        let Some((r, c)) = self.cell_location(row_id, key) else {
            return false;
        };

        if committed {
            self.rows[r].raw.set(key, c, value);
            self.remove_pending(row_id, key);
        } else {
            let raw = self.rows[r].raw.get(key, c).cloned().unwrap_or_default();
            if raw.same_value(&value) {
                self.remove_pending(row_id, key);
            } else {
                self.pending.entry(row_id).or_default().insert(key.to_string(), value);
            }
        }

        self.bump_version(row_id);
        self.revalidate_cell(r, c);
        self.observers.emit(ModelEvent::CellChanged {
            row_id,
            col_key: key.to_string(),
            committed,
        });
        true
    }

    /// Remove a cell from committed storage, so the row no longer holds
    /// the key at all. Any overlay entry for it goes too.
    pub fn unset_cell(&mut self, row_id: RowId, key: &str) -> bool {
        let Some((r, c)) = self.cell_location(row_id, key) else {
            return false;
        };
        self.rows[r].raw.remove(key, c);
        self.remove_pending(row_id, key);
        self.bump_version(row_id);
        self.revalidate_cell(r, c);
        self.observers.emit(ModelEvent::CellChanged {
            row_id,
            col_key: key.to_string(),
            committed: true,
        });
        true
    }

    /// True when the row stores nothing for `key`, committed or pending.
    pub fn is_unset(&self, row_id: RowId, key: &str) -> bool {
        let Some((r, c)) = self.cell_location(row_id, key) else {
            return false;
        };
        self.pending_value(row_id, key).is_none() && self.rows[r].raw.get(key, c).is_none()
    }

    // ========================================================================
    // Pending overlay
    // ========================================================================

    pub fn pending_value(&self, row_id: RowId, key: &str) -> Option<&CellValue> {
        self.pending.get(&row_id)?.get(key)
    }

    pub fn has_pending(&self, row_id: RowId) -> bool {
        self.pending.contains_key(&row_id)
    }

    /// Rows with overlay entries, in display order.
    pub fn pending_row_ids(&self) -> Vec<RowId> {
        let mut ids: Vec<RowId> = self.pending.keys().copied().collect();
        ids.sort_by_key(|id| self.positions.get(id).copied().unwrap_or(usize::MAX));
        ids
    }

    /// Commit every overlay entry of a row at once.
    pub fn apply_pending(&mut self, row_id: RowId) -> bool {
        let Some(&r) = self.positions.get(&row_id) else {
            return false;
        };
        let Some(entries) = self.pending.remove(&row_id) else {
            return false;
        };
        for (key, value) in entries {
            if let Some(c) = self.schema.index_of(&key) {
                self.rows[r].raw.set(&key, c, value);
            }
        }
        // Effective values are unchanged, so validation stays as is.
        self.bump_version(row_id);
        self.observers.emit(ModelEvent::PendingApplied { row_id });
        true
    }

    /// Drop every overlay entry of a row.
    pub fn discard_pending(&mut self, row_id: RowId) -> bool {
        let Some(&r) = self.positions.get(&row_id) else {
            return false;
        };
        let Some(entries) = self.pending.remove(&row_id) else {
            return false;
        };
        for key in entries.keys() {
            if let Some(c) = self.schema.index_of(key) {
                self.revalidate_cell(r, c);
            }
        }
        self.bump_version(row_id);
        self.observers.emit(ModelEvent::PendingDiscarded { row_id });
        true
    }

    // ========================================================================
    // Readonly and styles
    // ========================================================================

    /// Row-readonly or column-readonly. Unknown cells are readonly.
    pub fn is_readonly(&self, row_id: RowId, key: &str) -> bool {
        match self.schema.column(key) {
            Some(col) if self.positions.contains_key(&row_id) => {
                col.readonly || self.readonly_rows.contains(&row_id)
            }
            _ => true,
        }
    }

    pub fn set_row_readonly(&mut self, row_id: RowId, readonly: bool) -> bool {
        if !self.positions.contains_key(&row_id) {
            return false;
        }
        let changed = if readonly {
            self.readonly_rows.insert(row_id)
        } else {
            self.readonly_rows.remove(&row_id)
        };
        if changed {
            self.observers.emit(ModelEvent::RowReadonlyChanged { row_id });
        }
        true
    }

    /// Attach (or with `None`, clear) an opaque style class on a cell.
    pub fn set_cell_style(&mut self, row_id: RowId, key: &str, class: Option<String>) -> bool {
        if self.cell_location(row_id, key).is_none() {
            return false;
        }
        match class {
            Some(class) => {
                self.styles.entry(row_id).or_default().insert(key.to_string(), class);
            }
            None => {
                if let Some(row) = self.styles.get_mut(&row_id) {
                    row.remove(key);
                    if row.is_empty() {
                        self.styles.remove(&row_id);
                    }
                }
            }
        }
        self.observers.emit(ModelEvent::StyleChanged { row_id, col_key: key.to_string() });
        true
    }

    pub fn cell_style(&self, row_id: RowId, key: &str) -> Option<&str> {
        self.styles.get(&row_id)?.get(key).map(String::as_str)
    }

    // ========================================================================
    // Validation
    // ========================================================================

    /// Every current error, sorted by (row index, column index).
    pub fn validation_errors(&self) -> Vec<ValidationError> {
        let mut out: Vec<ValidationError> = self
            .errors
            .iter()
            .filter_map(|((row_id, key), issue)| {
                Some(ValidationError {
                    row_id: *row_id,
                    col_key: key.clone(),
                    row_index: self.row_index(*row_id)?,
                    col_index: self.schema.index_of(key)?,
                    code: issue.code,
                    message: issue.message.clone(),
                })
            })
            .collect();
        out.sort_by_key(|e| (e.row_index, e.col_index));
        out
    }

    pub fn cell_error(&self, row_id: RowId, key: &str) -> Option<&CellIssue> {
        self.errors.get(&(row_id, key.to_string()))
    }

    // ========================================================================
    // Notification
    // ========================================================================

    pub fn subscribe(&mut self, listener: impl FnMut(&ModelEvent) + 'static) -> SubscriptionId {
        self.observers.subscribe(Box::new(listener))
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.observers.unsubscribe(id)
    }

    /// Run `f` with notification suspended. At most one event is delivered
    /// when the outermost scope exits.
    pub fn batch_update<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        self.observers.suspend();
        let result = f(self);
        self.observers.resume();
        result
    }

    /// Resolve any address form to `(row, col)` indices.
    pub fn resolve(&self, addr: &CellAddress) -> Option<(usize, usize)> {
        address::resolve(addr, self)
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn allocate_id(&mut self) -> RowId {
        self.next_id += 1;
        RowId(self.next_id)
    }

    fn reindex_from(&mut self, start: usize) {
        for (i, row) in self.rows.iter_mut().enumerate().skip(start) {
            row.display_index = i + 1;
            self.positions.insert(row.id, i);
        }
    }

    fn bump_version(&mut self, row_id: RowId) {
        *self.versions.entry(row_id).or_insert(0) += 1;
    }

    fn cell_location(&self, row_id: RowId, key: &str) -> Option<(usize, usize)> {
        Some((*self.positions.get(&row_id)?, self.schema.index_of(key)?))
    }

    fn effective_at(&self, r: usize, key: &str, c: usize) -> CellValue {
        let row = &self.rows[r];
        if let Some(value) = self.pending.get(&row.id).and_then(|p| p.get(key)) {
            return value.clone();
        }
        row.raw.get(key, c).cloned().unwrap_or_default()
    }

    /// Lookup handed to formulas. Other formula columns read their stored
    /// value rather than recursing.
    fn lookup_effective(&self, r: usize, key: &str) -> CellValue {
        match self.schema.index_of(key) {
            Some(c) => self.effective_at(r, key, c),
            None => CellValue::Empty,
        }
    }

    fn remove_pending(&mut self, row_id: RowId, key: &str) {
        if let Some(entries) = self.pending.get_mut(&row_id) {
            entries.remove(key);
            if entries.is_empty() {
                self.pending.remove(&row_id);
            }
        }
    }

    fn set_issue(&mut self, row_id: RowId, key: &str, issue: Option<CellIssue>) {
        match issue {
            Some(issue) => {
                self.errors.insert((row_id, key.to_string()), issue);
            }
            None => {
                self.errors.remove(&(row_id, key.to_string()));
            }
        }
    }

    fn revalidate_all(&mut self) {
        self.errors.clear();
        for c in 0..self.schema.len() {
            self.revalidate_column(c);
        }
    }

    fn revalidate_row(&mut self, r: usize) {
        for c in 0..self.schema.len() {
            self.revalidate_cell(r, c);
        }
    }

    fn revalidate_cell(&mut self, r: usize, c: usize) {
        let Some(column) = self.schema.column_at(c) else {
            return;
        };
        if column.formula.is_some() {
            return;
        }
        if column.unique {
            self.revalidate_column(c);
            return;
        }
        let key = column.key.clone();
        let value = self.effective_at(r, &key, c);
        let issue = check_value(column, &value, &mut self.patterns);
        let row_id = self.rows[r].id;
        self.set_issue(row_id, &key, issue);
    }

    fn revalidate_column(&mut self, c: usize) {
        let Some(column) = self.schema.column_at(c) else {
            return;
        };
        if column.formula.is_some() {
            return;
        }
        let key = column.key.clone();
        let mut issues = Vec::with_capacity(self.rows.len());
        let mut seen: FxHashMap<String, Vec<usize>> = FxHashMap::default();

        for r in 0..self.rows.len() {
            let value = self.effective_at(r, &key, c);
            let issue = check_value(column, &value, &mut self.patterns);
            if column.unique && issue.is_none() {
                if let Some(k) = uniqueness_key(&value) {
                    seen.entry(k).or_default().push(r);
                }
            }
            issues.push(issue);
        }

        for rows in seen.values().filter(|rows| rows.len() > 1) {
            for &r in rows {
                issues[r] = Some(duplicate_issue());
            }
        }

        for (r, issue) in issues.into_iter().enumerate() {
            let row_id = self.rows[r].id;
            self.set_issue(row_id, &key, issue);
        }
    }
}

impl AddressSpace for DataModel {
    fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn col_count(&self) -> usize {
        self.schema.len()
    }

    fn row_index(&self, id: RowId) -> Option<usize> {
        self.positions.get(&id).copied()
    }

    fn col_index(&self, key: &str) -> Option<usize> {
        self.schema.index_of(key)
    }
}
