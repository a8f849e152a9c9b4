//! Data
//!
//! A typed column store with one categorical label column, and the immutable row-subset
//! views (`Dataset`) that every node of a decision graph owns.
use crate::errors::GraphError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

/// Column position of an attribute in the table.
pub type AttributeId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnType {
    Categorical,
    Numeric,
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ColumnType::Categorical => write!(f, "categorical"),
            ColumnType::Numeric => write!(f, "numeric"),
        }
    }
}

/// Name, type and (for categorical columns) the closed domain of a column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    pub column_type: ColumnType,
    pub domain: Vec<String>,
}

impl ColumnSpec {
    pub fn categorical<S, I, T>(name: S, domain: I) -> Self
    where
        S: Into<String>,
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        ColumnSpec {
            name: name.into(),
            column_type: ColumnType::Categorical,
            domain: domain.into_iter().map(Into::into).collect(),
        }
    }

    pub fn numeric<S: Into<String>>(name: S) -> Self {
        ColumnSpec {
            name: name.into(),
            column_type: ColumnType::Numeric,
            domain: Vec::new(),
        }
    }

    /// Position of `value` in the domain.
    pub fn code_of(&self, value: &str) -> Option<u32> {
        self.domain.iter().position(|v| v == value).map(|i| i as u32)
    }

    pub fn is_categorical(&self) -> bool {
        self.column_type == ColumnType::Categorical
    }
}

/// Column values. Categorical cells are stored as codes into the column's domain.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Categorical(Vec<u32>),
    Numeric(Vec<f64>),
}

impl Column {
    pub fn len(&self) -> usize {
        match self {
            Column::Categorical(codes) => codes.len(),
            Column::Numeric(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn column_type(&self) -> ColumnType {
        match self {
            Column::Categorical(_) => ColumnType::Categorical,
            Column::Numeric(_) => ColumnType::Numeric,
        }
    }
}

/// A single cell of an externally supplied row.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Category(String),
    Number(f64),
}

impl Value {
    pub fn value_type(&self) -> ColumnType {
        match self {
            Value::Category(_) => ColumnType::Categorical,
            Value::Number(_) => ColumnType::Numeric,
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Category(value.to_string())
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

/// The shared column store. Built once and never mutated afterwards.
#[derive(Debug, PartialEq)]
pub struct Table {
    specs: Vec<ColumnSpec>,
    columns: Vec<Column>,
    label: usize,
    labels: Vec<u32>,
    n_rows: usize,
}

impl Table {
    /// Build a table from column vectors.
    ///
    /// * `specs` - One spec per column.
    /// * `columns` - Column values, in the same order as `specs`.
    /// * `label` - Name of the categorical label column.
    pub fn new(specs: Vec<ColumnSpec>, columns: Vec<Column>, label: &str) -> Result<Self, GraphError> {
        if specs.len() != columns.len() {
            return Err(GraphError::ColumnCount(specs.len(), columns.len()));
        }
        let label_index = specs
            .iter()
            .position(|s| s.name == label)
            .ok_or_else(|| GraphError::UnknownColumn(label.to_string()))?;
        if !specs[label_index].is_categorical() {
            return Err(GraphError::LabelNotCategorical(label.to_string()));
        }
        if specs[label_index].domain.is_empty() {
            return Err(GraphError::EmptyLabelDomain(label.to_string()));
        }

        let n_rows = columns.first().map_or(0, |c| c.len());
        for (spec, column) in specs.iter().zip(columns.iter()) {
            if column.column_type() != spec.column_type {
                return Err(GraphError::TypeMismatch(
                    spec.name.clone(),
                    spec.column_type.to_string(),
                    column.column_type().to_string(),
                ));
            }
            if column.len() != n_rows {
                return Err(GraphError::ColumnLength(spec.name.clone(), column.len(), n_rows));
            }
            match column {
                Column::Categorical(codes) => {
                    if let Some(code) = codes.iter().find(|&&c| c as usize >= spec.domain.len()) {
                        return Err(GraphError::UnknownCategory(code.to_string(), spec.name.clone()));
                    }
                }
                Column::Numeric(values) => {
                    if values.iter().any(|v| v.is_nan()) {
                        return Err(GraphError::NanValue(spec.name.clone()));
                    }
                }
            }
        }

        let labels = match &columns[label_index] {
            Column::Categorical(codes) => codes.clone(),
            Column::Numeric(_) => return Err(GraphError::LabelNotCategorical(label.to_string())),
        };

        Ok(Table {
            specs,
            columns,
            label: label_index,
            labels,
            n_rows,
        })
    }

    /// Build a table from rows of cells, mapping category names onto domain codes.
    pub fn from_rows(specs: Vec<ColumnSpec>, rows: &[Vec<Value>], label: &str) -> Result<Self, GraphError> {
        let mut columns: Vec<Column> = specs
            .iter()
            .map(|s| match s.column_type {
                ColumnType::Categorical => Column::Categorical(Vec::with_capacity(rows.len())),
                ColumnType::Numeric => Column::Numeric(Vec::with_capacity(rows.len())),
            })
            .collect();

        for row in rows {
            if row.len() != specs.len() {
                return Err(GraphError::RowLength(row.len(), specs.len()));
            }
            for ((spec, column), value) in specs.iter().zip(columns.iter_mut()).zip(row.iter()) {
                match (column, value) {
                    (Column::Categorical(codes), Value::Category(v)) => {
                        let code = spec
                            .code_of(v)
                            .ok_or_else(|| GraphError::UnknownCategory(v.clone(), spec.name.clone()))?;
                        codes.push(code);
                    }
                    (Column::Numeric(values), Value::Number(v)) => values.push(*v),
                    (_, v) => {
                        return Err(GraphError::TypeMismatch(
                            spec.name.clone(),
                            spec.column_type.to_string(),
                            v.value_type().to_string(),
                        ))
                    }
                }
            }
        }
        Self::new(specs, columns, label)
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_cols(&self) -> usize {
        self.specs.len()
    }

    pub fn specs(&self) -> &[ColumnSpec] {
        &self.specs
    }

    pub fn spec(&self, col: usize) -> &ColumnSpec {
        &self.specs[col]
    }

    pub fn column(&self, col: usize) -> &Column {
        &self.columns[col]
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.specs.iter().position(|s| s.name == name)
    }

    pub fn label_index(&self) -> usize {
        self.label
    }

    /// Size of the label domain, the `C` of the incremental code.
    pub fn n_classes(&self) -> usize {
        self.specs[self.label].domain.len()
    }

    #[inline]
    pub fn label_code(&self, row: usize) -> u32 {
        self.labels[row]
    }

    pub fn label_name(&self, code: u32) -> &str {
        &self.specs[self.label].domain[code as usize]
    }
}

/// An immutable subset of a table's rows together with the attributes still usable on it.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    table: Arc<Table>,
    rows: Vec<usize>,
    attributes: BTreeSet<AttributeId>,
}

impl Dataset {
    /// All rows of `table`, with every non-label column as an attribute.
    pub fn new(table: Table) -> Self {
        Self::from_shared(Arc::new(table))
    }

    pub fn from_shared(table: Arc<Table>) -> Self {
        let label = table.label_index();
        let attributes = (0..table.n_cols()).filter(|&c| c != label).collect();
        let rows = (0..table.n_rows()).collect();
        Dataset {
            table,
            rows,
            attributes,
        }
    }

    fn subset(&self, rows: Vec<usize>, attributes: BTreeSet<AttributeId>) -> Dataset {
        Dataset {
            table: Arc::clone(&self.table),
            rows,
            attributes,
        }
    }

    pub fn table(&self) -> &Arc<Table> {
        &self.table
    }

    pub fn rows(&self) -> &[usize] {
        &self.rows
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn attributes(&self) -> &BTreeSet<AttributeId> {
        &self.attributes
    }

    /// One bucket per domain value of `attr`, indexed by code. The attribute is
    /// no longer usable in any bucket.
    pub fn partition_categorical(&self, attr: AttributeId) -> Vec<Dataset> {
        let mut attributes = self.attributes.clone();
        attributes.remove(&attr);
        let mut buckets = vec![Vec::new(); self.table.spec(attr).domain.len()];
        if let Column::Categorical(codes) = self.table.column(attr) {
            for &r in &self.rows {
                buckets[codes[r] as usize].push(r);
            }
        }
        buckets
            .into_iter()
            .map(|rows| self.subset(rows, attributes.clone()))
            .collect()
    }

    /// Rows with a value `<= cut` go low, the rest high. The attribute stays usable.
    pub fn partition_numeric(&self, attr: AttributeId, cut: f64) -> (Dataset, Dataset) {
        let (low, high): (Vec<usize>, Vec<usize>) = match self.table.column(attr) {
            Column::Numeric(values) => self.rows.iter().copied().partition(|&r| values[r] <= cut),
            Column::Categorical(_) => (self.rows.clone(), Vec::new()),
        };
        (
            self.subset(low, self.attributes.clone()),
            self.subset(high, self.attributes.clone()),
        )
    }

    /// Rows of both datasets; only attributes usable in both remain usable.
    pub fn union(&self, other: &Dataset) -> Dataset {
        debug_assert!(Arc::ptr_eq(&self.table, &other.table));
        let mut rows = Vec::with_capacity(self.rows.len() + other.rows.len());
        rows.extend_from_slice(&self.rows);
        rows.extend_from_slice(&other.rows);
        let attributes = self.attributes.intersection(&other.attributes).copied().collect();
        self.subset(rows, attributes)
    }

    /// Count of each label code among the rows.
    pub fn label_counts(&self) -> Vec<usize> {
        let mut counts = vec![0; self.table.n_classes()];
        for &r in &self.rows {
            counts[self.table.label_code(r) as usize] += 1;
        }
        counts
    }

    pub fn label_sequence(&self) -> Vec<u32> {
        self.rows.iter().map(|&r| self.table.label_code(r)).collect()
    }

    pub fn distinct_value_count(&self, attr: AttributeId) -> usize {
        match self.table.column(attr) {
            Column::Categorical(codes) => {
                let mut seen = vec![false; self.table.spec(attr).domain.len()];
                self.rows.iter().for_each(|&r| seen[codes[r] as usize] = true);
                seen.into_iter().filter(|s| *s).count()
            }
            Column::Numeric(values) => {
                let mut v: Vec<f64> = self.rows.iter().map(|&r| values[r]).collect();
                v.sort_by(f64::total_cmp);
                v.dedup();
                v.len()
            }
        }
    }

    /// (value, label code) pairs of a numeric attribute, in row order.
    pub fn numeric_pairs(&self, attr: AttributeId) -> Vec<(f64, u32)> {
        match self.table.column(attr) {
            Column::Numeric(values) => self
                .rows
                .iter()
                .map(|&r| (values[r], self.table.label_code(r)))
                .collect(),
            Column::Categorical(_) => Vec::new(),
        }
    }
}
