//! Tabular store for the catalog metadata table.
//!
//! Rows are keyed by a dense `row_index` assigned at load time. Indices are
//! never renumbered: a filtered store keeps the indices of the rows it retains,
//! so they become a sparse subset of the original range.

use crate::{Error, Result};
use csv::StringRecord;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io;
use std::path::Path;

/// File name of the metadata table inside a catalog directory
pub const METADATA_FILE: &str = "metadata.csv";

/// Column holding the globally unique asset id
pub const FULL_ID_COLUMN: &str = "fullId";

/// The searchable text fields of a row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SearchField {
    Category,
    WordnetLemmas,
    Tags,
    Name,
}

impl SearchField {
    pub const ALL: [SearchField; 4] = [
        SearchField::Category,
        SearchField::WordnetLemmas,
        SearchField::Tags,
        SearchField::Name,
    ];

    /// Column name of this field in the metadata table
    pub fn column(self) -> &'static str {
        match self {
            SearchField::Category => "category",
            SearchField::WordnetLemmas => "wnlemmas",
            SearchField::Tags => "tags",
            SearchField::Name => "name",
        }
    }
}

/// One catalog entry
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub row_index: usize,
    pub full_id: String,
    fields: [Option<String>; 4],
    record: StringRecord,
}

impl Row {
    /// Create a row with no searchable values and an empty raw record
    #[must_use]
    pub fn new(row_index: usize, full_id: impl Into<String>) -> Self {
        Self {
            row_index,
            full_id: full_id.into(),
            fields: Default::default(),
            record: StringRecord::new(),
        }
    }

    #[must_use]
    pub fn with_field(mut self, field: SearchField, value: impl Into<String>) -> Self {
        let value = value.into();
        self.fields[field as usize] = if value.is_empty() { None } else { Some(value) };
        self
    }

    /// Value of a searchable field, `None` when the cell was empty
    #[inline]
    pub fn field(&self, field: SearchField) -> Option<&str> {
        self.fields[field as usize].as_deref()
    }

    /// The raw record as read from the source table
    #[inline]
    pub fn record(&self) -> &StringRecord {
        &self.record
    }
}

/// Distinct values of a column, with absent cells counted apart from real values
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ColumnValues {
    pub values: BTreeSet<String>,
    pub missing: usize,
}

/// Overview of the catalog's category column
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CategorySummary {
    pub categories: BTreeSet<String>,
    pub missing: usize,
    pub top_level: BTreeSet<String>,
    /// Top-level categories starting with `_`, e.g. `_StanfordSceneDBModels`
    pub unusual: BTreeSet<String>,
}

impl CategorySummary {
    pub fn from_values(values: &ColumnValues) -> Self {
        let top_level: BTreeSet<String> = values
            .values
            .iter()
            .filter_map(|c| c.split(',').next())
            .map(str::to_string)
            .collect();
        let unusual = top_level
            .iter()
            .filter(|c| c.starts_with('_'))
            .cloned()
            .collect();

        Self {
            categories: values.values.clone(),
            missing: values.missing,
            top_level,
            unusual,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct ColumnPositions {
    full_id: usize,
    fields: [usize; 4],
}

impl ColumnPositions {
    fn resolve(headers: &StringRecord) -> Result<Self> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| Error::Load(format!("missing required column '{}'", name)))
        };

        Ok(Self {
            full_id: find(FULL_ID_COLUMN)?,
            fields: [
                find(SearchField::Category.column())?,
                find(SearchField::WordnetLemmas.column())?,
                find(SearchField::Tags.column())?,
                find(SearchField::Name.column())?,
            ],
        })
    }
}

fn cell(record: &StringRecord, position: usize) -> Option<&str> {
    record.get(position).filter(|v| !v.is_empty())
}

/// In-memory metadata table
#[derive(Debug, Clone)]
pub struct TabularStore {
    headers: StringRecord,
    rows: BTreeMap<usize, Row>,
}

impl TabularStore {
    /// Load `metadata.csv` from a catalog directory
    pub fn open<P: AsRef<Path>>(datadir: P) -> Result<Self> {
        let path = datadir.as_ref().join(METADATA_FILE);
        let file = File::open(&path)
            .map_err(|e| Error::Load(format!("{}: {}", path.display(), e)))?;
        Self::from_reader(io::BufReader::new(file))
    }

    /// Parse a delimited table with a header line
    pub fn from_reader<R: io::Read>(reader: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);
        let headers = reader.headers()?.clone();
        let positions = ColumnPositions::resolve(&headers)?;

        let mut rows = BTreeMap::new();
        for (row_index, record) in reader.records().enumerate() {
            let mut record = record?;
            if record.len() > headers.len() {
                return Err(Error::Load(format!(
                    "row {} has {} fields, expected {}",
                    row_index,
                    record.len(),
                    headers.len()
                )));
            }
            // short rows are padded with absent cells
            while record.len() < headers.len() {
                record.push_field("");
            }
            let full_id = cell(&record, positions.full_id)
                .ok_or_else(|| Error::Load(format!("row {} has no {}", row_index, FULL_ID_COLUMN)))?
                .to_string();
            let fields = positions
                .fields
                .map(|p| cell(&record, p).map(str::to_string));

            rows.insert(row_index, Row { row_index, full_id, fields, record });
        }

        tracing::debug!("Parsed {} rows with {} columns", rows.len(), headers.len());
        Ok(Self { headers, rows })
    }

    pub fn headers(&self) -> &StringRecord {
        &self.headers
    }

    #[inline]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row_at(&self, row_index: usize) -> Result<&Row> {
        self.rows.get(&row_index).ok_or(Error::RowNotFound(row_index))
    }

    /// All rows in ascending `row_index` order
    pub fn rows(&self) -> impl Iterator<Item = (usize, &Row)> + '_ {
        self.rows.iter().map(|(idx, row)| (*idx, row))
    }

    /// Value of any column for a row, `None` for an empty cell
    pub fn cell<'a>(&self, row: &'a Row, column: &str) -> Option<&'a str> {
        let position = self.headers.iter().position(|h| h == column)?;
        cell(&row.record, position)
    }

    pub fn distinct_values(&self, column: &str) -> Result<ColumnValues> {
        let position = self
            .headers
            .iter()
            .position(|h| h == column)
            .ok_or_else(|| Error::Load(format!("unknown column '{}'", column)))?;

        let mut out = ColumnValues::default();
        for row in self.rows.values() {
            match cell(&row.record, position) {
                Some(v) => {
                    out.values.insert(v.to_string());
                }
                None => out.missing += 1,
            }
        }
        Ok(out)
    }

    pub fn category_summary(&self) -> Result<CategorySummary> {
        let values = self.distinct_values(SearchField::Category.column())?;
        Ok(CategorySummary::from_values(&values))
    }

    /// Row subset keeping original indices and the full column set
    pub fn filtered<F>(&self, mut keep: F) -> TabularStore
    where
        F: FnMut(&Row) -> bool,
    {
        let rows = self
            .rows
            .iter()
            .filter(|(_, row)| keep(row))
            .map(|(idx, row)| (*idx, row.clone()))
            .collect();

        TabularStore {
            headers: self.headers.clone(),
            rows,
        }
    }

    /// Write header and rows back out, no index column
    pub fn write_csv<W: io::Write>(&self, writer: W) -> Result<()> {
        let mut writer = csv::Writer::from_writer(writer);
        writer.write_record(&self.headers)?;
        for row in self.rows.values() {
            writer.write_record(&row.record)?;
        }
        writer.flush()?;
        Ok(())
    }
}
