//! Loading transaction and income records
//!
//! Two shapes are accepted:
//! - CSV with a header row: `date,name,category,amount[,id]` for
//!   transactions and `date,amount` for income. Columns are matched by
//!   header name, case-insensitively, so their order does not matter.
//! - A JSON dataset: `{"transactions": [...], "income": [...]}` using the
//!   same camelCase shape the engine serializes.
//!
//! A bad row never aborts the load. It is logged and reported in
//! [`ImportReport::rejected`] and the remaining rows are kept.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::models::{IncomeRecord, Transaction};

/// A row that could not be turned into a record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectedRow {
    /// 1-based line for CSV (the header is line 1), 1-based index for JSON
    pub line: u64,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport<T> {
    pub records: Vec<T>,
    pub rejected: Vec<RejectedRow>,
}

impl<T> Default for ImportReport<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            rejected: Vec::new(),
        }
    }
}

impl<T> ImportReport<T> {
    fn reject(&mut self, line: u64, reason: impl Into<String>) {
        let reason = reason.into();
        warn!(line, reason = %reason, "Rejected import row");
        self.rejected.push(RejectedRow { line, reason });
    }
}

/// Records loaded from a JSON dataset
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    #[serde(default, alias = "incomeRecords")]
    pub income: Vec<IncomeRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetReport {
    pub dataset: Dataset,
    pub rejected_transactions: Vec<RejectedRow>,
    pub rejected_income: Vec<RejectedRow>,
}

/// Parse a date in any of the formats bank exports commonly use
pub fn parse_flexible_date(s: &str) -> Result<NaiveDate> {
    let s = s.trim();
    let formats = [
        "%Y-%m-%d", // 2024-01-15
        "%m/%d/%y", // 01/15/24
        "%m/%d/%Y", // 01/15/2024
    ];

    for fmt in formats {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(date);
        }
    }

    Err(Error::InvalidDate(s.to_string()))
}

/// Parse an amount string, handling currency symbols and thousands separators
pub fn parse_amount(s: &str) -> Result<f64> {
    let cleaned = s.trim().replace(['$', ',', ' '], "");
    cleaned
        .parse::<f64>()
        .map_err(|_| Error::Import(format!("Unable to parse amount: {}", s)))
}

/// Header positions by lowercase column name
struct Columns {
    headers: Vec<String>,
}

impl Columns {
    fn new(headers: &StringRecord) -> Self {
        Self {
            headers: headers.iter().map(|h| h.trim().to_lowercase()).collect(),
        }
    }

    fn find(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    fn require(&self, name: &str) -> Result<usize> {
        self.find(name)
            .ok_or_else(|| Error::Import(format!("Missing column: {}", name)))
    }
}

fn field<'r>(record: &'r StringRecord, index: usize, name: &str) -> Result<&'r str> {
    record
        .get(index)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| Error::Import(format!("Missing {}", name)))
}

fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader)
}

/// Parse transactions from CSV (`date,name,category,amount[,id]`)
pub fn parse_transactions_csv<R: Read>(reader: R) -> Result<ImportReport<Transaction>> {
    let mut rdr = csv_reader(reader);
    let columns = Columns::new(rdr.headers()?);
    let date_col = columns.require("date")?;
    let name_col = columns.require("name")?;
    let category_col = columns.require("category")?;
    let amount_col = columns.require("amount")?;
    let id_col = columns.find("id");

    let mut report = ImportReport::default();
    for (i, result) in rdr.records().enumerate() {
        let line = i as u64 + 2;
        let parsed = result.map_err(Error::from).and_then(|record| {
            let date = parse_flexible_date(field(&record, date_col, "date")?)?;
            let amount = parse_amount(field(&record, amount_col, "amount")?)?;
            let category = field(&record, category_col, "category")?;
            let name = record.get(name_col).unwrap_or("").trim();
            let tx = Transaction::new(amount, category, date, name)?;
            Ok(match id_col.and_then(|c| record.get(c)).filter(|s| !s.is_empty()) {
                Some(id) => tx.with_id(id),
                None => tx,
            })
        });

        match parsed {
            Ok(tx) => report.records.push(tx),
            Err(e) => report.reject(line, e.to_string()),
        }
    }

    debug!(
        parsed = report.records.len(),
        rejected = report.rejected.len(),
        "Parsed transaction CSV"
    );
    Ok(report)
}

/// Parse income records from CSV (`date,amount`)
pub fn parse_income_csv<R: Read>(reader: R) -> Result<ImportReport<IncomeRecord>> {
    let mut rdr = csv_reader(reader);
    let columns = Columns::new(rdr.headers()?);
    let date_col = columns.require("date")?;
    let amount_col = columns.require("amount")?;

    let mut report = ImportReport::default();
    for (i, result) in rdr.records().enumerate() {
        let line = i as u64 + 2;
        let parsed = result.map_err(Error::from).and_then(|record| {
            let date = parse_flexible_date(field(&record, date_col, "date")?)?;
            let amount = parse_amount(field(&record, amount_col, "amount")?)?;
            IncomeRecord::new(amount, date)
        });

        match parsed {
            Ok(record) => report.records.push(record),
            Err(e) => report.reject(line, e.to_string()),
        }
    }

    debug!(
        parsed = report.records.len(),
        rejected = report.rejected.len(),
        "Parsed income CSV"
    );
    Ok(report)
}

#[derive(Deserialize)]
struct RawDataset {
    #[serde(default)]
    transactions: Vec<Value>,
    #[serde(default, alias = "incomeRecords")]
    income: Vec<Value>,
}

fn parse_each<T, F>(values: Vec<Value>, validate: F) -> ImportReport<T>
where
    T: serde::de::DeserializeOwned,
    F: Fn(&T) -> Result<()>,
{
    let mut report = ImportReport::default();
    for (i, value) in values.into_iter().enumerate() {
        let line = i as u64 + 1;
        match serde_json::from_value::<T>(value)
            .map_err(Error::from)
            .and_then(|record| validate(&record).map(|_| record))
        {
            Ok(record) => report.records.push(record),
            Err(e) => report.reject(line, e.to_string()),
        }
    }
    report
}

/// Parse a JSON dataset, validating each record on its own
///
/// Malformed JSON as a whole is an error; a malformed record is rejected.
pub fn parse_dataset_json<R: Read>(reader: R) -> Result<DatasetReport> {
    let raw: RawDataset = serde_json::from_reader(reader)?;
    let transactions = parse_each(raw.transactions, Transaction::validate);
    let income = parse_each(raw.income, IncomeRecord::validate);

    debug!(
        transactions = transactions.records.len(),
        income = income.records.len(),
        rejected = transactions.rejected.len() + income.rejected.len(),
        "Parsed dataset"
    );

    Ok(DatasetReport {
        dataset: Dataset {
            transactions: transactions.records,
            income: income.records,
        },
        rejected_transactions: transactions.rejected,
        rejected_income: income.rejected,
    })
}

fn open(path: &Path) -> Result<File> {
    File::open(path).map_err(|e| Error::Import(format!("Failed to open {}: {}", path.display(), e)))
}

pub fn load_transactions_csv(path: &Path) -> Result<ImportReport<Transaction>> {
    parse_transactions_csv(open(path)?)
}

pub fn load_income_csv(path: &Path) -> Result<ImportReport<IncomeRecord>> {
    parse_income_csv(open(path)?)
}

pub fn load_dataset(path: &Path) -> Result<DatasetReport> {
    parse_dataset_json(open(path)?)
}
