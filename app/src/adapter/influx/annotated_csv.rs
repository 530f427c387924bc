use std::collections::BTreeMap;

use anyhow::Context as _;

use crate::core::{time::DateTime, value::ScalarValue};

/// Bookkeeping columns of the annotated CSV format that carry no data
const IGNORED_COLUMNS: [&str; 3] = ["", "result", "table"];

#[derive(Debug, Clone, PartialEq)]
pub struct FluxRecord {
    pub values: BTreeMap<String, ScalarValue>,
}

impl FluxRecord {
    pub fn value(&self, column: &str) -> Option<&ScalarValue> {
        self.values.get(column)
    }
}

#[derive(Default)]
struct TableBlock {
    datatypes: Vec<String>,
    defaults: Vec<String>,
    header: Option<Vec<String>>,
}

impl TableBlock {
    fn value(&self, idx: usize, raw: &str) -> ScalarValue {
        let raw = match raw {
            "" => self.defaults.get(idx).map(String::as_str).unwrap_or_default(),
            _ => raw,
        };
        let datatype = self.datatypes.get(idx).map(String::as_str).unwrap_or("string");

        typed_value(datatype, raw)
    }
}

/// Decodes an InfluxDB 2 query response in annotated CSV format (`#datatype` annotation + header
/// per table). Values are typed according to the datatype annotation. Empty values take the
/// `#default` annotation of their column, or become `Null` without one.
/// An error table in the response is returned as `Err`.
pub fn parse_annotated_csv(body: &str) -> anyhow::Result<Vec<FluxRecord>> {
    let mut reader = ::csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(body.as_bytes());

    let mut records = vec![];
    let mut block = TableBlock::default();

    for record in reader.records() {
        let record = record.context("Error reading annotated CSV")?;
        let first = record.get(0).unwrap_or_default();

        if record.iter().all(str::is_empty) {
            block = TableBlock::default();
            continue;
        }

        if first.starts_with("#datatype") {
            block = TableBlock {
                datatypes: record.iter().map(str::to_owned).collect(),
                ..TableBlock::default()
            };
            continue;
        }

        if first.starts_with("#default") {
            block.defaults = record.iter().map(str::to_owned).collect();
            continue;
        }

        if first.starts_with('#') {
            continue;
        }

        let Some(header) = &block.header else {
            block.header = Some(record.iter().map(str::to_owned).collect());
            continue;
        };

        if let Some(error_idx) = header.iter().position(|c| c == "error") {
            let message = record.get(error_idx).unwrap_or_default();
            anyhow::bail!("{}", if message.is_empty() { "Unknown query error" } else { message });
        }

        let mut values = BTreeMap::new();

        for (idx, raw) in record.iter().enumerate() {
            let Some(column) = header.get(idx) else {
                continue;
            };

            if IGNORED_COLUMNS.contains(&column.as_str()) {
                continue;
            }

            values.insert(column.clone(), block.value(idx, raw));
        }

        records.push(FluxRecord { values });
    }

    Ok(records)
}

fn typed_value(datatype: &str, raw: &str) -> ScalarValue {
    if raw.is_empty() {
        return ScalarValue::Null;
    }

    let parsed = match datatype {
        "long" => raw.parse::<i64>().ok().map(ScalarValue::Integer),
        "unsignedLong" => raw
            .parse::<i64>()
            .ok()
            .map(ScalarValue::Integer)
            .or_else(|| raw.parse::<f64>().ok().map(ScalarValue::Float)),
        "double" => raw.parse::<f64>().ok().map(ScalarValue::Float),
        "boolean" => raw.parse::<bool>().ok().map(ScalarValue::Boolean),
        dt if dt.starts_with("dateTime") => DateTime::from_iso(raw).ok().map(ScalarValue::Timestamp),
        _ => None,
    };

    parsed.unwrap_or_else(|| ScalarValue::Text(raw.to_owned()))
}
