use std::collections::BTreeMap;

use serde::Serialize;

use crate::core::value::ScalarValue;

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct ResultRow {
    values: BTreeMap<String, ScalarValue>,
}

impl ResultRow {
    pub fn new(values: BTreeMap<String, ScalarValue>) -> Self {
        Self { values }
    }

    pub fn columns_size(&self) -> usize {
        self.values.len()
    }

    pub fn value(&self, column: &str) -> Option<&ScalarValue> {
        self.values.get(column)
    }

    /// The value of a row that consists of exactly one column
    pub fn single_value(&self) -> Option<&ScalarValue> {
        match self.values.len() {
            1 => self.values.values().next(),
            _ => None,
        }
    }
}

impl<K: Into<String>, V: Into<ScalarValue>> FromIterator<(K, V)> for ResultRow {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self::new(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Tabular result of a query execution. An incorrect result never carries data.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult {
    correct: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_message: Option<String>,
    data: Vec<ResultRow>,
}

impl QueryResult {
    pub fn of(rows: Vec<ResultRow>) -> Self {
        Self {
            correct: true,
            error_message: None,
            data: rows,
        }
    }

    pub fn of_incorrect_result(message: impl Into<String>) -> Self {
        Self {
            correct: false,
            error_message: Some(message.into()),
            data: vec![],
        }
    }

    pub fn no_results() -> Self {
        Self::of(vec![])
    }

    pub fn is_correct(&self) -> bool {
        self.correct
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn data(&self) -> &[ResultRow] {
        &self.data
    }
}

#[cfg(test)]
impl QueryResult {
    pub fn of_single_value(column: impl Into<String>, value: impl Into<ScalarValue>) -> Self {
        Self::of(vec![ResultRow::from_iter([(column.into(), value.into())])])
    }
}
