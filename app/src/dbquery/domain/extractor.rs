use derive_more::Display;
use serde::Serialize;

use crate::{core::value::ScalarValue, dbquery::config::QueryConfiguration};

use super::QueryResult;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ExtractedValue {
    Table(QueryResult),
    Scalar(ScalarValue),
    None,
}

/// Why a result couldn't be extracted. Upstream failures and shape mismatches are both reported as
/// incorrect results, this keeps them apart for logging and callers that care.
#[derive(Debug, Clone, PartialEq, Display)]
pub enum ExtractionFailure {
    #[display("query failed: {}", message.as_deref().unwrap_or("no error message"))]
    QueryFailed { message: Option<String> },

    #[display("scalar result needs exactly one row, got {rows}")]
    UnexpectedRowCount { rows: usize },

    #[display("scalar result is ambiguous, row has {columns} columns and no scalar column is configured")]
    AmbiguousColumn { columns: usize },

    #[display("scalar column {column} is not part of the result")]
    MissingScalarColumn { column: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractedResult {
    correct: bool,
    #[serde(rename = "result")]
    value: ExtractedValue,
    #[serde(skip)]
    failure: Option<ExtractionFailure>,
}

impl ExtractedResult {
    fn of(value: ExtractedValue) -> Self {
        Self {
            correct: true,
            value,
            failure: None,
        }
    }

    fn incorrect(failure: ExtractionFailure) -> Self {
        Self {
            correct: false,
            value: ExtractedValue::None,
            failure: Some(failure),
        }
    }

    pub fn is_correct(&self) -> bool {
        self.correct
    }

    pub fn result(&self) -> &ExtractedValue {
        &self.value
    }

    pub fn failure(&self) -> Option<&ExtractionFailure> {
        self.failure.as_ref()
    }
}

/// Decides whether a query result is passed through as a table or collapsed to a single value
#[derive(Debug, Clone)]
pub struct QueryResultExtractor {
    scalar_result: bool,
    scalar_column: Option<String>,
}

impl QueryResultExtractor {
    pub fn new(config: &QueryConfiguration) -> Self {
        Self {
            scalar_result: config.scalar_result,
            scalar_column: config.scalar_column().map(str::to_owned),
        }
    }

    pub fn extract_result(&self, result: QueryResult) -> ExtractedResult {
        if !result.is_correct() {
            return ExtractedResult::incorrect(ExtractionFailure::QueryFailed {
                message: result.error_message().map(str::to_owned),
            });
        }

        if !self.scalar_result {
            return ExtractedResult::of(ExtractedValue::Table(result));
        }

        match self.extract_scalar(&result) {
            Ok(value) => ExtractedResult::of(ExtractedValue::Scalar(value)),
            Err(failure) => {
                tracing::warn!("Scalar result couldn't be extracted: {}", failure);
                ExtractedResult::incorrect(failure)
            }
        }
    }

    fn extract_scalar(&self, result: &QueryResult) -> Result<ScalarValue, ExtractionFailure> {
        let [row] = result.data() else {
            return Err(ExtractionFailure::UnexpectedRowCount {
                rows: result.data().len(),
            });
        };

        if let Some(value) = row.single_value() {
            return Ok(value.clone());
        }

        match &self.scalar_column {
            Some(column) => row
                .value(column)
                .cloned()
                .ok_or_else(|| ExtractionFailure::MissingScalarColumn { column: column.clone() }),
            None => Err(ExtractionFailure::AmbiguousColumn {
                columns: row.columns_size(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dbquery::domain::ResultRow;

    fn several_rows_columns_result() -> QueryResult {
        QueryResult::of(vec![
            ResultRow::from_iter([("valueName", "value1"), ("column2", "value2")]),
            ResultRow::from_iter([("valueName", "value1"), ("column2", "value2")]),
        ])
    }

    fn one_row_several_columns_result() -> QueryResult {
        QueryResult::of(vec![ResultRow::from_iter([("valueName", "value1"), ("column2", "value2")])])
    }

    fn scalar_config() -> QueryConfiguration {
        QueryConfiguration::new("query", 10, 10, true, None, false)
    }

    fn non_scalar_config() -> QueryConfiguration {
        QueryConfiguration::new("query", 10, 10, false, None, false)
    }

    fn scalar_config_with_column(column: &str) -> QueryConfiguration {
        QueryConfiguration::new("query", 10, 10, true, Some(column.to_owned()), false)
    }

    #[test]
    fn one_row_one_column_with_scalar_config_returns_scalar() {
        let extracted = QueryResultExtractor::new(&scalar_config())
            .extract_result(QueryResult::of_single_value("AnyValueName", "value"));

        assert!(extracted.is_correct());
        assert_eq!(extracted.result(), &ExtractedValue::Scalar("value".into()));
    }

    #[test]
    fn one_row_one_column_ignores_configured_scalar_column() {
        let extracted = QueryResultExtractor::new(&scalar_config_with_column("other"))
            .extract_result(QueryResult::of_single_value("AnyValueName", 42));

        assert!(extracted.is_correct());
        assert_eq!(extracted.result(), &ExtractedValue::Scalar(42.into()));
    }

    #[test]
    fn several_rows_with_scalar_config_is_incorrect() {
        let extracted = QueryResultExtractor::new(&scalar_config()).extract_result(several_rows_columns_result());

        assert!(!extracted.is_correct());
        assert_eq!(extracted.result(), &ExtractedValue::None);
        assert_eq!(extracted.failure(), Some(&ExtractionFailure::UnexpectedRowCount { rows: 2 }));
    }

    #[test]
    fn several_rows_with_scalar_column_is_still_incorrect() {
        let extracted = QueryResultExtractor::new(&scalar_config_with_column("valueName"))
            .extract_result(several_rows_columns_result());

        assert!(!extracted.is_correct());
        assert_eq!(extracted.result(), &ExtractedValue::None);
    }

    #[test]
    fn no_rows_with_scalar_config_is_incorrect() {
        let extracted = QueryResultExtractor::new(&scalar_config()).extract_result(QueryResult::no_results());

        assert!(!extracted.is_correct());
        assert_eq!(extracted.failure(), Some(&ExtractionFailure::UnexpectedRowCount { rows: 0 }));
    }

    #[test]
    fn several_columns_with_scalar_config_is_incorrect() {
        let extracted = QueryResultExtractor::new(&scalar_config()).extract_result(one_row_several_columns_result());

        assert!(!extracted.is_correct());
        assert_eq!(extracted.result(), &ExtractedValue::None);
        assert_eq!(extracted.failure(), Some(&ExtractionFailure::AmbiguousColumn { columns: 2 }));
    }

    #[test]
    fn several_columns_with_scalar_column_returns_its_value() {
        let extracted = QueryResultExtractor::new(&scalar_config_with_column("valueName"))
            .extract_result(one_row_several_columns_result());

        assert!(extracted.is_correct());
        assert_eq!(extracted.result(), &ExtractedValue::Scalar("value1".into()));
    }

    #[test]
    fn several_columns_with_absent_scalar_column_is_incorrect() {
        let extracted = QueryResultExtractor::new(&scalar_config_with_column("missing"))
            .extract_result(one_row_several_columns_result());

        assert!(!extracted.is_correct());
        assert_eq!(
            extracted.failure(),
            Some(&ExtractionFailure::MissingScalarColumn {
                column: "missing".to_owned()
            })
        );
    }

    #[test]
    fn several_rows_with_non_scalar_config_returns_query_result() {
        let extracted = QueryResultExtractor::new(&non_scalar_config()).extract_result(several_rows_columns_result());

        assert!(extracted.is_correct());
        assert_eq!(extracted.result(), &ExtractedValue::Table(several_rows_columns_result()));
    }

    #[test]
    fn incorrect_result_is_incorrect_for_any_config() {
        for config in [scalar_config(), non_scalar_config(), scalar_config_with_column("valueName")] {
            let extracted = QueryResultExtractor::new(&config)
                .extract_result(QueryResult::of_incorrect_result("Incorrect result"));

            assert!(!extracted.is_correct());
            assert_eq!(extracted.result(), &ExtractedValue::None);
            assert_eq!(
                extracted.failure(),
                Some(&ExtractionFailure::QueryFailed {
                    message: Some("Incorrect result".to_owned())
                })
            );
        }
    }
}
