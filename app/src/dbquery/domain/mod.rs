mod extractor;
mod json;
mod parameters;
mod query;
mod query_result;

pub use extractor::{ExtractedResult, ExtractedValue, ExtractionFailure, QueryResultExtractor};
pub use json::DbQueryJsonEncoder;
pub use parameters::QueryParameters;
pub use query::{Query, QueryFactory};
pub use query_result::{QueryResult, ResultRow};
