mod annotated_csv;
mod client;

pub use annotated_csv::{FluxRecord, parse_annotated_csv};
pub use client::HttpInfluxClient;
