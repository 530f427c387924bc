mod datetime;

pub use datetime::DateTime;
