#![allow(async_fn_in_trait)]

mod influx2;

pub use influx2::{Influx2Database, InfluxClientFacade};

use crate::dbquery::domain::{Query, QueryFactory, QueryResult};

pub trait Database {
    /// Establishes the connection, returns whether the database is usable afterwards
    async fn connect(&self) -> anyhow::Result<bool>;

    async fn disconnect(&self);

    fn is_connected(&self) -> bool;

    fn query_factory(&self) -> QueryFactory;

    /// Fails if not connected. Failures reported by the database are returned as incorrect results.
    async fn execute_query(&self, query: &Query) -> anyhow::Result<QueryResult>;
}
