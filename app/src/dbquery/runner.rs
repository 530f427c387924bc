use std::{sync::Arc, time::Duration};

use infrastructure::EventEmitter;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::core::{time::DateTime, value::ScalarValue};

use super::{
    adapter::Database,
    config::QueryConfiguration,
    domain::{DbQueryJsonEncoder, ExtractedResult, ExtractedValue, QueryParameters, QueryResult, QueryResultExtractor},
};

#[derive(Debug, Clone, PartialEq)]
pub struct QueryOutcome {
    pub query_id: String,
    pub extracted: ExtractedResult,
    pub extracted_json: String,
    pub result_json: String,
    pub parameters_json: String,
    pub timestamp: DateTime,
}

impl QueryOutcome {
    pub fn is_correct(&self) -> bool {
        self.extracted.is_correct()
    }

    pub fn scalar(&self) -> Option<&ScalarValue> {
        match self.extracted.result() {
            ExtractedValue::Scalar(value) if self.is_correct() => Some(value),
            _ => None,
        }
    }
}

/// Handle to change the parameters of a running query
#[derive(Debug, Clone)]
pub struct QueryClient {
    query_id: String,
    tx: mpsc::Sender<QueryParameters>,
}

impl QueryClient {
    pub fn query_id(&self) -> &str {
        &self.query_id
    }

    /// Replaces the parameters with the given JSON object and executes the query right away
    pub async fn set_parameters_json(&self, json: &str) -> anyhow::Result<()> {
        let parameters = QueryParameters::from_json(json)?;

        self.tx
            .send_timeout(parameters, Duration::from_secs(5))
            .await
            .map_err(|e| anyhow::anyhow!("Parameter channel of query {} closed: {}", self.query_id, e))
    }
}

pub struct QueryRunner<D> {
    query_id: String,
    config: QueryConfiguration,
    database: Arc<D>,
    extractor: QueryResultExtractor,
    encoder: DbQueryJsonEncoder,
    parameters: QueryParameters,
    parameters_tx: mpsc::Sender<QueryParameters>,
    parameters_rx: mpsc::Receiver<QueryParameters>,
    emitter: EventEmitter<QueryOutcome>,
}

impl<D: Database> QueryRunner<D> {
    pub fn new(
        query_id: impl Into<String>,
        config: QueryConfiguration,
        database: Arc<D>,
        emitter: EventEmitter<QueryOutcome>,
    ) -> Self {
        let (parameters_tx, parameters_rx) = mpsc::channel(16);

        Self {
            query_id: query_id.into(),
            extractor: QueryResultExtractor::new(&config),
            encoder: DbQueryJsonEncoder,
            config,
            database,
            parameters: QueryParameters::EMPTY,
            parameters_tx,
            parameters_rx,
            emitter,
        }
    }

    pub fn query_id(&self) -> &str {
        &self.query_id
    }

    pub fn client(&self) -> QueryClient {
        QueryClient {
            query_id: self.query_id.clone(),
            tx: self.parameters_tx.clone(),
        }
    }

    /// Executes the query every `interval` seconds (starting immediately) and on each parameter
    /// update until cancelled. Without an interval the query only runs on parameter updates.
    pub async fn run(mut self, cancel: CancellationToken) {
        let mut timer = (self.config.interval > 0)
            .then(|| tokio::time::interval(Duration::from_secs(self.config.interval)));

        tracing::info!(
            "Starting query {} (interval {}s, timeout {}s)",
            self.query_id,
            self.config.interval,
            self.config.timeout
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Stopping query {}", self.query_id);
                    break;
                }

                _ = tick(&mut timer) => {
                    self.execute().await;
                }

                parameters = self.parameters_rx.recv() => {
                    let Some(parameters) = parameters else {
                        break;
                    };

                    if !self.config.has_parameters {
                        tracing::warn!("Query {} doesn't accept parameters, ignoring update", self.query_id);
                        continue;
                    }

                    self.parameters = parameters;
                    self.execute().await;
                }
            }
        }
    }

    #[tracing::instrument(skip(self), fields(query_id = %self.query_id))]
    pub async fn execute(&self) -> Option<QueryOutcome> {
        if !self.database.is_connected() && !self.reconnect().await {
            tracing::warn!("Database not connected, skipping query {}", self.query_id);
            return None;
        }

        let query = self
            .database
            .query_factory()
            .create_query(&self.config.query, &self.parameters, Some(&self.config));

        let execution = self.database.execute_query(&query);
        let result = match query.timeout() {
            Some(timeout) => match tokio::time::timeout(timeout, execution).await {
                Ok(result) => result,
                Err(_) => Ok(QueryResult::of_incorrect_result("Query timeout")),
            },
            None => execution.await,
        };

        let result = match result {
            Ok(result) => result,
            Err(e) => {
                tracing::error!("Error executing query {}: {:?}", self.query_id, e);
                return None;
            }
        };

        let outcome = match self.to_outcome(result) {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!("Error encoding result of query {}: {:?}", self.query_id, e);
                return None;
            }
        };

        tracing::debug!("Query {} executed, correct: {}", self.query_id, outcome.is_correct());
        self.emitter.send(outcome.clone());
        Some(outcome)
    }

    async fn reconnect(&self) -> bool {
        match self.database.connect().await {
            Ok(connected) => connected,
            Err(e) => {
                tracing::error!("Error reconnecting database of query {}: {:?}", self.query_id, e);
                false
            }
        }
    }

    fn to_outcome(&self, result: QueryResult) -> anyhow::Result<QueryOutcome> {
        let result_json = self.encoder.encode_result(&result)?;
        let parameters_json = self.encoder.encode_parameters(&self.parameters)?;
        let extracted = self.extractor.extract_result(result);
        let extracted_json = self.encoder.encode_extracted(&extracted)?;

        if let Some(failure) = extracted.failure() {
            tracing::debug!("Result of query {} is incorrect: {}", self.query_id, failure);
        }

        Ok(QueryOutcome {
            query_id: self.query_id.clone(),
            extracted,
            extracted_json,
            result_json,
            parameters_json,
            timestamp: DateTime::now(),
        })
    }
}

async fn tick(timer: &mut Option<tokio::time::Interval>) {
    match timer {
        Some(timer) => {
            timer.tick().await;
        }
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use infrastructure::EventBus;

    use super::*;
    use crate::dbquery::domain::{Query, QueryFactory, ResultRow};

    #[derive(Default)]
    struct FakeDatabase {
        delay: Option<Duration>,
        executed: std::sync::Mutex<Vec<String>>,
        disconnected: AtomicBool,
        failing_connects: AtomicUsize,
        connect_attempts: AtomicUsize,
    }

    impl FakeDatabase {
        fn unavailable_for(failing_connects: usize) -> Self {
            Self {
                disconnected: AtomicBool::new(true),
                failing_connects: AtomicUsize::new(failing_connects),
                ..Default::default()
            }
        }
    }

    impl Database for FakeDatabase {
        async fn connect(&self) -> anyhow::Result<bool> {
            self.connect_attempts.fetch_add(1, Ordering::SeqCst);
            if self.failing_connects.load(Ordering::SeqCst) > 0 {
                self.failing_connects.fetch_sub(1, Ordering::SeqCst);
                return Ok(false);
            }

            self.disconnected.store(false, Ordering::SeqCst);
            Ok(true)
        }

        async fn disconnect(&self) {
            self.disconnected.store(true, Ordering::SeqCst);
        }

        fn is_connected(&self) -> bool {
            !self.disconnected.load(Ordering::SeqCst)
        }

        fn query_factory(&self) -> QueryFactory {
            QueryFactory
        }

        async fn execute_query(&self, query: &Query) -> anyhow::Result<QueryResult> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }

            self.executed.lock().unwrap().push(query.text().to_owned());
            Ok(QueryResult::of(vec![ResultRow::from_iter([("_value", 42)])]))
        }
    }

    fn runner(config: QueryConfiguration, database: FakeDatabase) -> (QueryRunner<FakeDatabase>, EventBus<QueryOutcome>) {
        let bus = EventBus::new(16);
        let runner = QueryRunner::new("q1", config, Arc::new(database), bus.emitter());
        (runner, bus)
    }

    #[tokio::test]
    async fn scalar_outcome_is_emitted() {
        let config = QueryConfiguration::new("query", 0, 0, true, None, false);
        let (runner, bus) = runner(config, FakeDatabase::default());
        let mut listener = bus.subscribe();

        let outcome = runner.execute().await.unwrap();

        assert!(outcome.is_correct());
        assert_eq!(outcome.scalar(), Some(&ScalarValue::Integer(42)));
        assert_eq!(outcome.parameters_json, "{}");
        assert_eq!(outcome.extracted_json, r#"{"correct":true,"result":42}"#);
        assert_eq!(listener.recv().await, Some(outcome));
    }

    #[tokio::test]
    async fn table_outcome_carries_result_json() {
        let config = QueryConfiguration::new("query", 0, 0, false, None, false);
        let (runner, _bus) = runner(config, FakeDatabase::default());

        let outcome = runner.execute().await.unwrap();

        assert!(outcome.is_correct());
        assert_eq!(outcome.scalar(), None);
        assert_eq!(outcome.result_json, r#"{"correct":true,"data":[{"_value":42}]}"#);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_query_times_out() {
        let config = QueryConfiguration::new("query", 0, 1, true, None, false);
        let database = FakeDatabase {
            delay: Some(Duration::from_secs(5)),
            ..Default::default()
        };
        let (runner, _bus) = runner(config, database);

        let outcome = runner.execute().await.unwrap();

        assert!(!outcome.is_correct());
        assert_eq!(outcome.extracted.result(), &ExtractedValue::None);
        assert!(outcome.result_json.contains("Query timeout"));
    }

    #[tokio::test]
    async fn nothing_is_executed_while_database_is_unavailable() {
        let config = QueryConfiguration::new("query", 0, 0, true, None, false);
        let (runner, _bus) = runner(config, FakeDatabase::unavailable_for(usize::MAX));

        assert_eq!(runner.execute().await, None);
        assert!(runner.database.executed.lock().unwrap().is_empty());
        assert_eq!(runner.database.connect_attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn database_becoming_ready_is_picked_up_on_next_tick() {
        let config = QueryConfiguration::new("query", 10, 0, true, None, false);
        let (runner, bus) = runner(config, FakeDatabase::unavailable_for(1));
        let mut listener = bus.subscribe();
        let database = runner.database.clone();
        let cancel = CancellationToken::new();

        let run = runner.run(cancel.clone());
        let drive = async {
            let outcome = listener.recv().await;
            cancel.cancel();
            outcome
        };

        let (_, outcome) = tokio::join!(run, drive);

        assert_eq!(outcome.and_then(|o| o.scalar().cloned()), Some(ScalarValue::Integer(42)));
        assert_eq!(database.connect_attempts.load(Ordering::SeqCst), 2);
        assert_eq!(database.executed.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn parameter_update_executes_query_with_new_parameters() {
        let config = QueryConfiguration::new("value of ${item}", 0, 0, true, None, true);
        let (runner, bus) = runner(config, FakeDatabase::default());
        let mut listener = bus.subscribe();
        let client = runner.client();
        let database = runner.database.clone();
        let cancel = CancellationToken::new();

        let run = runner.run(cancel.clone());
        let drive = async {
            client.set_parameters_json(r#"{"item": "temp"}"#).await.unwrap();
            let outcome = listener.recv().await.unwrap();
            cancel.cancel();
            outcome
        };

        let (_, outcome) = tokio::join!(run, drive);

        assert_eq!(outcome.parameters_json, r#"{"item":"temp"}"#);
        assert_eq!(*database.executed.lock().unwrap(), vec!["value of temp".to_owned()]);
    }

    #[tokio::test]
    async fn parameters_are_ignored_without_parameter_support() {
        let config = QueryConfiguration::new("value of ${item}", 0, 0, true, None, false);
        let (runner, _bus) = runner(config, FakeDatabase::default());
        let client = runner.client();
        let database = runner.database.clone();
        let cancel = CancellationToken::new();

        let run = runner.run(cancel.clone());
        let drive = async {
            client.set_parameters_json(r#"{"item": "temp"}"#).await.unwrap();
            tokio::task::yield_now().await;
            tokio::task::yield_now().await;
            cancel.cancel();
        };

        tokio::join!(run, drive);

        assert!(database.executed.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn periodic_query_runs_on_start_and_each_interval() {
        let config = QueryConfiguration::new("query", 10, 0, true, None, false);
        let (runner, bus) = runner(config, FakeDatabase::default());
        let mut listener = bus.subscribe();
        let cancel = CancellationToken::new();
        let count = AtomicUsize::new(0);

        let run = runner.run(cancel.clone());
        let drive = async {
            while count.load(Ordering::SeqCst) < 2 {
                listener.recv().await;
                count.fetch_add(1, Ordering::SeqCst);
            }
            cancel.cancel();
        };

        tokio::join!(run, drive);

        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn invalid_parameter_json_is_rejected() {
        let config = QueryConfiguration::new("query", 0, 0, true, None, true);
        let (runner, _bus) = runner(config, FakeDatabase::default());

        assert!(runner.client().set_parameters_json("[1, 2]").await.is_err());
    }
}
