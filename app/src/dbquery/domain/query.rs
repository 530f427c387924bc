use std::time::Duration;

use crate::dbquery::config::QueryConfiguration;

use super::QueryParameters;

#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    text: String,
    timeout: Option<Duration>,
}

impl Query {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

/// Builds executable queries by substituting `${name}` placeholders with parameter values
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryFactory;

impl QueryFactory {
    pub fn create_query(&self, query: &str, parameters: &QueryParameters, config: Option<&QueryConfiguration>) -> Query {
        Query {
            text: substitute_parameters(query, parameters),
            timeout: config.and_then(|c| (c.timeout > 0).then(|| Duration::from_secs(c.timeout))),
        }
    }
}

fn substitute_parameters(query: &str, parameters: &QueryParameters) -> String {
    let mut result = String::with_capacity(query.len());
    let mut rest = query;

    while let Some(start) = rest.find("${") {
        let Some(len) = rest[start + 2..].find('}') else {
            break;
        };

        let name = &rest[start + 2..start + 2 + len];
        result.push_str(&rest[..start]);

        match parameters.get(name) {
            Some(value) => result.push_str(&value.to_string()),
            None => tracing::warn!("Query parameter {} not provided, substituting empty value", name),
        }

        rest = &rest[start + 2 + len + 1..];
    }

    result.push_str(rest);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::value::ScalarValue;

    #[test]
    fn parameters_are_substituted() {
        let params = QueryParameters::from_iter([("item", ScalarValue::from("temp")), ("limit", ScalarValue::from(5))]);

        let query = QueryFactory.create_query(
            r#"from(bucket:"b") |> filter(fn: (r) => r.item == "${item}") |> limit(n: ${limit})"#,
            &params,
            None,
        );

        assert_eq!(
            query.text(),
            r#"from(bucket:"b") |> filter(fn: (r) => r.item == "temp") |> limit(n: 5)"#
        );
    }

    #[test]
    fn missing_parameters_become_empty() {
        let query = QueryFactory.create_query("a ${missing} b", &QueryParameters::EMPTY, None);

        assert_eq!(query.text(), "a  b");
    }

    #[test]
    fn unterminated_placeholder_is_kept() {
        let query = QueryFactory.create_query("a ${open", &QueryParameters::EMPTY, None);

        assert_eq!(query.text(), "a ${open");
    }

    #[test]
    fn timeout_is_taken_from_configuration() {
        let config = QueryConfiguration::new("q", 0, 15, false, None, false);

        let query = QueryFactory.create_query("q", &QueryParameters::EMPTY, Some(&config));

        assert_eq!(query.timeout(), Some(Duration::from_secs(15)));
    }
}
