use crate::persistence::config::InfluxDbConfiguration;

use super::{FIELD_VALUE_NAME, FieldValue, FilterCriteria, Ordering, measurement_name};

pub const COLUMN_VALUE_NAME: &str = "_value";
pub const COLUMN_TIME_NAME: &str = "_time";

/// Lower bound used when no begin is given
const DEFAULT_RANGE_START: &str = "-100y";

#[derive(Debug, Clone, Copy, Default)]
pub struct FilterCriteriaQueryCreator {
    replace_underscore: bool,
}

impl FilterCriteriaQueryCreator {
    pub fn new(config: &InfluxDbConfiguration) -> Self {
        Self {
            replace_underscore: config.replace_underscore,
        }
    }

    pub fn create_query(&self, criteria: &FilterCriteria, bucket: &str) -> String {
        let mut query = format!("from(bucket: \"{}\")", escape_flux(bucket));

        let start = criteria
            .begin
            .map(|b| b.to_iso_string())
            .unwrap_or_else(|| DEFAULT_RANGE_START.to_owned());
        query.push_str(&match criteria.end {
            Some(end) => format!("\n  |> range(start: {}, stop: {})", start, end.to_iso_string()),
            None => format!("\n  |> range(start: {})", start),
        });

        if let Some(item_name) = &criteria.item_name {
            query.push_str(&format!(
                "\n  |> filter(fn: (r) => r[\"_measurement\"] == \"{}\")",
                escape_flux(&measurement_name(item_name, self.replace_underscore))
            ));
        }

        query.push_str(&match criteria.state.as_ref().and_then(FieldValue::from_state) {
            Some(value) => format!(
                "\n  |> filter(fn: (r) => r[\"_field\"] == \"{}\" and r[\"{}\"] {} {})",
                FIELD_VALUE_NAME,
                COLUMN_VALUE_NAME,
                criteria.operator,
                value.to_flux_literal()
            ),
            None => format!("\n  |> filter(fn: (r) => r[\"_field\"] == \"{}\")", FIELD_VALUE_NAME),
        });

        query.push_str(&format!(
            "\n  |> sort(columns: [\"{}\"], desc: {})",
            COLUMN_TIME_NAME,
            criteria.ordering == Ordering::Descending
        ));

        if let Some(page_size) = criteria.page_size {
            query.push_str(&format!(
                "\n  |> limit(n: {}, offset: {})",
                page_size,
                page_size.saturating_mul(criteria.page_number)
            ));
        }

        query
    }
}

pub fn escape_flux(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
