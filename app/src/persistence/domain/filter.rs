use crate::core::{item::State, time::DateTime};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Ordering {
    #[default]
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, derive_more::Display)]
pub enum Operator {
    #[default]
    #[display("==")]
    Eq,
    #[display("!=")]
    Neq,
    #[display(">")]
    Gt,
    #[display(">=")]
    Gte,
    #[display("<")]
    Lt,
    #[display("<=")]
    Lte,
}

/// Selection of historic states. Without a page size all matching states are returned.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterCriteria {
    pub item_name: Option<String>,
    pub begin: Option<DateTime>,
    pub end: Option<DateTime>,
    pub ordering: Ordering,
    pub state: Option<State>,
    pub operator: Operator,
    pub page_size: Option<usize>,
    pub page_number: usize,
}

impl FilterCriteria {
    pub fn for_item(name: impl Into<String>) -> Self {
        Self {
            item_name: Some(name.into()),
            ..Default::default()
        }
    }
}
