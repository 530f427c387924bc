mod filter;
mod historic;
mod point;
mod point_creator;
mod query_creator;

pub use filter::{FilterCriteria, Operator, Ordering};
pub use historic::{HistoricItem, PersistentItemInfo, map_record};
pub use point::{FIELD_VALUE_NAME, FieldValue, StoragePoint};
pub use point_creator::{
    ItemToStorePointCreator, TAG_CATEGORY_NAME, TAG_ITEM_NAME, TAG_LABEL_NAME, TAG_TYPE_NAME, measurement_name,
};
pub use query_creator::{COLUMN_TIME_NAME, COLUMN_VALUE_NAME, FilterCriteriaQueryCreator, escape_flux};
