pub mod collector;
pub mod error;
pub mod filter;
pub mod frame;
pub mod record_set;
pub mod store;

pub use collector::{CmCollector, FOLDER_COLUMN, SITE_COLUMN, site_id};
pub use error::IngestError;
pub use filter::{FilterBy, RecordFilter, load_object_list};
pub use frame::{deduplicate, filter_rows, set_text_column, text_column, text_frame};
pub use record_set::RecordSet;
pub use store::{LoadRequest, RecordSource, RecordStore};
