pub mod config;
pub mod merge;
pub mod normalize;
pub mod pipeline;
pub mod schema;
pub mod snapshot;
pub mod table;

pub use config::{ConfigError, PipelineConfig};
pub use merge::{merge_increment, MergeError, MergePolicy};
pub use normalize::{normalize_headers, normalize_increment, normalize_values};
pub use pipeline::{IngestPipeline, PipelineError, RunOutcome, RunStatus};
pub use schema::{ColumnMap, CANONICAL_KEY, DEFAULT_KEY_HEADER, FLAG_COLUMNS};
pub use snapshot::{capture_timestamp, latest_snapshot, SnapshotError};
pub use table::{Table, TableError, Value};
