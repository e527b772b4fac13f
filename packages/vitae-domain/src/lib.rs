pub mod enrich;
pub mod record;
pub mod render;
pub mod sanitize;

pub use record::{CandidateRecord, RecordReject};
