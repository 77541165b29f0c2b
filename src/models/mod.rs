pub mod catalogue;
pub mod job;
pub mod record;
pub mod report;
pub mod session;

pub use catalogue::{list_courses, list_result_types, Catalogue, ResultType, SelectorOption};
pub use job::DownloadJob;
pub use record::{Archive, AssetReference, FetchRequest, RawRecordPage, RenderedDocument};
pub use report::{AssemblyOutcome, RecordOutcome, RunPhase, RunProgress, RunReport, SkipReason};
pub use session::SessionContext;
