pub mod form_client;
pub mod page_cache;
pub mod sources;

pub use form_client::FormClient;
pub use page_cache::{FreshnessPolicy, PageCache};
pub use sources::{AssetSource, FetchedAsset, RecordSource};
