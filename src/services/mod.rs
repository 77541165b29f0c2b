pub mod archive_assembler;
pub mod asset_inliner;
pub mod classifier;
pub mod document_renderer;
pub mod token_provider;

pub use archive_assembler::ArchiveAssembler;
pub use asset_inliner::AssetInliner;
pub use classifier::{MarkerClassifier, RecordClassifier};
pub use document_renderer::{DocumentRenderer, EngineLauncher, PdfEngine, PrintLayout, PRINT_STYLESHEET};
pub use token_provider::SessionTokenProvider;
