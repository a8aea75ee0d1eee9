pub mod catalog_service;
pub mod fetch_service;
pub mod run_reporter;
pub mod session_service;
pub mod storage_service;

pub use catalog_service::CatalogWalker;
pub use fetch_service::ArtifactFetcher;
pub use run_reporter::RunSummary;
pub use session_service::{LoginMode, Session, SessionEstablisher};
pub use storage_service::{sanitize_component, SolutionStore};
