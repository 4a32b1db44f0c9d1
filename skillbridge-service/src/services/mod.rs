pub mod dependency;
pub mod facade;
pub mod history;
pub mod metrics;
pub mod pdf;
pub mod providers;

pub use dependency::Dependency;
pub use facade::{PdfArtifact, Readiness, RequestFacade, StoreState};
pub use history::{HistoryRecord, HistoryStore, MemoryHistoryStore, MongoHistoryStore};
pub use metrics::{get_metrics, init_metrics};
pub use pdf::{PdfRenderer, TextReportRenderer};
pub use providers::TextProvider;
