//! Service layer for sproutlink-api
//!
//! External API clients (Gemini vision OCR, Gemini report scoring) and
//! the orchestrators that compose them with the store.

pub mod extractor;
pub mod gemini;
pub mod generator;
pub mod linking;
pub mod report;

pub use extractor::TextExtractor;
pub use generator::ReportGenerator;
pub use linking::LinkingService;
pub use report::LearningReportService;
