//! crowphish core library
//!
//! Configuration, result model and Gemini client for triaging email
//! screenshots for phishing.

pub mod analysis;
pub mod config;
pub mod error;

pub use analysis::gemini::GeminiClient;
pub use analysis::model::{AnalysisResult, Indicator, Severity, Verdict};
pub use analysis::analyze_screenshot;
pub use config::TriageConfig;
pub use error::{TriageError, TriageResult};
