pub mod agent;
pub mod config;
pub mod context;
pub mod embeddings;
pub mod error;
pub mod gateway;
pub mod logging;
pub mod normalize;
pub mod paths;
pub mod pipeline;
pub mod storage;

mod http;

// Re-export commonly used types
pub use agent::{AgentOutcome, AnalysisAgent, AnalysisResponse, LanguageModel};
pub use config::{Config, Credentials};
pub use context::{AnalysisRequest, ContextLog};
pub use error::{Error, ProviderError, Result};
pub use gateway::{IngestReport, RetrievalResult, StoreGateway};
pub use normalize::NormalizedRecord;
pub use pipeline::{LogAnalyst, QueryOutcome};
