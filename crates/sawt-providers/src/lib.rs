pub mod agent;
pub mod factory;
pub mod huggingface;
pub mod mock;
pub mod speech;

pub use agent::AgentResponder;
pub use factory::ProviderStageFactory;
pub use huggingface::HuggingFaceTranscriber;
pub use speech::GoogleSynthesizer;
