//! Prompt domain
//!
//! Templates for the three places the pipeline consults the reasoning
//! oracle: planning, observation summaries and conflict negotiation.

mod template;

pub use template::PromptTemplate;
