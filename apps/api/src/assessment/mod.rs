pub mod analyzer;
pub mod collaborators;
pub mod dispatcher;
pub mod experience;
pub mod handlers;
pub mod llm;
pub mod matching;
pub mod models;
pub mod prompts;
pub mod reconciler;
pub mod scoring;
pub mod service;
