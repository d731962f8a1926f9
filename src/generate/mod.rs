//! Description generation: secret lookup, the generative text client, the
//! append-only result journal, and the resumable generation loop.

pub mod client;
pub mod journal;
pub mod pipeline;
pub mod secrets;

pub use client::{GeminiClient, TextGenerator};
pub use journal::{read_journal, DescriptionJournal, DescriptionRecord};
pub use pipeline::{generate_descriptions, GenerationSummary};
pub use secrets::{EnvSecretProvider, SecretProvider, StaticSecretProvider};
