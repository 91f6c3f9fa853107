//! Clients for the external services a narrated video is built from.
//!
//! This crate provides:
//! - Story generation (OpenAI chat completions with structured output)
//! - Speech synthesis (ElevenLabs)
//! - Stock footage search (Pexels)
//! - Image generation (Replicate flux-schnell)
//! - Plain asset download
//!
//! Each service sits behind an async trait so the pipeline can be driven by
//! fakes in tests.

pub mod config;
pub mod download;
pub mod elevenlabs;
pub mod error;
pub mod openai;
pub mod pexels;
pub mod prompts;
pub mod replicate;
pub mod retry;
pub mod traits;

pub use config::ProviderConfig;
pub use download::{download_to_file, HttpFetcher};
pub use elevenlabs::ElevenLabsClient;
pub use error::{ProviderError, ProviderResult};
pub use openai::OpenAiClient;
pub use pexels::{select_video_url, PexelsClient};
pub use replicate::ReplicateClient;
pub use traits::{AssetFetcher, ImageGenerator, SpeechSynthesizer, StockFootage, StoryWriter};
