//! # SalesPulse Core
//!
//! Domain types, traits, and error definitions shared by every SalesPulse
//! crate. Nothing here talks to the network or the filesystem.
//!
//! The LLM backend is modelled as the [`Provider`] trait so the analytics
//! pipeline can be driven by a real OpenAI-compatible endpoint or by a
//! scripted mock in tests.

pub mod error;
pub mod message;
pub mod provider;

pub use error::{DatasetError, Error, ProviderError, Result, TemplateError};
pub use message::{Message, Role};
pub use provider::{Provider, ProviderRequest, ProviderResponse, Usage};
