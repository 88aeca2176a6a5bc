//! LLM Provider implementations for SalesPulse.
//!
//! All providers implement the `salespulse_core::Provider` trait.
//! The router builds the configured provider; `RetryProvider` wraps it with
//! the configured retry and timeout policy.

pub mod openai_compat;
pub mod retry;
pub mod router;

pub use openai_compat::OpenAiCompatProvider;
pub use retry::RetryProvider;
pub use router::ProviderRouter;
