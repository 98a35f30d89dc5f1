pub mod engine;
pub mod parse;
pub mod prompt;
pub mod repair;

use tracing::{debug, info};

use flowsmith_core::GenerationResult;

pub use engine::{CompletionClient, LlmEngine};
pub use parse::{normalize, NormalizeError};

/// Ask the model for a diagram matching `query` and normalize its answer.
///
/// Only a completion failure is returned as `Err`; anything wrong with the
/// answer itself comes back as [`GenerationResult::Failure`].
pub async fn generate(
    client: &dyn CompletionClient,
    query: &str,
) -> flowsmith_core::Result<GenerationResult> {
    info!(query_len = query.len(), "generating diagram");

    let raw = client.complete(prompt::system_prompt(), query).await?;
    debug!(raw = %raw, "raw completion");

    let result = normalize(&raw);
    info!(
        kind = match &result {
            GenerationResult::Success { .. } => "success",
            GenerationResult::Failure { .. } => "failure",
            GenerationResult::Passthrough(_) => "passthrough",
        },
        "completion normalized"
    );
    Ok(result)
}
