//! Deterministic combine stage

use super::{Inbound, Outbound, Stage, Value};
use crate::Result;
use async_trait::async_trait;

/// Joins the sorted results into the final digest
pub const COMBINE_SEPARATOR: &str = "_";

/// Drains its whole input, sorts it and emits exactly one joined string
///
/// Sorting is what makes the final digest independent of the order in
/// which concurrent upstream workers finished.
#[derive(Debug, Default)]
pub struct CombineStage;

impl CombineStage {
    pub fn new() -> Self {
        Self
    }
}

/// Sort lexicographically and join with [`COMBINE_SEPARATOR`]
pub(crate) fn combine(mut parts: Vec<String>) -> String {
    parts.sort_unstable();
    parts.join(COMBINE_SEPARATOR)
}

#[async_trait]
impl Stage for CombineStage {
    fn name(&self) -> &str {
        "Combine"
    }

    async fn run(&self, mut input: Inbound, output: Outbound) -> Result<()> {
        let mut parts = Vec::new();
        while let Some(value) = input.recv().await {
            parts.push(value.into_text(self.name())?);
        }

        log::debug!("{}: combining {} value(s)", self.name(), parts.len());
        output.send(Value::Text(combine(parts))).await?;
        output.close()
    }
}
