//! Dry-Run Action Handler
//!
//! Describes what an action would fetch or change instead of calling an ads
//! backend. Used by the CLI so plans can be inspected end to end.

use ads_copilot_core::{ActionHandler, ActionRequest, CoreResult, ExecutionOutput};
use async_trait::async_trait;
use serde_json::json;

/// Handler that reports the request it was given.
pub struct DryRunHandler;

impl DryRunHandler {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DryRunHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ActionHandler for DryRunHandler {
    async fn handle(&self, request: ActionRequest<'_>) -> CoreResult<ExecutionOutput> {
        let descriptor = request.action.descriptor();
        let verb = if descriptor.mutating { "Would change" } else { "Would fetch" };

        let mut content = format!("[dry run] {verb}: {} ({})", descriptor.description, descriptor.name);
        if !request.date_ranges.is_empty() {
            let ranges: Vec<&str> = request.date_ranges.iter().map(|r| r.description.as_str()).collect();
            content.push_str(&format!(" for {}", ranges.join(", ")));
        }
        if !request.filters.is_empty() {
            let filters: Vec<&str> = request.filters.iter().map(|f| f.description.as_str()).collect();
            content.push_str(&format!(" where {}", filters.join(" and ")));
        }

        Ok(ExecutionOutput {
            content,
            data: Some(json!({
                "action": descriptor.name,
                "mutating": descriptor.mutating,
                "date_ranges": request.date_ranges,
                "filters": request.filters,
            })),
            kind: "dry_run".to_string(),
        })
    }
}
