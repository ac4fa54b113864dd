//! Rendering tool results as chat context.

use crate::tool::{ToolCall, ToolRegistry};
use std::fmt::Write;

/// Prefix of transcript entries that record tool output.
pub const TOOL_TAG_PREFIX: &str = "[Tool:";

const CONTEXT_HEADER: &str =
    "Here is some current information that may be relevant to your response:\n\n";

const CONTEXT_FOOTER: &str = "Please use this information to provide a helpful and accurate response to the user's question.\n\n";

/// Renders tool calls as a context block for the chat backend.
///
/// Successful calls are summarized by their adapter; failed calls become a
/// one-line note. Returns an empty string when there are no calls.
#[must_use]
pub fn render_tool_context(registry: &ToolRegistry, calls: &[ToolCall]) -> String {
    if calls.is_empty() {
        return String::new();
    }

    let mut context = String::from(CONTEXT_HEADER);

    for call in calls {
        if call.success {
            let summary = call
                .result
                .as_ref()
                .and_then(|result| registry.get(&call.tool_name)?.summarize(result));
            if let Some(summary) = summary {
                context.push_str(&summary);
                context.push('\n');
            }
        } else {
            let _ = write!(context, "Note: Unable to fetch {} information", call.tool_name);
            if let Some(error) = call.error.as_deref().filter(|e| !e.is_empty()) {
                let _ = write!(context, " ({error})");
            }
            context.push_str("\n\n");
        }
    }

    context.push_str(CONTEXT_FOOTER);
    context
}

/// Renders the auxiliary transcript entry recorded for one tool call.
#[must_use]
pub fn tool_summary_entry(registry: &ToolRegistry, call: &ToolCall) -> String {
    format!(
        "{TOOL_TAG_PREFIX} {}] {}",
        call.tool_name,
        render_tool_context(registry, std::slice::from_ref(call))
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::tests::FakeTool;
    use std::sync::Arc;

    fn registry() -> ToolRegistry {
        ToolRegistry::new().with(Arc::new(FakeTool::ok("echo", serde_json::Value::Null)))
    }

    #[test]
    fn no_calls_renders_nothing() {
        assert_eq!(render_tool_context(&registry(), &[]), "");
    }

    #[test]
    fn successful_call_uses_adapter_summary() {
        let call = ToolCall::succeeded("echo", "x", serde_json::json!(7));

        let rendered = render_tool_context(&registry(), &[call]);

        assert_eq!(
            rendered,
            format!("{CONTEXT_HEADER}echo says 7\n\n{CONTEXT_FOOTER}")
        );
    }

    #[test]
    fn failed_call_renders_note_with_error() {
        let call = ToolCall::failed("weather", "Paris", "status 503");

        let rendered = render_tool_context(&registry(), &[call]);

        assert!(rendered.contains("Note: Unable to fetch weather information (status 503)\n\n"));
    }

    #[test]
    fn summary_entry_carries_tag() {
        let call = ToolCall::succeeded("echo", "x", serde_json::json!(1));

        let entry = tool_summary_entry(&registry(), &call);

        assert!(entry.starts_with("[Tool: echo] Here is some current information"));
        assert!(entry.starts_with(TOOL_TAG_PREFIX));
    }
}
