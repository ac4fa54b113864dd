//! Tool registry and executor.
//!
//! Adapters are looked up by the tool name an [`Intent`] carries. Whatever an
//! adapter does (returns an error, times out, panics, gets cancelled), the
//! executor hands back a [`ToolCall`] record; no failure crosses this boundary.

use crate::error::ToolError;
use crate::intent::Intent;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

/// Record of one tool invocation.
///
/// [`ToolCall::succeeded`] and [`ToolCall::failed`] build consistent records:
/// a successful call has a result and no error, a failed call has an error
/// and no result. Deserialization rejects records that break this. The fields
/// stay public, so code that edits them in place is on its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ToolCallRecord")]
pub struct ToolCall {
    /// Name of the tool that ran.
    pub tool_name: String,
    /// Argument the tool ran with.
    pub query: String,
    /// Tool-specific payload (if successful).
    pub result: Option<JsonValue>,
    /// Whether the invocation succeeded.
    pub success: bool,
    /// Error description (if failed).
    pub error: Option<String>,
    /// When the tool ran.
    pub executed_at: DateTime<Utc>,
}

impl ToolCall {
    /// Creates a successful record.
    #[must_use]
    pub fn succeeded(
        tool_name: impl Into<String>,
        query: impl Into<String>,
        result: JsonValue,
    ) -> Self {
        Self {
            tool_name: tool_name.into(),
            query: query.into(),
            result: Some(result),
            success: true,
            error: None,
            executed_at: Utc::now(),
        }
    }

    /// Creates a failed record.
    #[must_use]
    pub fn failed(
        tool_name: impl Into<String>,
        query: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            tool_name: tool_name.into(),
            query: query.into(),
            result: None,
            success: false,
            error: Some(error.into()),
            executed_at: Utc::now(),
        }
    }
}

#[derive(Deserialize)]
struct ToolCallRecord {
    tool_name: String,
    query: String,
    result: Option<JsonValue>,
    success: bool,
    error: Option<String>,
    executed_at: DateTime<Utc>,
}

impl TryFrom<ToolCallRecord> for ToolCall {
    type Error = String;

    fn try_from(record: ToolCallRecord) -> Result<Self, Self::Error> {
        let consistent = if record.success {
            record.result.is_some() && record.error.is_none()
        } else {
            record.result.is_none() && record.error.is_some()
        };
        if !consistent {
            return Err(format!(
                "inconsistent record for tool '{}': success={} with result={} error={}",
                record.tool_name,
                record.success,
                record.result.is_some(),
                record.error.is_some()
            ));
        }
        Ok(Self {
            tool_name: record.tool_name,
            query: record.query,
            result: record.result,
            success: record.success,
            error: record.error,
            executed_at: record.executed_at,
        })
    }
}

/// An external lookup the executor can dispatch to.
#[async_trait]
pub trait ToolAdapter: Send + Sync {
    /// Registry key; matches [`Intent::tool`].
    fn name(&self) -> &str;

    /// Runs the lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup fails for any reason.
    async fn invoke(&self, argument: &str) -> Result<JsonValue, ToolError>;

    /// Renders a successful result as context lines for the chat backend.
    ///
    /// Returns `None` if the payload is not one this adapter produced.
    fn summarize(&self, result: &JsonValue) -> Option<String>;
}

/// Registry of named tool adapters.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    adapters: HashMap<String, Arc<dyn ToolAdapter>>,
}

impl ToolRegistry {
    /// Creates a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            adapters: HashMap::new(),
        }
    }

    /// Registers an adapter under its own name, replacing any previous one.
    pub fn register(&mut self, adapter: Arc<dyn ToolAdapter>) {
        self.adapters.insert(adapter.name().to_string(), adapter);
    }

    /// Registers an adapter, builder style.
    #[must_use]
    pub fn with(mut self, adapter: Arc<dyn ToolAdapter>) -> Self {
        self.register(adapter);
        self
    }

    /// Gets an adapter by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<dyn ToolAdapter>> {
        self.adapters.get(name)
    }

    /// Returns the registered tool names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.adapters.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Returns the number of registered adapters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    /// Returns whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}

impl fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("adapters", &self.names())
            .finish()
    }
}

/// Dispatches intents to adapters with a per-call deadline.
#[derive(Debug, Clone)]
pub struct ToolExecutor {
    registry: Arc<ToolRegistry>,
    timeout: Duration,
}

impl ToolExecutor {
    /// Creates an executor over a registry.
    #[must_use]
    pub fn new(registry: ToolRegistry, timeout: Duration) -> Self {
        Self {
            registry: Arc::new(registry),
            timeout,
        }
    }

    /// Returns the registry, for rendering results.
    #[must_use]
    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Runs the tool an intent names and records the outcome.
    #[instrument(skip(self, cancel), fields(tool = %intent.tool))]
    pub async fn execute(&self, intent: &Intent, cancel: &CancellationToken) -> ToolCall {
        match self.invoke(intent, cancel).await {
            Ok(result) => {
                info!(query = %intent.argument, "tool executed");
                ToolCall::succeeded(&intent.tool, &intent.argument, result)
            }
            Err(e) => {
                warn!(query = %intent.argument, error = %e, "tool execution failed");
                ToolCall::failed(&intent.tool, &intent.argument, e.to_string())
            }
        }
    }

    /// Runs several intents concurrently. Each outcome is independent.
    pub async fn execute_all(&self, intents: &[Intent], cancel: &CancellationToken) -> Vec<ToolCall> {
        futures::future::join_all(intents.iter().map(|intent| self.execute(intent, cancel))).await
    }

    async fn invoke(
        &self,
        intent: &Intent,
        cancel: &CancellationToken,
    ) -> Result<JsonValue, ToolError> {
        let adapter = self
            .registry
            .get(&intent.tool)
            .ok_or_else(|| ToolError::NotFound {
                name: intent.tool.clone(),
            })?;

        let guarded = AssertUnwindSafe(adapter.invoke(&intent.argument)).catch_unwind();

        tokio::select! {
            biased;
            () = cancel.cancelled() => Err(ToolError::Cancelled { name: intent.tool.clone() }),
            outcome = tokio::time::timeout(self.timeout, guarded) => match outcome {
                Ok(Ok(result)) => result,
                Ok(Err(_panic)) => Err(ToolError::ExecutionFailed {
                    name: intent.tool.clone(),
                    reason: "adapter panicked".to_string(),
                }),
                Err(_elapsed) => Err(ToolError::TimedOut { name: intent.tool.clone() }),
            },
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Adapter with scripted behavior.
    pub(crate) struct FakeTool {
        pub(crate) name: &'static str,
        pub(crate) outcome: Result<JsonValue, ToolError>,
        pub(crate) delay: Duration,
        pub(crate) calls: AtomicUsize,
    }

    impl FakeTool {
        pub(crate) fn ok(name: &'static str, result: JsonValue) -> Self {
            Self {
                name,
                outcome: Ok(result),
                delay: Duration::ZERO,
                calls: AtomicUsize::new(0),
            }
        }

        pub(crate) fn err(name: &'static str, error: ToolError) -> Self {
            Self {
                name,
                outcome: Err(error),
                delay: Duration::ZERO,
                calls: AtomicUsize::new(0),
            }
        }

        fn slow(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }
    }

    #[async_trait]
    impl ToolAdapter for FakeTool {
        fn name(&self) -> &str {
            self.name
        }

        async fn invoke(&self, _argument: &str) -> Result<JsonValue, ToolError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.outcome.clone()
        }

        fn summarize(&self, result: &JsonValue) -> Option<String> {
            Some(format!("{} says {result}\n", self.name))
        }
    }

    struct PanickingTool;

    #[async_trait]
    impl ToolAdapter for PanickingTool {
        fn name(&self) -> &str {
            "boom"
        }

        async fn invoke(&self, _argument: &str) -> Result<JsonValue, ToolError> {
            panic!("adapter bug");
        }

        fn summarize(&self, _result: &JsonValue) -> Option<String> {
            None
        }
    }

    fn executor(registry: ToolRegistry) -> ToolExecutor {
        ToolExecutor::new(registry, Duration::from_secs(5))
    }

    #[test]
    fn tool_call_constructors_hold_invariant() {
        let ok = ToolCall::succeeded("weather", "Paris", serde_json::json!({"t": 1}));
        assert!(ok.success);
        assert!(ok.result.is_some());
        assert!(ok.error.is_none());

        let failed = ToolCall::failed("weather", "Paris", "offline");
        assert!(!failed.success);
        assert!(failed.result.is_none());
        assert_eq!(failed.error.as_deref(), Some("offline"));
    }

    #[test]
    fn deserialize_keeps_consistent_records() {
        let call = ToolCall::failed("weather", "Paris", "offline");
        let json = serde_json::to_value(&call).unwrap();

        let back: ToolCall = serde_json::from_value(json).unwrap();

        assert_eq!(back, call);
    }

    #[test]
    fn deserialize_rejects_inconsistent_records() {
        let at = serde_json::to_value(Utc::now()).unwrap();
        let success_with_error = serde_json::json!({
            "tool_name": "weather",
            "query": "Paris",
            "result": null,
            "success": true,
            "error": "offline",
            "executed_at": at,
        });
        let failure_with_result = serde_json::json!({
            "tool_name": "weather",
            "query": "Paris",
            "result": {"t": 1},
            "success": false,
            "error": null,
            "executed_at": at,
        });

        let err = serde_json::from_value::<ToolCall>(success_with_error).unwrap_err();
        assert!(err.to_string().contains("inconsistent record for tool 'weather'"));
        assert!(serde_json::from_value::<ToolCall>(failure_with_result).is_err());
    }

    #[test]
    fn registry_operations() {
        let registry = ToolRegistry::new()
            .with(Arc::new(FakeTool::ok("weather", JsonValue::Null)))
            .with(Arc::new(FakeTool::ok("calendar", JsonValue::Null)));

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.names(), vec!["calendar", "weather"]);
        assert!(registry.get("weather").is_some());
        assert!(registry.get("stocks").is_none());
    }

    #[tokio::test]
    async fn success_becomes_successful_call() {
        let executor = executor(ToolRegistry::new().with(Arc::new(FakeTool::ok(
            "weather",
            serde_json::json!({"temp": 21}),
        ))));

        let call = executor
            .execute(&Intent::new("weather", "Paris"), &CancellationToken::new())
            .await;

        assert!(call.success);
        assert_eq!(call.query, "Paris");
        assert_eq!(call.result, Some(serde_json::json!({"temp": 21})));
    }

    #[tokio::test]
    async fn adapter_error_becomes_failed_call() {
        let executor = executor(ToolRegistry::new().with(Arc::new(FakeTool::err(
            "weather",
            ToolError::ExecutionFailed {
                name: "weather".to_string(),
                reason: "status 503".to_string(),
            },
        ))));

        let call = executor
            .execute(&Intent::new("weather", "Paris"), &CancellationToken::new())
            .await;

        assert!(!call.success);
        assert!(call.result.is_none());
        assert!(call.error.as_deref().is_some_and(|e| e.contains("status 503")));
    }

    #[tokio::test]
    async fn unknown_tool_becomes_failed_call() {
        let executor = executor(ToolRegistry::new());

        let call = executor
            .execute(&Intent::new("stocks", "ACME"), &CancellationToken::new())
            .await;

        assert!(!call.success);
        assert_eq!(call.error.as_deref(), Some("tool not found: stocks"));
    }

    #[tokio::test]
    async fn panicking_adapter_becomes_failed_call() {
        let executor = executor(ToolRegistry::new().with(Arc::new(PanickingTool)));

        let call = executor
            .execute(&Intent::new("boom", "x"), &CancellationToken::new())
            .await;

        assert!(!call.success);
        assert!(call.error.as_deref().is_some_and(|e| e.contains("panicked")));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_adapter_times_out() {
        let tool = FakeTool::ok("weather", JsonValue::Null).slow(Duration::from_secs(60));
        let executor = executor(ToolRegistry::new().with(Arc::new(tool)));

        let call = executor
            .execute(&Intent::new("weather", "Paris"), &CancellationToken::new())
            .await;

        assert_eq!(call.error.as_deref(), Some("tool 'weather' timed out"));
    }

    #[tokio::test]
    async fn cancelled_turn_becomes_failed_call() {
        let executor = executor(
            ToolRegistry::new().with(Arc::new(FakeTool::ok("weather", JsonValue::Null))),
        );
        let cancel = CancellationToken::new();
        cancel.cancel();

        let call = executor.execute(&Intent::new("weather", "Paris"), &cancel).await;

        assert_eq!(call.error.as_deref(), Some("tool 'weather' was cancelled"));
    }

    #[tokio::test]
    async fn one_failure_does_not_abort_others() {
        let executor = executor(
            ToolRegistry::new()
                .with(Arc::new(FakeTool::ok("weather", serde_json::json!("sunny"))))
                .with(Arc::new(FakeTool::err(
                    "calendar",
                    ToolError::ExecutionFailed {
                        name: "calendar".to_string(),
                        reason: "bad date".to_string(),
                    },
                ))),
        );

        let calls = executor
            .execute_all(
                &[
                    Intent::new("calendar", "someday"),
                    Intent::new("weather", "Rome"),
                ],
                &CancellationToken::new(),
            )
            .await;

        assert_eq!(calls.len(), 2);
        assert!(!calls[0].success);
        assert!(calls[1].success);
    }
}
