//! External lookup tools for skychat.
//!
//! This crate provides:
//!
//! - **Intent detector**: heuristic classification of free text into a tool
//!   name and argument
//! - **Tool executor**: registry-based dispatch that turns every adapter
//!   outcome into a [`ToolCall`] record
//! - **Weather tool**: the wttr.in lookup adapter

pub mod context;
pub mod error;
pub mod intent;
pub mod tool;
pub mod weather;

pub use context::{TOOL_TAG_PREFIX, render_tool_context, tool_summary_entry};
pub use error::{ToolError, WeatherError};
pub use intent::{Intent, IntentDetector, KeywordIntentDetector};
pub use tool::{ToolAdapter, ToolCall, ToolExecutor, ToolRegistry};
pub use weather::{WeatherClient, WeatherConfig, WeatherInfo, WeatherTool};
