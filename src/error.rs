use crate::transport::TransportError;
use thiserror::Error;

/// Structured error context for better error handling and debugging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorContext {
    /// Field path or configuration key that caused the error (e.g., "AGENT_MAX_ROUNDS", "tools[2].inputSchema")
    pub field_path: Option<String>,
    /// Additional context about the error (e.g., expected type, actual value)
    pub details: Option<String>,
    /// Source of the error (e.g., "tool_registry", "config")
    pub source: Option<String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self {
            field_path: None,
            details: None,
            source: None,
        }
    }

    pub fn with_field_path(mut self, path: impl Into<String>) -> Self {
        self.field_path = Some(path.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Unified error type for the agent.
///
/// Only [`Error::Discovery`] is fatal to a session. Invocation, argument
/// parsing and timeout errors are turned into transcript content by the
/// conversation driver.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Tool discovery failed: {message}{}", format_context(.context))]
    Discovery {
        message: String,
        context: ErrorContext,
    },

    #[error("Tool '{tool}' failed: {message}")]
    Invocation { tool: String, message: String },

    #[error("Arguments for tool '{tool}' are not a JSON object: {reason}")]
    ArgumentParse { tool: String, reason: String },

    #[error("Timed out after {elapsed_ms} ms waiting for {operation}")]
    Timeout { operation: String, elapsed_ms: u64 },

    #[error("Configuration error: {message}{}", format_context(.context))]
    Configuration {
        message: String,
        context: ErrorContext,
    },

    #[error("Malformed payload: {message}{}", format_context(.context))]
    Protocol {
        message: String,
        context: ErrorContext,
    },

    #[error("Runtime error: {message}{}", format_context(.context))]
    Runtime {
        message: String,
        context: ErrorContext,
    },

    #[error("Remote error: HTTP {status}: {message}")]
    Remote { status: u16, message: String },

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

// Helper function to format error context for display
fn format_context(ctx: &ErrorContext) -> String {
    let mut parts = Vec::new();
    if let Some(ref field) = ctx.field_path {
        parts.push(format!("field: {}", field));
    }
    if let Some(ref details) = ctx.details {
        parts.push(format!("details: {}", details));
    }
    if let Some(ref source) = ctx.source {
        parts.push(format!("source: {}", source));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" ({})", parts.join(", "))
    }
}

impl Error {
    pub fn discovery_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Discovery {
            message: msg.into(),
            context,
        }
    }

    pub fn invocation(tool: impl Into<String>, msg: impl Into<String>) -> Self {
        Error::Invocation {
            tool: tool.into(),
            message: msg.into(),
        }
    }

    pub fn configuration_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Configuration {
            message: msg.into(),
            context,
        }
    }

    pub fn protocol_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Protocol {
            message: msg.into(),
            context,
        }
    }

    pub fn runtime_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Runtime {
            message: msg.into(),
            context,
        }
    }

    /// Extract error context if available
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            Error::Discovery { context, .. }
            | Error::Configuration { context, .. }
            | Error::Protocol { context, .. }
            | Error::Runtime { context, .. } => Some(context),
            _ => None,
        }
    }

    /// Whether this error must end the session instead of becoming transcript content.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Discovery { .. })
    }
}
