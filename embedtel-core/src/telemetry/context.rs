/// Per-call instrumentation context, passed explicitly down the call chain.
///
/// Wrappers read it on every invocation; nothing caches its answers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallContext {
    suppress_instrumentation: bool,
    trace_content: Option<bool>,
}

impl CallContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Child context under which every wrapper is a passthrough. Use it when
    /// an instrumented provider calls into another instrumented one.
    pub fn suppressed(&self) -> Self {
        Self {
            suppress_instrumentation: true,
            ..*self
        }
    }

    /// Per-call override of the prompt-content toggle.
    pub fn with_trace_content(&self, enabled: bool) -> Self {
        Self {
            trace_content: Some(enabled),
            ..*self
        }
    }

    pub fn is_suppressed(&self) -> bool {
        self.suppress_instrumentation
    }

    /// Whether prompt contents may be recorded, given the configured default.
    pub fn should_send_prompts(&self, configured: bool) -> bool {
        self.trace_content.unwrap_or(configured)
    }
}
