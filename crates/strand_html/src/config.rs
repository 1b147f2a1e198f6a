//! Render configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{TemplateError, TemplateResult};

/// What `render_async` does when a slot fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Render an error fragment in place of the failed slot
    Isolate,
    /// Fail the whole render with the first slot error
    Reject,
}

impl Default for FailurePolicy {
    fn default() -> Self {
        Self::Isolate
    }
}

/// What happens to in-flight async work when a render is dropped early.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbandonPolicy {
    /// Leave spawned tasks running to completion
    #[default]
    Detach,
    /// Abort every task that has not settled yet
    Abort,
}

/// How slot id tokens are generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotIdStrategy {
    /// Short random tokens drawn from a UUID v4
    #[default]
    Random,
    /// A counter starting at zero for every render invocation
    Sequential,
}

/// Configuration shared by all renderers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Markup shown inside a placeholder until its value resolves
    pub loading_markup: String,
    /// Prefix of every slot id
    pub slot_id_prefix: String,
    /// Slot id token strategy
    pub slot_ids: SlotIdStrategy,
    /// Per-slot timeout in milliseconds (0 = no timeout)
    pub slot_timeout_ms: u64,
    /// Failure handling for `render_async`
    pub failure_policy: FailurePolicy,
    /// Handling of in-flight tasks when a render is dropped
    pub abandon_policy: AbandonPolicy,
    /// Whether error fragments include the failure message
    pub expose_error_details: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            loading_markup: "Loading...".to_string(),
            slot_id_prefix: "async_".to_string(),
            slot_ids: SlotIdStrategy::Random,
            slot_timeout_ms: 0,
            failure_policy: FailurePolicy::Isolate,
            abandon_policy: AbandonPolicy::Detach,
            expose_error_details: false,
        }
    }
}

impl RenderConfig {
    /// Load a configuration from TOML. Missing keys take their defaults.
    pub fn from_toml_str(content: &str) -> TemplateResult<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that generated slot ids stay attribute-safe.
    pub fn validate(&self) -> TemplateResult<()> {
        if self.slot_id_prefix.is_empty() {
            return Err(TemplateError::InvalidConfig(
                "slot_id_prefix must not be empty".to_string(),
            ));
        }

        if let Some(bad) = self
            .slot_id_prefix
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '-'))
        {
            return Err(TemplateError::InvalidConfig(format!(
                "slot_id_prefix contains unsupported character {:?}",
                bad
            )));
        }

        Ok(())
    }

    pub fn loading_markup(mut self, markup: impl Into<String>) -> Self {
        self.loading_markup = markup.into();
        self
    }

    pub fn slot_id_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.slot_id_prefix = prefix.into();
        self
    }

    /// Use deterministic, counter-based slot ids.
    pub fn sequential_ids(mut self) -> Self {
        self.slot_ids = SlotIdStrategy::Sequential;
        self
    }

    pub fn timeout(mut self, millis: u64) -> Self {
        self.slot_timeout_ms = millis;
        self
    }

    pub fn reject_on_failure(mut self) -> Self {
        self.failure_policy = FailurePolicy::Reject;
        self
    }

    pub fn abort_on_drop(mut self) -> Self {
        self.abandon_policy = AbandonPolicy::Abort;
        self
    }

    pub fn expose_error_details(mut self, enabled: bool) -> Self {
        self.expose_error_details = enabled;
        self
    }

    /// Per-slot timeout, if one is configured.
    pub fn slot_timeout(&self) -> Option<Duration> {
        (self.slot_timeout_ms > 0).then(|| Duration::from_millis(self.slot_timeout_ms))
    }
}
