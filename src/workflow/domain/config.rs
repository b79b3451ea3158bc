//! Per-project workflow configuration and partial updates.

use super::WorkflowConfigError;
use minijinja::Environment;
use serde::{Deserialize, Deserializer, Serialize};

/// Maximum length, in characters, of a custom review prompt template.
pub const MAX_REVIEW_PROMPT_TEMPLATE_CHARS: usize = 2000;

const fn default_enable_human_review() -> bool {
    false
}

const fn default_max_review_iterations() -> u32 {
    3
}

const fn default_testing_requires_manual_exit() -> bool {
    true
}

const fn default_auto_start_review() -> bool {
    true
}

/// Effective workflow configuration for a project.
///
/// Stored documents that omit a field take that field's default, and a
/// project with no stored document behaves as [`WorkflowConfig::default`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// Whether a passing automated review routes through manual approval.
    #[serde(default = "default_enable_human_review")]
    pub enable_human_review: bool,
    /// Number of failing automated reviews after which manual intervention
    /// is forced.
    #[serde(default = "default_max_review_iterations")]
    pub max_review_iterations: u32,
    /// Whether tasks must pass through Testing before automated review.
    #[serde(default = "default_testing_requires_manual_exit")]
    pub testing_requires_manual_exit: bool,
    /// Whether entering automated review submits the review immediately.
    #[serde(default = "default_auto_start_review")]
    pub auto_start_review: bool,
    /// Custom `minijinja` template for the review prompt.
    #[serde(default)]
    pub review_prompt_template: Option<String>,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            enable_human_review: default_enable_human_review(),
            max_review_iterations: default_max_review_iterations(),
            testing_requires_manual_exit: default_testing_requires_manual_exit(),
            auto_start_review: default_auto_start_review(),
            review_prompt_template: None,
        }
    }
}

impl WorkflowConfig {
    /// Checks the invariants every stored configuration must satisfy.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowConfigError::ZeroReviewIterations`] when the cap is
    /// zero, [`WorkflowConfigError::PromptTemplateTooLong`] when the template
    /// exceeds [`MAX_REVIEW_PROMPT_TEMPLATE_CHARS`], and
    /// [`WorkflowConfigError::InvalidPromptTemplate`] when it does not parse.
    pub fn validate(&self) -> Result<(), WorkflowConfigError> {
        if self.max_review_iterations < 1 {
            return Err(WorkflowConfigError::ZeroReviewIterations);
        }

        if let Some(template) = &self.review_prompt_template {
            let length = template.chars().count();
            if length > MAX_REVIEW_PROMPT_TEMPLATE_CHARS {
                return Err(WorkflowConfigError::PromptTemplateTooLong {
                    actual: length,
                    limit: MAX_REVIEW_PROMPT_TEMPLATE_CHARS,
                });
            }
            Environment::new()
                .template_from_str(template)
                .map_err(|err| WorkflowConfigError::InvalidPromptTemplate(err.to_string()))?;
        }

        Ok(())
    }
}

/// Partial configuration update.
///
/// Unset fields keep their previous values. The prompt template uses a
/// nested option: `None` leaves it alone, `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowConfigPatch {
    /// New value for [`WorkflowConfig::enable_human_review`].
    #[serde(default)]
    pub enable_human_review: Option<bool>,
    /// New value for [`WorkflowConfig::max_review_iterations`].
    #[serde(default)]
    pub max_review_iterations: Option<u32>,
    /// New value for [`WorkflowConfig::testing_requires_manual_exit`].
    #[serde(default)]
    pub testing_requires_manual_exit: Option<bool>,
    /// New value for [`WorkflowConfig::auto_start_review`].
    #[serde(default)]
    pub auto_start_review: Option<bool>,
    /// New value for [`WorkflowConfig::review_prompt_template`].
    ///
    /// In JSON an absent key leaves the template alone and `null` clears it.
    #[serde(
        default,
        deserialize_with = "deserialize_present",
        skip_serializing_if = "Option::is_none"
    )]
    pub review_prompt_template: Option<Option<String>>,
}

/// Maps any present value, including `null`, to `Some`.
fn deserialize_present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

impl WorkflowConfigPatch {
    /// Creates an empty patch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether human review is enabled.
    #[must_use]
    pub const fn with_enable_human_review(mut self, enabled: bool) -> Self {
        self.enable_human_review = Some(enabled);
        self
    }

    /// Sets the review iteration cap.
    #[must_use]
    pub const fn with_max_review_iterations(mut self, max: u32) -> Self {
        self.max_review_iterations = Some(max);
        self
    }

    /// Sets whether Testing must be exited explicitly.
    #[must_use]
    pub const fn with_testing_requires_manual_exit(mut self, required: bool) -> Self {
        self.testing_requires_manual_exit = Some(required);
        self
    }

    /// Sets whether reviews start automatically.
    #[must_use]
    pub const fn with_auto_start_review(mut self, enabled: bool) -> Self {
        self.auto_start_review = Some(enabled);
        self
    }

    /// Replaces the review prompt template.
    #[must_use]
    pub fn with_review_prompt_template(mut self, template: impl Into<String>) -> Self {
        self.review_prompt_template = Some(Some(template.into()));
        self
    }

    /// Clears the review prompt template so the default prompt is used.
    #[must_use]
    pub fn clearing_review_prompt_template(mut self) -> Self {
        self.review_prompt_template = Some(None);
        self
    }

    /// Applies the patch over `base` and validates the result.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowConfigError`] when the merged configuration is
    /// invalid. `base` is never modified.
    pub fn apply_to(&self, base: &WorkflowConfig) -> Result<WorkflowConfig, WorkflowConfigError> {
        let mut merged = base.clone();
        if let Some(enabled) = self.enable_human_review {
            merged.enable_human_review = enabled;
        }
        if let Some(max) = self.max_review_iterations {
            merged.max_review_iterations = max;
        }
        if let Some(required) = self.testing_requires_manual_exit {
            merged.testing_requires_manual_exit = required;
        }
        if let Some(enabled) = self.auto_start_review {
            merged.auto_start_review = enabled;
        }
        if let Some(template) = &self.review_prompt_template {
            merged.review_prompt_template.clone_from(template);
        }
        merged.validate()?;
        Ok(merged)
    }
}
