//! Engine configuration with file loading and full defaults.

use std::path::Path;

use serde::Deserialize;

use crate::error::{CodeNavError, Result};
use crate::estimate::BASE_RESPONSE_COST;
use crate::hierarchy::MAX_DEPTH_CEILING;
use crate::overflow::RetentionPolicy;
use crate::reduce::DEFAULT_REDUCTION_STEPS;

/// Runtime knobs for shaping, traversal, and overflow retention.
///
/// Everything has a default; a TOML file (`codenav.toml`) may override any
/// subset of fields.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Hard safety budget per response, in cost units
    pub response_budget: usize,

    /// Fixed envelope overhead charged once per response
    pub base_response_cost: usize,

    /// Default item count when a request does not ask for one
    pub default_max_results: usize,

    /// Descending candidate sizes for progressive reduction
    pub reduction_steps: Vec<usize>,

    /// Default traversal depth for hierarchy tools
    pub default_depth: usize,

    /// Page size of overflow records
    pub overflow_page_size: usize,

    /// Overflow retention: record count bound
    pub overflow_max_records: usize,

    /// Overflow retention: record age bound in seconds
    pub overflow_ttl_seconds: i64,

    /// Display-name fragments of dependency symbols worth keeping in
    /// outgoing call expansion (execution/persistence entry points)
    pub external_allowlist: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            response_budget: 12_000,
            base_response_cost: BASE_RESPONSE_COST,
            default_max_results: 100,
            reduction_steps: DEFAULT_REDUCTION_STEPS.to_vec(),
            default_depth: 3,
            overflow_page_size: 100,
            overflow_max_records: 64,
            overflow_ttl_seconds: 1800,
            external_allowlist: Vec::new(),
        }
    }
}

impl EngineConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path).map_err(|e| CodeNavError::ConfigFailure {
            message: format!("cannot read {}: {}", path.display(), e),
        })?;
        let config: EngineConfig =
            toml::from_str(&data).map_err(|e| CodeNavError::ConfigFailure {
                message: format!("invalid config {}: {}", path.display(), e),
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.response_budget == 0 {
            return Err(invalid("response_budget must be positive"));
        }
        if self.default_max_results == 0 {
            return Err(invalid("default_max_results must be positive"));
        }
        if self.overflow_page_size == 0 {
            return Err(invalid("overflow_page_size must be positive"));
        }
        if self.reduction_steps.is_empty() {
            return Err(invalid("reduction_steps must not be empty"));
        }
        if self.reduction_steps.windows(2).any(|w| w[0] <= w[1]) {
            return Err(invalid("reduction_steps must be strictly descending"));
        }
        if self.default_depth > MAX_DEPTH_CEILING {
            return Err(invalid("default_depth exceeds the depth ceiling"));
        }
        Ok(())
    }

    pub fn retention_policy(&self) -> RetentionPolicy {
        RetentionPolicy {
            max_records: self.overflow_max_records,
            ttl_seconds: self.overflow_ttl_seconds,
        }
    }
}

fn invalid(message: &str) -> CodeNavError {
    CodeNavError::InvalidDepthOrBudget {
        message: message.to_string(),
    }
}
