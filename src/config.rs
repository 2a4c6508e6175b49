use serde::{Deserialize, Serialize};

// ============================================================================
// Engine configuration (optional YAML)
// ============================================================================

/// Tunable heuristic constants, grouped per component.
///
/// Every field is defaulted, so a partial YAML file only overrides the keys it
/// names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub discovery: DiscoveryConfig,
    #[serde(default)]
    pub container: ContainerConfig,
    #[serde(default)]
    pub grouping: GroupingConfig,
    #[serde(default)]
    pub injection: InjectionConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// Below this many whitelist hits the fallback scorer runs
    #[serde(default = "default_three")]
    pub fallback_min_results: usize,

    /// Fallback score needed by input-like tags
    #[serde(default = "default_three_i32")]
    pub input_like_threshold: i32,

    /// Fallback score needed by generic elements
    #[serde(default = "default_six_i32")]
    pub generic_threshold: i32,

    /// Site-specific selectors appended to the whitelist
    #[serde(default)]
    pub extra_selectors: Vec<String>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            fallback_min_results: 3,
            input_like_threshold: 3,
            generic_threshold: 6,
            extra_selectors: vec![],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerConfig {
    /// An enclosing region must hold this many times the fields to win
    #[serde(default = "default_expand_ratio")]
    pub expand_ratio: f64,

    #[serde(default = "default_ten_i32")]
    pub min_acceptable_score: i32,

    /// Nesting depth after which candidates are penalized
    #[serde(default = "default_fifteen")]
    pub depth_penalty_start: usize,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            expand_ratio: 1.2,
            min_acceptable_score: 10,
            depth_penalty_start: 15,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupingConfig {
    #[serde(default = "default_one")]
    pub radio_min_members: usize,

    #[serde(default = "default_two")]
    pub checkbox_min_members: usize,

    /// Cluster leftover radios that share a parent element
    #[serde(default = "default_true")]
    pub proximity_grouping: bool,

    /// Apply the same proximity rule to checkboxes
    #[serde(default)]
    pub checkbox_proximity: bool,

    /// How far up a semantic container is searched for
    #[serde(default = "default_six")]
    pub max_container_depth: usize,
}

impl Default for GroupingConfig {
    fn default() -> Self {
        Self {
            radio_min_members: 1,
            checkbox_min_members: 2,
            proximity_grouping: true,
            checkbox_proximity: false,
            max_container_depth: 6,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InjectionConfig {
    #[serde(default = "default_dropdown_delay")]
    pub dropdown_open_delay_ms: u64,

    #[serde(default = "default_verify_timeout")]
    pub verify_timeout_ms: u64,

    #[serde(default = "default_verify_interval")]
    pub verify_interval_ms: u64,
}

impl Default for InjectionConfig {
    fn default() -> Self {
        Self {
            dropdown_open_delay_ms: 150,
            verify_timeout_ms: 120,
            verify_interval_ms: 20,
        }
    }
}

// Serde default helpers
fn default_one() -> usize { 1 }
fn default_two() -> usize { 2 }
fn default_three() -> usize { 3 }
fn default_six() -> usize { 6 }
fn default_fifteen() -> usize { 15 }
fn default_three_i32() -> i32 { 3 }
fn default_six_i32() -> i32 { 6 }
fn default_ten_i32() -> i32 { 10 }
fn default_true() -> bool { true }
fn default_expand_ratio() -> f64 { 1.2 }
fn default_dropdown_delay() -> u64 { 150 }
fn default_verify_timeout() -> u64 { 120 }
fn default_verify_interval() -> u64 { 20 }
