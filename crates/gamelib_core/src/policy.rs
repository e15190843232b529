//! # Capacity Policy
//!
//! Growth and shrink thresholds for dense tables.
//!
//! The defaults are empirical. They affect amortized cost, never
//! correctness, so they are plain data that can be tuned per table or loaded
//! from a TOML file at startup:
//!
//! ```toml
//! min_capacity = 10
//! growth_factor = 1.5
//! shrink_threshold = 0.65
//! lookup_shrink_ratio = 1.8
//! lookup_max_id_ratio = 1.4
//! ```

use serde::Deserialize;

use crate::error::{StoreError, StoreResult};

/// Capacity management policy for a dense table.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CapacityPolicy {
    /// Smallest capacity a table is ever allocated with.
    pub min_capacity: usize,
    /// Capacity multiplier applied when an insert finds the table full.
    pub growth_factor: f64,
    /// Columns shrink to the live length once `len <= capacity * shrink_threshold`.
    pub shrink_threshold: f64,
    /// The sparse lookup is a shrink candidate once its size reaches `len * lookup_shrink_ratio`.
    pub lookup_shrink_ratio: f64,
    /// ...and only shrinks if the greatest live id is at most `len * lookup_max_id_ratio`.
    pub lookup_max_id_ratio: f64,
}

impl Default for CapacityPolicy {
    fn default() -> Self {
        Self {
            min_capacity: 10,
            growth_factor: 1.5,
            shrink_threshold: 0.65,
            lookup_shrink_ratio: 1.8,
            lookup_max_id_ratio: 1.4,
        }
    }
}

impl CapacityPolicy {
    /// Parses and validates a policy from TOML. Missing keys use defaults.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPolicy` if the text is not valid TOML for this struct
    /// or the values fail [`CapacityPolicy::validate`].
    pub fn from_toml_str(text: &str) -> StoreResult<Self> {
        let policy: Self =
            toml::from_str(text).map_err(|e| StoreError::InvalidPolicy(e.to_string()))?;
        policy.validate()?;
        Ok(policy)
    }

    /// Checks that the thresholds describe a policy that terminates.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPolicy` naming the first bad parameter.
    // Negated comparisons also reject NaN.
    #[allow(clippy::neg_cmp_op_on_partial_ord)]
    pub fn validate(&self) -> StoreResult<()> {
        if self.min_capacity == 0 {
            return Err(StoreError::InvalidPolicy(
                "min_capacity must be greater than zero".into(),
            ));
        }
        if !(self.growth_factor > 1.0) {
            return Err(StoreError::InvalidPolicy(format!(
                "growth_factor must be greater than 1.0, got {}",
                self.growth_factor
            )));
        }
        if !(self.shrink_threshold > 0.0 && self.shrink_threshold < 1.0) {
            return Err(StoreError::InvalidPolicy(format!(
                "shrink_threshold must be in (0, 1), got {}",
                self.shrink_threshold
            )));
        }
        if !(self.lookup_shrink_ratio > 1.0) {
            return Err(StoreError::InvalidPolicy(format!(
                "lookup_shrink_ratio must be greater than 1.0, got {}",
                self.lookup_shrink_ratio
            )));
        }
        if !(self.lookup_max_id_ratio >= 1.0 && self.lookup_max_id_ratio < self.lookup_shrink_ratio)
        {
            return Err(StoreError::InvalidPolicy(format!(
                "lookup_max_id_ratio must be in [1.0, lookup_shrink_ratio), got {}",
                self.lookup_max_id_ratio
            )));
        }
        Ok(())
    }

    /// Capacity to grow to when `len` rows fill the table.
    ///
    /// Always strictly greater than `len` and never below `min_capacity`.
    #[must_use]
    pub fn grown_capacity(&self, len: usize) -> usize {
        let scaled = (len as f64 * self.growth_factor) as usize;
        scaled.max(len + 1).max(self.min_capacity)
    }

    /// Whether columns holding `len` live rows in `capacity` slots should shrink.
    #[must_use]
    pub fn should_shrink(&self, len: usize, capacity: usize) -> bool {
        len as f64 <= capacity as f64 * self.shrink_threshold
    }

    /// Clamps a requested capacity to the policy floor.
    #[inline]
    #[must_use]
    pub fn floor(&self, capacity: usize) -> usize {
        capacity.max(self.min_capacity)
    }
}
