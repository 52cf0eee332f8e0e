use super::ResolveError;
use crate::value::json::from_json_str;
use crate::value::ConfigValue;

/// Per-query adjustments to how options are resolved.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GetOptionsPreferences {
    /// Merged on top of the result after every requested feature.
    pub overrides: Option<ConfigValue>,
    /// Checked against each requested feature's conditions. Without
    /// constraints, conditions are ignored and every feature applies.
    pub constraints: Option<ConfigValue>,
    /// Use requested names exactly as given instead of resolving aliases
    /// and case variants.
    pub skip_feature_name_conversion: bool,
}

impl GetOptionsPreferences {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_overrides(mut self, overrides: ConfigValue) -> Self {
        self.overrides = Some(overrides);
        self
    }

    pub fn with_constraints(mut self, constraints: ConfigValue) -> Self {
        self.constraints = Some(constraints);
        self
    }

    /// Sets or clears the constraints from JSON text.
    pub fn set_constraints_json(&mut self, constraints: Option<&str>) -> Result<(), ResolveError> {
        self.constraints = constraints
            .map(from_json_str)
            .transpose()
            .map_err(ResolveError::InvalidConstraints)?;
        Ok(())
    }

    /// Sets or clears the overrides from JSON text.
    pub fn set_overrides_json(&mut self, overrides: Option<&str>) -> Result<(), ResolveError> {
        self.overrides = overrides
            .map(from_json_str)
            .transpose()
            .map_err(ResolveError::InvalidOverrides)?;
        Ok(())
    }
}
