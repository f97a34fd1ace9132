//! Magnitude-dependent snapping of numeric option values.
//!
//! A profile snaps values to a grid whose spacing changes above a threshold.
//! At or below the threshold the grid is `fine_step` anchored at zero; above
//! it the grid is `coarse_step` anchored at the threshold. Values round to
//! the nearest grid point and exact halves round up.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::catalog::types::CustomizationOption;

/// A named snapping rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantizationProfile {
    pub name: String,
    pub threshold: f64,
    pub fine_step: f64,
    pub coarse_step: f64,
    /// Option names (case-insensitive) bound to this profile when the option
    /// does not name a profile itself.
    #[serde(default)]
    pub option_names: Vec<String>,
}

impl QuantizationProfile {
    /// Lens power: 25 up to 500, 50 above.
    pub fn lens_power() -> Self {
        Self {
            name: "lens_power".to_string(),
            threshold: 500.0,
            fine_step: 25.0,
            coarse_step: 50.0,
            option_names: Vec::new(),
        }
    }

    /// Snap `value` to the nearest grid point.
    pub fn snap(&self, value: f64) -> f64 {
        if !value.is_finite() {
            return value;
        }
        if value > self.threshold {
            round_half_up(value, self.threshold, self.coarse_step)
        } else {
            round_half_up(value, 0.0, self.fine_step)
        }
    }

    /// Step size of the grid `value` sits on.
    pub fn step_for(&self, value: f64) -> f64 {
        if value > self.threshold {
            self.coarse_step
        } else {
            self.fine_step
        }
    }
}

fn round_half_up(value: f64, origin: f64, grid: f64) -> f64 {
    if !(grid > 0.0) {
        return value;
    }
    let offset = value - origin;
    let mut steps = (offset / grid).floor();
    if offset - steps * grid >= grid / 2.0 {
        steps += 1.0;
    }
    origin + steps * grid
}

/// Profiles by name, with the option-name bindings resolved.
#[derive(Debug, Clone, Default)]
pub struct ProfileRegistry {
    by_name: HashMap<String, QuantizationProfile>,
    by_option_name: HashMap<String, String>,
}

impl ProfileRegistry {
    pub fn new(profiles: impl IntoIterator<Item = QuantizationProfile>) -> Self {
        let mut registry = Self::default();
        for profile in profiles {
            for option_name in &profile.option_names {
                registry
                    .by_option_name
                    .insert(option_name.to_lowercase(), profile.name.clone());
            }
            registry.by_name.insert(profile.name.clone(), profile);
        }
        registry
    }

    /// Profile registered under `name`.
    pub fn get(&self, name: &str) -> Option<&QuantizationProfile> {
        self.by_name.get(name)
    }

    /// Number of registered profiles.
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// Profile that applies to `option`, if any. Only numeric options snap.
    pub fn for_option(&self, option: &CustomizationOption) -> Option<&QuantizationProfile> {
        if !option.is_numeric() {
            return None;
        }
        match &option.quantization_profile {
            Some(name) => self.get(name),
            None => self
                .by_option_name
                .get(&option.name.to_lowercase())
                .and_then(|name| self.get(name)),
        }
    }
}
