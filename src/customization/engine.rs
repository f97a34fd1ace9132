//! Selection seeding, value updates and pricing for the product configurator.
//!
//! Everything here is synchronous and infallible: pricing must keep working
//! with stale or partial catalog data, so missing pieces count as zero or
//! fall back to defaults instead of failing.

use serde::Serialize;
use std::collections::HashSet;

use crate::catalog::types::{CustomizationOption, OptionKind, OptionValue, Product};
use crate::customization::error::{IssueReason, OptionIssue, ValidationError};
use crate::customization::quantize::{ProfileRegistry, QuantizationProfile};
use crate::customization::selection::SelectionState;

/// Priced contribution of one selected option.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineAdjustment {
    pub option_id: String,
    pub value: OptionValue,
    pub amount: f64,
}

/// Itemized price for a product and selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceBreakdown {
    pub base_price: f64,
    pub adjustments: Vec<LineAdjustment>,
    pub total: f64,
}

/// Stateless configurator logic parameterized by quantization profiles.
#[derive(Debug, Clone)]
pub struct CustomizationEngine {
    registry: ProfileRegistry,
}

impl Default for CustomizationEngine {
    fn default() -> Self {
        Self::from_profiles([QuantizationProfile::lens_power()])
    }
}

impl CustomizationEngine {
    pub fn new(registry: ProfileRegistry) -> Self {
        Self { registry }
    }

    pub fn from_profiles(profiles: impl IntoIterator<Item = QuantizationProfile>) -> Self {
        Self::new(ProfileRegistry::new(profiles))
    }

    pub fn registry(&self) -> &ProfileRegistry {
        &self.registry
    }

    /// Seed one entry per well-formed option from its default.
    ///
    /// Numeric options fall back to `min`, then `0`. Color/select options fall
    /// back to their first choice when the default is absent or not offered.
    /// Malformed options (empty or duplicate id, choice list empty) are skipped.
    pub fn initialize(&self, product: &Product, options: &[CustomizationOption]) -> SelectionState {
        let mut seen = HashSet::new();
        let mut entries = Vec::with_capacity(options.len());

        for option in options {
            if option.id.is_empty() || !seen.insert(option.id.as_str()) {
                tracing::debug!(product = %product.id, option = %option.id, "Skipping option with empty or duplicate id");
                continue;
            }
            match seed_value(option) {
                Some(value) => entries.push((option.id.clone(), value)),
                None => {
                    tracing::debug!(product = %product.id, option = %option.id, "Skipping option without usable default");
                }
            }
        }

        entries.into_iter().collect()
    }

    /// Store `raw` under `option_id`, snapping it first when the option is
    /// numeric and bound to a profile. Unknown ids leave the state untouched.
    pub fn set_value(
        &self,
        options: &[CustomizationOption],
        state: &SelectionState,
        option_id: &str,
        raw: OptionValue,
    ) -> SelectionState {
        let Some(option) = options.iter().find(|o| o.id == option_id) else {
            tracing::debug!(option = option_id, "Ignoring update for unknown option");
            return state.clone();
        };

        let value = match option.kind {
            OptionKind::Numeric => self.normalize_numeric(option, raw),
            OptionKind::Color | OptionKind::Select => raw,
        };

        state.with(option_id, value)
    }

    fn normalize_numeric(&self, option: &CustomizationOption, raw: OptionValue) -> OptionValue {
        if raw.is_empty() {
            return raw;
        }
        let Some(number) = raw.as_number() else {
            return raw;
        };
        match self.registry.for_option(option) {
            Some(profile) => OptionValue::Number(profile.snap(number)),
            None => OptionValue::Number(number),
        }
    }

    /// Base price plus the adjustment of every option with a value.
    pub fn compute_total(&self, product: &Product, options: &[CustomizationOption], state: &SelectionState) -> f64 {
        self.quote(product, options, state).total
    }

    /// Itemized form of [`compute_total`](Self::compute_total).
    pub fn quote(&self, product: &Product, options: &[CustomizationOption], state: &SelectionState) -> PriceBreakdown {
        let mut seen = HashSet::new();
        let mut adjustments = Vec::new();
        let mut total = product.base_price;

        for option in options {
            if !seen.insert(option.id.as_str()) {
                continue;
            }
            let Some(value) = state.get(&option.id) else {
                continue;
            };
            if value.is_empty() {
                continue;
            }
            let amount = adjustment_for(option, value);
            total += amount;
            adjustments.push(LineAdjustment {
                option_id: option.id.clone(),
                value: value.clone(),
                amount,
            });
        }

        PriceBreakdown {
            base_price: product.base_price,
            adjustments,
            total,
        }
    }

    /// Increment used by the option's stepper control at `current`.
    pub fn resolve_step(&self, option: &CustomizationOption, current: f64) -> f64 {
        if let Some(profile) = self.registry.for_option(option) {
            return profile.step_for(current);
        }
        option
            .range
            .as_ref()
            .and_then(|r| r.step)
            .filter(|step| step.is_finite() && *step > 0.0)
            .unwrap_or(1.0)
    }

    /// Check that `state` can be submitted.
    pub fn validate(&self, options: &[CustomizationOption], state: &SelectionState) -> Result<(), ValidationError> {
        let mut issues = Vec::new();
        let mut seen = HashSet::new();

        for option in options {
            if !seen.insert(option.id.as_str()) {
                continue;
            }
            let issue = |reason| OptionIssue {
                option_id: option.id.clone(),
                option_name: option.name.clone(),
                reason,
            };

            let value = match state.get(&option.id) {
                Some(value) if !value.is_empty() => value,
                _ => {
                    if option.required {
                        issues.push(issue(IssueReason::Missing));
                    }
                    continue;
                }
            };

            match option.kind {
                OptionKind::Numeric => match value.as_number() {
                    None => issues.push(issue(IssueReason::NotANumber)),
                    Some(n) => {
                        if let Some(range) = option.range.as_ref().filter(|r| !r.contains(n)) {
                            issues.push(issue(IssueReason::OutOfRange { min: range.min, max: range.max }));
                        }
                    }
                },
                OptionKind::Color | OptionKind::Select => {
                    let offered = value.as_text().and_then(|v| option.choice(v)).is_some();
                    if !offered {
                        issues.push(issue(IssueReason::UnknownChoice));
                    }
                }
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }
}

fn seed_value(option: &CustomizationOption) -> Option<OptionValue> {
    match option.kind {
        OptionKind::Numeric => {
            let number = option
                .default_value
                .as_ref()
                .and_then(OptionValue::as_number)
                .or_else(|| option.range.as_ref().map(|r| r.min))
                .unwrap_or(0.0);
            Some(OptionValue::Number(number))
        }
        OptionKind::Color | OptionKind::Select => {
            let default = option
                .default_value
                .as_ref()
                .and_then(OptionValue::as_text)
                .and_then(|v| option.choice(v));
            default
                .or_else(|| option.choices.first())
                .map(|c| OptionValue::Text(c.value.clone()))
        }
    }
}

fn adjustment_for(option: &CustomizationOption, value: &OptionValue) -> f64 {
    let amount = match option.kind {
        OptionKind::Numeric => option.price_adjustment,
        OptionKind::Color | OptionKind::Select => value
            .as_text()
            .and_then(|v| option.choice(v))
            .and_then(|c| c.price_adjustment),
    };
    amount.filter(|a| a.is_finite()).unwrap_or(0.0)
}
