//! Configurator state for the product a shopper is currently customizing.
//!
//! The session owns the active product, its option catalog and the
//! selection. Loads are tagged with a generation number: switching products
//! bumps it, and a load that finishes for an older generation is dropped.

use std::sync::Arc;
use thiserror::Error;

use crate::cart::CartSubmission;
use crate::catalog::types::{CustomizationOption, OptionValue, Product};
use crate::customization::engine::{CustomizationEngine, PriceBreakdown};
use crate::customization::error::ValidationError;
use crate::customization::selection::SelectionState;

#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("no product selected")]
    NoActiveProduct,

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

#[derive(Debug, Clone)]
struct ActiveProduct {
    product: Product,
    options: Vec<CustomizationOption>,
    state: SelectionState,
}

#[derive(Debug, Clone)]
pub struct ConfiguratorSession {
    engine: Arc<CustomizationEngine>,
    active: Option<ActiveProduct>,
    generation: u64,
}

impl ConfiguratorSession {
    pub fn new(engine: Arc<CustomizationEngine>) -> Self {
        Self {
            engine,
            active: None,
            generation: 0,
        }
    }

    /// Current load generation.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Mark the start of a new product load. Results of earlier loads are
    /// stale from here on.
    pub fn begin_load(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    /// Install a loaded product if `generation` is still current.
    pub fn apply_loaded(
        &mut self,
        generation: u64,
        product: Product,
        options: Vec<CustomizationOption>,
    ) -> bool {
        if generation != self.generation {
            tracing::debug!(
                product = %product.id,
                generation,
                current = self.generation,
                "Dropping stale product load"
            );
            return false;
        }
        let state = self.engine.initialize(&product, &options);
        self.active = Some(ActiveProduct { product, options, state });
        true
    }

    /// Switch to `product` immediately, seeding a fresh selection.
    pub fn select_product(&mut self, product: Product, options: Vec<CustomizationOption>) -> &SelectionState {
        self.begin_load();
        let state = self.engine.initialize(&product, &options);
        &self.active.insert(ActiveProduct { product, options, state }).state
    }

    /// Product being configured, if one is loaded.
    pub fn product(&self) -> Option<&Product> {
        self.active.as_ref().map(|a| &a.product)
    }

    /// Options of the loaded product in display order.
    pub fn options(&self) -> &[CustomizationOption] {
        self.active.as_ref().map(|a| a.options.as_slice()).unwrap_or(&[])
    }

    pub fn selection_state(&self) -> Option<&SelectionState> {
        self.active.as_ref().map(|a| &a.state)
    }

    /// Apply one user change. Returns whether the selection changed.
    pub fn set_value(&mut self, option_id: &str, raw: impl Into<OptionValue>) -> bool {
        let Some(active) = self.active.as_mut() else {
            return false;
        };
        let next = self.engine.set_value(&active.options, &active.state, option_id, raw.into());
        // A value that snaps onto the current one leaves the state untouched.
        let changed = next.entry_changed(&active.state, option_id)
            && next.get(option_id) != active.state.get(option_id);
        if changed {
            active.state = next;
        }
        changed
    }

    /// Total price for the current selection.
    pub fn price_quote(&self) -> Option<f64> {
        self.active
            .as_ref()
            .map(|a| self.engine.compute_total(&a.product, &a.options, &a.state))
    }

    /// Base price plus per-option adjustments for the current selection.
    pub fn breakdown(&self) -> Option<PriceBreakdown> {
        self.active
            .as_ref()
            .map(|a| self.engine.quote(&a.product, &a.options, &a.state))
    }

    /// Stepper increment for `option_id` at its current value.
    pub fn step_for(&self, option_id: &str) -> Option<f64> {
        let active = self.active.as_ref()?;
        let option = active.options.iter().find(|o| o.id == option_id)?;
        let current = active
            .state
            .get(option_id)
            .and_then(OptionValue::as_number)
            .unwrap_or(0.0);
        Some(self.engine.resolve_step(option, current))
    }

    /// Validate and build the payload for the cart.
    pub fn submission(&self) -> Result<CartSubmission, SubmissionError> {
        let active = self.active.as_ref().ok_or(SubmissionError::NoActiveProduct)?;
        self.engine.validate(&active.options, &active.state)?;
        let total_price = self.engine.compute_total(&active.product, &active.options, &active.state);
        Ok(CartSubmission::new(active.product.id.clone(), active.state.clone(), total_price))
    }

    /// Reset the selection after the cart accepted the submission.
    pub fn complete_submission(&mut self) {
        if let Some(active) = self.active.as_mut() {
            active.state = self.engine.initialize(&active.product, &active.options);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::types::{NumericRange, OptionChoice, OptionKind};

    fn product(id: &str) -> Product {
        Product {
            id: id.to_string(),
            name: id.to_string(),
            description: String::new(),
            base_price: 100.0,
            image_url: None,
        }
    }

    fn options() -> Vec<CustomizationOption> {
        vec![
            CustomizationOption {
                id: "color".into(),
                name: "Color".into(),
                kind: OptionKind::Select,
                choices: vec![OptionChoice { value: "blue".into(), label: "Blue".into(), price_adjustment: Some(20.0) }],
                range: None,
                required: true,
                default_value: Some(OptionValue::from("blue")),
                price_adjustment: None,
                group: None,
                order: 0,
                product_id: None,
                quantization_profile: None,
            },
            CustomizationOption {
                id: "power".into(),
                name: "Power".into(),
                kind: OptionKind::Numeric,
                choices: vec![],
                range: Some(NumericRange { min: 0.0, max: 1500.0, step: Some(25.0), unit: None }),
                required: true,
                default_value: None,
                price_adjustment: None,
                group: None,
                order: 1,
                product_id: None,
                quantization_profile: Some("lens_power".into()),
            },
        ]
    }

    fn session() -> ConfiguratorSession {
        ConfiguratorSession::new(Arc::new(CustomizationEngine::default()))
    }

    #[test]
    fn test_quote_and_submission() {
        let mut session = session();
        session.select_product(product("p1"), options());
        assert!(session.set_value("power", 512.0));
        assert_eq!(session.price_quote(), Some(120.0));
        assert_eq!(session.step_for("power"), Some(25.0));

        let submission = session.submission().unwrap();
        assert_eq!(submission.product_id, "p1");
        assert_eq!(submission.total_price, 120.0);
        assert_eq!(submission.selections.get("power"), Some(&OptionValue::Number(500.0)));
    }

    #[test]
    fn test_value_snapping_to_current_reports_no_change() {
        let mut session = session();
        session.select_product(product("p1"), options());
        assert!(session.set_value("power", 512.0));
        let before = session.selection_state().cloned();

        assert!(!session.set_value("power", 510.0));
        assert_eq!(session.selection_state().cloned(), before);
        assert_eq!(
            session.selection_state().and_then(|s| s.get("power")),
            Some(&OptionValue::Number(500.0))
        );

        assert!(session.set_value("power", 530.0));
    }

    #[test]
    fn test_unknown_option_reports_no_change() {
        let mut session = session();
        session.select_product(product("p1"), options());
        let before = session.selection_state().cloned();
        assert!(!session.set_value("tint", "grey"));
        assert_eq!(session.selection_state().cloned(), before);
    }

    #[test]
    fn test_stale_load_is_dropped() {
        let mut session = session();
        let first = session.begin_load();
        let second = session.begin_load();

        assert!(!session.apply_loaded(first, product("old"), options()));
        assert!(session.product().is_none());

        assert!(session.apply_loaded(second, product("new"), options()));
        assert_eq!(session.product().unwrap().id, "new");
    }

    #[test]
    fn test_submission_requires_product_and_values() {
        let mut session = session();
        assert!(matches!(session.submission(), Err(SubmissionError::NoActiveProduct)));

        session.select_product(product("p1"), options());
        session.set_value("color", "");
        match session.submission() {
            Err(SubmissionError::Validation(err)) => assert!(err.for_option("color").is_some()),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_complete_submission_reseeds() {
        let mut session = session();
        session.select_product(product("p1"), options());
        session.set_value("power", 800.0);
        session.complete_submission();
        assert_eq!(
            session.selection_state().unwrap().get("power"),
            Some(&OptionValue::Number(0.0))
        );
    }
}
