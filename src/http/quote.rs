//! Price quotes and cart submission.
//!
//! Both endpoints rebuild the configurator from the catalog and replay the
//! submitted selections through it, so snapping and validation apply exactly
//! as they do interactively.

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::cart::CartLine;
use crate::catalog::types::OptionValue;
use crate::customization::{ConfiguratorSession, PriceBreakdown, SelectionState};
use crate::http::error::ApiError;
use crate::http::server::AppState;
use crate::observability::metrics;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QuoteRequest {
    pub product_id: String,
    #[serde(default)]
    pub selections: BTreeMap<String, OptionValue>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteResponse {
    pub quote_id: Uuid,
    pub product_id: String,
    pub currency: String,
    pub total: f64,
    pub breakdown: PriceBreakdownView,
    /// Selections after seeding and snapping.
    pub selections: SelectionState,
    /// Stepper increment per numeric option at its current value.
    pub steps: BTreeMap<String, f64>,
    /// Submitted option ids the product does not offer.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ignored: Vec<String>,
}

/// Wire form of [`PriceBreakdown`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceBreakdownView {
    pub base_price: f64,
    pub adjustments: BTreeMap<String, f64>,
}

impl From<&PriceBreakdown> for PriceBreakdownView {
    fn from(breakdown: &PriceBreakdown) -> Self {
        Self {
            base_price: breakdown.base_price,
            adjustments: breakdown
                .adjustments
                .iter()
                .map(|a| (a.option_id.clone(), a.amount))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartResponse {
    pub line: CartLine,
    pub selections: SelectionState,
}

/// Load the product and replay `selections` into a fresh session.
async fn configure(state: &AppState, request: QuoteRequest) -> Result<(ConfiguratorSession, Vec<String>), ApiError> {
    let (product, options) = state.catalog.load_configurable(&request.product_id).await?;

    let mut session = ConfiguratorSession::new(state.engine.load_full());
    session.select_product(product, options);

    let mut ignored = Vec::new();
    for (option_id, value) in request.selections {
        if !session.options().iter().any(|o| o.id == option_id) {
            tracing::debug!(option = %option_id, "Ignoring selection for unknown option");
            ignored.push(option_id);
            continue;
        }
        session.set_value(&option_id, value);
    }
    Ok((session, ignored))
}

pub async fn create_quote(
    State(state): State<AppState>,
    Json(request): Json<QuoteRequest>,
) -> Result<Json<QuoteResponse>, ApiError> {
    let (session, ignored) = configure(&state, request).await?;
    let (Some(product), Some(breakdown), Some(selections)) =
        (session.product(), session.breakdown(), session.selection_state())
    else {
        return Err(ApiError::BadRequest("no product selected".to_string()));
    };

    let steps = session
        .options()
        .iter()
        .filter(|o| o.is_numeric())
        .filter_map(|o| session.step_for(&o.id).map(|step| (o.id.clone(), step)))
        .collect();

    metrics::record_quote(&product.id);
    let response = QuoteResponse {
        quote_id: Uuid::new_v4(),
        product_id: product.id.clone(),
        currency: state.currency.to_string(),
        total: breakdown.total,
        breakdown: PriceBreakdownView::from(&breakdown),
        selections: selections.clone(),
        steps,
        ignored,
    };
    tracing::debug!(quote_id = %response.quote_id, product = %response.product_id, total = response.total, "Quoted");
    Ok(Json(response))
}

pub async fn add_to_cart(
    State(state): State<AppState>,
    Json(request): Json<QuoteRequest>,
) -> Result<(StatusCode, Json<CartResponse>), ApiError> {
    let (session, _) = configure(&state, request).await?;
    let submission = session.submission()?;
    let line = state.cart.add_to_cart(&submission).await?;

    Ok((
        StatusCode::CREATED,
        Json(CartResponse {
            line,
            selections: submission.selections,
        }),
    ))
}
