use axum::{
    extract::{Path, State},
    response::Json,
};
use model::entities::currency;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, trace};
use utoipa::ToSchema;

use crate::error::{ApiError, Result};
use crate::schemas::{AppState, ErrorResponse};

/// Currency response model
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CurrencyResponse {
    pub id: i32,
    pub name: String,
    pub area: String,
    pub symbol: String,
    /// ISO 4217 code, e.g. `EUR`
    pub iso_code: String,
}

impl From<currency::Model> for CurrencyResponse {
    fn from(model: currency::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            area: model.area,
            symbol: model.symbol,
            iso_code: model.iso_code,
        }
    }
}

/// List all supported currencies
#[utoipa::path(
    get,
    path = "/api/v1/currencies",
    tag = "currencies",
    responses(
        (status = 200, description = "Currencies retrieved successfully", body = Vec<CurrencyResponse>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn list_currencies(State(state): State<AppState>) -> Result<Json<Vec<CurrencyResponse>>> {
    trace!("Entering list_currencies function");
    let currencies = state.currencies.list().await?;
    debug!("Returning {} currencies", currencies.len());
    Ok(Json(currencies.into_iter().map(CurrencyResponse::from).collect()))
}

/// Look up a currency by ISO code
#[utoipa::path(
    get,
    path = "/api/v1/currencies/{iso_code}",
    tag = "currencies",
    params(
        ("iso_code" = String, Path, description = "ISO 4217 currency code"),
    ),
    responses(
        (status = 200, description = "Currency found", body = CurrencyResponse),
        (status = 404, description = "Unknown currency", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_currency(
    Path(iso_code): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<CurrencyResponse>> {
    match state.currencies.find_by_iso_code(&iso_code).await? {
        Some(currency) => Ok(Json(currency.into())),
        None => Err(ApiError::NotFound(format!("No such currency: {}", iso_code))),
    }
}
