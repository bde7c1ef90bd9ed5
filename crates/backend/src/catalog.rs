// =============================================================================
// Somoco Backend - Catalog & Compare Handlers
// =============================================================================

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use somoco_common::catalog::{facets, filter, paginate, sort_by_ranking, DEFAULT_PAGE_SIZE};
use somoco_common::{
    ApiResponse, CatalogPage, CatalogQuery, ComparisonTable, Facets, TableRow, ValidationError, Vehicle,
};

use crate::error::ApiError;
use crate::extract::ApiQuery;
use crate::AppState;

// -----------------------------------------------------------------------------
// Catalog
// -----------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogResponse {
    #[serde(flatten)]
    pub page: CatalogPage<Vehicle>,
    /// Filter options over the whole catalog, not just this page
    pub facets: Facets,
}

/// Product listing: ranked, filtered, paged.
pub async fn get_catalog(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<CatalogQuery>,
) -> Result<Json<ApiResponse<CatalogResponse>>, ApiError> {
    let mut vehicles = state
        .store
        .list_vehicles()
        .await
        .map_err(ApiError::cms("Failed to fetch vehicles"))?;
    sort_by_ranking(&mut vehicles);

    let matching = filter(&vehicles, &query);
    let page = paginate(&matching, query.page.unwrap_or(1), DEFAULT_PAGE_SIZE);

    Ok(Json(ApiResponse::ok(CatalogResponse {
        page: CatalogPage {
            items: page.items.into_iter().cloned().collect(),
            page: page.page,
            total_pages: page.total_pages,
            total_items: page.total_items,
        },
        facets: facets(&vehicles),
    })))
}

// -----------------------------------------------------------------------------
// Compare
// -----------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct CompareQuery {
    #[serde(default)]
    pub first: Option<String>,
    #[serde(default)]
    pub second: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CompareResponse {
    pub table: ComparisonTable,
    /// The table flattened into header and parameter rows, ready to render
    pub rows: Vec<TableRow>,
}

/// Side-by-side specification table of two vehicles.
pub async fn compare(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<CompareQuery>,
) -> Result<Json<ApiResponse<CompareResponse>>, ApiError> {
    let first_id = required(query.first.as_deref(), "first")?;
    let second_id = required(query.second.as_deref(), "second")?;

    let first = fetch(&state, first_id).await?;
    let second = fetch(&state, second_id).await?;

    let table = ComparisonTable::new(&first, &second);
    let rows = table.rows();
    Ok(Json(ApiResponse::ok(CompareResponse { table, rows })))
}

fn required<'a>(value: Option<&'a str>, field: &'static str) -> Result<&'a str, ApiError> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(ApiError::Validation(ValidationError::Required(field)))
}

async fn fetch(state: &AppState, id: &str) -> Result<Vehicle, ApiError> {
    state
        .store
        .get_vehicle(id)
        .await
        .map_err(ApiError::cms("Failed to fetch vehicle"))?
        .ok_or_else(|| ApiError::NotFound(format!("Vehicle not found: {id}")))
}
