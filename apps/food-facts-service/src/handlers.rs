use crate::{
    errors::Result,
    models::{CardView, ProductParams, SearchPage, SearchParams, SubmitPayload},
    state::AppState,
};
use axum::{
    Json,
    extract::{Path, Query, State},
};
use off_client::{
    CategorySearch, OffError, DataSubmission, Grade, ProductLookup, paginate, query::parse_field_selection,
};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, instrument};

const NO_PRODUCTS_NOTICE: &str = "No products found. Check spelling or try a different category.";

#[instrument(skip(state, code, params), fields(code = %code))]
pub async fn get_product(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
    Query(params): Query<ProductParams>,
) -> Result<Json<CardView>> {
    info!("Fetching product by barcode");

    let lookup = ProductLookup {
        barcode: code,
        fields: parse_field_selection(params.fields.as_deref()),
    };
    let record = state.off_client.fetch_product(&lookup).await?;

    Ok(Json(CardView::from(state.off_client.card(&record))))
}

/// Page numbers at or below zero land on the first page; `paginate` clamps the top end.
fn parse_page(raw: Option<&str>) -> Result<usize> {
    let raw = raw.map(str::trim).unwrap_or_default();
    if raw.is_empty() {
        return Ok(1);
    }
    let (negative, digits) = match raw.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, raw.strip_prefix('+').unwrap_or(raw)),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(OffError::Validation(format!("invalid page number '{}'", raw)).into());
    }
    if negative {
        return Ok(1);
    }
    Ok(digits.parse::<usize>().unwrap_or(usize::MAX).max(1))
}

#[instrument(skip(state, params), fields(query = ?params))]
pub async fn search_products(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchPage>> {
    info!("Searching products by category");

    let requested_page = parse_page(params.page.as_deref())?;
    let grade = params
        .grade
        .as_deref()
        .map(str::trim)
        .filter(|g| !g.is_empty())
        .map(str::parse::<Grade>)
        .transpose()?;
    let search = CategorySearch {
        category: params.category.unwrap_or_default(),
        fields: parse_field_selection(params.fields.as_deref()),
        grade,
    };
    let result = state.off_client.search_by_category(&search).await?;

    if result.products.is_empty() {
        info!("No products found for category");
        return Ok(Json(SearchPage {
            count: result.count,
            page: 1,
            total_pages: 1,
            notice: Some(NO_PRODUCTS_NOTICE.to_string()),
            cards: vec![],
        }));
    }

    let page = paginate(&result.products, requested_page);
    debug!(
        "Rendering page {} of {} ({} cards)",
        page.number,
        page.total_pages,
        page.items.len()
    );
    let cards = page
        .items
        .iter()
        .map(|record| CardView::from(state.off_client.card(record)))
        .collect();

    Ok(Json(SearchPage {
        count: result.count,
        page: page.number,
        total_pages: page.total_pages,
        notice: None,
        cards,
    }))
}

#[instrument(skip(state, code, payload), fields(code = %code, user_id = %payload.user_id))]
pub async fn submit_nutriments(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
    Json(payload): Json<SubmitPayload>,
) -> Result<Json<Value>> {
    info!("Submitting missing nutrient data");

    let submission = DataSubmission {
        barcode: code,
        user_id: payload.user_id,
        password: payload.password,
        nutrient_updates: payload.nutriments,
    };
    let ack = state.off_client.submit_data(&submission).await?;

    Ok(Json(ack))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_number_defaults_and_clamps_low() {
        assert_eq!(parse_page(None).unwrap(), 1);
        assert_eq!(parse_page(Some("")).unwrap(), 1);
        assert_eq!(parse_page(Some(" 3 ")).unwrap(), 3);
        assert_eq!(parse_page(Some("0")).unwrap(), 1);
        assert_eq!(parse_page(Some("-1")).unwrap(), 1);
        assert_eq!(parse_page(Some("99999999999999999999999")).unwrap(), usize::MAX);
        assert!(parse_page(Some("two")).is_err());
        assert!(parse_page(Some("-")).is_err());
    }
}
