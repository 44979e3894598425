//! Search-as-you-type handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Query, State};
use serde::Deserialize;
use tracing::instrument;

use crate::routes::views::ProductCard;
use crate::services::catalog::search_term;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

/// Search dropdown fragment.
#[derive(Template, WebTemplate)]
#[template(path = "partials/search_results.html")]
pub struct SearchResultsTemplate {
    pub query: String,
    /// False until the query is long enough to search.
    pub searched: bool,
    pub results: Vec<ProductCard>,
}

/// Return matching products as an HTML fragment.
#[instrument(skip(state))]
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> SearchResultsTemplate {
    let results = state.catalog().search(&query.q).await;
    SearchResultsTemplate {
        searched: search_term(&query.q).is_some(),
        results: ProductCard::list(&results, None, &state.config().store.whatsapp_number),
        query: query.q.trim().to_owned(),
    }
}
