use off_client::{DisplayCard, NutrientUpdate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Deserialize)]
pub struct ProductParams {
    /// Comma-separated field selection.
    pub fields: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub category: Option<String>,
    /// `a`..`e`; empty means no grade filter.
    pub grade: Option<String>,
    pub fields: Option<String>,
    /// Raw page number as a form sends it; blank or non-positive means page 1.
    pub page: Option<String>,
}

#[derive(Deserialize)]
pub struct SubmitPayload {
    pub user_id: String,
    pub password: String,
    #[serde(default)]
    pub nutriments: BTreeMap<String, NutrientUpdate>,
}

impl fmt::Debug for SubmitPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubmitPayload")
            .field("user_id", &self.user_id)
            .field("nutriments", &self.nutriments)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Serialize)]
pub struct CardView {
    pub card: DisplayCard,
    pub markdown: String,
}

impl From<DisplayCard> for CardView {
    fn from(card: DisplayCard) -> Self {
        let markdown = card.to_markdown();
        CardView { card, markdown }
    }
}

#[derive(Debug, Serialize)]
pub struct SearchPage {
    pub count: u64,
    pub page: usize,
    pub total_pages: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
    pub cards: Vec<CardView>,
}
