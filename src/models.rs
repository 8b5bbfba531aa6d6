use serde::Serialize;

use crate::entities::movie;

/// Response envelope for `GET /movies`.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoviePage {
    pub prev_page: Option<String>,
    pub next_page: Option<String>,
    /// Rows on this page, not in the table.
    pub count: usize,
    pub data: Vec<movie::Model>,
}
