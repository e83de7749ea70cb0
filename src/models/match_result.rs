use serde::{Deserialize, Serialize};

use super::catalog::CatalogEntry;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub candidate: CatalogEntry,
    pub confidence: f64,
    pub is_auto_add_candidate: bool,
    pub requires_user_selection: bool,
}
