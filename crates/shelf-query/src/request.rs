use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::filter::FilterValue;
use crate::sort::Sort;

/// A normalized list request. Only constraints that are actually set appear.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListRequest {
    pub search: Option<String>,
    #[serde(default)]
    pub filters: BTreeMap<String, FilterValue>,
    pub sort: Sort,
    pub page_number: u32,
    pub page_size: u32,
}

impl ListRequest {
    /// Flatten into query-string pairs. Each screen names its free-text
    /// parameter differently (`search`, `name`, `fullName`, ...).
    pub fn query_pairs(&self, search_param: &str) -> Vec<(String, String)> {
        let mut pairs = Vec::with_capacity(self.filters.len() + 5);
        if let Some(search) = &self.search {
            pairs.push((search_param.to_string(), search.clone()));
        }
        for (key, value) in &self.filters {
            if !value.is_unset() {
                pairs.push((key.clone(), value.to_param()));
            }
        }
        pairs.push(("sortBy".into(), self.sort.key.clone()));
        pairs.push((
            "isAscending".into(),
            self.sort.direction.is_ascending().to_string(),
        ));
        pairs.push(("pageNumber".into(), self.page_number.to_string()));
        pairs.push(("pageSize".into(), self.page_size.to_string()));
        pairs
    }

    pub fn param<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
        pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}
