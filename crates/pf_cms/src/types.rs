use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Eyecatch {
    pub url: String,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// One blog entry. The timestamp fields are the API's system fields and are
/// kept as the ISO-8601 strings it sends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPost {
    pub id: String,
    pub created_at: String,
    pub updated_at: String,
    #[serde(default)]
    pub published_at: Option<String>,
    #[serde(default)]
    pub revised_at: Option<String>,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub eyecatch: Option<Eyecatch>,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostList {
    pub contents: Vec<BlogPost>,
    pub total_count: u32,
    pub offset: u32,
    pub limit: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationInfo {
    pub current_page: u32,
    pub total_pages: u32,
    pub total_count: u32,
    pub has_next: bool,
    pub has_prev: bool,
}

impl PaginationInfo {
    /// Derive page numbers from a list window. Pages are one-based and a
    /// zero limit is treated as a single page holding everything.
    pub fn from_list(list: &PostList) -> Self {
        if list.limit == 0 {
            return Self {
                current_page: 1,
                total_pages: 1,
                total_count: list.total_count,
                has_next: false,
                has_prev: false,
            };
        }
        let current_page = list.offset / list.limit + 1;
        let total_pages = list.total_count.div_ceil(list.limit).max(1);
        Self {
            current_page,
            total_pages,
            total_count: list.total_count,
            has_next: current_page < total_pages,
            has_prev: current_page > 1,
        }
    }
}
