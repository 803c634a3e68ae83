//! Pagination link construction from handler-returned page cursors.

use crate::document::Links;
use crate::handler::{PageData, PageStyle};

/// Scope a pagination link either to a collection or to a relationship
/// sub-path on a parent resource.
#[derive(Clone, Debug)]
pub struct PaginationScope<'a> {
    pub prefix: &'a str,
    pub kind: &'a str,
    /// `(parent type, parent id, relation)` for relationship-scoped links.
    pub relationship: Option<(&'a str, &'a str, &'a str)>,
    pub style: PageStyle,
    pub limit: u64,
}

/// Build `prev`/`next` links of the exact form
/// `{prefix}/{type}?page[{style}]={value}&page[limit]={limit}`.
pub fn pagination_links(page: Option<&PageData>, scope: &PaginationScope<'_>) -> Links {
    let mut links = Links::new();
    let page = match page {
        Some(page) => page,
        None => return links,
    };
    let collection = match scope.relationship {
        Some((parent_kind, parent_id, relation)) => format!(
            "{}/{}/{}/relationships/{}",
            scope.prefix, parent_kind, parent_id, relation
        ),
        None => format!("{}/{}", scope.prefix, scope.kind),
    };
    if let Some(prev) = &page.prev {
        links.insert(
            "prev".to_string(),
            format!(
                "{}?page[{}]={}&page[limit]={}",
                collection, scope.style, prev, scope.limit
            ),
        );
    }
    if let Some(next) = &page.next {
        links.insert(
            "next".to_string(),
            format!(
                "{}?page[{}]={}&page[limit]={}",
                collection, scope.style, next, scope.limit
            ),
        );
    }
    links
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_links_are_deterministic() {
        let page = PageData {
            prev: None,
            next: Some("1".to_string()),
        };
        let links = pagination_links(
            Some(&page),
            &PaginationScope {
                prefix: "",
                kind: "people",
                relationship: None,
                style: PageStyle::Offset,
                limit: 1,
            },
        );
        assert_eq!(
            links.get("next").map(String::as_str),
            Some("/people?page[offset]=1&page[limit]=1")
        );
        assert!(!links.contains_key("prev"));
    }

    #[test]
    fn relationship_scope_uses_the_relationships_sub_path() {
        let page = PageData {
            prev: Some("0".to_string()),
            next: None,
        };
        let links = pagination_links(
            Some(&page),
            &PaginationScope {
                prefix: "/api",
                kind: "comments",
                relationship: Some(("articles", "1", "comments")),
                style: PageStyle::Cursor,
                limit: 10,
            },
        );
        assert_eq!(
            links.get("prev").map(String::as_str),
            Some("/api/articles/1/relationships/comments?page[cursor]=0&page[limit]=10")
        );
    }

    #[test]
    fn no_page_data_yields_no_links() {
        let links = pagination_links(
            None,
            &PaginationScope {
                prefix: "",
                kind: "people",
                relationship: None,
                style: PageStyle::Offset,
                limit: 1,
            },
        );
        assert!(links.is_empty());
    }
}
