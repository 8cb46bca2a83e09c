//! Built-in GitLab query descriptors.

use indoc::{formatdoc, indoc};
use serde_json::Value;

use crate::types::QueryDescriptor;

/// All projects visible to the token, newest first.
///
/// Project IDs grow with creation time, so `id_desc` also orders by creation date. The pager
/// relies on that order to stop at the update limit.
pub const LIST_PROJECTS_QUERY_DOCUMENT: &str = indoc! {
    r#"query listProjects($after: String, $limit: Int) {
        projects(after: $after, first: $limit, sort: "id_desc") {
            edges {
                node {
                    id
                    name
                    fullPath
                    webUrl
                    createdAt
                    description
                }
            }
            pageInfo {
                endCursor
                hasNextPage
            }
        }
    }"#
};

pub fn list_projects() -> QueryDescriptor {
    QueryDescriptor::new("projects", LIST_PROJECTS_QUERY_DOCUMENT).newest_first()
}

/// Fetch one project by its full path (e.g. `group/subgroup/project`).
pub fn fetch_project(full_path: &str) -> QueryDescriptor {
    // A JSON string literal is also a valid GraphQL string literal.
    let full_path = Value::from(full_path);
    QueryDescriptor::new(
        "project",
        formatdoc! {
            r#"query fetchProject {{
                project(fullPath: {full_path}) {{
                    id
                    name
                    fullPath
                    webUrl
                    createdAt
                    description
                }}
            }}"#,
            full_path = full_path,
        },
    )
}
