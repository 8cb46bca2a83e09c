//! Query descriptors and the page shapes returned by GitLab's GraphQL connections.
//!
//! Only the fields the scanner inspects are typed. Everything else in a project node is passed
//! through untouched in [`ProjectNode::fields`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Which query to send and which root field of the response holds its result.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct QueryDescriptor {
    /// Name of the root field expected in the response data (e.g. `projects`).
    pub instance: String,
    /// GraphQL document text.
    pub body: String,
    /// The query returns projects ordered by creation date, newest first. Only then may a page
    /// sequence stop early at the update limit.
    #[serde(default)]
    pub newest_first: bool,
}

impl QueryDescriptor {
    pub fn new(instance: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            instance: instance.into(),
            body: body.into(),
            newest_first: false,
        }
    }

    /// Mark the query as ordered newest first.
    pub fn newest_first(mut self) -> Self {
        self.newest_first = true;
        self
    }
}

/// A GitLab project as returned inside a connection edge.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectNode {
    /// Global ID, e.g. `gid://gitlab/Project/42`.
    pub id: String,
    /// Raw ISO-8601 creation time. Parsed on demand so a bad or missing value only affects this
    /// project.
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// One batch of projects plus the continuation metadata.
#[derive(Clone, Debug, PartialEq)]
pub struct Page {
    pub edges: Vec<ProjectNode>,
    pub end_cursor: Option<String>,
    pub has_next_page: bool,
}

/// Relay-style connection, as found under the descriptor's instance field.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Connection {
    /// Edges are kept raw and decoded one by one so a single malformed edge does not fail the
    /// whole page.
    #[serde(default)]
    pub edges: Vec<Value>,
    pub page_info: PageInfo,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PageInfo {
    pub end_cursor: Option<String>,
    pub has_next_page: bool,
}

impl From<Connection> for Page {
    fn from(connection: Connection) -> Self {
        Self {
            edges: connection
                .edges
                .into_iter()
                .filter_map(|mut edge| {
                    let node = edge.get_mut("node").map(Value::take).unwrap_or_default();
                    match serde_json::from_value::<ProjectNode>(node) {
                        Ok(project) => Some(project),
                        Err(err) => {
                            tracing::warn!(error = %err, "skipping undecodable project node");
                            None
                        }
                    }
                })
                .collect(),
            end_cursor: connection.page_info.end_cursor,
            has_next_page: connection.page_info.has_next_page,
        }
    }
}
