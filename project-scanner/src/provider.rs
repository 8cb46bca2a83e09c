//! Paginated project discovery and the project staleness filter.
//!
//! The [`Provider`] turns a list query descriptor into a lazy sequence of pages
//! ([`ProjectPages`]) and classifies projects against an update limit derived from the configured
//! project creation limit.

use chrono::{DateTime, Duration, Utc};
use scanner_framework::clock::{Clock, SystemClock};
use serde_json::json;

use crate::{
    config::Config,
    errors::MalformedTimestamp,
    gitlab_client::QueryClient,
    types::{ProjectNode, QueryDescriptor},
};

pub use pages::{Completion, ProjectPages};

mod pages;

/// Fetches GitLab projects through a [`QueryClient`].
pub struct Provider<C, K = SystemClock> {
    client: C,
    page_size: usize,
    /// Projects created more than this many days ago are stale. `None` or `0` disables the filter.
    creation_limit_days: Option<u32>,
    clock: K,
}

impl<C> Provider<C>
where
    C: QueryClient,
{
    pub fn new(client: C, page_size: usize, creation_limit_days: Option<u32>) -> Self {
        debug_assert_ne!(page_size, 0, "page size must be greater than 0");
        Self {
            client,
            page_size,
            creation_limit_days,
            clock: SystemClock,
        }
    }

    pub fn from_config(client: C, config: &Config) -> Self {
        Self::new(client, config.page_size, config.project_creation_limit_days)
    }
}

impl<C, K> Provider<C, K>
where
    C: QueryClient,
    K: Clock,
{
    /// Replace the clock used to compute the update limit.
    pub fn with_clock<T: Clock>(self, clock: T) -> Provider<C, T> {
        Provider {
            client: self.client,
            page_size: self.page_size,
            creation_limit_days: self.creation_limit_days,
            clock,
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Fetch a single project (no pagination).
    ///
    /// Failures are logged and reported as `None`.
    pub async fn fetch_single_project(&self, descriptor: &QueryDescriptor) -> Option<ProjectNode> {
        let root = match self.client.fetch_one(descriptor, json!({})).await {
            Ok(root) => root?,
            Err(err) => {
                tracing::warn!(instance = %descriptor.instance, error = %err, "project fetch failed");
                return None;
            }
        };

        serde_json::from_value(root)
            .map_err(|err| {
                tracing::warn!(instance = %descriptor.instance, error = %err, "invalid project");
            })
            .ok()
    }

    /// Start a fresh page sequence for the descriptor's list query.
    ///
    /// The update limit is computed now, once for the whole sequence. The sequence stops early at
    /// the update limit only when the descriptor is marked [`QueryDescriptor::newest_first`];
    /// otherwise every page is fetched.
    pub fn all_project_pages<'a>(&'a self, descriptor: &'a QueryDescriptor) -> ProjectPages<'a, C> {
        ProjectPages::new(
            &self.client,
            descriptor,
            self.page_size,
            self.compute_update_limit(),
        )
    }

    /// `now - creation limit`, or `None` when no creation limit is configured.
    pub fn compute_update_limit(&self) -> Option<DateTime<Utc>> {
        let days = self.creation_limit_days.filter(|days| *days > 0)?;
        let limit = self
            .clock
            .now()
            .checked_sub_signed(Duration::days(days.into()))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        Some(limit)
    }

    /// Scan every page and keep the projects that are not stale.
    ///
    /// Projects with a malformed creation time are logged and skipped.
    pub async fn recent_projects(
        &self,
        descriptor: &QueryDescriptor,
    ) -> (Vec<ProjectNode>, Completion) {
        let mut pages = self.all_project_pages(descriptor);
        let update_limit = pages.update_limit();

        let mut projects = Vec::new();
        while let Some(page) = pages.next_page().await {
            for project in page.edges {
                match is_stale(&project, update_limit) {
                    Ok(false) => projects.push(project),
                    Ok(true) => (),
                    Err(err) => {
                        tracing::warn!(project = %project.id, error = %err, "skipping project");
                    }
                }
            }
        }

        let completion = pages
            .completion()
            .cloned()
            .unwrap_or(Completion::Exhausted);
        (projects, completion)
    }
}

/// Parse an ISO-8601 (RFC 3339) timestamp as returned by the GitLab API.
pub fn parse_timestamp(input: &str) -> Result<DateTime<Utc>, MalformedTimestamp> {
    DateTime::parse_from_rfc3339(input)
        .map(|timestamp| timestamp.with_timezone(&Utc))
        .map_err(|source| MalformedTimestamp::Invalid {
            input: input.to_string(),
            source,
        })
}

/// The project's creation time. A `null` or missing `createdAt` is a [`MalformedTimestamp`].
pub fn creation_time(project: &ProjectNode) -> Result<DateTime<Utc>, MalformedTimestamp> {
    project
        .created_at
        .as_deref()
        .ok_or(MalformedTimestamp::Missing)
        .and_then(parse_timestamp)
}

/// Whether the project was created before the update limit.
///
/// Without a limit no project is stale.
pub fn is_stale(
    project: &ProjectNode,
    update_limit: Option<DateTime<Utc>>,
) -> Result<bool, MalformedTimestamp> {
    let Some(limit) = update_limit else {
        return Ok(false);
    };
    Ok(creation_time(project)? < limit)
}
