use std::collections::HashSet;

use chrono::{DateTime, Utc};
use futures::Stream;
use serde_json::json;

use super::creation_time;
use crate::{
    errors::TransportFailure,
    gitlab_client::QueryClient,
    types::{Page, QueryDescriptor},
};

/// How a page sequence ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Completion {
    /// The server reported there are no further pages.
    Exhausted,
    /// A page contained a project created before the update limit. Only reported for descriptors
    /// ordered newest first, where no later page can hold a recent project.
    ReachedUpdateLimit,
    /// The server handed back a cursor that was already consumed.
    CursorRepeated(String),
    /// A page fetch failed. Pages after the failure point were never fetched.
    Truncated(TransportFailure),
}

impl Completion {
    /// Whether every relevant page was fetched.
    pub fn is_complete(&self) -> bool {
        matches!(self, Completion::Exhausted | Completion::ReachedUpdateLimit)
    }
}

#[derive(Debug)]
enum State {
    /// No page has been requested yet.
    Start,
    /// A page was handed out; the next pull fetches from `cursor`.
    Yielded { cursor: String },
    /// Terminal. No further fetches happen.
    Done(Completion),
}

/// A lazy, forward-only sequence of pages for one query descriptor.
///
/// Each call to [`ProjectPages::next_page`] performs at most one round-trip. The sequence owns
/// its cursor state; once it is done it stays done.
pub struct ProjectPages<'a, C> {
    client: &'a C,
    descriptor: &'a QueryDescriptor,
    page_size: usize,
    update_limit: Option<DateTime<Utc>>,
    consumed_cursors: HashSet<String>,
    state: State,
}

impl<'a, C> ProjectPages<'a, C>
where
    C: QueryClient,
{
    pub(super) fn new(
        client: &'a C,
        descriptor: &'a QueryDescriptor,
        page_size: usize,
        update_limit: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            client,
            descriptor,
            page_size,
            update_limit,
            consumed_cursors: HashSet::new(),
            state: State::Start,
        }
    }

    /// The update limit this sequence was created with.
    pub fn update_limit(&self) -> Option<DateTime<Utc>> {
        self.update_limit
    }

    /// How the sequence ended, or `None` while pages may still follow.
    pub fn completion(&self) -> Option<&Completion> {
        match &self.state {
            State::Done(completion) => Some(completion),
            _ => None,
        }
    }

    /// Fetch the next page.
    ///
    /// Returns `None` once the sequence is done. A failed fetch also ends the sequence; use
    /// [`ProjectPages::completion`] to tell a truncated scan from a finished one.
    pub async fn next_page(&mut self) -> Option<Page> {
        let cursor = match &self.state {
            State::Start => None,
            State::Yielded { cursor } => Some(cursor.clone()),
            State::Done(_) => return None,
        };

        tracing::trace!(
            instance = %self.descriptor.instance,
            after = %cursor.as_deref().unwrap_or("none"),
            "sending page query request"
        );

        let variables = json!({ "after": cursor, "limit": self.page_size });
        if let Some(cursor) = cursor {
            self.consumed_cursors.insert(cursor);
        }

        let page = match self.client.fetch_page(self.descriptor, variables).await {
            Ok(page) => page,
            Err(err) => {
                tracing::warn!(
                    instance = %self.descriptor.instance,
                    error = %err,
                    "page fetch failed, ending scan"
                );
                self.state = State::Done(Completion::Truncated(err));
                return None;
            }
        };

        tracing::trace!(
            instance = %self.descriptor.instance,
            page_items_count = page.edges.len(),
            end_cursor = %page.end_cursor.as_deref().unwrap_or("none"),
            has_next_page = page.has_next_page,
            "received page query response"
        );

        self.state = self.state_after(&page);
        Some(page)
    }

    /// Adapt the sequence into a [`Stream`] of pages.
    pub fn into_stream(self) -> impl Stream<Item = Page> + 'a
    where
        C: 'a,
    {
        futures::stream::unfold(self, |mut pages| async move {
            let page = pages.next_page().await?;
            Some((page, pages))
        })
    }

    fn state_after(&self, page: &Page) -> State {
        let cursor = match (&page.end_cursor, page.has_next_page) {
            (Some(cursor), true) => cursor,
            _ => return State::Done(Completion::Exhausted),
        };

        if self.consumed_cursors.contains(cursor) {
            tracing::warn!(
                instance = %self.descriptor.instance,
                cursor = %cursor,
                "server returned an already consumed cursor"
            );
            return State::Done(Completion::CursorRepeated(cursor.clone()));
        }

        if self.reaches_update_limit(page) {
            tracing::debug!(
                instance = %self.descriptor.instance,
                "page reached the update limit"
            );
            return State::Done(Completion::ReachedUpdateLimit);
        }

        State::Yielded {
            cursor: cursor.clone(),
        }
    }

    fn reaches_update_limit(&self, page: &Page) -> bool {
        if !self.descriptor.newest_first {
            return false;
        }
        let Some(limit) = self.update_limit else {
            return false;
        };

        page.edges
            .iter()
            .any(|project| match creation_time(project) {
                Ok(created_at) => created_at < limit,
                Err(err) => {
                    tracing::debug!(project = %project.id, error = %err);
                    false
                }
            })
    }
}
