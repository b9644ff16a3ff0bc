//! Shared types and pagination for the YouTube API client.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context as TaskContext, Poll, ready};
use tokio_stream::Stream;

/// One page of results from a list endpoint.
#[derive(Debug)]
pub struct Page<T> {
    pub items: VecDeque<T>,
    /// The continuation token for the following page; `None` on the last page.
    pub next_page_token: Option<String>,
}

impl<T> Page<T> {
    pub fn new(items: impl Into<VecDeque<T>>, next_page_token: Option<String>) -> Self {
        Self {
            items: items.into(),
            next_page_token,
        }
    }
}

/// A page being fetched. The fetcher travels along so it can be reused for the page after.
type PendingPage<'a, F, T> = Pin<Box<dyn Future<Output = eyre::Result<(F, Page<T>)>> + Send + 'a>>;

/// A paginated stream over a YouTube API list endpoint.
///
/// Yields items one by one, and only asks for the next page (by passing the previous page's
/// `nextPageToken` back to the fetcher) once the current page is exhausted. Pagination ends when a
/// page comes back without a continuation token. An error ends the stream.
pub struct PagedStream<'a, T, F> {
    buffered: VecDeque<T>,
    /// `None` once the last page has been fetched, or a fetch has failed.
    next: Option<PendingPage<'a, F, T>>,
}

impl<'a, T, F> PagedStream<'a, T, F> {
    /// Creates a stream that starts by fetching the first page (with no page token).
    ///
    /// Nothing is fetched until the stream is first polled.
    pub fn new<Fut>(fetcher: F) -> Self
    where
        F: Fn(Option<String>) -> Fut + Send + 'a,
        Fut: Future<Output = eyre::Result<Page<T>>> + Send + 'a,
    {
        Self {
            buffered: VecDeque::new(),
            next: Some(fetch(fetcher, None)),
        }
    }
}

fn fetch<'a, F, Fut, T>(fetcher: F, page_token: Option<String>) -> PendingPage<'a, F, T>
where
    F: Fn(Option<String>) -> Fut + Send + 'a,
    Fut: Future<Output = eyre::Result<Page<T>>> + Send + 'a,
{
    Box::pin(async move {
        let page = fetcher(page_token).await?;
        Ok((fetcher, page))
    })
}

impl<'a, T: Unpin, F, Fut> Stream for PagedStream<'a, T, F>
where
    F: Fn(Option<String>) -> Fut + Send + 'a,
    Fut: Future<Output = eyre::Result<Page<T>>> + Send + 'a,
{
    type Item = eyre::Result<T>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut TaskContext<'_>) -> Poll<Option<Self::Item>> {
        loop {
            if let Some(item) = self.buffered.pop_front() {
                return Poll::Ready(Some(Ok(item)));
            }
            let Some(next) = self.next.as_mut() else {
                return Poll::Ready(None);
            };
            match ready!(next.as_mut().poll(cx)) {
                Ok((fetcher, page)) => {
                    tracing::trace!(
                        items = page.items.len(),
                        more = page.next_page_token.is_some(),
                        "fetched page"
                    );
                    self.buffered = page.items;
                    // empty pages with a continuation token do happen; keep going
                    self.next = page
                        .next_page_token
                        .map(|page_token| fetch(fetcher, Some(page_token)));
                }
                Err(e) => {
                    self.next = None;
                    return Poll::Ready(Some(Err(e)));
                }
            }
        }
    }
}

/// Paging details for lists of resources.
///
/// Includes the total number of items available and the number of resources
/// returned in a single page response.
///
/// See: <https://developers.google.com/youtube/v3/docs/pageInfo>
#[derive(Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct PageInfo {
    /// The total number of results in the result set.
    #[serde(rename = "totalResults", default)]
    pub total_results: u32,
    /// The number of results included in the API response.
    #[serde(rename = "resultsPerPage", default)]
    pub results_per_page: u32,
}
