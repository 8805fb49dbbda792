//! Paged listings
//!
//! ARM list endpoints answer with `{"value": [...], "nextLink": "..."}`; a few
//! (VM image listings) answer with a bare JSON array. [`Pager`] walks the
//! `nextLink` chain lazily. Any failing page ends the walk with that error.

use futures::Stream;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::client::{ArmClient, OperationSpec};
use crate::error::{CoreError, Result};

/// One page of a listing
#[derive(Debug, Clone, Default)]
pub struct Page {
    pub items: Vec<Value>,
    pub next_link: Option<String>,
}

impl Page {
    /// Split a list response into items and the continuation link
    pub fn from_body(body: Option<Value>) -> Result<Self> {
        match body {
            None => Ok(Page::default()),
            Some(Value::Array(items)) => Ok(Page {
                items,
                next_link: None,
            }),
            Some(Value::Object(mut map)) => {
                let items = match map.remove("value") {
                    Some(Value::Array(items)) => items,
                    Some(Value::Null) | None => Vec::new(),
                    Some(other) => {
                        return Err(CoreError::InvalidResponse(format!(
                            "list 'value' is not an array: {}",
                            other
                        )));
                    }
                };
                let next_link = map
                    .remove("nextLink")
                    .and_then(|v| v.as_str().map(str::to_string))
                    .filter(|link| !link.is_empty());
                Ok(Page { items, next_link })
            }
            Some(other) => Err(CoreError::InvalidResponse(format!(
                "unexpected list response: {}",
                other
            ))),
        }
    }
}

enum Cursor {
    First(OperationSpec),
    Next(Url),
    Exhausted,
}

/// Lazy sequence of pages
pub struct Pager {
    client: ArmClient,
    cursor: Cursor,
    pages: usize,
}

impl Pager {
    pub fn new(client: ArmClient, spec: OperationSpec) -> Self {
        Self {
            client,
            cursor: Cursor::First(spec),
            pages: 0,
        }
    }

    /// Fetch the next page, or `None` once the listing is exhausted
    pub async fn next_page(&mut self) -> Result<Option<Page>> {
        let response = match std::mem::replace(&mut self.cursor, Cursor::Exhausted) {
            Cursor::Exhausted => return Ok(None),
            Cursor::First(spec) => self.client.send(&spec).await?,
            Cursor::Next(url) => self.client.get_url(url).await?,
        };

        let page = Page::from_body(response.body)?;
        self.pages += 1;
        debug!(
            page = self.pages,
            items = page.items.len(),
            more = page.next_link.is_some(),
            "Fetched list page"
        );

        if let Some(link) = &page.next_link {
            self.cursor = Cursor::Next(Url::parse(link)?);
        }
        Ok(Some(page))
    }

    /// Walk every page and return all items in order
    pub async fn collect_all(mut self) -> Result<Vec<Value>> {
        let mut items = Vec::new();
        while let Some(page) = self.next_page().await? {
            items.extend(page.items);
        }
        Ok(items)
    }

    /// The pages as a stream; ends after the first error
    pub fn into_stream(self) -> impl Stream<Item = Result<Page>> {
        futures::stream::try_unfold(self, |mut pager| async move {
            Ok(pager.next_page().await?.map(|page| (page, pager)))
        })
    }
}
