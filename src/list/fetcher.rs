//! Page fetch contract and its HTTP implementation

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::marker::PhantomData;

use crate::api::{ApiClient, PageEnvelope, Params};
use crate::error::Result;
use crate::list::{Page, Query};

/// Arguments for a single page fetch
#[derive(Debug, Clone, Copy)]
pub struct PageRequest<'a> {
    pub query: &'a Query,
    /// `None` requests the first page
    pub cursor: Option<&'a str>,
    pub page_size: u32,
}

/// Source of pages for a [`ListController`](crate::list::ListController).
///
/// # Example
///
/// ```rust,ignore
/// struct Numbers;
///
/// #[async_trait]
/// impl PageFetcher for Numbers {
///     type Item = u32;
///
///     async fn fetch_page(&self, request: PageRequest<'_>) -> Result<Page<u32>> {
///         let start = request.cursor.map(|c| c.parse().unwrap_or(0)).unwrap_or(0);
///         let end = start + request.page_size;
///         Ok(Page::new((start..end).collect(), Some(end.to_string()), end < 100))
///     }
/// }
/// ```
#[async_trait]
pub trait PageFetcher: Send + Sync + 'static {
    type Item: Clone + Send + Sync + 'static;

    async fn fetch_page(&self, request: PageRequest<'_>) -> Result<Page<Self::Item>>;
}

/// How a paginated backend action spells its parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageEndpoint {
    pub action: String,
    /// Parameter carrying the cursor on follow-up pages
    pub cursor_param: String,
    /// Sent only together with the cursor (e.g. `direction=next`)
    pub cursor_companions: Params,
    /// Parameter carrying the search term, if the action supports search
    pub search_param: Option<String>,
    /// Parameter carrying the page size, if the action accepts one
    pub page_size_param: Option<String>,
}

impl PageEndpoint {
    pub fn new(action: impl Into<String>, cursor_param: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            cursor_param: cursor_param.into(),
            cursor_companions: Vec::new(),
            search_param: None,
            page_size_param: None,
        }
    }

    pub fn with_cursor_companion(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.cursor_companions.push((key.into(), value.into()));
        self
    }

    pub fn with_search_param(mut self, param: impl Into<String>) -> Self {
        self.search_param = Some(param.into());
        self
    }

    pub fn with_page_size_param(mut self, param: impl Into<String>) -> Self {
        self.page_size_param = Some(param.into());
        self
    }

    /// Query parameters for one request, in a stable order
    pub fn params(&self, request: &PageRequest<'_>) -> Params {
        let mut params: Params = request
            .query
            .active_filters()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        if let (Some(param), Some(term)) = (&self.search_param, request.query.search()) {
            params.push((param.clone(), term.to_string()));
        }
        if let Some(param) = &self.page_size_param {
            params.push((param.clone(), request.page_size.to_string()));
        }
        if let Some(cursor) = request.cursor {
            params.push((self.cursor_param.clone(), cursor.to_string()));
            params.extend(self.cursor_companions.iter().cloned());
        }

        params
    }
}

/// [`PageFetcher`] backed by a paginated backend action
pub struct HttpPageSource<T> {
    api: ApiClient,
    endpoint: PageEndpoint,
    _item: PhantomData<fn() -> T>,
}

impl<T> HttpPageSource<T> {
    pub fn new(api: ApiClient, endpoint: PageEndpoint) -> Self {
        Self {
            api,
            endpoint,
            _item: PhantomData,
        }
    }

    pub fn endpoint(&self) -> &PageEndpoint {
        &self.endpoint
    }
}

#[async_trait]
impl<T> PageFetcher for HttpPageSource<T>
where
    T: DeserializeOwned + Clone + Send + Sync + 'static,
{
    type Item = T;

    async fn fetch_page(&self, request: PageRequest<'_>) -> Result<Page<T>> {
        let params = self.endpoint.params(&request);
        let envelope: PageEnvelope<T> = self.api.get_action(&self.endpoint.action, &params).await?;
        envelope.into_page()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dispatch_endpoint() -> PageEndpoint {
        PageEndpoint::new("ultimos_despachos_paginados", "cursor")
            .with_cursor_companion("direction", "next")
            .with_page_size_param("limit")
    }

    #[test]
    fn test_first_page_has_no_cursor_params() {
        let query = Query::new().with_filter("cliente", "C1").with_filter("patente", "");
        let params = dispatch_endpoint().params(&PageRequest {
            query: &query,
            cursor: None,
            page_size: 10,
        });
        assert_eq!(
            params,
            vec![
                ("cliente".to_string(), "C1".to_string()),
                ("limit".to_string(), "10".to_string()),
            ]
        );
    }

    #[test]
    fn test_cursor_brings_companions() {
        let query = Query::new().with_filter("cliente", "C1");
        let params = dispatch_endpoint().params(&PageRequest {
            query: &query,
            cursor: Some("2024-05-01|88"),
            page_size: 10,
        });
        assert!(params.contains(&("cursor".to_string(), "2024-05-01|88".to_string())));
        assert!(params.contains(&("direction".to_string(), "next".to_string())));
    }

    #[test]
    fn test_search_only_when_supported() {
        let query = Query::new().with_search("  8607 ");
        let without = dispatch_endpoint().params(&PageRequest {
            query: &query,
            cursor: None,
            page_size: 10,
        });
        assert!(!without.iter().any(|(k, _)| k == "q"));

        let gps = PageEndpoint::new("ultimos_gps_paginados", "last_id").with_search_param("q");
        let with = gps.params(&PageRequest {
            query: &query,
            cursor: None,
            page_size: 10,
        });
        assert_eq!(with, vec![("q".to_string(), "8607".to_string())]);
    }
}
