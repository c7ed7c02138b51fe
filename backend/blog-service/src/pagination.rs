//! Limit/offset windowing for list endpoints.
//!
//! Without a usable `limit` a list is returned as a bare JSON array. With one,
//! the response is wrapped in `{count, next, previous, results}` and the
//! neighbouring pages are linked by absolute URL.

use actix_web::{HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};

/// Raw query parameters. Kept as strings so malformed values fall back to
/// defaults instead of failing the request.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct PageParams {
    pub limit: Option<String>,
    pub offset: Option<String>,
}

/// Slice of a collection requested by the client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Window {
    pub limit: Option<i64>,
    pub offset: i64,
}

impl Window {
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn from_params(params: &PageParams) -> Self {
        let limit = params
            .limit
            .as_deref()
            .and_then(|v| v.trim().parse::<i64>().ok())
            .filter(|v| *v > 0);

        // offset only means something alongside a limit
        let offset = match limit {
            Some(_) => params
                .offset
                .as_deref()
                .and_then(|v| v.trim().parse::<i64>().ok())
                .filter(|v| *v >= 0)
                .unwrap_or(0),
            None => 0,
        };

        Self { limit, offset }
    }

    /// Apply the window to an in-memory, already ordered collection.
    pub fn slice<T>(&self, items: Vec<T>) -> Vec<T> {
        let offset = usize::try_from(self.offset).unwrap_or(0);
        let iter = items.into_iter().skip(offset);
        match self.limit {
            Some(limit) => iter.take(usize::try_from(limit).unwrap_or(0)).collect(),
            None => iter.collect(),
        }
    }
}

/// One window of a collection plus the size of the whole collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing<T> {
    pub items: Vec<T>,
    pub total: i64,
}

impl<T> Listing<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Listing<U> {
        Listing {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Page<T> {
    pub count: i64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

/// Render a listing as a bare array or a page envelope depending on `window`.
pub fn respond<T: Serialize>(req: &HttpRequest, window: Window, listing: Listing<T>) -> HttpResponse {
    let Some(limit) = window.limit else {
        return HttpResponse::Ok().json(listing.items);
    };

    let links = PageLinks::new(req);
    // an offset past i64::MAX has no next page
    let next = window
        .offset
        .checked_add(limit)
        .filter(|next| *next < listing.total)
        .map(|next| links.url(limit, Some(next)));
    let previous = (window.offset > 0).then(|| {
        let prev = window.offset.saturating_sub(limit);
        if prev > 0 {
            links.url(limit, Some(prev))
        } else {
            links.url(limit, None)
        }
    });

    HttpResponse::Ok().json(Page {
        count: listing.total,
        next,
        previous,
        results: listing.items,
    })
}

/// Absolute URL of the current request with its other query parameters
/// preserved verbatim.
struct PageLinks {
    base: String,
    retained: Vec<String>,
}

impl PageLinks {
    fn new(req: &HttpRequest) -> Self {
        let info = req.connection_info();
        let base = format!("{}://{}{}", info.scheme(), info.host(), req.path());
        let retained = req
            .query_string()
            .split('&')
            .filter(|pair| !pair.is_empty())
            .filter(|pair| {
                let key = pair.split('=').next().unwrap_or_default();
                key != "limit" && key != "offset"
            })
            .map(str::to_string)
            .collect();
        Self { base, retained }
    }

    fn url(&self, limit: i64, offset: Option<i64>) -> String {
        let mut pairs = self.retained.clone();
        pairs.push(format!("limit={}", limit));
        if let Some(offset) = offset {
            pairs.push(format!("offset={}", offset));
        }
        format!("{}?{}", self.base, pairs.join("&"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;
    use actix_web::test::TestRequest;

    fn params(limit: Option<&str>, offset: Option<&str>) -> PageParams {
        PageParams {
            limit: limit.map(str::to_string),
            offset: offset.map(str::to_string),
        }
    }

    #[test]
    fn missing_or_bad_limit_means_unpaginated() {
        assert_eq!(Window::from_params(&params(None, Some("5"))), Window::unbounded());
        assert_eq!(Window::from_params(&params(Some("abc"), None)), Window::unbounded());
        assert_eq!(Window::from_params(&params(Some("0"), None)), Window::unbounded());
        assert_eq!(Window::from_params(&params(Some("-3"), None)), Window::unbounded());
    }

    #[test]
    fn bad_offset_falls_back_to_zero() {
        let w = Window::from_params(&params(Some("2"), Some("-1")));
        assert_eq!(w, Window { limit: Some(2), offset: 0 });
        let w = Window::from_params(&params(Some("2"), Some("x")));
        assert_eq!(w, Window { limit: Some(2), offset: 0 });
    }

    #[test]
    fn slice_applies_offset_and_limit() {
        let w = Window { limit: Some(2), offset: 1 };
        assert_eq!(w.slice(vec![1, 2, 3, 4]), vec![2, 3]);
        let w = Window { limit: None, offset: 0 };
        assert_eq!(w.slice(vec![1, 2]), vec![1, 2]);
        let w = Window { limit: Some(2), offset: 10 };
        assert!(w.slice(vec![1, 2]).is_empty());
    }

    #[actix_web::test]
    async fn envelope_links_neighbours() {
        let req = TestRequest::get()
            .uri("/api/v1/posts/?group=3&limit=2&offset=2")
            .insert_header(("Host", "blog.test"))
            .to_http_request();
        let window = Window { limit: Some(2), offset: 2 };
        let listing = Listing { items: vec![3, 4], total: 5 };

        let resp = respond(&req, window, listing);
        let body = to_bytes(resp.into_body()).await.unwrap();
        let page: Page<i32> = serde_json::from_slice(&body).unwrap();

        assert_eq!(page.count, 5);
        assert_eq!(page.results, vec![3, 4]);
        assert_eq!(
            page.next.as_deref(),
            Some("http://blog.test/api/v1/posts/?group=3&limit=2&offset=4")
        );
        assert_eq!(
            page.previous.as_deref(),
            Some("http://blog.test/api/v1/posts/?group=3&limit=2")
        );
    }

    #[actix_web::test]
    async fn last_page_has_no_next() {
        let req = TestRequest::get()
            .uri("/api/v1/groups/?limit=10")
            .insert_header(("Host", "blog.test"))
            .to_http_request();
        let window = Window { limit: Some(10), offset: 0 };
        let listing = Listing { items: vec![1], total: 1 };

        let resp = respond(&req, window, listing);
        let body = to_bytes(resp.into_body()).await.unwrap();
        let page: Page<i32> = serde_json::from_slice(&body).unwrap();
        assert!(page.next.is_none());
        assert!(page.previous.is_none());
    }

    #[actix_web::test]
    async fn huge_limit_does_not_overflow() {
        let req = TestRequest::get()
            .uri("/api/v1/groups/?limit=9223372036854775807&offset=1")
            .insert_header(("Host", "blog.test"))
            .to_http_request();
        let window = Window::from_params(&params(Some("9223372036854775807"), Some("1")));
        assert_eq!(window, Window { limit: Some(i64::MAX), offset: 1 });
        let listing = Listing { items: vec![2, 3], total: 3 };

        let resp = respond(&req, window, listing);
        let body = to_bytes(resp.into_body()).await.unwrap();
        let page: Page<i32> = serde_json::from_slice(&body).unwrap();
        assert!(page.next.is_none());
        assert_eq!(
            page.previous.as_deref(),
            Some("http://blog.test/api/v1/groups/?limit=9223372036854775807")
        );
    }

    #[actix_web::test]
    async fn unbounded_window_renders_array() {
        let req = TestRequest::get().uri("/api/v1/groups/").to_http_request();
        let listing = Listing { items: vec![1, 2], total: 2 };

        let resp = respond(&req, Window::unbounded(), listing);
        let body = to_bytes(resp.into_body()).await.unwrap();
        let items: Vec<i32> = serde_json::from_slice(&body).unwrap();
        assert_eq!(items, vec![1, 2]);
    }
}
