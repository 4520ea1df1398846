// SPDX-License-Identifier: Apache-2.0
// Copyright (C) 2025 Michael Dippery <michael@monkey-robot.com>

//! Clients for reading data from the Reddit API.
//!
//! A [`RedditClient`] wraps a [`Service`] and knows which resource each
//! kind of question maps to. It does not know anything about the command
//! line; it just turns calls like `client.subreddit("rust").top(t, 25)`
//! into requests and parses the responses into [things](crate::reddit::thing).

use crate::http;
use crate::reddit::service::{RedditService, Service};
use crate::reddit::thing::{self, Account, Listing, Submission, Subreddit, Thing};
use crate::sort::Sort;
use crate::timefilter::TimeFilter;
use log::debug;
use reqwest::StatusCode;
use thiserror::Error;

/// Reads listings, posts, and subreddits from Reddit.
#[derive(Debug)]
pub struct RedditClient<S: Service = RedditService> {
    service: S,
}

impl<S: Service> RedditClient<S> {
    /// Creates a new client that fetches data using `service`.
    pub fn new(service: S) -> Self {
        Self { service }
    }

    /// The service used to fetch data.
    pub fn service(&self) -> &S {
        &self.service
    }

    /// Posts submitted to a subreddit.
    pub fn subreddit(&self, name: &str) -> ListingSource<'_, S> {
        ListingSource::path(&self.service, format!("r/{name}"))
    }

    /// A Redditor's activity.
    pub fn redditor(&self, name: &str) -> Redditor<'_, S> {
        Redditor {
            service: &self.service,
            name: name.to_string(),
        }
    }

    /// Posts linking to a domain.
    pub fn domain(&self, domain: &str) -> ListingSource<'_, S> {
        ListingSource::path(&self.service, format!("domain/{domain}"))
    }

    /// Searches posts, either site-wide or within one subreddit.
    pub async fn search(
        &self,
        subreddit: Option<&str>,
        query: &str,
        sort: Sort,
        time: TimeFilter,
        limit: u32,
    ) -> Result<Vec<Thing>, Error> {
        let mut params = vec![
            ("q", query.to_string()),
            ("sort", sort.to_string()),
            ("t", time.to_string()),
            ("limit", limit.to_string()),
        ];
        let resource = match subreddit {
            Some(subreddit) => {
                params.push(("restrict_sr", String::from("true")));
                format!("r/{subreddit}/search")
            }
            None => String::from("r/all/search"),
        };
        self.listing(&resource, &params).await
    }

    /// A post and its comment forest.
    ///
    /// Returns `None` if Reddit answers without a post.
    pub async fn submission(&self, id: &str) -> Result<Option<Submission>, Error> {
        let data = self
            .service
            .get_resource(&format!("comments/{id}"), &[])
            .await?;
        Ok(Submission::parse(&data)?)
    }

    /// Loads comments hidden behind "more" placeholders.
    ///
    /// `link` is the fullname of the post the comments belong to. At most
    /// 100 ids are sent; Reddit refuses larger requests.
    pub async fn more_children(&self, link: &str, ids: &[String]) -> Result<Vec<Thing>, Error> {
        let children = ids.iter().take(100).cloned().collect::<Vec<_>>().join(",");
        let params = [
            ("link_id", link.to_string()),
            ("children", children),
            ("api_type", String::from("json")),
        ];
        let data = self.service.get_resource("api/morechildren", &params).await?;
        Ok(thing::parse_more_children(&data)?)
    }

    /// The most popular subreddits.
    pub async fn popular_subreddits(&self, limit: u32) -> Result<Vec<Thing>, Error> {
        self.listing("subreddits/popular", &[("limit", limit.to_string())])
            .await
    }

    /// Subreddits whose descriptions match `query`.
    pub async fn search_subreddits(&self, query: &str, limit: u32) -> Result<Vec<Thing>, Error> {
        let params = [("q", query.to_string()), ("limit", limit.to_string())];
        self.listing("subreddits/search", &params).await
    }

    /// Subreddits whose names match `query`.
    pub async fn autocomplete_subreddits(
        &self,
        query: &str,
        limit: u32,
    ) -> Result<Vec<Thing>, Error> {
        let params = [
            ("query", query.to_string()),
            ("include_over_18", String::from("false")),
            ("include_profiles", String::from("false")),
            ("limit", limit.to_string()),
        ];
        self.listing("api/subreddit_autocomplete_v2", &params).await
    }

    /// Information about a single subreddit.
    pub async fn about_subreddit(&self, name: &str) -> Result<Option<Subreddit>, Error> {
        let data = self
            .service
            .get_resource(&format!("r/{name}/about"), &[])
            .await?;
        match serde_json::from_str::<Thing>(&data)? {
            Thing::Subreddit(subreddit) => Ok(Some(subreddit)),
            _ => Ok(None),
        }
    }

    /// The account the access token belongs to.
    pub async fn me(&self) -> Result<Account, Error> {
        let data = self.service.get_resource("api/v1/me", &[]).await?;
        Ok(serde_json::from_str(&data)?)
    }

    async fn listing(&self, resource: &str, params: &[(&str, String)]) -> Result<Vec<Thing>, Error> {
        let data = self.service.get_resource(resource, params).await?;
        let things = Listing::parse(&data)?;
        debug!("{resource} returned {} things", things.len());
        Ok(things)
    }
}

/// A Redditor's activity, split into posts and comments.
#[derive(Debug)]
pub struct Redditor<'a, S: Service> {
    service: &'a S,
    name: String,
}

impl<'a, S: Service> Redditor<'a, S> {
    /// Posts the Redditor has submitted.
    pub fn submissions(&self) -> ListingSource<'a, S> {
        ListingSource::query(self.service, format!("user/{}/submitted", self.name))
    }

    /// Comments the Redditor has made.
    pub fn comments(&self) -> ListingSource<'a, S> {
        ListingSource::query(self.service, format!("user/{}/comments", self.name))
    }
}

/// How a listing expects its sort order.
#[derive(Clone, Copy, Debug, PartialEq)]
enum SortStyle {
    /// As a path segment: `r/rust/top`.
    Path,

    /// As a query parameter: `user/spez/submitted?sort=top`.
    Query,
}

/// Something Reddit can list under a sort order.
#[derive(Debug)]
pub struct ListingSource<'a, S: Service> {
    service: &'a S,
    base: String,
    style: SortStyle,
}

impl<'a, S: Service> ListingSource<'a, S> {
    fn path(service: &'a S, base: String) -> Self {
        Self {
            service,
            base,
            style: SortStyle::Path,
        }
    }

    fn query(service: &'a S, base: String) -> Self {
        Self {
            service,
            base,
            style: SortStyle::Query,
        }
    }

    /// Currently popular things.
    pub async fn hot(&self, limit: u32) -> Result<Vec<Thing>, Error> {
        self.sorted(Sort::Hot, TimeFilter::default(), limit).await
    }

    /// Newest things first.
    pub async fn new(&self, limit: u32) -> Result<Vec<Thing>, Error> {
        self.sorted(Sort::New, TimeFilter::default(), limit).await
    }

    /// Things gaining popularity.
    pub async fn rising(&self, limit: u32) -> Result<Vec<Thing>, Error> {
        self.sorted(Sort::Rising, TimeFilter::default(), limit).await
    }

    /// Highest-scoring things within `time`.
    pub async fn top(&self, time: TimeFilter, limit: u32) -> Result<Vec<Thing>, Error> {
        self.sorted(Sort::Top, time, limit).await
    }

    /// Most divisive things within `time`.
    pub async fn controversial(&self, time: TimeFilter, limit: u32) -> Result<Vec<Thing>, Error> {
        self.sorted(Sort::Controversial, time, limit).await
    }

    /// Things under any sort. `time` is only sent for sorts that use it.
    pub async fn sorted(
        &self,
        sort: Sort,
        time: TimeFilter,
        limit: u32,
    ) -> Result<Vec<Thing>, Error> {
        let (resource, mut params) = match self.style {
            SortStyle::Path => (format!("{}/{sort}", self.base), vec![]),
            SortStyle::Query => (self.base.clone(), vec![("sort", sort.to_string())]),
        };
        if sort.uses_time_filter() {
            params.push(("t", time.to_string()));
        }
        params.push(("limit", limit.to_string()));

        let data = self.service.get_resource(&resource, &params).await?;
        let mut things = Listing::parse(&data)?;
        things.truncate(limit as usize);
        debug!("{resource} returned {} things", things.len());
        Ok(things)
    }
}

/// A client error.
#[derive(Debug, Error)]
pub enum Error {
    /// An error from the underlying HTTP service.
    #[error("Service error: {0}")]
    Service(#[from] http::HTTPError),

    /// An error parsing data.
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

impl Error {
    /// The HTTP status that caused the error, if any.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::Service(err) => err.status(),
            Error::Parse(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    mod listings {
        use crate::reddit::client::RedditClient;
        use crate::reddit::thing::Thing;
        use crate::test_utils::TestService;
        use crate::timefilter::TimeFilter;
        use pretty_assertions::assert_eq;

        fn client() -> RedditClient<TestService> {
            let service = TestService::new()
                .route("r/rust/hot", "listing_posts")
                .route("r/rust/top", "listing_posts")
                .route("domain/github.com/new", "listing_posts")
                .route("user/spez/submitted", "listing_posts")
                .route("user/spez/comments", "listing_comments");
            RedditClient::new(service)
        }

        #[tokio::test]
        async fn it_lists_subreddits_by_path() {
            let client = client();
            let posts = client.subreddit("rust").hot(25).await.unwrap();
            assert_eq!(posts.len(), 3);
            assert_eq!(
                client.service.requests(),
                vec![String::from("r/rust/hot?limit=25")]
            );
        }

        #[tokio::test]
        async fn it_sends_time_filters_for_top() {
            let client = client();
            client.subreddit("rust").top(TimeFilter::Month, 10).await.unwrap();
            assert_eq!(
                client.service.requests(),
                vec![String::from("r/rust/top?t=month&limit=10")]
            );
        }

        #[tokio::test]
        async fn it_lists_domains() {
            let client = client();
            client.domain("github.com").new(5).await.unwrap();
            assert_eq!(
                client.service.requests(),
                vec![String::from("domain/github.com/new?limit=5")]
            );
        }

        #[tokio::test]
        async fn it_sorts_user_history_by_parameter() {
            let client = client();
            let redditor = client.redditor("spez");
            redditor.submissions().controversial(TimeFilter::Year, 25).await.unwrap();
            let comments = redditor.comments().new(25).await.unwrap();
            assert!(comments.iter().all(|thing| matches!(thing, Thing::Comment(_))));
            assert_eq!(
                client.service.requests(),
                vec![
                    String::from("user/spez/submitted?sort=controversial&t=year&limit=25"),
                    String::from("user/spez/comments?sort=new&limit=25"),
                ]
            );
        }

        #[tokio::test]
        async fn it_truncates_to_the_limit() {
            let client = client();
            let posts = client.subreddit("rust").hot(2).await.unwrap();
            assert_eq!(posts.len(), 2);
        }
    }

    mod search {
        use crate::reddit::client::RedditClient;
        use crate::sort::Sort;
        use crate::test_utils::TestService;
        use crate::timefilter::TimeFilter;
        use pretty_assertions::assert_eq;

        #[tokio::test]
        async fn it_restricts_searches_to_a_subreddit() {
            let service = TestService::new().route("r/rust/search", "listing_posts");
            let client = RedditClient::new(service);
            client
                .search(Some("rust"), "async", Sort::Top, TimeFilter::Month, 25)
                .await
                .unwrap();
            assert_eq!(
                client.service.requests(),
                vec![String::from(
                    "r/rust/search?q=async&sort=top&t=month&limit=25&restrict_sr=true"
                )]
            );
        }

        #[tokio::test]
        async fn it_searches_everything_without_a_subreddit() {
            let service = TestService::new().route("r/all/search", "listing_posts");
            let client = RedditClient::new(service);
            client
                .search(None, "async", Sort::New, TimeFilter::All, 25)
                .await
                .unwrap();
            assert_eq!(
                client.service.requests(),
                vec![String::from("r/all/search?q=async&sort=new&t=all&limit=25")]
            );
        }
    }

    mod submissions {
        use crate::reddit::client::RedditClient;
        use crate::reddit::thing::Thing;
        use crate::test_utils::TestService;
        use reqwest::StatusCode;

        #[tokio::test]
        async fn it_fetches_a_submission() {
            let service = TestService::new().route("comments/1abc2de", "submission");
            let client = RedditClient::new(service);
            let submission = client.submission("1abc2de").await.unwrap().unwrap();
            assert_eq!(submission.post.id, "1abc2de");
        }

        #[tokio::test]
        async fn it_loads_more_children() {
            let service = TestService::new().route("api/morechildren", "morechildren");
            let client = RedditClient::new(service);
            let ids = vec![String::from("abc501"), String::from("abc601")];
            let things = client.more_children("t3_1abc2de", &ids).await.unwrap();
            assert_eq!(things.len(), 3);
            assert!(things.iter().all(|thing| matches!(thing, Thing::Comment(_))));
            assert_eq!(
                client.service.requests(),
                vec![String::from(
                    "api/morechildren?link_id=t3_1abc2de&children=abc501,abc601&api_type=json"
                )]
            );
        }

        #[tokio::test]
        async fn it_reports_http_statuses() {
            let service = TestService::new().fail("comments/zzz", StatusCode::NOT_FOUND);
            let client = RedditClient::new(service);
            let err = client.submission("zzz").await.unwrap_err();
            assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
        }

        #[tokio::test]
        async fn it_reports_parse_errors() {
            let service = TestService::new().route("comments/bad", "listing_posts");
            let client = RedditClient::new(service);
            let err = client.submission("bad").await.unwrap_err();
            assert_eq!(err.status(), None);
        }
    }

    mod subreddits {
        use crate::reddit::client::RedditClient;
        use crate::test_utils::TestService;
        use pretty_assertions::assert_eq;

        #[tokio::test]
        async fn it_lists_popular_subreddits() {
            let service = TestService::new().route("subreddits/popular", "listing_subreddits");
            let client = RedditClient::new(service);
            let things = client.popular_subreddits(10).await.unwrap();
            assert_eq!(things.len(), 2);
        }

        #[tokio::test]
        async fn it_autocompletes_names() {
            let service =
                TestService::new().route("api/subreddit_autocomplete_v2", "listing_mixed");
            let client = RedditClient::new(service);
            let things = client.autocomplete_subreddits("rust", 10).await.unwrap();
            assert_eq!(things.len(), 4);
            assert_eq!(
                client.service.requests(),
                vec![String::from(
                    "api/subreddit_autocomplete_v2?query=rust&include_over_18=false\
                     &include_profiles=false&limit=10"
                )]
            );
        }

        #[tokio::test]
        async fn it_fetches_subreddit_information() {
            let service = TestService::new().route("r/rust/about", "about_subreddit");
            let client = RedditClient::new(service);
            let subreddit = client.about_subreddit("rust").await.unwrap().unwrap();
            assert_eq!(subreddit.display_name, "rust");
        }

        #[tokio::test]
        async fn it_fetches_the_current_account() {
            let service = TestService::new().route("api/v1/me", "me");
            let client = RedditClient::new(service);
            let account = client.me().await.unwrap();
            assert_eq!(account.name, None);
        }
    }
}
