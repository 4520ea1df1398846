//! Turns what the user asked for into Reddit listing calls.
//!
//! Five kinds of question ("shapes") share one listing contract: a sort
//! order, a time window, and a limit. A [`Query`] checks that the sort
//! makes sense for its shape and clamps the limit; [`dispatch()`] then picks
//! the matching [`RedditClient`] call and hands back the raw things.

use crate::reddit::RedditClient;
use crate::reddit::client;
use crate::reddit::service::Service;
use crate::reddit::thing::{Submission, Thing};
use crate::sort::Sort;
use crate::timefilter::TimeFilter;
use clap::ValueEnum;
use regex::Regex;
use reqwest::StatusCode;
use std::fmt;
use std::sync::LazyLock;
use thiserror::Error;

/// Reddit never returns more than this many things per page.
pub const MAX_LIMIT: u32 = 100;

static COMMENTS_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)/comments/([a-z0-9]+)").expect("invalid comments path regex")
});

/// Which part of a Redditor's history to list.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, ValueEnum)]
pub enum UserContent {
    /// Submitted posts.
    #[default]
    Posts,

    /// Comments.
    Comments,
}

impl fmt::Display for UserContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserContent::Posts => f.write_str("posts"),
            UserContent::Comments => f.write_str("comments"),
        }
    }
}

/// The kind of question being asked.
#[derive(Clone, Debug, PartialEq)]
pub enum Shape {
    /// A subreddit's listing.
    Feed { subreddit: String },

    /// A search, within one subreddit or across all of Reddit.
    Search {
        subreddit: Option<String>,
        query: String,
    },

    /// A Redditor's posts or comments.
    User { username: String, what: UserContent },

    /// Posts linking to a domain.
    Domain { domain: String },

    /// One post.
    SingleItem { id: String },
}

impl Shape {
    /// A subreddit feed. An `r/` or `/r/` prefix is ignored.
    pub fn feed(subreddit: &str) -> Self {
        Shape::Feed {
            subreddit: strip_subreddit_prefix(subreddit).to_string(),
        }
    }

    /// A search. `all` (or nothing) searches all of Reddit.
    pub fn search(subreddit: Option<&str>, query: impl Into<String>) -> Self {
        let subreddit = subreddit
            .map(strip_subreddit_prefix)
            .filter(|name| !name.is_empty() && !name.eq_ignore_ascii_case("all"))
            .map(String::from);
        Shape::Search {
            subreddit,
            query: query.into(),
        }
    }

    /// A Redditor's history. A `u/` or `/u/` prefix is ignored.
    pub fn user(username: &str, what: UserContent) -> Self {
        Shape::User {
            username: strip_user_prefix(username).to_string(),
            what,
        }
    }

    /// Posts linking to `domain`.
    pub fn domain(domain: &str) -> Self {
        Shape::Domain {
            domain: domain.trim().to_string(),
        }
    }

    /// A single post, given by id or by any URL containing `/comments/<id>`.
    pub fn single_item(id_or_url: &str) -> Self {
        Shape::SingleItem {
            id: extract_id(id_or_url),
        }
    }

    /// Sorts that make sense for this shape.
    pub fn sorts(&self) -> &'static [Sort] {
        match self {
            Shape::Feed { .. } | Shape::Domain { .. } => &[
                Sort::Hot,
                Sort::New,
                Sort::Rising,
                Sort::Top,
                Sort::Controversial,
            ],
            Shape::User { .. } => &[Sort::New, Sort::Hot, Sort::Top, Sort::Controversial],
            Shape::Search { .. } => &[
                Sort::Relevance,
                Sort::Hot,
                Sort::Top,
                Sort::New,
                Sort::Comments,
                Sort::Controversial,
            ],
            Shape::SingleItem { .. } => &[],
        }
    }

    /// The sort used when none is given.
    pub fn default_sort(&self) -> Option<Sort> {
        match self {
            Shape::Feed { .. } | Shape::Domain { .. } => Some(Sort::Hot),
            Shape::User { .. } => Some(Sort::New),
            Shape::Search { .. } => Some(Sort::Top),
            Shape::SingleItem { .. } => None,
        }
    }

    /// A short human-readable name for what is being fetched.
    pub fn target(&self) -> String {
        match self {
            Shape::Feed { subreddit } => format!("r/{subreddit}"),
            Shape::Search { subreddit, .. } => {
                format!("r/{}", subreddit.as_deref().unwrap_or("all"))
            }
            Shape::User { username, .. } => format!("u/{username}"),
            Shape::Domain { domain } => domain.clone(),
            Shape::SingleItem { id } => format!("post {id}"),
        }
    }

    /// The command-style name of the shape, as used in progress messages.
    pub fn name(&self) -> &'static str {
        match self {
            Shape::Feed { .. } => "feed",
            Shape::Search { .. } => "search",
            Shape::User { .. } => "user",
            Shape::Domain { .. } => "domain",
            Shape::SingleItem { .. } => "post",
        }
    }

    fn action(&self) -> &'static str {
        match self {
            Shape::Feed { .. } => "Feed fetch",
            Shape::Search { .. } => "Reddit search",
            Shape::User { .. } => "User history fetch",
            Shape::Domain { .. } => "Domain fetch",
            Shape::SingleItem { .. } => "Post fetch",
        }
    }
}

/// A validated listing request.
#[derive(Clone, Debug, PartialEq)]
pub struct Query {
    shape: Shape,
    sort: Option<Sort>,
    time_filter: TimeFilter,
    limit: u32,
}

impl Query {
    /// Validates `sort` against `shape` and clamps `limit` to `1..=100`.
    ///
    /// Without a sort, the shape's default is used.
    pub fn new(
        shape: Shape,
        sort: Option<Sort>,
        time_filter: TimeFilter,
        limit: u32,
    ) -> Result<Self, QueryError> {
        let sort = match sort {
            Some(sort) if shape.sorts().contains(&sort) => Some(sort),
            Some(sort) => {
                return Err(QueryError::InvalidSort {
                    sort,
                    shape: shape.name(),
                    valid: shape.sorts().iter().map(Sort::as_str).collect(),
                });
            }
            None => shape.default_sort(),
        };
        let limit = limit.clamp(1, MAX_LIMIT);
        Ok(Self {
            shape,
            sort,
            time_filter,
            limit,
        })
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn sort(&self) -> Option<Sort> {
        self.sort
    }

    pub fn time_filter(&self) -> TimeFilter {
        self.time_filter
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// One-line description for progress messages, such as
    /// `r/rust sort=top time=week limit=25`.
    pub fn describe(&self) -> String {
        let mut parts = vec![];
        match &self.shape {
            Shape::Search { query, .. } => {
                parts.push(format!("q={query:?}"));
                parts.push(format!("sub={}", self.shape.target()));
            }
            Shape::User { what, .. } => {
                parts.push(self.shape.target());
                parts.push(format!("what={what}"));
            }
            Shape::SingleItem { id } => parts.push(format!("id={id}")),
            _ => parts.push(self.shape.target()),
        }
        if let Some(sort) = self.sort {
            parts.push(format!("sort={sort}"));
            if sort.uses_time_filter() || matches!(self.shape, Shape::Search { .. }) {
                parts.push(format!("time={}", self.time_filter));
            }
            parts.push(format!("limit={}", self.limit));
        }
        parts.join(" ")
    }
}

/// A query that does not make sense.
#[derive(Debug, Error, PartialEq)]
pub enum QueryError {
    /// The sort is not offered for this shape.
    #[error("invalid sort '{sort}' for {shape}; choose one of: {}", .valid.join(", "))]
    InvalidSort {
        sort: Sort,
        shape: &'static str,
        valid: Vec<&'static str>,
    },
}

/// A request to Reddit did not produce anything usable.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The thing asked for does not exist.
    #[error("{target} not found.")]
    NotFound { target: String },

    /// Reddit refused access, as it does for private user histories.
    #[error("{}", forbidden_message(.target))]
    Forbidden { target: String },

    /// Anything else.
    #[error("{action} failed: {source}")]
    Failed {
        action: &'static str,
        #[source]
        source: client::Error,
    },
}

fn forbidden_message(target: &str) -> String {
    if target.starts_with("u/") {
        format!("{target} has a private history; access denied.")
    } else {
        format!("Access to {target} is forbidden.")
    }
}

impl FetchError {
    /// Sorts a client error into not-found, forbidden, or other failures.
    pub fn classify(err: client::Error, target: impl Into<String>, action: &'static str) -> Self {
        match err.status() {
            Some(StatusCode::NOT_FOUND) => FetchError::NotFound {
                target: target.into(),
            },
            Some(StatusCode::FORBIDDEN) => FetchError::Forbidden {
                target: target.into(),
            },
            _ => FetchError::Failed {
                action,
                source: err,
            },
        }
    }
}

/// Fetches the things a query asks for.
///
/// A single-item query yields the post alone; use [`fetch_submission()`]
/// to get its comments as well.
pub async fn dispatch<S: Service>(
    query: &Query,
    client: &RedditClient<S>,
) -> Result<Vec<Thing>, FetchError> {
    let shape = query.shape();
    let (time, limit) = (query.time_filter(), query.limit());
    let sort = query.sort().unwrap_or(Sort::Hot);

    let result = match shape {
        Shape::Feed { subreddit } => client.subreddit(subreddit).sorted(sort, time, limit).await,
        Shape::Domain { domain } => client.domain(domain).sorted(sort, time, limit).await,
        Shape::User { username, what } => {
            let redditor = client.redditor(username);
            let source = match what {
                UserContent::Posts => redditor.submissions(),
                UserContent::Comments => redditor.comments(),
            };
            source.sorted(sort, time, limit).await
        }
        Shape::Search { subreddit, query } => {
            let mut things = client
                .search(subreddit.as_deref(), query, sort, time, limit)
                .await;
            if let Ok(things) = &mut things {
                things.truncate(limit as usize);
            }
            things
        }
        Shape::SingleItem { id } => {
            let submission = fetch_submission(client, id).await?;
            return Ok(vec![Thing::Post(submission.post)]);
        }
    };

    result.map_err(|err| FetchError::classify(err, shape.target(), shape.action()))
}

/// Fetches a post and its comment forest.
pub async fn fetch_submission<S: Service>(
    client: &RedditClient<S>,
    id: &str,
) -> Result<Submission, FetchError> {
    let target = format!("post {id}");
    client
        .submission(id)
        .await
        .map_err(|err| FetchError::classify(err, target.clone(), "Post fetch"))?
        .ok_or(FetchError::NotFound { target })
}

/// Ways of finding subreddits.
#[derive(Clone, Debug, PartialEq)]
pub enum Discovery {
    /// The most popular subreddits.
    Popular,

    /// Subreddits whose names match a query.
    ByName(String),

    /// Subreddits whose descriptions match a query.
    ByDescription(String),
}

impl Discovery {
    /// One-line description for progress messages.
    pub fn describe(&self, limit: u32) -> String {
        match self {
            Discovery::Popular => format!("popular limit={limit}"),
            Discovery::ByName(query) => format!("q={query:?} by=name limit={limit}"),
            Discovery::ByDescription(query) => {
                format!("q={query:?} by=description limit={limit}")
            }
        }
    }
}

/// Finds subreddits. Returns at most `limit` (clamped to `1..=100`)
/// subreddits; anything else Reddit mixes in is dropped.
pub async fn discover<S: Service>(
    discovery: &Discovery,
    limit: u32,
    client: &RedditClient<S>,
) -> Result<Vec<Thing>, FetchError> {
    let limit = limit.clamp(1, MAX_LIMIT);
    let result = match discovery {
        Discovery::Popular => client.popular_subreddits(limit).await,
        Discovery::ByName(query) => client.autocomplete_subreddits(query, limit).await,
        Discovery::ByDescription(query) => client.search_subreddits(query, limit).await,
    };
    let mut things =
        result.map_err(|err| FetchError::classify(err, "subreddits", "Subreddit search"))?;
    things.retain(|thing| matches!(thing, Thing::Subreddit(_)));
    things.truncate(limit as usize);
    Ok(things)
}

/// Pulls a post id out of a URL containing `/comments/<id>`, or returns
/// the trimmed input when there is no such URL.
///
/// # Examples
///
/// ```
/// use reddit_cli::query::extract_id;
/// assert_eq!(extract_id("https://reddit.com/r/test/comments/1abc2de/title/"), "1abc2de");
/// assert_eq!(extract_id(" 1abc2de "), "1abc2de");
/// ```
pub fn extract_id(id_or_url: &str) -> String {
    COMMENTS_PATH
        .captures(id_or_url)
        .and_then(|caps| caps.get(1))
        .map(|id| id.as_str().to_string())
        .unwrap_or_else(|| id_or_url.trim().to_string())
}

fn strip_subreddit_prefix(name: &str) -> &str {
    let name = name.trim();
    let name = name.strip_prefix('/').unwrap_or(name);
    name.strip_prefix("r/")
        .or_else(|| name.strip_prefix("R/"))
        .unwrap_or(name)
}

fn strip_user_prefix(name: &str) -> &str {
    let name = name.trim();
    let name = name.strip_prefix('/').unwrap_or(name);
    name.strip_prefix("u/")
        .or_else(|| name.strip_prefix("U/"))
        .unwrap_or(name)
}
