// SPDX-License-Identifier: Apache-2.0
// Copyright (C) 2025 Michael Dippery <michael@monkey-robot.com>

//! Normalized records, independent of any output format.
//!
//! Raw [things](crate::reddit::thing) carry whatever Reddit sent. Records
//! carry exactly what the tool prints: decoded text, absolute URLs, UTC
//! dates, and `None` where an author is gone. Records serialize to the
//! same JSON field names they deserialize from, so JSON output can be read
//! back into equal records.

use crate::clock::HasDate;
use crate::reddit::thing::{Comment, Post, Subreddit, Thing};
use crate::text::convert_html_entities;
use serde::{Deserialize, Serialize};

/// Prefix for permalinks, which Reddit reports as paths.
pub const REDDIT_URL: &str = "https://www.reddit.com";

/// A post.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct PostRecord {
    pub id: String,
    pub title: String,

    /// Absolute URL of the post's comments page.
    pub url: String,

    pub subreddit: String,
    pub score: i64,
    pub num_comments: u64,

    /// `None` for deleted accounts.
    pub author: Option<String>,

    /// `YYYY-MM-DD`, UTC.
    #[serde(rename = "date")]
    pub created_date: String,

    pub upvote_ratio: f64,

    /// Only present for single posts and enriched search results.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selftext: Option<String>,

    /// Only present for enriched search results.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<Vec<CommentRecord>>,
}

impl PostRecord {
    /// Adds the post's body.
    pub fn with_selftext(mut self, post: &Post) -> Self {
        let selftext = post.selftext.as_deref().unwrap_or_default();
        self.selftext = Some(convert_html_entities(selftext));
        self
    }

    /// Adds a selection of the post's comments.
    pub fn with_comments(mut self, comments: Vec<CommentRecord>) -> Self {
        self.comments = Some(comments);
        self
    }

    /// The upvote ratio as a whole percentage, rounded down.
    pub fn upvote_percent(&self) -> u32 {
        (self.upvote_ratio * 100.0).clamp(0.0, 100.0) as u32
    }
}

impl From<&Post> for PostRecord {
    fn from(post: &Post) -> Self {
        Self {
            id: post.id.clone(),
            title: convert_html_entities(&post.title),
            url: absolute_url(&post.permalink),
            subreddit: post.subreddit.clone(),
            score: post.score,
            num_comments: post.num_comments,
            author: author(post.author.as_deref()),
            created_date: post.created_date(),
            upvote_ratio: post.upvote_ratio,
            selftext: None,
            comments: None,
        }
    }
}

/// A comment.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct CommentRecord {
    pub id: String,

    /// `None` for deleted accounts.
    pub author: Option<String>,

    pub score: i64,

    /// `YYYY-MM-DD`, UTC.
    #[serde(rename = "date")]
    pub created_date: String,

    pub body: String,

    /// Nesting depth below the point where collection started.
    pub depth: usize,
}

impl CommentRecord {
    /// Normalizes a comment found `depth` levels below the collection root.
    ///
    /// Returns `None` if the comment's body is unavailable.
    pub fn from_raw(comment: &Comment, depth: usize) -> Option<Self> {
        let body = comment.body.as_deref()?;
        Some(Self {
            id: comment.id.clone(),
            author: author(comment.author.as_deref()),
            score: comment.score,
            created_date: comment.created_date(),
            body: convert_html_entities(body),
            depth,
        })
    }
}

/// A subreddit.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct SubredditRecord {
    pub name: String,

    /// Absolute URL of the subreddit.
    pub url: String,

    #[serde(rename = "subscribers")]
    pub subscriber_count: Option<u64>,

    #[serde(rename = "public_description")]
    pub description: String,

    /// `YYYY-MM-DD`, UTC.
    #[serde(rename = "created_utc")]
    pub created_date: String,
}

impl From<&Subreddit> for SubredditRecord {
    fn from(subreddit: &Subreddit) -> Self {
        Self {
            name: subreddit.display_name.clone(),
            url: absolute_url(&subreddit.url),
            subscriber_count: subreddit.subscribers,
            description: convert_html_entities(
                subreddit.public_description.as_deref().unwrap_or_default(),
            ),
            created_date: subreddit.created_date(),
        }
    }
}

/// Any normalized record.
#[derive(Clone, Debug, PartialEq)]
pub enum Record {
    Post(PostRecord),
    Comment(CommentRecord),
    Subreddit(SubredditRecord),
}

impl Thing {
    /// Normalizes this thing, treating it as `depth` levels deep.
    ///
    /// Placeholders, unknown kinds, and comments without a body have no
    /// record.
    pub fn to_record(&self, depth: usize) -> Option<Record> {
        match self {
            Thing::Post(post) => Some(Record::Post(post.into())),
            Thing::Comment(comment) => CommentRecord::from_raw(comment, depth).map(Record::Comment),
            Thing::Subreddit(subreddit) => Some(Record::Subreddit(subreddit.into())),
            Thing::More(_) | Thing::Unknown(_) => None,
        }
    }
}

/// A batch of records of one kind, ready to render.
#[derive(Clone, Debug, PartialEq)]
pub enum Records {
    /// Posts from a listing or search.
    Posts(Vec<PostRecord>),

    /// A single post, shown in detail.
    Post(Box<PostRecord>),

    Comments(Vec<CommentRecord>),
    Subreddits(Vec<SubredditRecord>),
}

impl Records {
    /// Collects the posts among `things`, skipping anything else.
    pub fn posts<'a>(things: impl IntoIterator<Item = &'a Thing>) -> Self {
        Records::Posts(
            things
                .into_iter()
                .filter_map(|thing| match thing.to_record(0) {
                    Some(Record::Post(post)) => Some(post),
                    _ => None,
                })
                .collect(),
        )
    }

    /// Collects the comments among `things`, all at depth 0.
    pub fn comments<'a>(things: impl IntoIterator<Item = &'a Thing>) -> Self {
        Records::Comments(
            things
                .into_iter()
                .filter_map(|thing| match thing.to_record(0) {
                    Some(Record::Comment(comment)) => Some(comment),
                    _ => None,
                })
                .collect(),
        )
    }

    /// Collects the subreddits among `things`.
    pub fn subreddits<'a>(things: impl IntoIterator<Item = &'a Thing>) -> Self {
        Records::Subreddits(
            things
                .into_iter()
                .filter_map(|thing| match thing.to_record(0) {
                    Some(Record::Subreddit(subreddit)) => Some(subreddit),
                    _ => None,
                })
                .collect(),
        )
    }

    /// The key naming these records in JSON output.
    pub fn kind(&self) -> &'static str {
        match self {
            Records::Posts(_) | Records::Post(_) => "items",
            Records::Comments(_) => "comments",
            Records::Subreddits(_) => "subreddits",
        }
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        match self {
            Records::Posts(posts) => posts.len(),
            Records::Post(_) => 1,
            Records::Comments(comments) => comments.len(),
            Records::Subreddits(subreddits) => subreddits.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn author(name: Option<&str>) -> Option<String> {
    name.filter(|name| !name.is_empty() && *name != "[deleted]")
        .map(String::from)
}

fn absolute_url(path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        path.to_string()
    } else {
        format!("{REDDIT_URL}{path}")
    }
}

#[cfg(test)]
mod tests {
    mod posts {
        use crate::record::*;
        use crate::reddit::thing::Listing;
        use crate::test_utils::load_data;
        use pretty_assertions::assert_eq;

        fn posts() -> Vec<PostRecord> {
            let things = Listing::parse(&load_data("listing_posts")).unwrap();
            let Records::Posts(posts) = Records::posts(&things) else {
                panic!("expected posts");
            };
            posts
        }

        #[test]
        fn it_normalizes_posts() {
            let post = &posts()[0];
            assert_eq!(post.id, "1abc2de");
            assert_eq!(post.title, "Announcing Rust 1.88.0 & friends");
            assert_eq!(
                post.url,
                "https://www.reddit.com/r/rust/comments/1abc2de/announcing_rust_1880/"
            );
            assert_eq!(post.author.as_deref(), Some("steveklabnik1"));
            assert_eq!(post.created_date, "2025-06-26");
            assert_eq!(post.upvote_percent(), 98);
            assert_eq!(post.selftext, None);
            assert_eq!(post.comments, None);
        }

        #[test]
        fn it_drops_deleted_authors() {
            assert_eq!(posts()[2].author, None);
        }

        #[test]
        fn it_truncates_upvote_percentages() {
            let mut post = posts().remove(0);
            post.upvote_ratio = 0.999;
            assert_eq!(post.upvote_percent(), 99);
        }

        #[test]
        fn it_omits_absent_selftext_from_json() {
            let json = serde_json::to_value(&posts()[0]).unwrap();
            let keys: Vec<_> = json.as_object().unwrap().keys().cloned().collect();
            assert!(keys.contains(&String::from("date")));
            assert!(!keys.contains(&String::from("selftext")));
            assert!(!keys.contains(&String::from("comments")));
        }

        #[test]
        fn it_round_trips_enriched_posts_through_json() {
            let comment = CommentRecord {
                id: String::from("abc401"),
                author: None,
                score: 42,
                created_date: String::from("2025-06-26"),
                body: String::from("a < b & c"),
                depth: 0,
            };
            let post = posts()
                .remove(0)
                .with_comments(vec![comment])
                .with_selftext(&Default::default());
            assert_eq!(post.selftext.as_deref(), Some(""));

            let json = serde_json::to_string(&post).unwrap();
            let parsed: PostRecord = serde_json::from_str(&json).unwrap();
            assert_eq!(parsed, post);
        }
    }

    mod comments {
        use crate::record::*;
        use crate::reddit::thing::Comment;
        use pretty_assertions::assert_eq;

        #[test]
        fn it_normalizes_comments() {
            let comment = Comment {
                id: String::from("abc101"),
                author: Some(String::from("alice")),
                score: 15,
                created_utc: 1_750_939_200.0,
                body: Some(String::from("Fish &amp; chips")),
                ..Default::default()
            };
            let record = CommentRecord::from_raw(&comment, 2).unwrap();
            assert_eq!(record.body, "Fish & chips");
            assert_eq!(record.depth, 2);
            assert_eq!(record.created_date, "2025-06-26");
        }

        #[test]
        fn it_skips_comments_without_bodies() {
            let comment = Comment {
                id: String::from("abc102"),
                ..Default::default()
            };
            assert_eq!(CommentRecord::from_raw(&comment, 0), None);
            assert_eq!(Thing::Comment(comment).to_record(0), None);
        }

        #[test]
        fn it_never_makes_records_for_placeholders() {
            assert_eq!(Thing::More(Default::default()).to_record(0), None);
            assert_eq!(Thing::Unknown(String::from("t2")).to_record(0), None);
        }

        #[test]
        fn it_round_trips_through_json() {
            let record = CommentRecord {
                id: String::from("abc101"),
                author: Some(String::from("alice")),
                score: -3,
                created_date: String::from("1970-01-01"),
                body: String::from("line one\nline \"two\""),
                depth: 1,
            };
            let json = serde_json::to_string(&record).unwrap();
            assert!(json.contains(r#""date":"1970-01-01""#));
            let parsed: CommentRecord = serde_json::from_str(&json).unwrap();
            assert_eq!(parsed, record);
        }
    }

    mod subreddits {
        use crate::record::*;
        use crate::reddit::thing::Listing;
        use crate::test_utils::load_data;
        use pretty_assertions::assert_eq;

        #[test]
        fn it_normalizes_subreddits() {
            let things = Listing::parse(&load_data("listing_subreddits")).unwrap();
            let Records::Subreddits(subreddits) = Records::subreddits(&things) else {
                panic!("expected subreddits");
            };
            assert_eq!(subreddits[0].name, "rust");
            assert_eq!(subreddits[0].url, "https://www.reddit.com/r/rust/");
            assert_eq!(subreddits[0].subscriber_count, Some(345_678));
            assert_eq!(subreddits[1].description, "");
        }

        #[test]
        fn it_uses_compatible_json_keys() {
            let record = SubredditRecord {
                name: String::from("rust"),
                url: String::from("https://www.reddit.com/r/rust/"),
                subscriber_count: None,
                description: String::from("Systems & stuff"),
                created_date: String::from("2010-06-14"),
            };
            let json = serde_json::to_value(&record).unwrap();
            assert_eq!(json["subscribers"], serde_json::Value::Null);
            assert_eq!(json["public_description"], "Systems & stuff");
            assert_eq!(json["created_utc"], "2010-06-14");

            let parsed: SubredditRecord = serde_json::from_value(json).unwrap();
            assert_eq!(parsed, record);
        }
    }

    mod records {
        use crate::record::*;

        #[test]
        fn it_names_its_kind() {
            assert_eq!(Records::Posts(vec![]).kind(), "items");
            assert_eq!(Records::Comments(vec![]).kind(), "comments");
            assert_eq!(Records::Subreddits(vec![]).kind(), "subreddits");
            assert!(Records::Posts(vec![]).is_empty());
        }
    }
}
