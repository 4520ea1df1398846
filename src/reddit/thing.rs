// SPDX-License-Identifier: Apache-2.0
// Copyright (C) 2025 Michael Dippery <michael@monkey-robot.com>

//! A "thing" in the Reddit sense.
//!
//! Historically in the Reddit API and its old source code, a "Thing" was
//! any element of the Reddit system: users, posts, comments, etc. Every
//! thing arrives wrapped in a `{"kind": ..., "data": ...}` envelope, and
//! lists of things arrive wrapped in a "Listing". This module decodes
//! those envelopes into plain structs.
//!
//! Reddit omits or nulls fields freely (deleted accounts have no author,
//! removed comments may have no body), so anything that is not reliably
//! present is an `Option` or has a default.

use crate::clock::HasDate;
use log::debug;
use serde::{Deserialize, Deserializer};

/// Any Reddit thing.
///
/// Kinds this tool does not read, such as accounts (`t2`) or awards
/// (`t6`), decode as [`Thing::Unknown`] so that one stray child does not
/// spoil a whole listing.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(try_from = "Envelope")]
pub enum Thing {
    /// A comment (`t1`).
    Comment(Comment),

    /// A post (`t3`), sometimes called a link or a submission.
    Post(Post),

    /// A subreddit (`t5`).
    Subreddit(Subreddit),

    /// A placeholder for replies that have not been loaded yet.
    More(More),

    /// Any other kind, which every consumer skips.
    Unknown(String),
}

/// The `{"kind": ..., "data": ...}` wrapper around every thing.
#[derive(Deserialize)]
struct Envelope {
    kind: String,

    #[serde(default)]
    data: serde_json::Value,
}

impl TryFrom<Envelope> for Thing {
    type Error = serde_json::Error;

    fn try_from(envelope: Envelope) -> Result<Self, Self::Error> {
        let Envelope { kind, data } = envelope;
        let thing = match kind.as_str() {
            "t1" => Thing::Comment(serde_json::from_value(data)?),
            "t3" => Thing::Post(serde_json::from_value(data)?),
            "t5" => Thing::Subreddit(serde_json::from_value(data)?),
            "more" => Thing::More(serde_json::from_value(data)?),
            other => {
                debug!("skipping thing of kind {other}");
                Thing::Unknown(other.to_string())
            }
        };
        Ok(thing)
    }
}

impl Thing {
    /// The fullname of this thing's parent, for comments and placeholders.
    pub fn parent_id(&self) -> Option<&str> {
        match self {
            Thing::Comment(comment) => comment.parent_id.as_deref(),
            Thing::More(more) => more.parent_id.as_deref(),
            Thing::Post(_) | Thing::Subreddit(_) | Thing::Unknown(_) => None,
        }
    }

    /// True if this is a placeholder rather than real content.
    pub fn is_placeholder(&self) -> bool {
        matches!(self, Thing::More(_))
    }
}

/// A Reddit post.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct Post {
    /// Base-36 identifier, without the `t3_` prefix.
    pub id: String,

    /// Post title, with HTML entities still encoded.
    #[serde(default)]
    pub title: String,

    /// Path to the comments page, relative to `https://www.reddit.com`.
    #[serde(default)]
    pub permalink: String,

    /// Display name of the subreddit the post was submitted to.
    #[serde(default)]
    pub subreddit: String,

    /// Net score.
    #[serde(default)]
    pub score: i64,

    /// Fraction of votes that were upvotes.
    #[serde(default)]
    pub upvote_ratio: f64,

    /// Number of comments.
    #[serde(default)]
    pub num_comments: u64,

    /// Author's username, or `[deleted]`.
    #[serde(default)]
    pub author: Option<String>,

    /// Creation time, in seconds since the Unix epoch.
    #[serde(default)]
    pub created_utc: f64,

    /// Body of a self post; empty for link posts.
    #[serde(default)]
    pub selftext: Option<String>,
}

impl Post {
    /// The post's fullname, such as `t3_1abc2de`.
    pub fn fullname(&self) -> String {
        format!("t3_{}", self.id)
    }
}

impl HasDate for Post {
    fn created_utc(&self) -> f64 {
        self.created_utc
    }
}

/// A Reddit comment.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct Comment {
    /// Base-36 identifier, without the `t1_` prefix.
    pub id: String,

    /// Author's username, or `[deleted]`.
    #[serde(default)]
    pub author: Option<String>,

    /// Net score.
    #[serde(default)]
    pub score: i64,

    /// Creation time, in seconds since the Unix epoch.
    #[serde(default)]
    pub created_utc: f64,

    /// Markdown body, with HTML entities still encoded.
    #[serde(default)]
    pub body: Option<String>,

    /// Fullname of the parent comment (`t1_`) or post (`t3_`).
    #[serde(default)]
    pub parent_id: Option<String>,

    /// Direct replies to this comment.
    #[serde(default, deserialize_with = "deserialize_replies")]
    pub replies: Vec<Thing>,
}

impl HasDate for Comment {
    fn created_utc(&self) -> f64 {
        self.created_utc
    }
}

/// A subreddit.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct Subreddit {
    /// Name of the subreddit, without the `r/` prefix.
    pub display_name: String,

    /// Path to the subreddit, such as `/r/rust/`.
    #[serde(default)]
    pub url: String,

    /// Number of subscribers, if Reddit disclosed it.
    #[serde(default)]
    pub subscribers: Option<u64>,

    /// Short description shown in search results.
    #[serde(default)]
    pub public_description: Option<String>,

    /// Creation time, in seconds since the Unix epoch.
    #[serde(default)]
    pub created_utc: f64,
}

impl HasDate for Subreddit {
    fn created_utc(&self) -> f64 {
        self.created_utc
    }
}

/// Stands in for comments that Reddit did not include in a response.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct More {
    /// Identifier of the placeholder itself.
    #[serde(default)]
    pub id: String,

    /// Identifiers of the hidden comments.
    #[serde(default)]
    pub children: Vec<String>,

    /// Fullname of the thing the hidden comments reply to.
    #[serde(default)]
    pub parent_id: Option<String>,
}

/// A Reddit account, as returned by `/api/v1/me`.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct Account {
    /// Username, absent for app-only tokens.
    #[serde(default)]
    pub name: Option<String>,
}

/// A page of things.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Listing {
    /// The page itself.
    pub data: ListingData,
}

/// Contents of a [`Listing`].
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct ListingData {
    /// Things on this page, in Reddit's order.
    #[serde(default)]
    pub children: Vec<Thing>,
}

impl Listing {
    /// Parses a listing response into its things.
    pub fn parse(data: &str) -> Result<Vec<Thing>, serde_json::Error> {
        let listing: Listing = serde_json::from_str(data)?;
        Ok(listing.data.children)
    }
}

/// A post along with its comment forest, as returned by `/comments/<id>`.
#[derive(Clone, Debug, PartialEq)]
pub struct Submission {
    /// The post.
    pub post: Post,

    /// Top-level comments and placeholders, in Reddit's order.
    pub comments: Vec<Thing>,
}

impl Submission {
    /// Parses a `/comments/<id>` response.
    ///
    /// Reddit answers with two listings: one holding the post, and one
    /// holding the comments. Returns `None` if the first listing does not
    /// contain a post.
    pub fn parse(data: &str) -> Result<Option<Self>, serde_json::Error> {
        let listings: Vec<Listing> = serde_json::from_str(data)?;
        let mut listings = listings.into_iter();

        let post = listings
            .next()
            .into_iter()
            .flat_map(|listing| listing.data.children)
            .find_map(|thing| match thing {
                Thing::Post(post) => Some(post),
                _ => None,
            });
        let comments = listings
            .next()
            .map(|listing| listing.data.children)
            .unwrap_or_default();

        Ok(post.map(|post| Submission { post, comments }))
    }
}

/// Parses a `/api/morechildren` response into the things it loaded.
pub fn parse_more_children(data: &str) -> Result<Vec<Thing>, serde_json::Error> {
    #[derive(Deserialize)]
    struct Response {
        json: Body,
    }

    #[derive(Deserialize)]
    struct Body {
        #[serde(default)]
        data: Option<Things>,
    }

    #[derive(Deserialize)]
    struct Things {
        #[serde(default)]
        things: Vec<Thing>,
    }

    let response: Response = serde_json::from_str(data)?;
    Ok(response
        .json
        .data
        .map(|data| data.things)
        .unwrap_or_default())
}

/// Reddit sends `""` instead of a listing when a comment has no replies.
fn deserialize_replies<'de, D>(deserializer: D) -> Result<Vec<Thing>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Replies {
        Listing(Listing),
        Other(serde::de::IgnoredAny),
    }

    let replies = Option::<Replies>::deserialize(deserializer)?;
    Ok(match replies {
        Some(Replies::Listing(listing)) => listing.data.children,
        Some(Replies::Other(_)) | None => Vec::new(),
    })
}
