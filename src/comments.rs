// SPDX-License-Identifier: Apache-2.0
// Copyright (C) 2025 Michael Dippery <michael@monkey-robot.com>

//! Collects the best comments from a post's comment forest.

use crate::query::FetchError;
use crate::record::CommentRecord;
use crate::reddit::RedditClient;
use crate::reddit::service::Service;
use crate::reddit::thing::{Submission, Thing};
use itertools::Itertools;
use log::debug;
use std::cmp::Reverse;

/// Reddit loads at most this many hidden comments per request.
pub const MAX_EXPANSION: usize = 100;

/// What happened when loading comments hidden behind placeholders.
#[derive(Debug)]
pub enum Expansion {
    /// There were no placeholders within reach.
    Unneeded,

    /// Hidden comments were loaded and grafted into the forest.
    Expanded { added: usize },

    /// Loading failed; only the comments already present were collected.
    Failed(FetchError),
}

/// The result of [`CommentCollector::collect()`].
#[derive(Debug)]
pub struct Collected {
    /// Selected comments, highest score first.
    pub comments: Vec<CommentRecord>,

    pub expansion: Expansion,
}

/// Selects up to `limit` comments scoring at least `min_score` from the
/// top `max_depth + 1` levels of a comment forest.
///
/// Comments are ordered by score, highest first. Comments with equal
/// scores keep the order they had in a pre-order walk of the forest, so
/// collection is deterministic.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CommentCollector {
    limit: usize,
    min_score: i64,
    max_depth: usize,
}

impl Default for CommentCollector {
    fn default() -> Self {
        Self {
            limit: 20,
            min_score: 0,
            max_depth: 0,
        }
    }
}

impl CommentCollector {
    /// Keep at most `limit` comments.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Drop comments scoring below `min_score`.
    pub fn min_score(mut self, min_score: i64) -> Self {
        self.min_score = min_score;
        self
    }

    /// Descend at most `max_depth` levels below the top-level comments.
    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Loads hidden comments within reach, then selects comments from
    /// the submission's forest.
    ///
    /// A failure to load hidden comments is reported in
    /// [`Collected::expansion`] and is otherwise ignored.
    pub async fn collect<S: Service>(
        &self,
        client: &RedditClient<S>,
        submission: Submission,
    ) -> Collected {
        let Submission { post, comments } = submission;
        let mut forest = comments;
        let expansion = self.expand(client, &post.fullname(), &mut forest).await;
        let comments = self.gather(&forest);
        Collected {
            comments,
            expansion,
        }
    }

    /// Selects comments from an already loaded forest.
    pub fn gather(&self, forest: &[Thing]) -> Vec<CommentRecord> {
        let mut found = vec![];
        self.walk(forest, 0, &mut found);
        found
            .into_iter()
            .filter(|comment| comment.score >= self.min_score)
            .sorted_by_key(|comment| Reverse(comment.score))
            .take(self.limit)
            .collect()
    }

    /// Takes the first `limit` comments in the order Reddit returned them,
    /// then sorts only those by score. Placeholders are skipped rather than
    /// loaded.
    pub fn sample(&self, forest: &[Thing]) -> Vec<CommentRecord> {
        let mut found = vec![];
        self.walk(forest, 0, &mut found);
        found
            .into_iter()
            .filter(|comment| comment.score >= self.min_score)
            .take(self.limit)
            .sorted_by_key(|comment| Reverse(comment.score))
            .collect()
    }

    fn walk(&self, things: &[Thing], depth: usize, found: &mut Vec<CommentRecord>) {
        for thing in things {
            if let Thing::Comment(comment) = thing {
                if let Some(record) = CommentRecord::from_raw(comment, depth) {
                    found.push(record);
                }
                if depth < self.max_depth {
                    self.walk(&comment.replies, depth + 1, found);
                }
            }
        }
    }

    async fn expand<S: Service>(
        &self,
        client: &RedditClient<S>,
        link: &str,
        forest: &mut Vec<Thing>,
    ) -> Expansion {
        let mut ids = vec![];
        self.hidden_ids(forest, 0, &mut ids);
        if ids.is_empty() {
            return Expansion::Unneeded;
        }
        ids.truncate(MAX_EXPANSION);

        debug!("Loading {} hidden comments for {link}", ids.len());
        match client.more_children(link, &ids).await {
            Ok(things) => {
                let mut added = 0;
                for thing in things {
                    if graft(forest, thing) {
                        added += 1;
                    }
                }
                Expansion::Expanded { added }
            }
            Err(err) => Expansion::Failed(FetchError::classify(
                err,
                format!("hidden comments of {link}"),
                "Comment expansion",
            )),
        }
    }

    fn hidden_ids(&self, things: &[Thing], depth: usize, ids: &mut Vec<String>) {
        for thing in things {
            match thing {
                Thing::More(more) => ids.extend(more.children.iter().cloned()),
                Thing::Comment(comment) if depth < self.max_depth => {
                    self.hidden_ids(&comment.replies, depth + 1, ids)
                }
                _ => {}
            }
        }
    }
}

/// Places `thing` under its parent. Returns false if the parent is not in
/// the forest.
fn graft(forest: &mut Vec<Thing>, thing: Thing) -> bool {
    let parent = thing
        .parent_id()
        .and_then(|parent| parent.strip_prefix("t1_"))
        .map(String::from);
    match parent {
        Some(parent) => match find_comment(forest, &parent) {
            Some(replies) => {
                replies.push(thing);
                true
            }
            None => {
                debug!("Dropping hidden comment whose parent {parent} is not loaded");
                false
            }
        },
        None => {
            forest.push(thing);
            true
        }
    }
}

fn find_comment<'a>(things: &'a mut [Thing], id: &str) -> Option<&'a mut Vec<Thing>> {
    for thing in things.iter_mut() {
        if let Thing::Comment(comment) = thing {
            if comment.id == id {
                return Some(&mut comment.replies);
            }
            if let Some(replies) = find_comment(&mut comment.replies, id) {
                return Some(replies);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    fn ids(collected: &[crate::record::CommentRecord]) -> Vec<&str> {
        collected.iter().map(|comment| comment.id.as_str()).collect()
    }

    mod collect {
        use super::ids;
        use crate::comments::*;
        use crate::reddit::thing::Submission;
        use crate::test_utils::{TestService, do_logging, load_data};
        use pretty_assertions::assert_eq;
        use reqwest::StatusCode;

        fn submission() -> Submission {
            Submission::parse(&load_data("submission")).unwrap().unwrap()
        }

        #[tokio::test]
        async fn it_collects_top_level_comments_with_expansion() {
            do_logging();
            let client =
                RedditClient::new(TestService::new().route("api/morechildren", "morechildren"));
            let collected = CommentCollector::default()
                .collect(&client, submission())
                .await;
            assert_eq!(
                ids(&collected.comments),
                vec!["abc401", "abc601", "abc101", "abc301", "abc501"]
            );
            assert!(matches!(collected.expansion, Expansion::Expanded { added: 3 }));
            assert_eq!(
                client.service().requests(),
                vec![String::from(
                    "api/morechildren?link_id=t3_1abc2de&children=abc501,abc601&api_type=json"
                )]
            );
        }

        #[tokio::test]
        async fn it_descends_into_replies() {
            let client =
                RedditClient::new(TestService::new().route("api/morechildren", "morechildren"));
            let collected = CommentCollector::default()
                .max_depth(1)
                .collect(&client, submission())
                .await;
            assert_eq!(
                ids(&collected.comments),
                vec!["abc401", "abc102", "abc601", "abc101", "abc301", "abc501", "abc104"]
            );
            assert_eq!(collected.comments[1].depth, 1);
            assert_eq!(
                client.service().requests(),
                vec![String::from(
                    "api/morechildren?link_id=t3_1abc2de&children=abc104,abc501,abc601&api_type=json"
                )]
            );
        }

        #[tokio::test]
        async fn it_keeps_going_when_expansion_fails() {
            do_logging();
            let client = RedditClient::new(
                TestService::new().fail("api/morechildren", StatusCode::INTERNAL_SERVER_ERROR),
            );
            let collected = CommentCollector::default()
                .collect(&client, submission())
                .await;
            assert_eq!(ids(&collected.comments), vec!["abc401", "abc101", "abc301"]);
            assert!(matches!(collected.expansion, Expansion::Failed(_)));
        }

        #[tokio::test]
        async fn it_applies_limits_and_score_floors() {
            let client =
                RedditClient::new(TestService::new().route("api/morechildren", "morechildren"));
            let collected = CommentCollector::default()
                .limit(2)
                .min_score(16)
                .collect(&client, submission())
                .await;
            assert_eq!(ids(&collected.comments), vec!["abc401", "abc601"]);
        }

        #[tokio::test]
        async fn it_skips_expansion_without_placeholders() {
            let client = RedditClient::new(TestService::new());
            let mut submission = submission();
            submission.comments.retain(|thing| !thing.is_placeholder());
            let collected = CommentCollector::default().collect(&client, submission).await;
            assert!(matches!(collected.expansion, Expansion::Unneeded));
            assert!(client.service().requests().is_empty());
        }
    }

    mod gather {
        use super::ids;
        use crate::comments::*;
        use crate::reddit::thing::{Comment, More};
        use proptest::prelude::*;

        fn comment(id: &str, score: i64, replies: Vec<Thing>) -> Thing {
            Thing::Comment(Comment {
                id: id.to_string(),
                score,
                body: Some(format!("comment {id}")),
                replies,
                ..Default::default()
            })
        }

        fn placeholder(id: &str) -> Thing {
            Thing::More(More {
                id: id.to_string(),
                children: vec![String::from("zzz")],
                ..Default::default()
            })
        }

        #[test]
        fn it_drops_low_scores_and_placeholders() {
            let forest = vec![comment("a", 10, vec![]), comment("b", -5, vec![]), placeholder("c")];
            let collected = CommentCollector::default().limit(10).gather(&forest);
            assert_eq!(ids(&collected), vec!["a"]);
        }

        #[test]
        fn it_skips_comments_without_bodies() {
            let forest = vec![Thing::Comment(Comment {
                id: String::from("gone"),
                score: 100,
                ..Default::default()
            })];
            assert!(CommentCollector::default().gather(&forest).is_empty());
        }

        #[test]
        fn it_keeps_walk_order_for_ties() {
            let forest = vec![
                comment("a", 1, vec![comment("a1", 5, vec![])]),
                comment("b", 5, vec![]),
                comment("c", 5, vec![]),
            ];
            let collected = CommentCollector::default().max_depth(1).gather(&forest);
            assert_eq!(ids(&collected), vec!["a1", "b", "c", "a"]);
        }

        #[test]
        fn it_respects_max_depth() {
            let forest = vec![comment(
                "a",
                1,
                vec![comment("b", 1, vec![comment("c", 1, vec![])])],
            )];
            let collector = CommentCollector::default();
            assert_eq!(ids(&collector.gather(&forest)), vec!["a"]);
            assert_eq!(ids(&collector.max_depth(1).gather(&forest)), vec!["a", "b"]);
            let deep = collector.max_depth(5).gather(&forest);
            assert_eq!(deep.iter().map(|c| c.depth).collect::<Vec<_>>(), vec![0, 1, 2]);
        }

        #[test]
        fn it_samples_in_reddit_order_before_sorting() {
            let forest = vec![
                comment("a", 1, vec![]),
                placeholder("more"),
                comment("b", 7, vec![]),
                comment("c", 50, vec![]),
            ];
            let collector = CommentCollector::default().limit(2);
            assert_eq!(ids(&collector.sample(&forest)), vec!["b", "a"]);
            assert_eq!(ids(&collector.gather(&forest)), vec!["c", "b"]);
        }

        fn node() -> impl Strategy<Value = Thing> {
            let leaf = prop_oneof![
                1 => Just(placeholder("more")),
                5 => (-20i64..=20).prop_map(|score| comment("leaf", score, vec![])),
            ];
            leaf.prop_recursive(3, 32, 4, |inner| {
                (-20i64..=20, prop::collection::vec(inner, 0..4))
                    .prop_map(|(score, replies)| comment("node", score, replies))
            })
        }

        proptest! {
            #[test]
            fn it_always_returns_sorted_bounded_output(
                forest in prop::collection::vec(node(), 0..5),
                limit in 0usize..10,
                min_score in -10i64..=10,
                max_depth in 0usize..4,
            ) {
                let collector = CommentCollector::default()
                    .limit(limit)
                    .min_score(min_score)
                    .max_depth(max_depth);

                let collected = collector.gather(&forest);
                prop_assert!(collected.len() <= limit);
                prop_assert!(collected.iter().all(|c| c.score >= min_score));
                prop_assert!(collected.iter().all(|c| c.depth <= max_depth));
                prop_assert!(collected.windows(2).all(|pair| pair[0].score >= pair[1].score));
                prop_assert_eq!(collector.gather(&forest), collected);
            }
        }
    }
}
