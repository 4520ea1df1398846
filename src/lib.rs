// SPDX-License-Identifier: Apache-2.0
// Copyright (C) 2025 Michael Dippery <michael@monkey-robot.com>

//! reddit-cli is a command-line tool for querying Reddit: searching posts,
//! browsing subreddit feeds, reading a Redditor's history, finding posts
//! that link to a domain, and reading single posts and their comments.
//! Results are printed as compact, colored lines for people, or as JSON or
//! CSV for other programs.
//!
//! # Examples
//!
//! Search all of Reddit for posts from the last month:
//!
//! ```bash
//! reddit-cli search "async traits"
//! ```
//!
//! Show this week's top posts in a subreddit, as JSON:
//!
//! ```bash
//! reddit-cli feed rust --sort top --time week -o json
//! ```
//!
//! Show a Redditor's latest comments:
//!
//! ```bash
//! reddit-cli user spez --what comments
//! ```
//!
//! Show posts linking to a domain:
//!
//! ```bash
//! reddit-cli domain github.com
//! ```
//!
//! Read a post, then its top comments and their replies:
//!
//! ```bash
//! reddit-cli post https://www.reddit.com/r/rust/comments/1abc2de/
//! reddit-cli comments 1abc2de --depth 1 --min-score 5
//! ```
//!
//! Find subreddits:
//!
//! ```bash
//! reddit-cli subreddits rust
//! reddit-cli subreddits --popular
//! ```
//!
//! Get usage and help for the tool:
//!
//! ```bash
//! reddit-cli --help
//! ```
//!
//! # Reddit API Setup
//!
//! Reddit requires an app for API access, even for reading. To set one up:
//!
//! 1. Create a "script" app at <https://www.reddit.com/prefs/apps>.
//! 2. Copy the app's client ID and secret.
//! 3. Store them in `~/.config/reddit-cli/.env`:
//!
//!    ```bash
//!    REDDIT_CLIENT_ID=your_client_id
//!    REDDIT_CLIENT_SECRET=your_client_secret
//!    ```
//!
//!    Or export them as environment variables. `~/.secrets` and the usual
//!    shell configuration files are also searched; see
//!    [`CredentialResolver`](auth::CredentialResolver) for the full order.
//!
//! 4. Run `reddit-cli auth` to check that the credentials work.
//!
//! # License
//!
//! reddit-cli is licensed under the terms of the [Apache License 2.0]. Please
//! see the LICENSE file accompanying this source code or visit the previous
//! link for more information on licensing.
//!
//! [Apache License 2.0]: https://www.apache.org/licenses/LICENSE-2.0

pub mod auth;
pub mod cli;
pub mod clock;
pub mod comments;
pub mod conf;
pub mod http;
pub mod query;
pub mod record;
pub mod reddit;
pub mod sort;
pub mod text;
pub mod timefilter;
pub mod view;

#[cfg(test)]
mod test_utils;
