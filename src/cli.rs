//! Drives the command-line program.

use crate::auth::{CredentialResolver, MissingCredentials, Resolved};
use crate::comments::{CommentCollector, Expansion};
use crate::http::HTTPError;
use crate::query::{
    self, Discovery, FetchError, Query, QueryError, Shape, UserContent, dispatch,
    fetch_submission,
};
use crate::record::{PostRecord, Records};
use crate::reddit::RedditClient;
use crate::reddit::service::{RedditService, Service};
use crate::reddit::thing::{Post, Thing};
use crate::sort::Sort;
use crate::timefilter::{Snap, TimeFilter};
use crate::view::{self, Format, RenderError};
use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::Verbosity;
use log::{debug, warn};
use std::fmt;
use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::process;
use thiserror::Error;

/// Prints `message` to stderr and exits with `error_code`.
pub fn die(error_code: i32, message: &str) -> ! {
    eprintln!("{}", message);
    process::exit(error_code);
}

/// Program configuration.
#[derive(Debug, Parser)]
#[command(version)]
#[command(about = "Search Reddit posts, subreddits, and threads from the command line", long_about = None)]
pub struct Config {
    #[command(flatten)]
    verbosity: Verbosity,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Read Reddit credentials from this file first
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

impl Config {
    pub fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    /// True if progress messages should be suppressed.
    pub fn quiet(&self) -> bool {
        self.verbosity.is_silent()
    }

    pub fn command(&self) -> &Command {
        &self.command
    }

    /// Turns off colors if asked to, or if stdout is not a terminal.
    fn configure_color(&self) {
        if self.no_color || !io::stdout().is_terminal() {
            colored::control::set_override(false);
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Search posts across Reddit or within a subreddit
    Search(SearchConfig),

    /// Browse a subreddit's listing
    Feed(FeedConfig),

    /// Fetch a Redditor's recent posts or comments
    User(UserConfig),

    /// Fetch posts linking to a domain
    Domain(DomainConfig),

    /// Find subreddits by name or description, or browse popular ones
    Subreddits(SubredditsConfig),

    /// Read a single post by id or URL
    Post(PostConfig),

    /// Read the top comments on a post
    Comments(CommentsConfig),

    /// Check that Reddit credentials work
    Auth,
}

#[derive(Args, Debug)]
pub struct SearchConfig {
    /// Search query
    query: String,

    /// Subreddit to search
    #[arg(short, long, default_value = "all")]
    subreddit: String,

    /// Sort order [default: top]
    #[arg(long)]
    sort: Option<Sort>,

    /// Look back this many days (snapped to Reddit's time windows)
    #[arg(long, value_name = "N", default_value_t = 30)]
    days: i64,

    /// Maximum number of results
    #[arg(short = 'n', long, default_value_t = 25)]
    limit: u32,

    /// Include each post's body and top comments
    #[arg(long, default_value_t = false)]
    enrich: bool,

    /// Number of comments per post when enriching
    #[arg(long, value_name = "N", default_value_t = 5)]
    enrich_comments: usize,

    /// Output format
    #[arg(short, long, value_enum, default_value_t)]
    output: Format,
}

/// Time window for `top` and `controversial` sorts.
#[derive(Args, Debug)]
pub struct WindowConfig {
    /// Time window [default: week]
    #[arg(long, value_name = "PERIOD", conflicts_with = "days")]
    time: Option<TimeFilter>,

    /// Look back this many days instead (snapped to Reddit's time windows)
    #[arg(long, value_name = "N")]
    days: Option<i64>,
}

impl WindowConfig {
    fn time_filter(&self) -> TimeFilter {
        match self.days {
            Some(days) => TimeFilter::from_days(days).filter,
            None => self.time.unwrap_or_default(),
        }
    }
}

#[derive(Args, Debug)]
pub struct FeedConfig {
    /// Subreddit name, with or without r/
    subreddit: String,

    /// Sort order [default: hot]
    #[arg(long)]
    sort: Option<Sort>,

    #[command(flatten)]
    window: WindowConfig,

    /// Maximum number of posts
    #[arg(short = 'n', long, default_value_t = 25)]
    limit: u32,

    /// Output format
    #[arg(short, long, value_enum, default_value_t)]
    output: Format,
}

#[derive(Args, Debug)]
pub struct UserConfig {
    /// Reddit username, with or without u/
    username: String,

    /// Whether to fetch posts or comments
    #[arg(long, value_enum, default_value_t)]
    what: UserContent,

    /// Sort order [default: new]
    #[arg(long)]
    sort: Option<Sort>,

    #[command(flatten)]
    window: WindowConfig,

    /// Maximum number of items
    #[arg(short = 'n', long, default_value_t = 25)]
    limit: u32,

    /// Output format
    #[arg(short, long, value_enum, default_value_t)]
    output: Format,
}

#[derive(Args, Debug)]
pub struct DomainConfig {
    /// Domain, such as github.com
    domain: String,

    /// Sort order [default: hot]
    #[arg(long)]
    sort: Option<Sort>,

    #[command(flatten)]
    window: WindowConfig,

    /// Maximum number of posts
    #[arg(short = 'n', long, default_value_t = 25)]
    limit: u32,

    /// Output format
    #[arg(short, long, value_enum, default_value_t)]
    output: Format,
}

/// How `subreddits` matches its query.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, ValueEnum)]
pub enum MatchBy {
    /// Match subreddit names.
    #[default]
    Name,

    /// Match subreddit descriptions.
    Description,
}

#[derive(Args, Debug)]
pub struct SubredditsConfig {
    /// Text to look for; without it, popular subreddits are listed
    query: Option<String>,

    /// Match the query against names or descriptions
    #[arg(long, value_enum, default_value_t)]
    by: MatchBy,

    /// List popular subreddits
    #[arg(long, default_value_t = false)]
    popular: bool,

    /// Maximum number of subreddits
    #[arg(short = 'n', long, default_value_t = 10)]
    limit: u32,

    /// Output format (compact or json)
    #[arg(short, long, value_enum, default_value_t)]
    output: Format,
}

impl SubredditsConfig {
    fn discovery(&self) -> Discovery {
        match self.query.as_deref().map(str::trim) {
            Some(query) if !self.popular && !query.is_empty() => match self.by {
                MatchBy::Name => Discovery::ByName(query.to_string()),
                MatchBy::Description => Discovery::ByDescription(query.to_string()),
            },
            _ => Discovery::Popular,
        }
    }
}

#[derive(Args, Debug)]
pub struct PostConfig {
    /// Post id or any URL containing /comments/<id>
    id_or_url: String,

    /// Output format
    #[arg(short, long, value_enum, default_value_t)]
    output: Format,
}

#[derive(Args, Debug)]
pub struct CommentsConfig {
    /// Post id or any URL containing /comments/<id>
    id_or_url: String,

    /// Maximum number of comments
    #[arg(short = 'n', long, default_value_t = 20)]
    limit: usize,

    /// Skip comments scoring below this
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    min_score: i64,

    /// How many levels of replies to include (0 = top-level only)
    #[arg(long, default_value_t = 0)]
    depth: usize,

    /// Output format
    #[arg(short, long, value_enum, default_value_t)]
    output: Format,
}

impl Command {
    /// The listing query behind this command, if it has one.
    pub fn query(&self) -> Result<Option<Query>, QueryError> {
        let query = match self {
            Command::Search(config) => Query::new(
                Shape::search(Some(config.subreddit.as_str()), config.query.as_str()),
                config.sort,
                TimeFilter::from_days(config.days).filter,
                config.limit,
            )?,
            Command::Feed(config) => Query::new(
                Shape::feed(&config.subreddit),
                config.sort,
                config.window.time_filter(),
                config.limit,
            )?,
            Command::User(config) => Query::new(
                Shape::user(&config.username, config.what),
                config.sort,
                config.window.time_filter(),
                config.limit,
            )?,
            Command::Domain(config) => Query::new(
                Shape::domain(&config.domain),
                config.sort,
                config.window.time_filter(),
                config.limit,
            )?,
            Command::Post(config) => Query::new(
                Shape::single_item(&config.id_or_url),
                None,
                TimeFilter::default(),
                1,
            )?,
            Command::Subreddits(_) | Command::Comments(_) | Command::Auth => return Ok(None),
        };
        Ok(Some(query))
    }

    /// The requested output format.
    pub fn format(&self) -> Format {
        match self {
            Command::Search(config) => config.output,
            Command::Feed(config) => config.output,
            Command::User(config) => config.output,
            Command::Domain(config) => config.output,
            Command::Subreddits(config) => config.output,
            Command::Post(config) => config.output,
            Command::Comments(config) => config.output,
            Command::Auth => Format::default(),
        }
    }

    /// The kind of records this command prints.
    fn kind(&self) -> &'static str {
        match self {
            Command::User(UserConfig {
                what: UserContent::Comments,
                ..
            })
            | Command::Comments(_) => "comments",
            Command::Subreddits(_) => "subreddits",
            _ => "items",
        }
    }

    /// Explains why connecting to Reddit failed.
    ///
    /// Refused credentials are an authentication failure, and so is any
    /// failure while checking credentials with `auth`. Otherwise, a failed
    /// connection is just a failed fetch.
    fn connection_error(&self, err: HTTPError) -> Error {
        if matches!(self, Command::Auth) || err.is_rejection() {
            Error::Authentication(err.to_string())
        } else {
            Error::Fetch(FetchError::Failed {
                action: "Connection",
                source: err.into(),
            })
        }
    }

    /// Checks arguments that clap cannot check on its own.
    pub fn validate(&self) -> Result<(), Error> {
        self.query()?;
        view::supports(self.format(), self.kind()).map_err(|err| Error::Usage(err.to_string()))
    }
}

/// An error that ends the program.
#[derive(Debug, Error)]
pub enum Error {
    /// Arguments that parse but do not make sense together.
    #[error("Error: {0}")]
    Usage(String),

    #[error("Error: {0}")]
    Query(#[from] QueryError),

    #[error("{0}")]
    Credentials(#[from] MissingCredentials),

    /// Reddit rejected the credentials.
    #[error("Auth failed: {0}")]
    Authentication(String),

    #[error("Error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Error: {0}")]
    Render(#[from] RenderError),
}

impl Error {
    /// The status the program should exit with.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Usage(_) | Error::Query(_) => 2,
            Error::Credentials(_) | Error::Authentication(_) => 3,
            Error::Fetch(_) | Error::Render(_) => 1,
        }
    }
}

/// Writes progress messages, such as `[feed] 25 posts`, to stderr.
#[derive(Clone, Copy, Debug)]
pub struct Progress {
    quiet: bool,
}

impl Progress {
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }

    pub fn report(&self, tag: &str, message: impl fmt::Display) {
        if !self.quiet {
            eprintln!("[{tag}] {message}");
        }
    }
}

/// Runs commands against a Reddit client.
#[derive(Debug)]
pub struct Runner<S: Service = RedditService> {
    client: RedditClient<S>,
    progress: Progress,
}

impl<S: Service> Runner<S> {
    pub fn new(client: RedditClient<S>, progress: Progress) -> Self {
        Self { client, progress }
    }

    /// Runs `command`, writing its output to `out`.
    ///
    /// Nothing is written to `out` if fetching fails.
    pub async fn execute(&self, command: &Command, out: &mut impl Write) -> Result<(), Error> {
        command.validate()?;
        match command {
            Command::Search(config) => self.run_search(command, config, out).await,
            Command::Feed(_) | Command::User(_) | Command::Domain(_) => {
                self.run_listing(command, out).await
            }
            Command::Subreddits(config) => self.run_subreddits(config, out).await,
            Command::Post(config) => self.run_post(config, out).await,
            Command::Comments(config) => self.run_comments(config, out).await,
            Command::Auth => Err(Error::Usage(String::from(
                "auth cannot run without resolved credentials",
            ))),
        }
    }

    async fn fetch(&self, command: &Command) -> Result<(Query, Vec<Thing>), Error> {
        let query = command
            .query()?
            .ok_or_else(|| Error::Usage(String::from("command does not list anything")))?;
        let tag = query.shape().name();
        self.progress.report(tag, query.describe());
        let things = dispatch(&query, &self.client).await?;
        Ok((query, things))
    }

    async fn run_listing(&self, command: &Command, out: &mut impl Write) -> Result<(), Error> {
        let (query, things) = self.fetch(command).await?;
        let records = match query.shape() {
            Shape::User {
                what: UserContent::Comments,
                ..
            } => Records::comments(&things),
            _ => Records::posts(&things),
        };
        let noun = match query.shape() {
            Shape::User { what, .. } => what.to_string(),
            _ => String::from("posts"),
        };
        self.progress
            .report(query.shape().name(), format!("{} {noun}", records.len()));
        Ok(view::render(&records, command.format(), out)?)
    }

    async fn run_search(
        &self,
        command: &Command,
        config: &SearchConfig,
        out: &mut impl Write,
    ) -> Result<(), Error> {
        let Snap { filter, snapped } = TimeFilter::from_days(config.days);
        if snapped {
            self.progress.report(
                "search",
                format!(
                    "note: --days {} snapped to time_filter={filter} (nearest Reddit bucket)",
                    config.days
                ),
            );
        }

        let (_, things) = self.fetch(command).await?;
        self.progress
            .report("search", format!("{} results", things.len()));

        let records = if config.enrich {
            let mut posts = vec![];
            for thing in &things {
                if let Thing::Post(post) = thing {
                    posts.push(self.enrich(post, config.enrich_comments).await);
                }
            }
            Records::Posts(posts)
        } else {
            Records::posts(&things)
        };
        Ok(view::render(&records, command.format(), out)?)
    }

    /// Adds a post's body and top comments. Failures leave the comments empty.
    async fn enrich(&self, post: &Post, limit: usize) -> PostRecord {
        let record = PostRecord::from(post);
        match fetch_submission(&self.client, &post.id).await {
            Ok(submission) => {
                let record = record.with_selftext(&submission.post);
                let comments = CommentCollector::default()
                    .limit(limit)
                    .min_score(i64::MIN)
                    .sample(&submission.comments);
                record.with_comments(comments)
            }
            Err(err) => {
                warn!("Could not enrich post {}: {err}", post.id);
                record.with_selftext(post).with_comments(vec![])
            }
        }
    }

    async fn run_subreddits(
        &self,
        config: &SubredditsConfig,
        out: &mut impl Write,
    ) -> Result<(), Error> {
        let discovery = config.discovery();
        self.progress
            .report("subreddits", discovery.describe(config.limit));
        let things = query::discover(&discovery, config.limit, &self.client).await?;
        let records = Records::subreddits(&things);
        self.progress
            .report("subreddits", format!("{} results", records.len()));
        Ok(view::render(&records, config.output, out)?)
    }

    async fn run_post(&self, config: &PostConfig, out: &mut impl Write) -> Result<(), Error> {
        let id = query::extract_id(&config.id_or_url);
        self.progress.report("post", format!("id={id}"));
        let submission = fetch_submission(&self.client, &id).await?;
        let record = PostRecord::from(&submission.post).with_selftext(&submission.post);
        Ok(view::render(
            &Records::Post(Box::new(record)),
            config.output,
            out,
        )?)
    }

    async fn run_comments(&self, config: &CommentsConfig, out: &mut impl Write) -> Result<(), Error> {
        let id = query::extract_id(&config.id_or_url);
        self.progress.report(
            "comments",
            format!(
                "id={id} limit={} min_score={} depth={}",
                config.limit, config.min_score, config.depth
            ),
        );
        let submission = fetch_submission(&self.client, &id).await?;
        let collected = CommentCollector::default()
            .limit(config.limit)
            .min_score(config.min_score)
            .max_depth(config.depth)
            .collect(&self.client, submission)
            .await;
        match &collected.expansion {
            Expansion::Failed(err) => {
                warn!("Could not load hidden comments: {err}");
                self.progress
                    .report("comments", "note: some hidden comments could not be loaded");
            }
            Expansion::Expanded { added } => debug!("Loaded {added} hidden comments"),
            Expansion::Unneeded => {}
        }
        self.progress
            .report("comments", format!("{} comments", collected.comments.len()));
        Ok(view::render(
            &Records::Comments(collected.comments),
            config.output,
            out,
        )?)
    }

    /// Confirms that the connected credentials can read Reddit, and
    /// reports who they belong to.
    pub async fn verify(
        &self,
        resolved: &Resolved,
        config_path: Option<&Path>,
        out: &mut impl Write,
    ) -> Result<(), Error> {
        self.client
            .about_subreddit("redditdev")
            .await
            .map_err(|err| Error::Authentication(err.to_string()))?;

        let username = match self.client.me().await {
            Ok(account) => account.name.filter(|name| !name.is_empty()),
            Err(err) => {
                debug!("No account for these credentials: {err}");
                None
            }
        };

        let mut report = match username {
            Some(name) => format!("Authenticated as u/{name}\n"),
            None => String::from(
                "Read-only credentials OK (no username; script app without login)\n",
            ),
        };
        report.push_str(&format!("Credentials: {}\n", resolved.source));
        if let Some(path) = config_path {
            report.push_str(&format!("Config: {}\n", path.display()));
        }
        out.write_all(report.as_bytes())
            .map_err(|err| Error::Render(RenderError::Io(err)))
    }
}

/// Runs the command-line program.
///
/// Arguments are checked before credentials are looked up, and
/// credentials are looked up before anything touches the network.
pub async fn run(config: Config) -> Result<(), Error> {
    config.configure_color();
    config.command.validate()?;

    let resolver = CredentialResolver::new(config.config.clone());
    let resolved = resolver.resolve()?;
    debug!("Using credentials from {}", resolved.source);

    let service = RedditService::connect(&resolved.credentials)
        .await
        .map_err(|err| config.command.connection_error(err))?;
    let runner = Runner::new(RedditClient::new(service), Progress::new(config.quiet()));

    let mut stdout = io::stdout().lock();
    match &config.command {
        Command::Auth => {
            runner
                .verify(&resolved, resolver.candidates().first(), &mut stdout)
                .await
        }
        command => runner.execute(command, &mut stdout).await,
    }
}
