//! Draws records onto a terminal, or serializes them for other programs.

use crate::record::{CommentRecord, PostRecord, Records, SubredditRecord};
use crate::text::{thousands, truncate};
use clap::ValueEnum;
use colored::Colorize;
use indoc::formatdoc;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::fmt;
use std::io::{self, Write};
use std::slice;
use thiserror::Error;

/// Subreddit descriptions are cut off after this many characters.
const DESCRIPTION_WIDTH: usize = 120;

/// How records are written to standard output.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, ValueEnum)]
pub enum Format {
    /// Short, colored lines for people.
    #[default]
    Compact,

    /// Pretty-printed JSON.
    Json,

    /// Comma-separated values with a header row.
    Csv,
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Format::Compact => f.write_str("compact"),
            Format::Json => f.write_str("json"),
            Format::Csv => f.write_str("csv"),
        }
    }
}

/// An error writing rendered records.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Could not write output: {0}")]
    Io(#[from] io::Error),

    #[error("Could not write JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Could not write CSV: {0}")]
    Csv(#[from] csv::Error),

    /// The format cannot represent this kind of record.
    #[error("{format} output is not available for {kind}")]
    Unsupported { format: Format, kind: &'static str },
}

/// Checks that `format` can represent records of `kind` without rendering
/// anything.
pub fn supports(format: Format, kind: &'static str) -> Result<(), RenderError> {
    match (format, kind) {
        (Format::Csv, "subreddits") => Err(RenderError::Unsupported { format, kind }),
        _ => Ok(()),
    }
}

/// Writes `records` to `out` in the given format.
///
/// Records are written in the order given; nothing is filtered.
pub fn render(records: &Records, format: Format, out: &mut impl Write) -> Result<(), RenderError> {
    supports(format, records.kind())?;
    match format {
        Format::Compact => render_compact(records, out),
        Format::Json => render_json(records, out),
        Format::Csv => render_csv(records, out),
    }
}

fn render_compact(records: &Records, out: &mut impl Write) -> Result<(), RenderError> {
    match records {
        Records::Posts(posts) => write_views(posts, out),
        Records::Post(post) => Ok(writeln!(out, "{}", Detailed(post.as_ref()).view())?),
        Records::Comments(comments) => write_views(comments, out),
        Records::Subreddits(subreddits) => write_views(subreddits, out),
    }
}

fn write_views<V: Viewable>(items: &[V], out: &mut impl Write) -> Result<(), RenderError> {
    for item in items {
        writeln!(out, "{}", item.view())?;
    }
    Ok(())
}

/// Serializes as a one-entry map, `{"<key>": <value>}`, keeping the
/// value's own field order.
struct Keyed<'a, T: ?Sized>(&'static str, &'a T);

impl<T: Serialize + ?Sized> Serialize for Keyed<'_, T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(self.0, self.1)?;
        map.end()
    }
}

fn render_json(records: &Records, out: &mut impl Write) -> Result<(), RenderError> {
    let kind = records.kind();
    match records {
        Records::Posts(posts) => serde_json::to_writer_pretty(&mut *out, &Keyed(kind, posts))?,
        Records::Post(post) => serde_json::to_writer_pretty(
            &mut *out,
            &Keyed(kind, slice::from_ref(post.as_ref())),
        )?,
        Records::Comments(comments) => {
            serde_json::to_writer_pretty(&mut *out, &Keyed(kind, comments))?
        }
        Records::Subreddits(subreddits) => {
            serde_json::to_writer_pretty(&mut *out, &Keyed(kind, subreddits))?
        }
    }
    writeln!(out)?;
    Ok(())
}

const POST_COLUMNS: [&str; 10] = [
    "id",
    "title",
    "url",
    "subreddit",
    "score",
    "num_comments",
    "author",
    "date",
    "upvote_ratio",
    "selftext",
];

const COMMENT_COLUMNS: [&str; 6] = ["id", "author", "score", "date", "body", "depth"];

fn render_csv(records: &Records, out: &mut impl Write) -> Result<(), RenderError> {
    let mut writer = csv::Writer::from_writer(out);
    match records {
        Records::Posts(posts) => {
            writer.write_record(POST_COLUMNS)?;
            for post in posts {
                writer.write_record(post_row(post))?;
            }
        }
        Records::Post(post) => {
            writer.write_record(POST_COLUMNS)?;
            writer.write_record(post_row(post))?;
        }
        Records::Comments(comments) => {
            writer.write_record(COMMENT_COLUMNS)?;
            for comment in comments {
                writer.write_record(comment_row(comment))?;
            }
        }
        Records::Subreddits(_) => {
            return Err(RenderError::Unsupported {
                format: Format::Csv,
                kind: records.kind(),
            });
        }
    }
    writer.flush()?;
    Ok(())
}

fn post_row(post: &PostRecord) -> [String; 10] {
    [
        post.id.clone(),
        post.title.clone(),
        post.url.clone(),
        post.subreddit.clone(),
        post.score.to_string(),
        post.num_comments.to_string(),
        post.author.clone().unwrap_or_default(),
        post.created_date.clone(),
        post.upvote_ratio.to_string(),
        post.selftext.clone().unwrap_or_default(),
    ]
}

fn comment_row(comment: &CommentRecord) -> [String; 6] {
    [
        comment.id.clone(),
        comment.author.clone().unwrap_or_default(),
        comment.score.to_string(),
        comment.created_date.clone(),
        comment.body.clone(),
        comment.depth.to_string(),
    ]
}

/// Marks an item that can be converted into a string for display on a terminal.
pub trait Viewable {
    /// Converts the item into a string for display on a terminal.
    fn view(&self) -> String;
}

impl Viewable for PostRecord {
    fn view(&self) -> String {
        formatdoc! {"
            {score} {subreddit} · {title}
                     {url}",
            score = format!("[{:>6}]", self.score).bold(),
            subreddit = format!("r/{}", self.subreddit).cyan(),
            title = self.title,
            url = self.url.dimmed(),
        }
    }
}

/// A single post, shown with its body.
#[derive(Debug)]
pub struct Detailed<'a>(pub &'a PostRecord);

impl Viewable for Detailed<'_> {
    fn view(&self) -> String {
        let post = self.0;
        let mut view = formatdoc! {"
            {title}
            {subreddit} · u/{author} · {date}
            Score: {score} ({percent}% upvoted) · {comments} comments
            {url}",
            title = post.title.bold(),
            subreddit = format!("r/{}", post.subreddit).cyan(),
            author = post.author.as_deref().unwrap_or("[deleted]"),
            date = post.created_date,
            score = post.score,
            percent = post.upvote_percent(),
            comments = post.num_comments,
            url = post.url.dimmed(),
        };
        if let Some(selftext) = post.selftext.as_deref().filter(|text| !text.is_empty()) {
            view.push_str("\n\n");
            view.push_str(selftext);
        }
        view
    }
}

impl Viewable for CommentRecord {
    fn view(&self) -> String {
        let indent = "  ".repeat(self.depth);
        let author = format!("u/{}", self.author.as_deref().unwrap_or("[deleted]"));
        let mut view = format!(
            "{indent}{} {} · {}\n",
            format!("[{}]", self.score).bold(),
            author.dimmed(),
            self.created_date.dimmed(),
        );
        for line in self.body.lines() {
            view.push_str(&format!("{indent}  {line}\n"));
        }
        view
    }
}

impl Viewable for SubredditRecord {
    fn view(&self) -> String {
        let members = match self.subscriber_count {
            Some(count) if count > 0 => thousands(count),
            _ => String::from("?"),
        };
        let mut view = format!(
            "{} ({members} members)",
            format!("r/{}", self.name).cyan()
        );
        if !self.description.is_empty() {
            let description = truncate(&self.description, DESCRIPTION_WIDTH);
            view.push_str(&format!("\n  {}", description.dimmed()));
        }
        view.push_str(&format!("\n  {}", self.url.dimmed()));
        view
    }
}
