//! Environment and configuration utilities.
//!
//! Credentials can live in dotenv-style files or in the user's shell
//! profile. A `.zshrc` is not a well-formed dotenv file, so each line is
//! handed to [`dotenvy`] on its own: assignments it understands are kept
//! and everything else is counted as skipped.

use log::trace;
use regex::Regex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::{env, fs, io};

static ASSIGNMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:export\s+)?([A-Za-z_][A-Za-z0-9_]*)=(.*)$")
        .expect("assignment regex is valid")
});

/// A source of environment variables.
///
/// The real process environment is [`ProcessEnvironment`]; tests can use
/// a `HashMap<String, String>` instead.
pub trait Environment {
    /// The value of the variable `key`, if it is set.
    fn var(&self, key: &str) -> Option<String>;
}

/// Reads variables from the environment of the running process.
#[derive(Debug, Default)]
pub struct ProcessEnvironment;

impl Environment for ProcessEnvironment {
    fn var(&self, key: &str) -> Option<String> {
        env::var(key).ok()
    }
}

impl Environment for HashMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

/// A source of configuration file contents.
pub trait FileSource {
    /// Reads the file at `path`.
    ///
    /// Returns `Ok(None)` if the file does not exist.
    fn read(&self, path: &Path) -> io::Result<Option<String>>;
}

/// Reads configuration files from the local filesystem.
#[derive(Debug, Default)]
pub struct Filesystem;

impl FileSource for Filesystem {
    fn read(&self, path: &Path) -> io::Result<Option<String>> {
        match fs::read_to_string(path) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }
}

/// Variables parsed from a dotenv-style file.
#[derive(Debug, Default, PartialEq)]
pub struct EnvFile {
    vars: HashMap<String, String>,
    skipped: usize,
}

impl EnvFile {
    /// Parses `text` as a sequence of `KEY=value` or `export KEY=value` lines.
    ///
    /// Blank lines and `#` comments are ignored. Any other line that is not
    /// a simple assignment is skipped and counted in [`EnvFile::skipped()`].
    /// Quoting and `$NAME` expansion follow [`dotenvy`], with names expanded
    /// from the process environment. Lines that run commands are skipped.
    /// When a key is assigned more than once, the last assignment wins,
    /// just as it would in a shell.
    ///
    /// # Examples
    ///
    /// ```
    /// use reddit_cli::conf::EnvFile;
    /// let file = EnvFile::parse("export A=1\nif [ -n \"$X\" ]; then\nB='two'\nfi\n");
    /// assert_eq!(file.get("A"), Some("1"));
    /// assert_eq!(file.get("B"), Some("two"));
    /// assert_eq!(file.skipped(), 2);
    /// ```
    pub fn parse(text: &str) -> Self {
        let mut vars = HashMap::new();
        let mut skipped = 0;

        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            match parse_line(line) {
                Ok((key, value)) => {
                    vars.insert(key, value);
                }
                Err(reason) => {
                    trace!("skipping unparseable line ({reason}): {line}");
                    skipped += 1;
                }
            }
        }

        Self { vars, skipped }
    }

    /// The value assigned to `key`, if any.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Number of variables that were successfully parsed.
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    /// True if no variables could be parsed.
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Number of non-blank, non-comment lines that could not be parsed.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Consumes the file and returns its variables.
    pub fn into_vars(self) -> HashMap<String, String> {
        self.vars
    }
}

fn parse_line(line: &str) -> Result<(String, String), String> {
    let Some(caps) = ASSIGNMENT.captures(line) else {
        return Err(String::from("not an assignment"));
    };
    let (key, value) = (&caps[1], &caps[2]);
    if substitutes_commands(value) {
        return Err(String::from("command substitution"));
    }
    let assignment = format!("{key}={value}");
    match dotenvy::from_read_iter(assignment.as_bytes()).next() {
        Some(parsed) => parsed.map_err(|err| err.to_string()),
        None => Err(String::from("no assignment found")),
    }
}

/// True if `value` runs a command through backticks or `$(...)` outside
/// single quotes.
fn substitutes_commands(value: &str) -> bool {
    let (mut single, mut double) = (false, false);
    let mut chars = value.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '\'' if !double => single = !single,
            '"' if !single => double = !double,
            '`' if !single => return true,
            '$' if !single && chars.peek() == Some(&'(') => return true,
            _ => {}
        }
    }
    false
}

/// Ordered list of files that may contain credentials.
///
/// In precedence order: an explicitly configured path, the tool's own
/// config file, a generic secrets file, then shell profiles.
#[derive(Clone, Debug, PartialEq)]
pub struct Candidates {
    paths: Vec<PathBuf>,
}

impl Candidates {
    /// Shell profiles searched after the dedicated config files, most
    /// specific first.
    pub const PROFILES: [&'static str; 4] = [".zshrc", ".bashrc", ".bash_profile", ".profile"];

    /// The standard candidate list for the given home directory.
    ///
    /// `explicit`, if given, is checked before anything else. Without a
    /// home directory, only the explicit path is searched.
    pub fn standard(home: Option<&Path>, explicit: Option<PathBuf>) -> Self {
        let mut paths: Vec<PathBuf> = explicit.into_iter().collect();
        if let Some(home) = home {
            paths.push(Self::config_path(home));
            paths.push(home.join(".secrets"));
            paths.extend(Self::PROFILES.iter().map(|profile| home.join(profile)));
        }
        Self { paths }
    }

    /// Candidate list built from `$HOME` in `env`.
    pub fn from_env(env: &impl Environment, explicit: Option<PathBuf>) -> Self {
        let home = env.var("HOME").filter(|home| !home.is_empty()).map(PathBuf::from);
        Self::standard(home.as_deref(), explicit)
    }

    /// An arbitrary list of candidates, checked in the given order.
    pub fn new(paths: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        let paths = paths.into_iter().map(Into::into).collect();
        Self { paths }
    }

    /// The tool's dedicated config file under `home`.
    pub fn config_path(home: &Path) -> PathBuf {
        home.join(".config").join("reddit-cli").join(".env")
    }

    /// Iterates over the candidate paths in precedence order.
    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.paths.iter().map(PathBuf::as_path)
    }

    /// The highest-precedence candidate, if any.
    pub fn first(&self) -> Option<&Path> {
        self.paths.first().map(PathBuf::as_path)
    }
}
