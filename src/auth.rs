// SPDX-License-Identifier: Apache-2.0
// Copyright (C) 2025 Michael Dippery <michael@monkey-robot.com>

//! Reddit API credentials.
//!
//! Reddit's API requires an OAuth "script" app. Its client ID and secret
//! are read from the environment, or failing that from a list of
//! [candidate files](crate::conf::Candidates). Once resolved, credentials
//! are passed explicitly to whatever needs them; the process environment
//! is never modified.

use crate::conf::{Candidates, EnvFile, Environment, FileSource, Filesystem, ProcessEnvironment};
use log::{debug, warn};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::{error, fmt};

/// Environment variable holding the app's client ID.
pub const CLIENT_ID: &str = "REDDIT_CLIENT_ID";

/// Environment variable holding the app's client secret.
pub const CLIENT_SECRET: &str = "REDDIT_CLIENT_SECRET";

/// Environment variable that overrides the default user agent.
pub const USER_AGENT: &str = "REDDIT_USER_AGENT";

/// Credentials for Reddit's OAuth API.
#[derive(Clone, PartialEq)]
pub struct Credentials {
    client_id: String,
    client_secret: String,
    user_agent: String,
}

impl Credentials {
    /// Creates credentials from a client ID and secret, using the
    /// [default user agent](Credentials::default_user_agent).
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            user_agent: Self::default_user_agent(),
        }
    }

    /// Replaces the user agent sent with every request.
    pub fn with_user_agent(self, user_agent: impl Into<String>) -> Self {
        let user_agent = user_agent.into();
        Self { user_agent, ..self }
    }

    /// The user agent used when `$REDDIT_USER_AGENT` is not set.
    ///
    /// # Examples
    ///
    /// ```
    /// use reddit_cli::auth::Credentials;
    /// assert!(Credentials::default_user_agent().starts_with("reddit-cli v"));
    /// ```
    pub fn default_user_agent() -> String {
        format!("{} v{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
    }

    /// The OAuth app's client ID.
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// The OAuth app's client secret.
    pub fn client_secret(&self) -> &str {
        &self.client_secret
    }

    /// User agent to send with requests.
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

/// Where a set of credentials was found.
#[derive(Clone, Debug, PartialEq)]
pub enum Source {
    /// The client ID came from the process environment.
    Environment,

    /// The client ID was found in this file.
    File(PathBuf),
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Environment => write!(f, "environment"),
            Source::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Credentials along with the place they were found.
#[derive(Clone, Debug, PartialEq)]
pub struct Resolved {
    /// The credentials themselves.
    pub credentials: Credentials,

    /// Where the client ID was found.
    pub source: Source,
}

/// Finds Reddit credentials.
///
/// If `$REDDIT_CLIENT_ID` is set in the environment, the environment is
/// used exclusively and no file is read. Otherwise each
/// [candidate](Candidates) is read in turn, and its variables are layered
/// beneath the ones already known (earlier sources always win), until the
/// client ID turns up.
///
/// A successful resolution is cached, so resolving twice does no extra
/// file I/O.
#[derive(Debug)]
pub struct CredentialResolver<E = ProcessEnvironment, F = Filesystem> {
    env: E,
    files: F,
    candidates: Candidates,
    resolved: OnceLock<Resolved>,
}

impl CredentialResolver {
    /// A resolver for the current process.
    ///
    /// `explicit` is an additional config file to check before the
    /// standard locations.
    pub fn new(explicit: Option<PathBuf>) -> Self {
        let env = ProcessEnvironment;
        let candidates = Candidates::from_env(&env, explicit);
        Self::with_sources(env, Filesystem, candidates)
    }
}

impl<E: Environment, F: FileSource> CredentialResolver<E, F> {
    /// A resolver that reads variables from `env` and files from `files`.
    pub fn with_sources(env: E, files: F, candidates: Candidates) -> Self {
        Self {
            env,
            files,
            candidates,
            resolved: OnceLock::new(),
        }
    }

    /// Files that are searched for credentials, in precedence order.
    pub fn candidates(&self) -> &Candidates {
        &self.candidates
    }

    /// Resolves credentials.
    ///
    /// Returns [`MissingCredentials`] if either the client ID or the client
    /// secret cannot be found, or is empty.
    pub fn resolve(&self) -> Result<Resolved, MissingCredentials> {
        if let Some(resolved) = self.resolved.get() {
            return Ok(resolved.clone());
        }
        let resolved = self.load()?;
        Ok(self.resolved.get_or_init(|| resolved).clone())
    }

    fn load(&self) -> Result<Resolved, MissingCredentials> {
        let mut vars = LayeredVars::new(&self.env);
        let mut source = Source::Environment;

        if vars.get(CLIENT_ID).is_some() {
            debug!("using credentials from the environment");
        } else {
            for path in self.candidates.iter() {
                let Some(file) = self.read(path) else {
                    continue;
                };
                vars.layer(file);
                if vars.get(CLIENT_ID).is_some() {
                    debug!("found {CLIENT_ID} in {}", path.display());
                    source = Source::File(path.to_path_buf());
                    break;
                }
            }
        }

        let client_id = vars.get(CLIENT_ID);
        let client_secret = vars.get(CLIENT_SECRET);
        match (client_id, client_secret) {
            (Some(client_id), Some(client_secret)) => {
                let credentials = Credentials::new(client_id, client_secret);
                let credentials = match vars.get(USER_AGENT) {
                    Some(user_agent) => credentials.with_user_agent(user_agent),
                    None => credentials,
                };
                Ok(Resolved {
                    credentials,
                    source,
                })
            }
            (client_id, client_secret) => {
                let missing = [(CLIENT_ID, client_id), (CLIENT_SECRET, client_secret)]
                    .into_iter()
                    .filter(|(_, value)| value.is_none())
                    .map(|(name, _)| name)
                    .collect();
                let config_path = self.candidates.first().map(Path::to_path_buf);
                Err(MissingCredentials {
                    missing,
                    config_path,
                })
            }
        }
    }

    fn read(&self, path: &Path) -> Option<EnvFile> {
        match self.files.read(path) {
            Ok(Some(contents)) => {
                let file = EnvFile::parse(&contents);
                debug!(
                    "read {} variables from {} ({} lines skipped)",
                    file.len(),
                    path.display(),
                    file.skipped()
                );
                Some(file)
            }
            Ok(None) => None,
            Err(err) => {
                warn!("could not read {}: {err}", path.display());
                None
            }
        }
    }
}

/// Variables from the environment layered over variables from files.
///
/// Values are trimmed, and empty values count as unset.
struct LayeredVars<'a, E> {
    env: &'a E,
    files: HashMap<String, String>,
}

impl<'a, E: Environment> LayeredVars<'a, E> {
    fn new(env: &'a E) -> Self {
        let files = HashMap::new();
        Self { env, files }
    }

    /// Adds variables beneath the existing layers, never overwriting a
    /// variable that is already set.
    fn layer(&mut self, file: EnvFile) {
        for (key, value) in file.into_vars() {
            self.files.entry(key).or_insert(value);
        }
    }

    fn get(&self, key: &str) -> Option<String> {
        let non_empty = |value: &str| {
            let value = value.trim();
            (!value.is_empty()).then(|| value.to_string())
        };
        self.env
            .var(key)
            .and_then(|value| non_empty(&value))
            .or_else(|| self.files.get(key).and_then(|value| non_empty(value)))
    }
}

/// Reddit credentials could not be found.
#[derive(Debug)]
pub struct MissingCredentials {
    missing: Vec<&'static str>,
    config_path: Option<PathBuf>,
}

impl MissingCredentials {
    /// Names of the variables that could not be found.
    pub fn missing(&self) -> &[&'static str] {
        &self.missing
    }

    fn remediation(&self) -> String {
        let config_path = self
            .config_path
            .as_ref()
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| String::from("~/.config/reddit-cli/.env"));
        indoc::formatdoc! {"
            Error: Missing {missing}.

            Create a Reddit app (script type, read-only is fine) at:
              https://www.reddit.com/prefs/apps

            Then add credentials to {config_path}:
              {CLIENT_ID}=your_client_id
              {CLIENT_SECRET}=your_client_secret

            Or export them as environment variables before running reddit-cli.",
            missing = self.missing.join(" and "),
        }
    }
}

impl fmt::Display for MissingCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.remediation())
    }
}

impl error::Error for MissingCredentials {}
