//! Default file locations and path expansion.
//!
//! Defaults are computed from one input, the application home directory,
//! so tests can point the whole daemon at a temporary directory.

use std::path::{Component, Path, PathBuf};

/// Application name used for the home directory.
pub const APP_NAME: &str = "nmcd";

pub const DEFAULT_CONFIG_FILENAME: &str = "nmcd.conf";
pub const DEFAULT_DATA_DIRNAME: &str = "data";
pub const DEFAULT_LOG_DIRNAME: &str = "logs";

/// Default on-disk locations derived from the home directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Defaults {
    pub home_dir: PathBuf,
    pub config_file: PathBuf,
    pub data_dir: PathBuf,
    pub log_dir: PathBuf,
    pub rpc_key: PathBuf,
    pub rpc_cert: PathBuf,
}

impl Defaults {
    /// Derive every default path from `home_dir`.
    pub fn from_home(home_dir: impl Into<PathBuf>) -> Self {
        let home_dir = home_dir.into();
        Self {
            config_file: home_dir.join(DEFAULT_CONFIG_FILENAME),
            data_dir: home_dir.join(DEFAULT_DATA_DIRNAME),
            log_dir: home_dir.join(DEFAULT_LOG_DIRNAME),
            rpc_key: home_dir.join("rpc.key"),
            rpc_cert: home_dir.join("rpc.cert"),
            home_dir,
        }
    }

    /// Defaults rooted at the platform application-data directory.
    pub fn from_app_data_dir() -> Self {
        Self::from_home(app_data_dir(APP_NAME))
    }

    /// Expand `~` and environment variables in `path`, then clean it.
    ///
    /// `~` stands for the directory that contains the home directory, which
    /// is the user's home on Unix-like systems.
    pub fn expand_path(&self, path: &str) -> PathBuf {
        let path = match path.strip_prefix('~') {
            Some(rest) => {
                let base = self.home_dir.parent().unwrap_or(&self.home_dir);
                format!("{}{}", base.display(), rest)
            }
            None => path.to_string(),
        };
        clean_path(Path::new(&expand_env(&path)))
    }
}

/// Per-user directory for application data.
///
/// `~/.nmcd` on Unix-like systems, `<local data dir>/Nmcd` on Windows and
/// macOS. Falls back to the current directory when no home can be found.
pub fn app_data_dir(app: &str) -> PathBuf {
    let app = app.trim_start_matches('.');
    if app.is_empty() {
        return PathBuf::from(".");
    }

    if cfg!(any(windows, target_os = "macos")) {
        let mut chars = app.chars();
        let capitalized: String = chars
            .next()
            .map(|c| c.to_uppercase().chain(chars).collect())
            .unwrap_or_default();
        if let Some(dir) = dirs::data_local_dir() {
            return dir.join(capitalized);
        }
    }

    match dirs::home_dir() {
        Some(home) => home.join(format!(".{app}")),
        None => PathBuf::from("."),
    }
}

/// Replace `$VAR` and `${VAR}` with their environment values.
///
/// Unset variables expand to the empty string.
pub fn expand_env(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if c != '$' {
            out.push(c);
            continue;
        }

        let rest = &s[i + 1..];
        let (name, consumed) = if let Some(braced) = rest.strip_prefix('{') {
            match braced.find('}') {
                Some(end) => (&braced[..end], end + 2),
                None => {
                    out.push(c);
                    continue;
                }
            }
        } else {
            let len = rest
                .find(|ch: char| !(ch.is_ascii_alphanumeric() || ch == '_'))
                .unwrap_or(rest.len());
            (&rest[..len], len)
        };

        if consumed == 0 {
            out.push(c);
            continue;
        }

        out.push_str(&std::env::var(name).unwrap_or_default());
        for _ in 0..rest[..consumed].chars().count() {
            chars.next();
        }
    }
    out
}

/// Lexically clean a path: drop `.`, resolve `..` against earlier
/// components, collapse separators. An empty result becomes `.`.
pub fn clean_path(path: &Path) -> PathBuf {
    let mut out: Vec<Component<'_>> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.last() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(component),
            },
            other => out.push(other),
        }
    }

    if out.is_empty() {
        return PathBuf::from(".");
    }
    out.iter().collect()
}
