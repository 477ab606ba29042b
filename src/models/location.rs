//! Local or remote path addressing
//!
//! A location is written either as `/abs/path` (local) or `host-spec:/abs/path`
//! (remote). The first colon splits the host from the path.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::HardsnapError;

/// A path tagged with the host it lives on
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Location {
    host: Option<String>,
    path: String,
}

impl Location {
    /// Parse a `[host:]path` string
    pub fn parse(spec: &str) -> Self {
        match spec.split_once(':') {
            Some((host, path)) => Self {
                host: Some(host.to_string()),
                path: path.to_string(),
            },
            None => Self {
                host: None,
                path: spec.to_string(),
            },
        }
    }

    /// A location on the local machine
    pub fn local(path: impl Into<String>) -> Self {
        Self {
            host: None,
            path: path.into(),
        }
    }

    /// A location on a remote host
    pub fn remote(host: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            host: Some(host.into()),
            path: path.into(),
        }
    }

    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    /// Path component without the host prefix
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Same location with trailing path separators stripped
    ///
    /// The root directory stays `/`.
    pub fn trimmed(&self) -> Self {
        let stripped = self.path.trim_end_matches('/');
        let path = if stripped.is_empty() && self.path.starts_with('/') {
            "/".to_string()
        } else {
            stripped.to_string()
        };
        Self {
            host: self.host.clone(),
            path,
        }
    }

    /// Child location `self/name` on the same host
    pub fn join(&self, name: &str) -> Self {
        let base = self.trimmed();
        let path = if base.path.is_empty() {
            name.to_string()
        } else if base.path.ends_with('/') {
            format!("{}{}", base.path, name)
        } else {
            format!("{}/{}", base.path, name)
        };
        Self {
            host: self.host.clone(),
            path,
        }
    }

    /// Parent directory on the same host
    ///
    /// A bare relative name has the parent `.`.
    pub fn parent(&self) -> Self {
        let base = self.trimmed();
        let path = match base.path.rfind('/') {
            Some(0) => "/".to_string(),
            Some(idx) => base.path[..idx].to_string(),
            None => ".".to_string(),
        };
        Self {
            host: self.host.clone(),
            path,
        }
    }

    /// Last path component
    pub fn file_name(&self) -> &str {
        let path = self.path.trim_end_matches('/');
        path.rsplit('/').next().unwrap_or(path)
    }

    /// Same location with `suffix` appended to the last component
    pub fn with_suffix(&self, suffix: &str) -> Self {
        let base = self.trimmed();
        Self {
            host: base.host,
            path: format!("{}{}", base.path, suffix),
        }
    }

    /// Lexically normalised path: `.` removed, `..` resolved, no duplicate separators
    pub fn normalized_path(&self) -> String {
        let absolute = self.path.starts_with('/');
        let mut parts: Vec<&str> = Vec::new();
        for component in self.path.split('/') {
            match component {
                "" | "." => {}
                ".." => {
                    if matches!(parts.last(), Some(last) if *last != "..") {
                        parts.pop();
                    } else if !absolute {
                        parts.push("..");
                    }
                }
                other => parts.push(other),
            }
        }
        let joined = parts.join("/");
        if absolute {
            format!("/{}", joined)
        } else if joined.is_empty() {
            ".".to_string()
        } else {
            joined
        }
    }

    /// Whether both locations address the same directory on the same host
    pub fn same_as(&self, other: &Location) -> bool {
        self.host == other.host && self.normalized_path() == other.normalized_path()
    }

    /// Whether `self` lies strictly below `parent` on the same host
    pub fn is_inside(&self, parent: &Location) -> bool {
        if self.host != parent.host {
            return false;
        }
        let parent_path = parent.normalized_path();
        let prefix = if parent_path.ends_with('/') {
            parent_path
        } else {
            format!("{}/", parent_path)
        };
        self.normalized_path().starts_with(&prefix)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.host {
            Some(host) => write!(f, "{}:{}", host, self.path),
            None => write!(f, "{}", self.path),
        }
    }
}

impl FromStr for Location {
    type Err = HardsnapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Err(HardsnapError::Parse("Empty location".into()));
        }
        Ok(Self::parse(s))
    }
}

impl TryFrom<String> for Location {
    type Error = HardsnapError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Location> for String {
    fn from(location: Location) -> Self {
        location.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_local_and_remote() {
        let local = Location::parse("/srv/data");
        assert_eq!(local.host(), None);
        assert_eq!(local.path(), "/srv/data");

        let remote = Location::parse("backup@nas:/volume1/snapshots");
        assert_eq!(remote.host(), Some("backup@nas"));
        assert_eq!(remote.path(), "/volume1/snapshots");
        assert_eq!(remote.to_string(), "backup@nas:/volume1/snapshots");
    }

    #[test]
    fn test_first_colon_splits() {
        let remote = Location::parse("host:/a:b");
        assert_eq!(remote.host(), Some("host"));
        assert_eq!(remote.path(), "/a:b");
    }

    #[test]
    fn test_trimmed() {
        assert_eq!(Location::parse("/a/b///").trimmed().path(), "/a/b");
        assert_eq!(Location::parse("h:/a/").trimmed().to_string(), "h:/a");
        assert_eq!(Location::parse("/").trimmed().path(), "/");
    }

    #[test]
    fn test_join_parent_suffix() {
        let loc = Location::parse("h:/data/src/");
        assert_eq!(loc.join("12345678.tmp").to_string(), "h:/data/src/12345678.tmp");
        assert_eq!(loc.parent().to_string(), "h:/data");
        assert_eq!(loc.with_suffix(".tmp").to_string(), "h:/data/src.tmp");
        assert_eq!(Location::parse("/top").parent().path(), "/");
        assert_eq!(Location::parse("/").join("x").path(), "/x");
        assert_eq!(Location::parse("rel").parent().path(), ".");
        assert_eq!(loc.file_name(), "src");
    }

    #[test]
    fn test_normalized_path() {
        assert_eq!(Location::parse("/a/./b//c/../d/").normalized_path(), "/a/b/d");
        assert_eq!(Location::parse("/../x").normalized_path(), "/x");
        assert_eq!(Location::parse("a/../../b").normalized_path(), "../b");
        assert_eq!(Location::parse("./").normalized_path(), ".");
    }

    #[test]
    fn test_same_as() {
        assert!(Location::parse("/a/b/").same_as(&Location::parse("/a/./b")));
        assert!(!Location::parse("h:/a").same_as(&Location::parse("/a")));
        assert!(!Location::parse("h1:/a").same_as(&Location::parse("h2:/a")));
    }

    #[test]
    fn test_is_inside() {
        let parent = Location::parse("/home/user");
        assert!(Location::parse("/home/user/backups").is_inside(&parent));
        assert!(!Location::parse("/home/user").is_inside(&parent));
        assert!(!Location::parse("/home/username").is_inside(&parent));
        assert!(!Location::parse("h:/home/user/x").is_inside(&parent));
        assert!(Location::parse("/anything").is_inside(&Location::parse("/")));
    }

    #[test]
    fn test_serde_as_string() {
        let loc = Location::parse("nas:/snap");
        let json = serde_json::to_string(&loc).unwrap();
        assert_eq!(json, r#""nas:/snap""#);
        let back: Location = serde_json::from_str(&json).unwrap();
        assert_eq!(back, loc);
    }
}
