//! Shell command construction helpers
//!
//! Quoting of paths inside bash command strings and wrapping of commands for
//! execution on a remote host over ssh.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::models::Location;

/// Options for reaching remote hosts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionOptions {
    /// Identity file passed to ssh with `-i`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh_key: Option<PathBuf>,
}

impl ConnectionOptions {
    pub fn with_ssh_key(ssh_key: Option<PathBuf>) -> Self {
        Self { ssh_key }
    }

    /// Wrap `command` so that it runs on `host`, or return it unchanged for local execution
    pub fn wrap_remote(&self, host: Option<&str>, command: &str) -> String {
        match host {
            Some(host) => {
                let key = self
                    .ssh_key
                    .as_ref()
                    .map(|key| format!(" -i {}", quote(&key.to_string_lossy())))
                    .unwrap_or_default();
                format!(
                    "ssh{} -q {} \"{}\"",
                    key,
                    host,
                    escape_double_quoted(command)
                )
            }
            None => command.to_string(),
        }
    }

    /// rsync `-e` option selecting the ssh identity, if one is configured
    pub fn rsync_remote_shell(&self) -> Option<String> {
        self.ssh_key
            .as_ref()
            .map(|key| format!("-e \"ssh -i '{}'\"", key.to_string_lossy()))
    }
}

/// Escape characters special inside double quotes ($, `, \, ")
pub fn escape_double_quoted(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('$', "\\$")
        .replace('`', "\\`")
}

/// Double-quote a string for bash
pub fn quote(s: &str) -> String {
    format!("\"{}\"", escape_double_quoted(s))
}

/// Quote a location for use as an rsync argument
///
/// Remote paths additionally get their spaces backslash-escaped, since rsync
/// passes the remote part through the remote shell again.
pub fn quote_rsync_arg(location: &Location, trailing_slash: bool) -> String {
    let mut rendered = match location.host() {
        Some(host) => format!("{}:{}", host, location.path().replace(' ', "\\ ")),
        None => location.path().to_string(),
    };
    if trailing_slash && !rendered.ends_with('/') {
        rendered.push('/');
    }
    quote(&rendered)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_command_unchanged() {
        let options = ConnectionOptions::default();
        assert_eq!(options.wrap_remote(None, "rm -rf \"/x\""), "rm -rf \"/x\"");
    }

    #[test]
    fn test_remote_command_wrapped() {
        let options = ConnectionOptions::default();
        assert_eq!(
            options.wrap_remote(Some("me@nas"), "rm -rf \"/x\""),
            "ssh -q me@nas \"rm -rf \\\"/x\\\"\""
        );
    }

    #[test]
    fn test_remote_command_with_key() {
        let options = ConnectionOptions::with_ssh_key(Some(PathBuf::from("/keys/id_backup")));
        assert_eq!(
            options.wrap_remote(Some("nas"), "true"),
            "ssh -i \"/keys/id_backup\" -q nas \"true\""
        );
        assert_eq!(
            options.rsync_remote_shell().unwrap(),
            "-e \"ssh -i '/keys/id_backup'\""
        );
    }

    #[test]
    fn test_quote_escapes_specials() {
        assert_eq!(quote("a \"b\" $c `d`"), "\"a \\\"b\\\" \\$c \\`d\\`\"");
    }

    #[test]
    fn test_quote_rsync_arg() {
        assert_eq!(
            quote_rsync_arg(&Location::parse("/my data"), true),
            "\"/my data/\""
        );
        assert_eq!(
            quote_rsync_arg(&Location::parse("nas:/my data"), false),
            "\"nas:/my\\\\ data\""
        );
    }
}
