//! Client identity sent in the connect descriptor
//!
//! The server records who connected through the `CID` block of the connect
//! string. Values are taken from the host once per process; because `(`,
//! `)` and `=` delimit the descriptor grammar they are replaced with `?`.

use std::path::Path;

use once_cell::sync::OnceCell;

/// Placeholder reported for the terminal
pub const UNKNOWN_TERMINAL: &str = "unknown";

static CURRENT: OnceCell<ConnectIdentity> = OnceCell::new();

/// Host facts identifying this client process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectIdentity {
    program: String,
    machine: String,
    user: String,
    pid: u32,
    terminal: String,
}

impl ConnectIdentity {
    /// Identity of the running process, computed on first use
    pub fn current() -> &'static ConnectIdentity {
        CURRENT.get_or_init(Self::from_host)
    }

    /// Build an identity from explicit values, sanitizing the text fields
    pub fn new(program: &str, machine: &str, user: &str, pid: u32) -> Self {
        Self {
            program: sanitize(program),
            machine: sanitize(machine),
            user: sanitize(user),
            pid,
            terminal: UNKNOWN_TERMINAL.to_string(),
        }
    }

    fn from_host() -> Self {
        let program = std::env::current_exe()
            .ok()
            .as_deref()
            .and_then(Path::file_name)
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let machine = hostname::get()
            .map(|h| h.to_string_lossy().into_owned())
            .unwrap_or_default();
        let user = std::env::var("USER")
            .or_else(|_| std::env::var("USERNAME"))
            .unwrap_or_default();
        Self::new(&program, &machine, &user, std::process::id())
    }

    /// Program name
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Machine (host) name
    pub fn machine(&self) -> &str {
        &self.machine
    }

    /// Operating system user
    pub fn user(&self) -> &str {
        &self.user
    }

    /// Process id
    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Terminal name, always [`UNKNOWN_TERMINAL`]
    pub fn terminal(&self) -> &str {
        &self.terminal
    }

    /// `(CID=...)` fragment of the connect descriptor
    pub fn cid(&self) -> String {
        format!(
            "(CID=(PROGRAM={})(HOST={})(USER={}))",
            self.program, self.machine, self.user
        )
    }
}

/// Replace the descriptor delimiters `(`, `)` and `=` with `?`
pub fn sanitize(value: &str) -> String {
    value
        .chars()
        .map(|c| match c {
            '(' | ')' | '=' => '?',
            other => other,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize("a(b)c=d"), "a?b?c?d");
        assert_eq!(sanitize("plain-name.exe"), "plain-name.exe");
        assert_eq!(sanitize(""), "");
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        let once = sanitize("x=(y)");
        assert_eq!(sanitize(&once), once);
    }

    #[test]
    fn test_sanitize_preserves_other_chars() {
        let input = "ü(ñ)=é";
        let out = sanitize(input);
        assert_eq!(out.chars().count(), input.chars().count());
        assert_eq!(out, "ü?ñ??é");
    }

    #[test]
    fn test_new_sanitizes_fields() {
        let id = ConnectIdentity::new("app(1)", "host=a", "us)er", 42);
        assert_eq!(id.program(), "app?1?");
        assert_eq!(id.machine(), "host?a");
        assert_eq!(id.user(), "us?er");
        assert_eq!(id.pid(), 42);
        assert_eq!(id.terminal(), UNKNOWN_TERMINAL);
        assert_eq!(id.cid(), "(CID=(PROGRAM=app?1?)(HOST=host?a)(USER=us?er))");
    }

    #[test]
    fn test_current_is_memoized() {
        let a = ConnectIdentity::current();
        let b = ConnectIdentity::current();
        assert!(std::ptr::eq(a, b));
        assert_eq!(a.pid(), std::process::id());
        assert!(!a.program().contains(['(', ')', '=']));
    }
}
