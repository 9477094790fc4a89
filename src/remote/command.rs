//! Remote command construction
//!
//! Commands are built from argument arrays and rendered to a single POSIX
//! shell line with every argument quoted, so paths, URLs and commit messages
//! never reach the remote shell unescaped.

use std::borrow::Cow;
use std::fmt;

/// A shell command line for the remote host.
///
/// Consists of one or more invocations joined with `&&`, optionally followed
/// by a literal `||` fallback. Only `&'static str` is accepted as raw shell
/// text, so user input cannot reach the shell unquoted. Quoting does not stop
/// the invoked program from reading a `-`-prefixed word as an option; callers
/// anchor paths with [`normalize_path`](super::normalize_path) and put `--`
/// before free-form operands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteCommand {
    segments: Vec<Vec<String>>,
    fallback: Option<&'static str>,
}

impl RemoteCommand {
    /// Start a command invoking `program`
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            segments: vec![vec![program.into()]],
            fallback: None,
        }
    }

    /// Shorthand for `git <args...>`
    pub fn git<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new("git").args(args)
    }

    /// An operator-supplied shell script, passed as one quoted argument to `sh -c`
    pub fn script(script: impl Into<String>) -> Self {
        Self::new("sh").arg("-c").arg(script)
    }

    /// Append an argument to the current invocation
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        if let Some(last) = self.segments.last_mut() {
            last.push(arg.into());
        }
        self
    }

    /// Append several arguments to the current invocation
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for arg in args {
            self = self.arg(arg);
        }
        self
    }

    /// Run the whole command from `dir` (`cd <dir> && ...`)
    pub fn in_dir(mut self, dir: impl Into<String>) -> Self {
        self.segments.insert(0, vec!["cd".to_string(), dir.into()]);
        self
    }

    /// Chain another invocation that only runs if the previous ones succeed
    pub fn and_then(mut self, program: impl Into<String>) -> Self {
        self.segments.push(vec![program.into()]);
        self
    }

    /// Literal shell text to run when the chain fails (`|| <fallback>`)
    pub fn or_else(mut self, fallback: &'static str) -> Self {
        self.fallback = Some(fallback);
        self
    }

    /// Render the quoted shell line
    pub fn render(&self) -> String {
        let mut line = self
            .segments
            .iter()
            .map(|words| {
                words
                    .iter()
                    .map(|w| quote(w))
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect::<Vec<_>>()
            .join(" && ");

        if let Some(fallback) = self.fallback {
            line.push_str(" || ");
            line.push_str(fallback);
        }
        line
    }
}

impl fmt::Display for RemoteCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

fn is_safe(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '/' | ':' | '@' | '%' | '+' | '=' | ',')
}

/// Quote a single word for a POSIX shell.
///
/// Words made only of safe characters pass through bare; everything else is
/// wrapped in single quotes. A leading `~/` stays unquoted so home-relative
/// paths still expand.
pub fn quote(word: &str) -> Cow<'_, str> {
    if !word.is_empty() && word.chars().all(is_safe) {
        return Cow::Borrowed(word);
    }
    if let Some(rest) = word.strip_prefix("~/") {
        return Cow::Owned(format!("~/{}", quote(rest)));
    }
    Cow::Owned(format!("'{}'", word.replace('\'', r"'\''")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_words_stay_bare() {
        let cmd = RemoteCommand::git(["clone", "-b", "main", "https://github.com/acme/widget.git"])
            .in_dir("/root/projects");
        assert_eq!(
            cmd.render(),
            "cd /root/projects && git clone -b main https://github.com/acme/widget.git"
        );
    }

    #[test]
    fn test_arguments_are_quoted() {
        let cmd = RemoteCommand::git(["commit", "-m", "fix: handle it's edge case"]).in_dir("/srv/my repo");
        assert_eq!(
            cmd.render(),
            r"cd '/srv/my repo' && git commit -m 'fix: handle it'\''s edge case'"
        );
    }

    #[test]
    fn test_injection_is_neutralized() {
        let cmd = RemoteCommand::new("rm").args(["-rf", "/tmp/x; rm -rf /"]);
        assert_eq!(cmd.render(), "rm -rf '/tmp/x; rm -rf /'");

        let cmd = RemoteCommand::git(["commit", "-m", "$(reboot)"]);
        assert_eq!(cmd.render(), "git commit -m '$(reboot)'");
    }

    #[test]
    fn test_chain_and_fallback() {
        let cmd = RemoteCommand::new("test")
            .args(["-d", "/tmp/proj"])
            .and_then("echo")
            .arg("exists")
            .or_else("echo 'not exists'");
        assert_eq!(
            cmd.render(),
            "test -d /tmp/proj && echo exists || echo 'not exists'"
        );
    }

    #[test]
    fn test_script_is_one_argument() {
        let cmd = RemoteCommand::script("df -h | tail -1");
        assert_eq!(cmd.render(), "sh -c 'df -h | tail -1'");
    }

    #[test]
    fn test_quote_edge_cases() {
        assert_eq!(quote(""), "''");
        assert_eq!(quote("{}"), "'{}'");
        assert_eq!(quote(";"), "';'");
        assert_eq!(quote("~/projects"), "~/projects");
        assert_eq!(quote("~/my projects"), "~/'my projects'");
    }
}
