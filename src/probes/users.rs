//! Activity probe: a logged-in user/terminal/host combination matches
//! configured regular expressions.
//!
//! Grounded on `Users` in the original Python daemon. Session listing goes
//! through the `who` command rather than a utmp-parsing crate the
//! dependency stack doesn't carry.

use regex::Regex;

use crate::config::ConfigurationError;
use crate::probe::{ActivityProbe, ProbeError};
use crate::probes::util::optional_str_or;

pub struct Users {
    name: String,
    user_regex: Regex,
    terminal_regex: Regex,
    host_regex: Regex,
}

fn compile(name: &str, key: &'static str, pattern: &str) -> Result<Regex, ConfigurationError> {
    Regex::new(&format!("^(?:{pattern})$")).map_err(|err| ConfigurationError::InvalidValue {
        name: name.to_string(),
        key,
        reason: err.to_string(),
    })
}

pub fn create(name: &str, section: &toml::Value) -> Result<Box<dyn ActivityProbe>, ConfigurationError> {
    let user_regex = compile(name, "name", &optional_str_or(section, "name", ".*"))?;
    let terminal_regex = compile(name, "terminal", &optional_str_or(section, "terminal", ".*"))?;
    let host_regex = compile(name, "host", &optional_str_or(section, "host", ".*"))?;

    Ok(Box::new(Users {
        name: name.to_string(),
        user_regex,
        terminal_regex,
        host_regex,
    }))
}

struct Session {
    user: String,
    terminal: String,
    host: String,
}

/// Parse `who` output. Each line looks like:
/// `alice    pts/0        2024-01-01 10:00 (192.168.1.5)`
/// with the trailing `(host)` omitted for local sessions.
fn parse_who(output: &str) -> Vec<Session> {
    let mut sessions = Vec::new();
    for line in output.lines() {
        let mut fields = line.split_whitespace();
        let Some(user) = fields.next() else { continue };
        let Some(terminal) = fields.next() else { continue };

        let host = line
            .rfind('(')
            .zip(line.rfind(')'))
            .filter(|(open, close)| open < close)
            .map(|(open, close)| line[open + 1..close].to_string())
            .unwrap_or_default();

        sessions.push(Session {
            user: user.to_string(),
            terminal: terminal.to_string(),
            host,
        });
    }
    sessions
}

impl ActivityProbe for Users {
    fn name(&self) -> &str {
        &self.name
    }

    fn check(&self) -> Result<Option<String>, ProbeError> {
        let output = std::process::Command::new("who")
            .output()
            .map_err(|err| ProbeError::Severe(format!("failed to execute who: {err}")))?;
        let text = String::from_utf8_lossy(&output.stdout);

        for session in parse_who(&text) {
            if self.user_regex.is_match(&session.user)
                && self.terminal_regex.is_match(&session.terminal)
                && self.host_regex.is_match(&session.host)
            {
                return Ok(Some(format!(
                    "User {} is logged in on terminal {} from {}",
                    session.user, session.terminal, session.host
                )));
            }
        }

        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_session_with_host() {
        let output = "alice    pts/0        2024-01-01 10:00 (192.168.1.5)\n";
        let sessions = parse_who(output);
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].user, "alice");
        assert_eq!(sessions[0].terminal, "pts/0");
        assert_eq!(sessions[0].host, "192.168.1.5");
    }

    #[test]
    fn parses_session_without_host() {
        let output = "bob      tty1         2024-01-01 09:00\n";
        let sessions = parse_who(output);
        assert_eq!(sessions[0].host, "");
    }

    #[test]
    fn defaults_match_everything() {
        let section: toml::Value = toml::from_str("enabled = true").unwrap();
        let _probe = create("users", &section).unwrap();
    }

    #[test]
    fn rejects_invalid_regex() {
        let section: toml::Value = toml::from_str(r#"name = "(""#).unwrap();
        assert!(create("users", &section).is_err());
    }
}
