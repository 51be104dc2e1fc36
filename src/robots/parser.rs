//! Robots.txt parser
//!
//! Only the `User-agent: *` group is honored and only its `Disallow` lines
//! are collected. `Sitemap:` lines are global and collected regardless of
//! the group they appear in.

/// Where the parser is relative to user-agent groups
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GroupState {
    /// Before the first `User-agent` line
    Preamble,
    /// Reading consecutive `User-agent` lines of one group
    Agents { wildcard: bool },
    /// Reading rule lines of the current group
    Rules { wildcard: bool },
}

impl GroupState {
    fn on_user_agent(self, agent: &str) -> Self {
        let is_wildcard = agent == "*";
        match self {
            // Consecutive agent lines share one group
            Self::Agents { wildcard } => Self::Agents {
                wildcard: wildcard || is_wildcard,
            },
            Self::Preamble | Self::Rules { .. } => Self::Agents {
                wildcard: is_wildcard,
            },
        }
    }

    fn on_rule(self) -> Self {
        match self {
            Self::Agents { wildcard } => Self::Rules { wildcard },
            other => other,
        }
    }

    fn applies(self) -> bool {
        matches!(
            self,
            Self::Agents { wildcard: true } | Self::Rules { wildcard: true }
        )
    }
}

/// Disallow rules that apply to this crawler
///
/// An empty policy (the [`Default`]) allows everything; it is also what a
/// failed robots.txt fetch produces.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RobotsPolicy {
    disallowed: Vec<String>,
    sitemaps: Vec<String>,
}

impl RobotsPolicy {
    /// Parses raw robots.txt content
    ///
    /// A bare `Disallow: /` and empty `Disallow:` lines are not recorded, so
    /// neither blocks the crawl.
    pub fn parse(content: &str) -> Self {
        let mut policy = Self::default();
        let mut state = GroupState::Preamble;

        for line in content.lines() {
            let line = strip_comment(line).trim();
            if line.is_empty() {
                continue;
            }

            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let value = value.trim();

            match key.trim().to_ascii_lowercase().as_str() {
                "user-agent" => state = state.on_user_agent(value),
                "disallow" => {
                    state = state.on_rule();
                    if state.applies() && !value.is_empty() && value != "/" {
                        policy.disallowed.push(value.to_string());
                    }
                }
                "sitemap" => {
                    if !value.is_empty() {
                        policy.sitemaps.push(value.to_string());
                    }
                }
                _ => state = state.on_rule(),
            }
        }

        policy
    }

    /// Returns true when `path` starts with any collected disallow prefix
    pub fn is_disallowed(&self, path: &str) -> bool {
        self.disallowed.iter().any(|prefix| path.starts_with(prefix.as_str()))
    }

    /// Disallow prefixes from the `User-agent: *` group, in file order
    pub fn disallowed_paths(&self) -> &[String] {
        &self.disallowed
    }

    /// Sitemap URLs announced in the file
    pub fn sitemaps(&self) -> &[String] {
        &self.sitemaps
    }

    /// Returns true when no path is disallowed
    pub fn is_empty(&self) -> bool {
        self.disallowed.is_empty()
    }
}

fn strip_comment(line: &str) -> &str {
    match line.find('#') {
        Some(idx) => &line[..idx],
        None => line,
    }
}
