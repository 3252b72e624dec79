//! User-agent denylist.
//!
//! Scripted HTTP clients announce themselves in the `User-Agent` header. A
//! request is blocked when the header is missing or empty, or when it
//! contains any denylisted token, compared case-insensitively.

/// Tool signatures blocked out of the box.
pub const DEFAULT_BLOCKED_AGENTS: &[&str] =
    &["curl", "wget", "python-requests", "postman", "insomnia"];

/// Case-insensitive substring denylist for `User-Agent` values.
#[derive(Debug, Clone)]
pub struct AgentFilter {
    denylist: Vec<String>,
}

impl AgentFilter {
    /// Build a filter from denylisted tokens. Empty tokens are ignored.
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let denylist = tokens
            .into_iter()
            .map(|t| t.as_ref().trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();
        Self { denylist }
    }

    /// Whether a request carrying `user_agent` should be refused.
    pub fn is_blocked(&self, user_agent: Option<&str>) -> bool {
        let Some(agent) = user_agent.filter(|ua| !ua.trim().is_empty()) else {
            return true;
        };
        let agent = agent.to_lowercase();
        self.denylist.iter().any(|token| agent.contains(token.as_str()))
    }
}

impl Default for AgentFilter {
    fn default() -> Self {
        Self::new(DEFAULT_BLOCKED_AGENTS)
    }
}
