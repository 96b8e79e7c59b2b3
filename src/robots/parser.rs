//! Robots.txt rule evaluation backed by the robotstxt crate

use robotstxt::{parse_robotstxt, DefaultMatcher, RobotsParseHandler};
use std::time::Duration;

/// Robots.txt rules for one origin
#[derive(Debug, Clone)]
pub struct RobotsRules {
    /// Raw robots.txt content (empty string means allow all)
    content: String,
    allow_all: bool,
}

impl RobotsRules {
    pub fn from_content(content: &str) -> Self {
        Self {
            content: content.to_string(),
            allow_all: false,
        }
    }

    /// Permissive rules used when robots.txt is missing or unreachable
    pub fn allow_all() -> Self {
        Self {
            content: String::new(),
            allow_all: true,
        }
    }

    pub fn is_allow_all(&self) -> bool {
        self.allow_all || self.content.trim().is_empty()
    }

    /// Checks whether `url` may be fetched by `user_agent`
    ///
    /// `user_agent` may be a full header value such as
    /// `toytoons-scraper/0.1`; only its product token is matched against
    /// `User-agent:` groups.
    pub fn is_allowed(&self, url: &str, user_agent: &str) -> bool {
        if self.is_allow_all() {
            return true;
        }

        let mut matcher = DefaultMatcher::default();
        matcher.one_agent_allowed_by_robots(&self.content, product_token(user_agent), url)
    }

    /// Crawl-delay for `user_agent`, preferring its own group over `*`
    ///
    /// Groups are delimited by the robotstxt parser exactly as the matcher
    /// delimits them for `is_allowed`.
    pub fn crawl_delay(&self, user_agent: &str) -> Option<Duration> {
        if self.is_allow_all() {
            return None;
        }

        let mut handler = CrawlDelayHandler::new(product_token(user_agent));
        parse_robotstxt(&self.content, &mut handler);
        handler
            .for_agent
            .or(handler.for_wildcard)
            .map(Duration::from_secs_f64)
    }
}

/// Collects Crawl-delay values for one agent while robotstxt walks the file
struct CrawlDelayHandler<'a> {
    agent: &'a str,
    in_agent_group: bool,
    in_wildcard_group: bool,
    /// Set by any rule line; the next User-agent line opens a new group
    seen_separator: bool,
    for_agent: Option<f64>,
    for_wildcard: Option<f64>,
}

impl<'a> CrawlDelayHandler<'a> {
    fn new(agent: &'a str) -> Self {
        Self {
            agent,
            in_agent_group: false,
            in_wildcard_group: false,
            seen_separator: false,
            for_agent: None,
            for_wildcard: None,
        }
    }
}

impl RobotsParseHandler for CrawlDelayHandler<'_> {
    fn handle_robots_start(&mut self) {}

    fn handle_robots_end(&mut self) {}

    fn handle_user_agent(&mut self, _line_num: u32, user_agent: &str) {
        if self.seen_separator {
            self.in_agent_group = false;
            self.in_wildcard_group = false;
            self.seen_separator = false;
        }

        if user_agent.starts_with('*')
            && (user_agent.len() == 1 || user_agent[1..].starts_with(char::is_whitespace))
        {
            self.in_wildcard_group = true;
        } else if group_token(user_agent).eq_ignore_ascii_case(self.agent) {
            self.in_agent_group = true;
        }
    }

    fn handle_allow(&mut self, _line_num: u32, _value: &str) {
        self.seen_separator = true;
    }

    fn handle_disallow(&mut self, _line_num: u32, _value: &str) {
        self.seen_separator = true;
    }

    fn handle_sitemap(&mut self, _line_num: u32, _value: &str) {
        self.seen_separator = true;
    }

    fn handle_unknown_action(&mut self, _line_num: u32, action: &str, value: &str) {
        self.seen_separator = true;
        if !action.trim().eq_ignore_ascii_case("crawl-delay") {
            return;
        }
        let Ok(delay) = value.trim().parse::<f64>() else {
            return;
        };
        if !delay.is_finite() || delay < 0.0 {
            return;
        }

        if self.in_agent_group {
            self.for_agent.get_or_insert(delay);
        } else if self.in_wildcard_group {
            self.for_wildcard.get_or_insert(delay);
        }
    }
}

/// Agent name in a `User-agent:` line: the leading run of letters, `-` and `_`
fn group_token(user_agent: &str) -> &str {
    match user_agent.find(|c: char| !(c.is_ascii_alphabetic() || c == '-' || c == '_')) {
        Some(end) => &user_agent[..end],
        None => user_agent,
    }
}

/// `toytoons-scraper/0.1 (+info)` -> `toytoons-scraper`
fn product_token(user_agent: &str) -> &str {
    user_agent
        .split(|c: char| c == '/' || c.is_whitespace())
        .next()
        .unwrap_or(user_agent)
}
