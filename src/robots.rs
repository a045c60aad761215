use std::collections::HashMap;

/// Represents a robots.txt rule (either Allow or Disallow)
#[derive(Debug, Clone, PartialEq, Eq)]
struct Rule {
    pattern: String,
    is_allow: bool,
}

/// A parsed robots.txt document.
#[derive(Debug, Default, Clone)]
pub struct RobotsTxt {
    /// Rules grouped by user-agent (lowercased)
    groups: HashMap<String, Vec<Rule>>,
    /// `Sitemap:` directives in document order
    sitemaps: Vec<String>,
}

impl RobotsTxt {
    pub fn parse(content: &str) -> Self {
        let mut robots = Self::default();
        let mut current_agents: Vec<String> = Vec::new();
        let mut in_rules = false;

        for line in content.lines() {
            // Strip inline comments
            let line = line.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }

            let Some((field, value)) = line.split_once(':') else {
                continue;
            };
            let field = field.trim().to_lowercase();
            let value = value.trim();

            match field.as_str() {
                "user-agent" => {
                    // Consecutive user-agent lines share one group
                    if in_rules {
                        current_agents.clear();
                        in_rules = false;
                    }
                    let agent = value.to_lowercase();
                    robots.groups.entry(agent.clone()).or_default();
                    current_agents.push(agent);
                }
                "disallow" | "allow" => {
                    in_rules = true;
                    // An empty Disallow allows everything
                    if value.is_empty() {
                        continue;
                    }
                    let rule = Rule {
                        pattern: value.to_string(),
                        is_allow: field == "allow",
                    };
                    for agent in &current_agents {
                        robots
                            .groups
                            .entry(agent.clone())
                            .or_default()
                            .push(rule.clone());
                    }
                }
                "sitemap" => {
                    if !value.is_empty() {
                        robots.sitemaps.push(value.to_string());
                    }
                }
                _ => {
                    // Crawl-delay, Host, etc.
                }
            }
        }

        robots
    }

    pub fn sitemaps(&self) -> &[String] {
        &self.sitemaps
    }

    /// Checks if a path may be fetched by `user_agent`
    pub fn is_allowed(&self, path: &str, user_agent: &str) -> bool {
        if let Some(rules) = self.groups.get(&user_agent.to_lowercase()) {
            return Self::check_rules(rules, path);
        }

        if let Some(rules) = self.groups.get("*") {
            return Self::check_rules(rules, path);
        }

        true
    }

    /// Longest matching rule wins; Allow wins a tie. No match means allowed.
    fn check_rules(rules: &[Rule], path: &str) -> bool {
        rules
            .iter()
            .filter(|rule| Self::path_matches(&rule.pattern, path))
            .max_by_key(|rule| (rule.pattern.len(), rule.is_allow))
            .is_none_or(|rule| rule.is_allow)
    }

    /// Checks if a path matches a pattern (supports * and $ wildcards)
    fn path_matches(pattern: &str, path: &str) -> bool {
        let (pattern, must_end) = match pattern.strip_suffix('$') {
            Some(stripped) => (stripped, true),
            None => (pattern, false),
        };

        if !pattern.contains('*') {
            return if must_end {
                path == pattern
            } else {
                path.starts_with(pattern)
            };
        }

        Self::glob(pattern.as_bytes(), path.as_bytes(), must_end)
    }

    fn glob(pattern: &[u8], path: &[u8], must_end: bool) -> bool {
        match pattern.split_first() {
            None => !must_end || path.is_empty(),
            Some((b'*', rest)) => (0..=path.len()).any(|i| Self::glob(rest, &path[i..], must_end)),
            Some((c, rest)) => path
                .split_first()
                .is_some_and(|(p, path_rest)| p == c && Self::glob(rest, path_rest, must_end)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_matches_prefix() {
        assert!(RobotsTxt::path_matches("/admin", "/admin/page"));
        assert!(RobotsTxt::path_matches("/admin", "/admin"));
        assert!(!RobotsTxt::path_matches("/admin", "/user"));
    }

    #[test]
    fn test_path_matches_wildcard() {
        assert!(RobotsTxt::path_matches("/admin/*", "/admin/page"));
        assert!(RobotsTxt::path_matches("/admin/*", "/admin/"));
        assert!(RobotsTxt::path_matches("/*.php", "/index.php"));
        assert!(RobotsTxt::path_matches("/*.php", "/admin/index.php"));
        assert!(!RobotsTxt::path_matches("/*.php", "/index.html"));
    }

    #[test]
    fn test_path_matches_end_marker() {
        assert!(RobotsTxt::path_matches("/admin$", "/admin"));
        assert!(!RobotsTxt::path_matches("/admin$", "/admin/"));
        assert!(RobotsTxt::path_matches("/*.pdf$", "/files/a.pdf"));
        assert!(!RobotsTxt::path_matches("/*.pdf$", "/files/a.pdf?x=1"));
    }

    #[test]
    fn test_parse_groups_and_sitemaps() {
        let content = r#"
User-agent: *
Disallow: /admin
Disallow: /private/
Allow: /public/

User-agent: googlebot
User-agent: bingbot
Disallow: /secret # inline comment

Sitemap: https://example.com/sitemap.xml
sitemap: https://example.com/news.xml
"#;

        let robots = RobotsTxt::parse(content);

        assert_eq!(robots.groups.get("*").map(Vec::len), Some(3));
        assert_eq!(robots.groups.get("googlebot").map(Vec::len), Some(1));
        assert_eq!(robots.groups.get("bingbot").map(Vec::len), Some(1));
        assert_eq!(
            robots.sitemaps(),
            &[
                "https://example.com/sitemap.xml".to_string(),
                "https://example.com/news.xml".to_string()
            ]
        );
    }

    #[test]
    fn test_is_allowed_prefers_specific_agent() {
        let robots = RobotsTxt::parse(
            "User-agent: *\nDisallow: /\n\nUser-agent: friendly\nDisallow: /private\n",
        );

        assert!(!robots.is_allowed("/about", "*"));
        assert!(!robots.is_allowed("/about", "unknown-bot"));
        assert!(robots.is_allowed("/about", "friendly"));
        assert!(!robots.is_allowed("/private/x", "friendly"));
    }

    #[test]
    fn test_empty_disallow_allows_all() {
        let robots = RobotsTxt::parse("User-agent: *\nDisallow:\n");
        assert!(robots.is_allowed("/anything", "*"));
    }

    #[test]
    fn test_longest_match_wins() {
        let robots = RobotsTxt::parse(
            "User-agent: *\nDisallow: /admin\nAllow: /admin/public\nAllow: /shop\nDisallow: /shop\n",
        );

        assert!(!robots.is_allowed("/admin", "*"));
        assert!(robots.is_allowed("/admin/public", "*"));
        assert!(!robots.is_allowed("/admin/private", "*"));
        assert!(robots.is_allowed("/public", "*"));
        // Equal length: Allow wins
        assert!(robots.is_allowed("/shop/cart", "*"));
    }
}
