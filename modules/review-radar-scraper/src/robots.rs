//! Minimal robots.txt evaluation for the wildcard user agent.
//!
//! Only `User-agent: *` groups are read. The longest matching `Allow` or
//! `Disallow` prefix decides; `Allow` wins a tie. An empty `Disallow` allows
//! everything.

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RobotsRules {
    allow: Vec<String>,
    disallow: Vec<String>,
}

impl RobotsRules {
    pub fn parse(body: &str) -> Self {
        let mut rules = Self::default();
        let mut in_wildcard = false;
        // Consecutive User-agent lines share one group.
        let mut reading_agents = false;

        for line in body.lines() {
            let line = line.split('#').next().unwrap_or("").trim();
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let key = key.trim().to_ascii_lowercase();
            let value = value.trim();

            match key.as_str() {
                "user-agent" => {
                    if !reading_agents {
                        in_wildcard = false;
                    }
                    reading_agents = true;
                    if value == "*" {
                        in_wildcard = true;
                    }
                }
                "allow" | "disallow" => {
                    reading_agents = false;
                    if !in_wildcard || value.is_empty() {
                        continue;
                    }
                    if key == "allow" {
                        rules.allow.push(value.to_string());
                    } else {
                        rules.disallow.push(value.to_string());
                    }
                }
                _ => reading_agents = false,
            }
        }
        rules
    }

    /// Whether `path` (path plus query) may be fetched.
    pub fn is_allowed(&self, path: &str) -> bool {
        let longest = |prefixes: &[String]| {
            prefixes
                .iter()
                .filter(|p| matches(p, path))
                .map(|p| p.len())
                .max()
        };
        match (longest(&self.allow), longest(&self.disallow)) {
            (_, None) => true,
            (None, Some(_)) => false,
            (Some(allow), Some(disallow)) => allow >= disallow,
        }
    }
}

/// Prefix match with `*` wildcards and an optional `$` end anchor.
fn matches(pattern: &str, path: &str) -> bool {
    let (pattern, anchored) = match pattern.strip_suffix('$') {
        Some(p) => (p, true),
        None => (pattern, false),
    };

    let parts: Vec<&str> = pattern.split('*').collect();
    let Some(mut rest) = path.strip_prefix(parts[0]) else {
        return false;
    };
    let last = parts.len() - 1;
    for (i, part) in parts.iter().enumerate().skip(1) {
        // An anchored final segment must sit at the very end.
        let found = if anchored && i == last {
            rest.rfind(part)
        } else {
            rest.find(part)
        };
        match found {
            Some(j) => rest = &rest[j + part.len()..],
            None => return false,
        }
    }
    !anchored || rest.is_empty()
}
