use regex::Regex;

/// Narrows candidate member names: substring containment for plain strings,
/// unanchored search for patterns. Multiple filters AND together.
#[derive(Debug, Clone)]
pub enum Filter {
    Substring(String),
    Pattern(Regex),
}

impl Filter {
    pub fn matches(&self, name: &str) -> bool {
        match self {
            Filter::Substring(s) => name.contains(s.as_str()),
            Filter::Pattern(re) => re.is_match(name),
        }
    }
}

impl From<&str> for Filter {
    fn from(s: &str) -> Self {
        Filter::Substring(s.to_string())
    }
}

impl From<String> for Filter {
    fn from(s: String) -> Self {
        Filter::Substring(s)
    }
}

impl From<Regex> for Filter {
    fn from(re: Regex) -> Self {
        Filter::Pattern(re)
    }
}

/// Sequential narrowing: each filter keeps only the names it matches.
pub fn apply_filters(names: Vec<String>, filters: &[Filter]) -> Vec<String> {
    filters.iter().fold(names, |names, filter| {
        names
            .into_iter()
            .filter(|name| filter.matches(name))
            .collect()
    })
}
