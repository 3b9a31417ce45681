use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::MineError;

/// Technology category a keyword list describes.
///
/// Declaration order is the order categories are evaluated and reported in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Database,
    Server,
    Bus,
    Language,
    Gateway,
    Monitor,
    Discovery,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::Database,
        Category::Server,
        Category::Bus,
        Category::Language,
        Category::Gateway,
        Category::Monitor,
        Category::Discovery,
    ];

    /// Whether a match in this category marks a service as infrastructure.
    /// The runtime language of a service never does.
    pub fn is_infrastructure(&self) -> bool {
        !matches!(self, Category::Language)
    }

    /// Resource file name for this category's keyword list.
    pub fn file_name(&self) -> &'static str {
        match self {
            Category::Database => "database.txt",
            Category::Server => "server.txt",
            Category::Bus => "bus.txt",
            Category::Language => "language.txt",
            Category::Gateway => "gateway.txt",
            Category::Monitor => "monitor.txt",
            Category::Discovery => "discovery.txt",
        }
    }

    fn bundled_list(&self) -> &'static str {
        match self {
            Category::Database => include_str!("../keywords/database.txt"),
            Category::Server => include_str!("../keywords/server.txt"),
            Category::Bus => include_str!("../keywords/bus.txt"),
            Category::Language => include_str!("../keywords/language.txt"),
            Category::Gateway => include_str!("../keywords/gateway.txt"),
            Category::Monitor => include_str!("../keywords/monitor.txt"),
            Category::Discovery => include_str!("../keywords/discovery.txt"),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Database => write!(f, "database"),
            Category::Server => write!(f, "server"),
            Category::Bus => write!(f, "bus"),
            Category::Language => write!(f, "language"),
            Category::Gateway => write!(f, "gateway"),
            Category::Monitor => write!(f, "monitor"),
            Category::Discovery => write!(f, "discovery"),
        }
    }
}

impl std::str::FromStr for Category {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "database" | "db" => Ok(Category::Database),
            "server" => Ok(Category::Server),
            "bus" | "message-bus" => Ok(Category::Bus),
            "language" | "lang" => Ok(Category::Language),
            "gateway" => Ok(Category::Gateway),
            "monitor" => Ok(Category::Monitor),
            "discovery" => Ok(Category::Discovery),
            _ => Err(anyhow::anyhow!("unknown keyword category: {s}")),
        }
    }
}

/// Curated keyword lists, one ordered set of lowercase keywords per category.
///
/// Built once at startup and shared by reference; never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordSet {
    lists: BTreeMap<Category, Vec<String>>,
}

impl KeywordSet {
    /// Keyword lists compiled into the binary.
    pub fn bundled() -> Self {
        let lists = Category::ALL
            .iter()
            .map(|c| (*c, parse_list(c.bundled_list())))
            .collect();
        Self { lists }
    }

    /// Load every category's `<category>.txt` list from `dir`.
    pub fn from_dir(dir: &Path) -> Result<Self, MineError> {
        let mut lists = BTreeMap::new();
        for category in Category::ALL {
            let path = dir.join(category.file_name());
            let content =
                std::fs::read_to_string(&path).map_err(|source| MineError::KeywordFile {
                    path: path.clone(),
                    source,
                })?;
            lists.insert(category, parse_list(&content));
        }
        Ok(Self { lists })
    }

    /// Append extra keywords to a category, keeping the set ordered and unique.
    pub fn extend<I, S>(&mut self, category: Category, words: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let list = self.lists.entry(category).or_default();
        for word in words {
            let word = word.as_ref().trim().to_lowercase();
            if !word.is_empty() && !list.contains(&word) {
                list.push(word);
            }
        }
    }

    pub fn get(&self, category: Category) -> &[String] {
        self.lists.get(&category).map(Vec::as_slice).unwrap_or(&[])
    }
}

impl Default for KeywordSet {
    fn default() -> Self {
        Self::bundled()
    }
}

fn parse_list(content: &str) -> Vec<String> {
    let mut words: Vec<String> = Vec::new();
    for line in content.lines() {
        let word = line.trim().to_lowercase();
        if !word.is_empty() && !words.contains(&word) {
            words.push(word);
        }
    }
    words
}

/// Split free text into lowercase word tokens.
///
/// ASCII punctuation and digits act as separators and tokens of two
/// characters or fewer are dropped. With `unique`, later repeats of a token
/// are removed and first-occurrence order is kept.
pub fn tokenize(text: &str, unique: bool) -> Vec<String> {
    let cleaned: String = text
        .chars()
        .map(|c| {
            if c.is_ascii_punctuation() || c.is_ascii_digit() {
                ' '
            } else {
                c
            }
        })
        .collect::<String>()
        .to_lowercase();

    let mut words: Vec<String> = Vec::new();
    for word in cleaned.split_whitespace() {
        if word.chars().count() <= 2 {
            continue;
        }
        if unique && words.iter().any(|w| w == word) {
            continue;
        }
        words.push(word.to_string());
    }
    words
}

/// Similarity predicate used to compare an extracted word with a keyword.
pub trait Matcher: Send + Sync {
    fn are_similar(&self, word: &str, keyword: &str) -> bool;
}

/// Exact string equality. The only strategy currently in use.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactMatcher;

impl Matcher for ExactMatcher {
    fn are_similar(&self, word: &str, keyword: &str) -> bool {
        word == keyword
    }
}

/// Matches tokenized text against keyword lists.
pub struct KeywordClassifier {
    matcher: Box<dyn Matcher>,
}

impl KeywordClassifier {
    pub fn new() -> Self {
        Self::with_matcher(Box::new(ExactMatcher))
    }

    pub fn with_matcher(matcher: Box<dyn Matcher>) -> Self {
        Self { matcher }
    }

    /// First keyword similar to `word`, in keyword-list order.
    pub fn match_one<'k>(&self, word: &str, keywords: &'k [String]) -> Option<&'k str> {
        keywords
            .iter()
            .find(|k| self.matcher.are_similar(word, k))
            .map(String::as_str)
    }

    /// Scan `words` in order and return the keyword matched by the first
    /// word that matches anything.
    pub fn match_first<'k>(&self, words: &[String], keywords: &'k [String]) -> Option<&'k str> {
        words.iter().find_map(|w| self.match_one(w, keywords))
    }

    /// Tokenize `text` and match it against `keywords`.
    pub fn classify<'k>(&self, text: &str, keywords: &'k [String]) -> Option<&'k str> {
        self.match_first(&tokenize(text, false), keywords)
    }
}

impl Default for KeywordClassifier {
    fn default() -> Self {
        Self::new()
    }
}
