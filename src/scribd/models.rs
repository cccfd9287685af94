// src/scribd/models.rs
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::str::FromStr;

// Anything that is not a word character, hyphen, underscore, period or space
static UNSAFE_TITLE_CHARS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[^\w\-. ]").expect("Failed to compile UNSAFE_TITLE_CHARS")
});

/// A hosted document, identified the way the command line names it: `document_id/title`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRef {
    pub id: String,
    pub title: String,
}

impl DocumentRef {
    /// Constructs the URL of the document page on the given host
    pub fn url(&self, host: &str) -> String {
        format!("https://{}/document/{}/{}", host, self.id, self.title)
    }

    /// Title made safe for use as a file stem.
    pub fn sanitized_title(&self) -> String {
        sanitize_title(&self.title)
    }
}

impl fmt::Display for DocumentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.id, self.title)
    }
}

impl FromStr for DocumentRef {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('/').collect();
        match parts.as_slice() {
            [id, title] if !id.is_empty() && !title.is_empty() => Ok(Self {
                id: id.to_string(),
                title: title.to_string(),
            }),
            _ => Err(format!("expected `document_id/title`, got `{}`", s)),
        }
    }
}

/// Replaces every character outside `[word, '-', '_', '.', ' ']` with an underscore.
pub fn sanitize_title(title: &str) -> String {
    UNSAFE_TITLE_CHARS.replace_all(title, "_").into_owned()
}
