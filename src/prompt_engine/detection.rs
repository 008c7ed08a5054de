// prompt_engine/detection.rs — Fallback content classification

use super::types::ContentCategory;
use regex::Regex;
use std::sync::OnceLock;

const CODE_MARKERS: &[&str] = &[
    "function", "def ", "class ", "import ", "const ", "let ", "var ", "=>", "{", "}", "()",
    "if (", "for (", "while (", "//", "/*", "*/", "public ", "private ", "protected ",
    "static ", "async ", "await ",
];

/// Source of category labels for clipboard content.
pub trait ContentClassifier: Send + Sync {
    fn classify(&self, content: &str) -> ContentCategory;
}

pub fn is_code_like(content: &str) -> bool {
    CODE_MARKERS.iter().any(|marker| content.contains(marker))
}

/// Bracket-delimited and well-formed JSON.
pub fn is_json_like(content: &str) -> bool {
    let trimmed = content.trim();
    let delimited = (trimmed.starts_with('{') && trimmed.ends_with('}'))
        || (trimmed.starts_with('[') && trimmed.ends_with(']'));

    delimited && serde_json::from_str::<serde_json::Value>(trimmed).is_ok()
}

/// Category used when no classifier label is available.
pub fn fallback_category(content: &str) -> ContentCategory {
    if is_json_like(content) {
        ContentCategory::Json
    } else if is_code_like(content) {
        ContentCategory::Code
    } else {
        ContentCategory::Text
    }
}

/// Pattern-based classifier for url, email, json, html, markdown, code and text.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeuristicClassifier;

struct Patterns {
    url: Regex,
    email: Regex,
    html: Regex,
    markdown: Regex,
    languages: Vec<(&'static str, Vec<Regex>)>,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        let compile = |p: &str| Regex::new(p).expect("valid detection regex");
        Patterns {
            url: compile(r"^https?://[-\w.]+(:\d+)?(/[^\s]*)?$"),
            email: compile(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$"),
            html: compile(r"</?[a-z][\s\S]*>"),
            markdown: compile(r"(?m)^#{1,6}\s|^\*\*|^__|\[.*\]\(.*\)|^\s*[-+*]\s"),
            languages: vec![
                (
                    "javascript",
                    vec![
                        compile(r"(const|let|var)\s+\w+\s*="),
                        compile(r"function\s+\w+\s*\("),
                        compile(r"=>\s*\{"),
                        compile(r"import\s+.*\s+from\s+"),
                        compile(r"export\s+(default\s+)?"),
                    ],
                ),
                (
                    "python",
                    vec![
                        compile(r"def\s+\w+\s*\("),
                        compile(r"class\s+\w+\s*\("),
                        compile(r"from\s+\w+\s+import"),
                        compile(r#"if\s+__name__\s*==\s*["']__main__["']"#),
                    ],
                ),
                (
                    "rust",
                    vec![
                        compile(r"fn\s+\w+\s*\("),
                        compile(r"struct\s+\w+\s*\{"),
                        compile(r"enum\s+\w+\s*\{"),
                        compile(r"impl\s+\w+"),
                    ],
                ),
                (
                    "go",
                    vec![
                        compile(r"func\s+\w+\s*\("),
                        compile(r"type\s+\w+\s+struct"),
                        compile(r"package\s+\w+"),
                    ],
                ),
            ],
        }
    })
}

impl HeuristicClassifier {
    /// Best-scoring programming language, ties broken by table order.
    pub fn code_language(&self, content: &str) -> Option<&'static str> {
        let mut best: Option<(&'static str, usize)> = None;

        for (language, rules) in &patterns().languages {
            let score = rules.iter().filter(|rule| rule.is_match(content)).count();
            if score > 0 && best.map_or(true, |(_, top)| score > top) {
                best = Some((*language, score));
            }
        }

        best.map(|(language, _)| language)
    }
}

impl ContentClassifier for HeuristicClassifier {
    fn classify(&self, content: &str) -> ContentCategory {
        let trimmed = content.trim();
        let p = patterns();

        if p.url.is_match(trimmed) {
            ContentCategory::Url
        } else if p.email.is_match(trimmed) {
            ContentCategory::Email
        } else if is_json_like(trimmed) {
            ContentCategory::Json
        } else if p.html.is_match(content) {
            ContentCategory::Html
        } else if p.markdown.is_match(content) {
            ContentCategory::Markdown
        } else if self.code_language(content).is_some() {
            ContentCategory::Code
        } else {
            ContentCategory::Text
        }
    }
}
