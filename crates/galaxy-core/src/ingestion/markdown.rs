//! Markdown metadata extraction
//!
//! Pure helpers used by document ingestion: front-matter splitting, link and
//! hashtag extraction, title/description rules, importance scoring and kind
//! classification.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;

use crate::graph::NodeKind;

/// Maximum description length, in characters
pub const DESCRIPTION_MAX_CHARS: usize = 200;

/// Content length at which the length signal saturates
const LENGTH_REFERENCE: f32 = 10_000.0;
/// Link count at which the link signal saturates
const LINK_REFERENCE: f32 = 20.0;
/// Heading count at which the heading signal saturates
const HEADING_REFERENCE: f32 = 10.0;

const LENGTH_WEIGHT: f32 = 0.3;
const LINK_WEIGHT: f32 = 0.4;
const HEADING_WEIGHT: f32 = 0.3;

/// Static regex patterns - compiled once, used for every document.
static PATTERNS: OnceLock<MarkdownPatterns> = OnceLock::new();

#[derive(Debug)]
struct MarkdownPatterns {
    markdown_link: Regex,
    wiki_link: Regex,
    hashtag: Regex,
    title: Regex,
    heading: Regex,
}

impl MarkdownPatterns {
    fn new() -> Self {
        Self {
            // [text](target)
            markdown_link: Regex::new(r"\[([^\]]+)\]\(([^)]+)\)")
                .expect("markdown_link regex must compile"),
            // [[target]]
            wiki_link: Regex::new(r"\[\[([^\]]+)\]\]").expect("wiki_link regex must compile"),
            hashtag: Regex::new(r"#([a-zA-Z0-9_-]+)").expect("hashtag regex must compile"),
            title: Regex::new(r"(?m)^#\s+(.+)$").expect("title regex must compile"),
            heading: Regex::new(r"(?m)^#+\s").expect("heading regex must compile"),
        }
    }
}

fn patterns() -> &'static MarkdownPatterns {
    PATTERNS.get_or_init(MarkdownPatterns::new)
}

/// Recognised front-matter fields
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrontMatter {
    pub title: Option<String>,
    pub description: Option<String>,
    /// Raw `type` value; may name something outside [`NodeKind`]
    pub kind: Option<String>,
    pub tags: Vec<String>,
}

impl FrontMatter {
    fn from_yaml(value: serde_yaml::Value) -> Result<Self, String> {
        let mapping = match value {
            serde_yaml::Value::Null => return Ok(Self::default()),
            serde_yaml::Value::Mapping(m) => m,
            other => return Err(format!("expected a mapping, found {}", yaml_type_name(&other))),
        };

        let field = |name: &str| mapping.get(name);

        let tags = match field("tags") {
            Some(serde_yaml::Value::Sequence(items)) => items.iter().filter_map(scalar_to_string).collect(),
            Some(serde_yaml::Value::String(s)) => s.split(',').map(|t| t.trim().to_string()).collect(),
            Some(other) => scalar_to_string(other).into_iter().collect(),
            None => Vec::new(),
        };

        Ok(Self {
            title: field("title").and_then(scalar_to_string).filter(|s| !s.is_empty()),
            description: field("description")
                .and_then(scalar_to_string)
                .filter(|s| !s.is_empty()),
            kind: field("type").and_then(scalar_to_string),
            tags,
        })
    }
}

fn scalar_to_string(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn yaml_type_name(value: &serde_yaml::Value) -> &'static str {
    match value {
        serde_yaml::Value::Null => "null",
        serde_yaml::Value::Bool(_) => "a boolean",
        serde_yaml::Value::Number(_) => "a number",
        serde_yaml::Value::String(_) => "a string",
        serde_yaml::Value::Sequence(_) => "a sequence",
        serde_yaml::Value::Mapping(_) => "a mapping",
        serde_yaml::Value::Tagged(_) => "a tagged value",
    }
}

/// Split a leading `---` fenced YAML block from the body
///
/// Text without a complete fence is all body. Returns an error message
/// when the fenced block is not valid YAML.
pub fn split_front_matter(raw: &str) -> Result<(FrontMatter, &str), String> {
    let Some(rest) = raw.strip_prefix("---") else {
        return Ok((FrontMatter::default(), raw));
    };
    // The opening fence must be a line of its own
    let Some(rest) = rest
        .strip_prefix("\r\n")
        .or_else(|| rest.strip_prefix('\n'))
    else {
        return Ok((FrontMatter::default(), raw));
    };

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end_matches(['\r', '\n']) == "---" {
            let yaml = &rest[..offset];
            let body = &rest[offset + line.len()..];
            let value: serde_yaml::Value = if yaml.trim().is_empty() {
                serde_yaml::Value::Null
            } else {
                serde_yaml::from_str(yaml).map_err(|e| e.to_string())?
            };
            return Ok((FrontMatter::from_yaml(value)?, body));
        }
        offset += line.len();
    }

    Ok((FrontMatter::default(), raw))
}

/// Ordered, de-duplicated link targets: every `[text](target)` first, then every `[[target]]`
///
/// First occurrence wins; empty targets are skipped.
pub fn extract_links(body: &str) -> Vec<String> {
    let p = patterns();
    let markdown = p.markdown_link.captures_iter(body).filter_map(|c| c.get(2));
    let wiki = p.wiki_link.captures_iter(body).filter_map(|c| c.get(1));

    let mut seen = HashSet::new();
    markdown
        .chain(wiki)
        .map(|m| m.as_str().trim().to_string())
        .filter(|link| !link.is_empty() && seen.insert(link.clone()))
        .collect()
}

/// Inline `#tag` tokens in order of appearance, de-duplicated
pub fn extract_hashtags(body: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    patterns()
        .hashtag
        .captures_iter(body)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .filter(|tag| seen.insert(tag.clone()))
        .collect()
}

/// Text of the first top-level `# ` heading
pub fn extract_title(body: &str) -> Option<String> {
    patterns()
        .title
        .captures(body)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|t| !t.is_empty())
}

/// File name with a trailing `.md` removed
pub fn title_from_file_name(file_name: &str) -> String {
    file_name.strip_suffix(".md").unwrap_or(file_name).to_string()
}

/// First non-empty line that is neither a heading nor a code fence, truncated
pub fn extract_description(body: &str) -> String {
    body.lines()
        .map(str::trim)
        .find(|line| !line.is_empty() && !line.starts_with('#') && !line.starts_with("```"))
        .map(|line| line.chars().take(DESCRIPTION_MAX_CHARS).collect())
        .unwrap_or_default()
}

/// Number of ATX headings at any level
pub fn heading_count(body: &str) -> usize {
    patterns().heading.find_iter(body).count()
}

/// Weighted importance from length, link count and heading count, within `[0, 1]`
pub fn importance(content_len: usize, link_count: usize, heading_count: usize) -> f32 {
    let length = (content_len as f32 / LENGTH_REFERENCE).min(1.0) * LENGTH_WEIGHT;
    let links = (link_count as f32 / LINK_REFERENCE).min(1.0) * LINK_WEIGHT;
    let headings = (heading_count as f32 / HEADING_REFERENCE).min(1.0) * HEADING_WEIGHT;
    (length + links + headings).clamp(0.0, 1.0)
}

/// Keyword checked against the lower-cased relative path, in priority order
const PATH_KEYWORDS: &[(&str, NodeKind)] = &[
    ("error", NodeKind::Error),
    ("mcp", NodeKind::Mcp),
    ("skill", NodeKind::Skill),
    ("plugin", NodeKind::Plugin),
    ("config", NodeKind::Config),
];

/// Classify a document: front-matter type, then path keywords, then file name, then document
pub fn classify(relative_path: &str, file_name: &str, declared: Option<&str>) -> NodeKind {
    if let Some(kind) = declared.and_then(NodeKind::parse) {
        return kind;
    }

    let lower = relative_path.to_lowercase();
    if let Some((_, kind)) = PATH_KEYWORDS.iter().find(|(kw, _)| lower.contains(kw)) {
        return *kind;
    }

    match file_name {
        "README.md" | "INDEX.md" => NodeKind::Category,
        _ => NodeKind::Document,
    }
}
