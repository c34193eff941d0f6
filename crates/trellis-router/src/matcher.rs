//! Path template compilation and matching

use percent_encoding::percent_decode_str;
use regex::Regex;
use trellis_core::{Error, Params, Result};

/// Flags applied when a template is compiled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchOptions {
    /// Literal segments match case-sensitively
    pub case_sensitive: bool,
    /// A trailing slash on the request path is significant
    pub strict: bool,
    /// The template must consume the whole path
    pub end: bool,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            case_sensitive: true,
            strict: false,
            end: true,
        }
    }
}

/// A named parameter declared by a template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamKey {
    /// Parameter name
    pub name: String,
    /// Declared with `?`
    pub optional: bool,
    /// Declared with `*`
    pub wildcard: bool,
}

/// Raw, undecoded captures of a successful match
#[derive(Debug)]
pub struct Captures<'a> {
    /// Portion of the path consumed by the template
    pub matched: &'a str,
    values: Vec<(&'a str, &'a str)>,
}

impl<'a> Captures<'a> {
    /// Percent-decode the captured values in declaration order
    pub fn decode(&self) -> Result<Params> {
        let mut params = Params::new();
        for (name, raw) in &self.values {
            params.insert(*name, decode_param(raw)?);
        }
        Ok(params)
    }

    /// Raw captured values in declaration order
    pub fn raw(&self) -> &[(&'a str, &'a str)] {
        &self.values
    }
}

/// Compiled path template
///
/// Templates:
/// - `/posts` - literal path
/// - `/posts/:post` - named parameter
/// - `/posts/:id(\d+)` - parameter with a custom pattern
/// - `/posts/:post/:format?` - optional parameter
/// - `/static/*filepath` - wildcard (rest of the path)
#[derive(Debug, Clone)]
pub struct PatternMatcher {
    /// Original template
    pattern: String,

    /// Compiled regex
    regex: Regex,

    /// Parameters in declaration order
    keys: Vec<ParamKey>,

    /// Literal path for the static fast path
    static_path: Option<String>,

    options: MatchOptions,
}

const MATCHED_GROUP: &str = "__matched";

impl PatternMatcher {
    /// Compile a template with default options
    pub fn new(pattern: impl Into<String>) -> Result<Self> {
        Self::with_options(pattern, MatchOptions::default())
    }

    /// Compile a template
    pub fn with_options(pattern: impl Into<String>, options: MatchOptions) -> Result<Self> {
        let pattern = pattern.into();
        let template = if options.strict {
            pattern.as_str()
        } else {
            trim_trailing_slash(&pattern)
        };
        let (body, keys) = Self::compile(template)?;

        let mut source = String::new();
        if !options.case_sensitive {
            source.push_str("(?i)");
        }
        source.push_str(&format!("^(?P<{MATCHED_GROUP}>{body})"));
        if !options.strict {
            source.push_str("/?");
        }
        if options.end {
            source.push('$');
        } else {
            source.push_str("(?:/.*)?$");
        }

        let regex = Regex::new(&source)
            .map_err(|e| Error::Config(format!("Invalid route pattern '{pattern}': {e}")))?;

        let static_path = (keys.is_empty() && options.case_sensitive && options.end)
            .then(|| template.to_string());

        Ok(Self {
            pattern,
            regex,
            keys,
            static_path,
            options,
        })
    }

    /// Translate a template into a regex body and its parameter keys
    fn compile(pattern: &str) -> Result<(String, Vec<ParamKey>)> {
        let chars: Vec<char> = pattern.chars().collect();
        let mut body = String::new();
        let mut literal = String::new();
        let mut keys = Vec::new();
        let mut i = 0;

        while i < chars.len() {
            let c = chars[i];
            let starts_param = (c == ':' || c == '*')
                && chars.get(i + 1).is_some_and(|n| is_word_char(*n));

            if !starts_param {
                literal.push(c);
                i += 1;
                continue;
            }

            let wildcard = c == '*';
            i += 1;
            let start = i;
            while i < chars.len() && is_word_char(chars[i]) {
                i += 1;
            }
            let name: String = chars[start..i].iter().collect();

            let mut group = if wildcard {
                ".*".to_string()
            } else {
                "[^/]+".to_string()
            };
            if !wildcard && chars.get(i) == Some(&'(') {
                let (constraint, end) = read_constraint(&chars, i, pattern)?;
                group = constraint;
                i = end;
            }
            let optional = !wildcard && chars.get(i) == Some(&'?');
            if optional {
                i += 1;
            }

            let capture = format!("(?P<__p{}>{group})", keys.len());
            if optional && literal.ends_with('/') {
                literal.pop();
                body.push_str(&regex::escape(&literal));
                body.push_str(&format!("(?:/{capture})?"));
            } else {
                body.push_str(&regex::escape(&literal));
                body.push_str(&capture);
                if optional {
                    body.push('?');
                }
            }
            literal.clear();

            keys.push(ParamKey {
                name,
                optional,
                wildcard,
            });
        }

        body.push_str(&regex::escape(&literal));
        Ok((body, keys))
    }

    /// Test a path, returning raw captures on success
    pub fn capture<'a>(&'a self, path: &'a str) -> Option<Captures<'a>> {
        if let Some(literal) = &self.static_path {
            let trimmed = if self.options.strict {
                path
            } else {
                trim_trailing_slash(path)
            };
            return (trimmed == literal).then_some(Captures {
                matched: if trimmed.is_empty() { path } else { trimmed },
                values: Vec::new(),
            });
        }

        let captures = self.regex.captures(path)?;
        let matched = captures.name(MATCHED_GROUP).map_or("", |m| m.as_str());
        let values = self
            .keys
            .iter()
            .enumerate()
            .filter_map(|(index, key)| {
                captures
                    .name(&format!("__p{index}"))
                    .map(|m| (key.name.as_str(), m.as_str()))
            })
            .collect();

        Some(Captures { matched, values })
    }

    /// Test a path, returning decoded parameters on success
    pub fn matches(&self, path: &str) -> Result<Option<Params>> {
        self.capture(path).map(|c| c.decode()).transpose()
    }

    /// Whether the path matches, without decoding
    pub fn is_match(&self, path: &str) -> bool {
        self.capture(path).is_some()
    }

    /// Get the template
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Is this a template without parameters?
    pub fn is_static(&self) -> bool {
        self.keys.is_empty()
    }

    /// Get parameter keys
    pub fn keys(&self) -> &[ParamKey] {
        &self.keys
    }

    /// Options the template was compiled with
    pub fn options(&self) -> MatchOptions {
        self.options
    }
}

/// Drop at most one trailing `/`
fn trim_trailing_slash(path: &str) -> &str {
    path.strip_suffix('/').unwrap_or(path)
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Read a balanced `( ... )` constraint starting at `open`
fn read_constraint(chars: &[char], open: usize, pattern: &str) -> Result<(String, usize)> {
    let mut depth = 0usize;
    let mut i = open;
    while i < chars.len() {
        match chars[i] {
            '\\' => i += 1,
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    let constraint: String = chars[open + 1..i].iter().collect();
                    if constraint.is_empty() {
                        break;
                    }
                    return Ok((constraint, i + 1));
                }
            }
            _ => {}
        }
        i += 1;
    }
    Err(Error::Config(format!(
        "Unbalanced or empty parameter pattern in route '{pattern}'"
    )))
}

/// Percent-decode a captured parameter.
///
/// A `%` not followed by two hex digits, or escapes that do not form
/// UTF-8, fail with [`Error::MalformedParameter`].
pub fn decode_param(raw: &str) -> Result<String> {
    let malformed = || Error::MalformedParameter {
        value: raw.to_string(),
    };

    let bytes = raw.as_bytes();
    for (i, byte) in bytes.iter().enumerate() {
        if *byte == b'%' {
            let valid = bytes.get(i + 1).is_some_and(u8::is_ascii_hexdigit)
                && bytes.get(i + 2).is_some_and(u8::is_ascii_hexdigit);
            if !valid {
                return Err(malformed());
            }
        }
    }

    percent_decode_str(raw)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .map_err(|_| malformed())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_path() {
        let matcher = PatternMatcher::new("/posts").unwrap();
        assert!(matcher.is_static());

        assert!(matcher.is_match("/posts"));
        assert!(matcher.is_match("/posts/"));
        assert!(!matcher.is_match("/posts/123"));
        assert!(!matcher.is_match("/Posts"));
    }

    #[test]
    fn test_single_param() {
        let matcher = PatternMatcher::new("/posts/:post").unwrap();
        assert_eq!(matcher.keys()[0].name, "post");

        let params = matcher.matches("/posts/123").unwrap().unwrap();
        assert_eq!(params.get("post"), Some("123"));

        assert!(matcher.matches("/posts").unwrap().is_none());
        assert!(matcher.matches("/posts/123/extra").unwrap().is_none());
    }

    #[test]
    fn test_params_in_declaration_order() {
        let matcher = PatternMatcher::new("/posts/:postId/comments/:id").unwrap();

        let params = matcher.matches("/posts/42/comments/7").unwrap().unwrap();
        assert_eq!(params.names().collect::<Vec<_>>(), vec!["postId", "id"]);
        assert_eq!(params.get("postId"), Some("42"));
        assert_eq!(params.get("id"), Some("7"));
    }

    #[test]
    fn test_percent_decoding() {
        let matcher = PatternMatcher::new("/files/:name").unwrap();
        let params = matcher.matches("/files/hello%20world").unwrap().unwrap();
        assert_eq!(params.get("name"), Some("hello world"));

        let params = matcher.matches("/files/caf%C3%A9").unwrap().unwrap();
        assert_eq!(params.get("name"), Some("café"));
    }

    #[test]
    fn test_malformed_escape() {
        let matcher = PatternMatcher::new("/files/:name").unwrap();

        let err = matcher.matches("/files/100%zz").unwrap_err();
        assert!(matches!(err, Error::MalformedParameter { ref value } if value == "100%zz"));
        assert_eq!(err.to_status_code(), http::StatusCode::BAD_REQUEST);

        assert!(matcher.matches("/files/trailing%").is_err());
        assert!(matcher.matches("/files/%FF").is_err());
    }

    #[test]
    fn test_constraint() {
        let matcher = PatternMatcher::new(r"/posts/:id(\d+)").unwrap();
        assert!(matcher.is_match("/posts/12"));
        assert!(!matcher.is_match("/posts/new"));

        let grouped = PatternMatcher::new("/:lang(en|fr)/about").unwrap();
        let params = grouped.matches("/fr/about").unwrap().unwrap();
        assert_eq!(params.get("lang"), Some("fr"));
    }

    #[test]
    fn test_invalid_constraint() {
        assert!(PatternMatcher::new("/posts/:id(\\d+").is_err());
        assert!(PatternMatcher::new("/posts/:id()").is_err());
        assert!(PatternMatcher::new("/posts/:id([)").is_err());
    }

    #[test]
    fn test_optional_param() {
        let matcher = PatternMatcher::new("/posts/:post/:format?").unwrap();

        let params = matcher.matches("/posts/1").unwrap().unwrap();
        assert_eq!(params.get("post"), Some("1"));
        assert!(!params.contains("format"));

        let params = matcher.matches("/posts/1/json").unwrap().unwrap();
        assert_eq!(params.get("format"), Some("json"));
    }

    #[test]
    fn test_wildcard() {
        let matcher = PatternMatcher::new("/static/*filepath").unwrap();
        assert!(matcher.keys()[0].wildcard);

        let params = matcher.matches("/static/css/main.css").unwrap().unwrap();
        assert_eq!(params.get("filepath"), Some("css/main.css"));
    }

    #[test]
    fn test_case_insensitive() {
        let options = MatchOptions {
            case_sensitive: false,
            ..MatchOptions::default()
        };
        let matcher = PatternMatcher::with_options("/Posts/:post", options).unwrap();

        let params = matcher.matches("/posts/AbC").unwrap().unwrap();
        assert_eq!(params.get("post"), Some("AbC"));
    }

    #[test]
    fn test_strict_trailing_slash() {
        let options = MatchOptions {
            strict: true,
            ..MatchOptions::default()
        };
        let matcher = PatternMatcher::with_options("/posts/:post", options).unwrap();
        assert!(matcher.is_match("/posts/1"));
        assert!(!matcher.is_match("/posts/1/"));

        let lenient = PatternMatcher::new("/posts/:post").unwrap();
        assert!(lenient.is_match("/posts/1/"));
    }

    #[test]
    fn test_template_trailing_slash_optional_when_lenient() {
        let matcher = PatternMatcher::new("/api/").unwrap();
        assert!(matcher.is_match("/api"));
        assert!(matcher.is_match("/api/"));
        assert!(!matcher.is_match("/api//"));

        let dynamic = PatternMatcher::new("/api/:id/").unwrap();
        let params = dynamic.matches("/api/1").unwrap().unwrap();
        assert_eq!(params.get("id"), Some("1"));
        assert!(dynamic.is_match("/api/1/"));

        let options = MatchOptions {
            strict: true,
            ..MatchOptions::default()
        };
        let strict = PatternMatcher::with_options("/api/", options).unwrap();
        assert!(strict.is_match("/api/"));
        assert!(!strict.is_match("/api"));
    }

    #[test]
    fn test_root_template() {
        let matcher = PatternMatcher::new("/").unwrap();
        let captures = matcher.capture("/").unwrap();
        assert_eq!(captures.matched, "/");
        assert!(!matcher.is_match("/posts"));
    }

    #[test]
    fn test_non_anchored() {
        let options = MatchOptions {
            end: false,
            ..MatchOptions::default()
        };
        let matcher = PatternMatcher::with_options("/api/:version", options).unwrap();

        let captures = matcher.capture("/api/v2/users/1").unwrap();
        assert_eq!(captures.matched, "/api/v2");
        assert!(!matcher.is_match("/apiv2"));
    }

    #[test]
    fn test_literal_characters_are_escaped() {
        let matcher = PatternMatcher::new("/files/report.pdf").unwrap();
        assert!(matcher.is_match("/files/report.pdf"));
        assert!(!matcher.is_match("/files/reportxpdf"));

        let dynamic = PatternMatcher::new("/files/:name.json").unwrap();
        let params = dynamic.matches("/files/data.json").unwrap().unwrap();
        assert_eq!(params.get("name"), Some("data"));
    }

    #[test]
    fn test_empty_template() {
        let matcher = PatternMatcher::new("").unwrap();
        assert!(matcher.is_match(""));
        assert!(matcher.is_match("/"));
        assert!(!matcher.is_match("/posts"));
    }
}
