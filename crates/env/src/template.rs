//! Field-extraction templates applied to secret payloads
//!
//! The syntax is the subset of Go's `text/template` that secret references
//! use in practice:
//!
//! - `{{.}}` renders the whole payload
//! - `{{.password}}` / `{{.db.host}}` walk JSON object fields
//! - `{{index . "user-name"}}` reaches keys that are not identifiers, and
//!   `{{index .hosts 0}}` indexes arrays
//! - `{{- ... -}}` trims surrounding whitespace, `{{/* ... */}}` is a comment
//!
//! Missing object keys render as `<no value>`, matching Go's behavior for maps.

use serde_json::Value;
use std::fmt;

const NO_VALUE: &str = "<no value>";

/// Errors raised while compiling or executing a template
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    #[error("template: {0}")]
    Syntax(String),

    #[error("template: {0}")]
    Exec(String),
}

/// A compiled template
#[derive(Clone)]
pub struct Template {
    source: String,
    nodes: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Text(String),
    Action(Action),
}

#[derive(Debug, Clone, PartialEq)]
enum Action {
    Field(Vec<String>),
    Index { target: Vec<String>, keys: Vec<Key> },
}

#[derive(Debug, Clone, PartialEq)]
enum Key {
    Name(String),
    Position(usize),
}

impl Template {
    /// Compile a template source
    pub fn compile(source: &str) -> Result<Self, TemplateError> {
        let mut nodes = Vec::new();
        let mut rest = source;
        let mut trim_next = false;

        while let Some(open) = rest.find("{{") {
            let mut text = &rest[..open];
            if trim_next {
                text = text.trim_start();
            }
            let after_open = &rest[open + 2..];
            let close = find_close(after_open)
                .ok_or_else(|| TemplateError::Syntax("unclosed action".to_string()))?;
            let mut inner = &after_open[..close];

            if let Some(stripped) = strip_left_trim(inner) {
                text = text.trim_end();
                inner = stripped;
            }
            trim_next = false;
            if let Some(stripped) = strip_right_trim(inner) {
                trim_next = true;
                inner = stripped;
            }

            if !text.is_empty() {
                nodes.push(Node::Text(text.to_string()));
            }
            if let Some(action) = parse_action(inner.trim())? {
                nodes.push(Node::Action(action));
            }
            rest = &after_open[close + 2..];
        }

        let tail = if trim_next { rest.trim_start() } else { rest };
        if !tail.is_empty() {
            nodes.push(Node::Text(tail.to_string()));
        }

        Ok(Self {
            source: source.to_string(),
            nodes,
        })
    }

    /// The source text this template was compiled from
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Execute the template against a payload
    pub fn render(&self, data: &Value) -> Result<String, TemplateError> {
        let mut out = String::new();
        for node in &self.nodes {
            match node {
                Node::Text(text) => out.push_str(text),
                Node::Action(action) => write_value(&mut out, execute(action, data)?),
            }
        }
        Ok(out)
    }
}

impl fmt::Debug for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Template").field(&self.source).finish()
    }
}

impl PartialEq for Template {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for Template {}

// Go requires whitespace after `{{-` and before `-}}`
/// Offset of the `}}` closing an action, skipping quoted strings
fn find_close(action: &str) -> Option<usize> {
    let bytes = action.as_bytes();
    let mut in_quote = false;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' if in_quote => i += 1,
            b'"' => in_quote = !in_quote,
            b'}' if !in_quote && bytes.get(i + 1) == Some(&b'}') => return Some(i),
            _ => {}
        }
        i += 1;
    }
    None
}

fn strip_left_trim(inner: &str) -> Option<&str> {
    let rest = inner.strip_prefix('-')?;
    rest.starts_with(char::is_whitespace).then_some(rest)
}

fn strip_right_trim(inner: &str) -> Option<&str> {
    let rest = inner.strip_suffix('-')?;
    rest.ends_with(char::is_whitespace).then_some(rest)
}

fn parse_action(inner: &str) -> Result<Option<Action>, TemplateError> {
    if inner.starts_with("/*") {
        if !inner.ends_with("*/") || inner.len() < 4 {
            return Err(TemplateError::Syntax("unclosed comment".to_string()));
        }
        return Ok(None);
    }

    let tokens = tokenize(inner)?;
    let Some((first, args)) = tokens.split_first() else {
        return Err(TemplateError::Syntax("missing value for command".to_string()));
    };

    match first {
        Token::Field(path) => {
            if let Some(extra) = args.first() {
                return Err(TemplateError::Syntax(format!(
                    "can't give argument to non-function {extra}"
                )));
            }
            Ok(Some(Action::Field(path.clone())))
        }
        Token::Ident(name) if name == "index" => {
            let Some((Token::Field(target), keys)) = args.split_first() else {
                return Err(TemplateError::Syntax(
                    "index expects a field such as . or .name as its first argument".to_string(),
                ));
            };
            let keys = keys
                .iter()
                .map(|token| match token {
                    Token::Str(name) => Ok(Key::Name(name.clone())),
                    Token::Int(pos) => Ok(Key::Position(*pos)),
                    other => Err(TemplateError::Syntax(format!(
                        "index keys must be string or integer constants, got {other}"
                    ))),
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Some(Action::Index {
                target: target.clone(),
                keys,
            }))
        }
        Token::Ident(name) => Err(TemplateError::Syntax(format!(
            "function \"{name}\" not defined"
        ))),
        other => Err(TemplateError::Syntax(format!("unexpected {other} in command"))),
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Field(Vec<String>),
    Ident(String),
    Str(String),
    Int(usize),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Field(path) if path.is_empty() => write!(f, "."),
            Token::Field(path) => write!(f, ".{}", path.join(".")),
            Token::Ident(name) => write!(f, "{name}"),
            Token::Str(value) => write!(f, "{value:?}"),
            Token::Int(value) => write!(f, "{value}"),
        }
    }
}

fn tokenize(inner: &str) -> Result<Vec<Token>, TemplateError> {
    let mut tokens = Vec::new();
    let mut chars = inner.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }

        if c == '"' {
            chars.next();
            let mut value = String::new();
            let mut closed = false;
            while let Some((_, c)) = chars.next() {
                match c {
                    '"' => {
                        closed = true;
                        break;
                    }
                    '\\' => match chars.next() {
                        Some((_, 'n')) => value.push('\n'),
                        Some((_, 't')) => value.push('\t'),
                        Some((_, escaped)) => value.push(escaped),
                        None => break,
                    },
                    other => value.push(other),
                }
            }
            if !closed {
                return Err(TemplateError::Syntax("unterminated quoted string".to_string()));
            }
            tokens.push(Token::Str(value));
            continue;
        }

        let mut end = inner.len();
        while let Some(&(idx, c)) = chars.peek() {
            if c.is_whitespace() || c == '"' {
                end = idx;
                break;
            }
            chars.next();
        }
        tokens.push(classify(&inner[start..end])?);
    }

    Ok(tokens)
}

fn classify(word: &str) -> Result<Token, TemplateError> {
    if word == "." {
        return Ok(Token::Field(Vec::new()));
    }
    if let Some(path) = word.strip_prefix('.') {
        let fields = path
            .split('.')
            .map(|field| {
                if is_identifier(field) {
                    Ok(field.to_string())
                } else {
                    Err(TemplateError::Syntax(format!("bad field name in {word:?}")))
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(Token::Field(fields));
    }
    if let Ok(pos) = word.parse::<usize>() {
        return Ok(Token::Int(pos));
    }
    if is_identifier(word) {
        return Ok(Token::Ident(word.to_string()));
    }
    Err(TemplateError::Syntax(format!("unexpected {word:?} in command")))
}

fn is_identifier(word: &str) -> bool {
    let mut chars = word.chars();
    matches!(chars.next(), Some(c) if c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_')
}

fn execute<'a>(action: &Action, data: &'a Value) -> Result<Option<&'a Value>, TemplateError> {
    match action {
        Action::Field(path) => walk(data, path),
        Action::Index { target, keys } => {
            let mut current = walk(data, target)?;
            for key in keys {
                let Some(value) = current else {
                    return Err(TemplateError::Exec(
                        "index of untyped nil".to_string(),
                    ));
                };
                current = match (value, key) {
                    (Value::Object(map), Key::Name(name)) => map.get(name),
                    (Value::Array(items), Key::Position(pos)) => {
                        Some(items.get(*pos).ok_or_else(|| {
                            TemplateError::Exec(format!("index out of range: {pos}"))
                        })?)
                    }
                    (other, _) => {
                        return Err(TemplateError::Exec(format!(
                            "can't index item of type {}",
                            type_name(other)
                        )))
                    }
                };
            }
            Ok(current)
        }
    }
}

fn walk<'a>(data: &'a Value, path: &[String]) -> Result<Option<&'a Value>, TemplateError> {
    let mut current = Some(data);
    for field in path {
        current = match current {
            Some(Value::Object(map)) => map.get(field),
            Some(other) => {
                return Err(TemplateError::Exec(format!(
                    "can't evaluate field {field} in type {}",
                    type_name(other)
                )))
            }
            None => {
                return Err(TemplateError::Exec(format!(
                    "nil pointer evaluating interface {{}}.{field}"
                )))
            }
        };
    }
    Ok(current)
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "nil",
        Value::Bool(_) => "bool",
        Value::Number(_) => "float64",
        Value::String(_) => "string",
        Value::Array(_) => "[]interface {}",
        Value::Object(_) => "map[string]interface {}",
    }
}

fn write_value(out: &mut String, value: Option<&Value>) {
    match value {
        None | Some(Value::Null) => out.push_str(NO_VALUE),
        Some(Value::String(s)) => out.push_str(s),
        Some(Value::Bool(b)) => out.push_str(if *b { "true" } else { "false" }),
        Some(Value::Number(n)) => out.push_str(&n.to_string()),
        // Compact JSON, not the map[k:v] form text/template prints
        Some(other) => out.push_str(&other.to_string()),
    }
}
