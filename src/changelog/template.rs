//! changelog::template
//!
//! Header and footer templates.
//!
//! A small subset of Go's `text/template`, evaluated against the release
//! record serialized to JSON:
//!
//! | Action | Meaning |
//! | ------ | ------- |
//! | `{{ .Path.To.Field }}`, `{{ . }}` | interpolate a value |
//! | `{{ range .List }}…{{ else }}…{{ end }}` | repeat with `.` bound to each element |
//! | `{{ if .Path }}…{{ else }}…{{ end }}` | conditional on Go truthiness |
//! | `{{/* comment */}}` | nothing |
//!
//! `{{-` trims whitespace before the action and `-}}` trims whitespace after
//! it. Field names match record keys case-insensitively, so `{{.Version}}`
//! and `{{.ReleaseNotesURL}}` both resolve. A key that is absent from an
//! object evaluates to nothing.
//!
//! # Example
//!
//! ```
//! use relnote::changelog::template::Template;
//! use serde_json::json;
//!
//! let template = Template::parse("header", "## {{.Version}}{{if .Draft}} (draft){{end}}\n").unwrap();
//! let text = template.execute(&json!({"version": "2.0.1", "draft": false})).unwrap();
//! assert_eq!(text, "## 2.0.1\n");
//! ```

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Errors from parsing or executing a template. Both are fatal for a run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    /// The template text is malformed.
    #[error("template '{name}': parse error: {message}")]
    Parse { name: String, message: String },

    /// The template is well-formed but cannot be evaluated against the data.
    #[error("template '{name}': execution error: {message}")]
    Execute { name: String, message: String },
}

/// A parsed template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    name: String,
    nodes: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Node {
    Text(String),
    Field(Vec<String>),
    Range {
        path: Vec<String>,
        body: Vec<Node>,
        otherwise: Vec<Node>,
    },
    If {
        path: Vec<String>,
        body: Vec<Node>,
        otherwise: Vec<Node>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Action {
    Field(Vec<String>),
    Range(Vec<String>),
    If(Vec<String>),
    Else,
    End,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Text(String),
    Action(Action),
}

/// What ended a list of nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Terminator {
    Eof,
    Else,
    End,
}

impl Template {
    /// Parse template text.
    pub fn parse(name: impl Into<String>, text: &str) -> Result<Self, TemplateError> {
        let name = name.into();
        let tokens = tokenize(text).map_err(|message| TemplateError::Parse {
            name: name.clone(),
            message,
        })?;

        let mut pos = 0;
        let (nodes, terminator) =
            parse_nodes(&tokens, &mut pos).map_err(|message| TemplateError::Parse {
                name: name.clone(),
                message,
            })?;

        match terminator {
            Terminator::Eof => Ok(Self { name, nodes }),
            Terminator::Else => Err(TemplateError::Parse {
                name,
                message: "unexpected {{else}}".into(),
            }),
            Terminator::End => Err(TemplateError::Parse {
                name,
                message: "unexpected {{end}}".into(),
            }),
        }
    }

    /// Template name, used in error messages.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Evaluate against any serializable value.
    pub fn render<T: Serialize>(&self, data: &T) -> Result<String, TemplateError> {
        let value = serde_json::to_value(data).map_err(|e| self.execute_error(e.to_string()))?;
        self.execute(&value)
    }

    /// Evaluate against a JSON value.
    pub fn execute(&self, data: &Value) -> Result<String, TemplateError> {
        let mut out = String::new();
        self.execute_nodes(&self.nodes, data, &mut out)?;
        Ok(out)
    }

    fn execute_nodes(&self, nodes: &[Node], dot: &Value, out: &mut String) -> Result<(), TemplateError> {
        for node in nodes {
            match node {
                Node::Text(text) => out.push_str(text),
                Node::Field(path) => {
                    let value = self.lookup(dot, path)?;
                    print_value(value, out);
                }
                Node::If {
                    path,
                    body,
                    otherwise,
                } => {
                    let value = self.lookup(dot, path)?;
                    if is_truthy(value) {
                        self.execute_nodes(body, dot, out)?;
                    } else {
                        self.execute_nodes(otherwise, dot, out)?;
                    }
                }
                Node::Range {
                    path,
                    body,
                    otherwise,
                } => {
                    let value = self.lookup(dot, path)?;
                    let items: Vec<&Value> = match value {
                        Value::Array(items) => items.iter().collect(),
                        Value::Object(map) => map.values().collect(),
                        Value::Null => Vec::new(),
                        other => {
                            return Err(self.execute_error(format!(
                                "range can't iterate over {} at {}",
                                type_name(other),
                                display_path(path)
                            )))
                        }
                    };

                    if items.is_empty() {
                        self.execute_nodes(otherwise, dot, out)?;
                    }
                    for item in items {
                        self.execute_nodes(body, item, out)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn lookup<'v>(&self, dot: &'v Value, path: &[String]) -> Result<&'v Value, TemplateError> {
        const NULL: &Value = &Value::Null;

        let mut current = dot;
        for (i, field) in path.iter().enumerate() {
            current = match current {
                Value::Object(map) => match map.get(field) {
                    Some(value) => value,
                    None => map
                        .iter()
                        .find(|(key, _)| key.eq_ignore_ascii_case(field))
                        .map_or(NULL, |(_, value)| value),
                },
                Value::Null => NULL,
                other => {
                    return Err(self.execute_error(format!(
                        "can't evaluate field {} in type {} at {}",
                        field,
                        type_name(other),
                        display_path(&path[..=i])
                    )))
                }
            };
        }
        Ok(current)
    }

    fn execute_error(&self, message: String) -> TemplateError {
        TemplateError::Execute {
            name: self.name.clone(),
            message,
        }
    }
}

/// Parse and evaluate in one step. Empty text renders as empty.
pub fn render_template<T: Serialize>(
    name: &str,
    text: &str,
    data: &T,
) -> Result<String, TemplateError> {
    if text.is_empty() {
        return Ok(String::new());
    }
    Template::parse(name, text)?.render(data)
}

fn tokenize(text: &str) -> Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let mut rest = text;
    let mut trim_next_text = false;

    while let Some(start) = rest.find("{{") {
        let mut literal = &rest[..start];
        if trim_next_text {
            literal = literal.trim_start();
        }

        let after_open = &rest[start + 2..];
        let search_from = comment_close(after_open).unwrap_or(0);
        let end = after_open[search_from..]
            .find("}}")
            .map(|offset| search_from + offset)
            .ok_or_else(|| format!("unclosed action starting at {:?}", preview(after_open)))?;
        let mut inner = &after_open[..end];

        let trim_left = inner.starts_with('-') && inner[1..].starts_with(char::is_whitespace);
        if trim_left {
            literal = literal.trim_end();
            inner = &inner[1..];
        }
        trim_next_text = inner.ends_with('-') && inner[..inner.len() - 1].ends_with(char::is_whitespace);
        if trim_next_text {
            inner = &inner[..inner.len() - 1];
        }

        if !literal.is_empty() {
            tokens.push(Token::Text(literal.to_string()));
        }

        let inner = inner.trim();
        if !(inner.starts_with("/*") && inner.ends_with("*/")) {
            tokens.push(Token::Action(parse_action(inner)?));
        }

        rest = &after_open[end + 2..];
    }

    let literal = if trim_next_text { rest.trim_start() } else { rest };
    if !literal.is_empty() {
        tokens.push(Token::Text(literal.to_string()));
    }
    Ok(tokens)
}

/// Offset just past the `*/` when the action opening at `after_open` is a comment.
fn comment_close(after_open: &str) -> Option<usize> {
    let body = after_open.strip_prefix('-').unwrap_or(after_open);
    let lead = after_open.len() - body.trim_start().len();
    let close = after_open[lead..].strip_prefix("/*")?.find("*/")?;
    Some(lead + 2 + close + 2)
}

fn parse_action(inner: &str) -> Result<Action, String> {
    match inner {
        "" => Err("empty action".into()),
        "end" => Ok(Action::End),
        "else" => Ok(Action::Else),
        _ => {
            if let Some(arg) = inner.strip_prefix("range ") {
                Ok(Action::Range(parse_path(arg.trim())?))
            } else if let Some(arg) = inner.strip_prefix("if ") {
                Ok(Action::If(parse_path(arg.trim())?))
            } else if inner.starts_with('.') {
                Ok(Action::Field(parse_path(inner)?))
            } else {
                Err(format!("unknown action {{{{{}}}}}", inner))
            }
        }
    }
}

fn parse_path(text: &str) -> Result<Vec<String>, String> {
    if text == "." {
        return Ok(Vec::new());
    }
    let Some(fields) = text.strip_prefix('.') else {
        return Err(format!("expected a field path, got {:?}", text));
    };

    fields
        .split('.')
        .map(|field| {
            let valid = !field.is_empty()
                && field.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
            if valid {
                Ok(field.to_string())
            } else {
                Err(format!("bad field path {:?}", text))
            }
        })
        .collect()
}

fn parse_nodes(tokens: &[Token], pos: &mut usize) -> Result<(Vec<Node>, Terminator), String> {
    let mut nodes = Vec::new();

    while let Some(token) = tokens.get(*pos) {
        *pos += 1;
        match token {
            Token::Text(text) => nodes.push(Node::Text(text.clone())),
            Token::Action(Action::Field(path)) => nodes.push(Node::Field(path.clone())),
            Token::Action(Action::Else) => return Ok((nodes, Terminator::Else)),
            Token::Action(Action::End) => return Ok((nodes, Terminator::End)),
            Token::Action(Action::Range(path)) => {
                let (body, otherwise) = parse_block(tokens, pos, "range")?;
                nodes.push(Node::Range {
                    path: path.clone(),
                    body,
                    otherwise,
                });
            }
            Token::Action(Action::If(path)) => {
                let (body, otherwise) = parse_block(tokens, pos, "if")?;
                nodes.push(Node::If {
                    path: path.clone(),
                    body,
                    otherwise,
                });
            }
        }
    }

    Ok((nodes, Terminator::Eof))
}

/// Parse the body of a block action up to its `{{end}}`.
fn parse_block(
    tokens: &[Token],
    pos: &mut usize,
    keyword: &str,
) -> Result<(Vec<Node>, Vec<Node>), String> {
    let (body, terminator) = parse_nodes(tokens, pos)?;
    match terminator {
        Terminator::End => Ok((body, Vec::new())),
        Terminator::Else => {
            let (otherwise, terminator) = parse_nodes(tokens, pos)?;
            match terminator {
                Terminator::End => Ok((body, otherwise)),
                Terminator::Else => Err(format!("more than one {{{{else}}}} in {}", keyword)),
                Terminator::Eof => Err(format!("unterminated {}", keyword)),
            }
        }
        Terminator::Eof => Err(format!("unterminated {}", keyword)),
    }
}

fn print_value(value: &Value, out: &mut String) {
    match value {
        Value::Null => {}
        Value::String(s) => out.push_str(s),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => out.push_str(&n.to_string()),
        other => out.push_str(&other.to_string()),
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "nil",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}

fn display_path(path: &[String]) -> String {
    if path.is_empty() {
        ".".to_string()
    } else {
        format!(".{}", path.join("."))
    }
}

fn preview(text: &str) -> String {
    text.chars().take(20).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn run(text: &str, data: Value) -> Result<String, TemplateError> {
        Template::parse("test", text)?.execute(&data)
    }

    #[test]
    fn interpolates_case_insensitive_fields() {
        let data = json!({"version": "2.0.1", "gitOwner": "acme", "releaseNotesURL": "u"});
        assert_eq!(run("H:{{.Version}}\n", data.clone()).unwrap(), "H:2.0.1\n");
        assert_eq!(run("{{ .GitOwner }}/{{.ReleaseNotesURL}}", data).unwrap(), "acme/u");
    }

    #[test]
    fn missing_key_renders_empty() {
        assert_eq!(run("[{{.Nope}}]", json!({})).unwrap(), "[]");
        assert_eq!(run("[{{.A.B}}]", json!({"a": null})).unwrap(), "[]");
    }

    #[test]
    fn field_on_scalar_is_execute_error() {
        let err = run("{{.Version.Major}}", json!({"version": "1"})).unwrap_err();
        assert!(matches!(err, TemplateError::Execute { .. }));
        assert!(err.to_string().contains("can't evaluate field Major in type string"));
    }

    #[test]
    fn prints_scalars() {
        let data = json!({"n": 3, "b": true, "s": "x"});
        assert_eq!(run("{{.N}} {{.B}} {{.S}}", data).unwrap(), "3 true x");
    }

    #[test]
    fn range_with_else() {
        let data = json!({"commits": [{"sha": "a"}, {"sha": "b"}], "issues": []});
        assert_eq!(
            run("{{range .Commits}}- {{.Sha}}\n{{end}}", data.clone()).unwrap(),
            "- a\n- b\n"
        );
        assert_eq!(
            run("{{range .Issues}}x{{else}}none{{end}}", data).unwrap(),
            "none"
        );
    }

    #[test]
    fn range_over_scalar_is_execute_error() {
        let err = run("{{range .V}}x{{end}}", json!({"v": "str"})).unwrap_err();
        assert!(matches!(err, TemplateError::Execute { .. }));
    }

    #[test]
    fn if_else_truthiness() {
        let t = "{{if .X}}yes{{else}}no{{end}}";
        assert_eq!(run(t, json!({"x": "a"})).unwrap(), "yes");
        assert_eq!(run(t, json!({"x": ""})).unwrap(), "no");
        assert_eq!(run(t, json!({"x": 0})).unwrap(), "no");
        assert_eq!(run(t, json!({"x": []})).unwrap(), "no");
        assert_eq!(run(t, json!({})).unwrap(), "no");
    }

    #[test]
    fn nested_blocks() {
        let t = "{{range .Items}}{{if .On}}[{{.Name}}]{{end}}{{end}}";
        let data = json!({"items": [{"on": true, "name": "a"}, {"on": false, "name": "b"}]});
        assert_eq!(run(t, data).unwrap(), "[a]");
    }

    #[test]
    fn dot_refers_to_current_value() {
        assert_eq!(
            run("{{range .Labels}}<{{.}}>{{end}}", json!({"labels": ["a", "b"]})).unwrap(),
            "<a><b>"
        );
    }

    #[test]
    fn comments_and_trim_markers() {
        assert_eq!(run("a {{/* note */}}b", json!({})).unwrap(), "a b");
        assert_eq!(run("a   {{- .X -}}   b", json!({"x": "-"})).unwrap(), "a-b");
    }

    #[test]
    fn comment_may_contain_closing_braces() {
        assert_eq!(run("x{{/* a }} b */}}y", json!({})).unwrap(), "xy");
        assert_eq!(run("x {{- /* }} */ -}} y", json!({})).unwrap(), "xy");
    }

    #[test]
    fn parse_errors() {
        for text in [
            "{{.Version",
            "{{end}}",
            "{{else}}",
            "{{if .X}}open",
            "{{range .X}}a{{else}}b{{else}}c{{end}}",
            "{{template \"x\"}}",
            "{{}}",
            "{{.a..b}}",
        ] {
            let err = Template::parse("t", text).unwrap_err();
            assert!(
                matches!(err, TemplateError::Parse { .. }),
                "expected parse error for {:?}",
                text
            );
        }
    }

    #[test]
    fn render_template_empty_is_empty() {
        assert_eq!(render_template("h", "", &json!({})).unwrap(), "");
    }

    #[test]
    fn renders_serializable_records() {
        let record = crate::core::types::ReleaseRecord {
            version: "2.0.1".into(),
            ..Default::default()
        };
        assert_eq!(
            render_template("header", "H:{{.Version}}\n", &record).unwrap(),
            "H:2.0.1\n"
        );
    }
}
