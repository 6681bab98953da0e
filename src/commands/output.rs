use colored::Colorize;
use serde_json::Value;
use std::io::{self, Write};

use crate::client::Record;
use crate::schema::{ModelConfig, ResourceKind};

/// One human-readable row: `- label (kind) [id]`.
#[derive(Debug, PartialEq, Eq)]
pub struct Line {
    pub label: String,
    pub kind: &'static str,
    pub id: String,
}

impl Line {
    /// Build from a record already projected onto canonical names.
    pub fn of(config: &ModelConfig, projected: &Record) -> Self {
        let s = |key: &str| text(projected.get(key));
        let label = match config.resource {
            ResourceKind::Repository => {
                let title = s("title");
                if title.is_empty() { s("name") } else { title }
            }
            ResourceKind::Release | ResourceKind::Account => s("name"),
            ResourceKind::Commit => {
                let msg = s("message");
                let first = msg.lines().next().unwrap_or_default().to_string();
                format!("{} <{}>", first, s("author"))
            }
            ResourceKind::User => {
                format!("{} {} <{}>", s("firstname"), s("lastname"), s("email"))
            }
        };
        Self {
            label,
            kind: config.resource.as_str(),
            id: s("id"),
        }
    }
}

fn text(v: Option<&Value>) -> String {
    match v {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

/// Print records of `config`, either as lines or as projected JSON.
pub fn write_records<'a>(
    out: &mut impl Write,
    config: &ModelConfig,
    records: impl IntoIterator<Item = &'a Record>,
    json: bool,
) -> io::Result<()> {
    for record in records {
        let projected = config.project(record);
        if json {
            writeln!(out, "{projected}")?;
        } else {
            let line = Line::of(config, &projected);
            writeln!(
                out,
                "- {} ({}) [{}]",
                line.label.bold(),
                line.kind,
                line.id.dimmed()
            )?;
        }
    }
    Ok(())
}

/// Branch and tag listings have no model; show their names under a heading.
pub fn write_refs(out: &mut impl Write, heading: &str, refs: &[Record]) -> io::Result<()> {
    writeln!(out, "\n{heading}")?;
    for r in refs {
        writeln!(out, "- {}", text(r.get("name")))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::model;
    use serde_json::json;

    #[test]
    fn repository_prefers_title() {
        let cfg = model("Repository").unwrap();
        let line = Line::of(cfg, &cfg.project(&json!({"id": 3, "name": "core", "title": "Core"})));
        assert_eq!(
            line,
            Line {
                label: "Core".into(),
                kind: "repository",
                id: "3".into()
            }
        );
        let line = Line::of(cfg, &cfg.project(&json!({"id": 3, "name": "core"})));
        assert_eq!(line.label, "core");
    }

    #[test]
    fn commit_uses_first_message_line_and_revision() {
        let cfg = model("Commit").unwrap();
        let rec = json!({"revision": 99, "message": "fix paging\n\nlong body", "author": "jane"});
        let line = Line::of(cfg, &cfg.project(&rec));
        assert_eq!(line.label, "fix paging <jane>");
        assert_eq!(line.id, "99");
    }

    #[test]
    fn json_output_is_projected() {
        let cfg = model("User").unwrap();
        let rec = json!({"id": 1, "first_name": "Jane", "last_name": "Doe", "admin": true, "login": "jd"});
        let mut buf = Vec::new();
        write_records(&mut buf, cfg, [&rec], true).unwrap();
        let got: Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(
            got,
            json!({"id": 1, "firstname": "Jane", "lastname": "Doe", "isAdmin": true})
        );
    }

    #[test]
    fn refs_are_listed_by_name() {
        let mut buf = Vec::new();
        write_refs(&mut buf, "branches", &[json!({"name": "main"}), json!({"name": "dev"})]).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "\nbranches\n- main\n- dev\n");
    }
}
