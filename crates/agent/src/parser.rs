//! Response parser: turns raw model text into a [`Decision`].
//!
//! Models are asked for a single JSON object but routinely wrap it in prose
//! or code fences, drop fields, or answer in plain text. Parsing therefore
//! never fails:
//!
//! 1. the whole text as a JSON object;
//! 2. the span from the first `{` to the last `}`;
//! 3. otherwise the raw text becomes a `final` answer.
//!
//! Missing fields are backfilled before the action is matched.

use miniagi_core::decision::{Decision, DecisionKind, NO_ANSWER};
use miniagi_core::tool::ToolArgs;
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Parse raw model output into a decision. Total and pure.
pub fn parse(raw: &str) -> Decision {
    if let Some(obj) = parse_object(raw) {
        debug!("Model output parsed as JSON");
        return from_object(&obj);
    }

    if let Some(obj) = extract_braced(raw).and_then(parse_object) {
        debug!("JSON object extracted from surrounding text");
        return from_object(&obj);
    }

    warn!(chars = raw.chars().count(), "Model output is not JSON, treating it as a final answer");
    let answer = if raw.trim().is_empty() {
        NO_ANSWER.to_string()
    } else {
        raw.to_string()
    };
    Decision::final_answer("parsing failed", answer)
}

fn parse_object(text: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str(text) {
        Ok(Value::Object(obj)) => Some(obj),
        _ => None,
    }
}

fn extract_braced(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Text value of a field: strings as-is, `null`/missing as empty, anything
/// else as its JSON text.
fn text_field(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn optional_name(value: Option<&Value>) -> Option<String> {
    let name = text_field(value);
    let name = name.trim();
    (!name.is_empty()).then(|| name.to_string())
}

fn from_object(obj: &Map<String, Value>) -> Decision {
    let thought = text_field(obj.get("thought").or_else(|| obj.get("reasoning")));

    let action = match obj.get("action") {
        None | Some(Value::Null) => "final".to_string(),
        other => text_field(other).trim().to_lowercase(),
    };

    let tool = optional_name(obj.get("tool"));
    let target = optional_name(obj.get("target_agent"));
    let args: ToolArgs = match obj.get("args") {
        Some(Value::Object(map)) => map.clone(),
        _ => ToolArgs::new(),
    };
    let answer = text_field(obj.get("answer"));

    let kind = match action.as_str() {
        "final" => DecisionKind::Final { answer },
        "use_tool" => DecisionKind::UseTool { tool, args },
        "delegate" => DecisionKind::Delegate {
            target,
            args,
            answer,
        },
        _ => {
            let raw = serde_json::json!({
                "thought": thought,
                "action": action,
                "tool": tool,
                "target_agent": target,
                "args": args,
                "answer": answer,
            });
            DecisionKind::Unknown { action, raw }
        }
    };

    Decision { thought, kind }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strict_json_final() {
        let d = parse(r#"{"thought":"greet","action":"final","answer":"Hi there"}"#);
        assert_eq!(d.thought, "greet");
        assert_eq!(d.kind, DecisionKind::Final { answer: "Hi there".into() });
    }

    #[test]
    fn json_inside_prose_and_fences() {
        let raw = "Sure! Here is my decision:\n```json\n{\"action\": \"use_tool\", \"tool\": \"read_file\", \"args\": {\"path\": \"a.txt\"}}\n```\nHope that helps.";
        let d = parse(raw);
        match d.kind {
            DecisionKind::UseTool { tool, args } => {
                assert_eq!(tool.as_deref(), Some("read_file"));
                assert_eq!(args["path"], "a.txt");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn prose_becomes_final_answer() {
        let d = parse("The capital of France is Paris.");
        assert_eq!(d.thought, "parsing failed");
        assert_eq!(
            d.kind,
            DecisionKind::Final { answer: "The capital of France is Paris.".into() }
        );
    }

    #[test]
    fn empty_and_blank_become_no_answer() {
        for raw in ["", "   \n\t"] {
            let d = parse(raw);
            assert_eq!(d.kind, DecisionKind::Final { answer: NO_ANSWER.into() });
        }
    }

    #[test]
    fn truncated_json_is_final_with_raw_text() {
        let raw = r#"{"thought": "working on it", "action": "use_tool", "tool": "read_f"#;
        let d = parse(raw);
        assert_eq!(d.kind, DecisionKind::Final { answer: raw.into() });
    }

    #[test]
    fn reversed_braces_fall_back() {
        let d = parse("} nothing here {");
        assert_eq!(d.action_name(), "final");
    }

    #[test]
    fn json_array_is_not_a_decision() {
        let d = parse("[1, 2, 3]");
        assert_eq!(d.thought, "parsing failed");
        assert_eq!(d.kind, DecisionKind::Final { answer: "[1, 2, 3]".into() });
    }

    #[test]
    fn missing_action_defaults_to_final() {
        let d = parse(r#"{"answer": "42"}"#);
        assert_eq!(d.kind, DecisionKind::Final { answer: "42".into() });
        assert_eq!(d.thought, "");
    }

    #[test]
    fn action_is_trimmed_and_lowercased() {
        let d = parse(r#"{"action": " Use_Tool ", "tool": "write_file"}"#);
        assert_eq!(d.action_name(), "use_tool");
        assert_eq!(d.tool(), Some("write_file"));
    }

    #[test]
    fn reasoning_alias_and_stringified_fields() {
        let d = parse(r#"{"reasoning": "math", "action": "final", "answer": 42}"#);
        assert_eq!(d.thought, "math");
        assert_eq!(d.kind, DecisionKind::Final { answer: "42".into() });
    }

    #[test]
    fn empty_tool_is_none_and_bad_args_are_empty() {
        let d = parse(r#"{"action": "use_tool", "tool": "", "args": "path=a.txt"}"#);
        assert_eq!(
            d.kind,
            DecisionKind::UseTool { tool: None, args: ToolArgs::new() }
        );
    }

    #[test]
    fn delegate_keeps_target_args_and_answer() {
        let d = parse(
            r#"{"thought":"coding task","action":"delegate","target_agent":"coder","args":{"task":"write fibonacci"},"answer":""}"#,
        );
        assert_eq!(d.target_agent(), Some("coder"));
        match d.kind {
            DecisionKind::Delegate { args, .. } => assert_eq!(args["task"], "write fibonacci"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn unknown_action_carries_backfilled_record() {
        let d = parse(r#"{"action": "Dance", "tool": null}"#);
        match &d.kind {
            DecisionKind::Unknown { action, raw } => {
                assert_eq!(action, "dance");
                assert_eq!(raw["action"], "dance");
                assert!(raw["tool"].is_null());
                assert!(raw["args"].as_object().unwrap().is_empty());
                assert_eq!(raw["answer"], "");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn parse_is_idempotent() {
        let inputs = [
            r#"{"thought":"t","action":"final","answer":"a"}"#,
            "garbage text",
            "",
            r#"prefix {"action":"delegate","target_agent":"coder","args":{"task":1}} suffix"#,
            r#"{"action":"teleport"}"#,
            r#"{"action":"use_tool","tool":"read_file","args":{"path":"x"}}"#,
        ];
        for raw in inputs {
            assert_eq!(parse(raw), parse(raw));
            // The record of a decision parses back to the same decision.
            let first = parse(raw);
            let again = parse(&first.to_record().to_string());
            assert_eq!(first, again, "record round trip for {raw:?}");
        }
    }
}
