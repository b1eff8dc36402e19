//! Prompt construction for composition requests.
//!
//! The gateway only relies on the [`PromptBuilder`] contract; the default
//! [`StrudelPromptBuilder`] carries the built-in Strudel wording.

use std::path::Path;

use super::request::{ChatMessage, GenerationRequest, Role};
use crate::error::Result;

/// Produces the literal prompt text for each attempt.
pub trait PromptBuilder: Send + Sync {
    /// System prompt, fixed for the lifetime of a request.
    fn system_prompt(&self) -> &str;

    /// User prompt for the first attempt.
    fn user_prompt(&self, request: &GenerationRequest) -> String;

    /// User prompt for the corrective attempt, given the validator's issues.
    fn retry_prompt(&self, request: &GenerationRequest, issues: &[String]) -> String;
}

const SYSTEM_PROMPT: &str = r#"you are a tasteful electronic composer who writes coherent, musical strudel compositions. you prioritize harmony, rhythm, and emotional clarity over technical complexity. you write songs, not just beats, and you write clean, readable code that runs reliably.

code rules:
- start every script with setcpm(...) to set the tempo
- one voice per line, each voice starts with $:
- 3-6 voices; fewer, well-chosen parts beat dense layering
- keep randomness (rand, perlin, sometimes, degradeBy, shuffle) to a minimum
- .gain(...) never exceeds 0.9
- every bracket and parenthesis must be balanced
- answer with a single ```javascript code block containing the whole script

sound palette:
synths: sawtooth, square, sine, triangle, supersaw
drums: bd, sd, hh, oh, cp, rim, lt, mt, ht, perc
effects (use sparingly): .lpf .hpf .lpq .delay .delaytime .delayfeedback .room .gain .pan .distort .clip .lpenv"#;

const NEW_SONG_REQUIREMENTS: &str = r#"requirements:
- output one complete script
- start with setcpm(...)
- 3-6 voices with $:
- single javascript code block only"#;

const EDIT_REQUIREMENTS: &str = r#"requirements:
- output the complete modified code
- keep setcpm(...) at the start
- maintain 3-6 voices with $:
- preserve what works, change what's requested
- single javascript code block only"#;

/// Default prompt builder with the built-in Strudel wording.
pub struct StrudelPromptBuilder {
    system_prompt: String,
    history_limit: usize,
}

impl StrudelPromptBuilder {
    pub fn new(history_limit: usize) -> Self {
        Self {
            system_prompt: SYSTEM_PROMPT.to_string(),
            history_limit,
        }
    }

    /// Replaces the built-in system prompt with the contents of `path`.
    pub fn with_system_prompt_file(mut self, path: &Path) -> Result<Self> {
        self.system_prompt = std::fs::read_to_string(path)?;
        tracing::info!(
            "Loaded system prompt override from {} ({} chars)",
            path.display(),
            self.system_prompt.len()
        );
        Ok(self)
    }

    fn new_song_context(user_request: &str) -> String {
        format!(
            "compose a new strudel piece for this request:\n\n{user_request}\n\n{NEW_SONG_REQUIREMENTS}"
        )
    }

    fn edit_context(current_code: &str, user_request: &str) -> String {
        format!(
            "you are editing an existing strudel composition. here is the current code:\n\n```javascript\n{current_code}\n```\n\nmodify this code according to the user's request. return the FULL updated script, not a diff or patch. preserve the overall structure unless the user explicitly asks to change it.\n\nuser request: {user_request}\n\n{EDIT_REQUIREMENTS}"
        )
    }
}

impl PromptBuilder for StrudelPromptBuilder {
    fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    fn user_prompt(&self, request: &GenerationRequest) -> String {
        match request.edit_code() {
            Some(code) => {
                let history = truncate_history(&request.chat_history, self.history_limit);
                Self::edit_context(code, &request.prompt) + &format_history(&history)
            }
            None => Self::new_song_context(&request.prompt),
        }
    }

    fn retry_prompt(&self, request: &GenerationRequest, issues: &[String]) -> String {
        let corrected = build_correction_request(&request.prompt, issues);
        match request.edit_code() {
            Some(code) => Self::edit_context(code, &corrected),
            None => Self::new_song_context(&corrected),
        }
    }
}

/// Combines the original request with the validator's issue list.
fn build_correction_request(original: &str, issues: &[String]) -> String {
    let mut text = format!(
        "{original}\n\nyour previous attempt had these problems:\n"
    );
    for issue in issues {
        text.push_str(&format!("- {issue}\n"));
    }
    text.push_str("fix them and keep the musical idea; simpler is better.");
    text
}

/// Keeps the first message plus the last `limit - 1` messages.
pub fn truncate_history(history: &[ChatMessage], limit: usize) -> Vec<ChatMessage> {
    if history.len() <= limit {
        return history.to_vec();
    }
    if limit == 0 {
        return Vec::new();
    }
    let tail_start = history.len() - (limit - 1);
    std::iter::once(&history[0])
        .chain(&history[tail_start..])
        .cloned()
        .collect()
}

/// Renders history as `role: content` lines; assistant code turns are summarised.
pub fn format_history(history: &[ChatMessage]) -> String {
    if history.is_empty() {
        return String::new();
    }

    let lines: Vec<String> = history
        .iter()
        .map(|msg| match msg.role {
            Role::User => format!("user: {}", msg.content),
            Role::Assistant if msg.has_code() => "assistant: [generated strudel code]".to_string(),
            Role::Assistant => format!("assistant: {}", msg.content),
        })
        .collect();

    format!("\nprevious conversation:\n{}\n", lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::request::{CodeMarker, Mode};
    use pretty_assertions::assert_eq;

    fn msg(role: Role, content: &str) -> ChatMessage {
        ChatMessage {
            role,
            content: content.to_string(),
            code: None,
        }
    }

    fn request(mode: Mode, code: Option<&str>, history: Vec<ChatMessage>) -> GenerationRequest {
        GenerationRequest {
            prompt: "make it darker".to_string(),
            mode,
            current_code: code.map(str::to_string),
            chat_history: history,
            model: "claude-sonnet-4-20250514".to_string(),
            api_key: "sk-ant-x".to_string(),
        }
    }

    #[test]
    fn test_truncate_history_keeps_first_and_tail() {
        let history: Vec<ChatMessage> = (0..10)
            .map(|i| msg(Role::User, &format!("m{i}")))
            .collect();
        let truncated = truncate_history(&history, 6);
        let contents: Vec<&str> = truncated.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["m0", "m5", "m6", "m7", "m8", "m9"]);
    }

    #[test]
    fn test_truncate_history_short_is_untouched() {
        let history = vec![msg(Role::User, "a"), msg(Role::Assistant, "b")];
        assert_eq!(truncate_history(&history, 6), history);
        assert!(truncate_history(&history, 0).is_empty());
    }

    #[test]
    fn test_format_history_summarises_code_turns() {
        let history = vec![
            msg(Role::User, "a techno beat"),
            ChatMessage {
                role: Role::Assistant,
                content: "```js\nsetcpm(32)\n```".to_string(),
                code: Some(CodeMarker::Code("setcpm(32)".to_string())),
            },
            msg(Role::Assistant, "want more bass?"),
        ];
        assert_eq!(
            format_history(&history),
            "\nprevious conversation:\nuser: a techno beat\nassistant: [generated strudel code]\nassistant: want more bass?\n"
        );
        assert_eq!(format_history(&[]), "");
    }

    #[test]
    fn test_new_mode_prompt_has_no_code_context() {
        let builder = StrudelPromptBuilder::new(6);
        let req = request(Mode::New, Some("setcpm(30)"), vec![msg(Role::User, "hi")]);
        let prompt = builder.user_prompt(&req);
        assert!(prompt.contains("make it darker"));
        assert!(!prompt.contains("setcpm(30)"));
        assert!(!prompt.contains("previous conversation"));
    }

    #[test]
    fn test_edit_mode_prompt_embeds_code_and_history() {
        let builder = StrudelPromptBuilder::new(6);
        let req = request(
            Mode::Edit,
            Some("setcpm(30)\n$: s(\"bd*4\")"),
            vec![msg(Role::User, "a kick pattern")],
        );
        let prompt = builder.user_prompt(&req);
        assert!(prompt.contains("```javascript\nsetcpm(30)\n$: s(\"bd*4\")\n```"));
        assert!(prompt.contains("user request: make it darker"));
        assert!(prompt.ends_with("\nprevious conversation:\nuser: a kick pattern\n"));
    }

    #[test]
    fn test_edit_mode_with_blank_code_falls_back_to_new() {
        let builder = StrudelPromptBuilder::new(6);
        let req = request(Mode::Edit, Some("   "), vec![]);
        let prompt = builder.user_prompt(&req);
        assert!(!prompt.contains("editing an existing"));
    }

    #[test]
    fn test_retry_prompt_edit_mode_embeds_code_and_issues() {
        let builder = StrudelPromptBuilder::new(6);
        let req = request(
            Mode::Edit,
            Some("setcpm(30)\n$: s(\"bd*4\")"),
            vec![msg(Role::User, "earlier turn")],
        );
        let prompt = builder.retry_prompt(&req, &["too many voices".to_string()]);
        assert!(prompt.contains("setcpm(30)\n$: s(\"bd*4\")"));
        assert!(prompt.contains("- too many voices"));
        assert!(prompt.contains("make it darker"));
        // History is not re-appended on the corrective pass.
        assert!(!prompt.contains("previous conversation"));
    }

    #[test]
    fn test_retry_prompt_new_mode_has_issues_but_no_code() {
        let builder = StrudelPromptBuilder::new(6);
        let req = request(Mode::New, Some("setcpm(30)"), vec![]);
        let prompt = builder.retry_prompt(
            &req,
            &["too many voices".to_string(), "missing setcpm".to_string()],
        );
        assert!(prompt.contains("- too many voices\n- missing setcpm\n"));
        assert!(!prompt.contains("```javascript\nsetcpm(30)"));
    }

    #[test]
    fn test_system_prompt_override_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("system.txt");
        std::fs::write(&path, "custom system").unwrap();

        let builder = StrudelPromptBuilder::new(6)
            .with_system_prompt_file(&path)
            .unwrap();
        assert_eq!(builder.system_prompt(), "custom system");

        let missing = StrudelPromptBuilder::new(6).with_system_prompt_file(&dir.path().join("nope.txt"));
        assert!(missing.is_err());
    }
}
