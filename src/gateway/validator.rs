//! Output validation for extracted Strudel code.
//!
//! The orchestrator only depends on [`CodeValidator`]; the rules here are the
//! default set and can be swapped without touching the retry logic.

use std::sync::LazyLock;

use regex::Regex;

use crate::constants::validation::{DEFAULT_MAX_LINES, DEFAULT_MAX_RANDOM_USAGE, DEFAULT_MAX_VOICES};

/// Numeric thresholds handed to the validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationLimits {
    pub max_voices: usize,
    pub max_lines: usize,
    pub max_random_usage: usize,
}

impl Default for ValidationLimits {
    fn default() -> Self {
        Self {
            max_voices: DEFAULT_MAX_VOICES,
            max_lines: DEFAULT_MAX_LINES,
            max_random_usage: DEFAULT_MAX_RANDOM_USAGE,
        }
    }
}

/// Verdict on one attempt's extracted code.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationOutcome {
    pub valid: bool,
    /// Ordered, human-readable problems. Empty when `valid`.
    pub issues: Vec<String>,
}

impl ValidationOutcome {
    fn from_issues(issues: Vec<String>) -> Self {
        Self {
            valid: issues.is_empty(),
            issues,
        }
    }
}

/// Pure judgement of extracted code. Must not have side effects.
pub trait CodeValidator: Send + Sync {
    fn validate(&self, code: &str, limits: &ValidationLimits) -> ValidationOutcome;
}

static RANDOM_CALL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:rand|irand|perlin|sometimes|often|rarely|degradeBy|shuffle|choose)\b")
        .expect("static regex is valid")
});

static GAIN_CALL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\.gain\(\s*([0-9]*\.?[0-9]+)\s*\)").expect("static regex is valid")
});

/// Default Strudel rule set.
#[derive(Debug, Default, Clone, Copy)]
pub struct StrudelValidator;

impl CodeValidator for StrudelValidator {
    fn validate(&self, code: &str, limits: &ValidationLimits) -> ValidationOutcome {
        let mut issues = Vec::new();

        let voices = count_voices(code);
        if voices > limits.max_voices {
            issues.push(format!(
                "too many voices ({voices}, max {})",
                limits.max_voices
            ));
        }

        let lines = code.lines().filter(|l| !l.trim().is_empty()).count();
        if lines > limits.max_lines {
            issues.push(format!("too many lines ({lines}, max {})", limits.max_lines));
        }

        let random_calls = RANDOM_CALL.find_iter(code).count();
        if random_calls > limits.max_random_usage {
            issues.push(format!(
                "too much randomness ({random_calls} calls, max {})",
                limits.max_random_usage
            ));
        }

        if !code.contains("setcpm(") {
            issues.push("missing setcpm(...) tempo".to_string());
        }

        if !brackets_balanced(code) {
            issues.push("unbalanced brackets or parentheses".to_string());
        }

        if let Some(gain) = loudest_gain(code)
            && gain > 1.0
        {
            issues.push(format!("gain too high ({gain}), keep it at or below 1.0"));
        }

        ValidationOutcome::from_issues(issues)
    }
}

fn count_voices(code: &str) -> usize {
    code.lines()
        .filter(|line| line.trim_start().starts_with("$:"))
        .count()
}

fn loudest_gain(code: &str) -> Option<f64> {
    GAIN_CALL
        .captures_iter(code)
        .filter_map(|caps| caps.get(1)?.as_str().parse::<f64>().ok())
        .reduce(f64::max)
}

/// Bracket matching that skips over string literals and `//` comments.
fn brackets_balanced(code: &str) -> bool {
    let mut stack = Vec::new();
    let mut quote: Option<char> = None;
    let mut chars = code.chars().peekable();

    while let Some(c) = chars.next() {
        if let Some(q) = quote {
            match c {
                '\\' => {
                    chars.next();
                }
                _ if c == q => quote = None,
                _ => {}
            }
            continue;
        }

        match c {
            '"' | '\'' | '`' => quote = Some(c),
            '/' if chars.peek() == Some(&'/') => {
                for next in chars.by_ref() {
                    if next == '\n' {
                        break;
                    }
                }
            }
            '(' | '[' | '{' => stack.push(c),
            ')' | ']' | '}' => {
                let expected = match c {
                    ')' => '(',
                    ']' => '[',
                    _ => '{',
                };
                if stack.pop() != Some(expected) {
                    return false;
                }
            }
            _ => {}
        }
    }

    stack.is_empty() && quote.is_none()
}
