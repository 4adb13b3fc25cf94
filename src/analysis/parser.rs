//! Email content splitter: best-effort header and body extraction from pasted text.
//!
//! Pure string parsing, not an RFC 822 / MIME parser: no header decoding, no
//! multipart handling. Unrecognizable input falls back to "everything is body".

use std::sync::LazyLock;

use regex::Regex;

use super::types::EmailData;

static FROM_NAME_AND_ADDRESS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)from:\s*(.+?)\s*<(.+?)>").expect("valid from-with-address pattern")
});

static FROM_SINGLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)from:\s*(.+)").expect("valid bare from pattern"));

const SUBJECT_PREFIX: &str = "subject:";

/// Split raw pasted email text into sender, subject and body.
///
/// Every line is scanned. Header lines keep applying after the body has
/// started, so the last `From:` or `Subject:` wins.
pub fn parse(raw_text: &str) -> EmailData {
    let lines: Vec<&str> = raw_text.lines().collect();

    let mut sender_name = String::new();
    let mut sender_email = String::new();
    let mut subject = String::new();
    let mut body_start: Option<usize> = None;

    for (i, line) in lines.iter().enumerate() {
        let line = line.trim();

        if has_prefix_ignore_case(line, "from:") {
            if let Some((name, email)) = parse_from_line(line) {
                sender_name = name;
                sender_email = email;
            }
        } else if has_prefix_ignore_case(line, SUBJECT_PREFIX) {
            subject = line[SUBJECT_PREFIX.len()..].trim().to_string();
        } else if body_start.is_none() && is_body_marker(line) {
            body_start = Some(i + 1);
        }
    }

    let mut body = body_start
        .filter(|&start| start < lines.len())
        .map(|start| lines[start..].join("\n").trim().to_string())
        .unwrap_or_default();

    if sender_email.is_empty() && subject.is_empty() && body.is_empty() {
        body = raw_text.to_string();
    }

    EmailData {
        raw_text: raw_text.to_string(),
        sender_email: non_empty(sender_email),
        sender_name: non_empty(sender_name),
        subject: non_empty(subject),
        body: non_empty(body),
    }
}

/// Returns `(name, email)`. A bare `From: x` line fills both with `x`.
fn parse_from_line(line: &str) -> Option<(String, String)> {
    if let Some(caps) = FROM_NAME_AND_ADDRESS.captures(line) {
        let name = caps.get(1).map(|m| m.as_str().trim()).unwrap_or_default();
        let email = caps.get(2).map(|m| m.as_str().trim()).unwrap_or_default();
        return Some((name.to_string(), email.to_string()));
    }
    FROM_SINGLE.captures(line).and_then(|caps| {
        let value = caps.get(1)?.as_str().trim().to_string();
        Some((value.clone(), value))
    })
}

fn is_body_marker(line: &str) -> bool {
    line.is_empty() || line.eq_ignore_ascii_case("body:")
}

fn has_prefix_ignore_case(line: &str, prefix: &str) -> bool {
    line.get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() { None } else { Some(s) }
}

const URGENT_WORDS: &[&str] = &[
    "urgent",
    "immediate",
    "act now",
    "deadline",
    "expires",
    "limited time",
];

const FINANCIAL_WORDS: &[&str] = &[
    "payment",
    "money",
    "bank",
    "account",
    "wire transfer",
    "gift card",
];

/// Cheap local red flags, reported next to the model's verdict.
///
/// These never influence the verdict itself.
pub fn suspicious_patterns(email: &EmailData) -> Vec<String> {
    let mut patterns = Vec::new();
    let content = email.raw_text.to_lowercase();

    if let (Some(address), Some(name)) = (&email.sender_email, &email.sender_name) {
        let domain_label = address
            .split('@')
            .nth(1)
            .and_then(|domain| domain.split('.').next())
            .map(str::to_lowercase);
        if let Some(label) = domain_label {
            if !label.is_empty() && !name.to_lowercase().contains(&label) {
                patterns.push("Sender name does not match email domain".to_string());
            }
        }
    }

    for word in URGENT_WORDS {
        if content.contains(word) {
            patterns.push(format!("Contains urgent language: \"{word}\""));
        }
    }

    for word in FINANCIAL_WORDS {
        if content.contains(word) {
            patterns.push(format!("Requests related to: \"{word}\""));
        }
    }

    if content.contains("http") && (content.contains("bit.ly") || content.contains("tinyurl")) {
        patterns.push("Contains shortened links that may hide the true destination".to_string());
    }

    patterns
}
