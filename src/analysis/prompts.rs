//! Scam-detection prompt template and the helpers that fill its two slots.

use super::types::EmailData;

/// System message sent with every analysis request.
pub const SYSTEM_INSTRUCTION: &str = "You are a cybersecurity expert focused on protecting seniors from scams. Always respond with valid JSON only.";

/// Placeholder used when the user has no trusted contacts on file.
pub const NO_TRUSTED_CONTACTS: &str = "No trusted contacts available";

/// User-message template. `{emailContent}` and `{trustedContacts}` are the only slots.
pub const SCAM_DETECTION_PROMPT: &str = r#"You are an expert cybersecurity analyst specializing in protecting seniors from email scams. Analyze the following email content and provide a clear safety assessment.

EMAIL CONTENT:
{emailContent}

TRUSTED CONTACTS (people the user knows and trusts):
{trustedContacts}

ANALYSIS INSTRUCTIONS:
1. Extract key email components (sender, subject, main message)
2. Identify potential scam indicators:
   - Sender name/email mismatch
   - Urgent or threatening language
   - Requests for personal information or money
   - Suspicious links or attachments
   - Promises that seem too good to be true
   - Poor grammar or unusual formatting
   - Messages claiming to come from a trusted contact but sent from an unfamiliar address

3. Evaluate overall risk level and assign ONE of these verdicts:
   - DANGER: Clear scam indicators, immediate action needed
   - SUSPICIOUS: Several concerning elements, caution advised
   - RISKY: Some unusual elements, verify before proceeding
   - SAFE: No apparent risks, normal communication

4. When recommending a second opinion, suggest one of the trusted contacts by name if any are listed.

RESPONSE FORMAT (JSON only):
{
  "verdict": "DANGER|SUSPICIOUS|RISKY|SAFE",
  "confidence": 85,
  "explanation": "Clear explanation in simple language for seniors",
  "riskFactors": ["List specific concerns", "Be specific about what to watch for"],
  "isScam": true/false,
  "actions": [
    {
      "description": "Specific action to take",
      "channelSpecific": "Email-specific instruction if applicable"
    }
  ]
}

IMPORTANT:
- Use simple, clear language appropriate for seniors
- Be specific about risks without causing unnecessary alarm
- Focus on actionable safety steps
- If suspicious but not clearly dangerous, recommend verification steps"#;

/// Render the email as the model sees it.
pub fn format_email_content(email: &EmailData) -> String {
    let mut content = String::new();

    if email.sender_email.is_some() || email.sender_name.is_some() {
        content.push_str(&format!(
            "FROM: {} <{}>\n",
            email.sender_name.as_deref().unwrap_or_default(),
            email.sender_email.as_deref().unwrap_or_default()
        ));
    }

    if let Some(subject) = &email.subject {
        content.push_str(&format!("SUBJECT: {subject}\n"));
    }

    content.push_str("\nBODY:\n");
    content.push_str(email.body.as_deref().unwrap_or(&email.raw_text));
    content
}

/// Bullet list of contact descriptions, or the no-contacts placeholder.
pub fn format_trusted_contacts(contacts: &[String]) -> String {
    if contacts.is_empty() {
        return NO_TRUSTED_CONTACTS.to_string();
    }
    contacts
        .iter()
        .map(|c| format!("- {c}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Fill both template slots.
pub fn render_prompt(email: &EmailData, contacts: &[String]) -> String {
    // Contacts go in first so an email body that happens to contain the
    // literal `{trustedContacts}` is left alone.
    SCAM_DETECTION_PROMPT
        .replacen("{trustedContacts}", &format_trusted_contacts(contacts), 1)
        .replacen("{emailContent}", &format_email_content(email), 1)
}
