//! Static verdict table: color, action copy and escalation flags per level.

use serde::Serialize;

use super::types::{VerdictAction, VerdictColor, VerdictLevel};

/// Per-channel action copy shown to the user.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ChannelActions {
    pub email: &'static str,
    pub sms: Option<&'static str>,
    pub general: &'static str,
}

/// Fixed UI configuration for one verdict level.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerdictConfig {
    pub level: VerdictLevel,
    pub color: VerdictColor,
    pub actions: ChannelActions,
    pub requires_human_help: bool,
    pub requires_lifeline: bool,
    /// 1 is the most urgent.
    pub priority: u8,
}

impl VerdictConfig {
    /// The single action attached to every normalized result.
    pub fn primary_action(&self) -> VerdictAction {
        VerdictAction {
            description: self.actions.general.to_string(),
            channel_specific: Some(self.actions.email.to_string()),
        }
    }
}

pub static DANGER: VerdictConfig = VerdictConfig {
    level: VerdictLevel::Danger,
    color: VerdictColor::Red,
    actions: ChannelActions {
        email: "Delete this email immediately and mark as spam. Do not click any links or reply.",
        sms: Some("Delete this message and block the sender. Do not respond."),
        general: "Delete and ignore. This appears to be a scam.",
    },
    requires_human_help: false,
    requires_lifeline: false,
    priority: 1,
};

pub static SUSPICIOUS: VerdictConfig = VerdictConfig {
    level: VerdictLevel::Suspicious,
    color: VerdictColor::Orange,
    actions: ChannelActions {
        email: "Do not reply or click links. Share with a trusted family member for second opinion.",
        sms: Some("Pause and ask a family member before responding."),
        general: "Be cautious. Get a second opinion from someone you trust.",
    },
    requires_human_help: true,
    requires_lifeline: true,
    priority: 2,
};

pub static RISKY: VerdictConfig = VerdictConfig {
    level: VerdictLevel::Risky,
    color: VerdictColor::Yellow,
    actions: ChannelActions {
        email: "Verify with official sources before taking any action requested.",
        sms: Some("Double-check with known contacts before proceeding."),
        general: "Proceed with caution and verify information independently.",
    },
    requires_human_help: true,
    requires_lifeline: true,
    priority: 3,
};

pub static SAFE: VerdictConfig = VerdictConfig {
    level: VerdictLevel::Safe,
    color: VerdictColor::Green,
    actions: ChannelActions {
        email: "No apparent risks. Continue as normal but stay vigilant.",
        sms: Some("Normal communication. No special precautions needed."),
        general: "Appears safe, but maintain good safety habits.",
    },
    requires_human_help: false,
    requires_lifeline: false,
    priority: 4,
};

/// All levels, most urgent first.
pub static ALL: [&VerdictConfig; 4] = [&DANGER, &SUSPICIOUS, &RISKY, &SAFE];

/// Look up the table entry for a verdict string.
///
/// Matching is case-sensitive. Anything unrecognized resolves to SAFE so a
/// garbled model answer never produces alarming copy.
pub fn lookup(verdict: &str) -> &'static VerdictConfig {
    match verdict {
        "DANGER" => &DANGER,
        "SUSPICIOUS" => &SUSPICIOUS,
        "RISKY" => &RISKY,
        _ => &SAFE,
    }
}

/// Table entry for an already-typed level.
pub fn config_for(level: VerdictLevel) -> &'static VerdictConfig {
    match level {
        VerdictLevel::Danger => &DANGER,
        VerdictLevel::Suspicious => &SUSPICIOUS,
        VerdictLevel::Risky => &RISKY,
        VerdictLevel::Safe => &SAFE,
    }
}
