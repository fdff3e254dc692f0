use serde::{Deserialize, Serialize};
use std::fmt;

/// Audience classification sent with analysis requests. Wire tokens are
/// the gateway's own, so serde renames cover them.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Audience {
    #[serde(rename = "B端")]
    Business,
    #[serde(rename = "C端")]
    Consumer,
}

impl Audience {
    pub fn as_str(&self) -> &'static str {
        match self {
            Audience::Business => "B端",
            Audience::Consumer => "C端",
        }
    }
}

impl fmt::Display for Audience {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which output pipeline runs after a card is adopted. Local routing
/// only; never part of a gateway payload.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PublishTarget {
    ShortVideo,
    SocialPost,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct WorkflowInput {
    pub product_name: String,
    pub persona: String,
    pub target_customer: String,
    pub audience: Audience,
    /// Free text, split into a keyword list right before submission.
    pub keywords_raw: String,
    pub extra_context: Option<String>,
    /// Model provider forwarded on script and social-copy requests.
    pub provider: Option<String>,
    pub publish_target: PublishTarget,
}

impl Default for WorkflowInput {
    fn default() -> Self {
        Self {
            product_name: "零食食品生产".to_string(),
            persona: "工厂老板".to_string(),
            target_customer: "零食供应链商".to_string(),
            audience: Audience::Business,
            keywords_raw: "零食供应链\nOEM 代工\n食品安全".to_string(),
            extra_context: None,
            provider: None,
            publish_target: PublishTarget::ShortVideo,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct MarketingCopy {
    pub channel: String,
    pub copy: String,
}

/// One analysis result: a customer pain point plus suggested copy.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PainPointCard {
    pub id: String,
    pub title: String,
    pub scenario: String,
    pub pain_point: String,
    pub solution: String,
    #[serde(default)]
    pub recommended_copies: Vec<MarketingCopy>,
    /// Local bookmark, never sent back to the gateway.
    #[serde(skip_serializing, default)]
    pub saved: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct VoiceConfig {
    pub language: String,
    pub voice_style: String,
    pub age_group: String,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            language: "中文普通话".to_string(),
            voice_style: "女声".to_string(),
            age_group: "青年".to_string(),
        }
    }
}

pub const DEFAULT_VIDEO_STYLE: &str = "工厂实力展示";

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Scene {
    pub id: u32,
    pub title: String,
    pub visuals: String,
    pub voice_over: String,
    pub screen_text: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct VideoScript {
    pub headline: String,
    pub scenes: Vec<Scene>,
}

/// The single tracked video-rendering job. Status tokens are opaque
/// gateway strings; new values may appear without notice.
#[derive(Serialize, Deserialize, Default, Clone, Debug, PartialEq)]
pub struct VideoJob {
    pub job_id: Option<String>,
    pub status: Option<String>,
    pub video_url: Option<String>,
    pub audio_url: Option<String>,
}

#[derive(Serialize, Deserialize, Default, Clone, Debug, PartialEq)]
pub struct SocialCopySet {
    pub copies: Vec<String>,
    pub selected: Option<usize>,
}

impl SocialCopySet {
    /// How many copies a presentation surface shows at once. The full
    /// list stays in state.
    pub const FEATURED_LIMIT: usize = 5;

    pub fn is_empty(&self) -> bool {
        self.copies.is_empty()
    }

    pub fn featured(&self) -> &[String] {
        &self.copies[..self.copies.len().min(Self::FEATURED_LIMIT)]
    }

    pub fn selected_copy(&self) -> Option<&str> {
        self.selected
            .and_then(|i| self.copies.get(i))
            .map(String::as_str)
    }
}

/// The three stages of a workflow run.
#[derive(Serialize, Deserialize, Default, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    #[default]
    Input,
    Selection,
    Output,
}

impl Step {
    pub fn as_str(&self) -> &'static str {
        match self {
            Step::Input => "input",
            Step::Selection => "selection",
            Step::Output => "output",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audience_wire_tokens() {
        assert_eq!(serde_json::to_string(&Audience::Business).unwrap(), "\"B端\"");
        assert_eq!(serde_json::to_string(&Audience::Consumer).unwrap(), "\"C端\"");
        let parsed: Audience = serde_json::from_str("\"C端\"").unwrap();
        assert_eq!(parsed, Audience::Consumer);
    }

    #[test]
    fn test_saved_flag_stays_local() {
        let json = r#"{
            "id": "card-1",
            "title": "夜里赶订单",
            "scenario": "旺季产能吃紧",
            "pain_point": "小单不接，大单做不完",
            "solution": "柔性产线按周排产",
            "recommended_copies": [{"channel": "抖音", "copy": "工厂直供"}]
        }"#;
        let mut card: PainPointCard = serde_json::from_str(json).unwrap();
        assert!(!card.saved);

        card.saved = true;
        let out = serde_json::to_value(&card).unwrap();
        assert!(out.get("saved").is_none());
        assert_eq!(out["recommended_copies"][0]["channel"], "抖音");
    }

    #[test]
    fn test_social_copy_set_featured_is_capped() {
        let set = SocialCopySet {
            copies: (0..8).map(|i| format!("copy {}", i)).collect(),
            selected: Some(6),
        };
        assert_eq!(set.featured().len(), SocialCopySet::FEATURED_LIMIT);
        assert_eq!(set.selected_copy(), Some("copy 6"));

        let empty = SocialCopySet::default();
        assert!(empty.featured().is_empty());
        assert_eq!(empty.selected_copy(), None);
    }

    #[test]
    fn test_step_round_trip() {
        assert_eq!(serde_json::to_string(&Step::Selection).unwrap(), "\"selection\"");
        let step: Step = serde_json::from_str("\"output\"").unwrap();
        assert_eq!(step, Step::Output);
        assert_eq!(Step::default(), Step::Input);
    }
}
