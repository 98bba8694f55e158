use crate::models::{OptimizationRecommendation, WifiBand, WifiConfig};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    Channel,
    Frequency,
    Signal,
}

/// A current-vs-recommended card for one recommended change
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonBlock {
    pub kind: BlockKind,
    pub title: &'static str,
    pub current: String,
    pub recommended_label: &'static str,
    pub recommended: String,
    pub message: String,
}

impl ComparisonBlock {
    /// e.g. `Current: 6 → Recommended: 11`
    pub fn summary(&self) -> String {
        format!(
            "Current: {} → {}: {}",
            self.current, self.recommended_label, self.recommended
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RecommendationView {
    Optimal {
        title: &'static str,
        message: &'static str,
    },
    Changes {
        blocks: Vec<ComparisonBlock>,
    },
}

/// The results card as a whole
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultsCard {
    pub description: &'static str,
    pub view: RecommendationView,
}

pub fn present(config: &WifiConfig, rec: &OptimizationRecommendation) -> ResultsCard {
    if rec.is_optimal() {
        return ResultsCard {
            description: "Your WiFi is already optimized!",
            view: RecommendationView::Optimal {
                title: "Great Configuration!",
                message: "Your current WiFi settings are already optimal for your environment.",
            },
        };
    }

    let mut blocks = Vec::new();

    if let Some(channel) = rec.recommended_channel {
        blocks.push(ComparisonBlock {
            kind: BlockKind::Channel,
            title: "Channel Optimization",
            current: config.channel.to_string(),
            recommended_label: "Recommended",
            recommended: channel.to_string(),
            message: format!(
                "Switching to channel {} will reduce interference from nearby networks.",
                channel
            ),
        });
    }

    if let Some(frequency) = rec.recommended_frequency {
        let message = if frequency == 5000 {
            "Switch to 5 GHz for faster speeds at shorter range."
        } else {
            "Switch to 2.4 GHz for better range and wall penetration."
        };
        blocks.push(ComparisonBlock {
            kind: BlockKind::Frequency,
            title: "Frequency Band",
            current: config.band().label().to_string(),
            recommended_label: "Recommended",
            recommended: WifiBand::from_frequency(frequency).label().to_string(),
            message: message.to_string(),
        });
    }

    if let Some(expected) = rec.signal_improvement {
        // Plain difference between the two readings
        let delta = i64::from(expected) - i64::from(config.signal_strength);
        blocks.push(ComparisonBlock {
            kind: BlockKind::Signal,
            title: "Expected Improvement",
            current: format!("{} dBm", config.signal_strength),
            recommended_label: "Expected",
            recommended: format!("{} dBm", expected),
            message: format!(
                "Signal strength improvement of approximately {} dBm expected.",
                delta
            ),
        });
    }

    ResultsCard {
        description: "Recommendations to improve your WiFi performance",
        view: RecommendationView::Changes { blocks },
    }
}

/// Plain-text rendering used by the `analyze` command.
pub fn render_text(config: &WifiConfig, card: &ResultsCard) -> String {
    let mut out = String::new();

    out.push_str("═══════════════════════════════════════════════════════════════════\n");
    out.push_str("                        Optimization Results                        \n");
    out.push_str("═══════════════════════════════════════════════════════════════════\n\n");
    out.push_str(&format!(
        "  Network: {} (channel {}, {}, {} dBm, interference {:.1})\n",
        config.ssid,
        config.channel,
        config.band().label(),
        config.signal_strength,
        config.interference_level
    ));
    out.push_str(&format!("  {}\n\n", card.description));

    match &card.view {
        RecommendationView::Optimal { title, message } => {
            out.push_str(&format!("  ✔ {}\n", title));
            out.push_str(&format!("    {}\n", message));
        }
        RecommendationView::Changes { blocks } => {
            for block in blocks {
                out.push_str("───────────────────────────────────────────────────────────────────\n");
                out.push_str(&format!("  {}\n", block.title));
                out.push_str(&format!("    {}\n", block.summary()));
                out.push_str(&format!("    {}\n", block.message));
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> WifiConfig {
        WifiConfig {
            ssid: "Home".to_string(),
            channel: 6,
            frequency: 2400,
            signal_strength: -50,
            interference_level: 0.3,
        }
    }

    fn blocks(card: &ResultsCard) -> &[ComparisonBlock] {
        match &card.view {
            RecommendationView::Changes { blocks } => blocks.as_slice(),
            RecommendationView::Optimal { .. } => &[],
        }
    }

    #[test]
    fn no_fields_renders_only_the_optimal_state() {
        let card = present(&config(), &OptimizationRecommendation::default());
        assert!(matches!(card.view, RecommendationView::Optimal { .. }));
        assert_eq!(card.description, "Your WiFi is already optimized!");
        assert!(blocks(&card).is_empty());
    }

    #[test]
    fn channel_only_renders_one_channel_block() {
        let rec = OptimizationRecommendation {
            recommended_channel: Some(11),
            ..Default::default()
        };
        let card = present(&config(), &rec);
        let blocks = blocks(&card);

        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].kind, BlockKind::Channel);
        assert_eq!(blocks[0].summary(), "Current: 6 → Recommended: 11");
        assert_eq!(
            blocks[0].message,
            "Switching to channel 11 will reduce interference from nearby networks."
        );
    }

    #[test]
    fn frequency_wording_follows_the_recommended_band() {
        let to_5 = OptimizationRecommendation {
            recommended_frequency: Some(5000),
            ..Default::default()
        };
        let card = present(&config(), &to_5);
        let block = &blocks(&card)[0];
        assert_eq!(blocks(&card).len(), 1);
        assert_eq!(block.summary(), "Current: 2.4 GHz → Recommended: 5 GHz");
        assert_eq!(block.message, "Switch to 5 GHz for faster speeds at shorter range.");

        let on_5 = WifiConfig {
            frequency: 5000,
            ..config()
        };
        let to_24 = OptimizationRecommendation {
            recommended_frequency: Some(2400),
            ..Default::default()
        };
        let card = present(&on_5, &to_24);
        let block = &blocks(&card)[0];
        assert_eq!(block.summary(), "Current: 5 GHz → Recommended: 2.4 GHz");
        assert_eq!(
            block.message,
            "Switch to 2.4 GHz for better range and wall penetration."
        );
    }

    #[test]
    fn signal_block_shows_plain_difference() {
        let rec = OptimizationRecommendation {
            signal_improvement: Some(-40),
            ..Default::default()
        };
        let card = present(&config(), &rec);
        let block = &blocks(&card)[0];
        assert_eq!(blocks(&card).len(), 1);
        assert_eq!(block.kind, BlockKind::Signal);
        assert_eq!(block.summary(), "Current: -50 dBm → Expected: -40 dBm");
        assert_eq!(
            block.message,
            "Signal strength improvement of approximately 10 dBm expected."
        );
    }

    #[test]
    fn all_fields_render_in_fixed_order() {
        let rec = OptimizationRecommendation {
            recommended_channel: Some(1),
            recommended_frequency: Some(5000),
            signal_improvement: Some(-45),
        };
        let card = present(&config(), &rec);
        let kinds: Vec<_> = blocks(&card).iter().map(|b| b.kind).collect();
        assert_eq!(kinds, vec![BlockKind::Channel, BlockKind::Frequency, BlockKind::Signal]);
        assert_eq!(card.description, "Recommendations to improve your WiFi performance");
    }

    #[test]
    fn view_serializes_with_state_tag() {
        let card = present(&config(), &OptimizationRecommendation::default());
        let value = serde_json::to_value(&card).unwrap();
        assert_eq!(value["view"]["state"], "optimal");
        assert_eq!(value["view"]["title"], "Great Configuration!");
    }

    #[test]
    fn text_rendering_lists_each_block() {
        let rec = OptimizationRecommendation {
            recommended_channel: Some(11),
            ..Default::default()
        };
        let text = render_text(&config(), &present(&config(), &rec));
        assert!(text.contains("Channel Optimization"));
        assert!(text.contains("Current: 6 → Recommended: 11"));
        assert!(!text.contains("Frequency Band"));
    }
}
