//! Tuning bundle for the fugitive's per-turn decision engine.

use serde::{Deserialize, Serialize};

/// Configuration for the movement decision engine.
///
/// Every field has a serde default so partial overlays deserialize cleanly;
/// the defaults reproduce the reference balance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HuntConfig {
    /// Moves allowed within one round before the fugitive runs out of time.
    #[serde(default = "HuntConfig::default_turn_limit")]
    pub turn_limit: u32,
    /// Safety margin subtracted from the turn limit when judging whether a
    /// candidate path is affordable.
    #[serde(default = "HuntConfig::default_turn_buffer")]
    pub turn_buffer: u32,
    /// Decreasing deterrent magnitudes tried per turn; the final entry must
    /// be 0.0 so a plan always exists.
    #[serde(default = "HuntConfig::default_deterrent_ladder")]
    pub deterrent_ladder: Vec<f32>,
    /// Pursuer-view hops covered by the deterrent walk.
    #[serde(default = "HuntConfig::default_deterrent_radius")]
    pub deterrent_radius: u32,
    /// Pursuers closer than this (relaxed-water move distance) get their
    /// crossings poisoned outright.
    #[serde(default = "HuntConfig::default_poison_radius")]
    pub poison_radius: f32,
    /// Turn count after which water stops being artificially avoided.
    #[serde(default = "HuntConfig::default_desperation_turn")]
    pub desperation_turn: u32,
    /// Last turn on which a cornered fugitive may still burn a rapid-transit
    /// tactic instead of conceding.
    #[serde(default = "HuntConfig::default_late_rapid_cutoff")]
    pub late_rapid_cutoff: u32,
    /// Closest-pursuer edge distance that reads as "breathing down the neck"
    /// while the fugitive stands on revealed evidence.
    #[serde(default = "HuntConfig::default_rapid_closest_threshold")]
    pub rapid_closest_threshold: u32,
    /// Mean pursuer edge distance below which rapid transit looks attractive.
    #[serde(default = "HuntConfig::default_rapid_average_threshold")]
    pub rapid_average_threshold: f32,
    /// Looser mean threshold once only one destination remains.
    #[serde(default = "HuntConfig::default_rapid_final_average_threshold")]
    pub rapid_final_average_threshold: f32,
    /// Probability of spending a shortcut that an ordinary one-move route
    /// would duplicate; keeps shortcut use unpredictable.
    #[serde(default = "HuntConfig::default_shortcut_whim_chance")]
    pub shortcut_whim_chance: f32,
}

impl Default for HuntConfig {
    fn default() -> Self {
        Self {
            turn_limit: Self::default_turn_limit(),
            turn_buffer: Self::default_turn_buffer(),
            deterrent_ladder: Self::default_deterrent_ladder(),
            deterrent_radius: Self::default_deterrent_radius(),
            poison_radius: Self::default_poison_radius(),
            desperation_turn: Self::default_desperation_turn(),
            late_rapid_cutoff: Self::default_late_rapid_cutoff(),
            rapid_closest_threshold: Self::default_rapid_closest_threshold(),
            rapid_average_threshold: Self::default_rapid_average_threshold(),
            rapid_final_average_threshold: Self::default_rapid_final_average_threshold(),
            shortcut_whim_chance: Self::default_shortcut_whim_chance(),
        }
    }
}

impl HuntConfig {
    #[must_use]
    pub fn default_config() -> Self {
        Self::default()
    }

    const fn default_turn_limit() -> u32 {
        16
    }

    const fn default_turn_buffer() -> u32 {
        2
    }

    fn default_deterrent_ladder() -> Vec<f32> {
        vec![1.0, 0.5, 0.25, 0.0]
    }

    const fn default_deterrent_radius() -> u32 {
        4
    }

    const fn default_poison_radius() -> f32 {
        2.0
    }

    const fn default_desperation_turn() -> u32 {
        7
    }

    const fn default_late_rapid_cutoff() -> u32 {
        13
    }

    const fn default_rapid_closest_threshold() -> u32 {
        2
    }

    const fn default_rapid_average_threshold() -> f32 {
        2.5
    }

    const fn default_rapid_final_average_threshold() -> f32 {
        4.0
    }

    const fn default_shortcut_whim_chance() -> f32 {
        0.25
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_playable() {
        let cfg = HuntConfig::default_config();
        assert_eq!(cfg.turn_limit, 16);
        assert!(cfg.turn_buffer < cfg.turn_limit);
        assert_eq!(cfg.deterrent_ladder.last(), Some(&0.0));
        assert!(cfg.late_rapid_cutoff < cfg.turn_limit);
    }

    #[test]
    fn partial_overlay_fills_defaults() {
        let cfg: HuntConfig = serde_json::from_str(r#"{ "turn_limit": 20 }"#).unwrap();
        assert_eq!(cfg.turn_limit, 20);
        assert_eq!(cfg.turn_buffer, 2);
        assert_eq!(cfg.deterrent_ladder, vec![1.0, 0.5, 0.25, 0.0]);
    }
}
