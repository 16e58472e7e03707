//! Scoring profiles: weighted rule lists, signal gates and backtest entry rules.
//!
//! Presets differ only in data; the scoring engine evaluates any profile the
//! same way.

use crate::domain::error::SwingscanError;
use crate::domain::rule::Predicate;
use crate::ports::config_port::{ConfigPort, get_parsed};

pub const MAX_TOTAL_WEIGHT: u32 = 100;
pub const DEFAULT_PULLBACK_TOLERANCE: f64 = 0.01;
pub const DEFAULT_MOMENTUM_CEILING: f64 = 50.0;
pub const DEFAULT_HIGHER_RSI_FLOOR: f64 = 50.0;

#[derive(Debug, Clone, PartialEq)]
pub struct WeightedRule {
    pub name: String,
    pub predicate: Predicate,
    pub weight: u32,
}

impl WeightedRule {
    pub fn new(predicate: Predicate, weight: u32) -> Self {
        Self {
            name: predicate.key().to_string(),
            predicate,
            weight,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SignalGate {
    /// Every predicate holds on the latest bar.
    AllOf(Vec<Predicate>),
    /// score > threshold and `confirm` holds.
    ScoreAbove { threshold: u32, confirm: Predicate },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoringProfile {
    pub name: String,
    pub rules: Vec<WeightedRule>,
    pub gate: SignalGate,
    /// Primary-timeframe conjunction replayed by the backtest.
    pub entry_rule: Vec<Predicate>,
}

pub const PRESET_NAMES: [&str; 2] = ["swing", "daily"];

impl ScoringProfile {
    /// Daily setup confirmed on 4h bars; signal requires the full setup today.
    pub fn swing() -> Self {
        Self {
            name: "swing".into(),
            rules: vec![
                WeightedRule::new(Predicate::Trend, 20),
                WeightedRule::new(pullback(), 15),
                WeightedRule::new(gated_momentum(), 15),
                WeightedRule::new(Predicate::VolumeConfirmation, 10),
                WeightedRule::new(Predicate::RelativeStrength { floor: 0.0 }, 10),
                WeightedRule::new(
                    Predicate::HigherTimeframe {
                        rsi_floor: DEFAULT_HIGHER_RSI_FLOOR,
                    },
                    20,
                ),
            ],
            gate: SignalGate::AllOf(vec![
                Predicate::Trend,
                pullback(),
                Predicate::MomentumTurn {
                    prior_ceiling: None,
                },
                Predicate::VolumeConfirmation,
            ]),
            entry_rule: default_entry_rule(),
        }
    }

    /// Daily bars only; the higher-timeframe weight is spread over the rest.
    pub fn daily() -> Self {
        Self {
            name: "daily".into(),
            rules: vec![
                WeightedRule::new(Predicate::Trend, 25),
                WeightedRule::new(pullback(), 20),
                WeightedRule::new(gated_momentum(), 20),
                WeightedRule::new(Predicate::VolumeConfirmation, 15),
                WeightedRule::new(Predicate::RelativeStrength { floor: 0.0 }, 20),
            ],
            gate: SignalGate::ScoreAbove {
                threshold: 70,
                confirm: Predicate::VolumeConfirmation,
            },
            entry_rule: default_entry_rule(),
        }
    }

    pub fn preset(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "swing" => Some(Self::swing()),
            "daily" => Some(Self::daily()),
            _ => None,
        }
    }

    pub fn total_weight(&self) -> u32 {
        self.rules.iter().map(|r| r.weight).sum()
    }

    pub fn needs_higher_timeframe(&self) -> bool {
        let in_rules = self
            .rules
            .iter()
            .any(|r| r.predicate.needs_higher_timeframe());
        let in_gate = match &self.gate {
            SignalGate::AllOf(predicates) => {
                predicates.iter().any(Predicate::needs_higher_timeframe)
            }
            SignalGate::ScoreAbove { confirm, .. } => confirm.needs_higher_timeframe(),
        };
        in_rules || in_gate
    }

    /// Apply a transformation to every predicate the profile carries.
    pub fn map_predicates(&mut self, f: impl Fn(&mut Predicate)) {
        for rule in &mut self.rules {
            f(&mut rule.predicate);
        }
        match &mut self.gate {
            SignalGate::AllOf(predicates) => predicates.iter_mut().for_each(&f),
            SignalGate::ScoreAbove { confirm, .. } => f(confirm),
        }
        self.entry_rule.iter_mut().for_each(&f);
    }

    pub fn validate(&self) -> Result<(), SwingscanError> {
        let invalid = |reason: String| SwingscanError::ProfileInvalid {
            profile: self.name.clone(),
            reason,
        };

        if self.rules.is_empty() {
            return Err(invalid("no weighted rules".into()));
        }
        let total = self.total_weight();
        if total > MAX_TOTAL_WEIGHT {
            return Err(invalid(format!(
                "weights sum to {}, maximum is {}",
                total, MAX_TOTAL_WEIGHT
            )));
        }
        for (i, rule) in self.rules.iter().enumerate() {
            if self.rules[..i].iter().any(|r| r.name == rule.name) {
                return Err(invalid(format!("duplicate rule '{}'", rule.name)));
            }
        }
        match self.gate {
            SignalGate::ScoreAbove { threshold, .. } if threshold >= MAX_TOTAL_WEIGHT => {
                return Err(invalid(format!(
                    "signal threshold {} can never be exceeded",
                    threshold
                )));
            }
            SignalGate::AllOf(ref predicates) if predicates.is_empty() => {
                return Err(invalid("signal gate has no predicates".into()));
            }
            _ => {}
        }
        if self.entry_rule.is_empty() {
            return Err(invalid("backtest entry rule is empty".into()));
        }
        if let Some(p) = self.entry_rule.iter().find(|p| !p.is_primary()) {
            return Err(invalid(format!(
                "backtest entry rule may only use primary-timeframe predicates, found '{}'",
                p.key()
            )));
        }

        let mut bad_param = None;
        let mut check = |p: &Predicate| match p {
            Predicate::Pullback { tolerance } if !(*tolerance > 0.0) => {
                bad_param = Some(format!("pullback tolerance {} must be positive", tolerance))
            }
            Predicate::MomentumTurn {
                prior_ceiling: Some(c),
            } if !(0.0..=100.0).contains(c) => {
                bad_param = Some(format!("momentum ceiling {} outside 0..=100", c))
            }
            Predicate::HigherTimeframe { rsi_floor } if !(0.0..=100.0).contains(rsi_floor) => {
                bad_param = Some(format!("higher timeframe RSI floor {} outside 0..=100", rsi_floor))
            }
            _ => {}
        };
        self.rules.iter().for_each(|r| check(&r.predicate));
        self.entry_rule.iter().for_each(&mut check);
        match bad_param {
            Some(reason) => Err(invalid(reason)),
            None => Ok(()),
        }
    }
}

impl ScoringProfile {
    /// Build the profile named by `[profile] preset` (or `preset_override`) and
    /// apply any weight, threshold and parameter overrides from `[profile]`.
    pub fn from_config(
        config: &dyn ConfigPort,
        preset_override: Option<&str>,
    ) -> Result<Self, SwingscanError> {
        let preset = match preset_override {
            Some(name) => name.to_string(),
            None => config
                .get_string("profile", "preset")
                .unwrap_or_else(|| PRESET_NAMES[0].to_string()),
        };
        let mut profile = Self::preset(&preset).ok_or_else(|| SwingscanError::ConfigInvalid {
            section: "profile".into(),
            key: "preset".into(),
            reason: format!(
                "unknown preset '{}', expected one of: {}",
                preset.trim(),
                PRESET_NAMES.join(", ")
            ),
        })?;

        if let Some(name) = config.get_string("profile", "name") {
            if !name.trim().is_empty() {
                profile.name = name.trim().to_string();
            }
        }

        for rule in &mut profile.rules {
            let key = format!("{}_weight", rule.name);
            rule.weight = get_parsed(config, "profile", &key, rule.weight)?;
        }
        for key in WEIGHT_KEYS {
            if config.get_string("profile", key).is_some()
                && !profile.rules.iter().any(|r| format!("{}_weight", r.name) == key)
            {
                return Err(SwingscanError::ConfigInvalid {
                    section: "profile".into(),
                    key: key.to_string(),
                    reason: format!("preset '{}' has no such rule", preset.trim()),
                });
            }
        }

        if config.get_string("profile", "signal_threshold").is_some() {
            match &mut profile.gate {
                SignalGate::ScoreAbove { threshold, .. } => {
                    *threshold = get_parsed(config, "profile", "signal_threshold", *threshold)?;
                }
                SignalGate::AllOf(_) => {
                    return Err(SwingscanError::ConfigInvalid {
                        section: "profile".into(),
                        key: "signal_threshold".into(),
                        reason: format!(
                            "preset '{}' signals on the full setup, not a score threshold",
                            preset.trim()
                        ),
                    });
                }
            }
        }

        let tolerance: f64 = get_parsed(
            config,
            "profile",
            "pullback_tolerance",
            DEFAULT_PULLBACK_TOLERANCE,
        )?;
        let ceiling: f64 = get_parsed(
            config,
            "profile",
            "momentum_ceiling",
            DEFAULT_MOMENTUM_CEILING,
        )?;
        profile.map_predicates(|p| match p {
            Predicate::Pullback { tolerance: t } => *t = tolerance,
            Predicate::MomentumTurn {
                prior_ceiling: Some(c),
            } => *c = ceiling,
            _ => {}
        });

        profile.validate()?;
        Ok(profile)
    }
}

const WEIGHT_KEYS: [&str; 6] = [
    "trend_weight",
    "pullback_weight",
    "momentum_weight",
    "volume_weight",
    "relative_strength_weight",
    "higher_timeframe_weight",
];

fn pullback() -> Predicate {
    Predicate::Pullback {
        tolerance: DEFAULT_PULLBACK_TOLERANCE,
    }
}

fn gated_momentum() -> Predicate {
    Predicate::MomentumTurn {
        prior_ceiling: Some(DEFAULT_MOMENTUM_CEILING),
    }
}

fn default_entry_rule() -> Vec<Predicate> {
    vec![
        Predicate::Trend,
        pullback(),
        gated_momentum(),
        Predicate::VolumeConfirmation,
    ]
}
