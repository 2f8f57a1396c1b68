use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::error::{Result, RiskError};

/// Allowed distance of the weight total from 1.0
pub const WEIGHT_TOLERANCE: f64 = 0.01;

/// The four components blended into the composite score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreComponent {
    Utilization,
    HealthFactor,
    Concentration,
    StressSensitivity,
}

impl ScoreComponent {
    pub const ALL: [ScoreComponent; 4] = [
        ScoreComponent::Utilization,
        ScoreComponent::HealthFactor,
        ScoreComponent::Concentration,
        ScoreComponent::StressSensitivity,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ScoreComponent::Utilization => "utilization",
            ScoreComponent::HealthFactor => "health_factor",
            ScoreComponent::Concentration => "concentration",
            ScoreComponent::StressSensitivity => "stress_sensitivity",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            ScoreComponent::Utilization => "Utilization",
            ScoreComponent::HealthFactor => "Health Factor",
            ScoreComponent::Concentration => "Concentration",
            ScoreComponent::StressSensitivity => "Stress Sensitivity",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == name)
    }
}

/// Weights of the score components; must total 1.0 within [`WEIGHT_TOLERANCE`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub utilization: f64,
    pub health_factor: f64,
    pub concentration: f64,
    pub stress_sensitivity: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        ScoreWeights {
            utilization: 0.15,
            health_factor: 0.30,
            concentration: 0.25,
            stress_sensitivity: 0.30,
        }
    }
}

impl ScoreWeights {
    /// Build weights from a name -> weight map. Every component must be named exactly once.
    pub fn from_map(weights: &HashMap<String, f64>) -> Result<Self> {
        if let Some(unknown) = weights.keys().find(|k| ScoreComponent::from_name(k).is_none()) {
            return Err(RiskError::UnknownWeight { name: unknown.clone() });
        }

        let lookup = |component: ScoreComponent| {
            weights
                .get(component.as_str())
                .copied()
                .ok_or_else(|| RiskError::missing_config(format!("weights.{}", component.as_str())))
        };

        let parsed = ScoreWeights {
            utilization: lookup(ScoreComponent::Utilization)?,
            health_factor: lookup(ScoreComponent::HealthFactor)?,
            concentration: lookup(ScoreComponent::Concentration)?,
            stress_sensitivity: lookup(ScoreComponent::StressSensitivity)?,
        };
        parsed.validate()?;
        Ok(parsed)
    }

    pub fn get(&self, component: ScoreComponent) -> f64 {
        match component {
            ScoreComponent::Utilization => self.utilization,
            ScoreComponent::HealthFactor => self.health_factor,
            ScoreComponent::Concentration => self.concentration,
            ScoreComponent::StressSensitivity => self.stress_sensitivity,
        }
    }

    pub fn sum(&self) -> f64 {
        ScoreComponent::ALL.iter().map(|c| self.get(*c)).sum()
    }

    /// Reject negative weights and totals further than the tolerance from 1.0.
    /// Weights are never renormalized.
    pub fn validate(&self) -> Result<()> {
        for component in ScoreComponent::ALL {
            let weight = self.get(component);
            if !weight.is_finite() || weight < 0.0 {
                return Err(RiskError::invalid_config(
                    format!("weights.{}", component.as_str()),
                    format!("must be a non-negative number, got {}", weight),
                ));
            }
        }

        let sum = self.sum();
        if (sum - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(RiskError::InvalidWeights { sum });
        }
        Ok(())
    }
}

/// Per-component scores, each 0-100 with higher meaning riskier
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComponentScores {
    pub utilization: f64,
    pub health_factor: f64,
    pub concentration: f64,
    pub stress_sensitivity: f64,
}

impl ComponentScores {
    pub fn get(&self, component: ScoreComponent) -> f64 {
        match component {
            ScoreComponent::Utilization => self.utilization,
            ScoreComponent::HealthFactor => self.health_factor,
            ScoreComponent::Concentration => self.concentration,
            ScoreComponent::StressSensitivity => self.stress_sensitivity,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (ScoreComponent, f64)> + '_ {
        ScoreComponent::ALL.into_iter().map(move |c| (c, self.get(c)))
    }

    /// Weighted blend of the components
    pub fn weighted_sum(&self, weights: &ScoreWeights) -> f64 {
        self.iter().map(|(c, score)| score * weights.get(c)).sum()
    }

    /// Component with the highest score; first listed wins ties
    pub fn highest(&self) -> (ScoreComponent, f64) {
        self.iter()
            .fold((ScoreComponent::Utilization, f64::NEG_INFINITY), |best, current| {
                if current.1 > best.1 {
                    current
                } else {
                    best
                }
            })
    }
}

/// Risk label for a composite score. Bands are closed on their lower bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    Minimal,
    Low,
    Moderate,
    High,
    Critical,
}

impl RiskLevel {
    pub fn from_score(score: f64) -> Self {
        match score {
            s if s >= 80.0 => RiskLevel::Critical,
            s if s >= 65.0 => RiskLevel::High,
            s if s >= 45.0 => RiskLevel::Moderate,
            s if s >= 25.0 => RiskLevel::Low,
            _ => RiskLevel::Minimal,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Minimal => "MINIMAL",
            RiskLevel::Low => "LOW",
            RiskLevel::Moderate => "MODERATE",
            RiskLevel::High => "HIGH",
            RiskLevel::Critical => "CRITICAL",
        }
    }

    /// Display color used by presentation layers
    pub fn color(&self) -> &'static str {
        match self {
            RiskLevel::Minimal => "green",
            RiskLevel::Low => "lightgreen",
            RiskLevel::Moderate => "yellow",
            RiskLevel::High => "orange",
            RiskLevel::Critical => "red",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
