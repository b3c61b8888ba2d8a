//! Investment Profile
//!
//! The user's investment preferences. Every specialist agent receives the
//! profile as a context block in its system prompt so answers are tailored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskTolerance {
    #[serde(rename = "Niedrig", alias = "Low")]
    Low,
    #[default]
    #[serde(rename = "Mittel", alias = "Medium")]
    Medium,
    #[serde(rename = "Hoch", alias = "High")]
    High,
    #[serde(rename = "Sehr hoch", alias = "Very High")]
    VeryHigh,
}

impl RiskTolerance {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Low => "Niedrig",
            Self::Medium => "Mittel",
            Self::High => "Hoch",
            Self::VeryHigh => "Sehr hoch",
        }
    }

    const fn badge(self) -> &'static str {
        match self {
            Self::Low => "🛡️",
            Self::Medium => "⚖️",
            Self::High => "⚡",
            Self::VeryHigh => "🔥",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvestmentHorizon {
    #[serde(rename = "1-3 Jahre", alias = "1-3y")]
    ShortTerm,
    #[serde(rename = "3-5 Jahre", alias = "3-5y")]
    MediumTerm,
    #[default]
    #[serde(rename = "5-10 Jahre", alias = "5-10y")]
    LongTerm,
    #[serde(rename = "10+ Jahre", alias = "10+y")]
    VeryLongTerm,
}

impl InvestmentHorizon {
    pub const fn label(self) -> &'static str {
        match self {
            Self::ShortTerm => "1-3 Jahre",
            Self::MediumTerm => "3-5 Jahre",
            Self::LongTerm => "5-10 Jahre",
            Self::VeryLongTerm => "10+ Jahre",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum StockSize {
    #[serde(rename = "Large Cap (>$10 Mrd.)")]
    Large,
    #[serde(rename = "Mid Cap ($2-$10 Mrd.)")]
    Mid,
    #[serde(rename = "Small Cap ($300M-$2 Mrd.)")]
    Small,
    #[serde(rename = "Micro Cap (<$300M)")]
    Micro,
    #[default]
    #[serde(rename = "Alle Groessen")]
    All,
}

impl StockSize {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Large => "Large Cap (>$10 Mrd.)",
            Self::Mid => "Mid Cap ($2-$10 Mrd.)",
            Self::Small => "Small Cap ($300M-$2 Mrd.)",
            Self::Micro => "Micro Cap (<$300M)",
            Self::All => "Alle Groessen",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GeographicFocus {
    #[default]
    #[serde(rename = "USA")]
    Usa,
    #[serde(rename = "Europa", alias = "Europe")]
    Europe,
    #[serde(rename = "Asien", alias = "Asia")]
    Asia,
    #[serde(rename = "Global")]
    Global,
}

impl GeographicFocus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Usa => "USA",
            Self::Europe => "Europa",
            Self::Asia => "Asien",
            Self::Global => "Global",
        }
    }
}

/// Sector labels offered to the user
pub const SECTOR_OPTIONS: [&str; 12] = [
    "🚀 Raumfahrttechnologie",
    "🤖 Robotik & Automatisierung",
    "🧠 Kuenstliche Intelligenz",
    "☀️ Erneuerbare Energien",
    "💻 Software / SaaS",
    "🏥 Gesundheit / Biotech",
    "💰 Fintech",
    "🎮 Gaming / Unterhaltung",
    "🛡️ Cybersicherheit",
    "⛓️ Blockchain / Krypto",
    "📦 E-Commerce",
    "🏭 Industrie / Fertigung",
];

/// Persisted investment profile. Missing fields take their defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserProfile {
    pub risk_tolerance: RiskTolerance,
    pub investment_horizon: InvestmentHorizon,
    pub preferred_sectors: Vec<String>,
    pub stock_size_preference: StockSize,
    pub geographic_focus: GeographicFocus,
    pub max_position_size_pct: u8,
    pub dividend_preference: bool,
    pub philosophy: String,
    pub admired_stocks: String,
    pub last_updated: Option<DateTime<Utc>>,
}

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            risk_tolerance: RiskTolerance::default(),
            investment_horizon: InvestmentHorizon::default(),
            preferred_sectors: Vec::new(),
            stock_size_preference: StockSize::default(),
            geographic_focus: GeographicFocus::default(),
            max_position_size_pct: 20,
            dividend_preference: false,
            philosophy: String::new(),
            admired_stocks: String::new(),
            last_updated: None,
        }
    }
}

impl UserProfile {
    /// True once the user moved away from the defaults in a way that matters
    pub fn is_configured(&self) -> bool {
        !self.preferred_sectors.is_empty()
            || !self.philosophy.trim().is_empty()
            || self.risk_tolerance != RiskTolerance::Medium
            || self.investment_horizon != InvestmentHorizon::LongTerm
    }

    /// One-line badge, e.g. `⚡ Hoch · 10+ Jahre · 🚀🧠 +1`
    pub fn summary(&self) -> String {
        if !self.is_configured() {
            return "Nicht konfiguriert".into();
        }

        let mut parts = vec![
            format!("{} {}", self.risk_tolerance.badge(), self.risk_tolerance.label()),
            self.investment_horizon.label().to_string(),
        ];

        if !self.preferred_sectors.is_empty() {
            let icons: String = self
                .preferred_sectors
                .iter()
                .take(2)
                .filter_map(|s| s.split(' ').next())
                .collect();
            let extra = self.preferred_sectors.len().saturating_sub(2);
            if extra > 0 {
                parts.push(format!("{icons} +{extra}"));
            } else {
                parts.push(icons);
            }
        }

        parts.join(" · ")
    }

    /// Profile block for agent system prompts. Empty when not configured.
    pub fn context_block(&self) -> String {
        if !self.is_configured() {
            return String::new();
        }

        let mut lines = vec![
            "ANLAGEPROFIL DES NUTZERS (nutze dies zur Personalisierung deiner Analyse):".to_string(),
            format!("- Risikobereitschaft: {}", self.risk_tolerance.label()),
            format!("- Anlagehorizont: {}", self.investment_horizon.label()),
        ];
        if !self.preferred_sectors.is_empty() {
            lines.push(format!("- Bevorzugte Sektoren: {}", self.preferred_sectors.join(", ")));
        }
        lines.push(format!("- Unternehmensgroesse: {}", self.stock_size_preference.label()));
        lines.push(format!("- Geografischer Fokus: {}", self.geographic_focus.label()));
        lines.push(format!(
            "- Max. Positionsgroesse: {}% des Portfolios",
            self.max_position_size_pct
        ));
        lines.push(format!(
            "- Dividendenpraeferenz: {}",
            if self.dividend_preference { "Ja" } else { "Nein" }
        ));
        if !self.philosophy.trim().is_empty() {
            lines.push(format!("- Anlagephilosophie: \"{}\"", self.philosophy.trim()));
        }
        if !self.admired_stocks.trim().is_empty() {
            lines.push(format!("- Bewunderte Investments: \"{}\"", self.admired_stocks.trim()));
        }

        lines.push("\nBasierend auf diesem Profil:".into());

        match self.risk_tolerance {
            RiskTolerance::High | RiskTolerance::VeryHigh => {
                lines.push("- Betone langfristiges Wachstumspotenzial statt kurzfristiger Volatilitaet.".into());
                lines.push("- Keine Panik bei 20-30% Kursrueckgaengen; fokussiere auf Fundamentaldaten.".into());
            }
            RiskTolerance::Low => {
                lines.push("- Priorisiere Kapitalerhalt und stabile Renditen.".into());
                lines.push("- Hebe Hochvolatilitaetsrisiken deutlich hervor.".into());
            }
            RiskTolerance::Medium => {}
        }

        match self.investment_horizon {
            InvestmentHorizon::VeryLongTerm => {
                lines.push("- Fokussiere auf langjaehrige Trends und saekulare Wachstumsthemen.".into());
                lines.push(
                    "- Kurzfristige Gewinnverfehlungen sind weniger wichtig als die langfristige Entwicklung."
                        .into(),
                );
            }
            InvestmentHorizon::ShortTerm => {
                lines.push("- Fokussiere auf kurzfristige Katalysatoren und aktuelle Bewertung.".into());
            }
            _ => {}
        }

        if self.has_sector(&["Raumfahrt", "Space"]) {
            lines.push(
                "- Der Nutzer interessiert sich fuer Raumfahrttechnologie; hebe Luft- und Raumfahrtunternehmen hervor."
                    .into(),
            );
        }
        if self.has_sector(&["KI", "Intelligenz", "AI"]) {
            lines.push(
                "- Der Nutzer interessiert sich fuer KI; hebe KI-Infrastruktur, Modelle und Anwendungen hervor."
                    .into(),
            );
        }

        lines.join("\n")
    }

    fn has_sector(&self, needles: &[&str]) -> bool {
        self.preferred_sectors
            .iter()
            .any(|sector| needles.iter().any(|needle| sector.contains(needle)))
    }
}
