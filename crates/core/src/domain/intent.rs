use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// Closed set of actions the assistant can perform. The classifier may only
/// emit members of this enumeration; anything else is discarded during
/// validation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    SearchProperty,
    EstimateRenovation,
    GenerateReport,
    SavePreference,
    WebResearch,
    GeneralQuery,
}

impl Intent {
    pub const ALL: [Intent; 6] = [
        Intent::SearchProperty,
        Intent::EstimateRenovation,
        Intent::GenerateReport,
        Intent::SavePreference,
        Intent::WebResearch,
        Intent::GeneralQuery,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SearchProperty => "search_property",
            Self::EstimateRenovation => "estimate_renovation",
            Self::GenerateReport => "generate_report",
            Self::SavePreference => "save_preference",
            Self::WebResearch => "web_research",
            Self::GeneralQuery => "general_query",
        }
    }

    /// Heading used when multiple task outputs are merged into one reply
    /// (wire name with underscores replaced by spaces, title-cased).
    pub fn label(&self) -> &'static str {
        match self {
            Self::SearchProperty => "Search Property",
            Self::EstimateRenovation => "Estimate Renovation",
            Self::GenerateReport => "Generate Report",
            Self::SavePreference => "Save Preference",
            Self::WebResearch => "Web Research",
            Self::GeneralQuery => "General Query",
        }
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Intent {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "search_property" => Ok(Self::SearchProperty),
            "estimate_renovation" => Ok(Self::EstimateRenovation),
            "generate_report" => Ok(Self::GenerateReport),
            "save_preference" => Ok(Self::SavePreference),
            "web_research" => Ok(Self::WebResearch),
            "general_query" => Ok(Self::GeneralQuery),
            other => Err(DomainError::UnknownIntent(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Intent;
    use crate::errors::DomainError;

    #[test]
    fn wire_names_round_trip() {
        for intent in Intent::ALL {
            let parsed: Intent = intent.as_str().parse().expect("known wire name");
            assert_eq!(parsed, intent);
        }
    }

    #[test]
    fn unknown_name_is_rejected() {
        let error = "book_viewing".parse::<Intent>().expect_err("unknown intent");
        assert_eq!(error, DomainError::UnknownIntent("book_viewing".to_string()));
    }

    #[test]
    fn labels_are_title_cased_wire_names() {
        assert_eq!(Intent::SearchProperty.label(), "Search Property");
        assert_eq!(Intent::GeneralQuery.label(), "General Query");
        for intent in Intent::ALL {
            assert_eq!(
                intent.label().to_ascii_lowercase().replace(' ', "_"),
                intent.as_str()
            );
        }
    }
}
