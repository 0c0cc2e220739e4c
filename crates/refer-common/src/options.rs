//! Fixed vocabularies offered by the referral form.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when a course or relationship string is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseOptionError {
    #[error("Unknown course '{0}'")]
    UnknownCourse(String),
    #[error("Unknown relationship '{0}'")]
    UnknownRelationship(String),
}

/// Course the referee is interested in.
///
/// On the wire each course is an upper-snake token (`WEB_DEVELOPMENT`);
/// [`Course::label`] gives the human-readable name shown in prompts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Course {
    WebDevelopment,
    DataScience,
    MachineLearning,
    MobileAppDevelopment,
    CyberSecurity,
    CloudComputing,
    DigitalMarketing,
    UiUxDesign,
    SoftwareTesting,
    ArtificialIntelligence,
}

impl Course {
    pub const ALL: [Course; 10] = [
        Course::WebDevelopment,
        Course::DataScience,
        Course::MachineLearning,
        Course::MobileAppDevelopment,
        Course::CyberSecurity,
        Course::CloudComputing,
        Course::DigitalMarketing,
        Course::UiUxDesign,
        Course::SoftwareTesting,
        Course::ArtificialIntelligence,
    ];

    /// Wire token, e.g. `WEB_DEVELOPMENT`.
    pub fn token(self) -> &'static str {
        match self {
            Course::WebDevelopment => "WEB_DEVELOPMENT",
            Course::DataScience => "DATA_SCIENCE",
            Course::MachineLearning => "MACHINE_LEARNING",
            Course::MobileAppDevelopment => "MOBILE_APP_DEVELOPMENT",
            Course::CyberSecurity => "CYBER_SECURITY",
            Course::CloudComputing => "CLOUD_COMPUTING",
            Course::DigitalMarketing => "DIGITAL_MARKETING",
            Course::UiUxDesign => "UI_UX_DESIGN",
            Course::SoftwareTesting => "SOFTWARE_TESTING",
            Course::ArtificialIntelligence => "ARTIFICIAL_INTELLIGENCE",
        }
    }

    /// Display label, e.g. `Web Development`.
    pub fn label(self) -> &'static str {
        match self {
            Course::WebDevelopment => "Web Development",
            Course::DataScience => "Data Science",
            Course::MachineLearning => "Machine Learning",
            Course::MobileAppDevelopment => "Mobile App Development",
            Course::CyberSecurity => "Cyber Security",
            Course::CloudComputing => "Cloud Computing",
            Course::DigitalMarketing => "Digital Marketing",
            Course::UiUxDesign => "UI/UX Design",
            Course::SoftwareTesting => "Software Testing",
            Course::ArtificialIntelligence => "Artificial Intelligence",
        }
    }
}

impl std::fmt::Display for Course {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.token())
    }
}

impl std::str::FromStr for Course {
    type Err = ParseOptionError;

    /// Accepts either the wire token or the label, ignoring case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Course::ALL
            .into_iter()
            .find(|c| {
                c.token().eq_ignore_ascii_case(wanted) || c.label().eq_ignore_ascii_case(wanted)
            })
            .ok_or_else(|| ParseOptionError::UnknownCourse(s.to_string()))
    }
}

/// How the referrer knows the referee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Relationship {
    Friend,
    Colleague,
    Family,
    Classmate,
    Neighbor,
    Other,
}

impl Relationship {
    pub const ALL: [Relationship; 6] = [
        Relationship::Friend,
        Relationship::Colleague,
        Relationship::Family,
        Relationship::Classmate,
        Relationship::Neighbor,
        Relationship::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Relationship::Friend => "Friend",
            Relationship::Colleague => "Colleague",
            Relationship::Family => "Family",
            Relationship::Classmate => "Classmate",
            Relationship::Neighbor => "Neighbor",
            Relationship::Other => "Other",
        }
    }
}

impl std::fmt::Display for Relationship {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Relationship {
    type Err = ParseOptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Relationship::ALL
            .into_iter()
            .find(|r| r.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ParseOptionError::UnknownRelationship(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_course_serializes_as_upper_snake_token() {
        let json = serde_json::to_string(&Course::UiUxDesign).unwrap();
        assert_eq!(json, "\"UI_UX_DESIGN\"");
        let json = serde_json::to_string(&Course::WebDevelopment).unwrap();
        assert_eq!(json, "\"WEB_DEVELOPMENT\"");
    }

    #[test]
    fn test_course_tokens_match_serde_names() {
        for course in Course::ALL {
            let json = serde_json::to_string(&course).unwrap();
            assert_eq!(json, format!("\"{}\"", course.token()));
        }
    }

    #[test]
    fn test_course_parses_token_and_label() {
        assert_eq!("WEB_DEVELOPMENT".parse::<Course>(), Ok(Course::WebDevelopment));
        assert_eq!("web development".parse::<Course>(), Ok(Course::WebDevelopment));
        assert_eq!("UI/UX Design".parse::<Course>(), Ok(Course::UiUxDesign));
        assert_eq!(
            "Basket Weaving".parse::<Course>(),
            Err(ParseOptionError::UnknownCourse("Basket Weaving".to_string()))
        );
    }

    #[test]
    fn test_course_rejects_empty() {
        assert!("".parse::<Course>().is_err());
    }

    #[test]
    fn test_relationship_round_trips_names() {
        assert_eq!("friend".parse::<Relationship>(), Ok(Relationship::Friend));
        assert_eq!(serde_json::to_string(&Relationship::Neighbor).unwrap(), "\"Neighbor\"");
        assert!("Enemy".parse::<Relationship>().is_err());
    }

    #[test]
    fn test_option_lists_are_complete() {
        assert_eq!(Course::ALL.len(), 10);
        assert_eq!(Relationship::ALL.len(), 6);
    }
}
