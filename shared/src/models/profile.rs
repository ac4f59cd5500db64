//! Applicant profile choice lists

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "F")]
    Female,
    #[serde(rename = "O")]
    Other,
}

impl Gender {
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "M" => Some(Self::Male),
            "F" => Some(Self::Female),
            "O" => Some(Self::Other),
            _ => None,
        }
    }

    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Male => "M",
            Self::Female => "F",
            Self::Other => "O",
        }
    }
}

/// Country of birth / citizenship
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Country {
    #[serde(rename = "MM")]
    Myanmar,
    #[serde(rename = "SG")]
    Singapore,
    Others,
}

impl Country {
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "MM" => Some(Self::Myanmar),
            "SG" => Some(Self::Singapore),
            "Others" => Some(Self::Others),
            _ => None,
        }
    }

    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Myanmar => "MM",
            Self::Singapore => "SG",
            Self::Others => "Others",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResidentialStatus {
    Singaporean,
    PermanentResident,
    EmploymentPass,
    SPass,
    WorkPermit,
    DependentPass,
    LongTermVisitPass,
    Others,
}

impl ResidentialStatus {
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "singaporean" => Some(Self::Singaporean),
            "permanent_resident" => Some(Self::PermanentResident),
            "employment_pass" => Some(Self::EmploymentPass),
            "s_pass" => Some(Self::SPass),
            "work_permit" => Some(Self::WorkPermit),
            "dependent_pass" => Some(Self::DependentPass),
            "long_term_visit_pass" => Some(Self::LongTermVisitPass),
            "others" => Some(Self::Others),
            _ => None,
        }
    }

    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Singaporean => "singaporean",
            Self::PermanentResident => "permanent_resident",
            Self::EmploymentPass => "employment_pass",
            Self::SPass => "s_pass",
            Self::WorkPermit => "work_permit",
            Self::DependentPass => "dependent_pass",
            Self::LongTermVisitPass => "long_term_visit_pass",
            Self::Others => "others",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serde_uses_stored_codes() {
        assert_eq!(serde_json::to_string(&Gender::Female).unwrap(), "\"F\"");
        assert_eq!(serde_json::to_string(&Country::Singapore).unwrap(), "\"SG\"");
        assert_eq!(
            serde_json::to_string(&ResidentialStatus::SPass).unwrap(),
            "\"s_pass\""
        );
        let status: ResidentialStatus = serde_json::from_str("\"long_term_visit_pass\"").unwrap();
        assert_eq!(status, ResidentialStatus::LongTermVisitPass);
        assert!(serde_json::from_str::<Gender>("\"X\"").is_err());
    }

    #[test]
    fn db_codes_match_serde() {
        for g in [Gender::Male, Gender::Female, Gender::Other] {
            assert_eq!(Gender::from_db(g.as_db()), Some(g));
            assert_eq!(serde_json::to_string(&g).unwrap(), format!("\"{}\"", g.as_db()));
        }
        for c in [Country::Myanmar, Country::Singapore, Country::Others] {
            assert_eq!(Country::from_db(c.as_db()), Some(c));
        }
        assert_eq!(
            ResidentialStatus::from_db(ResidentialStatus::WorkPermit.as_db()),
            Some(ResidentialStatus::WorkPermit)
        );
    }
}
