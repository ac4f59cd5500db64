//! Membership workflow status catalog
//!
//! The workflow uses a closed set of statuses, all children of the root
//! grouping code `1`. The `statuses` table mirrors this catalog so labels can
//! be shown without a code change, but behaviour is decided here.

use serde::{Deserialize, Serialize};

/// Root grouping code of the membership workflow
pub const WORKFLOW_ROOT_CODE: &str = "1";

/// Membership workflow status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "&'static str", try_from = "String")]
pub enum WorkflowStatus {
    Draft,
    PendingPayment,
    PendingApproval,
    Approved,
    Revise,
    Reject,
    Terminated,
}

impl WorkflowStatus {
    pub const ALL: [WorkflowStatus; 7] = [
        Self::Draft,
        Self::PendingPayment,
        Self::PendingApproval,
        Self::Approved,
        Self::Revise,
        Self::Reject,
        Self::Terminated,
    ];

    /// Status code as stored in `statuses.code`
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Draft => "10",
            Self::PendingPayment => "11",
            Self::PendingApproval => "12",
            Self::Approved => "13",
            Self::Revise => "14",
            Self::Reject => "15",
            Self::Terminated => "16",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.code() == code.trim())
    }

    pub const fn internal_label(&self) -> &'static str {
        match self {
            Self::Draft => "Draft",
            Self::PendingPayment => "Pending Payment",
            Self::PendingApproval => "Pending Approval",
            Self::Approved => "Approved",
            Self::Revise => "Revise for review",
            Self::Reject => "Reject",
            Self::Terminated => "Terminated",
        }
    }

    pub const fn description(&self) -> &'static str {
        match self {
            Self::Draft => "Member workflow in draft state",
            Self::PendingPayment => "Member has submitted application, payment pending",
            Self::PendingApproval => "After payment, awaiting admin approval",
            Self::Approved => "Membership application approved",
            Self::Revise => "Member needs to revise application",
            Self::Reject => "Membership application rejected",
            Self::Terminated => "Membership terminated",
        }
    }

    /// Applicant may still change the application
    pub const fn can_edit(&self) -> bool {
        matches!(self, Self::Draft | Self::PendingPayment | Self::Revise)
    }

    /// A paid payment moves the membership to Pending Approval only from
    /// these statuses. Everything else is at or past that stage.
    pub const fn advances_on_payment(&self) -> bool {
        matches!(self, Self::Draft | Self::PendingPayment)
    }

    /// Status change requires a free-text reason
    pub const fn requires_reason(&self) -> bool {
        matches!(self, Self::Revise | Self::Reject)
    }

    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Reject | Self::Terminated)
    }
}

impl From<WorkflowStatus> for &'static str {
    fn from(status: WorkflowStatus) -> Self {
        status.code()
    }
}

impl TryFrom<String> for WorkflowStatus {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_code(&value).ok_or_else(|| format!("unknown workflow status code: {value}"))
    }
}

impl std::fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// A row of the status catalog as exposed to clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusView {
    pub code: String,
    pub internal_status: String,
    pub external_status: String,
    pub description: Option<String>,
    pub parent_code: Option<String>,
}

impl StatusView {
    /// Build a view, falling back to the internal label when no external
    /// label is configured.
    pub fn new(
        code: impl Into<String>,
        internal_status: impl Into<String>,
        external_status: Option<String>,
        description: Option<String>,
        parent_code: Option<String>,
    ) -> Self {
        let internal_status = internal_status.into();
        let external_status = external_status
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| internal_status.clone());
        Self {
            code: code.into(),
            internal_status,
            external_status,
            description,
            parent_code,
        }
    }
}

impl From<WorkflowStatus> for StatusView {
    fn from(status: WorkflowStatus) -> Self {
        Self::new(
            status.code(),
            status.internal_label(),
            None,
            Some(status.description().to_string()),
            Some(WORKFLOW_ROOT_CODE.to_string()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_roundtrip_over_closed_set() {
        for status in WorkflowStatus::ALL {
            assert_eq!(WorkflowStatus::from_code(status.code()), Some(status));
        }
        assert_eq!(WorkflowStatus::from_code("1"), None);
        assert_eq!(WorkflowStatus::from_code("17"), None);
        assert_eq!(WorkflowStatus::from_code(" 12 "), Some(WorkflowStatus::PendingApproval));
    }

    #[test]
    fn test_can_edit_for_every_status() {
        let expected = [
            ("10", true),
            ("11", true),
            ("12", false),
            ("13", false),
            ("14", true),
            ("15", false),
            ("16", false),
        ];
        for (code, editable) in expected {
            let status = WorkflowStatus::from_code(code).unwrap();
            assert_eq!(status.can_edit(), editable, "status {code}");
        }
    }

    #[test]
    fn test_advances_on_payment() {
        assert!(WorkflowStatus::Draft.advances_on_payment());
        assert!(WorkflowStatus::PendingPayment.advances_on_payment());
        assert!(!WorkflowStatus::PendingApproval.advances_on_payment());
        assert!(!WorkflowStatus::Approved.advances_on_payment());
        assert!(!WorkflowStatus::Revise.advances_on_payment());
        assert!(!WorkflowStatus::Reject.advances_on_payment());
        assert!(!WorkflowStatus::Terminated.advances_on_payment());
    }

    #[test]
    fn test_reason_required() {
        assert!(WorkflowStatus::Revise.requires_reason());
        assert!(WorkflowStatus::Reject.requires_reason());
        assert!(!WorkflowStatus::Approved.requires_reason());
    }

    #[test]
    fn test_serde_as_code() {
        let json = serde_json::to_string(&WorkflowStatus::Approved).unwrap();
        assert_eq!(json, "\"13\"");
        let status: WorkflowStatus = serde_json::from_str("\"14\"").unwrap();
        assert_eq!(status, WorkflowStatus::Revise);
        assert!(serde_json::from_str::<WorkflowStatus>("\"99\"").is_err());
    }

    #[test]
    fn test_external_label_defaults_to_internal() {
        let view = StatusView::new("10", "Draft", None, None, None);
        assert_eq!(view.external_status, "Draft");
        let view = StatusView::new("10", "Draft", Some("  ".into()), None, None);
        assert_eq!(view.external_status, "Draft");
        let view = StatusView::new("10", "Draft", Some("In progress".into()), None, None);
        assert_eq!(view.external_status, "In progress");

        let view = StatusView::from(WorkflowStatus::Revise);
        assert_eq!(view.external_status, "Revise for review");
        assert_eq!(view.parent_code.as_deref(), Some(WORKFLOW_ROOT_CODE));
    }
}
