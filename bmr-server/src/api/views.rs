//! Read models returned by the API
//!
//! Encrypted PII is decrypted here and always exposed in masked form; the
//! full value is only filled in when the caller may see it (staff or the
//! record owner).

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use shared::models::{StatusView, WorkflowStatus};
use sqlx::PgPool;
use uuid::Uuid;

use crate::crypto::{FieldCipher, mask_nric, mask_phone};
use crate::db;
use crate::db::infos::{ContactInfoRow, EducationInfoRow, PersonalInfoRow, WorkInfoRow};
use crate::db::lookups::MembershipTypeRow;
use crate::db::memberships::MembershipRow;
use crate::db::payments::PaymentRow;
use crate::db::profiles::ProfileRow;
use crate::db::users::UserRow;
use crate::error::ServiceResult;
use crate::workflow::current_status;

/// Decrypt a stored PII column; undecryptable values read as empty
fn reveal(cipher: &FieldCipher, stored: &str, field: &'static str) -> String {
    cipher.decrypt_field(stored).unwrap_or_else(|e| {
        tracing::warn!(field, "Could not decrypt PII column: {e}");
        String::new()
    })
}

#[derive(Debug, Serialize)]
pub struct PersonalInfoView {
    pub uuid: Uuid,
    pub full_name: String,
    pub date_of_birth: NaiveDate,
    pub gender: String,
    pub country_of_birth: String,
    pub city_of_birth: Option<String>,
    pub citizenship: String,
}

impl From<PersonalInfoRow> for PersonalInfoView {
    fn from(row: PersonalInfoRow) -> Self {
        Self {
            uuid: row.uuid,
            full_name: row.full_name,
            date_of_birth: row.date_of_birth,
            gender: row.gender,
            country_of_birth: row.country_of_birth,
            city_of_birth: row.city_of_birth,
            citizenship: row.citizenship,
        }
    }
}

#[derive(Debug, Serialize, PartialEq)]
pub struct ContactInfoView {
    pub uuid: Uuid,
    pub nric_fin_full: Option<String>,
    pub nric_fin_masked: String,
    pub primary_contact_full: Option<String>,
    pub primary_contact_masked: String,
    pub secondary_contact_full: Option<String>,
    pub secondary_contact_masked: String,
    pub residential_status: Option<String>,
    pub postal_code: Option<String>,
    pub address: Option<String>,
}

impl ContactInfoView {
    pub fn build(cipher: &FieldCipher, row: ContactInfoRow, show_full: bool) -> Self {
        let nric = reveal(cipher, &row.nric_fin, "nric_fin");
        let primary = reveal(cipher, &row.primary_contact, "primary_contact");
        let secondary = reveal(cipher, &row.secondary_contact, "secondary_contact");
        Self {
            uuid: row.uuid,
            nric_fin_masked: mask_nric(&nric),
            primary_contact_masked: mask_phone(&primary),
            secondary_contact_masked: mask_phone(&secondary),
            nric_fin_full: show_full.then_some(nric),
            primary_contact_full: show_full.then_some(primary),
            secondary_contact_full: show_full.then_some(secondary),
            residential_status: row.residential_status,
            postal_code: row.postal_code,
            address: row.address,
        }
    }
}

#[derive(Debug, Serialize, PartialEq)]
pub struct WorkInfoView {
    pub uuid: Uuid,
    pub occupation: Option<String>,
    pub company_name: Option<String>,
    pub company_address: Option<String>,
    pub company_postal_code: Option<String>,
    pub company_contact_full: Option<String>,
    pub company_contact_masked: String,
}

impl WorkInfoView {
    pub fn build(cipher: &FieldCipher, row: WorkInfoRow, show_full: bool) -> Self {
        let contact = reveal(cipher, &row.company_contact, "company_contact");
        Self {
            uuid: row.uuid,
            occupation: row.occupation,
            company_name: row.company_name,
            company_address: row.company_address,
            company_postal_code: row.company_postal_code,
            company_contact_masked: mask_phone(&contact),
            company_contact_full: show_full.then_some(contact),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct EducationInfoView {
    pub uuid: Uuid,
    pub education: Option<Uuid>,
    pub education_name: Option<String>,
    pub institution: Option<Uuid>,
    pub institution_name: Option<String>,
    pub other_societies: Option<String>,
}

impl From<EducationInfoRow> for EducationInfoView {
    fn from(row: EducationInfoRow) -> Self {
        Self {
            uuid: row.uuid,
            education: row.education_uuid,
            education_name: row.education_name,
            institution: row.institution_uuid,
            institution_name: row.institution_name,
            other_societies: row.other_societies,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MembershipView {
    pub uuid: Uuid,
    pub reference_no: String,
    pub user: Option<String>,
    pub profile_picture: Option<String>,
    pub applied_date: NaiveDate,
    pub membership_type: Option<MembershipTypeRow>,
    pub membership_number: Option<String>,
    pub profile_info: Option<PersonalInfoView>,
    pub contact_info: Option<ContactInfoView>,
    pub education_info: Option<EducationInfoView>,
    pub work_info: Option<WorkInfoView>,
    pub workflow_status: Option<StatusView>,
    pub reason: Option<String>,
    pub is_profile_completed: bool,
    pub is_contact_completed: bool,
    pub is_education_completed: bool,
    pub is_work_completed: bool,
    pub is_payment_generated: bool,
    pub submitted_at: Option<i64>,
    pub can_edit: bool,
}

/// Assemble the full read view of a membership
pub async fn membership_view(
    pool: &PgPool,
    cipher: &FieldCipher,
    row: MembershipRow,
    show_full: bool,
) -> ServiceResult<MembershipView> {
    let status = current_status(&row);
    let workflow_status = match &row.workflow_status {
        Some(code) => match db::statuses::find_by_code(pool, code).await? {
            Some(status_row) => Some(StatusView::from(status_row)),
            None => status.map(StatusView::from),
        },
        None => None,
    };

    let membership_type = match row.membership_type_id {
        Some(id) => db::lookups::find_membership_type_by_id(pool, id).await?,
        None => None,
    };
    let profile_info = match row.profile_info_id {
        Some(id) => db::infos::find_personal(pool, id).await?.map(PersonalInfoView::from),
        None => None,
    };
    let contact_info = match row.contact_info_id {
        Some(id) => db::infos::find_contact(pool, id)
            .await?
            .map(|c| ContactInfoView::build(cipher, c, show_full)),
        None => None,
    };
    let education_info = match row.education_info_id {
        Some(id) => db::infos::find_education(pool, id).await?.map(EducationInfoView::from),
        None => None,
    };
    let work_info = match row.work_info_id {
        Some(id) => db::infos::find_work(pool, id)
            .await?
            .map(|w| WorkInfoView::build(cipher, w, show_full)),
        None => None,
    };

    Ok(MembershipView {
        uuid: row.uuid,
        reference_no: row.reference_no,
        user: row.username,
        profile_picture: row.profile_picture,
        applied_date: row.applied_date,
        membership_type,
        membership_number: row.membership_number,
        profile_info,
        contact_info,
        education_info,
        work_info,
        workflow_status,
        reason: row.reason,
        is_profile_completed: row.is_profile_completed,
        is_contact_completed: row.is_contact_completed,
        is_education_completed: row.is_education_completed,
        is_work_completed: row.is_work_completed,
        is_payment_generated: row.is_payment_generated,
        submitted_at: row.submitted_at,
        can_edit: status.unwrap_or(WorkflowStatus::Draft).can_edit(),
    })
}

/// Compact row for staff listings
#[derive(Debug, Serialize)]
pub struct MembershipSummary {
    pub uuid: Uuid,
    pub reference_no: String,
    pub user: Option<String>,
    pub membership_number: Option<String>,
    pub workflow_status: Option<String>,
    pub applied_date: NaiveDate,
    pub submitted_at: Option<i64>,
    pub is_payment_generated: bool,
    pub created_at: i64,
}

impl From<MembershipRow> for MembershipSummary {
    fn from(row: MembershipRow) -> Self {
        Self {
            uuid: row.uuid,
            reference_no: row.reference_no,
            user: row.username,
            membership_number: row.membership_number,
            workflow_status: row.workflow_status,
            applied_date: row.applied_date,
            submitted_at: row.submitted_at,
            is_payment_generated: row.is_payment_generated,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PaymentView {
    pub uuid: Uuid,
    pub method: String,
    pub provider: Option<String>,
    pub status: String,
    pub receipt_no: String,
    pub external_id: Option<String>,
    pub reference_no: Option<String>,
    pub description: Option<String>,
    pub amount: Decimal,
    pub currency: String,
    pub period_year: i32,
    pub due_date: Option<NaiveDate>,
    pub paid_at: Option<i64>,
    pub qr_code: Option<String>,
    pub receipt_image: Option<String>,
    pub created_at: i64,
}

impl From<PaymentRow> for PaymentView {
    fn from(row: PaymentRow) -> Self {
        Self {
            uuid: row.uuid,
            method: row.method,
            provider: row.provider,
            status: row.status,
            receipt_no: row.receipt_no,
            external_id: row.external_id,
            reference_no: row.reference_no,
            description: row.description,
            amount: row.amount,
            currency: row.currency,
            period_year: row.period_year,
            due_date: row.due_date,
            paid_at: row.paid_at,
            qr_code: row.qr_code,
            receipt_image: row.receipt_image,
            created_at: row.created_at,
        }
    }
}

/// Payment as staff see it, with the stored gateway payload
#[derive(Debug, Serialize)]
pub struct StaffPaymentView {
    #[serde(flatten)]
    pub payment: PaymentView,
    pub raw_response: Option<serde_json::Value>,
}

impl From<PaymentRow> for StaffPaymentView {
    fn from(mut row: PaymentRow) -> Self {
        let raw_response = row.raw_response.take();
        Self {
            payment: PaymentView::from(row),
            raw_response,
        }
    }
}

// ── Users ───────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct UserPrivateView {
    pub uuid: Uuid,
    pub username: String,
    pub email: String,
    pub is_staff: bool,
    pub is_verified: bool,
    pub is_locked: bool,
    pub is_google_login: bool,
    pub roles: Vec<String>,
    pub profile: Option<ProfileRow>,
}

pub async fn user_private_view(pool: &PgPool, user: UserRow) -> ServiceResult<UserPrivateView> {
    let roles = db::roles::for_user(pool, user.id).await?;
    let profile = db::profiles::find_by_user(pool, user.id).await?;
    Ok(UserPrivateView {
        uuid: user.uuid,
        username: user.username,
        email: user.email,
        is_staff: user.is_staff,
        is_verified: user.is_verified,
        is_locked: user.is_locked,
        is_google_login: user.is_google_login,
        roles: roles.into_iter().map(|r| r.name).collect(),
        profile,
    })
}

#[derive(Debug, Serialize)]
pub struct PublicProfile {
    pub full_name: String,
    pub avatar: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UserPublicView {
    pub uuid: Uuid,
    pub username: String,
    pub is_verified: bool,
    pub profile: Option<PublicProfile>,
}

pub async fn user_public_view(pool: &PgPool, user: UserRow) -> ServiceResult<UserPublicView> {
    let profile = db::profiles::find_by_user(pool, user.id)
        .await?
        .map(|p| PublicProfile {
            full_name: p.full_name,
            avatar: p.avatar,
        });
    Ok(UserPublicView {
        uuid: user.uuid,
        username: user.username,
        is_verified: user.is_verified,
        profile,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact_row(cipher: &FieldCipher) -> ContactInfoRow {
        ContactInfoRow {
            uuid: Uuid::nil(),
            nric_fin: cipher.encrypt_field("S1234567D").unwrap(),
            primary_contact: cipher.encrypt_field("91234567").unwrap(),
            secondary_contact: String::new(),
            residential_status: Some("singaporean".into()),
            postal_code: Some("123456".into()),
            address: None,
        }
    }

    #[test]
    fn contact_view_masks_for_everyone() {
        let cipher = FieldCipher::derive("views-test");
        let view = ContactInfoView::build(&cipher, contact_row(&cipher), false);
        assert_eq!(view.nric_fin_full, None);
        assert_eq!(view.primary_contact_full, None);
        assert_eq!(view.nric_fin_masked, mask_nric("S1234567D"));
        assert_eq!(view.primary_contact_masked, mask_phone("91234567"));
        assert_eq!(view.secondary_contact_masked, "");
    }

    #[test]
    fn contact_view_full_for_owner_or_staff() {
        let cipher = FieldCipher::derive("views-test");
        let view = ContactInfoView::build(&cipher, contact_row(&cipher), true);
        assert_eq!(view.nric_fin_full.as_deref(), Some("S1234567D"));
        assert_eq!(view.primary_contact_full.as_deref(), Some("91234567"));
        assert_eq!(view.secondary_contact_full.as_deref(), Some(""));
    }

    #[test]
    fn undecryptable_value_reads_empty() {
        let cipher = FieldCipher::derive("views-test");
        let other = FieldCipher::derive("another-key");
        let row = WorkInfoRow {
            uuid: Uuid::nil(),
            occupation: None,
            company_name: None,
            company_address: None,
            company_postal_code: None,
            company_contact: other.encrypt_field("61234567").unwrap(),
        };
        let view = WorkInfoView::build(&cipher, row, true);
        assert_eq!(view.company_contact_full.as_deref(), Some(""));
        assert_eq!(view.company_contact_masked, "");
    }

    #[test]
    fn staff_payment_view_carries_gateway_payload() {
        let row = PaymentRow {
            id: 1,
            uuid: Uuid::nil(),
            membership_id: Some(1),
            method: "hitpay".into(),
            provider: Some("hitpay".into()),
            status: "paid".into(),
            receipt_no: "BMR-25-001".into(),
            external_id: Some("req-1".into()),
            reference_no: Some("BMR-AB12CD34".into()),
            description: None,
            amount: Decimal::new(3000, 2),
            currency: "SGD".into(),
            period_year: 2025,
            due_date: None,
            paid_at: Some(1),
            qr_code: None,
            receipt_image: None,
            raw_response: Some(serde_json::json!({ "amount": 30.0, "meta": { "a": 1 } })),
            created_at: 1,
        };
        let json = serde_json::to_value(StaffPaymentView::from(row)).unwrap();
        assert_eq!(json["receipt_no"], "BMR-25-001");
        assert_eq!(json["raw_response"]["meta"]["a"], 1);
        assert_eq!(json["raw_response"]["amount"], 30.0);
    }
}
