//! Two-page application submission
//!
//! Page 1 carries personal and contact details plus the membership type,
//! page 2 education and work details. Both pages upsert their linked
//! sections in place, so resubmitting identical data never duplicates rows.

use chrono::NaiveDate;
use serde::Deserialize;
use shared::error::{AppError, ErrorCode};
use shared::models::{Country, Gender, ResidentialStatus, WorkflowStatus};
use shared::util::{now_millis, today};
use uuid::Uuid;

use super::{Actor, current_status, get_or_create, transition_locked};
use crate::crypto::FieldCipher;
use crate::db;
use crate::db::memberships::MembershipRow;
use crate::db::payments::PaymentRow;
use crate::error::ServiceResult;
use crate::payments;
use crate::state::AppState;
use crate::validation::{
    MAX_ADDRESS_LEN, MAX_CONTACT_LEN, MAX_NAME_LEN, MAX_NOTE_LEN, MAX_SHORT_TEXT_LEN, MAX_URL_LEN,
    validate_nric, validate_optional_text, validate_required_text,
};

// ── Forms ───────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct PersonalInfoForm {
    pub full_name: String,
    pub date_of_birth: NaiveDate,
    pub gender: Gender,
    pub country_of_birth: Country,
    #[serde(default)]
    pub city_of_birth: Option<String>,
    pub citizenship: Country,
}

impl PersonalInfoForm {
    fn validate(&self, today: NaiveDate) -> Result<(), AppError> {
        validate_required_text(&self.full_name, "full_name", MAX_NAME_LEN)?;
        validate_optional_text(&self.city_of_birth, "city_of_birth", MAX_SHORT_TEXT_LEN)?;
        if self.date_of_birth > today {
            return Err(AppError::field(
                "date_of_birth",
                "Date of birth cannot be in the future.",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct ContactInfoForm {
    pub nric_fin: String,
    pub primary_contact: String,
    #[serde(default)]
    pub secondary_contact: Option<String>,
    #[serde(default)]
    pub residential_status: Option<ResidentialStatus>,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

impl ContactInfoForm {
    /// Upper-cased, trimmed NRIC/FIN
    pub fn normalized_nric(&self) -> String {
        self.nric_fin.trim().to_uppercase()
    }

    fn validate(&self) -> Result<(), AppError> {
        validate_nric(&self.normalized_nric())?;
        validate_required_text(&self.primary_contact, "primary_contact", MAX_CONTACT_LEN)?;
        validate_optional_text(&self.secondary_contact, "secondary_contact", MAX_CONTACT_LEN)?;
        validate_optional_text(&self.postal_code, "postal_code", MAX_SHORT_TEXT_LEN)?;
        validate_optional_text(&self.address, "address", MAX_ADDRESS_LEN)
    }
}

#[derive(Debug, Deserialize)]
pub struct PageOneForm {
    pub profile_info: PersonalInfoForm,
    pub contact_info: ContactInfoForm,
    /// Membership type uuid
    pub membership_type: Uuid,
    #[serde(default)]
    pub profile_picture: Option<String>,
}

impl PageOneForm {
    pub fn validate(&self, today: NaiveDate) -> Result<(), AppError> {
        self.profile_info.validate(today)?;
        self.contact_info.validate()?;
        validate_optional_text(&self.profile_picture, "profile_picture", MAX_URL_LEN)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct EducationInfoForm {
    /// Education level uuid
    #[serde(default)]
    pub education: Option<Uuid>,
    /// Institution uuid
    #[serde(default)]
    pub institution: Option<Uuid>,
    #[serde(default)]
    pub other_societies: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WorkInfoForm {
    #[serde(default)]
    pub occupation: Option<String>,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub company_address: Option<String>,
    #[serde(default)]
    pub company_postal_code: Option<String>,
    #[serde(default)]
    pub company_contact: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PageTwoForm {
    #[serde(default)]
    pub education_info: EducationInfoForm,
    #[serde(default)]
    pub work_info: WorkInfoForm,
}

impl PageTwoForm {
    pub fn validate(&self) -> Result<(), AppError> {
        let edu = &self.education_info;
        validate_optional_text(&edu.other_societies, "other_societies", MAX_NOTE_LEN)?;
        let work = &self.work_info;
        validate_optional_text(&work.occupation, "occupation", MAX_SHORT_TEXT_LEN)?;
        validate_optional_text(&work.company_name, "company_name", MAX_NAME_LEN)?;
        validate_optional_text(&work.company_address, "company_address", MAX_ADDRESS_LEN)?;
        validate_optional_text(
            &work.company_postal_code,
            "company_postal_code",
            MAX_SHORT_TEXT_LEN,
        )?;
        validate_optional_text(&work.company_contact, "company_contact", MAX_CONTACT_LEN)
    }
}

// ── Preconditions ───────────────────────────────────────────────────

/// The applicant may only change the application while it is editable
pub fn check_editable(status: Option<WorkflowStatus>) -> Result<(), AppError> {
    if status.unwrap_or(WorkflowStatus::Draft).can_edit() {
        Ok(())
    } else {
        Err(AppError::with_message(
            ErrorCode::MembershipNotEditable,
            "Cannot edit membership after approval.",
        ))
    }
}

/// Page 2 requires both page-1 sections to be complete
pub fn check_page_two_ready(profile_completed: bool, contact_completed: bool) -> Result<(), AppError> {
    if profile_completed && contact_completed {
        Ok(())
    } else {
        Err(AppError::with_message(
            ErrorCode::PageOneIncomplete,
            "Please complete Page 1 (Profile & Contact Info) first.",
        ))
    }
}

fn encrypt(cipher: &FieldCipher, value: &str, field: &'static str) -> Result<String, AppError> {
    cipher.encrypt_field(value).map_err(|e| {
        tracing::error!(field, "Field encryption failed: {e}");
        AppError::new(ErrorCode::InternalError)
    })
}

fn trimmed(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

// ── Page 1 ──────────────────────────────────────────────────────────

pub async fn submit_page_one(
    state: &AppState,
    user_id: i64,
    form: &PageOneForm,
) -> ServiceResult<MembershipRow> {
    form.validate(today())?;

    let membership = get_or_create(&state.pool, user_id).await?;
    let membership_type = db::lookups::find_membership_type(&state.pool, form.membership_type)
        .await?
        .ok_or_else(|| {
            AppError::new(ErrorCode::MembershipTypeNotFound)
                .with_detail("membership_type", serde_json::json!(["Invalid membership type."]))
        })?;

    let profile = &form.profile_info;
    let contact = &form.contact_info;
    let nric = encrypt(&state.cipher, &contact.normalized_nric(), "nric_fin")?;
    let primary = encrypt(&state.cipher, contact.primary_contact.trim(), "primary_contact")?;
    let secondary = encrypt(
        &state.cipher,
        trimmed(&contact.secondary_contact).unwrap_or_default(),
        "secondary_contact",
    )?;

    let actor = Actor::user(user_id);
    let now = now_millis();
    let mut tx = state.pool.begin().await?;
    let row = db::memberships::lock_by_id(&mut tx, membership.id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::MembershipNotFound))?;
    check_editable(current_status(&row))?;

    let profile_info_id = db::infos::upsert_personal(
        &mut tx,
        row.profile_info_id,
        &db::infos::PersonalInfoInput {
            full_name: profile.full_name.trim(),
            date_of_birth: profile.date_of_birth,
            gender: profile.gender.as_db(),
            country_of_birth: profile.country_of_birth.as_db(),
            city_of_birth: trimmed(&profile.city_of_birth),
            citizenship: profile.citizenship.as_db(),
        },
        actor.user_id,
        now,
    )
    .await?;

    let contact_info_id = db::infos::upsert_contact(
        &mut tx,
        row.contact_info_id,
        &db::infos::ContactInfoInput {
            nric_fin: &nric,
            primary_contact: &primary,
            secondary_contact: &secondary,
            residential_status: contact.residential_status.map(|s| s.as_db()),
            postal_code: trimmed(&contact.postal_code),
            address: trimmed(&contact.address),
        },
        actor.user_id,
        now,
    )
    .await?;

    db::memberships::save_page_one(
        &mut tx,
        row.id,
        &db::memberships::PageOneUpdate {
            profile_info_id,
            contact_info_id,
            membership_type_id: membership_type.id,
            profile_picture: trimmed(&form.profile_picture),
        },
        actor.user_id,
        now,
    )
    .await?;
    tx.commit().await?;

    tracing::info!(membership_id = row.id, user_id, "Page 1 submitted");
    reload(state, user_id).await
}

// ── Page 2 ──────────────────────────────────────────────────────────

/// Outcome of a page-2 submission
#[derive(Debug)]
pub struct PageTwoOutcome {
    pub membership: MembershipRow,
    /// Payment intent created by this submission, if any
    pub payment: Option<PaymentRow>,
}

pub async fn submit_page_two(
    state: &AppState,
    user_id: i64,
    form: &PageTwoForm,
) -> ServiceResult<PageTwoOutcome> {
    form.validate()?;

    let membership = get_or_create(&state.pool, user_id).await?;

    let education_level_id = match form.education_info.education {
        Some(uuid) => Some(
            db::lookups::find_education_level(&state.pool, uuid)
                .await?
                .ok_or_else(|| AppError::new(ErrorCode::EducationLevelNotFound))?
                .id,
        ),
        None => None,
    };
    let institution_id = match form.education_info.institution {
        Some(uuid) => Some(
            db::lookups::find_institution(&state.pool, uuid)
                .await?
                .ok_or_else(|| AppError::new(ErrorCode::InstitutionNotFound))?
                .id,
        ),
        None => None,
    };

    let work = &form.work_info;
    let company_contact = encrypt(
        &state.cipher,
        trimmed(&work.company_contact).unwrap_or_default(),
        "company_contact",
    )?;

    let actor = Actor::user(user_id);
    let now = now_millis();
    let mut tx = state.pool.begin().await?;
    let row = db::memberships::lock_by_id(&mut tx, membership.id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::MembershipNotFound))?;
    check_editable(current_status(&row))?;
    check_page_two_ready(row.is_profile_completed, row.is_contact_completed)?;

    let education_info_id = db::infos::upsert_education(
        &mut tx,
        row.education_info_id,
        &db::infos::EducationInfoInput {
            education_level_id,
            institution_id,
            other_societies: trimmed(&form.education_info.other_societies),
        },
        actor.user_id,
        now,
    )
    .await?;
    let work_info_id = db::infos::upsert_work(
        &mut tx,
        row.work_info_id,
        &db::infos::WorkInfoInput {
            occupation: trimmed(&work.occupation),
            company_name: trimmed(&work.company_name),
            company_address: trimmed(&work.company_address),
            company_postal_code: trimmed(&work.company_postal_code),
            company_contact: &company_contact,
        },
        actor.user_id,
        now,
    )
    .await?;
    db::memberships::save_page_two(
        &mut tx,
        row.id,
        education_info_id,
        work_info_id,
        actor.user_id,
        now,
    )
    .await?;

    transition_locked(&mut tx, &row, WorkflowStatus::PendingPayment, None, actor, now).await?;

    // A resubmission after Revise may already be paid for
    let already_paid = db::payments::has_paid(&mut *tx, row.id).await?;
    if already_paid {
        super::advance_on_payment(&mut tx, row.id, actor, now).await?;
    }
    tx.commit().await?;
    tracing::info!(membership_id = row.id, user_id, "Page 2 submitted");

    // The gateway call happens outside any transaction; the payment row is
    // only written once the gateway has answered.
    let payment = if row.is_payment_generated || already_paid {
        None
    } else {
        payments::create_initial_payment(state, row.id, actor).await?
    };

    Ok(PageTwoOutcome {
        membership: reload(state, user_id).await?,
        payment,
    })
}

async fn reload(state: &AppState, user_id: i64) -> ServiceResult<MembershipRow> {
    db::memberships::find_by_user(&state.pool, user_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::MembershipNotFound).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn page_one(json: serde_json::Value) -> PageOneForm {
        serde_json::from_value(json).unwrap()
    }

    fn valid_page_one() -> serde_json::Value {
        serde_json::json!({
            "profile_info": {
                "full_name": "Aung Aung",
                "date_of_birth": "1990-04-12",
                "gender": "M",
                "country_of_birth": "MM",
                "city_of_birth": "Yangon",
                "citizenship": "SG"
            },
            "contact_info": {
                "nric_fin": "s1234567d",
                "primary_contact": "91234567",
                "residential_status": "singaporean",
                "postal_code": "123456",
                "address": "1 Orchard Road"
            },
            "membership_type": "6f1c1f0e-3d4e-4b55-9a8e-0c1d2e3f4a5b"
        })
    }

    #[test]
    fn editable_only_in_open_statuses() {
        assert!(check_editable(None).is_ok());
        for status in WorkflowStatus::ALL {
            let result = check_editable(Some(status));
            assert_eq!(result.is_ok(), status.can_edit(), "{status:?}");
            if let Err(err) = result {
                assert_eq!(err.code, ErrorCode::MembershipNotEditable);
            }
        }
    }

    #[test]
    fn page_two_requires_both_page_one_sections() {
        assert!(check_page_two_ready(true, true).is_ok());
        for (profile, contact) in [(false, false), (true, false), (false, true)] {
            let err = check_page_two_ready(profile, contact).unwrap_err();
            assert_eq!(err.code, ErrorCode::PageOneIncomplete);
            assert!(err.message.contains("Page 1"));
        }
    }

    #[test]
    fn page_one_accepts_valid_form_and_normalizes_nric() {
        let form = page_one(valid_page_one());
        assert!(form.validate(d(2025, 1, 1)).is_ok());
        assert_eq!(form.contact_info.normalized_nric(), "S1234567D");
        assert_eq!(form.contact_info.residential_status, Some(ResidentialStatus::Singaporean));
    }

    #[test]
    fn page_one_rejects_bad_nric() {
        let mut json = valid_page_one();
        json["contact_info"]["nric_fin"] = "A1234567D".into();
        let err = page_one(json).validate(d(2025, 1, 1)).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidNric);
    }

    #[test]
    fn page_one_rejects_long_contact_and_future_birth_date() {
        let mut json = valid_page_one();
        json["contact_info"]["primary_contact"] = "9".repeat(26).into();
        let err = page_one(json).validate(d(2025, 1, 1)).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);

        let mut json = valid_page_one();
        json["profile_info"]["date_of_birth"] = "2030-01-01".into();
        let err = page_one(json).validate(d(2025, 1, 1)).unwrap_err();
        assert!(err.details.unwrap().contains_key("date_of_birth"));
    }

    #[test]
    fn page_one_rejects_unknown_choice_codes() {
        let mut json = valid_page_one();
        json["profile_info"]["gender"] = "X".into();
        assert!(serde_json::from_value::<PageOneForm>(json).is_err());
    }

    #[test]
    fn page_two_sections_are_optional() {
        let form: PageTwoForm = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(form.validate().is_ok());
        assert!(form.education_info.education.is_none());

        let form: PageTwoForm = serde_json::from_value(serde_json::json!({
            "work_info": { "company_contact": "6".repeat(30) }
        }))
        .unwrap();
        assert!(form.validate().is_err());
    }

    #[test]
    fn blank_optional_values_are_dropped() {
        assert_eq!(trimmed(&Some("  ".into())), None);
        assert_eq!(trimmed(&Some(" Yangon ".into())), Some("Yangon"));
        assert_eq!(trimmed(&None), None);
    }
}
