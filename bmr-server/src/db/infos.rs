//! Application sections owned by a membership
//!
//! Each upsert updates the linked row in place when the membership already
//! points at one, otherwise inserts and returns the new id. Encrypted columns
//! arrive here as ciphertext.

use chrono::NaiveDate;
use sqlx::PgConnection;
use uuid::Uuid;

// ── Personal info ───────────────────────────────────────────────────

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PersonalInfoRow {
    pub uuid: Uuid,
    pub full_name: String,
    pub date_of_birth: NaiveDate,
    pub gender: String,
    pub country_of_birth: String,
    pub city_of_birth: Option<String>,
    pub citizenship: String,
}

pub struct PersonalInfoInput<'a> {
    pub full_name: &'a str,
    pub date_of_birth: NaiveDate,
    pub gender: &'a str,
    pub country_of_birth: &'a str,
    pub city_of_birth: Option<&'a str>,
    pub citizenship: &'a str,
}

pub async fn upsert_personal(
    conn: &mut PgConnection,
    existing: Option<i64>,
    info: &PersonalInfoInput<'_>,
    actor: Option<i64>,
    now: i64,
) -> Result<i64, sqlx::Error> {
    if let Some(id) = existing {
        sqlx::query(
            "UPDATE personal_infos SET full_name = $1, date_of_birth = $2, gender = $3, \
             country_of_birth = $4, city_of_birth = $5, citizenship = $6, \
             modified_at = $7, modified_by = $8 WHERE id = $9",
        )
        .bind(info.full_name)
        .bind(info.date_of_birth)
        .bind(info.gender)
        .bind(info.country_of_birth)
        .bind(info.city_of_birth)
        .bind(info.citizenship)
        .bind(now)
        .bind(actor)
        .bind(id)
        .execute(conn)
        .await?;
        return Ok(id);
    }
    sqlx::query_scalar(
        "INSERT INTO personal_infos (uuid, full_name, date_of_birth, gender, country_of_birth, \
         city_of_birth, citizenship, created_at, created_by, modified_at, modified_by) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $8, $9) RETURNING id",
    )
    .bind(Uuid::new_v4())
    .bind(info.full_name)
    .bind(info.date_of_birth)
    .bind(info.gender)
    .bind(info.country_of_birth)
    .bind(info.city_of_birth)
    .bind(info.citizenship)
    .bind(now)
    .bind(actor)
    .fetch_one(conn)
    .await
}

pub async fn find_personal<'e, E>(executor: E, id: i64) -> Result<Option<PersonalInfoRow>, sqlx::Error>
where
    E: sqlx::PgExecutor<'e>,
{
    sqlx::query_as(
        "SELECT uuid, full_name, date_of_birth, gender, country_of_birth, city_of_birth, \
         citizenship FROM personal_infos WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(executor)
    .await
}

// ── Contact info ────────────────────────────────────────────────────

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ContactInfoRow {
    pub uuid: Uuid,
    pub nric_fin: String,
    pub primary_contact: String,
    pub secondary_contact: String,
    pub residential_status: Option<String>,
    pub postal_code: Option<String>,
    pub address: Option<String>,
}

/// Contact section with NRIC/FIN and phones already encrypted
pub struct ContactInfoInput<'a> {
    pub nric_fin: &'a str,
    pub primary_contact: &'a str,
    pub secondary_contact: &'a str,
    pub residential_status: Option<&'a str>,
    pub postal_code: Option<&'a str>,
    pub address: Option<&'a str>,
}

pub async fn upsert_contact(
    conn: &mut PgConnection,
    existing: Option<i64>,
    info: &ContactInfoInput<'_>,
    actor: Option<i64>,
    now: i64,
) -> Result<i64, sqlx::Error> {
    if let Some(id) = existing {
        sqlx::query(
            "UPDATE contact_infos SET nric_fin = $1, primary_contact = $2, secondary_contact = $3, \
             residential_status = $4, postal_code = $5, address = $6, \
             modified_at = $7, modified_by = $8 WHERE id = $9",
        )
        .bind(info.nric_fin)
        .bind(info.primary_contact)
        .bind(info.secondary_contact)
        .bind(info.residential_status)
        .bind(info.postal_code)
        .bind(info.address)
        .bind(now)
        .bind(actor)
        .bind(id)
        .execute(conn)
        .await?;
        return Ok(id);
    }
    sqlx::query_scalar(
        "INSERT INTO contact_infos (uuid, nric_fin, primary_contact, secondary_contact, \
         residential_status, postal_code, address, created_at, created_by, modified_at, modified_by) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $8, $9) RETURNING id",
    )
    .bind(Uuid::new_v4())
    .bind(info.nric_fin)
    .bind(info.primary_contact)
    .bind(info.secondary_contact)
    .bind(info.residential_status)
    .bind(info.postal_code)
    .bind(info.address)
    .bind(now)
    .bind(actor)
    .fetch_one(conn)
    .await
}

pub async fn find_contact<'e, E>(executor: E, id: i64) -> Result<Option<ContactInfoRow>, sqlx::Error>
where
    E: sqlx::PgExecutor<'e>,
{
    sqlx::query_as(
        "SELECT uuid, nric_fin, primary_contact, secondary_contact, residential_status, \
         postal_code, address FROM contact_infos WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(executor)
    .await
}

// ── Work info ───────────────────────────────────────────────────────

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct WorkInfoRow {
    pub uuid: Uuid,
    pub occupation: Option<String>,
    pub company_name: Option<String>,
    pub company_address: Option<String>,
    pub company_postal_code: Option<String>,
    pub company_contact: String,
}

/// Work section with the company phone already encrypted
pub struct WorkInfoInput<'a> {
    pub occupation: Option<&'a str>,
    pub company_name: Option<&'a str>,
    pub company_address: Option<&'a str>,
    pub company_postal_code: Option<&'a str>,
    pub company_contact: &'a str,
}

pub async fn upsert_work(
    conn: &mut PgConnection,
    existing: Option<i64>,
    info: &WorkInfoInput<'_>,
    actor: Option<i64>,
    now: i64,
) -> Result<i64, sqlx::Error> {
    if let Some(id) = existing {
        sqlx::query(
            "UPDATE work_infos SET occupation = $1, company_name = $2, company_address = $3, \
             company_postal_code = $4, company_contact = $5, modified_at = $6, modified_by = $7 \
             WHERE id = $8",
        )
        .bind(info.occupation)
        .bind(info.company_name)
        .bind(info.company_address)
        .bind(info.company_postal_code)
        .bind(info.company_contact)
        .bind(now)
        .bind(actor)
        .bind(id)
        .execute(conn)
        .await?;
        return Ok(id);
    }
    sqlx::query_scalar(
        "INSERT INTO work_infos (uuid, occupation, company_name, company_address, \
         company_postal_code, company_contact, created_at, created_by, modified_at, modified_by) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $7, $8) RETURNING id",
    )
    .bind(Uuid::new_v4())
    .bind(info.occupation)
    .bind(info.company_name)
    .bind(info.company_address)
    .bind(info.company_postal_code)
    .bind(info.company_contact)
    .bind(now)
    .bind(actor)
    .fetch_one(conn)
    .await
}

pub async fn find_work<'e, E>(executor: E, id: i64) -> Result<Option<WorkInfoRow>, sqlx::Error>
where
    E: sqlx::PgExecutor<'e>,
{
    sqlx::query_as(
        "SELECT uuid, occupation, company_name, company_address, company_postal_code, \
         company_contact FROM work_infos WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(executor)
    .await
}

// ── Education info ──────────────────────────────────────────────────

/// Education section joined with the lookup names
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EducationInfoRow {
    pub uuid: Uuid,
    pub education_uuid: Option<Uuid>,
    pub education_name: Option<String>,
    pub institution_uuid: Option<Uuid>,
    pub institution_name: Option<String>,
    pub other_societies: Option<String>,
}

pub struct EducationInfoInput<'a> {
    pub education_level_id: Option<i64>,
    pub institution_id: Option<i64>,
    pub other_societies: Option<&'a str>,
}

pub async fn upsert_education(
    conn: &mut PgConnection,
    existing: Option<i64>,
    info: &EducationInfoInput<'_>,
    actor: Option<i64>,
    now: i64,
) -> Result<i64, sqlx::Error> {
    if let Some(id) = existing {
        sqlx::query(
            "UPDATE education_infos SET education_level_id = $1, institution_id = $2, \
             other_societies = $3, modified_at = $4, modified_by = $5 WHERE id = $6",
        )
        .bind(info.education_level_id)
        .bind(info.institution_id)
        .bind(info.other_societies)
        .bind(now)
        .bind(actor)
        .bind(id)
        .execute(conn)
        .await?;
        return Ok(id);
    }
    sqlx::query_scalar(
        "INSERT INTO education_infos (uuid, education_level_id, institution_id, other_societies, \
         created_at, created_by, modified_at, modified_by) \
         VALUES ($1, $2, $3, $4, $5, $6, $5, $6) RETURNING id",
    )
    .bind(Uuid::new_v4())
    .bind(info.education_level_id)
    .bind(info.institution_id)
    .bind(info.other_societies)
    .bind(now)
    .bind(actor)
    .fetch_one(conn)
    .await
}

pub async fn find_education<'e, E>(
    executor: E,
    id: i64,
) -> Result<Option<EducationInfoRow>, sqlx::Error>
where
    E: sqlx::PgExecutor<'e>,
{
    sqlx::query_as(
        "SELECT ei.uuid, el.uuid AS education_uuid, el.name AS education_name, \
         i.uuid AS institution_uuid, i.name AS institution_name, ei.other_societies \
         FROM education_infos ei \
         LEFT JOIN education_levels el ON el.id = ei.education_level_id \
         LEFT JOIN institutions i ON i.id = ei.institution_id \
         WHERE ei.id = $1",
    )
    .bind(id)
    .fetch_optional(executor)
    .await
}
