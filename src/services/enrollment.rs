//! Profile linker: creates and maintains the link between an account and its
//! role-specific profile (student, teacher, parent).
//!
//! Students and auto-created parents have no natural email, so one is derived
//! deterministically (matricule for students, phone for parents). Profiles
//! created here get a fixed per-role default password which the school office
//! hands out out-of-band.

use chrono::NaiveDate;
use sqlx::SqliteConnection;

use crate::database::models::account::{self, Account, Role};
use crate::database::models::class;
use crate::database::models::student::{self, NewStudent, Sex, Student};
use crate::database::models::subject;
use crate::database::models::teacher::{self, NewTeacher, Teacher};
use crate::error::ApiError;
use crate::services::identity::{self, CreateAccount};

pub const DEFAULT_STUDENT_PASSWORD: &str = "student1234";
pub const DEFAULT_TEACHER_PASSWORD: &str = "teacher1234";
pub const DEFAULT_PARENT_PASSWORD: &str = "parent123";

const STUDENT_EMAIL_DOMAIN: &str = "student.school";
const PARENT_EMAIL_DOMAIN: &str = "parent.school";

/// Synthetic address for a student account, derived from the matricule
pub fn student_email(matricule: &str) -> String {
    identity::normalize_email(&format!("{}@{}", matricule, STUDENT_EMAIL_DOMAIN))
}

/// Synthetic address for a guardian account, derived from the phone number
pub fn parent_email(phone: &str) -> String {
    identity::normalize_email(&format!("{}@{}", phone, PARENT_EMAIL_DOMAIN))
}

pub struct EnrollStudent {
    pub name: String,
    pub surname: String,
    pub sex: Sex,
    pub matricule: String,
    pub birth_date: Option<NaiveDate>,
    pub address: Option<String>,
    pub class_id: i64,
    pub guardian_name: String,
    pub guardian_surname: String,
    pub guardian_phone: String,
}

/// Enroll a student: guardian account (created or reused), student account
/// and student profile, all inside the caller's transaction.
pub async fn enroll_student(
    conn: &mut SqliteConnection,
    req: EnrollStudent,
) -> Result<Student, ApiError> {
    let enrolled_class = class::find(conn, req.class_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Class {} not found", req.class_id)))?;

    if student::matricule_taken(conn, &req.matricule, None).await? {
        return Err(ApiError::conflict(format!(
            "Matricule '{}' is already assigned to another student",
            req.matricule
        )));
    }

    // Guardian accounts are shared across siblings: reuse by derived email
    let guardian_email = parent_email(&req.guardian_phone);
    let guardian = match account::find_by_email(conn, &guardian_email).await? {
        Some(existing) => existing,
        None => {
            identity::create_account(
                conn,
                CreateAccount {
                    email: guardian_email,
                    password: DEFAULT_PARENT_PASSWORD.to_string(),
                    name: req.guardian_name.clone(),
                    surname: req.guardian_surname.clone(),
                    phone: Some(req.guardian_phone.clone()),
                    role: Role::Parent,
                },
            )
            .await?
        }
    };

    // The student slot is not shared; an existing account there is a conflict
    let email = student_email(&req.matricule);
    if account::email_taken(conn, &email, None).await? {
        return Err(ApiError::conflict(format!(
            "A student account with email '{}' already exists",
            email
        )));
    }

    let student_account = identity::create_account(
        conn,
        CreateAccount {
            email,
            password: DEFAULT_STUDENT_PASSWORD.to_string(),
            name: req.name.clone(),
            surname: req.surname.clone(),
            phone: None,
            role: Role::Student,
        },
    )
    .await?;

    let created = student::insert(
        conn,
        &NewStudent {
            account_id: student_account.id,
            guardian_id: guardian.id,
            class_id: enrolled_class.id,
            name: req.name,
            surname: req.surname,
            sex: req.sex,
            matricule: req.matricule,
            birth_date: req.birth_date,
            address: req.address,
        },
    )
    .await?;

    Ok(created)
}

#[derive(Default)]
pub struct StudentPatch {
    pub name: Option<String>,
    pub surname: Option<String>,
    pub sex: Option<Sex>,
    pub matricule: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub address: Option<String>,
    pub class_id: Option<i64>,
    pub guardian_name: Option<String>,
    pub guardian_surname: Option<String>,
    pub guardian_phone: Option<String>,
}

/// Partial update; profile edits cascade into the linked account (name sync,
/// matricule-derived email) and guardian account (contact sync).
pub async fn update_student(
    conn: &mut SqliteConnection,
    id: i64,
    patch: StudentPatch,
) -> Result<Student, ApiError> {
    let mut found = student::find(conn, id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Student {} not found", id)))?;
    let mut owned_account = account::find(conn, found.account_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Account for student {} not found", id)))?;

    if let Some(name) = patch.name {
        found.name = name.clone();
        owned_account.name = name;
    }
    if let Some(surname) = patch.surname {
        found.surname = surname.clone();
        owned_account.surname = surname;
    }
    if let Some(sex) = patch.sex {
        found.sex = sex;
    }
    if let Some(matricule) = patch.matricule {
        if student::matricule_taken(conn, &matricule, Some(found.id)).await? {
            return Err(ApiError::conflict(format!(
                "Matricule '{}' is already assigned to another student",
                matricule
            )));
        }
        let new_email = student_email(&matricule);
        if account::email_taken(conn, &new_email, Some(owned_account.id)).await? {
            return Err(ApiError::conflict(format!(
                "A student account with email '{}' already exists",
                new_email
            )));
        }
        found.matricule = matricule;
        owned_account.email = new_email;
    }
    if let Some(birth_date) = patch.birth_date {
        found.birth_date = Some(birth_date);
    }
    if let Some(address) = patch.address {
        found.address = Some(address);
    }
    if let Some(class_id) = patch.class_id {
        class::find(conn, class_id)
            .await?
            .ok_or_else(|| ApiError::not_found(format!("Class {} not found", class_id)))?;
        found.class_id = class_id;
    }

    student::update(conn, &found).await?;
    account::update_identity(
        conn,
        owned_account.id,
        &owned_account.email,
        &owned_account.name,
        &owned_account.surname,
        owned_account.phone.as_deref(),
    )
    .await?;

    let touches_guardian = patch.guardian_name.is_some()
        || patch.guardian_surname.is_some()
        || patch.guardian_phone.is_some();
    if touches_guardian {
        sync_guardian(
            conn,
            found.guardian_id,
            patch.guardian_name,
            patch.guardian_surname,
            patch.guardian_phone,
        )
        .await?;
    }

    Ok(found)
}

async fn sync_guardian(
    conn: &mut SqliteConnection,
    guardian_id: i64,
    name: Option<String>,
    surname: Option<String>,
    phone: Option<String>,
) -> Result<(), ApiError> {
    let mut guardian: Account = account::find(conn, guardian_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Guardian account {} not found", guardian_id)))?;

    if let Some(name) = name {
        guardian.name = name;
    }
    if let Some(surname) = surname {
        guardian.surname = surname;
    }
    if let Some(phone) = phone {
        let new_email = parent_email(&phone);
        if account::email_taken(conn, &new_email, Some(guardian.id)).await? {
            return Err(ApiError::conflict(format!(
                "A parent account with email '{}' already exists",
                new_email
            )));
        }
        guardian.phone = Some(phone);
        guardian.email = new_email;
    }

    account::update_identity(
        conn,
        guardian.id,
        &guardian.email,
        &guardian.name,
        &guardian.surname,
        guardian.phone.as_deref(),
    )
    .await?;
    Ok(())
}

/// Delete a student and its exclusively-owned account. The guardian account
/// stays: other students may share it.
pub async fn delete_student(conn: &mut SqliteConnection, id: i64) -> Result<(), ApiError> {
    let found = student::find(conn, id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Student {} not found", id)))?;

    student::delete(conn, found.id).await?;
    account::delete(conn, found.account_id).await?;
    Ok(())
}

pub struct NewTeacherProfile {
    pub email: String,
    pub name: String,
    pub surname: String,
    pub phone: String,
    pub matricule: String,
    pub subject_ids: Vec<i64>,
}

pub async fn create_teacher(
    conn: &mut SqliteConnection,
    req: NewTeacherProfile,
) -> Result<Teacher, ApiError> {
    if teacher::matricule_taken(conn, &req.matricule, None).await? {
        return Err(ApiError::conflict(format!(
            "Matricule '{}' is already assigned to another teacher",
            req.matricule
        )));
    }

    ensure_subjects_exist(conn, &req.subject_ids).await?;

    let owned_account = identity::create_account(
        conn,
        CreateAccount {
            email: req.email,
            password: DEFAULT_TEACHER_PASSWORD.to_string(),
            name: req.name.clone(),
            surname: req.surname.clone(),
            phone: Some(req.phone.clone()),
            role: Role::Teacher,
        },
    )
    .await?;

    let created = teacher::insert(
        conn,
        &NewTeacher {
            account_id: owned_account.id,
            name: req.name,
            surname: req.surname,
            phone: req.phone,
            matricule: req.matricule,
        },
    )
    .await?;

    teacher::replace_subjects(conn, created.id, &req.subject_ids).await?;
    Ok(created)
}

#[derive(Default)]
pub struct TeacherPatch {
    pub email: Option<String>,
    pub name: Option<String>,
    pub surname: Option<String>,
    pub phone: Option<String>,
    pub matricule: Option<String>,
    pub subject_ids: Option<Vec<i64>>,
}

pub async fn update_teacher(
    conn: &mut SqliteConnection,
    id: i64,
    patch: TeacherPatch,
) -> Result<Teacher, ApiError> {
    let mut found = teacher::find(conn, id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Teacher {} not found", id)))?;
    let mut owned_account = account::find(conn, found.account_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Account for teacher {} not found", id)))?;

    if let Some(name) = patch.name {
        found.name = name.clone();
        owned_account.name = name;
    }
    if let Some(surname) = patch.surname {
        found.surname = surname.clone();
        owned_account.surname = surname;
    }
    if let Some(phone) = patch.phone {
        found.phone = phone.clone();
        owned_account.phone = Some(phone);
    }
    if let Some(matricule) = patch.matricule {
        if teacher::matricule_taken(conn, &matricule, Some(found.id)).await? {
            return Err(ApiError::conflict(format!(
                "Matricule '{}' is already assigned to another teacher",
                matricule
            )));
        }
        found.matricule = matricule;
    }
    if let Some(email) = patch.email {
        let email = identity::normalize_email(&email);
        if account::email_taken(conn, &email, Some(owned_account.id)).await? {
            return Err(ApiError::conflict(format!("Email '{}' is already in use", email)));
        }
        owned_account.email = email;
    }

    teacher::update(conn, &found).await?;
    account::update_identity(
        conn,
        owned_account.id,
        &owned_account.email,
        &owned_account.name,
        &owned_account.surname,
        owned_account.phone.as_deref(),
    )
    .await?;

    // Full replacement: the supplied list becomes the whole association set
    if let Some(subject_ids) = patch.subject_ids {
        ensure_subjects_exist(conn, &subject_ids).await?;
        teacher::replace_subjects(conn, found.id, &subject_ids).await?;
    }

    Ok(found)
}

/// Delete a teacher and its account; blocked while timetable entries,
/// attendance records or a head-teacher reference still point at it.
pub async fn delete_teacher(conn: &mut SqliteConnection, id: i64) -> Result<(), ApiError> {
    let found = teacher::find(conn, id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Teacher {} not found", id)))?;

    if teacher::reference_count(conn, found.id).await? > 0 {
        return Err(ApiError::conflict(
            "Teacher is still referenced by schedule slots, attendance records or classes",
        ));
    }

    teacher::delete(conn, found.id).await?;
    account::delete(conn, found.account_id).await?;
    Ok(())
}

/// Parent accounts are deletable only once they guard no students
pub async fn delete_parent(conn: &mut SqliteConnection, id: i64) -> Result<(), ApiError> {
    let found = account::find(conn, id)
        .await?
        .filter(|a| a.role == Role::Parent)
        .ok_or_else(|| ApiError::not_found(format!("Parent account {} not found", id)))?;

    let children = student::count_by_guardian(conn, found.id).await?;
    if children > 0 {
        return Err(ApiError::conflict(format!(
            "Parent account still guards {} enrolled student(s)",
            children
        )));
    }

    account::delete(conn, found.id).await?;
    Ok(())
}

async fn ensure_subjects_exist(
    conn: &mut SqliteConnection,
    subject_ids: &[i64],
) -> Result<(), ApiError> {
    for subject_id in subject_ids {
        subject::find(conn, *subject_id)
            .await?
            .ok_or_else(|| ApiError::not_found(format!("Subject {} not found", subject_id)))?;
    }
    Ok(())
}
