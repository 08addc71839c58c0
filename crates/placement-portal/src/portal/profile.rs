use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::domain::{Student, UserProfile};
use super::error::{PortalError, ValidationError};
use super::repository::{ProfileRepository, RepositoryError, StudentRepository};

pub const CGPA_MIN: f32 = 0.0;
pub const CGPA_MAX: f32 = 10.0;

/// Percentage of the tracked fields (phone, CGPA, skills) that are filled in.
pub fn completion(phone: Option<&str>, cgpa: Option<f32>, skills: &[String]) -> u8 {
    let filled = [
        phone.is_some_and(|phone| !phone.trim().is_empty()),
        cgpa.is_some(),
        !skills.is_empty(),
    ]
    .into_iter()
    .filter(|filled| *filled)
    .count();
    ((filled as f32 / 3.0) * 100.0).round() as u8
}

pub fn student_completion(student: &Student) -> u8 {
    completion(student.phone.as_deref(), student.cgpa, &student.skills)
}

pub(crate) fn check_cgpa(cgpa: f32) -> Result<(), ValidationError> {
    if cgpa.is_nan() || !(CGPA_MIN..=CGPA_MAX).contains(&cgpa) {
        return Err(ValidationError::OutOfRange {
            field: "cgpa",
            min: CGPA_MIN,
            max: CGPA_MAX,
            found: cgpa,
        });
    }
    Ok(())
}

pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Trim entries, drop blanks, and keep the first occurrence of each skill.
pub fn normalize_skills(skills: Vec<String>) -> Vec<String> {
    let mut normalized: Vec<String> = Vec::with_capacity(skills.len());
    for skill in skills {
        let skill = skill.trim();
        if skill.is_empty() {
            continue;
        }
        if !normalized
            .iter()
            .any(|existing| existing.eq_ignore_ascii_case(skill))
        {
            normalized.push(skill.to_string());
        }
    }
    normalized
}

/// Full replacement for the editable student fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileEdits {
    pub full_name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub branch: Option<String>,
    #[serde(default)]
    pub passing_year: Option<u16>,
    #[serde(default)]
    pub cgpa: Option<f32>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub resume_url: Option<String>,
}

impl ProfileEdits {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.full_name.trim().is_empty() {
            return Err(ValidationError::Required { field: "full_name" });
        }
        if let Some(cgpa) = self.cgpa {
            check_cgpa(cgpa)?;
        }
        Ok(())
    }
}

/// Loads and saves the signed-in student's record.
pub struct ProfileManager<S> {
    store: Arc<S>,
}

impl<S> ProfileManager<S>
where
    S: ProfileRepository + StudentRepository,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Fetch the student row for a profile, creating a blank one on first visit.
    pub fn load_or_create(&self, profile: &UserProfile) -> Result<Student, PortalError> {
        if let Some(student) = self.store.student_for_profile(&profile.id)? {
            return Ok(student);
        }

        match self.store.insert_student(Student::blank(profile)) {
            Ok(student) => {
                tracing::info!(profile = %profile.id, student = %student.id, "created blank student record");
                Ok(student)
            }
            Err(RepositoryError::Conflict) => self
                .store
                .student_for_profile(&profile.id)?
                .ok_or_else(|| PortalError::not_found("student", &profile.id)),
            Err(err) => Err(err.into()),
        }
    }

    /// Validate and apply edits, renaming the owning profile as well.
    pub fn save(&self, student: &Student, edits: ProfileEdits) -> Result<Student, PortalError> {
        edits.validate()?;

        let full_name = edits.full_name.trim().to_string();
        let mut updated = Student {
            full_name: full_name.clone(),
            phone: non_blank(edits.phone),
            branch: non_blank(edits.branch),
            passing_year: edits.passing_year,
            cgpa: edits.cgpa,
            skills: normalize_skills(edits.skills),
            resume_url: non_blank(edits.resume_url),
            ..student.clone()
        };
        updated.profile_complete = student_completion(&updated);

        self.store.update_student(updated.clone())?;
        self.store.rename_profile(&student.profile_id, &full_name)?;
        tracing::info!(
            student = %updated.id,
            completion = updated.profile_complete,
            "student profile saved"
        );
        Ok(updated)
    }
}
