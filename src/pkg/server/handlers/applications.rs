use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Multipart, Path, State, multipart::Field},
    http::StatusCode,
};
use chrono::Utc;
use serde_json::{Value, json};
use standard_error::{Interpolate, StandardError, Status};

use crate::{
    conf::settings,
    pkg::{
        internal::{
            adaptors::{
                applications::{
                    mutators::{ApplicationMutator, CreateApplicationData},
                    selectors::ApplicationSelector,
                    spec::ApplicationEntry,
                },
                jobs::selectors::JobSelector,
            },
            auth::User,
            storage::{S3Ops, resume_key},
            validate,
        },
        server::state::{AppState, GetTxn},
    },
    prelude::Result,
};

/// Raw multipart fields as collected off the wire, before validation.
#[derive(Debug, Default)]
pub struct SubmissionForm {
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub cover_letter: Option<String>,
    pub resume_url: Option<String>,
    pub resume_file: Option<(String, Vec<u8>)>,
}

#[derive(Debug)]
pub enum Resume {
    Url(String),
    File {
        filename: String,
        kind: validate::ResumeKind,
        data: Vec<u8>,
    },
}

/// A submission that passed every field check. Nothing here has touched the
/// database or the object store yet.
#[derive(Debug)]
pub struct ValidSubmission {
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub cover_letter: Option<String>,
    pub resume: Resume,
}

pub fn validate_submission(form: SubmissionForm) -> Result<ValidSubmission> {
    let full_name = validate::full_name(&form.full_name)?;
    let email = validate::email(&form.email)?;
    let resume = match (form.resume_url, form.resume_file) {
        (Some(url), None) => Resume::Url(validate::resume_url(&url)?),
        (None, Some((filename, data))) => {
            let kind = validate::resume_file(&filename, data.len())?;
            Resume::File {
                filename,
                kind,
                data,
            }
        }
        _ => {
            return Err(StandardError::new("ERR-VAL-RESUME").code(StatusCode::UNPROCESSABLE_ENTITY));
        }
    };
    Ok(ValidSubmission {
        full_name,
        email,
        phone: form.phone.map(|p| p.trim().to_string()).filter(|p| !p.is_empty()),
        cover_letter: form.cover_letter.filter(|c| !c.trim().is_empty()),
        resume,
    })
}

pub async fn submit(
    State(state): State<AppState>,
    Path(job_id): Path<i32>,
    multipart: Multipart,
) -> Result<Json<ApplicationEntry>> {
    let form = collect_form(multipart).await?;
    let submission = validate_submission(form)?;

    let mut tx = state.db_pool.begin_txn().await?;
    let job = JobSelector::new(&mut tx)
        .get_by_id(job_id)
        .await?
        .ok_or_else(|| StandardError::new("ERR-JOB-404").code(StatusCode::NOT_FOUND))?;

    if ApplicationSelector::new(&mut tx)
        .exists_for_job_and_email(job_id, &submission.email)
        .await?
    {
        return Err(StandardError::new("ERR-APP-DUP").code(StatusCode::CONFLICT));
    }

    let resume_url = match submission.resume {
        Resume::Url(url) => url,
        Resume::File {
            filename,
            kind,
            data,
        } => {
            let key = resume_key(job_id, Utc::now().timestamp_millis(), &filename);
            state
                .s3_client
                .upload_object(&settings.s3_bucket_name, &key, data, kind.mime_type())
                .await?;
            state.s3_client.public_url(&settings.s3_bucket_name, &key)
        }
    };

    let application = ApplicationMutator::new(&mut tx)
        .create(CreateApplicationData {
            job_id,
            job_title: job.title,
            full_name: submission.full_name,
            email: submission.email,
            phone: submission.phone,
            cover_letter: submission.cover_letter,
            resume_url,
        })
        .await?;
    tx.commit().await?;

    tracing::info!("application {} submitted for job {}", application.id, job_id);
    Ok(Json(application))
}

pub async fn list_for_job(
    State(state): State<AppState>,
    Extension(_user): Extension<Arc<User>>,
    Path(job_id): Path<i32>,
) -> Result<Json<Vec<ApplicationEntry>>> {
    let mut tx = state.db_pool.begin_txn().await?;
    let applications = ApplicationSelector::new(&mut tx).get_by_job(job_id).await?;
    Ok(Json(applications))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<Arc<User>>,
    Path(application_id): Path<i32>,
) -> Result<Json<Value>> {
    let mut tx = state.db_pool.begin_txn().await?;
    let removed = ApplicationMutator::new(&mut tx).delete(application_id).await?;
    tx.commit().await?;
    if !removed {
        return Err(StandardError::new("ERR-APP-404").code(StatusCode::NOT_FOUND));
    }

    tracing::info!("application {} deleted by {}", application_id, &user.name);
    Ok(Json(json!({"status": "deleted"})))
}

async fn collect_form(mut multipart: Multipart) -> Result<SubmissionForm> {
    let mut form = SubmissionForm::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| StandardError::new("ERR-APP-FORM").interpolate_err(e.to_string()))?
    {
        let field_name = field.name().unwrap_or("").to_string();
        match field_name.as_str() {
            "fullName" => form.full_name = text(field).await?,
            "email" => form.email = text(field).await?,
            "phone" => form.phone = some_text(field).await?,
            "coverLetter" => form.cover_letter = some_text(field).await?,
            "resumeUrl" => form.resume_url = some_text(field).await?,
            "resume" => {
                let filename = field.file_name().unwrap_or("unknown").to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| StandardError::new("ERR-APP-FORM").interpolate_err(e.to_string()))?;
                form.resume_file = Some((filename, data.into()));
            }
            _ => {
                let _ = field
                    .bytes()
                    .await
                    .map_err(|e| StandardError::new("ERR-APP-FORM").interpolate_err(e.to_string()))?;
            }
        }
    }
    Ok(form)
}

async fn text(field: Field<'_>) -> Result<String> {
    field
        .text()
        .await
        .map_err(|e| StandardError::new("ERR-APP-FORM").interpolate_err(e.to_string()))
}

/// Empty or whitespace-only fields count as absent.
async fn some_text(field: Field<'_>) -> Result<Option<String>> {
    let value = text(field).await?;
    Ok((!value.trim().is_empty()).then_some(value))
}

#[cfg(test)]
mod tests {
    use super::{Resume, SubmissionForm, validate_submission};
    use crate::pkg::internal::validate::{MAX_RESUME_BYTES, ResumeKind};

    fn jane_doe() -> SubmissionForm {
        SubmissionForm {
            full_name: "Jane Doe".into(),
            email: "jane@x.com".into(),
            resume_url: Some("https://x.com/r.pdf".into()),
            ..SubmissionForm::default()
        }
    }

    #[test]
    fn test_url_submission_passes() {
        let valid = validate_submission(jane_doe()).expect("should validate");
        assert_eq!(valid.full_name, "Jane Doe");
        assert_eq!(valid.email, "jane@x.com");
        match valid.resume {
            Resume::Url(url) => assert_eq!(url, "https://x.com/r.pdf"),
            Resume::File { .. } => panic!("expected a resume link"),
        }
    }

    #[test]
    fn test_file_submission_passes() {
        let form = SubmissionForm {
            resume_url: None,
            resume_file: Some(("cv.pdf".into(), vec![0u8; 2048])),
            ..jane_doe()
        };
        let valid = validate_submission(form).expect("should validate");
        match valid.resume {
            Resume::File { kind, .. } => assert_eq!(kind, ResumeKind::Pdf),
            Resume::Url(_) => panic!("expected an uploaded file"),
        }
    }

    #[test]
    fn test_bad_email_rejected_before_any_backend_call() {
        let form = SubmissionForm {
            email: "jane@x".into(),
            ..jane_doe()
        };
        assert!(validate_submission(form).is_err());
    }

    #[test]
    fn test_blank_name_rejected() {
        let form = SubmissionForm {
            full_name: "   ".into(),
            ..jane_doe()
        };
        assert!(validate_submission(form).is_err());
    }

    #[test]
    fn test_unparseable_resume_url_rejected() {
        let form = SubmissionForm {
            resume_url: Some("resume.pdf".into()),
            ..jane_doe()
        };
        assert!(validate_submission(form).is_err());
    }

    #[test]
    fn test_resume_required() {
        let form = SubmissionForm {
            resume_url: None,
            ..jane_doe()
        };
        assert!(validate_submission(form).is_err());
    }

    #[test]
    fn test_resume_file_and_url_together_rejected() {
        let form = SubmissionForm {
            resume_file: Some(("cv.pdf".into(), vec![0u8; 16])),
            ..jane_doe()
        };
        assert!(validate_submission(form).is_err());
    }

    #[test]
    fn test_oversize_or_wrong_type_file_never_reaches_upload() {
        let oversize = SubmissionForm {
            resume_url: None,
            resume_file: Some(("cv.pdf".into(), vec![0u8; MAX_RESUME_BYTES + 1])),
            ..jane_doe()
        };
        assert!(validate_submission(oversize).is_err());

        let wrong_type = SubmissionForm {
            resume_url: None,
            resume_file: Some(("cv.exe".into(), vec![0u8; 16])),
            ..jane_doe()
        };
        assert!(validate_submission(wrong_type).is_err());
    }

    #[test]
    fn test_optional_fields_normalized() {
        let form = SubmissionForm {
            phone: Some("  +1 555 0100 ".into()),
            cover_letter: Some("   ".into()),
            ..jane_doe()
        };
        let valid = validate_submission(form).expect("should validate");
        assert_eq!(valid.phone.as_deref(), Some("+1 555 0100"));
        assert!(valid.cover_letter.is_none());
    }
}
