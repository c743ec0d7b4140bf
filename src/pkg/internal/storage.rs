use aws_sdk_s3::{Client, config::Region, primitives::ByteStream};
use standard_error::{Interpolate, StandardError};

use crate::{conf::settings, prelude::Result};

pub async fn build_client() -> Client {
    let base = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new(settings.s3_region.clone()))
        .endpoint_url(settings.s3_endpoint.clone())
        .load()
        .await;
    // path-style addressing, MinIO does not resolve bucket subdomains
    let conf = aws_sdk_s3::config::Builder::from(&base)
        .force_path_style(true)
        .build();
    Client::from_conf(conf)
}

pub async fn create_bucket(
    client: &Client,
    bucket_name: &str,
) -> Result<Option<aws_sdk_s3::operation::create_bucket::CreateBucketOutput>> {
    let constraint =
        aws_sdk_s3::types::BucketLocationConstraint::from(settings.s3_region.to_string().as_str());
    let cfg = aws_sdk_s3::types::CreateBucketConfiguration::builder()
        .location_constraint(constraint)
        .build();
    let create = client
        .create_bucket()
        .create_bucket_configuration(cfg)
        .bucket(bucket_name)
        .send()
        .await;
    create.map(Some).or_else(|err| {
        if err
            .as_service_error()
            .map(|se| se.is_bucket_already_exists() || se.is_bucket_already_owned_by_you())
            == Some(true)
        {
            Ok(None)
        } else {
            Err(StandardError::new("ERR-S3-001"))
        }
    })
}

pub trait S3Ops {
    async fn upload_object(
        &self,
        bucket: &str,
        key: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<()>;
    fn public_url(&self, bucket: &str, key: &str) -> String;
}

impl S3Ops for Client {
    async fn upload_object(
        &self,
        bucket: &str,
        key: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<()> {
        self.put_object()
            .bucket(bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|e| StandardError::new("ERR-S3-002").interpolate_err(e.to_string()))?;
        tracing::debug!("uploaded {} to bucket {}", key, bucket);
        Ok(())
    }

    fn public_url(&self, bucket: &str, key: &str) -> String {
        format!(
            "{}/{}/{}",
            settings.s3_public_url.trim_end_matches('/'),
            bucket,
            key
        )
    }
}

/// Storage key scoped by job, with a millisecond prefix so repeated uploads
/// of the same filename never collide.
pub fn resume_key(job_id: i32, uploaded_at_millis: i64, filename: &str) -> String {
    let safe: String = filename
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '-'
            }
        })
        .collect();
    format!("resumes/{}/{}-{}", job_id, uploaded_at_millis, safe)
}

#[cfg(test)]
mod tests {
    use super::resume_key;

    #[test]
    fn test_resume_key_shape() {
        assert_eq!(
            resume_key(42, 1700000000000, "cv.pdf"),
            "resumes/42/1700000000000-cv.pdf"
        );
    }

    #[test]
    fn test_resume_key_sanitizes_filename() {
        assert_eq!(
            resume_key(1, 5, "my résumé (final).pdf"),
            "resumes/1/5-my-r-sum---final-.pdf"
        );
    }
}
