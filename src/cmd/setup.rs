use crate::{conf::settings, pkg::internal::storage, prelude::Result};

pub async fn apply() -> Result<()> {
    let client = storage::build_client().await;
    match storage::create_bucket(&client, &settings.s3_bucket_name).await? {
        Some(_) => println!("Bucket {} created", &settings.s3_bucket_name),
        None => println!("Bucket {} already exists", &settings.s3_bucket_name),
    }
    Ok(())
}
