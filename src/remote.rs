//! Bucket and object CRUD against an S3-compatible object store.

use std::fmt;

use s3::creds::Credentials;
use s3::{Bucket, BucketConfiguration, Region};
use uuid::Uuid;

use crate::config::ObjectStoreConfig;
use crate::error::Result;

/// A handle to an S3-compatible object store.
///
/// This carries only the endpoint and credentials; per-bucket clients are
/// constructed on demand. TLS certificate validation is disabled for the
/// whole harness (`no-verify-ssl`), since stress targets routinely run with
/// self-signed certificates.
pub struct S3Remote {
    region: Region,
    credentials: Credentials,
}

impl fmt::Debug for S3Remote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("S3Remote")
            .field("endpoint", &self.region.endpoint())
            .finish_non_exhaustive()
    }
}

impl S3Remote {
    /// Creates a remote for the configured endpoint and credentials.
    pub fn connect(config: &ObjectStoreConfig) -> Result<Self> {
        let credentials = Credentials::new(
            Some(config.access_key.as_str()),
            Some(config.secret_key.as_str()),
            None,
            None,
            None,
        )?;

        let endpoint = if config.host.contains("://") {
            config.host.clone()
        } else {
            format!("https://{}", config.host)
        };
        let region = Region::Custom {
            region: "us-east-1".to_string(),
            endpoint,
        };

        Ok(Self {
            region,
            credentials,
        })
    }

    fn bucket(&self, name: &str) -> Result<Box<Bucket>> {
        let bucket = Bucket::new(name, self.region.clone(), self.credentials.clone())?;
        Ok(bucket.with_path_style())
    }

    /// Creates a bucket with a freshly generated unique name.
    ///
    /// Names are collision-checked against the store before creation.
    pub async fn create_unique_bucket(&self) -> Result<String> {
        loop {
            let name = Uuid::new_v4().to_string();
            if self.bucket(&name)?.exists().await? {
                continue;
            }

            Bucket::create_with_path_style(
                &name,
                self.region.clone(),
                self.credentials.clone(),
                BucketConfiguration::default(),
            )
            .await?;
            return Ok(name);
        }
    }

    /// Uploads an object into the given bucket.
    pub async fn upload(&self, bucket_name: &str, object_name: &str, content: &[u8]) -> Result<()> {
        self.bucket(bucket_name)?
            .put_object(object_name, content)
            .await?;
        Ok(())
    }

    /// Moves an object from one bucket to another.
    ///
    /// This is a two-step copy-then-delete across independent requests and
    /// makes no atomicity guarantee: a failure in between can leave the
    /// object present in both buckets or in neither. The content length for
    /// the copy is taken from the source object's response metadata.
    pub async fn move_object(
        &self,
        object_name: &str,
        source_bucket: &str,
        destination_bucket: &str,
    ) -> Result<()> {
        let source = self.bucket(source_bucket)?;
        let response = source.get_object(object_name).await?;

        let body = response.bytes();
        let content_length = response
            .headers()
            .get("content-length")
            .and_then(|value| value.parse::<usize>().ok())
            .unwrap_or(body.len());

        self.bucket(destination_bucket)?
            .put_object(object_name, &body[..content_length.min(body.len())])
            .await?;

        source.delete_object(object_name).await?;
        Ok(())
    }

    /// Deletes every object in the bucket, then the bucket itself.
    pub async fn remove_bucket(&self, name: &str) -> Result<()> {
        let bucket = self.bucket(name)?;

        for page in bucket.list(String::new(), None).await? {
            for object in page.contents {
                bucket.delete_object(&object.key).await?;
            }
        }

        bucket.delete().await?;
        Ok(())
    }
}
