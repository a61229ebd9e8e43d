//! Abstractions over the object store that holds raw extracts and the
//! published master dataset.
//!
//! A namespace is a logical grouping of objects (a key prefix on S3); the
//! pipeline reads increments from one namespace and publishes the master
//! dataset into another.

use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_credential_types::provider::SharedCredentialsProvider;
use aws_credential_types::Credentials;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::error::SdkError;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use bytes::Bytes;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct S3Config {
    pub bucket: String,
    pub region: String,
    pub endpoint: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub force_path_style: bool,
}

impl Default for S3Config {
    fn default() -> Self {
        Self {
            bucket: "shipstream-data".to_string(),
            region: "us-east-1".to_string(),
            endpoint: None,
            access_key_id: None,
            secret_access_key: None,
            force_path_style: false,
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("sdk error: {0}")]
    Sdk(String),
    #[error("object not found: {0}")]
    NotFound(String),
}

impl StoreError {
    fn from_sdk(err: impl fmt::Display) -> Self {
        Self::Sdk(err.to_string())
    }
}

/// Blocking-style async access to namespaced objects. `write` always
/// overwrites an existing object of the same name.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn list(&self, namespace: &str, suffix: &str) -> Result<Vec<String>, StoreError>;
    async fn read_text(&self, namespace: &str, name: &str) -> Result<String, StoreError>;
    async fn write(
        &self,
        namespace: &str,
        name: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<(), StoreError>;
}

/// Upstream extracts predate UTF-8; anything that fails strict decoding is
/// read as Latin-1, which maps every byte to the same code point.
pub fn decode_text(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

fn object_key(namespace: &str, name: &str) -> String {
    if namespace.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", namespace.trim_end_matches('/'), name)
    }
}

#[derive(Clone)]
pub struct S3ObjectStore {
    client: Client,
    bucket: String,
}

impl S3ObjectStore {
    pub async fn new(config: S3Config) -> Result<Self, StoreError> {
        if config.bucket.is_empty() {
            return Err(StoreError::Configuration(
                "bucket name cannot be empty".into(),
            ));
        }

        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()));

        if let (Some(access_key), Some(secret_key)) =
            (&config.access_key_id, &config.secret_access_key)
        {
            let credentials = Credentials::new(access_key, secret_key, None, None, "static");
            loader = loader.credentials_provider(SharedCredentialsProvider::new(credentials));
        }

        let shared_config = loader.load().await;
        let mut builder = aws_sdk_s3::config::Builder::from(&shared_config);

        if let Some(endpoint) = &config.endpoint {
            builder = builder.endpoint_url(endpoint);
        }

        if config.force_path_style {
            builder = builder.force_path_style(true);
        }

        let client = Client::from_conf(builder.build());
        Ok(Self {
            client,
            bucket: config.bucket,
        })
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn list(&self, namespace: &str, suffix: &str) -> Result<Vec<String>, StoreError> {
        let prefix = if namespace.is_empty() {
            String::new()
        } else {
            format!("{}/", namespace.trim_end_matches('/'))
        };

        let mut names = Vec::new();
        let mut continuation: Option<String> = None;

        loop {
            let mut request = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(&prefix);
            if let Some(token) = &continuation {
                request = request.continuation_token(token);
            }

            let output = request.send().await.map_err(StoreError::from_sdk)?;

            for object in output.contents() {
                if let Some(key) = object.key() {
                    let name = key.strip_prefix(&prefix).unwrap_or(key);
                    if !name.is_empty() && name.ends_with(suffix) {
                        names.push(name.to_string());
                    }
                }
            }

            match output.next_continuation_token() {
                Some(token) => continuation = Some(token.to_string()),
                None => break,
            }
        }

        Ok(names)
    }

    async fn read_text(&self, namespace: &str, name: &str) -> Result<String, StoreError> {
        let key = object_key(namespace, name);
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(&key)
            .send()
            .await
            .map_err(|err| match err {
                SdkError::ServiceError(service_err) => {
                    let message = service_err.err().to_string();
                    if message.contains("NoSuchKey") {
                        StoreError::NotFound(key.clone())
                    } else {
                        StoreError::from_sdk(message)
                    }
                }
                other => StoreError::from_sdk(other),
            })?;

        let data = output.body.collect().await.map_err(StoreError::from_sdk)?;
        Ok(decode_text(&data.into_bytes()))
    }

    async fn write(
        &self,
        namespace: &str,
        name: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<(), StoreError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(object_key(namespace, name))
            .body(ByteStream::from(bytes.to_vec()))
            .content_type(content_type)
            .send()
            .await
            .map_err(StoreError::from_sdk)?;
        Ok(())
    }
}

/// In-memory store used by tests and local development.
#[derive(Default)]
pub struct MemoryObjectStore {
    objects: Mutex<HashMap<(String, String), Bytes>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Test helper: seed an object without going through the trait.
    pub fn insert(&self, namespace: &str, name: &str, bytes: impl Into<Bytes>) {
        let mut objects = self.objects.lock().unwrap();
        objects.insert((namespace.to_string(), name.to_string()), bytes.into());
    }

    pub fn get(&self, namespace: &str, name: &str) -> Option<Bytes> {
        let objects = self.objects.lock().unwrap();
        objects
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn list(&self, namespace: &str, suffix: &str) -> Result<Vec<String>, StoreError> {
        let objects = self.objects.lock().unwrap();
        let mut names: Vec<String> = objects
            .keys()
            .filter(|(ns, name)| ns == namespace && name.ends_with(suffix))
            .map(|(_, name)| name.clone())
            .collect();
        names.sort();
        Ok(names)
    }

    async fn read_text(&self, namespace: &str, name: &str) -> Result<String, StoreError> {
        let objects = self.objects.lock().unwrap();
        objects
            .get(&(namespace.to_string(), name.to_string()))
            .map(|bytes| decode_text(bytes))
            .ok_or_else(|| StoreError::NotFound(object_key(namespace, name)))
    }

    async fn write(
        &self,
        namespace: &str,
        name: &str,
        bytes: Bytes,
        _content_type: &str,
    ) -> Result<(), StoreError> {
        let mut objects = self.objects.lock().unwrap();
        objects.insert((namespace.to_string(), name.to_string()), bytes);
        Ok(())
    }
}
