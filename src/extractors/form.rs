//! Extract a URL-encoded body as a flat string map, whatever the request's content type.

use crate::error::AppError;
use async_trait::async_trait;
use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
};
use std::collections::HashMap;

/// Form fields from the request body. A repeated key keeps its first value.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FormFields(HashMap<String, String>);

impl FormFields {
    /// Lenient parse: undecodable input yields an empty form, so the
    /// handler reports its usual "required" message.
    pub fn parse(body: &[u8]) -> Self {
        let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(body).unwrap_or_default();
        let mut fields = HashMap::with_capacity(pairs.len());
        for (k, v) in pairs {
            fields.entry(k).or_insert(v);
        }
        FormFields(fields)
    }

    /// Field value; absent and empty are the same.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }
}

#[async_trait]
impl<S> FromRequest<S> for FormFields
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let body = Bytes::from_request(req, state).await?;
        Ok(FormFields::parse(&body))
    }
}
