//! API key module
//!
//! Authenticates `X-Api-Key` against a fixed key table. Written against the
//! synchronous module interface and adapted into the pipeline.

use std::collections::HashMap;

use authn::application::legacy::{LegacyAuthContext, LegacyAuthModule, LegacyError, MessageInfo};
use authn::domain::{MessagePolicy, Outcome, Principal, Subject};
use axum::http::HeaderValue;
use axum::http::header::WWW_AUTHENTICATE;
use serde_json::{Map, Value};

const API_KEY_HEADER: &str = "x-api-key";

pub struct ApiKeyModule {
    /// key -> principal name
    keys: HashMap<String, String>,
}

impl ApiKeyModule {
    /// Parse `name:key` pairs separated by commas
    pub fn from_spec(spec: &str) -> Self {
        let keys = spec
            .split(',')
            .filter_map(|pair| pair.trim().split_once(':'))
            .filter(|(name, key)| !name.is_empty() && !key.is_empty())
            .map(|(name, key)| (key.to_string(), name.to_string()))
            .collect();
        Self { keys }
    }

    fn challenge(message_info: &mut MessageInfo<'_>, reason: &str) {
        message_info
            .response_mut()
            .headers_mut()
            .insert(WWW_AUTHENTICATE, HeaderValue::from_static("ApiKey"));
        message_info.map().set_failure_reason(Map::from_iter([(
            "reason".to_string(),
            Value::String(reason.to_string()),
        )]));
    }
}

impl LegacyAuthContext for ApiKeyModule {
    fn validate_request(
        &self,
        message_info: &mut MessageInfo<'_>,
        client_subject: &mut Subject,
        _service_subject: &Subject,
    ) -> Result<Option<Outcome>, LegacyError> {
        let presented = message_info
            .request()
            .headers()
            .get(API_KEY_HEADER)
            .map(|value| value.to_str().map(str::to_string));

        let key = match presented {
            None => {
                Self::challenge(message_info, "missing api key");
                return Ok(Some(Outcome::ResponseFailure));
            }
            Some(Err(e)) => {
                return Err(LegacyError::new("Api key header is not visible ASCII").with_cause(e));
            }
            Some(Ok(key)) => key,
        };

        match self.keys.get(&key) {
            Some(name) => {
                client_subject.add_principal(Principal::new(name.clone()));
                let channel = message_info.map();
                channel.set_principal(name.clone());
                channel.insert_info("scheme", "api-key");
                channel
                    .attributes
                    .insert("scheme".to_string(), Value::String("api-key".to_string()));
                Ok(Some(Outcome::Authenticated))
            }
            None => {
                Self::challenge(message_info, "unknown api key");
                Ok(Some(Outcome::ResponseFailure))
            }
        }
    }

    fn secure_response(
        &self,
        _message_info: &mut MessageInfo<'_>,
        _service_subject: &Subject,
    ) -> Result<Option<Outcome>, LegacyError> {
        Ok(Some(Outcome::ResponseAuthenticated))
    }

    fn clean_subject(
        &self,
        _message_info: &mut MessageInfo<'_>,
        client_subject: &mut Subject,
    ) -> Result<(), LegacyError> {
        client_subject.clear();
        Ok(())
    }
}

impl LegacyAuthModule for ApiKeyModule {
    fn module_id(&self) -> Option<String> {
        Some("api-key".to_string())
    }

    fn initialize(
        &self,
        _request_policy: Option<&MessagePolicy>,
        _response_policy: Option<&MessagePolicy>,
        _handler: Option<std::sync::Arc<dyn authn::domain::CallbackHandler>>,
        _options: &Map<String, Value>,
    ) -> Result<(), LegacyError> {
        if self.keys.is_empty() {
            return Err(LegacyError::new("no API keys configured"));
        }
        tracing::info!(keys = self.keys.len(), "Api key module ready");
        Ok(())
    }
}
