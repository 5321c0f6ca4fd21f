//! Message Context
//!
//! Everything one in-flight request carries through the pipeline. Owned by
//! exactly one `process_message` call and dropped once the response has
//! been emitted.

use std::any::{Any, type_name};
use std::collections::HashMap;

use axum::body::Body;
use http::{Request, Response};
use kernel::id::{ContextId, RequestId};

use super::audit_trail::AuditTrail;
use super::side_channel::SideChannel;

/// Per-request carrier handed to every phase
pub struct MessageContext {
    request_id: RequestId,
    transaction_id: String,
    request: Request<Body>,
    response: Response<Body>,
    audit_trail: AuditTrail,
    side_channel: SideChannel,
    state: HashMap<ContextId, Box<dyn Any + Send>>,
}

impl MessageContext {
    /// Wrap an incoming request. The response starts as an empty `200 OK`.
    pub fn new(request: Request<Body>, transaction_id: impl Into<String>) -> Self {
        let request_id = RequestId::new();
        let transaction_id = transaction_id.into();
        Self {
            request_id,
            audit_trail: AuditTrail::new(request_id, transaction_id.clone()),
            transaction_id,
            request,
            response: Response::new(Body::empty()),
            side_channel: SideChannel::new(),
            state: HashMap::new(),
        }
    }

    // ========================================================================
    // Identity
    // ========================================================================

    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    pub fn transaction_id(&self) -> &str {
        &self.transaction_id
    }

    // ========================================================================
    // Request / response
    // ========================================================================

    pub fn request(&self) -> &Request<Body> {
        &self.request
    }

    pub fn request_mut(&mut self) -> &mut Request<Body> {
        &mut self.request
    }

    pub fn set_request(&mut self, request: Request<Body>) {
        self.request = request;
    }

    pub fn response(&self) -> &Response<Body> {
        &self.response
    }

    pub fn response_mut(&mut self) -> &mut Response<Body> {
        &mut self.response
    }

    pub fn set_response(&mut self, response: Response<Body>) {
        self.response = response;
    }

    /// Move the request out, e.g. to hand it to the downstream handler
    ///
    /// A copy of the method, URI, version and headers stays behind with an
    /// empty body so later phases can still inspect the request line.
    /// Extensions do not survive.
    pub fn take_request(&mut self) -> Request<Body> {
        let mut placeholder = Request::new(Body::empty());
        *placeholder.method_mut() = self.request.method().clone();
        *placeholder.uri_mut() = self.request.uri().clone();
        *placeholder.version_mut() = self.request.version();
        *placeholder.headers_mut() = self.request.headers().clone();
        std::mem::replace(&mut self.request, placeholder)
    }

    pub fn take_response(&mut self) -> Response<Body> {
        std::mem::take(&mut self.response)
    }

    // ========================================================================
    // Audit
    // ========================================================================

    pub fn audit_trail(&self) -> &AuditTrail {
        &self.audit_trail
    }

    pub fn audit_trail_mut(&mut self) -> &mut AuditTrail {
        &mut self.audit_trail
    }

    pub fn side_channel(&self) -> &SideChannel {
        &self.side_channel
    }

    pub fn side_channel_mut(&mut self) -> &mut SideChannel {
        &mut self.side_channel
    }

    /// Both audit carriers at once, for decorators that move data from the
    /// side channel into the trail
    pub fn audit_parts(&mut self) -> (&mut SideChannel, &mut AuditTrail) {
        (&mut self.side_channel, &mut self.audit_trail)
    }

    // ========================================================================
    // Authentication state
    // ========================================================================

    /// State owned by the auth context `owner`, created on first access
    ///
    /// A slot holding a different type is reset to `T::default()`.
    pub fn state<T>(&mut self, owner: ContextId) -> &mut T
    where
        T: Default + Send + 'static,
    {
        let slot = self
            .state
            .entry(owner)
            .or_insert_with(|| Box::new(T::default()));
        if !(**slot).is::<T>() {
            *slot = Box::new(T::default());
        }
        match (**slot).downcast_mut::<T>() {
            Some(state) => state,
            None => unreachable!("state slot was just set to {}", type_name::<T>()),
        }
    }

    /// State owned by `owner`, if it exists and has type `T`
    pub fn existing_state<T>(&self, owner: ContextId) -> Option<&T>
    where
        T: Send + 'static,
    {
        self.state
            .get(&owner)
            .and_then(|slot| (**slot).downcast_ref::<T>())
    }
}
