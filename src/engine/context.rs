//! Per-request context.
//!
//! # Responsibilities
//! - Own the request, the in-progress response and the request scope
//! - Carry routing results (endpoint + route parameters)
//! - Carry side data and the principal between middleware and handlers
//!
//! # Design Decisions
//! - Created fresh for every request and dropped after the response is sent
//! - Owned by the request task; middleware get `&mut Context`

use std::sync::Arc;

use uuid::Uuid;

use crate::di::ServiceProvider;
use crate::engine::data::DataContainer;
use crate::engine::endpoint::Endpoint;
use crate::engine::principal::Principal;
use crate::http::params::Params;
use crate::http::request::Request;
use crate::http::response::Response;
use crate::routing::Segment;

/// Result of routing: the matched endpoint and its route parameters.
#[derive(Debug, Default)]
pub struct RoutingData {
    endpoint: Option<Arc<Endpoint>>,
    params: Params,
}

impl RoutingData {
    pub fn endpoint(&self) -> Option<&Arc<Endpoint>> {
        self.endpoint.as_ref()
    }

    /// Route parameters by name, taken from the percent-decoded path.
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Record the matched endpoint and extract parameter values from the
    /// decoded `path`.
    pub fn set_endpoint(&mut self, endpoint: Arc<Endpoint>, path: &str) {
        let values = path.strip_prefix('/').unwrap_or(path).split('/');
        self.params = endpoint
            .template()
            .segments()
            .iter()
            .zip(values)
            .filter_map(|(segment, value)| match segment {
                Segment::Param { name, .. } => Some((name.clone(), value.to_string())),
                Segment::Literal(_) => None,
            })
            .collect();
        self.endpoint = Some(endpoint);
    }

    pub fn clear(&mut self) {
        self.endpoint = None;
        self.params = Params::new();
    }
}

pub struct Context {
    request: Request,
    response: Response,
    services: ServiceProvider,
    routing: RoutingData,
    data: DataContainer,
    principal: Principal,
    trace_id: String,
}

impl Context {
    /// Build a context around `request`, served by the request scope `services`.
    pub fn new(request: Request, services: ServiceProvider) -> Self {
        let trace_id = request
            .request_id()
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        Self {
            request,
            response: Response::new(),
            services,
            routing: RoutingData::default(),
            data: DataContainer::new(),
            principal: Principal::default(),
            trace_id,
        }
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn request_mut(&mut self) -> &mut Request {
        &mut self.request
    }

    pub fn response(&self) -> &Response {
        &self.response
    }

    pub fn response_mut(&mut self) -> &mut Response {
        &mut self.response
    }

    /// Request-scoped service provider.
    pub fn services(&self) -> &ServiceProvider {
        &self.services
    }

    pub fn routing(&self) -> &RoutingData {
        &self.routing
    }

    pub fn routing_mut(&mut self) -> &mut RoutingData {
        &mut self.routing
    }

    pub fn data(&self) -> &DataContainer {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut DataContainer {
        &mut self.data
    }

    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    pub fn set_principal(&mut self, principal: Principal) {
        self.principal = principal;
    }

    pub fn trace_id(&self) -> &str {
        &self.trace_id
    }

    pub(crate) fn into_response(self) -> Response {
        self.response
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("method", self.request.method())
            .field("path", &self.request.path())
            .field("trace_id", &self.trace_id)
            .field("status", &self.response.status())
            .finish()
    }
}
