use axum::http::StatusCode;
use registry_policy::{
    admission_request::{AdmissionRequest, AdmissionReviewRequest},
    admission_response::{AdmissionResponse, AdmissionReviewResponse},
    codec::EnvelopeCodec,
    errors::EncodeError,
    evaluator::{Decision, evaluate},
    whitelist::RegistryWhitelist,
};
use thiserror::Error;
use tracing::{Span, debug, warn};

pub const JSON_CONTENT_TYPE: &str = "application/json";

/// What to run on the reviews received on a given path.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Pipeline {
    /// Apply the registry whitelist to the pod under review.
    Validate,
    /// Reserved, nothing is evaluated and no decision is returned.
    Mutate,
}

/// Maps request paths to review pipelines.
#[derive(Clone, Debug)]
pub struct RouteTable {
    routes: Vec<(String, Pipeline)>,
}

impl Default for RouteTable {
    fn default() -> Self {
        RouteTable::new([("/validate", Pipeline::Validate), ("/mutate", Pipeline::Mutate)])
    }
}

impl RouteTable {
    pub fn new<I, S>(routes: I) -> Self
    where
        I: IntoIterator<Item = (S, Pipeline)>,
        S: Into<String>,
    {
        RouteTable {
            routes: routes
                .into_iter()
                .map(|(path, pipeline)| (path.into(), pipeline))
                .collect(),
        }
    }

    pub fn pipeline(&self, path: &str) -> Option<Pipeline> {
        self.routes
            .iter()
            .find(|(route, _)| route == path)
            .map(|(_, pipeline)| *pipeline)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Pipeline)> {
        self.routes
            .iter()
            .map(|(path, pipeline)| (path.as_str(), *pipeline))
    }
}

/// Failures that prevent an AdmissionReview from being written back.
#[derive(Error, Debug)]
pub enum HandlerError {
    #[error("empty data body")]
    EmptyBody,

    #[error("Content-Type invalid, expect application/json")]
    InvalidContentType,

    #[error("no review pipeline registered for path {0}")]
    UnknownPath(String),

    #[error("Can't encode response: {0}")]
    Encode(#[from] EncodeError),
}

impl HandlerError {
    pub fn status(&self) -> StatusCode {
        match self {
            HandlerError::UnknownPath(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

/// Turns the raw body of an admission request into the raw body of the reply.
pub struct ReviewHandler {
    codec: EnvelopeCodec,
    whitelist: RegistryWhitelist,
    routes: RouteTable,
}

impl ReviewHandler {
    pub fn new(codec: EnvelopeCodec, whitelist: RegistryWhitelist, routes: RouteTable) -> Self {
        ReviewHandler {
            codec,
            whitelist,
            routes,
        }
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    pub fn whitelist(&self) -> &RegistryWhitelist {
        &self.whitelist
    }

    /// Check the transport preconditions, run the pipeline bound to `path` and
    /// encode the resulting AdmissionReview.
    pub fn handle(
        &self,
        path: &str,
        content_type: Option<&str>,
        body: &[u8],
    ) -> Result<Vec<u8>, HandlerError> {
        if body.is_empty() {
            warn!("empty data body");
            return Err(HandlerError::EmptyBody);
        }
        if content_type != Some(JSON_CONTENT_TYPE) {
            warn!(
                content_type = content_type.unwrap_or_default(),
                "Content-Type invalid, expect application/json"
            );
            return Err(HandlerError::InvalidContentType);
        }
        let pipeline = self
            .routes
            .pipeline(path)
            .ok_or_else(|| HandlerError::UnknownPath(path.to_owned()))?;

        let review = self.review(pipeline, body);
        debug!(response = ?review.response, "sending response");

        self.codec.encode(&review).map_err(|e| {
            warn!(error = %e, "cannot encode response");
            HandlerError::from(e)
        })
    }

    /// Build the reply envelope. This never fails: problems with the inbound
    /// review are reported through the decision carried by the reply.
    pub fn review(&self, pipeline: Pipeline, body: &[u8]) -> AdmissionReviewResponse {
        let review = match self.codec.decode(body) {
            Ok(review) => review,
            Err(e) => {
                warn!(error = %e, "cannot decode AdmissionReview");
                let response = AdmissionResponse::from_decision(
                    None,
                    Decision::internal_error(e.to_string()),
                );
                populate_span_with_decision(&response);
                let (api_version, kind) = match e.type_meta() {
                    Some((api_version, kind)) => {
                        (Some(api_version.to_owned()), Some(kind.to_owned()))
                    }
                    None => (None, None),
                };
                return AdmissionReviewResponse::new(api_version, kind, Some(response));
            }
        };
        if let Some(request) = &review.request {
            populate_span_with_admission_request_data(request);
        }

        let decision = match pipeline {
            Pipeline::Validate => Some(self.validate(&review)),
            Pipeline::Mutate => None,
        };
        let uid = review.request.as_ref().map(|request| request.uid.as_str());
        let response = decision.map(|decision| AdmissionResponse::from_decision(uid, decision));
        if let Some(response) = &response {
            populate_span_with_decision(response);
        }

        AdmissionReviewResponse::new(Some(review.api_version), Some(review.kind), response)
    }

    fn validate(&self, review: &AdmissionReviewRequest) -> Decision {
        match self.codec.extract_workload(review) {
            Ok(workload) => evaluate(&workload, &self.whitelist),
            Err(e) => {
                warn!(error = %e, "cannot unmarshal object raw");
                Decision::bad_request(e.to_string())
            }
        }
    }
}

fn populate_span_with_admission_request_data(adm_req: &AdmissionRequest) {
    Span::current().record("request_uid", adm_req.uid.as_str());
    Span::current().record("kind", adm_req.kind.kind.as_str());
    Span::current().record("name", adm_req.name.clone().unwrap_or_default().as_str());
    Span::current().record(
        "namespace",
        adm_req.namespace.clone().unwrap_or_default().as_str(),
    );
    Span::current().record("operation", adm_req.operation.as_str());
}

fn populate_span_with_decision(response: &AdmissionResponse) {
    Span::current().record("allowed", response.allowed);
    if let Some(status) = &response.status {
        if let Some(code) = &status.code {
            Span::current().record("response_code", code);
        }
        if let Some(message) = &status.message {
            Span::current().record("response_message", message.as_str());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn handler() -> ReviewHandler {
        ReviewHandler::new(
            EnvelopeCodec::default(),
            RegistryWhitelist::new(["docker.io/library/", "gcr.io/myorg/"]).unwrap(),
            RouteTable::default(),
        )
    }

    fn pod_review(uid: &str, images: &[&str]) -> Vec<u8> {
        let containers: Vec<_> = images
            .iter()
            .enumerate()
            .map(|(i, image)| json!({"name": format!("c{i}"), "image": image}))
            .collect();

        serde_json::to_vec(&json!({
            "apiVersion": "admission.k8s.io/v1",
            "kind": "AdmissionReview",
            "request": {
                "uid": uid,
                "kind": {"group": "", "version": "v1", "kind": "Pod"},
                "namespace": "default",
                "operation": "CREATE",
                "object": {
                    "apiVersion": "v1",
                    "kind": "Pod",
                    "metadata": {"name": "test"},
                    "spec": {"containers": containers}
                }
            }
        }))
        .unwrap()
    }

    fn decode(payload: &[u8]) -> AdmissionReviewResponse {
        serde_json::from_slice(payload).expect("the reply should be an AdmissionReview")
    }

    #[test]
    fn route_table_lookup() {
        let routes = RouteTable::default();

        assert_eq!(routes.pipeline("/validate"), Some(Pipeline::Validate));
        assert_eq!(routes.pipeline("/mutate"), Some(Pipeline::Mutate));
        assert_eq!(routes.pipeline("/validate/"), None);
        assert_eq!(routes.pipeline("/"), None);
    }

    #[rstest]
    #[case::allowed(&["gcr.io/myorg/app:v2"], true, 200)]
    #[case::denied(&["docker.io/library/nginx:1.21", "evil.com/malware:latest"], false, 403)]
    #[case::no_containers(&[], true, 200)]
    fn validate(#[case] images: &[&str], #[case] allowed: bool, #[case] code: u16) {
        let payload = handler()
            .handle(
                "/validate",
                Some(JSON_CONTENT_TYPE),
                &pod_review("uid-42", images),
            )
            .unwrap();

        let review = decode(&payload);
        let response = review.response.expect("a decision should be returned");
        assert_eq!(review.api_version.as_deref(), Some("admission.k8s.io/v1"));
        assert_eq!(review.kind.as_deref(), Some("AdmissionReview"));
        assert_eq!(response.uid, "uid-42");
        assert_eq!(response.allowed, allowed);
        assert_eq!(response.status.and_then(|s| s.code), Some(code));
    }

    #[test]
    fn mutate_returns_envelope_without_decision() {
        let payload = handler()
            .handle(
                "/mutate",
                Some(JSON_CONTENT_TYPE),
                &pod_review("uid-1", &["evil.com/malware:latest"]),
            )
            .unwrap();

        let review = decode(&payload);
        assert_eq!(review.api_version.as_deref(), Some("admission.k8s.io/v1"));
        assert!(review.response.is_none());
    }

    #[test]
    fn malformed_review_is_an_internal_error() {
        let payload = handler()
            .handle("/validate", Some(JSON_CONTENT_TYPE), b"{not json")
            .unwrap();

        let review = decode(&payload);
        let response = review.response.unwrap();
        let status = response.status.unwrap();
        assert!(review.api_version.is_none());
        assert!(!response.allowed);
        assert_eq!(response.uid, "");
        assert_eq!(status.code, Some(500));
        assert!(status.message.unwrap().contains("key must be a string"));
    }

    #[test]
    fn malformed_pod_is_a_bad_request() {
        let body = serde_json::to_vec(&json!({
            "apiVersion": "admission.k8s.io/v1",
            "kind": "AdmissionReview",
            "request": {
                "uid": "uid-7",
                "object": {"spec": {"containers": 3}}
            }
        }))
        .unwrap();

        let review = decode(
            &handler()
                .handle("/validate", Some(JSON_CONTENT_TYPE), &body)
                .unwrap(),
        );

        let response = review.response.unwrap();
        assert_eq!(response.uid, "uid-7");
        assert!(!response.allowed);
        assert_eq!(response.status.and_then(|s| s.code), Some(400));
    }

    #[test]
    fn request_without_object_is_a_bad_request() {
        let body = serde_json::to_vec(&json!({
            "apiVersion": "admission.k8s.io/v1",
            "kind": "AdmissionReview",
            "request": {"uid": "uid-8", "operation": "CREATE"}
        }))
        .unwrap();

        let review = decode(
            &handler()
                .handle("/validate", Some(JSON_CONTENT_TYPE), &body)
                .unwrap(),
        );

        let response = review.response.unwrap();
        let status = response.status.unwrap();
        assert_eq!(response.uid, "uid-8");
        assert!(!response.allowed);
        assert_eq!(status.code, Some(400));
        assert_eq!(
            status.message.as_deref(),
            Some("no object found inside of the AdmissionRequest")
        );
    }

    #[test]
    fn malformed_review_on_mutate_is_an_internal_error() {
        let payload = handler()
            .handle("/mutate", Some(JSON_CONTENT_TYPE), b"{not json")
            .unwrap();

        let response = decode(&payload).response.expect("a decision should be returned");
        assert!(!response.allowed);
        assert_eq!(response.status.and_then(|s| s.code), Some(500));
    }

    #[test]
    fn unsupported_review_type_is_mirrored() {
        let body = serde_json::to_vec(&json!({
            "apiVersion": "admission.k8s.io/v2",
            "kind": "AdmissionReview",
            "request": {"uid": "uid-9"}
        }))
        .unwrap();

        let review = decode(
            &handler()
                .handle("/validate", Some(JSON_CONTENT_TYPE), &body)
                .unwrap(),
        );

        assert_eq!(review.api_version.as_deref(), Some("admission.k8s.io/v2"));
        assert_eq!(review.kind.as_deref(), Some("AdmissionReview"));
        let response = review.response.unwrap();
        assert!(!response.allowed);
        assert_eq!(response.status.and_then(|s| s.code), Some(500));
    }

    #[rstest]
    #[case::empty_body("/validate", Some(JSON_CONTENT_TYPE), b"".as_slice(), StatusCode::BAD_REQUEST)]
    #[case::text_plain("/validate", Some("text/plain"), b"{}".as_slice(), StatusCode::BAD_REQUEST)]
    #[case::charset_suffix(
        "/validate",
        Some("application/json; charset=utf-8"),
        b"{}".as_slice(),
        StatusCode::BAD_REQUEST
    )]
    #[case::no_content_type("/validate", None, b"{}".as_slice(), StatusCode::BAD_REQUEST)]
    #[case::unknown_path("/other", Some(JSON_CONTENT_TYPE), b"{}".as_slice(), StatusCode::NOT_FOUND)]
    fn transport_failures(
        #[case] path: &str,
        #[case] content_type: Option<&str>,
        #[case] body: &[u8],
        #[case] status: StatusCode,
    ) {
        let err = handler().handle(path, content_type, body).unwrap_err();

        assert_eq!(err.status(), status);
    }
}
