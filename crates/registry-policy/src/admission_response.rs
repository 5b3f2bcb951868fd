use serde::{Deserialize, Serialize};

use crate::evaluator::Decision;

/// The AdmissionReview envelope returned to the API server.
///
/// `apiVersion` and `kind` mirror the ones of the inbound review. They are
/// omitted when the inbound review could not be decoded.
#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Eq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionReviewResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<AdmissionResponse>,
}

impl AdmissionReviewResponse {
    pub fn new(
        api_version: Option<String>,
        kind: Option<String>,
        response: Option<AdmissionResponse>,
    ) -> Self {
        AdmissionReviewResponse {
            api_version,
            kind,
            response,
        }
    }
}

/// This models the admission/v1/AdmissionResponse object of Kubernetes
/// See https://pkg.go.dev/k8s.io/kubernetes/pkg/apis/admission#AdmissionResponse
#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Eq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionResponse {
    /// UID is an identifier for the individual request/response.
    /// This must be copied over from the corresponding AdmissionRequest.
    pub uid: String,

    /// Allowed indicates whether or not the admission request was permitted.
    pub allowed: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<AdmissionResponseStatus>,
}

#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Eq, Clone)]
pub struct AdmissionResponseStatus {
    /// A human-readable description of the status of this operation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Suggested HTTP return code for this status
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<u16>,
}

impl AdmissionResponse {
    /// Build the response carrying `decision`. The uid is left empty when
    /// there's no decoded request to copy it from.
    pub fn from_decision(uid: Option<&str>, decision: Decision) -> AdmissionResponse {
        let message = if decision.message.is_empty() {
            None
        } else {
            Some(decision.message)
        };

        AdmissionResponse {
            uid: uid.unwrap_or_default().to_owned(),
            allowed: decision.allowed,
            status: Some(AdmissionResponseStatus {
                message,
                code: Some(decision.code),
            }),
        }
    }
}
