use k8s_openapi::apimachinery::pkg::runtime::RawExtension;

/// The AdmissionReview envelope sent by the API server.
/// Fields that are not listed here are ignored when decoding.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionReviewRequest {
    pub api_version: String,
    pub kind: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub request: Option<AdmissionRequest>,
}

/// This models the subset of admission/v1/AdmissionRequest consumed by the webhook.
/// See https://pkg.go.dev/k8s.io/kubernetes/pkg/apis/admission#AdmissionRequest
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionRequest {
    /// UID is an identifier for the individual request/response.
    /// Left empty when the API server doesn't provide one.
    #[serde(default)]
    pub uid: String,
    #[serde(default)]
    pub kind: GroupVersionKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default)]
    pub operation: String,
    /// The object under review, still in its raw form.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object: Option<RawExtension>,
}

#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct GroupVersionKind {
    #[serde(default)]
    pub group: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub kind: String,
}
