use k8s_openapi::api::core::v1::Pod;
use std::collections::BTreeSet;

use crate::admission_request::AdmissionReviewRequest;
use crate::admission_response::AdmissionReviewResponse;
use crate::errors::{DecodeError, EncodeError, ExtractError};
use crate::workload::WorkloadSpec;

pub const ADMISSION_REVIEW_KIND: &str = "AdmissionReview";
pub const ADMISSION_REVIEW_API_VERSIONS: [&str; 2] =
    ["admission.k8s.io/v1", "admission.k8s.io/v1beta1"];

/// Translates AdmissionReview envelopes from and to their JSON encoding.
///
/// The set of accepted review types is fixed when the codec is built; the
/// codec is then shared, read-only, by all the in-flight requests.
#[derive(Clone, Debug)]
pub struct EnvelopeCodec {
    api_versions: BTreeSet<String>,
    kind: String,
}

impl Default for EnvelopeCodec {
    fn default() -> Self {
        EnvelopeCodec::new(ADMISSION_REVIEW_API_VERSIONS)
    }
}

impl EnvelopeCodec {
    pub fn new<I, S>(api_versions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        EnvelopeCodec {
            api_versions: api_versions.into_iter().map(Into::into).collect(),
            kind: ADMISSION_REVIEW_KIND.to_owned(),
        }
    }

    pub fn decode(&self, body: &[u8]) -> Result<AdmissionReviewRequest, DecodeError> {
        let review: AdmissionReviewRequest = serde_json::from_slice(body)?;

        if !self.api_versions.contains(&review.api_version) {
            return Err(DecodeError::UnsupportedApiVersion {
                api_version: review.api_version,
                kind: review.kind,
            });
        }
        if review.kind != self.kind {
            return Err(DecodeError::UnsupportedKind {
                api_version: review.api_version,
                kind: review.kind,
            });
        }

        Ok(review)
    }

    pub fn encode(&self, review: &AdmissionReviewResponse) -> Result<Vec<u8>, EncodeError> {
        Ok(serde_json::to_vec(review)?)
    }

    /// Decode the pod carried, in raw form, by the review.
    pub fn extract_workload(
        &self,
        review: &AdmissionReviewRequest,
    ) -> Result<WorkloadSpec, ExtractError> {
        let request = review.request.as_ref().ok_or(ExtractError::MissingRequest)?;
        let object = request.object.as_ref().ok_or(ExtractError::MissingObject)?;
        let pod: Pod = serde_json::from_value(object.0.clone())?;

        Ok(WorkloadSpec::from(pod))
    }
}
