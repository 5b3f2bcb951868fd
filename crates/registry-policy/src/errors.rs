use thiserror::Error;

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("unsupported AdmissionReview apiVersion \"{api_version}\"")]
    UnsupportedApiVersion { api_version: String, kind: String },

    #[error("unsupported kind \"{kind}\", expected AdmissionReview")]
    UnsupportedKind { api_version: String, kind: String },
}

impl DecodeError {
    /// The `apiVersion` and `kind` of the envelope, when it could be parsed.
    pub fn type_meta(&self) -> Option<(&str, &str)> {
        match self {
            DecodeError::Json(_) => None,
            DecodeError::UnsupportedApiVersion { api_version, kind }
            | DecodeError::UnsupportedKind { api_version, kind } => {
                Some((api_version.as_str(), kind.as_str()))
            }
        }
    }
}

#[derive(Error, Debug)]
#[error(transparent)]
pub struct EncodeError(#[from] serde_json::Error);

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("no request found inside of the AdmissionReview")]
    MissingRequest,

    #[error("no object found inside of the AdmissionRequest")]
    MissingObject,

    #[error(transparent)]
    Pod(#[from] serde_json::Error),
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum WhitelistError {
    #[error("whitelist entry #{0} is empty, an empty prefix would match every image")]
    EmptyPrefix(usize),
}
