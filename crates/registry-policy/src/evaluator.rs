use tracing::debug;

use crate::whitelist::RegistryWhitelist;
use crate::workload::WorkloadSpec;

pub const CODE_ALLOWED: u16 = 200;
pub const CODE_BAD_REQUEST: u16 = 400;
pub const CODE_FORBIDDEN: u16 = 403;
pub const CODE_INTERNAL_SERVER_ERROR: u16 = 500;

/// The verdict computed for a single review.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Decision {
    pub allowed: bool,
    pub code: u16,
    /// Empty when the request is allowed.
    pub message: String,
}

impl Decision {
    pub fn allow() -> Decision {
        Decision {
            allowed: true,
            code: CODE_ALLOWED,
            message: String::new(),
        }
    }

    pub fn reject(code: u16, message: String) -> Decision {
        Decision {
            allowed: false,
            code,
            message,
        }
    }

    /// The review could not be decoded: the fault is in the protocol, not in the pod.
    pub fn internal_error(message: String) -> Decision {
        Decision::reject(CODE_INTERNAL_SERVER_ERROR, message)
    }

    pub fn bad_request(message: String) -> Decision {
        Decision::reject(CODE_BAD_REQUEST, message)
    }

    pub fn forbidden(message: String) -> Decision {
        Decision::reject(CODE_FORBIDDEN, message)
    }
}

/// Check every container image of `workload` against `whitelist`.
///
/// Containers are visited in order and the first image that doesn't start
/// with a whitelisted prefix rejects the whole workload. A workload without
/// containers is allowed.
pub fn evaluate(workload: &WorkloadSpec, whitelist: &RegistryWhitelist) -> Decision {
    match workload
        .containers
        .iter()
        .find(|container| !whitelist.allows(&container.image))
    {
        Some(container) => {
            debug!(
                container = container.name.as_str(),
                image = container.image.as_str(),
                "image not covered by the registry whitelist"
            );
            Decision::forbidden(format!(
                "{} image comes from untrusted registry! Only images from {whitelist} are allowed.",
                container.image
            ))
        }
        None => Decision::allow(),
    }
}
