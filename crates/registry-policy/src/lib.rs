extern crate k8s_openapi;

pub mod admission_request;
pub mod admission_response;
pub mod codec;
pub mod errors;
pub mod evaluator;
pub mod whitelist;
pub mod workload;
