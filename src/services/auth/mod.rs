pub mod factory;
pub mod id_token;
pub mod introspection;
pub mod upstream;
pub mod verification;

#[cfg(test)]
pub mod test_support;

pub use factory::build_verification_service;
pub use upstream::UpstreamError;
pub use verification::{TokenStatus, TokenVerificationRequest, TokenVerificationService};
