mod verify_params;

pub use verify_params::VerifyForm;
