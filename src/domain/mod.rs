pub mod user_email;
pub mod phone_number;
pub mod status;
pub mod pricing;
