pub mod api_types;
pub mod convert;
pub mod stream;
