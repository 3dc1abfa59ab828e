pub mod content;
pub mod parameter;
pub mod request;
pub mod response;
pub mod security;

pub use content::ContentValidator;
pub use parameter::{ParameterLocation, ParameterValidator, ParameterValues, ParametersValidator};
pub use request::RequestBodyValidator;
pub use response::{ResponseHeaderValidator, ResponseSpec, ResponseValidator, ValidatedResponse};
pub use security::{Credential, SchemeCheck, SecurityValidator};
