pub mod api_response;
pub mod error;
pub mod model;
pub mod search;

pub use api_response::ApiResponse;
pub use error::{CoreError, Result};
pub use model::{Gender, Hospital, Patient, Staff};
pub use search::{SearchField, SearchFilters};
