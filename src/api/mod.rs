pub mod mock;
pub mod rest;
pub mod traits;
pub mod types;

pub use mock::MockApi;
pub use rest::RestClient;
pub use traits::PropertyApi;
pub use types::{ImageFile, ImageUpload, LoginRequest};
