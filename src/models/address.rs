//! Postal address attached to a user.

use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::validation::Validator;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub id: i64,
    pub user_id: String,
    pub country: String,
    pub city: String,
    pub street: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateAddressRequest {
    pub country: String,
    pub city: String,
    pub street: String,
}

impl CreateAddressRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut v = Validator::new();
        v.text("country", &self.country, 30)
            .text("city", &self.city, 30)
            .text("street", &self.street, 30);
        v.finish()
    }
}
