//! Account domain types.

use chrono::{DateTime, Utc};

use akf_core::{AddressId, Email, UserId};

/// A storefront account.
#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub email: Email,
    pub created_at: DateTime<Utc>,
}

/// Contact details kept alongside an account.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Profile {
    pub full_name: Option<String>,
    pub phone: Option<String>,
}

/// A delivery address saved to an account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedAddress {
    pub id: AddressId,
    pub user_id: UserId,
    pub label: String,
    pub full_name: String,
    pub phone: String,
    pub address_line1: String,
    pub address_line2: Option<String>,
    pub city: String,
    pub state: String,
    pub pincode: String,
    pub is_default: bool,
}

impl SavedAddress {
    /// Single-line form used to prefill checkout.
    ///
    /// Empty parts are skipped: `"12 MG Road, Hyderabad, Telangana, 500001"`.
    #[must_use]
    pub fn one_line(&self) -> String {
        [
            Some(self.address_line1.as_str()),
            self.address_line2.as_deref(),
            Some(self.city.as_str()),
            Some(self.state.as_str()),
            Some(self.pincode.as_str()),
        ]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
    }
}

/// Address fields submitted from the profile page.
#[derive(Debug, Clone)]
pub struct NewAddress {
    pub label: String,
    pub full_name: String,
    pub phone: String,
    pub address_line1: String,
    pub address_line2: Option<String>,
    pub city: String,
    pub state: String,
    pub pincode: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_line_skips_empty_parts() {
        let address = SavedAddress {
            id: AddressId::new(),
            user_id: UserId::new(),
            label: "Home".to_string(),
            full_name: "Meera Rao".to_string(),
            phone: "9876543210".to_string(),
            address_line1: "12 MG Road".to_string(),
            address_line2: Some(" ".to_string()),
            city: "Hyderabad".to_string(),
            state: "Telangana".to_string(),
            pincode: "500001".to_string(),
            is_default: true,
        };
        assert_eq!(address.one_line(), "12 MG Road, Hyderabad, Telangana, 500001");
    }
}
