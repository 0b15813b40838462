// src/domain/user.rs
use crate::domain::resource::Permission;
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::{Map, Value};

/// Key/value pair that can be projected into tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub id: i64,
    pub key: String,
    pub value: String,
    pub include_in_id_token: bool,
    pub include_in_access_token: bool,
}

impl Attribute {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            id: 0,
            key: key.into(),
            value: value.into(),
            include_in_id_token: true,
            include_in_access_token: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Group {
    pub id: i64,
    pub group_identifier: String,
    pub description: String,
    pub include_in_id_token: bool,
    pub include_in_access_token: bool,
    pub attributes: Vec<Attribute>,
    pub permissions: Vec<Permission>,
}

impl Group {
    pub fn new(group_identifier: impl Into<String>) -> Self {
        Self {
            id: 0,
            group_identifier: group_identifier.into(),
            description: String::new(),
            include_in_id_token: true,
            include_in_access_token: true,
            attributes: Vec::new(),
            permissions: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub subject: String,
    pub enabled: bool,
    pub username: String,
    pub email: String,
    pub email_verified: bool,
    pub given_name: String,
    pub middle_name: String,
    pub family_name: String,
    pub nickname: String,
    pub website: String,
    pub gender: String,
    pub birth_date: Option<NaiveDate>,
    pub zone_info: String,
    pub locale: String,
    pub phone_number_country_calling_code: String,
    pub phone_number: String,
    pub phone_number_verified: bool,
    pub address_line1: String,
    pub address_line2: String,
    pub address_locality: String,
    pub address_region: String,
    pub address_postal_code: String,
    pub address_country: String,
    pub updated_at: DateTime<Utc>,
    pub groups: Vec<Group>,
    pub attributes: Vec<Attribute>,
    pub permissions: Vec<Permission>,
}

impl User {
    pub fn new(subject: impl Into<String>, email: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: 0,
            subject: subject.into(),
            enabled: true,
            username: String::new(),
            email: email.into(),
            email_verified: false,
            given_name: String::new(),
            middle_name: String::new(),
            family_name: String::new(),
            nickname: String::new(),
            website: String::new(),
            gender: String::new(),
            birth_date: None,
            zone_info: String::new(),
            locale: String::new(),
            phone_number_country_calling_code: String::new(),
            phone_number: String::new(),
            phone_number_verified: false,
            address_line1: String::new(),
            address_line2: String::new(),
            address_locality: String::new(),
            address_region: String::new(),
            address_postal_code: String::new(),
            address_country: String::new(),
            updated_at: now,
            groups: Vec::new(),
            attributes: Vec::new(),
            permissions: Vec::new(),
        }
    }

    pub fn full_name(&self) -> String {
        [
            self.given_name.as_str(),
            self.middle_name.as_str(),
            self.family_name.as_str(),
        ]
        .iter()
        .filter(|part| !part.trim().is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
    }

    pub fn has_address(&self) -> bool {
        [
            &self.address_line1,
            &self.address_line2,
            &self.address_locality,
            &self.address_region,
            &self.address_postal_code,
            &self.address_country,
        ]
        .iter()
        .any(|part| !part.trim().is_empty())
    }

    /// OIDC `address` claim (Core §5.1.1).
    pub fn address_claim(&self) -> Map<String, Value> {
        let street = [self.address_line1.trim(), self.address_line2.trim()]
            .iter()
            .filter(|line| !line.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join("\r\n");

        let formatted = [
            street.as_str(),
            self.address_locality.trim(),
            self.address_region.trim(),
            self.address_postal_code.trim(),
            self.address_country.trim(),
        ]
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("\r\n");

        let mut claim = Map::new();
        let mut put = |key: &str, value: &str| {
            if !value.is_empty() {
                claim.insert(key.to_string(), Value::String(value.to_string()));
            }
        };
        put("formatted", &formatted);
        put("street_address", &street);
        put("locality", self.address_locality.trim());
        put("region", self.address_region.trim());
        put("postal_code", self.address_postal_code.trim());
        put("country", self.address_country.trim());
        claim
    }

    pub fn formatted_phone_number(&self) -> String {
        let number = self.phone_number.trim();
        if number.is_empty() {
            return String::new();
        }
        let code = self.phone_number_country_calling_code.trim();
        if code.is_empty() {
            number.to_string()
        } else {
            format!("{code} {number}")
        }
    }
}
