// src/domain/resource.rs

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    pub id: i64,
    pub resource_identifier: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Permission {
    pub id: i64,
    pub resource_id: i64,
    pub permission_identifier: String,
    pub description: String,
}
