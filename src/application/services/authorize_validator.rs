// src/application/services/authorize_validator.rs
use crate::{
    application::{
        error::{ApplicationError, ApplicationResult},
        ports::database::Database,
    },
    domain::{Client, scope},
};
use std::sync::Arc;
use tracing::debug;

const INVALID_REQUEST: &str = "invalid_request";
const INVALID_SCOPE: &str = "invalid_scope";

#[derive(Debug, Clone, Default)]
pub struct ValidateRequestInput {
    pub response_type: String,
    pub code_challenge_method: String,
    pub code_challenge: String,
    pub response_mode: String,
}

/// Shape and registry checks for `/authorize` requests.
pub struct AuthorizeValidator {
    database: Arc<dyn Database>,
}

impl AuthorizeValidator {
    pub fn new(database: Arc<dyn Database>) -> Self {
        Self { database }
    }

    pub fn validate_request(&self, input: &ValidateRequestInput) -> ApplicationResult<()> {
        if input.response_type != "code" {
            return Err(ApplicationError::detailed(
                INVALID_REQUEST,
                "Ensure response_type is set to 'code' as it's the only supported value.",
            ));
        }

        if input.code_challenge_method != "S256" {
            return Err(ApplicationError::detailed(
                INVALID_REQUEST,
                "PKCE is required. Ensure code_challenge_method is set to 'S256'.",
            ));
        }

        let challenge_len = input.code_challenge.chars().count();
        if !(43..=128).contains(&challenge_len) {
            return Err(ApplicationError::detailed(
                INVALID_REQUEST,
                "The code_challenge parameter is either missing or incorrect. It should be 43 to 128 characters long.",
            ));
        }

        if !matches!(
            input.response_mode.as_str(),
            "" | "query" | "fragment" | "form_post"
        ) {
            return Err(ApplicationError::detailed(
                INVALID_REQUEST,
                "Invalid response_mode parameter. Supported values are: query, fragment, form_post.",
            ));
        }

        Ok(())
    }

    /// Returns the client with its redirect URIs loaded.
    pub async fn validate_client_and_redirect_uri(
        &self,
        client_identifier: &str,
        redirect_uri: &str,
    ) -> ApplicationResult<Client> {
        if client_identifier.is_empty() {
            return Err(ApplicationError::detailed(
                INVALID_REQUEST,
                "The client_id parameter is missing.",
            ));
        }

        let mut client = self
            .database
            .get_client_by_client_identifier(client_identifier)
            .await?
            .ok_or_else(|| {
                ApplicationError::detailed(
                    INVALID_REQUEST,
                    "Invalid client_id parameter. The client does not exist.",
                )
            })?;

        if !client.enabled {
            return Err(ApplicationError::detailed(
                INVALID_REQUEST,
                "Invalid client_id parameter. The client is disabled.",
            ));
        }

        if !client.authorization_code_enabled {
            return Err(ApplicationError::detailed(
                INVALID_REQUEST,
                "Invalid client_id parameter. The client does not support the authorization code flow.",
            ));
        }

        if redirect_uri.is_empty() {
            return Err(ApplicationError::detailed(
                INVALID_REQUEST,
                "The redirect_uri parameter is missing.",
            ));
        }

        self.database.client_load_redirect_uris(&mut client).await?;
        if !client.has_redirect_uri(redirect_uri) {
            debug!(client_id = %client_identifier, "redirect uri not registered");
            return Err(ApplicationError::detailed(
                INVALID_REQUEST,
                "Invalid redirect_uri parameter. The client does not have this redirect URI registered.",
            ));
        }

        Ok(client)
    }

    pub async fn validate_scopes(&self, scope_str: &str) -> ApplicationResult<()> {
        let normalized = scope::normalize(scope_str);
        if normalized.is_empty() {
            return Err(ApplicationError::detailed_with_status(
                INVALID_SCOPE,
                "The 'scope' parameter is missing. Ensure to include one or more scopes.",
                400,
            ));
        }

        for requested in scope::split(&normalized) {
            if scope::is_oidc_scope(requested) || scope::is_offline_access_scope(requested) {
                continue;
            }

            if requested.eq_ignore_ascii_case(scope::USERINFO_SCOPE) {
                return Err(ApplicationError::detailed_with_status(
                    INVALID_SCOPE,
                    format!(
                        "The '{}' scope is automatically included in the access token when an OpenID Connect scope is present. There's no need to request it explicitly. Please remove it from your request.",
                        scope::USERINFO_SCOPE
                    ),
                    400,
                ));
            }

            let Some((resource_identifier, permission_identifier)) =
                scope::parse_resource_permission(requested)
            else {
                return Err(ApplicationError::detailed_with_status(
                    INVALID_SCOPE,
                    format!(
                        "Invalid scope format: '{requested}'. Scopes must adhere to the resource-identifier:permission-identifier format. For instance: backend-service:create-product."
                    ),
                    400,
                ));
            };

            let Some(resource) = self
                .database
                .get_resource_by_resource_identifier(resource_identifier)
                .await?
            else {
                return Err(ApplicationError::detailed_with_status(
                    INVALID_SCOPE,
                    format!(
                        "Invalid scope: '{requested}'. Could not find a resource with identifier '{resource_identifier}'."
                    ),
                    400,
                ));
            };

            let permissions = self
                .database
                .get_permissions_by_resource_id(resource.id)
                .await?;
            if !permissions
                .iter()
                .any(|p| p.permission_identifier == permission_identifier)
            {
                return Err(ApplicationError::detailed_with_status(
                    INVALID_SCOPE,
                    format!(
                        "Scope '{requested}' is invalid. The resource identified by '{resource_identifier}' does not have a permission with identifier '{permission_identifier}'."
                    ),
                    400,
                ));
            }
        }

        Ok(())
    }
}
