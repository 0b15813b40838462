use authserver_core::{
    application::services::authorize_validator::ValidateRequestInput,
    domain::Client,
};

mod support;

fn valid_input() -> ValidateRequestInput {
    ValidateRequestInput {
        response_type: "code".into(),
        code_challenge_method: "S256".into(),
        code_challenge: "a".repeat(43),
        response_mode: String::new(),
    }
}

#[tokio::test]
async fn well_formed_request_passes() {
    let world = support::world();
    let validator = &world.services.authorize_validator;

    validator.validate_request(&valid_input()).expect("valid");
    for mode in ["query", "fragment", "form_post"] {
        let input = ValidateRequestInput {
            response_mode: mode.into(),
            ..valid_input()
        };
        validator.validate_request(&input).expect(mode);
    }
}

#[tokio::test]
async fn malformed_requests_are_invalid_request() {
    let world = support::world();
    let validator = &world.services.authorize_validator;

    let cases = [
        ValidateRequestInput {
            response_type: "token".into(),
            ..valid_input()
        },
        ValidateRequestInput {
            code_challenge_method: "plain".into(),
            ..valid_input()
        },
        ValidateRequestInput {
            code_challenge: "a".repeat(42),
            ..valid_input()
        },
        ValidateRequestInput {
            code_challenge: "a".repeat(129),
            ..valid_input()
        },
        ValidateRequestInput {
            response_mode: "web_message".into(),
            ..valid_input()
        },
    ];

    for input in cases {
        let err = validator.validate_request(&input).expect_err("rejected");
        let detail = err.detail().expect("oauth error");
        assert_eq!(detail.code, "invalid_request", "{input:?}");
    }
}

#[tokio::test]
async fn challenge_length_bounds_are_inclusive() {
    let world = support::world();
    let validator = &world.services.authorize_validator;

    for len in [43, 128] {
        let input = ValidateRequestInput {
            code_challenge: "x".repeat(len),
            ..valid_input()
        };
        validator.validate_request(&input).expect("within bounds");
    }
}

#[tokio::test]
async fn registered_client_and_redirect_uri_are_accepted() {
    let world = support::world();
    let client = world
        .services
        .authorize_validator
        .validate_client_and_redirect_uri(support::CLIENT_ID, support::REDIRECT_URI)
        .await
        .expect("valid client");

    assert_eq!(client.id, world.client.id);
    assert!(client.has_redirect_uri(support::REDIRECT_URI));
}

#[tokio::test]
async fn client_problems_name_the_failing_parameter() {
    let world = support::world();

    let mut disabled = Client::new("disabled-client");
    disabled.enabled = false;
    world.db.insert_client(disabled).expect("insert");

    let mut no_code_flow = Client::new("m2m-client");
    no_code_flow.authorization_code_enabled = false;
    no_code_flow.client_credentials_enabled = true;
    world.db.insert_client(no_code_flow).expect("insert");

    let cases = [
        ("", support::REDIRECT_URI, "The client_id parameter is missing."),
        (
            "nobody",
            support::REDIRECT_URI,
            "Invalid client_id parameter. The client does not exist.",
        ),
        (
            "disabled-client",
            support::REDIRECT_URI,
            "Invalid client_id parameter. The client is disabled.",
        ),
        (
            "m2m-client",
            support::REDIRECT_URI,
            "Invalid client_id parameter. The client does not support the authorization code flow.",
        ),
        (support::CLIENT_ID, "", "The redirect_uri parameter is missing."),
        (
            support::CLIENT_ID,
            "https://evil.example.com/callback",
            "Invalid redirect_uri parameter. The client does not have this redirect URI registered.",
        ),
    ];

    for (client_id, redirect_uri, message) in cases {
        let err = world
            .services
            .authorize_validator
            .validate_client_and_redirect_uri(client_id, redirect_uri)
            .await
            .expect_err("rejected");
        let detail = err.detail().expect("oauth error");
        assert_eq!(detail.code, "invalid_request");
        assert_eq!(detail.description, message);
    }
}

#[tokio::test]
async fn known_scopes_validate() {
    let world = support::world();
    world
        .services
        .authorize_validator
        .validate_scopes("openid profile email offline_access backend:read backend:write")
        .await
        .expect("valid scopes");
}

#[tokio::test]
async fn bad_scopes_are_invalid_scope() {
    let world = support::world();

    let cases = [
        ("", "The 'scope' parameter is missing"),
        ("   ", "The 'scope' parameter is missing"),
        ("openid authserver:userinfo", "There's no need to request it explicitly"),
        ("backend", "Invalid scope format: 'backend'"),
        ("backend:read:extra", "Invalid scope format"),
        (
            "payments:read",
            "Could not find a resource with identifier 'payments'",
        ),
        (
            "backend:delete",
            "does not have a permission with identifier 'delete'",
        ),
    ];

    for (scope_str, fragment) in cases {
        let err = world
            .services
            .authorize_validator
            .validate_scopes(scope_str)
            .await
            .expect_err(scope_str);
        let detail = err.detail().expect("oauth error");
        assert_eq!(detail.code, "invalid_scope");
        assert_eq!(detail.http_status, Some(400));
        assert!(
            detail.description.contains(fragment),
            "{scope_str:?}: {}",
            detail.description
        );
    }
}
