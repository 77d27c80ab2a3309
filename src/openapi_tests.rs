#[cfg(test)]
mod tests {
    use crate::schemas::ApiDoc;
    use utoipa::openapi::{PathItemType, RefOr, schema::Schema};
    use utoipa::OpenApi;

    fn object_properties(name: &str) -> Vec<String> {
        let openapi = ApiDoc::openapi();
        let components = openapi.components.unwrap();
        match components.schemas.get(name) {
            Some(RefOr::T(Schema::Object(obj))) => obj.properties.keys().cloned().collect(),
            _ => panic!("{} should be an object schema", name),
        }
    }

    #[test]
    fn test_openapi_schema_generation() {
        let openapi = ApiDoc::openapi();

        assert!(openapi.components.is_some());
        let components = openapi.components.as_ref().unwrap();
        for schema in ["ErrorResponse", "HealthResponse", "UserResponse", "FollowState"] {
            assert!(components.schemas.contains_key(schema), "missing {}", schema);
        }

        let json_result = serde_json::to_string(&openapi);
        assert!(json_result.is_ok());
    }

    #[test]
    fn test_error_response_schema_structure() {
        let properties = object_properties("ErrorResponse");
        assert!(properties.contains(&"error".to_string()));
        assert!(properties.contains(&"code".to_string()));
        assert!(properties.contains(&"success".to_string()));
    }

    #[test]
    fn test_sign_up_response_schema_structure() {
        let properties = object_properties("SignUpResponse");
        assert!(properties.contains(&"user".to_string()));
        assert!(properties.contains(&"default_account_created".to_string()));
        assert!(properties.contains(&"access_token".to_string()));
    }

    #[test]
    fn test_openapi_paths_are_registered() {
        let openapi = ApiDoc::openapi();
        let paths = &openapi.paths.paths;

        let expected = [
            ("/health", PathItemType::Get),
            ("/api/v1/users/sign-up", PathItemType::Post),
            ("/api/v1/users/sign-in", PathItemType::Post),
            ("/api/v1/users/me", PathItemType::Delete),
            ("/api/v1/users/me/images/{image_id}", PathItemType::Get),
            ("/api/v1/follows/followers/{follow_id}/approve", PathItemType::Put),
            ("/api/v1/accounts/{account_id}/import", PathItemType::Post),
            ("/api/v1/budgets/{budget_id}", PathItemType::Delete),
        ];
        for (path, method) in expected {
            let item = paths
                .get(path)
                .unwrap_or_else(|| panic!("missing path {}", path));
            assert!(item.operations.contains_key(&method), "missing operation on {}", path);
        }
    }

    #[test]
    fn test_protected_operations_declare_bearer_auth() {
        let openapi = ApiDoc::openapi();
        let components = openapi.components.as_ref().unwrap();
        assert!(components.security_schemes.contains_key("bearer_auth"));

        let me = openapi.paths.paths.get("/api/v1/users/me").unwrap();
        let get_me = me.operations.get(&PathItemType::Get).unwrap();
        assert!(get_me.security.is_some());

        let sign_in = openapi.paths.paths.get("/api/v1/users/sign-in").unwrap();
        let post = sign_in.operations.get(&PathItemType::Post).unwrap();
        assert!(post.security.is_none());
    }

    #[test]
    fn test_all_error_responses_reference_correct_schema() {
        let openapi_json = serde_json::to_string(&ApiDoc::openapi()).unwrap();

        assert!(!openapi_json.contains("crate.schemas.ErrorResponse"));
        assert!(!openapi_json.contains("crate::schemas::ErrorResponse"));
        assert!(openapi_json.contains("#/components/schemas/ErrorResponse"));
    }
}
