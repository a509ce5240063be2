use std::collections::BTreeSet;

const API_MOD_SOURCE: &str = include_str!("../src/api/mod.rs");

#[test]
fn rest_contract_declares_the_course_endpoint_matrix() {
    let expected_paths = [
        "/api/courses",
        "/api/courses/{course_id}/outline",
        "/api/courses/{course_id}/progress",
        "/api/shared/{share_key}",
    ];

    let mut missing = BTreeSet::new();
    for path in expected_paths {
        if !API_MOD_SOURCE.contains(path) {
            missing.insert(path);
        }
    }

    assert!(missing.is_empty(), "missing route declarations for: {missing:?}");
}

#[test]
fn rest_contract_declares_expected_http_method_bindings() {
    let expectations = [
        ("/api/courses", &["post(create_course)"][..]),
        (
            "/api/courses/{course_id}/outline",
            &["get(get_outline)", ".put(save_outline)"][..],
        ),
        ("/api/courses/{course_id}/progress", &["post(mark_progress)"][..]),
        ("/api/shared/{share_key}", &["get(get_shared_outline)"][..]),
    ];

    for (path, bindings) in expectations {
        assert!(API_MOD_SOURCE.contains(path), "route path `{path}` should be declared");
        for binding in bindings {
            assert!(
                API_MOD_SOURCE.contains(binding),
                "route `{path}` should bind `{binding}`"
            );
        }
    }
}
