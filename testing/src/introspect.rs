//! Route Table Introspector
//!
//! Flattens a component's layer stack into the lists that get snapshotted:
//! `(path, methods)` per route and one name per top-level layer. Both keep
//! registration order, since that order decides which handler matches first.

use trellis_core::{CharacterizeResult, Introspect, LayerInfo, LayerKind, RouteEntry};

/// Every route in the component, mount prefixes applied, in registration order.
///
/// Sub-routers are followed to any depth; middleware layers are skipped.
pub fn extract_routes<C: Introspect + ?Sized>(component: &C) -> CharacterizeResult<Vec<RouteEntry>> {
    let stack = validated_stack(component)?;
    let mut routes = Vec::new();
    collect_routes(&stack, "", &mut routes);
    tracing::debug!(routes = routes.len(), "Extracted route table");
    Ok(routes)
}

/// One name per top-level layer, `anonymous` for unnamed ones.
///
/// Route and router layers are listed alongside real middleware: the point is
/// to see the whole stack, not to filter it.
pub fn extract_middlewares<C: Introspect + ?Sized>(component: &C) -> CharacterizeResult<Vec<String>> {
    let stack = validated_stack(component)?;
    Ok(stack
        .iter()
        .map(|layer| layer.display_name().to_string())
        .collect())
}

fn validated_stack<C: Introspect + ?Sized>(component: &C) -> CharacterizeResult<Vec<LayerInfo>> {
    let stack = component.layer_stack()?;
    stack.iter().try_for_each(LayerInfo::validate)?;
    Ok(stack)
}

fn collect_routes(layers: &[LayerInfo], prefix: &str, out: &mut Vec<RouteEntry>) {
    for layer in layers {
        match &layer.kind {
            LayerKind::Route { path, methods } => {
                out.push(RouteEntry::new(format!("{prefix}{path}"), join_methods(methods)));
            }
            LayerKind::Router {
                prefix: mount,
                layers,
            } => collect_routes(layers, &format!("{prefix}{mount}"), out),
            LayerKind::Middleware => {}
        }
    }
}

/// Insertion-ordered, de-duplicated, lowercase, `", "`-joined.
fn join_methods(methods: &[String]) -> String {
    let mut seen: Vec<String> = Vec::with_capacity(methods.len());
    for method in methods {
        let method = method.trim().to_ascii_lowercase();
        if !seen.contains(&method) {
            seen.push(method);
        }
    }
    seen.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use trellis_core::CharacterizeError;

    fn route(path: &str, methods: &[&str]) -> LayerInfo {
        LayerInfo::route(Some("route".into()), path, methods.iter().copied())
    }

    fn product_routes() -> Vec<LayerInfo> {
        vec![
            route("/products", &["get"]),
            route("/product", &["post"]),
            route("/product", &["put"]),
        ]
    }

    #[test]
    fn test_direct_routes_keep_registration_order() {
        let routes = extract_routes(&product_routes()).unwrap();
        assert_eq!(
            routes,
            vec![
                RouteEntry::new("/products", "get"),
                RouteEntry::new("/product", "post"),
                RouteEntry::new("/product", "put"),
            ]
        );
    }

    #[test]
    fn test_mounted_routes_get_the_prefix() {
        let stack = vec![
            LayerInfo::middleware(Some("json_body".into())),
            LayerInfo::router(Some("router".into()), "/api", product_routes()),
        ];
        let routes = extract_routes(&stack).unwrap();
        let paths: Vec<_> = routes.iter().map(|r| r.path.as_str()).collect();
        assert_eq!(paths, vec!["/api/products", "/api/product", "/api/product"]);
        let methods: Vec<_> = routes.iter().map(|r| r.methods.as_str()).collect();
        assert_eq!(methods, vec!["get", "post", "put"]);
    }

    #[test]
    fn test_direct_plus_nested_counts_and_order() {
        let stack = vec![
            route("/", &["get"]),
            LayerInfo::router(None, "/api", product_routes()),
            route("/health", &["get", "head"]),
        ];
        let routes = extract_routes(&stack).unwrap();
        assert_eq!(routes.len(), 2 + 3);
        assert_eq!(routes[0], RouteEntry::new("/", "get"));
        assert_eq!(routes[1], RouteEntry::new("/api/products", "get"));
        assert_eq!(routes[4], RouteEntry::new("/health", "get, head"));
    }

    #[test]
    fn test_prefixes_accumulate_over_two_levels() {
        let stack = vec![LayerInfo::router(
            None,
            "",
            vec![
                LayerInfo::middleware(None),
                LayerInfo::router(
                    None,
                    "/api",
                    vec![LayerInfo::router(
                        None,
                        "/v1",
                        vec![route("/products", &["get"])],
                    )],
                ),
            ],
        )];
        let routes = extract_routes(&stack).unwrap();
        assert_eq!(routes, vec![RouteEntry::new("/api/v1/products", "get")]);
    }

    #[test]
    fn test_methods_are_deduplicated_in_insertion_order() {
        let stack = vec![route("/x", &["POST", "get", "post"])];
        let routes = extract_routes(&stack).unwrap();
        assert_eq!(routes[0].methods, "post, get");
    }

    #[test]
    fn test_middlewares_cover_every_top_level_layer() {
        let stack = vec![
            LayerInfo::middleware(Some("request_id".into())),
            LayerInfo::middleware(None),
            route("/", &["get"]),
            LayerInfo::router(Some("router".into()), "/api", product_routes()),
            LayerInfo::middleware(None),
        ];
        let names = extract_middlewares(&stack).unwrap();
        assert_eq!(
            names,
            vec!["request_id", "anonymous", "route", "router", "anonymous"]
        );
    }

    #[test]
    fn test_serialized_stack_is_introspectable() {
        let dumped = json!([
            { "name": "json_body", "kind": "middleware" },
            { "name": "router", "kind": "router", "prefix": "/api", "layers": [
                { "name": "route", "kind": "route", "path": "/products", "methods": ["get"] }
            ]}
        ]);
        assert_eq!(
            extract_routes(&dumped).unwrap(),
            vec![RouteEntry::new("/api/products", "get")]
        );
        assert_eq!(extract_middlewares(&dumped).unwrap(), vec!["json_body", "router"]);
    }

    #[test]
    fn test_wrong_shape_is_invalid_component() {
        let not_a_stack = json!({ "_router": { "stack": [] } });
        assert!(matches!(
            extract_routes(&not_a_stack),
            Err(CharacterizeError::InvalidComponent(_))
        ));

        let relative = vec![route("products", &["get"])];
        assert!(matches!(
            extract_middlewares(&relative),
            Err(CharacterizeError::InvalidComponent(_))
        ));
    }
}
