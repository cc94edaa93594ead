//! End-to-end tests for registration, matching and the filter pipeline.

mod common;
use common::*;

use oxide_dispatch::{
    Dispatch, DispatchError, FilterSet, Flow, Router, RouteSpec, Verb, VerbSelector,
};
use serde_json::Value;

#[test]
fn exact_routes_get_only_defaults() {
    let router = Router::new();
    router
        .get("about", RouteSpec::callback(echo))
        .unwrap()
        .get("contact", RouteSpec::callback(echo).defaults(["email", "en"]))
        .unwrap();

    assert_eq!(payload(&router, "GET", "about"), Value::from(""));
    assert_eq!(payload(&router, "GET", "/contact/"), Value::from("email,en"));
}

#[test]
fn first_registered_pattern_wins() {
    let router = Router::new();
    router
        .get("(:any)", labelled("first"))
        .unwrap()
        .get("(:num)", labelled("second"))
        .unwrap();

    assert_eq!(payload(&router, "GET", "42"), Value::from("first"));
}

#[test]
fn registration_order_decides_across_specificity() {
    let router = Router::new();
    router
        .get("(:num)", labelled("num"))
        .unwrap()
        .get("(:any)", labelled("any"))
        .unwrap();

    assert_eq!(payload(&router, "GET", "42"), Value::from("num"));
    assert_eq!(payload(&router, "GET", "abc"), Value::from("any"));
}

#[test]
fn typed_segment_captures() {
    let router = Router::new();
    router.get("users/(:num)", RouteSpec::callback(echo)).unwrap();

    assert_eq!(payload(&router, "GET", "users/42"), Value::from("42"));
    assert_eq!(router.dispatch("GET", "users/abc").unwrap(), Dispatch::NotFound);
}

#[test]
fn optional_trailing_segment() {
    let router = Router::new();
    router
        .get("posts/(:any?)", RouteSpec::callback(echo).defaults(["index"]))
        .unwrap();

    assert_eq!(payload(&router, "GET", "posts"), Value::from("index"));
    assert_eq!(
        payload(&router, "GET", "posts/hello-world"),
        Value::from("hello-world")
    );
}

#[test]
fn star_registers_every_verb() {
    let router = Router::new();
    router
        .register(VerbSelector::All, "ping", labelled("pong"))
        .unwrap();

    for verb in Verb::ALL {
        assert_eq!(payload(&router, verb.as_str(), "ping"), Value::from("pong"));
    }
}

#[test]
fn star_follows_configured_verbs() {
    let config = oxide_dispatch::RouterConfig::from_json(r#"{"verbs": ["GET", "HEAD"]}"#).unwrap();
    let router = Router::with_config(config).unwrap();
    router.any("ping", labelled("pong")).unwrap();

    assert!(router.dispatch("HEAD", "ping").unwrap().is_dispatched());
    assert_eq!(router.dispatch("POST", "ping").unwrap(), Dispatch::NotFound);
}

#[test]
fn group_attributes_are_scoped() {
    let router = Router::new();
    router
        .group(RouteSpec::new().attribute("prefix_attr", "x"), |r| {
            r.get("inside", RouteSpec::callback(echo))?;
            r.get(
                "own",
                RouteSpec::callback(echo).attribute("prefix_attr", "mine"),
            )?;
            Ok(())
        })
        .unwrap();
    router.get("outside", RouteSpec::callback(echo)).unwrap();

    let attr = |path: &str| {
        router
            .resolve("GET", path)
            .unwrap()
            .route
            .attribute("prefix_attr")
            .cloned()
    };
    assert_eq!(attr("inside"), Some(Value::from("x")));
    assert_eq!(attr("own"), Some(Value::from("mine")));
    assert_eq!(attr("outside"), None);
}

#[test]
fn find_by_name_matches_whole_field_or_alias() {
    let router = Router::new();
    router
        .post("checkout", RouteSpec::target("cart@pay").name("checkout"))
        .unwrap()
        .get("cart", RouteSpec::target("cart@show").name("basket|cart"))
        .unwrap();

    assert_eq!(router.find_by_name("checkout").unwrap().pattern, "checkout");
    assert_eq!(router.find_by_name("cart").unwrap().pattern, "cart");
    assert_eq!(router.find_by_name("basket|cart").unwrap().pattern, "cart");
    assert!(router.find_by_name("wishlist").is_none());
}

#[test]
fn halting_before_filter_skips_handler_and_after() {
    let trace = Trace::new();
    let router = Router::new();
    router
        .get(
            "admin/(:num)",
            RouteSpec::callback(trace.handler("handler"))
                .after(trace.filter("route-after", Flow::Continue)),
        )
        .unwrap();
    router
        .add_filter(
            "admin/*",
            FilterSet::new()
                .before(trace.filter("guard", Flow::Halt))
                .after(trace.filter("after", Flow::Continue)),
        )
        .unwrap();

    assert_eq!(router.dispatch("GET", "admin/3").unwrap(), Dispatch::Halted);
    assert_eq!(trace.entries(), vec!["guard:3"]);
}

#[test]
fn callbacks_run_in_pipeline_order() {
    let trace = Trace::new();
    let router = Router::new();
    router
        .get(
            "blog/(:num?)",
            RouteSpec::callback(trace.handler("handler"))
                .defaults(["1"])
                .before(trace.filter("route-before", Flow::Continue))
                .after(trace.filter("route-after", Flow::Continue)),
        )
        .unwrap();
    router
        .add_filter(
            "blog/*",
            FilterSet::new()
                .before(trace.filter("before-1", Flow::Continue))
                .after(trace.filter("after-1", Flow::Continue)),
        )
        .unwrap()
        .add_filter(
            "blog/*",
            FilterSet::new()
                .before(trace.filter("before-2", Flow::Continue))
                .after(trace.filter("after-2", Flow::Continue)),
        )
        .unwrap();

    assert_eq!(payload(&router, "GET", "blog"), Value::from("handler"));
    assert_eq!(
        trace.entries(),
        vec![
            "route-before:1",
            "before-1:1",
            "before-2:1",
            "handler:1",
            "after-1:1",
            "after-2:1",
            "route-after:1",
        ]
    );
}

#[test]
fn filters_match_route_pattern_not_request_path() {
    let trace = Trace::new();
    let router = Router::new();
    router.get("users/(:num)", RouteSpec::callback(echo)).unwrap();
    router
        .add_filter(
            "users/(:num)",
            FilterSet::new().before(trace.filter("exact-pattern", Flow::Continue)),
        )
        .unwrap()
        .add_filter(
            "users/42",
            FilterSet::new().before(trace.filter("request-path", Flow::Continue)),
        )
        .unwrap();

    payload(&router, "GET", "users/42");
    assert_eq!(trace.entries(), vec!["exact-pattern:42"]);
}

#[test]
fn filter_failure_is_not_rolled_back() {
    let trace = Trace::new();
    let router = Router::new();
    router
        .get(
            "pay",
            RouteSpec::callback(trace.handler("handler"))
                .before(trace.filter("route-before", Flow::Continue)),
        )
        .unwrap();
    router
        .add_filter(
            "pay",
            FilterSet::new().before(|_: &[String]| Err("card declined".into())),
        )
        .unwrap();

    let err = router.dispatch("GET", "pay").unwrap_err();
    assert!(matches!(err, DispatchError::Handler { ref pattern, .. } if pattern == "pay"));
    assert_eq!(trace.entries(), vec!["route-before:"]);
}

#[test]
fn dispatch_is_idempotent() {
    let router = Router::new();
    router
        .get("items/(:num)/(:alpha?)", RouteSpec::callback(echo).defaults(["0", "all"]))
        .unwrap()
        .get("items", RouteSpec::callback(echo).name("items"))
        .unwrap();

    for path in ["items/7", "items/7/red", "items", "missing"] {
        let first = router.dispatch("GET", path).unwrap();
        let second = router.dispatch("GET", path).unwrap();
        assert_eq!(first, second, "dispatch of {path} changed between calls");
    }
    assert_eq!(payload(&router, "GET", "items/7"), Value::from("7,all"));
    assert_eq!(router.cached_lookups(), (0, 0));
}

#[test]
fn stale_name_cache_is_a_known_limitation() {
    let router = Router::new();
    router
        .post("save", RouteSpec::callback(echo).name("entry"))
        .unwrap();
    assert_eq!(router.find_by_name("entry").unwrap().pattern, "save");

    // GET would be scanned first, but the cached answer sticks.
    router
        .get("show", RouteSpec::callback(echo).name("entry"))
        .unwrap();
    assert_eq!(router.find_by_name("entry").unwrap().pattern, "save");

    router.invalidate_caches();
    assert_eq!(router.find_by_name("entry").unwrap().pattern, "show");
}

#[test]
fn duplicate_names_resolve_to_first_scanned_verb() {
    let router = Router::new();
    router
        .put("a", RouteSpec::callback(echo).name("dup"))
        .unwrap()
        .delete("b", RouteSpec::callback(echo).name("dup"))
        .unwrap();

    // DELETE precedes PUT in scan order, whatever the registration order.
    assert_eq!(router.find_by_name("dup").unwrap().route.verb(), Verb::Delete);
}

#[test]
fn reverse_lookup_by_handler() {
    let router = Router::new();
    router.get("profile/(:num)", "users@profile").unwrap();

    let found = router.find_by_handler("users@profile").unwrap();
    assert_eq!(found.pattern, "profile/(:num)");
    assert_eq!(router.url_for("users@profile", &["5"]).unwrap(), "/profile/5");
    assert!(router.find_by_handler("users@other").is_none());
}

#[test]
fn restful_targets_dispatch_by_verb() {
    let router = Router::new();
    router.mark_restful("posts");
    router.register_action("posts", "get_item", |p: &[String]| -> oxide_dispatch::HandlerResult {
        Ok(Some(Value::from(format!("read {}", p.join(",")))))
    });
    router.register_action("posts", "put_item", |p: &[String]| -> oxide_dispatch::HandlerResult {
        Ok(Some(Value::from(format!("write {}", p.join(",")))))
    });
    router
        .register([Verb::Get, Verb::Put], "posts/(:num)", "posts@item")
        .unwrap();

    assert_eq!(payload(&router, "GET", "posts/1"), Value::from("read 1"));
    assert_eq!(payload(&router, "PUT", "posts/1"), Value::from("write 1"));
}

#[test]
fn hyphenated_pattern_routes_answer_their_own_urls() {
    let router = Router::new();
    router
        .get("blog-posts", RouteSpec::callback(echo).defaults(["index"]))
        .unwrap()
        .get("blog-posts/(:any)", RouteSpec::callback(echo))
        .unwrap();

    assert_eq!(payload(&router, "GET", "blog-posts"), Value::from("index"));
    assert_eq!(
        payload(&router, "GET", "blog-posts/hello-world"),
        Value::from("hello-world")
    );
    assert_eq!(payload(&router, "GET", "blog_posts/5"), Value::from("5"));
}

#[test]
fn hyphenated_filter_patterns_reach_their_routes() {
    let trace = Trace::new();
    let router = Router::new();
    router
        .get("my-admin/(:num)", RouteSpec::callback(echo))
        .unwrap();
    router
        .add_filter(
            "my-admin/*",
            FilterSet::new().before(trace.filter("guard", Flow::Continue)),
        )
        .unwrap();

    assert_eq!(payload(&router, "GET", "my-admin/1"), Value::from("1"));
    assert_eq!(trace.entries(), vec!["guard:1"]);
}
