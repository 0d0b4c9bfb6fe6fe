//! Tests for publishing the frontend card with both strategies.

use mbtalive_core::prelude::*;
use mbtalive_integration::assets::*;
use mbtalive_testing::{HostFixture, MockHost, TEST_BUNDLE};

// ========================================================================
// Static path strategy
// ========================================================================

#[tokio::test]
async fn test_static_path_registers_uncached_route_and_resource() {
    let fixture = HostFixture::new();
    let bundle = fixture.write_bundle();
    let host = fixture.host();

    let registrar = AssetRegistrar::for_strategy(AssetStrategy::StaticPath);
    let outcome = registrar.register_asset(&host, &bundle).await;

    assert_eq!(
        outcome,
        RegistrationOutcome::Published {
            publication: Publication::StaticPath {
                url: "/mbtalive/mbtalive-card-bundle.js".to_string(),
                declaration: Declaration::Added,
            }
        }
    );

    let paths = host.static_paths();
    assert_eq!(paths.len(), 1);
    assert_eq!(paths[0].url_path, "/mbtalive/mbtalive-card-bundle.js");
    assert_eq!(paths[0].file_path, bundle);
    assert!(!paths[0].cache_headers);

    assert_eq!(
        host.resources(),
        vec![UiResource::module("/mbtalive/mbtalive-card-bundle.js")]
    );
}

#[tokio::test]
async fn test_static_path_scenario_is_idempotent() {
    let fixture = HostFixture::new();
    let bundle = fixture.write_file(&fixture.config_dir().join("frontend/asset.js"), "x");
    let host = fixture.host();
    let registrar = AssetRegistrar::new(Box::new(StaticPathPublisher::new("domain")));

    for _ in 0..3 {
        assert!(registrar.register_asset(&host, &bundle).await.is_published());
    }

    let resources = host.resources();
    assert_eq!(resources.len(), 1);
    assert_eq!(resources[0].url, "/domain/asset.js");
    assert_eq!(resources[0].resource_type, ResourceType::Module);
    assert_eq!(host.static_paths().len(), 1);

    let last = registrar.try_register(&host, &bundle).await.unwrap();
    assert_eq!(
        last,
        Publication::StaticPath {
            url: "/domain/asset.js".to_string(),
            declaration: Declaration::AlreadyPresent,
        }
    );
}

#[tokio::test]
async fn test_existing_resources_are_kept() {
    let fixture = HostFixture::new();
    let bundle = fixture.write_bundle();
    let host = fixture.host();

    let list = host
        .data()
        .get_or_insert_with("lovelace", ResourceList::new)
        .unwrap();
    list.append_if_absent(UiResource::module("/hacsfiles/other-card.js"));

    AssetRegistrar::for_strategy(AssetStrategy::StaticPath)
        .register_asset(&host, &bundle)
        .await;

    let urls: Vec<String> = host.resources().into_iter().map(|r| r.url).collect();
    assert_eq!(
        urls,
        vec!["/hacsfiles/other-card.js", "/mbtalive/mbtalive-card-bundle.js"]
    );
}

#[tokio::test]
async fn test_unusable_resource_store_still_serves_card() {
    let fixture = HostFixture::new();
    let bundle = fixture.write_bundle();
    let host = fixture.host();
    host.data().insert("lovelace", "storage mode".to_string());

    let outcome = AssetRegistrar::for_strategy(AssetStrategy::StaticPath)
        .register_asset(&host, &bundle)
        .await;

    assert_eq!(
        outcome,
        RegistrationOutcome::Published {
            publication: Publication::StaticPath {
                url: "/mbtalive/mbtalive-card-bundle.js".to_string(),
                declaration: Declaration::Skipped,
            }
        }
    );
    assert_eq!(host.static_paths().len(), 1);
}

#[tokio::test]
async fn test_static_path_capability_missing() {
    let fixture = HostFixture::new();
    let bundle = fixture.write_bundle();

    for host in [
        fixture.host().without_http(),
        fixture.host().with_http_unsupported(),
    ] {
        let outcome = AssetRegistrar::for_strategy(AssetStrategy::StaticPath)
            .register_asset(&host, &bundle)
            .await;
        assert!(matches!(
            outcome,
            RegistrationOutcome::CapabilityUnavailable { .. }
        ));
        assert!(host.resources().is_empty());
    }
}

// ========================================================================
// Served directory strategy
// ========================================================================

#[tokio::test]
async fn test_served_directory_copies_and_declares() {
    let fixture = HostFixture::new();
    let bundle = fixture.write_bundle();
    let host = fixture.host();

    let registrar = AssetRegistrar::for_strategy(AssetStrategy::ServedDirectory);
    let outcome = registrar.register_asset(&host, &bundle).await;

    let destination = fixture.served_path("mbtalive-card-bundle.js");
    assert_eq!(
        outcome,
        RegistrationOutcome::Published {
            publication: Publication::ServedDirectory {
                url: "/local/mbtalive-card-bundle.js".to_string(),
                destination: destination.clone(),
            }
        }
    );
    assert_eq!(std::fs::read_to_string(&destination).unwrap(), TEST_BUNDLE);
    assert_eq!(host.extra_js_urls(), vec!["/local/mbtalive-card-bundle.js"]);
    assert!(host.static_paths().is_empty());
}

#[tokio::test]
async fn test_served_directory_overwrites_stale_copy() {
    let fixture = HostFixture::new();
    let bundle = fixture.write_bundle();
    let destination = fixture.served_path("mbtalive-card-bundle.js");
    fixture.write_file(&destination, "old card version");
    let host = fixture.host();

    let registrar = AssetRegistrar::for_strategy(AssetStrategy::ServedDirectory);
    for _ in 0..2 {
        assert!(registrar.register_asset(&host, &bundle).await.is_published());
        assert_eq!(std::fs::read_to_string(&destination).unwrap(), TEST_BUNDLE);
    }
    assert_eq!(host.extra_js_urls().len(), 1);
}

#[tokio::test]
async fn test_served_directory_bundle_already_in_place() {
    let fixture = HostFixture::new();
    let bundle = fixture.write_file(&fixture.served_path("mbtalive-card-bundle.js"), TEST_BUNDLE);
    let host = fixture.host();

    let outcome = AssetRegistrar::for_strategy(AssetStrategy::ServedDirectory)
        .register_asset(&host, &bundle)
        .await;

    assert!(outcome.is_published());
    assert_eq!(std::fs::read_to_string(&bundle).unwrap(), TEST_BUNDLE);
}

#[tokio::test]
async fn test_served_directory_capability_missing_touches_nothing() {
    let fixture = HostFixture::new();
    let bundle = fixture.write_bundle();
    let host = fixture.host().without_frontend();

    let outcome = AssetRegistrar::for_strategy(AssetStrategy::ServedDirectory)
        .register_asset(&host, &bundle)
        .await;

    assert!(matches!(
        outcome,
        RegistrationOutcome::CapabilityUnavailable { .. }
    ));
    assert!(!fixture.config_dir().join("www").exists());
}

#[tokio::test]
async fn test_served_directory_unsupported_frontend() {
    let fixture = HostFixture::new();
    let bundle = fixture.write_bundle();
    let host = fixture.host().with_frontend_unsupported();

    let outcome = AssetRegistrar::for_strategy(AssetStrategy::ServedDirectory)
        .register_asset(&host, &bundle)
        .await;

    assert!(matches!(
        outcome,
        RegistrationOutcome::CapabilityUnavailable { .. }
    ));
    assert!(host.extra_js_urls().is_empty());
}

// ========================================================================
// Failures
// ========================================================================

#[tokio::test]
async fn test_missing_bundle_is_reported_not_raised() {
    let fixture = HostFixture::new();
    let host = fixture.host();
    let bundle = fixture.bundle_path();

    for strategy in [AssetStrategy::StaticPath, AssetStrategy::ServedDirectory] {
        let outcome = AssetRegistrar::for_strategy(strategy)
            .register_asset(&host, &bundle)
            .await;
        assert_eq!(
            outcome,
            RegistrationOutcome::BundleMissing {
                path: bundle.clone()
            }
        );
    }

    assert!(host.resources().is_empty());
    assert!(host.extra_js_urls().is_empty());
    assert!(host.static_paths().is_empty());
}

#[tokio::test]
async fn test_conflicting_static_path_is_a_failure() {
    let fixture = HostFixture::new();
    let bundle = fixture.write_bundle();
    let other = fixture.write_file(
        &fixture.config_dir().join("elsewhere/mbtalive-card-bundle.js"),
        TEST_BUNDLE,
    );
    let host: MockHost = fixture.host();
    let registrar = AssetRegistrar::for_strategy(AssetStrategy::StaticPath);

    assert!(registrar.register_asset(&host, &bundle).await.is_published());

    let outcome = registrar.register_asset(&host, &other).await;
    assert!(matches!(outcome, RegistrationOutcome::Failed { .. }));
    assert_eq!(host.resources().len(), 1);
}
