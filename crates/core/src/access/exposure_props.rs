//! Property-based tests for exposure rewrites.

use chrono::{DateTime, Months, TimeDelta, TimeZone, Utc};
use futures::executor::block_on;
use proptest::prelude::*;

use super::credential::{AccountKey, ClientCredential};
use super::exposure::{Exposure, ExposurePolicy, canonical_url, rewrite_cdn, strip_container_name};
use crate::asset::Visibility;
use crate::storage::{AuthMode, StorageAccountConfig, fake_blob_client};

const ENDPOINT: &str = "https://acct.blob.core.windows.net";
const CDN: &str = "https://cdn.example.com";

fn key() -> AccountKey {
    AccountKey::from_base64("c2VjcmV0LWtleQ==").expect("valid base64")
}

fn assign(visibility: Visibility, issued_at: DateTime<Utc>) -> Exposure {
    let config = StorageAccountConfig::new(
        "acct",
        AuthMode::SharedKey {
            secret: key(),
            pre_signed_access_token: None,
        },
        "media",
    );
    let credential = ClientCredential::SharedKey {
        account: "acct".into(),
        key: key(),
    };
    block_on(ExposurePolicy::new(&config).assign(
        &fake_blob_client(ENDPOINT),
        &credential,
        "assets/h.png",
        visibility,
        issued_at,
    ))
    .expect("exposure")
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// CDN rewriting swaps the origin and leaves path and query alone.
    #[test]
    fn prop_cdn_rewrite_preserves_path_and_query(
        path in "(/[a-z0-9-]{1,12}){1,4}",
        query in "(\\?[a-z]{1,4}=[a-z0-9]{1,8})?",
    ) {
        let url = format!("{ENDPOINT}{path}{query}");
        let rewritten = rewrite_cdn(&url, ENDPOINT, Some(CDN));
        prop_assert_eq!(rewritten, format!("{CDN}{path}{query}"));
    }

    /// Without a CDN the URL is unchanged.
    #[test]
    fn prop_no_cdn_is_identity(path in "(/[a-z0-9-]{1,12}){1,4}") {
        let url = format!("{ENDPOINT}{path}");
        prop_assert_eq!(rewrite_cdn(&url, ENDPOINT, None), url);
    }

    /// Stripping removes exactly one `/{container}/` segment.
    #[test]
    fn prop_strip_removes_one_occurrence(
        container in "[a-z]{3,10}",
        repeats in 1usize..4,
    ) {
        let path = format!("/{container}").repeat(repeats);
        let url = format!("{CDN}{path}/x.png");
        let stripped = strip_container_name(&url, &container, true);
        let rest = format!("/{container}").repeat(repeats - 1);
        prop_assert_eq!(stripped, format!("{CDN}{rest}/x.png"));
    }

    /// The canonical URL never carries a query.
    #[test]
    fn prop_canonical_url_has_no_query(
        path in "(/[a-z0-9-]{1,12}){1,4}",
        query in "[a-z=&0-9%]{0,30}",
    ) {
        let url = format!("{ENDPOINT}{path}?{query}");
        let canonical = canonical_url(&url);
        prop_assert!(!canonical.contains('?'));
        prop_assert_eq!(canonical, format!("{ENDPOINT}{path}"));
    }

    /// Private URLs expire exactly one hour after issue and are unsigned.
    #[test]
    fn prop_private_exposure_lasts_one_hour(secs in 0i64..4_000_000_000) {
        let issued_at = Utc.timestamp_opt(secs, 0).single().expect("in range");
        let exposure = assign(Visibility::Private, issued_at);
        prop_assert_eq!(exposure.expires_at - issued_at, TimeDelta::hours(1));
        prop_assert!(!exposure.signed);
        prop_assert!(!exposure.url.contains('?'));
    }

    /// Public URLs expire 120 calendar months after issue and are signed.
    #[test]
    fn prop_public_exposure_lasts_ten_years(secs in 0i64..4_000_000_000) {
        let issued_at = Utc.timestamp_opt(secs, 0).single().expect("in range");
        let exposure = assign(Visibility::Public, issued_at);
        let expected = issued_at.checked_add_months(Months::new(120)).expect("in range");
        prop_assert_eq!(exposure.expires_at, expected);
        prop_assert!(exposure.expires_at - issued_at >= TimeDelta::days(3650));
        prop_assert!(exposure.signed);
        prop_assert!(exposure.url.contains("sp=r"));
    }
}
