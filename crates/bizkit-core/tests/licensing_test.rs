//! License gate behaviour: priority order, grace boundary, feature checks,
//! structured denials.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use bizkit_core::config::LicensingConfig;
use bizkit_core::errors::{BizkitErrorCode, FeatureDenialDetails, GateError};
use bizkit_core::licensing::gate::DenialReason;
use bizkit_core::licensing::{
    AccessBasis, Feature, GateObserver, LicenseGate, LicensePayload, ModuleAccess, PlanCatalog,
};
use bizkit_core::ModuleManifest;
use chrono::{DateTime, Duration, Utc};

const GRACE_DAYS: u32 = 14;

fn installed_at() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2026-03-01T12:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

fn gate() -> LicenseGate {
    LicenseGate::new(GRACE_DAYS, PlanCatalog::builtin())
}

fn check_at(offset: Duration) -> ModuleAccess {
    gate().check_module(
        "billing",
        &ModuleManifest::new("billing"),
        &LicensePayload::unlicensed(),
        Some(installed_at()),
        installed_at() + offset,
    )
}

// ============================================================
// Grace boundary
// ============================================================

#[test]
fn grace_allows_one_day_before_deadline() {
    let access = check_at(Duration::days(i64::from(GRACE_DAYS) - 1));
    assert!(access.is_allowed());
    assert!(matches!(
        access,
        ModuleAccess::Allowed(AccessBasis::GracePeriod { days_remaining: 1, .. })
    ));
}

#[test]
fn grace_allows_exactly_at_deadline() {
    let access = check_at(Duration::days(i64::from(GRACE_DAYS)));
    assert!(matches!(
        access,
        ModuleAccess::Allowed(AccessBasis::GracePeriod { days_remaining: 0, .. })
    ));
}

#[test]
fn grace_denies_one_second_after_deadline() {
    let access = check_at(Duration::days(i64::from(GRACE_DAYS)) + Duration::seconds(1));
    assert_eq!(access, ModuleAccess::Denied(DenialReason::GraceExpired));
}

#[test]
fn grace_denies_one_day_after_deadline() {
    let access = check_at(Duration::days(i64::from(GRACE_DAYS) + 1));
    assert_eq!(access, ModuleAccess::Denied(DenialReason::GraceExpired));
}

#[test]
fn grace_window_follows_config() {
    let config = LicensingConfig {
        grace_period_days: 3,
        ..LicensingConfig::default()
    };
    let gate = LicenseGate::from_config(&config);
    let manifest = ModuleManifest::new("billing");
    let license = LicensePayload::unlicensed();
    assert!(gate.is_module_allowed(
        "billing",
        &manifest,
        &license,
        Some(installed_at()),
        installed_at() + Duration::days(3)
    ));
    assert!(!gate.is_module_allowed(
        "billing",
        &manifest,
        &license,
        Some(installed_at()),
        installed_at() + Duration::days(4)
    ));
}

// ============================================================
// Priority order
// ============================================================

#[test]
fn entitlement_outranks_expired_grace() {
    let late = installed_at() + Duration::days(365);
    let manifest = ModuleManifest::new("billing");

    let explicit = LicensePayload::unlicensed().with_modules(["billing"]);
    assert_eq!(
        gate().check_module("billing", &manifest, &explicit, Some(installed_at()), late),
        ModuleAccess::Allowed(AccessBasis::ExplicitLicense)
    );

    let plan = LicensePayload::unlicensed().with_plan("enterprise");
    assert_eq!(
        gate().check_module("billing", &manifest, &plan, Some(installed_at()), late),
        ModuleAccess::Allowed(AccessBasis::Plan("enterprise".to_string()))
    );
}

#[test]
fn always_active_outranks_everything_but_dev_mode() {
    let manifest = ModuleManifest::new("core").always_active();
    let access = gate().check_module(
        "core",
        &manifest,
        &LicensePayload::unlicensed(),
        None,
        installed_at(),
    );
    assert_eq!(access, ModuleAccess::Allowed(AccessBasis::AlwaysActive));

    let dev = gate().with_dev_mode(true);
    assert_eq!(
        dev.check_module("core", &manifest, &LicensePayload::unlicensed(), None, installed_at()),
        ModuleAccess::Allowed(AccessBasis::DevMode)
    );
}

#[test]
fn unknown_plan_grants_nothing() {
    let license = LicensePayload::unlicensed().with_plan("platinum");
    let access = gate().check_module(
        "scheduling",
        &ModuleManifest::new("scheduling"),
        &license,
        None,
        installed_at(),
    );
    assert_eq!(access, ModuleAccess::Denied(DenialReason::LicenseDenied));
}

// ============================================================
// Features
// ============================================================

struct CountingObserver {
    feature_checks: AtomicUsize,
}

impl GateObserver for CountingObserver {
    fn on_feature_check(&self, _feature: &Feature, _enabled: bool) {
        self.feature_checks.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn feature_check_is_deterministic() {
    let license = LicensePayload::unlicensed().with_features([Feature::SmsReminders]);
    let plain = gate();
    let observer = Arc::new(CountingObserver {
        feature_checks: AtomicUsize::new(0),
    });
    let observed = gate().with_observer(observer.clone());

    for feature in [Feature::SmsReminders, Feature::OnlinePayments] {
        let first = plain.is_feature_enabled(&feature, &license);
        let second = plain.is_feature_enabled(&feature, &license);
        let with_observer = observed.is_feature_enabled(&feature, &license);
        assert_eq!(first, second);
        assert_eq!(first, with_observer);
    }
    assert!(plain.is_feature_enabled(&Feature::SmsReminders, &license));
    assert!(!plain.is_feature_enabled(&Feature::OnlinePayments, &license));
    assert_eq!(observer.feature_checks.load(Ordering::SeqCst), 2);
}

#[test]
fn features_have_no_grace_window() {
    // A module still inside its grace window does not unlock features.
    let license = LicensePayload::unlicensed();
    assert!(gate().is_module_allowed(
        "marketing",
        &ModuleManifest::new("marketing"),
        &license,
        Some(installed_at()),
        installed_at()
    ));
    assert!(!gate().is_feature_enabled(&Feature::EmailCampaigns, &license));
}

#[test]
fn custom_features_match_by_key() {
    let license = LicensePayload::from_json(r#"{"key":"k","features":["Loyalty_Points"]}"#).unwrap();
    assert!(gate().is_feature_enabled(&Feature::parse("loyalty_points"), &license));
    assert!(!gate().is_feature_enabled(&Feature::parse("gift_cards"), &license));
}

#[test]
fn ensure_feature_returns_structured_denial() {
    let license = LicensePayload::unlicensed().with_features([Feature::SmsReminders]);
    let err = gate()
        .ensure_feature("billing", &Feature::OnlinePayments, &license)
        .unwrap_err();

    assert_eq!(err.error_code(), "FEATURE_NOT_AVAILABLE");
    assert_eq!(err.http_status(), 402);
    assert_eq!(
        err.details(),
        FeatureDenialDetails {
            module: "billing".to_string(),
            feature: Feature::OnlinePayments,
        }
    );
    assert_eq!(
        err,
        GateError::FeatureNotAvailable {
            module: "billing".to_string(),
            feature: Feature::OnlinePayments,
        }
    );

    let details = serde_json::to_value(err.details()).unwrap();
    assert_eq!(
        details,
        serde_json::json!({"module": "billing", "feature": "online_payments"})
    );
}

#[test]
fn ensure_feature_passes_when_licensed_or_dev_mode() {
    let license = LicensePayload::unlicensed().with_features([Feature::SmsReminders]);
    assert!(gate()
        .ensure_feature("notifications", &Feature::SmsReminders, &license)
        .is_ok());
    assert!(gate()
        .with_dev_mode(true)
        .ensure_feature("billing", &Feature::OnlinePayments, &LicensePayload::unlicensed())
        .is_ok());
}
