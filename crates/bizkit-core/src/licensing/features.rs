//! Gated features.
//!
//! The stable feature set is a closed enum so call sites are checked at
//! compile time. Keys only a specific deployment knows about go through
//! `Feature::Custom`.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Feature {
    OnlineBooking,
    SmsReminders,
    EmailCampaigns,
    InvoiceExport,
    OnlinePayments,
    MultiLocation,
    AdvancedReports,
    ApiAccess,
    CustomBranding,
    InventoryTracking,
    /// Deployment-specific feature key.
    Custom(String),
}

impl Feature {
    /// All known (non-custom) features.
    pub const KNOWN: [Feature; 10] = [
        Self::OnlineBooking,
        Self::SmsReminders,
        Self::EmailCampaigns,
        Self::InvoiceExport,
        Self::OnlinePayments,
        Self::MultiLocation,
        Self::AdvancedReports,
        Self::ApiAccess,
        Self::CustomBranding,
        Self::InventoryTracking,
    ];

    /// Feature key as used in license payloads and manifests.
    pub fn as_str(&self) -> &str {
        match self {
            Self::OnlineBooking => "online_booking",
            Self::SmsReminders => "sms_reminders",
            Self::EmailCampaigns => "email_campaigns",
            Self::InvoiceExport => "invoice_export",
            Self::OnlinePayments => "online_payments",
            Self::MultiLocation => "multi_location",
            Self::AdvancedReports => "advanced_reports",
            Self::ApiAccess => "api_access",
            Self::CustomBranding => "custom_branding",
            Self::InventoryTracking => "inventory_tracking",
            Self::Custom(key) => key,
        }
    }

    /// Parse a feature key. Unknown keys become `Custom`; keys are trimmed and
    /// lowercased so `"SMS_Reminders"` and `"sms_reminders"` are the same feature.
    pub fn parse(s: &str) -> Self {
        let key = s.trim().to_ascii_lowercase();
        match key.as_str() {
            "online_booking" => Self::OnlineBooking,
            "sms_reminders" => Self::SmsReminders,
            "email_campaigns" => Self::EmailCampaigns,
            "invoice_export" => Self::InvoiceExport,
            "online_payments" => Self::OnlinePayments,
            "multi_location" => Self::MultiLocation,
            "advanced_reports" => Self::AdvancedReports,
            "api_access" => Self::ApiAccess,
            "custom_branding" => Self::CustomBranding,
            "inventory_tracking" => Self::InventoryTracking,
            _ => Self::Custom(key),
        }
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, Self::Custom(_))
    }

    /// Human-readable description for upgrade messages.
    pub fn description(&self) -> &str {
        match self {
            Self::OnlineBooking => "Customer self-service online booking",
            Self::SmsReminders => "Appointment reminders by SMS",
            Self::EmailCampaigns => "Marketing email campaigns",
            Self::InvoiceExport => "Invoice export to accounting software",
            Self::OnlinePayments => "Online card payments",
            Self::MultiLocation => "Multiple business locations",
            Self::AdvancedReports => "Advanced reporting and analytics",
            Self::ApiAccess => "Public API access",
            Self::CustomBranding => "Custom branding on customer-facing pages",
            Self::InventoryTracking => "Stock and inventory tracking",
            Self::Custom(key) => key,
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Feature {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

impl Serialize for Feature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Feature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Self::parse(&s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_features_roundtrip_through_str() {
        for feature in &Feature::KNOWN {
            assert_eq!(&Feature::parse(feature.as_str()), feature);
            assert!(!feature.is_custom());
            assert!(!feature.description().is_empty());
        }
    }

    #[test]
    fn unknown_key_is_custom() {
        let f = Feature::parse("  Loyalty_Points ");
        assert_eq!(f, Feature::Custom("loyalty_points".to_string()));
        assert_eq!(f.as_str(), "loyalty_points");
    }

    #[test]
    fn serde_uses_plain_strings() {
        let json = serde_json::to_string(&vec![Feature::SmsReminders, Feature::parse("x_y")]).unwrap();
        assert_eq!(json, r#"["sms_reminders","x_y"]"#);
        let back: Vec<Feature> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, vec![Feature::SmsReminders, Feature::Custom("x_y".to_string())]);
    }
}
