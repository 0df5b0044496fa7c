//! Closed string enumerations exchanged with App Store Connect.
//!
//! Each enum parses totally: known wire names map to their variant, anything else is kept
//! verbatim in `Unrecognized` so server values are never lost. Caller input goes through
//! [`known`](CertificateType::known) instead, which rejects unrecognized names.

macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $($variant:ident => $wire:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant,)+
            Unrecognized(String),
        }

        impl $name {
            /// Wire names of every known variant, in declaration order.
            pub const NAMES: &'static [&'static str] = &[$($wire),+];

            pub fn parse(value: &str) -> Self {
                match value {
                    $($wire => Self::$variant,)+
                    other => Self::Unrecognized(other.to_owned()),
                }
            }

            /// Case-sensitive match against the known names only.
            pub fn known(value: &str) -> Option<Self> {
                match Self::parse(value) {
                    Self::Unrecognized(_) => None,
                    known => Some(known),
                }
            }

            pub fn as_str(&self) -> &str {
                match self {
                    $(Self::$variant => $wire,)+
                    Self::Unrecognized(other) => other,
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let value = String::deserialize(deserializer)?;
                Ok(Self::parse(&value))
            }
        }
    };
}

wire_enum! {
    /// Lifecycle state of an uploaded build.
    ProcessingState {
        Processing => "PROCESSING",
        Failed => "FAILED",
        Invalid => "INVALID",
        Valid => "VALID",
    }
}

wire_enum! {
    CertificateType {
        IosDevelopment => "IOS_DEVELOPMENT",
        IosDistribution => "IOS_DISTRIBUTION",
        MacAppDistribution => "MAC_APP_DISTRIBUTION",
        MacInstallerDistribution => "MAC_INSTALLER_DISTRIBUTION",
        MacAppDevelopment => "MAC_APP_DEVELOPMENT",
        DeveloperIdKext => "DEVELOPER_ID_KEXT",
        DeveloperIdKextG2 => "DEVELOPER_ID_KEXT_G2",
        DeveloperIdApplication => "DEVELOPER_ID_APPLICATION",
        DeveloperIdApplicationG2 => "DEVELOPER_ID_APPLICATION_G2",
        Development => "DEVELOPMENT",
        Distribution => "DISTRIBUTION",
        PassTypeId => "PASS_TYPE_ID",
        PassTypeIdWithNfc => "PASS_TYPE_ID_WITH_NFC",
    }
}

wire_enum! {
    BundleIdPlatform {
        Ios => "IOS",
        MacOs => "MAC_OS",
        Universal => "UNIVERSAL",
    }
}

wire_enum! {
    ProfileType {
        IosAppDevelopment => "IOS_APP_DEVELOPMENT",
        IosAppStore => "IOS_APP_STORE",
        IosAppAdhoc => "IOS_APP_ADHOC",
        IosAppInhouse => "IOS_APP_INHOUSE",
        MacAppDevelopment => "MAC_APP_DEVELOPMENT",
        MacAppStore => "MAC_APP_STORE",
        MacAppDirect => "MAC_APP_DIRECT",
        TvosAppDevelopment => "TVOS_APP_DEVELOPMENT",
        TvosAppStore => "TVOS_APP_STORE",
        TvosAppAdhoc => "TVOS_APP_ADHOC",
    }
}

impl ProfileType {
    /// Development and ad hoc profiles are bound to registered devices.
    pub fn requires_devices(&self) -> bool {
        matches!(
            self,
            Self::IosAppDevelopment
                | Self::IosAppAdhoc
                | Self::MacAppDevelopment
                | Self::TvosAppDevelopment
                | Self::TvosAppAdhoc
        )
    }
}

wire_enum! {
    CapabilityType {
        Icloud => "ICLOUD",
        InAppPurchase => "IN_APP_PURCHASE",
        GameCenter => "GAME_CENTER",
        PushNotifications => "PUSH_NOTIFICATIONS",
        Wallet => "WALLET",
        InterAppAudio => "INTER_APP_AUDIO",
        Maps => "MAPS",
        AssociatedDomains => "ASSOCIATED_DOMAINS",
        PersonalVpn => "PERSONAL_VPN",
        AppGroups => "APP_GROUPS",
        Healthkit => "HEALTHKIT",
        Homekit => "HOMEKIT",
        WirelessAccessoryConfiguration => "WIRELESS_ACCESSORY_CONFIGURATION",
        ApplePay => "APPLE_PAY",
        DataProtection => "DATA_PROTECTION",
        Sirikit => "SIRIKIT",
        NetworkExtensions => "NETWORK_EXTENSIONS",
        Multipath => "MULTIPATH",
        HotSpot => "HOT_SPOT",
        NfcTagReading => "NFC_TAG_READING",
        Classkit => "CLASSKIT",
        AutofillCredentialProvider => "AUTOFILL_CREDENTIAL_PROVIDER",
        AccessWifiInformation => "ACCESS_WIFI_INFORMATION",
        NetworkCustomProtocol => "NETWORK_CUSTOM_PROTOCOL",
        CoremediaHlsLowLatency => "COREMEDIA_HLS_LOW_LATENCY",
        SystemExtensionInstall => "SYSTEM_EXTENSION_INSTALL",
        UserManagement => "USER_MANAGEMENT",
        AppleIdAuth => "APPLE_ID_AUTH",
    }
}
