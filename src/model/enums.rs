//! Enumerations whose value sets grew across specification versions.

use super::capability::VersionedEnum;
use super::SpecVersion;

/// Error returned when parsing an enumeration value that is not defined.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} value '{value}'")]
pub struct UnknownEnumValue {
    pub kind: &'static str,
    pub value: String,
}

/// Declares a wire-string enumeration with the version each value appeared in.
macro_rules! cdx_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $wire:literal @ $since:ident, )+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        $vis enum $name {
            $( $(#[$vmeta])* $variant, )+
        }

        impl $name {
            /// Every value, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Wire representation shared by every format.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $( $name::$variant => $wire, )+
                }
            }

            /// Version that introduced this value.
            #[must_use]
            pub const fn introduced_in(self) -> SpecVersion {
                match self {
                    $( $name::$variant => SpecVersion::$since, )+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = UnknownEnumValue;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $( $wire => Ok($name::$variant), )+
                    other => Err(UnknownEnumValue {
                        kind: stringify!($name),
                        value: other.to_string(),
                    }),
                }
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                raw.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

cdx_enum! {
    /// Classification of a component.
    #[derive(Default)]
    pub enum ComponentType {
        Application => "application" @ V1_0,
        Framework => "framework" @ V1_0,
        #[default]
        Library => "library" @ V1_0,
        OperatingSystem => "operating-system" @ V1_0,
        Device => "device" @ V1_0,
        File => "file" @ V1_0,
        Container => "container" @ V1_2,
        Firmware => "firmware" @ V1_2,
        Platform => "platform" @ V1_5,
        DeviceDriver => "device-driver" @ V1_5,
        MachineLearningModel => "machine-learning-model" @ V1_5,
        Data => "data" @ V1_5,
        CryptographicAsset => "cryptographic-asset" @ V1_6,
    }
}

impl VersionedEnum for ComponentType {
    fn since(&self) -> SpecVersion {
        self.introduced_in()
    }

    fn fallback(&self) -> Option<Self> {
        Some(Self::Library)
    }
}

cdx_enum! {
    /// Whether a component is required at runtime.
    pub enum ComponentScope {
        Required => "required" @ V1_0,
        Optional => "optional" @ V1_0,
        Excluded => "excluded" @ V1_1,
    }
}

impl VersionedEnum for ComponentScope {
    fn since(&self) -> SpecVersion {
        self.introduced_in()
    }

    fn fallback(&self) -> Option<Self> {
        None
    }
}

cdx_enum! {
    /// Hash algorithms.
    pub enum HashAlgorithm {
        Md5 => "MD5" @ V1_0,
        Sha1 => "SHA-1" @ V1_0,
        Sha256 => "SHA-256" @ V1_0,
        Sha384 => "SHA-384" @ V1_0,
        Sha512 => "SHA-512" @ V1_0,
        Sha3_256 => "SHA3-256" @ V1_0,
        Sha3_512 => "SHA3-512" @ V1_0,
        Sha3_384 => "SHA3-384" @ V1_1,
        Blake2b256 => "BLAKE2b-256" @ V1_1,
        Blake2b384 => "BLAKE2b-384" @ V1_1,
        Blake2b512 => "BLAKE2b-512" @ V1_1,
        Blake3 => "BLAKE3" @ V1_1,
    }
}

impl VersionedEnum for HashAlgorithm {
    fn since(&self) -> SpecVersion {
        self.introduced_in()
    }

    fn fallback(&self) -> Option<Self> {
        None
    }
}

cdx_enum! {
    /// Kind of an external reference.
    pub enum ExternalReferenceType {
        Vcs => "vcs" @ V1_0,
        IssueTracker => "issue-tracker" @ V1_0,
        Website => "website" @ V1_0,
        Advisories => "advisories" @ V1_0,
        Bom => "bom" @ V1_0,
        MailingList => "mailing-list" @ V1_0,
        Social => "social" @ V1_0,
        Chat => "chat" @ V1_0,
        Documentation => "documentation" @ V1_0,
        Support => "support" @ V1_0,
        Distribution => "distribution" @ V1_0,
        License => "license" @ V1_0,
        BuildMeta => "build-meta" @ V1_0,
        BuildSystem => "build-system" @ V1_0,
        Other => "other" @ V1_0,
        ReleaseNotes => "release-notes" @ V1_4,
        DistributionIntake => "distribution-intake" @ V1_5,
        SecurityContact => "security-contact" @ V1_5,
        ModelCard => "model-card" @ V1_5,
        Log => "log" @ V1_5,
        Configuration => "configuration" @ V1_5,
        Evidence => "evidence" @ V1_5,
        Formulation => "formulation" @ V1_5,
        Attestation => "attestation" @ V1_5,
        ThreatModel => "threat-model" @ V1_5,
        AdversaryModel => "adversary-model" @ V1_5,
        RiskAssessment => "risk-assessment" @ V1_5,
        VulnerabilityAssertion => "vulnerability-assertion" @ V1_5,
        ExploitabilityStatement => "exploitability-statement" @ V1_5,
        PentestReport => "pentest-report" @ V1_5,
        StaticAnalysisReport => "static-analysis-report" @ V1_5,
        DynamicAnalysisReport => "dynamic-analysis-report" @ V1_5,
        RuntimeAnalysisReport => "runtime-analysis-report" @ V1_5,
        ComponentAnalysisReport => "component-analysis-report" @ V1_5,
        MaturityReport => "maturity-report" @ V1_5,
        CertificationReport => "certification-report" @ V1_5,
        CodifiedInfrastructure => "codified-infrastructure" @ V1_5,
        QualityMetrics => "quality-metrics" @ V1_5,
        Poam => "poam" @ V1_5,
        SourceDistribution => "source-distribution" @ V1_6,
        ElectronicSignature => "electronic-signature" @ V1_6,
        DigitalSignature => "digital-signature" @ V1_6,
        Rfc9116 => "rfc-9116" @ V1_6,
    }
}

impl VersionedEnum for ExternalReferenceType {
    fn since(&self) -> SpecVersion {
        self.introduced_in()
    }

    fn fallback(&self) -> Option<Self> {
        Some(Self::Other)
    }
}

cdx_enum! {
    /// Completeness claim of a composition.
    pub enum Aggregate {
        Complete => "complete" @ V1_3,
        Incomplete => "incomplete" @ V1_3,
        IncompleteFirstPartyOnly => "incomplete_first_party_only" @ V1_3,
        IncompleteThirdPartyOnly => "incomplete_third_party_only" @ V1_3,
        Unknown => "unknown" @ V1_3,
        NotSpecified => "not_specified" @ V1_3,
        IncompleteFirstPartyProprietaryOnly => "incomplete_first_party_proprietary_only" @ V1_5,
        IncompleteFirstPartyOpensourceOnly => "incomplete_first_party_opensource_only" @ V1_5,
        IncompleteThirdPartyProprietaryOnly => "incomplete_third_party_proprietary_only" @ V1_5,
        IncompleteThirdPartyOpensourceOnly => "incomplete_third_party_opensource_only" @ V1_5,
    }
}

impl VersionedEnum for Aggregate {
    fn since(&self) -> SpecVersion {
        self.introduced_in()
    }

    fn fallback(&self) -> Option<Self> {
        match self {
            Self::IncompleteFirstPartyProprietaryOnly | Self::IncompleteFirstPartyOpensourceOnly => {
                Some(Self::IncompleteFirstPartyOnly)
            }
            Self::IncompleteThirdPartyProprietaryOnly | Self::IncompleteThirdPartyOpensourceOnly => {
                Some(Self::IncompleteThirdPartyOnly)
            }
            _ => Some(Self::Incomplete),
        }
    }
}

cdx_enum! {
    /// Vulnerability rating methodology.
    pub enum ScoreMethod {
        CvssV2 => "CVSSv2" @ V1_4,
        CvssV3 => "CVSSv3" @ V1_4,
        CvssV31 => "CVSSv31" @ V1_4,
        Owasp => "OWASP" @ V1_4,
        Other => "other" @ V1_4,
        CvssV4 => "CVSSv4" @ V1_5,
        Ssvc => "SSVC" @ V1_5,
    }
}

impl VersionedEnum for ScoreMethod {
    fn since(&self) -> SpecVersion {
        self.introduced_in()
    }

    fn fallback(&self) -> Option<Self> {
        Some(Self::Other)
    }
}

cdx_enum! {
    /// Identity field an evidence entry speaks about.
    pub enum EvidenceField {
        Group => "group" @ V1_5,
        Name => "name" @ V1_5,
        Version => "version" @ V1_5,
        Purl => "purl" @ V1_5,
        Cpe => "cpe" @ V1_5,
        Swid => "swid" @ V1_5,
        Hash => "hash" @ V1_5,
        OmniborId => "omniborId" @ V1_6,
        Swhid => "swhid" @ V1_6,
    }
}

impl VersionedEnum for EvidenceField {
    fn since(&self) -> SpecVersion {
        self.introduced_in()
    }

    fn fallback(&self) -> Option<Self> {
        None
    }
}

cdx_enum! {
    /// Direction of a service data flow.
    pub enum DataFlowDirection {
        Inbound => "inbound" @ V1_2,
        Outbound => "outbound" @ V1_2,
        BiDirectional => "bi-directional" @ V1_2,
        Unknown => "unknown" @ V1_2,
    }
}
