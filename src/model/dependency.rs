//! Dependency graph and composition entities.

use super::capability::{Entity, EntityKind, VersionGated};
use super::Aggregate;
use serde::{Deserialize, Serialize};

/// A dependency record: `dep_ref` depends on every entry of `dependencies`.
///
/// In memory the children are full records so a sub-graph can be nested.
/// The JSON and binary forms carry direct children as the `dependsOn`
/// string list, so grandchildren survive only through XML.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dependency {
    #[serde(rename = "ref")]
    pub dep_ref: String,
    #[serde(
        rename = "dependsOn",
        default,
        with = "depends_on",
        skip_serializing_if = "Option::is_none"
    )]
    pub dependencies: Option<Vec<Dependency>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provides: Option<Vec<String>>,
}

impl Dependency {
    #[must_use]
    pub fn new(dep_ref: impl Into<String>) -> Self {
        Self {
            dep_ref: dep_ref.into(),
            dependencies: None,
            provides: None,
        }
    }

    /// A record for `dep_ref` with leaf children for each of `depends_on`.
    #[must_use]
    pub fn with_depends_on<I, S>(dep_ref: impl Into<String>, depends_on: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            dependencies: Some(depends_on.into_iter().map(Self::new).collect()),
            ..Self::new(dep_ref)
        }
    }

    /// Refs of the direct children.
    #[must_use]
    pub fn depends_on(&self) -> Vec<&str> {
        self.dependencies
            .iter()
            .flatten()
            .map(|d| d.dep_ref.as_str())
            .collect()
    }
}

mod depends_on {
    use super::Dependency;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<Vec<Dependency>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let refs: Option<Vec<&str>> = value
            .as_ref()
            .map(|children| children.iter().map(|d| d.dep_ref.as_str()).collect());
        serializer.collect_seq(refs.into_iter().flatten())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Vec<Dependency>>, D::Error> {
        let refs = Option::<Vec<String>>::deserialize(deserializer)?;
        Ok(refs.map(|refs| refs.into_iter().map(Dependency::new).collect()))
    }
}

/// A completeness claim over a set of referenced entities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Composition {
    #[serde(rename = "bom-ref", skip_serializing_if = "Option::is_none")]
    pub bom_ref: Option<String>,
    pub aggregate: Aggregate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assemblies: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dependencies: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vulnerabilities: Option<Vec<String>>,
}

impl Composition {
    #[must_use]
    pub const fn new(aggregate: Aggregate) -> Self {
        Self {
            bom_ref: None,
            aggregate,
            assemblies: None,
            dependencies: None,
            vulnerabilities: None,
        }
    }
}

impl Entity for Dependency {
    const KIND: EntityKind = EntityKind::Dependency;
}

impl VersionGated for Dependency {
    fn clear_field(&mut self, field: &str) -> bool {
        match field {
            "provides" => self.provides = None,
            _ => return false,
        }
        true
    }
}

impl Entity for Composition {
    const KIND: EntityKind = EntityKind::Composition;
}

impl VersionGated for Composition {
    fn clear_field(&mut self, field: &str) -> bool {
        match field {
            "bom-ref" => self.bom_ref = None,
            "vulnerabilities" => self.vulnerabilities = None,
            _ => return false,
        }
        true
    }
}
