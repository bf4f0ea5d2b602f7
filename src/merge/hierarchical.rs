//! Hierarchical merge: one subtree per input document.

use super::cleanup::{cleanup_empty_lists, cleanup_metadata_component};
use super::flat::{merge_declarations, merge_definitions};
use super::rename::rename_bom_ref;
use super::{finish_identity, MergeOptions};
use crate::entity::{merge_lists, BomEntity, ListMergeStrategy};
use crate::error::{BomError, ErrorContext, Result};
use crate::model::{
    bom_ref_sites, for_each_bom_ref_mut, for_each_ref_link_mut, Bom, Component, Dependency,
    Service, SpecVersion, ToolChoices,
};

/// Prefix every identifier of `bom` and every reference to one with
/// `namespace:`. Empty identifiers are dropped.
fn namespace_document(bom: &mut Bom, namespace: &str) {
    let qualify = |value: &str| format!("{namespace}:{value}");
    for_each_bom_ref_mut(bom, |slot| {
        *slot = slot.take().filter(|r| !r.is_empty()).map(|r| qualify(&r));
    });
    for_each_ref_link_mut(bom, |reference| {
        if !reference.is_empty() {
            *reference = qualify(reference);
        }
    });
}

/// Identifiers declared inside one tool record, as written in its input.
fn declared_refs(tools: ToolChoices) -> Vec<String> {
    let mut holder = Bom::default();
    holder.metadata_mut().tools = Some(tools);
    bom_ref_sites(&holder)
        .into_iter()
        .filter(|(_, r)| !r.is_empty())
        .map(|(_, r)| r.to_string())
        .collect()
}

/// Tool entries already in the result, in the form their input wrote them,
/// with the namespace of that input.
struct SeenTools<T> {
    entries: Vec<(T, String)>,
}

impl<T: BomEntity> SeenTools<T> {
    const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Keep each namespaced tool unless an equal one was kept already. A
    /// dropped duplicate has its identifiers renamed in `document` to the
    /// kept copy's.
    fn absorb(
        &mut self,
        document: &mut Bom,
        namespace: &str,
        originals: Vec<T>,
        namespaced: Vec<T>,
        kept: &mut Option<Vec<T>>,
        refs_of: impl Fn(T) -> Vec<String>,
    ) -> Result<()> {
        for (original, copy) in originals.into_iter().zip(namespaced) {
            let owner = self
                .entries
                .iter()
                .find(|(known, _)| known.entity_eq(&original))
                .map(|(_, owner)| owner.clone());
            match owner {
                Some(owner) => {
                    for reference in refs_of(original) {
                        rename_bom_ref(
                            document,
                            &format!("{namespace}:{reference}"),
                            &format!("{owner}:{reference}"),
                        )?;
                    }
                }
                None => {
                    kept.get_or_insert_with(Vec::new).push(copy);
                    self.entries.push((original, namespace.to_string()));
                }
            }
        }
        Ok(())
    }
}

/// Move the namespaced tool record of `document` into `result`.
/// `original` is the same record before namespacing.
fn absorb_tools(
    result: &mut Bom,
    document: &mut Bom,
    namespace: &str,
    original: ToolChoices,
    seen: &mut (SeenTools<Component>, SeenTools<Service>),
    strategy: ListMergeStrategy,
) -> Result<()> {
    let Some(namespaced) = document.metadata.as_mut().and_then(|m| m.tools.take()) else {
        return Ok(());
    };
    let mut target = result.metadata_mut().tools.take().unwrap_or_default();
    target.tools = merge_lists(target.tools.take(), namespaced.tools, strategy)?;
    seen.0.absorb(
        document,
        namespace,
        original.components.unwrap_or_default(),
        namespaced.components.unwrap_or_default(),
        &mut target.components,
        |c| declared_refs(ToolChoices::components(vec![c])),
    )?;
    seen.1.absorb(
        document,
        namespace,
        original.services.unwrap_or_default(),
        namespaced.services.unwrap_or_default(),
        &mut target.services,
        |s| {
            declared_refs(ToolChoices {
                services: Some(vec![s]),
                ..ToolChoices::default()
            })
        },
    )?;
    result.metadata_mut().tools = Some(target);
    Ok(())
}

fn append<T>(target: &mut Option<Vec<T>>, items: Option<Vec<T>>) {
    if let Some(items) = items {
        target.get_or_insert_with(Vec::new).extend(items);
    }
}

/// Merge documents while keeping each one as a subtree.
///
/// Every input must describe itself with a metadata component. Its
/// namespace is `group.name@version` (or `name@version`), and every
/// identifier of the input, together with every reference to one, is
/// prefixed with `namespace:`. The input's components are nested below its
/// metadata component, which is then appended to the result's components.
/// Services, external references, dependencies, compositions,
/// vulnerabilities, annotations and formulas are appended, and
/// declarations and definitions are merged.
///
/// Tool components and services are namespaced too. One that equals, as
/// its input wrote it, a tool kept from an earlier input is dropped and its
/// references are pointed at the kept copy. Legacy tools are merged.
///
/// With a `subject`, the result describes it: it becomes the metadata
/// component (with bom-ref `namespace` when it has none) and a dependency
/// record makes it depend on every input's system component.
///
/// # Errors
///
/// - `MissingMetadataComponent` naming the serial number of the first
///   input without a metadata component.
/// - `EntityConflict` when legacy tools or declarations disagree.
pub fn hierarchical_merge(
    boms: &[Bom],
    subject: Option<Component>,
    options: &MergeOptions,
) -> Result<Bom> {
    let mut result = Bom::new(SpecVersion::CURRENT);
    let subject_ref = subject.map(|mut subject| {
        let bom_ref = subject
            .bom_ref
            .clone()
            .unwrap_or_else(|| subject.namespace());
        subject.bom_ref = Some(bom_ref.clone());
        result.metadata_mut().component = Some(subject);
        bom_ref
    });

    let mut systems = Vec::new();
    let mut seen_tools = (SeenTools::new(), SeenTools::new());
    for bom in boms {
        let Some(namespace) = bom.metadata_component().map(Component::namespace) else {
            return Err(BomError::missing_metadata_component(
                bom.serial_number.as_deref(),
            ));
        };
        tracing::debug!(namespace = %namespace, "nesting document");

        let mut document = bom.clone();
        namespace_document(&mut document, &namespace);
        if let Some(original) = bom.metadata.as_ref().and_then(|m| m.tools.clone()) {
            absorb_tools(
                &mut result,
                &mut document,
                &namespace,
                original,
                &mut seen_tools,
                options.strategy,
            )
            .with_context(|| format!("tools of {namespace}"))?;
        }

        let Bom {
            metadata,
            components,
            services,
            external_references,
            dependencies,
            compositions,
            vulnerabilities,
            annotations,
            formulation,
            declarations,
            definitions,
            ..
        } = document;
        let Some(mut system) = metadata.and_then(|m| m.component) else {
            return Err(BomError::missing_metadata_component(
                bom.serial_number.as_deref(),
            ));
        };

        append(&mut system.components, components);
        let system_ref = system.bom_ref.get_or_insert_with(|| namespace.clone()).clone();
        systems.push(Dependency::new(system_ref));
        result.components.get_or_insert_with(Vec::new).push(system);

        append(&mut result.services, services);
        append(&mut result.external_references, external_references);
        append(&mut result.dependencies, dependencies);
        append(&mut result.compositions, compositions);
        append(&mut result.vulnerabilities, vulnerabilities);
        append(&mut result.annotations, annotations);
        append(&mut result.formulation, formulation);
        merge_declarations(&mut result.declarations, declarations, options.strategy)
            .with_context(|| format!("declarations of {namespace}"))?;
        merge_definitions(&mut result.definitions, definitions, options.strategy)
            .with_context(|| format!("definitions of {namespace}"))?;
    }

    if let Some(subject_ref) = subject_ref {
        result.dependencies.get_or_insert_with(Vec::new).push(Dependency {
            dependencies: Some(systems),
            ..Dependency::new(subject_ref)
        });
    }

    finish_identity(&mut result, options);
    cleanup_metadata_component(&mut result, options.strategy)?;
    cleanup_empty_lists(&mut result);
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Affects, Aggregate, ComponentType, Composition, Tool, Vulnerability};
    use crate::validate::validate_references;

    fn lib(name: &str, version: &str) -> Component {
        Component::new(ComponentType::Library, name).with_version(version)
    }

    fn system_doc(name: &str) -> Bom {
        let mut bom = Bom::new(SpecVersion::V1_5);
        bom.metadata_mut().component = Some(
            Component::new(ComponentType::Application, name)
                .with_version("1.0")
                .with_bom_ref("app"),
        );
        bom.components = Some(vec![lib("shared", "1").with_bom_ref("shared-id")]);
        bom.dependencies = Some(vec![Dependency::with_depends_on("app", ["shared-id"])]);
        bom
    }

    fn plain() -> MergeOptions {
        MergeOptions::intermediate(ListMergeStrategy::Careful)
    }

    fn dependency_refs(bom: &Bom) -> Vec<&str> {
        bom.dependencies
            .iter()
            .flatten()
            .map(|d| d.dep_ref.as_str())
            .collect()
    }

    #[test]
    fn test_requires_metadata_component() {
        let mut bare = Bom::default();
        bare.serial_number = Some("urn:uuid:3e671687-395b-41f5-a30f-a58921a69b79".into());
        let err = hierarchical_merge(&[system_doc("a"), bare], None, &plain()).unwrap_err();
        assert!(err.is_missing_metadata_component());
    }

    #[test]
    fn test_identifiers_do_not_collide() {
        let merged =
            hierarchical_merge(&[system_doc("a"), system_doc("b")], None, &plain()).unwrap();

        assert_eq!(dependency_refs(&merged), vec!["a@1.0:app", "b@1.0:app"]);
        let children: Vec<&str> = merged
            .dependencies
            .iter()
            .flatten()
            .flat_map(Dependency::depends_on)
            .collect();
        assert_eq!(children, vec!["a@1.0:shared-id", "b@1.0:shared-id"]);
        assert!(validate_references(&merged).is_empty());
    }

    #[test]
    fn test_components_nest_under_system() {
        let merged = hierarchical_merge(&[system_doc("a")], None, &plain()).unwrap();
        let systems = merged.components.as_ref().unwrap();
        assert_eq!(systems.len(), 1);
        assert_eq!(systems[0].bom_ref.as_deref(), Some("a@1.0:app"));
        let nested = systems[0].components.as_ref().unwrap();
        assert_eq!(nested[0].bom_ref.as_deref(), Some("a@1.0:shared-id"));
        assert!(merged.services.is_none());
        assert!(merged.vulnerabilities.is_none());
    }

    #[test]
    fn test_subject_depends_on_systems() {
        let mut unnamed = system_doc("c");
        if let Some(component) = unnamed.metadata.as_mut().and_then(|m| m.component.as_mut()) {
            component.bom_ref = None;
        }
        let subject = lib("product", "2").with_group("acme");
        let merged =
            hierarchical_merge(&[system_doc("a"), unnamed], Some(subject), &plain()).unwrap();

        assert_eq!(
            merged.metadata_component().and_then(|c| c.bom_ref.as_deref()),
            Some("acme.product@2")
        );
        let record = merged
            .dependencies
            .iter()
            .flatten()
            .find(|d| d.dep_ref == "acme.product@2")
            .unwrap();
        assert_eq!(record.depends_on(), vec!["a@1.0:app", "c@1.0"]);
    }

    fn scanner(version: &str, bom_ref: &str) -> Component {
        Component::new(ComponentType::Application, "scanner")
            .with_version(version)
            .with_bom_ref(bom_ref)
    }

    fn with_tool(mut bom: Bom, tool: Component) -> Bom {
        let tool_ref = tool.bom_ref.clone().unwrap_or_default();
        bom.metadata_mut().tools = Some(ToolChoices::components(vec![tool]));
        bom.dependencies = Some(vec![Dependency::with_depends_on(
            "app",
            ["shared-id".to_string(), tool_ref],
        )]);
        bom
    }

    fn tool_components(bom: &Bom) -> Vec<&Component> {
        bom.metadata
            .as_ref()
            .and_then(|m| m.tools.as_ref())
            .and_then(|t| t.components.as_ref())
            .map(|c| c.iter().collect())
            .unwrap_or_default()
    }

    #[test]
    fn test_referenced_tool_resolves_after_namespacing() {
        let bom = with_tool(system_doc("a"), scanner("3", "scanner"));
        assert!(validate_references(&bom).is_empty());

        let merged = hierarchical_merge(&[bom], None, &plain()).unwrap();
        let tools = tool_components(&merged);
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].bom_ref.as_deref(), Some("a@1.0:scanner"));
        let record = merged
            .dependencies
            .iter()
            .flatten()
            .find(|d| d.dep_ref == "a@1.0:app")
            .unwrap();
        assert_eq!(record.depends_on(), vec!["a@1.0:shared-id", "a@1.0:scanner"]);
        assert!(validate_references(&merged).is_empty());
    }

    #[test]
    fn test_equal_tools_are_kept_once() {
        let first = with_tool(system_doc("a"), scanner("3", "scanner"));
        let second = with_tool(system_doc("b"), scanner("3", "scanner"));

        let merged = hierarchical_merge(&[first, second], None, &plain()).unwrap();
        let tools = tool_components(&merged);
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].bom_ref.as_deref(), Some("a@1.0:scanner"));
        let record = merged
            .dependencies
            .iter()
            .flatten()
            .find(|d| d.dep_ref == "b@1.0:app")
            .unwrap();
        assert_eq!(record.depends_on(), vec!["b@1.0:shared-id", "a@1.0:scanner"]);
        assert!(validate_references(&merged).is_empty());
    }

    #[test]
    fn test_different_tools_sharing_an_identifier_both_survive() {
        let first = with_tool(system_doc("a"), scanner("3", "tool"));
        let second = with_tool(system_doc("b"), scanner("4", "tool"));

        let merged = hierarchical_merge(&[first, second], None, &plain()).unwrap();
        let refs: Vec<_> = tool_components(&merged)
            .iter()
            .map(|c| (c.version.as_deref(), c.bom_ref.as_deref()))
            .collect();
        assert_eq!(
            refs,
            vec![
                (Some("3"), Some("a@1.0:tool")),
                (Some("4"), Some("b@1.0:tool")),
            ]
        );
        assert!(validate_references(&merged).is_empty());
    }

    #[test]
    fn test_legacy_tools_are_merged() {
        let tool = Tool::new("acme", "scanner", "1");
        let mut first = system_doc("a");
        first.metadata_mut().tools = Some(ToolChoices::legacy(vec![tool.clone()]));
        let mut second = system_doc("b");
        second.metadata_mut().tools = Some(ToolChoices::legacy(vec![tool]));

        let merged = hierarchical_merge(&[first, second], None, &plain()).unwrap();
        let tools = merged.metadata.as_ref().and_then(|m| m.tools.as_ref()).unwrap();
        assert_eq!(tools.tools.as_ref().map(Vec::len), Some(1));
    }

    #[test]
    fn test_every_reference_kind_is_namespaced() {
        let mut bom = system_doc("a");
        let mut vuln = Vulnerability::new("CVE-2024-0001");
        vuln.bom_ref = Some("vuln".into());
        vuln.affects = Some(vec![Affects::new("shared-id")]);
        bom.vulnerabilities = Some(vec![vuln]);
        let mut composition = Composition::new(Aggregate::Complete);
        composition.assemblies = Some(vec!["shared-id".into()]);
        composition.vulnerabilities = Some(vec!["vuln".into()]);
        bom.compositions = Some(vec![composition]);
        bom.services = Some(vec![
            Service::new("api").with_bom_ref("api"),
            Service::new("blank").with_bom_ref(""),
        ]);

        let merged = hierarchical_merge(&[bom], None, &plain()).unwrap();

        let vuln = &merged.vulnerabilities.as_ref().unwrap()[0];
        assert_eq!(vuln.bom_ref.as_deref(), Some("a@1.0:vuln"));
        assert_eq!(vuln.affects.as_ref().unwrap()[0].affects_ref, "a@1.0:shared-id");
        let composition = &merged.compositions.as_ref().unwrap()[0];
        assert_eq!(
            composition.assemblies.as_deref(),
            Some(&["a@1.0:shared-id".to_string()][..])
        );
        assert_eq!(
            composition.vulnerabilities.as_deref(),
            Some(&["a@1.0:vuln".to_string()][..])
        );
        let services = merged.services.as_ref().unwrap();
        assert_eq!(services[0].bom_ref.as_deref(), Some("a@1.0:api"));
        assert_eq!(services[1].bom_ref, None);
        assert!(validate_references(&merged).is_empty());
    }

    #[test]
    fn test_identity_options() {
        let merged =
            hierarchical_merge(&[system_doc("a")], None, &MergeOptions::default()).unwrap();
        assert!(merged.serial_number.is_some());
        assert_eq!(merged.spec_version, SpecVersion::CURRENT);
        let tools = merged.metadata.as_ref().and_then(|m| m.tools.as_ref()).unwrap();
        assert_eq!(tools.tools.as_ref().map(Vec::len), Some(1));
    }
}
