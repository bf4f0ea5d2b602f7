//! CycloneDX XML codec.
//!
//! The document is first brought into its JSON value form, which already
//! carries the version-specific shapes, and that value is then mapped to
//! XML with a few element tables:
//!
//! - lists are written inside a wrapper element named after the field, one
//!   item element per entry (`<hashes><hash alg="SHA-256">..</hash></hashes>`);
//! - references in reference lists are written as `<item ref=".."/>`;
//! - identifiers and a handful of discriminators are attributes;
//! - `specVersion` is the namespace of the root element.
//!
//! Dependencies are written from the typed model so nested sub-graphs
//! survive. Reading reverses the mapping and coerces the few numeric and
//! boolean fields back to their types.

use super::{BomCodec, Format};
use crate::error::{BomError, Result, SerializationErrorKind};
use crate::model::{Bom, Dependency, SpecVersion, BOM_FORMAT};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use serde_json::{Map, Value};

/// Element nesting beyond this depth is rejected.
const MAX_DEPTH: usize = 512;

/// XML codec. Output is indented when `pretty` is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XmlCodec {
    pub pretty: bool,
}

impl Default for XmlCodec {
    fn default() -> Self {
        Self { pretty: true }
    }
}

impl XmlCodec {
    #[must_use]
    pub const fn compact() -> Self {
        Self { pretty: false }
    }
}

impl BomCodec for XmlCodec {
    fn format(&self) -> Format {
        Format::Xml
    }

    fn encode(&self, bom: &Bom) -> Result<Vec<u8>> {
        encode_document(bom, self.pretty)
    }

    fn decode(&self, bytes: &[u8]) -> Result<Bom> {
        let text = std::str::from_utf8(bytes).map_err(|e| invalid(e.to_string()))?;
        decode_document(text)
    }
}

fn invalid(message: impl Into<String>) -> BomError {
    BomError::serialization("XML", SerializationErrorKind::InvalidXml(message.into()))
}

// ============================================================================
// Element tables
// ============================================================================

const BOM_ORDER: &[&str] = &[
    "metadata",
    "components",
    "services",
    "externalReferences",
    "dependencies",
    "compositions",
    "properties",
    "vulnerabilities",
    "annotations",
    "formulation",
    "declarations",
    "definitions",
];

const METADATA_ORDER: &[&str] = &[
    "timestamp",
    "lifecycles",
    "tools",
    "authors",
    "component",
    "manufacture",
    "manufacturer",
    "supplier",
    "licenses",
    "properties",
];

const COMPONENT_ORDER: &[&str] = &[
    "supplier",
    "manufacturer",
    "authors",
    "author",
    "publisher",
    "group",
    "name",
    "version",
    "description",
    "scope",
    "hashes",
    "licenses",
    "copyright",
    "cpe",
    "purl",
    "omniborId",
    "swhid",
    "swid",
    "modified",
    "pedigree",
    "externalReferences",
    "properties",
    "components",
    "evidence",
    "releaseNotes",
    "modelCard",
    "data",
    "cryptoProperties",
    "tags",
];

const SERVICE_ORDER: &[&str] = &[
    "provider",
    "group",
    "name",
    "version",
    "description",
    "endpoints",
    "authenticated",
    "x-trust-boundary",
    "trustZone",
    "data",
    "licenses",
    "externalReferences",
    "properties",
    "services",
    "releaseNotes",
    "tags",
];

const VULNERABILITY_ORDER: &[&str] = &[
    "id",
    "source",
    "references",
    "ratings",
    "cwes",
    "description",
    "detail",
    "recommendation",
    "workaround",
    "proofOfConcept",
    "advisories",
    "created",
    "published",
    "updated",
    "rejected",
    "credits",
    "tools",
    "analysis",
    "affects",
    "properties",
];

/// Position of `key` among the children of `element`; unknown keys go last.
fn field_rank(element: &str, key: &str) -> usize {
    let order = match element {
        "bom" => BOM_ORDER,
        "metadata" => METADATA_ORDER,
        "component" => COMPONENT_ORDER,
        "service" => SERVICE_ORDER,
        "vulnerability" => VULNERABILITY_ORDER,
        _ => &[],
    };
    order.iter().position(|k| *k == key).unwrap_or(order.len())
}

/// Item element name for a list field written inside a wrapper.
fn list_item(parent: &str, key: &str) -> Option<&'static str> {
    Some(match key {
        "components" | "ancestors" | "descendants" | "variants" => "component",
        "services" => "service",
        "externalReferences" | "references" => "reference",
        "hashes" => "hash",
        "properties" => "property",
        "authors" => "author",
        "tools" => "tool",
        "dependencies" => "dependency",
        "compositions" => "composition",
        "assemblies" => "assembly",
        "vulnerabilities" => "vulnerability",
        "annotations" => "annotation",
        "subjects" => "subject",
        "formulation" => "formula",
        "workflows" => "workflow",
        "commits" => "commit",
        "patches" => "patch",
        "endpoints" => "endpoint",
        "tags" => "tag",
        "ratings" => "rating",
        "cwes" => "cwe",
        "advisories" => "advisory",
        "affects" => "target",
        "versions" => "version",
        "lifecycles" => "lifecycle",
        "occurrences" => "occurrence",
        "methods" => "method",
        "assessors" => "assessor",
        "attestations" => "attestation",
        "claims" => "claim",
        "counterClaims" => "counterClaim",
        "evidence" | "counterEvidence" if parent != "component" => "evidence",
        "mitigationStrategies" => "mitigationStrategy",
        "standards" => "standard",
        "requirements" => "requirement",
        "levels" => "level",
        "descriptions" => "description",
        "organizations" => "organization",
        "copyright" if parent == "evidence" => "text",
        "data" if parent == "component" => "dataset",
        _ => return None,
    })
}

/// List fields whose string entries are text rather than references.
fn holds_plain_strings(key: &str) -> bool {
    matches!(key, "endpoints" | "tags" | "descriptions")
}

/// List fields written as repeated elements without a wrapper.
fn is_repeated(parent: &str, key: &str) -> bool {
    match key {
        "url" => matches!(
            parent,
            "supplier" | "manufacturer" | "manufacture" | "provider" | "organization"
        ),
        "contact" | "omniborId" | "swhid" | "openCre" | "identity" | "map" | "response"
        | "provides" => true,
        "data" => !matches!(parent, "component" | "service"),
        _ => false,
    }
}

/// Fields of `element` written as attributes when scalar.
fn attribute_keys(element: &str) -> &'static [&'static str] {
    match element {
        "component" => &["type", "mime-type", "bom-ref"],
        "hash" => &["alg"],
        "property" => &["name"],
        "reference" => &["type"],
        "license" | "expression" => &["bom-ref", "acknowledgement"],
        "text" => &["contentType", "encoding"],
        "dependency" | "provides" => &["ref"],
        "classification" => &["flow"],
        "dataflow" => &["name", "description"],
        _ => &["bom-ref"],
    }
}

/// Field of `element` written as its text content.
fn text_key(element: &str) -> Option<&'static str> {
    match element {
        "hash" | "text" => Some("content"),
        "property" => Some("value"),
        _ => None,
    }
}

fn xml_attribute_name(key: &str) -> &str {
    match key {
        "contentType" => "content-type",
        other => other,
    }
}

fn json_attribute_name(name: &str) -> &str {
    match name {
        "content-type" => "contentType",
        other => other,
    }
}

/// Typed value of a scalar read from text.
fn scalar(key: &str, text: &str) -> Value {
    let text = text.trim();
    match key {
        "modified" | "authenticated" | "x-trust-boundary" | "thirdParty" => match text {
            "true" | "1" => Value::Bool(true),
            "false" | "0" => Value::Bool(false),
            _ => Value::String(text.to_string()),
        },
        "cwe" => text
            .parse::<u64>()
            .map_or_else(|_| Value::String(text.to_string()), Value::from),
        "score" | "confidence" => text
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map_or_else(|| Value::String(text.to_string()), Value::Number),
        _ => Value::String(text.to_string()),
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

// ============================================================================
// Writing
// ============================================================================

type XmlWriter = Writer<Vec<u8>>;

fn emit(writer: &mut XmlWriter, event: Event<'_>) -> Result<()> {
    writer
        .write_event(event)
        .map_err(|e| invalid(e.to_string()))
}

fn open(writer: &mut XmlWriter, name: &str) -> Result<()> {
    emit(writer, Event::Start(BytesStart::new(name)))
}

fn close(writer: &mut XmlWriter, name: &str) -> Result<()> {
    emit(writer, Event::End(BytesEnd::new(name)))
}

fn write_text(
    writer: &mut XmlWriter,
    name: &str,
    attributes: &[(&str, String)],
    text: &str,
) -> Result<()> {
    let mut start = BytesStart::new(name);
    for (key, value) in attributes {
        start.push_attribute((*key, value.as_str()));
    }
    if text.is_empty() {
        return emit(writer, Event::Empty(start));
    }
    emit(writer, Event::Start(start))?;
    emit(writer, Event::Text(BytesText::new(text)))?;
    close(writer, name)
}

fn ordered_fields<'a>(element: &str, map: &'a Map<String, Value>) -> Vec<(&'a String, &'a Value)> {
    let mut fields: Vec<_> = map.iter().filter(|(_, v)| !v.is_null()).collect();
    fields.sort_by_key(|(key, _)| field_rank(element, key));
    fields
}

fn write_value(writer: &mut XmlWriter, name: &str, value: &Value) -> Result<()> {
    match value {
        Value::Null => Ok(()),
        Value::Object(map) => write_object(writer, name, map),
        Value::Array(items) => items
            .iter()
            .try_for_each(|item| write_value(writer, name, item)),
        other => write_text(writer, name, &[], &scalar_text(other).unwrap_or_default()),
    }
}

fn write_object(writer: &mut XmlWriter, name: &str, map: &Map<String, Value>) -> Result<()> {
    if map.is_empty() {
        return Ok(());
    }
    let attribute_keys = attribute_keys(name);
    let text_key = text_key(name);

    let mut start = BytesStart::new(name);
    let mut consumed: Vec<&str> = Vec::new();
    for key in attribute_keys {
        if let Some(text) = map.get(*key).and_then(scalar_text) {
            start.push_attribute((xml_attribute_name(key), text.as_str()));
            consumed.push(*key);
        }
    }
    let text = text_key.and_then(|k| map.get(k)).and_then(scalar_text);
    if text.is_some() {
        consumed.extend(text_key);
    }
    let fields: Vec<_> = ordered_fields(name, map)
        .into_iter()
        .filter(|(key, _)| !consumed.contains(&key.as_str()))
        .collect();

    if fields.is_empty() && text.as_deref().map_or(true, str::is_empty) {
        return emit(writer, Event::Empty(start));
    }
    emit(writer, Event::Start(start))?;
    if let Some(text) = text.as_deref() {
        emit(writer, Event::Text(BytesText::new(text)))?;
    }
    for (key, value) in fields {
        write_field(writer, name, key, value)?;
    }
    close(writer, name)
}

fn write_field(writer: &mut XmlWriter, parent: &str, key: &str, value: &Value) -> Result<()> {
    let Value::Array(items) = value else {
        return write_value(writer, key, value);
    };
    if key == "licenses" {
        return write_licenses(writer, items);
    }
    if key == "data" && parent == "service" {
        return write_service_data(writer, items);
    }
    let Some(item) = list_item(parent, key) else {
        return write_value(writer, key, value);
    };

    open(writer, key)?;
    for entry in items {
        match entry {
            Value::String(reference) if !holds_plain_strings(key) => {
                let mut start = BytesStart::new(item);
                start.push_attribute(("ref", reference.as_str()));
                emit(writer, Event::Empty(start))?;
            }
            other => write_value(writer, item, other)?,
        }
    }
    close(writer, key)
}

fn write_licenses(writer: &mut XmlWriter, items: &[Value]) -> Result<()> {
    open(writer, "licenses")?;
    for choice in items.iter().filter_map(Value::as_object) {
        if let Some(license) = choice.get("license") {
            write_value(writer, "license", license)?;
        } else if let Some(expression) = choice.get("expression").and_then(scalar_text) {
            let attributes: Vec<(&str, String)> = attribute_keys("expression")
                .iter()
                .filter_map(|key| choice.get(*key).and_then(scalar_text).map(|v| (*key, v)))
                .collect();
            write_text(writer, "expression", &attributes, &expression)?;
        }
    }
    close(writer, "licenses")
}

/// Classifications below 1.5, data flows from 1.5. The JSON value already
/// holds only the classification part when tagged below 1.5.
fn write_service_data(writer: &mut XmlWriter, items: &[Value]) -> Result<()> {
    open(writer, "data")?;
    for flow in items.iter().filter_map(Value::as_object) {
        let direction = flow
            .get("flow")
            .and_then(scalar_text)
            .unwrap_or_default();
        let classification = flow
            .get("classification")
            .and_then(scalar_text)
            .unwrap_or_default();
        let is_dataflow = flow
            .keys()
            .any(|k| k != "flow" && k != "classification");
        if !is_dataflow {
            write_text(writer, "classification", &[("flow", direction)], &classification)?;
            continue;
        }

        let mut start = BytesStart::new("dataflow");
        for key in attribute_keys("dataflow") {
            if let Some(text) = flow.get(*key).and_then(scalar_text) {
                start.push_attribute((*key, text.as_str()));
            }
        }
        emit(writer, Event::Start(start))?;
        write_text(writer, "classification", &[("flow", direction)], &classification)?;
        if let Some(governance) = flow.get("governance") {
            write_value(writer, "governance", governance)?;
        }
        for key in ["source", "destination"] {
            if let Some(Value::Array(urls)) = flow.get(key) {
                open(writer, key)?;
                for url in urls.iter().filter_map(scalar_text) {
                    write_text(writer, "url", &[], &url)?;
                }
                close(writer, key)?;
            }
        }
        close(writer, "dataflow")?;
    }
    close(writer, "data")
}

fn write_dependency(writer: &mut XmlWriter, dependency: &Dependency) -> Result<()> {
    let mut start = BytesStart::new("dependency");
    start.push_attribute(("ref", dependency.dep_ref.as_str()));
    let children = dependency.dependencies.as_deref().unwrap_or_default();
    let provides = dependency.provides.as_deref().unwrap_or_default();
    if children.is_empty() && provides.is_empty() {
        return emit(writer, Event::Empty(start));
    }
    emit(writer, Event::Start(start))?;
    for child in children {
        write_dependency(writer, child)?;
    }
    for reference in provides {
        let mut start = BytesStart::new("provides");
        start.push_attribute(("ref", reference.as_str()));
        emit(writer, Event::Empty(start))?;
    }
    close(writer, "dependency")
}

fn encode_document(bom: &Bom, pretty: bool) -> Result<Vec<u8>> {
    let value = serde_json::to_value(bom).map_err(|e| invalid(e.to_string()))?;
    let Value::Object(mut root) = value else {
        return Err(invalid("document is not an object"));
    };
    root.remove("bomFormat");
    root.remove("specVersion");
    let serial_number = root.remove("serialNumber");
    let revision = root.remove("version");

    let mut writer = if pretty {
        Writer::new_with_indent(Vec::new(), b' ', 2)
    } else {
        Writer::new(Vec::new())
    };
    emit(
        &mut writer,
        Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)),
    )?;

    let namespace = bom.spec_version.xml_namespace();
    let mut start = BytesStart::new("bom");
    start.push_attribute(("xmlns", namespace.as_str()));
    if let Some(serial) = serial_number.as_ref().and_then(scalar_text) {
        start.push_attribute(("serialNumber", serial.as_str()));
    }
    if let Some(revision) = revision.as_ref().and_then(scalar_text) {
        start.push_attribute(("version", revision.as_str()));
    }

    let fields = ordered_fields("bom", &root);
    if fields.is_empty() {
        emit(&mut writer, Event::Empty(start))?;
        return Ok(writer.into_inner());
    }
    emit(&mut writer, Event::Start(start))?;
    for (key, value) in fields {
        if key == "dependencies" {
            open(&mut writer, "dependencies")?;
            for dependency in bom.dependencies.iter().flatten() {
                write_dependency(&mut writer, dependency)?;
            }
            close(&mut writer, "dependencies")?;
        } else {
            write_field(&mut writer, "bom", key, value)?;
        }
    }
    close(&mut writer, "bom")?;
    Ok(writer.into_inner())
}

// ============================================================================
// Reading
// ============================================================================

#[derive(Debug, Default)]
struct Node {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<Node>,
    text: String,
}

impl Node {
    fn from_start(start: &BytesStart<'_>) -> Result<Self> {
        let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
        let mut attributes = Vec::new();
        for attribute in start.attributes() {
            let attribute = attribute.map_err(|e| invalid(e.to_string()))?;
            let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
            let value = attribute
                .unescape_value()
                .map_err(|e| invalid(e.to_string()))?
                .into_owned();
            attributes.push((key, value));
        }
        Ok(Self {
            name,
            attributes,
            ..Self::default()
        })
    }

    fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Attributes that carry data, without namespace declarations.
    fn data_attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes
            .iter()
            .filter(|(k, _)| k != "xmlns" && !k.contains(':'))
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    fn is_leaf(&self) -> bool {
        self.children.is_empty() && self.data_attributes().next().is_none()
    }
}

fn attach(stack: &mut [Node], root: &mut Option<Node>, node: Node) -> Result<()> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(node);
    } else if root.is_none() {
        *root = Some(node);
    } else {
        return Err(invalid("more than one root element"));
    }
    Ok(())
}

fn parse_tree(text: &str) -> Result<Node> {
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Node> = Vec::new();
    let mut root = None;
    loop {
        match reader.read_event().map_err(|e| invalid(e.to_string()))? {
            Event::Start(start) => {
                if stack.len() >= MAX_DEPTH {
                    return Err(invalid(format!("elements nested deeper than {MAX_DEPTH}")));
                }
                stack.push(Node::from_start(&start)?);
            }
            Event::Empty(start) => {
                let node = Node::from_start(&start)?;
                attach(&mut stack, &mut root, node)?;
            }
            Event::End(_) => {
                let node = stack.pop().ok_or_else(|| invalid("unbalanced end tag"))?;
                attach(&mut stack, &mut root, node)?;
            }
            Event::Text(text) => {
                let text = text.unescape().map_err(|e| invalid(e.to_string()))?;
                if let Some(node) = stack.last_mut() {
                    node.text.push_str(&text);
                }
            }
            Event::CData(data) => {
                if let Some(node) = stack.last_mut() {
                    node.text.push_str(&String::from_utf8_lossy(&data.into_inner()));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    if !stack.is_empty() {
        return Err(invalid("unexpected end of document"));
    }
    root.ok_or_else(|| invalid("document has no root element"))
}

enum Field {
    /// A whole list read from a wrapper element.
    List(Vec<Value>),
    /// One entry of a list written without a wrapper.
    Repeated(Value),
    Single(Value),
}

fn push_entries(map: &mut Map<String, Value>, key: &str, entries: Vec<Value>) {
    match map.get_mut(key) {
        Some(Value::Array(existing)) => existing.extend(entries),
        Some(existing) => {
            let mut merged = vec![existing.take()];
            merged.extend(entries);
            *existing = Value::Array(merged);
        }
        None => {
            map.insert(key.to_string(), Value::Array(entries));
        }
    }
}

fn decode_children(parent: &str, children: &[Node], map: &mut Map<String, Value>) {
    for child in children {
        let key = child.name.as_str();
        match field_value(parent, child) {
            Field::List(entries) => push_entries(map, key, entries),
            Field::Repeated(entry) => push_entries(map, key, vec![entry]),
            Field::Single(value) => {
                if map.contains_key(key) {
                    push_entries(map, key, vec![value]);
                } else {
                    map.insert(key.to_string(), value);
                }
            }
        }
    }
}

fn field_value(parent: &str, node: &Node) -> Field {
    match node.name.as_str() {
        "licenses" => Field::List(license_choices(node)),
        "tools"
            if node.data_attributes().next().is_none()
                && node.children.iter().all(|c| c.name == "tool") =>
        {
            Field::List(node.children.iter().map(list_entry).collect())
        }
        "tools" => Field::Single(object_value(node)),
        "data" if parent == "service" => Field::List(service_data(node)),
        key if list_item(parent, key).is_some() => {
            Field::List(node.children.iter().map(list_entry).collect())
        }
        key if is_repeated(parent, key) => Field::Repeated(element_value(node)),
        _ => Field::Single(element_value(node)),
    }
}

fn element_value(node: &Node) -> Value {
    if node.is_leaf() {
        scalar(&node.name, &node.text)
    } else {
        object_value(node)
    }
}

fn object_value(node: &Node) -> Value {
    let mut map = Map::new();
    for (name, value) in node.data_attributes() {
        let key = json_attribute_name(name);
        map.insert(key.to_string(), scalar(key, value));
    }
    let text = node.text.trim();
    if !text.is_empty() {
        let key = text_key(&node.name).unwrap_or("content");
        map.insert(key.to_string(), scalar(key, text));
    }
    decode_children(&node.name, &node.children, &mut map);
    Value::Object(map)
}

/// An entry of a wrapped list: a bare `ref` attribute is a reference.
fn list_entry(node: &Node) -> Value {
    let only_ref = node.children.is_empty()
        && node.text.trim().is_empty()
        && node.data_attributes().count() == 1;
    match node.attribute("ref") {
        Some(reference) if only_ref => Value::String(reference.to_string()),
        _ => element_value(node),
    }
}

fn license_choices(node: &Node) -> Vec<Value> {
    node.children
        .iter()
        .filter_map(|choice| match choice.name.as_str() {
            "license" => {
                let mut map = Map::new();
                map.insert("license".into(), object_value(choice));
                Some(Value::Object(map))
            }
            "expression" => {
                let mut map = Map::new();
                for (name, value) in choice.data_attributes() {
                    map.insert(name.to_string(), Value::String(value.to_string()));
                }
                map.insert(
                    "expression".into(),
                    Value::String(choice.text.trim().to_string()),
                );
                Some(Value::Object(map))
            }
            _ => None,
        })
        .collect()
}

fn classification(node: &Node, flow: &mut Map<String, Value>) {
    if let Some(direction) = node.attribute("flow") {
        flow.insert("flow".into(), Value::String(direction.to_string()));
    }
    flow.insert(
        "classification".into(),
        Value::String(node.text.trim().to_string()),
    );
}

fn service_data(node: &Node) -> Vec<Value> {
    node.children
        .iter()
        .filter_map(|entry| {
            let mut flow = Map::new();
            match entry.name.as_str() {
                "classification" => classification(entry, &mut flow),
                "dataflow" => {
                    for key in attribute_keys("dataflow") {
                        if let Some(value) = entry.attribute(key) {
                            flow.insert((*key).to_string(), Value::String(value.to_string()));
                        }
                    }
                    for part in &entry.children {
                        match part.name.as_str() {
                            "classification" => classification(part, &mut flow),
                            "governance" => {
                                flow.insert("governance".into(), element_value(part));
                            }
                            "source" | "destination" => {
                                let urls = part
                                    .children
                                    .iter()
                                    .map(|url| Value::String(url.text.trim().to_string()))
                                    .collect();
                                flow.insert(part.name.clone(), Value::Array(urls));
                            }
                            _ => {}
                        }
                    }
                }
                _ => return None,
            }
            Some(Value::Object(flow))
        })
        .collect()
}

fn dependency_from_node(node: &Node) -> Dependency {
    let mut dependency = Dependency::new(node.attribute("ref").unwrap_or_default());
    let children: Vec<Dependency> = node
        .children
        .iter()
        .filter(|c| c.name == "dependency")
        .map(dependency_from_node)
        .collect();
    let provides: Vec<String> = node
        .children
        .iter()
        .filter(|c| c.name == "provides")
        .filter_map(|c| c.attribute("ref").map(str::to_string))
        .collect();
    if !children.is_empty() {
        dependency.dependencies = Some(children);
    }
    if !provides.is_empty() {
        dependency.provides = Some(provides);
    }
    dependency
}

fn document_version(root: &Node) -> Result<SpecVersion> {
    let mut namespaces = root
        .attributes
        .iter()
        .filter(|(k, _)| k == "xmlns" || k.starts_with("xmlns:"))
        .map(|(_, v)| v.as_str())
        .peekable();
    if namespaces.peek().is_none() {
        return Err(invalid("root element has no CycloneDX namespace"));
    }
    let mut seen = Vec::new();
    for namespace in namespaces {
        if let Some(version) = SpecVersion::from_xml_namespace(namespace) {
            return Ok(version);
        }
        seen.push(namespace);
    }
    Err(BomError::serialization(
        "XML",
        SerializationErrorKind::UnsupportedSpecVersion(seen.join(", ")),
    ))
}

fn decode_document(text: &str) -> Result<Bom> {
    let root = parse_tree(text)?;
    if root.name != "bom" {
        return Err(invalid(format!(
            "root element is <{}>, expected <bom>",
            root.name
        )));
    }
    let version = document_version(&root)?;
    tracing::trace!(%version, "decoding XML document");

    let mut document = Map::new();
    document.insert("bomFormat".into(), Value::String(BOM_FORMAT.to_string()));
    document.insert(
        "specVersion".into(),
        Value::String(version.as_str().to_string()),
    );
    if let Some(serial) = root.attribute("serialNumber") {
        document.insert("serialNumber".into(), Value::String(serial.to_string()));
    }
    if let Some(raw) = root.attribute("version") {
        let revision: u32 = raw
            .trim()
            .parse()
            .map_err(|_| invalid(format!("version attribute '{raw}' is not a number")))?;
        document.insert("version".into(), Value::from(revision));
    }

    let mut dependencies = None;
    let mut rest = Vec::new();
    for child in root.children {
        if child.name == "dependencies" {
            dependencies = Some(
                child
                    .children
                    .iter()
                    .filter(|c| c.name == "dependency")
                    .map(dependency_from_node)
                    .collect(),
            );
        } else {
            rest.push(child);
        }
    }
    decode_children("bom", &rest, &mut document);

    let mut bom: Bom =
        serde_json::from_value(Value::Object(document)).map_err(|e| invalid(e.to_string()))?;
    bom.dependencies = dependencies;
    Ok(bom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        Affects, Aggregate, Annotation, Annotator, Component, ComponentType, Composition,
        DataFlow, DataFlowDirection, Hash, HashAlgorithm, LicenseChoice, OrganizationalEntity,
        Property, Rating, ScoreMethod, Service, ServiceData, ToolChoices, Vulnerability,
    };

    fn rich() -> Bom {
        let mut bom = Bom::new(SpecVersion::V1_6);
        bom.serial_number = Some("urn:uuid:3e671687-395b-41f5-a30f-a58921a69b79".into());
        bom.metadata_mut().component = Some(
            Component::new(ComponentType::Application, "app")
                .with_version("1.0")
                .with_bom_ref("app"),
        );
        bom.metadata_mut().tools = Some(ToolChoices::components(vec![Component::new(
            ComponentType::Application,
            "scanner",
        )
        .with_version("3")]));

        let mut lib = Component::new(ComponentType::Library, "lib & <co>")
            .with_version("2.0")
            .with_bom_ref("lib");
        lib.hashes = Some(vec![Hash::new(HashAlgorithm::Sha256, "abcdef")]);
        lib.licenses = Some(vec![
            LicenseChoice::id("MIT"),
            LicenseChoice::expression("Apache-2.0 OR MIT"),
        ]);
        lib.properties = Some(vec![Property::new("build", "release")]);
        lib.purl = Some("pkg:cargo/lib@2.0".into());
        lib.components = Some(vec![Component::new(ComponentType::File, "lib.rs")]);
        bom.components = Some(vec![lib]);

        let mut api = Service::new("api").with_bom_ref("api");
        api.endpoints = Some(vec!["https://api.example.com/v1".into()]);
        api.authenticated = Some(true);
        let mut named = DataFlow::classification(DataFlowDirection::Outbound, "public");
        named.name = Some("telemetry".into());
        api.data = Some(ServiceData::new(vec![
            DataFlow::classification(DataFlowDirection::Inbound, "PII"),
            named,
        ]));
        bom.services = Some(vec![api]);

        bom.dependencies = Some(vec![Dependency {
            dependencies: Some(vec![Dependency::with_depends_on("lib", ["api"])]),
            ..Dependency::new("app")
        }]);

        let mut composition = Composition::new(Aggregate::Complete);
        composition.assemblies = Some(vec!["lib".into()]);
        bom.compositions = Some(vec![composition]);

        let mut vuln = Vulnerability::new("CVE-2024-0001");
        vuln.bom_ref = Some("vuln-1".into());
        vuln.ratings = Some(vec![Rating {
            score: Some(9.8),
            severity: Some("critical".into()),
            method: Some(ScoreMethod::CvssV31),
            ..Rating::default()
        }]);
        vuln.cwes = Some(vec![79, 89]);
        vuln.affects = Some(vec![Affects::new("lib")]);
        bom.vulnerabilities = Some(vec![vuln]);

        bom.annotations = Some(vec![Annotation {
            subjects: vec!["lib".into()],
            annotator: Annotator {
                organization: Some(OrganizationalEntity::named("acme")),
                ..Annotator::default()
            },
            text: "reviewed".into(),
            ..Annotation::default()
        }]);
        bom
    }

    fn to_text(bom: &Bom, version: SpecVersion) -> String {
        let bytes = XmlCodec::default().serialize(bom, version).unwrap();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_write_and_read_back() {
        let codec = XmlCodec::default();
        let bytes = codec.serialize(&rich(), SpecVersion::V1_6).unwrap();
        let back = codec.deserialize(&bytes).unwrap();
        assert_eq!(back, rich());
    }

    #[test]
    fn test_layout() {
        let text = to_text(&rich(), SpecVersion::V1_6);
        assert!(text.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(text.contains("<bom xmlns=\"http://cyclonedx.org/schema/bom/1.6\""));
        assert!(text.contains("<component type=\"library\" bom-ref=\"lib\">"));
        assert!(text.contains("<hash alg=\"SHA-256\">abcdef</hash>"));
        assert!(text.contains("<property name=\"build\">release</property>"));
        assert!(text.contains("<assembly ref=\"lib\"/>"));
        assert!(text.contains("<subject ref=\"lib\"/>"));
        assert!(text.contains("lib &amp; &lt;co&gt;"));
        assert!(!text.contains("specVersion"));
        // metadata comes before components
        let metadata = text.find("<metadata>").unwrap();
        let components = text.find("<components>").unwrap();
        assert!(metadata < components);
    }

    #[test]
    fn test_nested_dependencies_survive() {
        let back = XmlCodec::default()
            .deserialize(&XmlCodec::compact().encode(&rich()).unwrap())
            .unwrap();
        let app = &back.dependencies.as_ref().unwrap()[0];
        let lib = &app.dependencies.as_ref().unwrap()[0];
        assert_eq!(lib.dep_ref, "lib");
        assert_eq!(lib.depends_on(), vec!["api"]);
    }

    #[test]
    fn test_service_data_shape_follows_version() {
        let modern = to_text(&rich(), SpecVersion::V1_6);
        assert!(modern.contains("<dataflow name=\"telemetry\">"));

        let legacy = to_text(&rich(), SpecVersion::V1_4);
        assert!(!legacy.contains("<dataflow"));
        assert!(legacy.contains("<classification flow=\"outbound\">public</classification>"));
    }

    #[test]
    fn test_legacy_version_round_trip() {
        let codec = XmlCodec::default();
        let bytes = codec.serialize(&rich(), SpecVersion::V1_1).unwrap();
        let text = String::from_utf8(bytes.clone()).unwrap();
        assert!(text.contains("http://cyclonedx.org/schema/bom/1.1"));
        assert!(!text.contains("<metadata>"));

        let back = codec.deserialize(&bytes).unwrap();
        assert_eq!(back.spec_version, SpecVersion::V1_1);
        assert!(back.metadata.is_none());
        assert_eq!(back.components.as_ref().map(Vec::len), Some(1));
    }

    #[test]
    fn test_read_handwritten_document() {
        let input = r#"<?xml version="1.0" encoding="UTF-8"?>
<cdx:bom xmlns:cdx="http://cyclonedx.org/schema/bom/1.4" version="3">
  <cdx:metadata>
    <cdx:tools>
      <cdx:tool><cdx:vendor>acme</cdx:vendor><cdx:name>scan</cdx:name></cdx:tool>
    </cdx:tools>
  </cdx:metadata>
  <cdx:components>
    <cdx:component type="library" bom-ref="pkg:a">
      <cdx:name>a</cdx:name>
      <cdx:version>1.0</cdx:version>
      <cdx:modified>false</cdx:modified>
      <cdx:licenses><cdx:license><cdx:name>Custom</cdx:name></cdx:license></cdx:licenses>
    </cdx:component>
  </cdx:components>
  <cdx:dependencies>
    <cdx:dependency ref="pkg:a"/>
  </cdx:dependencies>
</cdx:bom>"#;
        let bom = XmlCodec::default().deserialize(input.as_bytes()).unwrap();
        assert_eq!(bom.spec_version, SpecVersion::V1_4);
        assert_eq!(bom.version, Some(3));
        let tools = bom.metadata.as_ref().and_then(|m| m.tools.as_ref()).unwrap();
        assert_eq!(tools.tools.as_ref().unwrap()[0].vendor.as_deref(), Some("acme"));
        assert_eq!(tools.spec_version(), SpecVersion::V1_4);
        let component = &bom.components.as_ref().unwrap()[0];
        assert_eq!(component.modified, Some(false));
        let license = component.licenses.as_ref().unwrap()[0].license.as_ref().unwrap();
        assert_eq!(license.name.as_deref(), Some("Custom"));
        assert_eq!(bom.dependencies, Some(vec![Dependency::new("pkg:a")]));
    }

    #[test]
    fn test_empty_document() {
        let bom = Bom::new(SpecVersion::V1_3);
        let bytes = XmlCodec::compact().encode(&bom).unwrap();
        let back = XmlCodec::default().deserialize(&bytes).unwrap();
        assert_eq!(back, bom);
    }

    #[test]
    fn test_errors() {
        let codec = XmlCodec::default();

        let wrong_root = codec.decode(b"<sbom xmlns=\"http://cyclonedx.org/schema/bom/1.4\"/>");
        assert!(matches!(
            wrong_root.unwrap_err().serialization_kind(),
            Some(SerializationErrorKind::InvalidXml(_))
        ));

        let unknown = codec
            .decode(b"<bom xmlns=\"http://cyclonedx.org/schema/bom/9.9\"/>")
            .unwrap_err();
        assert!(matches!(
            unknown.serialization_kind(),
            Some(SerializationErrorKind::UnsupportedSpecVersion(_))
        ));

        assert!(codec.decode(b"<bom><components>").is_err());
        assert!(codec.decode(b"").is_err());
    }
}
