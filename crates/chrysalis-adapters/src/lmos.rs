//! LMOS framework adapter
//!
//! The LMOS shape is a JSON-LD "Thing" description: `@context`/`@type`
//! headers, a `title`, an `actions` map keyed by action name, Thing-level
//! `forms` for protocol endpoints, `securityDefinitions`, and
//! `lmos:`-prefixed keys for role, goal, and model configuration. JSON-LD
//! machinery the ontology does not model (`@context`, security, links) is
//! preserved under the LMOS extension namespace.

use serde_json::{json, Map, Value};

use chrysalis_core::errors::{ChrysalisError, Result};
use chrysalis_core::identifiers::{AgentId, FrameworkTag};
use chrysalis_core::model::namespaces::{ontology, rdf_type, LMOS_EXT};
use chrysalis_core::model::{
    CanonicalAgent, ExtensionProperty, GraphName, NativeAgent, Subject, Term,
};

use crate::adapter::{AgentAdapter, FieldMapping, ValidationIssue, ValidationReport};
use crate::builder::CanonicalBuilder;
use crate::fidelity::{FidelityScorer, FieldImportance};
use crate::graph::{linked_nodes, literal_of, node_type, typed_literal_of};
use crate::paths::{get_path, set_path};
use crate::restore::{restore_all_by_source_path, restore_extension};
use crate::{EXTENSIONS_CARRY_KEY, SHADOW_KEY};

/// Framework tag served by this adapter
pub const LMOS_FRAMEWORK: &str = "lmos";

/// Default JSON-LD context emitted when the source carried none
pub const DEFAULT_CONTEXT: &str = "https://eclipse.dev/lmos/context.jsonld";

const FORM_SUBPROTOCOLS: [(&str, &str); 3] = [
    ("mcp", ontology::MCP_BINDING),
    ("a2a", ontology::A2A_BINDING),
    ("websocket", ontology::WEBSOCKET_BINDING),
];

/// Adapter for the LMOS JSON-LD Thing shape
#[derive(Debug, Default, Clone, Copy)]
pub struct LmosAdapter;

impl LmosAdapter {
    /// Create the adapter
    pub fn new() -> Self {
        Self
    }

    fn agent_id(document: &Value) -> Result<AgentId> {
        let title = get_path(document, "title")
            .and_then(Value::as_str)
            .ok_or_else(|| ChrysalisError::validation_at("agent title is required", "title"))?;
        Ok(AgentId::from_name(title))
    }

    fn translate_actions(
        &self,
        builder: &mut CanonicalBuilder,
        agent: &Subject,
        actions: &Map<String, Value>,
    ) -> Result<()> {
        for (action_name, action) in actions {
            let base = format!("actions.{}", action_name);
            let node =
                builder.create_typed_blank_node(agent, ontology::HAS_TOOL, ontology::TOOL, "action");
            // The map key is the tool's name
            builder.add_quad(node.clone(), ontology::NAME, Term::literal(action_name.clone()));
            builder.mark_mapped(base.clone());

            let Some(action_obj) = action.as_object() else {
                continue;
            };
            for (key, value) in action_obj {
                let path = format!("{}.{}", base, key);
                match key.as_str() {
                    "description" => {
                        builder.add_optional_literal(&node, ontology::DESCRIPTION, Some(value), &path)
                    }
                    "input" => builder.add_json_literal(&node, ontology::PARAMETERS, value, &path)?,
                    _ => builder.add_extension(LMOS_EXT, path.clone(), value, path)?,
                }
            }
        }
        Ok(())
    }

    fn translate_forms(
        &self,
        builder: &mut CanonicalBuilder,
        agent: &Subject,
        forms: &[Value],
    ) -> Result<()> {
        for (index, form) in forms.iter().enumerate() {
            let base = format!("forms.{}", index);
            let Some(form_obj) = form.as_object() else {
                builder.record_lost(base, "form entry is not an object");
                continue;
            };
            let subprotocol = form_obj.get("subprotocol").and_then(Value::as_str);
            let type_iri = subprotocol
                .and_then(|p| {
                    FORM_SUBPROTOCOLS
                        .iter()
                        .find(|(name, _)| *name == p)
                        .map(|(_, iri)| *iri)
                })
                .unwrap_or(ontology::HTTP_BINDING);

            let node =
                builder.create_typed_blank_node(agent, ontology::HAS_BINDING, type_iri, "form");
            if subprotocol.is_some() {
                builder.mark_mapped(format!("{}.subprotocol", base));
            }
            for (key, value) in form_obj {
                let path = format!("{}.{}", base, key);
                match key.as_str() {
                    "href" => {
                        builder.add_optional_literal(&node, ontology::ENDPOINT, Some(value), &path)
                    }
                    "subprotocol" => {}
                    _ => builder.add_extension(LMOS_EXT, path.clone(), value, path)?,
                }
            }
        }
        Ok(())
    }

    fn translate_model(
        &self,
        builder: &mut CanonicalBuilder,
        agent: &Subject,
        model: &Map<String, Value>,
    ) -> Result<()> {
        let node = builder.create_typed_blank_node(
            agent,
            ontology::HAS_LLM_CONFIG,
            ontology::LLM_CONFIG,
            "llm",
        );
        for (key, value) in model {
            let path = format!("lmos:model.{}", key);
            match key.as_str() {
                "provider" => {
                    builder.add_optional_literal(&node, ontology::PROVIDER, Some(value), &path)
                }
                "name" => builder.add_optional_literal(&node, ontology::MODEL, Some(value), &path),
                "temperature" => {
                    builder.add_optional_literal(&node, ontology::TEMPERATURE, Some(value), &path)
                }
                "maxTokens" => {
                    builder.add_optional_literal(&node, ontology::MAX_TOKENS, Some(value), &path)
                }
                _ => builder.add_extension(LMOS_EXT, path.clone(), value, path)?,
            }
        }
        Ok(())
    }

    fn rebuild_actions(canonical: &CanonicalAgent, agent: &Subject) -> Map<String, Value> {
        let mut actions = Map::new();
        for node in linked_nodes(canonical, agent, ontology::HAS_TOOL) {
            let Some(name) = literal_of(canonical, &node, ontology::NAME) else {
                continue;
            };
            let mut action = Map::new();
            if let Some(description) = literal_of(canonical, &node, ontology::DESCRIPTION) {
                action.insert("description".into(), json!(description));
            }
            if let Some(parameters) = literal_of(canonical, &node, ontology::PARAMETERS) {
                if let Ok(parsed) = serde_json::from_str::<Value>(&parameters) {
                    action.insert("input".into(), parsed);
                }
            }
            actions.insert(name, Value::Object(action));
        }
        actions
    }

    fn rebuild_forms(canonical: &CanonicalAgent, agent: &Subject) -> Vec<Value> {
        let mut forms = Vec::new();
        for node in linked_nodes(canonical, agent, ontology::HAS_BINDING) {
            let mut form = Map::new();
            if let Some(endpoint) = literal_of(canonical, &node, ontology::ENDPOINT) {
                form.insert("href".into(), json!(endpoint));
            }
            if let Some(subprotocol) = node_type(canonical, &node).and_then(|iri| {
                FORM_SUBPROTOCOLS
                    .iter()
                    .find(|(_, type_iri)| *type_iri == iri)
                    .map(|(name, _)| *name)
            }) {
                form.insert("subprotocol".into(), json!(subprotocol));
            }
            if !form.is_empty() {
                forms.push(Value::Object(form));
            }
        }
        forms
    }

    fn rebuild_model(canonical: &CanonicalAgent, agent: &Subject) -> Option<Map<String, Value>> {
        let node = linked_nodes(canonical, agent, ontology::HAS_LLM_CONFIG)
            .into_iter()
            .next()?;
        let mut model = Map::new();
        if let Some(provider) = literal_of(canonical, &node, ontology::PROVIDER) {
            model.insert("provider".into(), json!(provider));
        }
        if let Some(name) = literal_of(canonical, &node, ontology::MODEL) {
            model.insert("name".into(), json!(name));
        }
        if let Some(temperature) = typed_literal_of(canonical, &node, ontology::TEMPERATURE) {
            model.insert("temperature".into(), temperature);
        }
        if let Some(max_tokens) = typed_literal_of(canonical, &node, ontology::MAX_TOKENS) {
            model.insert("maxTokens".into(), max_tokens);
        }
        Some(model)
    }
}

impl AgentAdapter for LmosAdapter {
    fn framework(&self) -> FrameworkTag {
        FrameworkTag::new(LMOS_FRAMEWORK)
    }

    fn name(&self) -> &'static str {
        "LMOS adapter"
    }

    fn version(&self) -> &'static str {
        "1.0.0"
    }

    fn extension_namespace(&self) -> &'static str {
        LMOS_EXT
    }

    fn validate_native(&self, native: &NativeAgent) -> ValidationReport {
        let mut report = ValidationReport::clean();
        let document = &native.document;

        if !document.is_object() {
            report.issues.push(ValidationIssue::error(
                "bad-type",
                "LMOS agent must be a JSON object",
                "",
            ));
            return report;
        }

        match get_path(document, "@type").and_then(Value::as_str) {
            Some("Agent") => {}
            Some(other) => report.issues.push(ValidationIssue::error(
                "bad-type",
                format!("@type must be 'Agent', got '{}'", other),
                "@type",
            )),
            None => report.issues.push(ValidationIssue::warning(
                "missing-field",
                "@type is missing; assuming 'Agent'",
                "@type",
            )),
        }

        match get_path(document, "title") {
            Some(Value::String(title)) if !title.is_empty() => {}
            Some(_) => report.issues.push(ValidationIssue::error(
                "bad-type",
                "title must be a non-empty string",
                "title",
            )),
            None => report.issues.push(ValidationIssue::error(
                "missing-field",
                "title is required",
                "title",
            )),
        }

        if let Some(actions) = get_path(document, "actions") {
            match actions.as_object() {
                Some(entries) => {
                    for (name, action) in entries {
                        if !action.is_object() {
                            report.issues.push(ValidationIssue::error(
                                "bad-type",
                                "action must be an object",
                                format!("actions.{}", name),
                            ));
                        }
                    }
                }
                None => report.issues.push(ValidationIssue::error(
                    "bad-type",
                    "actions must be an object keyed by action name",
                    "actions",
                )),
            }
        }

        if let Some(temperature) = get_path(document, "lmos:model.temperature") {
            if temperature.as_f64().is_none() {
                report.issues.push(ValidationIssue::error(
                    "bad-type",
                    "temperature must be a number",
                    "lmos:model.temperature",
                ));
            }
        }

        report
    }

    fn to_canonical(&self, native: &NativeAgent) -> Result<CanonicalAgent> {
        let document = &native.document;
        let id = Self::agent_id(document)?;
        let mut canonical = CanonicalAgent::new(id, self.framework());
        let agent = Subject::named(canonical.uri.clone());

        let mut builder = CanonicalBuilder::new();
        builder.add_quad(agent.clone(), rdf_type(), Term::named(ontology::AGENT));

        let root = document
            .as_object()
            .ok_or_else(|| ChrysalisError::translation("LMOS agent must be a JSON object"))?;

        for (key, value) in root {
            match key.as_str() {
                "@type" => {
                    // Carried by the rdf:type quad emitted above
                    builder.mark_mapped("@type");
                }
                "title" => builder.add_optional_literal(&agent, ontology::NAME, Some(value), "title"),
                "description" => builder.add_optional_literal(
                    &agent,
                    ontology::DESCRIPTION,
                    Some(value),
                    "description",
                ),
                "id" => {
                    // Ids in the chrysalis urn namespace were generated by a
                    // prior translation, not authored in this framework
                    if value
                        .as_str()
                        .is_some_and(|s| s.starts_with("urn:chrysalis:agent:"))
                    {
                        builder.mark_mapped("id");
                    } else {
                        builder.add_optional_literal(&agent, ontology::DESIGNATION, Some(value), "id");
                    }
                }
                "version" => {
                    if let Some(instance) = get_path(value, "instance") {
                        builder.add_optional_literal(
                            &agent,
                            ontology::VERSION,
                            Some(instance),
                            "version.instance",
                        );
                    }
                    if let Some(version_obj) = value.as_object() {
                        for (vk, vv) in version_obj.iter().filter(|(vk, _)| *vk != "instance") {
                            let path = format!("version.{}", vk);
                            builder.add_extension(LMOS_EXT, path.clone(), vv, path)?;
                        }
                    }
                }
                "lmos:role" => {
                    builder.add_optional_literal(&agent, ontology::ROLE, Some(value), "lmos:role")
                }
                "lmos:goal" => {
                    builder.add_optional_literal(&agent, ontology::GOAL, Some(value), "lmos:goal")
                }
                "lmos:model" => {
                    if let Some(model) = value.as_object() {
                        self.translate_model(&mut builder, &agent, model)?;
                    }
                }
                "actions" => {
                    if let Some(actions) = value.as_object() {
                        self.translate_actions(&mut builder, &agent, actions)?;
                    }
                }
                "forms" => {
                    if let Some(forms) = value.as_array() {
                        self.translate_forms(&mut builder, &agent, forms)?;
                    }
                }
                EXTENSIONS_CARRY_KEY => {
                    if let Ok(carried) =
                        serde_json::from_value::<Vec<ExtensionProperty>>(value.clone())
                    {
                        for extension in carried {
                            builder.carry_extension(extension);
                        }
                    }
                }
                SHADOW_KEY => {}
                _ if key.starts_with('_') => {
                    builder.record_lost(key.clone(), "runtime-only field");
                }
                // @context, securityDefinitions, security, links, created and
                // anything else ride as extensions
                _ => builder.add_extension(LMOS_EXT, key.clone(), value, key.clone())?,
            }
        }

        let scorer = FidelityScorer::from_mappings(&self.field_mappings());
        let (quads, extensions, metadata) = builder.finish(&scorer, GraphName::Default);
        canonical.quads = quads;
        canonical.extensions = extensions;
        canonical.metadata = metadata;
        canonical.validate()?;
        Ok(canonical)
    }

    fn from_canonical(&self, canonical: &CanonicalAgent) -> Result<NativeAgent> {
        let agent = Subject::named(canonical.uri.clone());
        let mut document = json!({});

        let context = restore_extension(
            &canonical.extensions,
            LMOS_EXT,
            "@context",
            Some(json!(DEFAULT_CONTEXT)),
        )
        .unwrap_or_else(|| json!(DEFAULT_CONTEXT));
        set_path(&mut document, "@context", context);
        set_path(&mut document, "@type", json!("Agent"));

        let id = literal_of(canonical, &agent, ontology::DESIGNATION)
            .unwrap_or_else(|| format!("urn:chrysalis:agent:{}", canonical.id));
        set_path(&mut document, "id", json!(id));

        if let Some(title) = literal_of(canonical, &agent, ontology::NAME) {
            set_path(&mut document, "title", json!(title));
        }
        if let Some(description) = literal_of(canonical, &agent, ontology::DESCRIPTION) {
            set_path(&mut document, "description", json!(description));
        }
        if let Some(version) = literal_of(canonical, &agent, ontology::VERSION) {
            set_path(&mut document, "version.instance", json!(version));
        }
        if let Some(role) = literal_of(canonical, &agent, ontology::ROLE) {
            set_path(&mut document, "lmos:role", json!(role));
        }
        if let Some(goal) = literal_of(canonical, &agent, ontology::GOAL) {
            set_path(&mut document, "lmos:goal", json!(goal));
        }
        if let Some(model) = Self::rebuild_model(canonical, &agent) {
            if !model.is_empty() {
                set_path(&mut document, "lmos:model", Value::Object(model));
            }
        }

        let actions = Self::rebuild_actions(canonical, &agent);
        if !actions.is_empty() {
            set_path(&mut document, "actions", Value::Object(actions));
        }
        let forms = Self::rebuild_forms(canonical, &agent);
        if !forms.is_empty() {
            set_path(&mut document, "forms", Value::Array(forms));
        }

        restore_all_by_source_path(&mut document, &canonical.extensions, LMOS_EXT);

        let foreign: Vec<&ExtensionProperty> = canonical
            .extensions
            .iter()
            .filter(|e| e.namespace != LMOS_EXT)
            .collect();
        if !foreign.is_empty() {
            set_path(
                &mut document,
                EXTENSIONS_CARRY_KEY,
                serde_json::to_value(&foreign)?,
            );
        }

        Ok(NativeAgent::new(self.framework(), document))
    }

    fn field_mappings(&self) -> Vec<FieldMapping> {
        vec![
            FieldMapping::new("title", ontology::NAME, FieldImportance::Core),
            FieldMapping::new("description", ontology::DESCRIPTION, FieldImportance::Peripheral),
            FieldMapping::new("version.instance", ontology::VERSION, FieldImportance::Peripheral),
            FieldMapping::new("id", ontology::DESIGNATION, FieldImportance::Standard),
            FieldMapping::new("@type", rdf_type(), FieldImportance::Peripheral),
            FieldMapping::new("lmos:role", ontology::ROLE, FieldImportance::Core),
            FieldMapping::new("lmos:goal", ontology::GOAL, FieldImportance::Core),
            FieldMapping::new("lmos:model.provider", ontology::PROVIDER, FieldImportance::Core),
            FieldMapping::new("lmos:model.name", ontology::MODEL, FieldImportance::Core),
            FieldMapping::new(
                "lmos:model.temperature",
                ontology::TEMPERATURE,
                FieldImportance::Standard,
            ),
            FieldMapping::new(
                "lmos:model.maxTokens",
                ontology::MAX_TOKENS,
                FieldImportance::Standard,
            ),
            FieldMapping::new("actions", ontology::HAS_TOOL, FieldImportance::Standard),
            FieldMapping::new("forms", ontology::HAS_BINDING, FieldImportance::Standard),
        ]
    }

    fn nonmappable(&self, native: &NativeAgent) -> Result<Map<String, Value>> {
        let canonical = self.to_canonical(native)?;
        let mut out = Map::new();
        for path in canonical
            .metadata
            .unmapped_fields
            .iter()
            .chain(canonical.metadata.lost_fields.iter())
        {
            if let Some(value) = get_path(&native.document, path) {
                out.insert(path.clone(), value.clone());
            }
        }
        Ok(out)
    }
}
