//! USA framework adapter
//!
//! The USA shape is a nested configuration object with four sections:
//! `metadata` (name, version, description, author, tags), `identity`
//! (role, goal, backstory, designation), `capabilities` (tools, memory)
//! and `execution` (llm, bindings). Keys starting with `_` are runtime
//! state and are dropped with a warning; unknown stable keys are preserved
//! as extensions under the USA namespace.

use serde_json::{json, Map, Value};

use chrysalis_core::errors::{ChrysalisError, Result};
use chrysalis_core::identifiers::{AgentId, FrameworkTag};
use chrysalis_core::model::namespaces::{ontology, rdf_type, USA_EXT};
use chrysalis_core::model::{
    CanonicalAgent, ExtensionProperty, GraphName, NativeAgent, Subject, Term,
};

use crate::adapter::{AgentAdapter, FieldMapping, ValidationIssue, ValidationReport};
use crate::builder::CanonicalBuilder;
use crate::fidelity::{FidelityScorer, FieldImportance};
use crate::graph::{linked_nodes, literal_of, node_type, objects_of, typed_literal_of};
use crate::paths::get_path;
use crate::restore::restore_all_by_source_path;
use crate::{EXTENSIONS_CARRY_KEY, SHADOW_KEY};

/// Framework tag served by this adapter
pub const USA_FRAMEWORK: &str = "usa";

const MEMORY_KINDS: [(&str, &str); 5] = [
    ("working", ontology::WORKING_MEMORY),
    ("episodic", ontology::EPISODIC_MEMORY),
    ("semantic", ontology::SEMANTIC_MEMORY),
    ("procedural", ontology::PROCEDURAL_MEMORY),
    ("core", ontology::CORE_MEMORY),
];

const BINDING_PROTOCOLS: [(&str, &str); 4] = [
    ("mcp", ontology::MCP_BINDING),
    ("a2a", ontology::A2A_BINDING),
    ("http", ontology::HTTP_BINDING),
    ("websocket", ontology::WEBSOCKET_BINDING),
];

/// Adapter for the USA configuration-object shape
#[derive(Debug, Default, Clone, Copy)]
pub struct UsaAdapter;

impl UsaAdapter {
    /// Create the adapter
    pub fn new() -> Self {
        Self
    }

    fn agent_id(document: &Value) -> Result<AgentId> {
        let name = get_path(document, "metadata.name")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                ChrysalisError::validation_at("agent name is required", "metadata.name")
            })?;
        Ok(AgentId::from_name(name))
    }

    fn translate_metadata(&self, builder: &mut CanonicalBuilder, agent: &Subject, section: &Map<String, Value>) -> Result<()> {
        for (key, value) in section {
            let path = format!("metadata.{}", key);
            match key.as_str() {
                "name" => builder.add_optional_literal(agent, ontology::NAME, Some(value), &path),
                "version" => {
                    builder.add_optional_literal(agent, ontology::VERSION, Some(value), &path)
                }
                "description" => {
                    builder.add_optional_literal(agent, ontology::DESCRIPTION, Some(value), &path)
                }
                "author" => {
                    builder.add_optional_literal(agent, ontology::AUTHOR, Some(value), &path)
                }
                "tags" => {
                    if let Some(tags) = value.as_array() {
                        builder.add_literal_array(agent, ontology::TAG, tags, &path);
                    }
                }
                _ => builder.add_extension(USA_EXT, path.clone(), value, path)?,
            }
        }
        Ok(())
    }

    fn translate_identity(&self, builder: &mut CanonicalBuilder, agent: &Subject, section: &Map<String, Value>) -> Result<()> {
        for (key, value) in section {
            let path = format!("identity.{}", key);
            match key.as_str() {
                "role" => builder.add_optional_literal(agent, ontology::ROLE, Some(value), &path),
                "goal" => builder.add_optional_literal(agent, ontology::GOAL, Some(value), &path),
                "backstory" => {
                    builder.add_optional_literal(agent, ontology::BACKSTORY, Some(value), &path)
                }
                "designation" => {
                    builder.add_optional_literal(agent, ontology::DESIGNATION, Some(value), &path)
                }
                _ => builder.add_extension(USA_EXT, path.clone(), value, path)?,
            }
        }
        Ok(())
    }

    fn translate_tools(&self, builder: &mut CanonicalBuilder, agent: &Subject, tools: &[Value]) -> Result<()> {
        for (index, tool) in tools.iter().enumerate() {
            let Some(tool_obj) = tool.as_object() else {
                builder.record_lost(
                    format!("capabilities.tools.{}", index),
                    "tool entry is not an object",
                );
                continue;
            };
            let node =
                builder.create_typed_blank_node(agent, ontology::HAS_TOOL, ontology::TOOL, "tool");
            for (key, value) in tool_obj {
                let path = format!("capabilities.tools.{}.{}", index, key);
                match key.as_str() {
                    "name" => builder.add_optional_literal(&node, ontology::NAME, Some(value), &path),
                    "description" => {
                        builder.add_optional_literal(&node, ontology::DESCRIPTION, Some(value), &path)
                    }
                    "parameters" => {
                        builder.add_json_literal(&node, ontology::PARAMETERS, value, &path)?
                    }
                    _ => builder.add_extension(USA_EXT, path.clone(), value, path)?,
                }
            }
        }
        Ok(())
    }

    fn translate_memory(&self, builder: &mut CanonicalBuilder, agent: &Subject, memory: &Map<String, Value>) -> Result<()> {
        for (kind, config) in memory {
            let path = format!("capabilities.memory.{}", kind);
            let Some(type_iri) = MEMORY_KINDS
                .iter()
                .find(|(name, _)| *name == kind.as_str())
                .map(|(_, iri)| *iri)
            else {
                builder.add_extension(USA_EXT, path.clone(), config, path)?;
                continue;
            };
            let node =
                builder.create_typed_blank_node(agent, ontology::HAS_MEMORY, type_iri, "memory");
            if let Some(config_obj) = config.as_object() {
                for (key, value) in config_obj {
                    let field_path = format!("{}.{}", path, key);
                    match key.as_str() {
                        "capacity" => builder.add_optional_literal(
                            &node,
                            ontology::CAPACITY,
                            Some(value),
                            &field_path,
                        ),
                        "persistent" => builder.add_optional_literal(
                            &node,
                            ontology::PERSISTENT,
                            Some(value),
                            &field_path,
                        ),
                        _ => builder.add_extension(USA_EXT, field_path.clone(), value, field_path)?,
                    }
                }
            }
        }
        Ok(())
    }

    fn translate_execution(&self, builder: &mut CanonicalBuilder, agent: &Subject, section: &Map<String, Value>) -> Result<()> {
        for (key, value) in section {
            match key.as_str() {
                "llm" => {
                    let Some(llm) = value.as_object() else {
                        builder.record_lost("execution.llm", "llm entry is not an object");
                        continue;
                    };
                    let node = builder.create_typed_blank_node(
                        agent,
                        ontology::HAS_LLM_CONFIG,
                        ontology::LLM_CONFIG,
                        "llm",
                    );
                    for (llm_key, llm_value) in llm {
                        let path = format!("execution.llm.{}", llm_key);
                        match llm_key.as_str() {
                            "provider" => builder.add_optional_literal(
                                &node,
                                ontology::PROVIDER,
                                Some(llm_value),
                                &path,
                            ),
                            "model" => builder.add_optional_literal(
                                &node,
                                ontology::MODEL,
                                Some(llm_value),
                                &path,
                            ),
                            "temperature" => builder.add_optional_literal(
                                &node,
                                ontology::TEMPERATURE,
                                Some(llm_value),
                                &path,
                            ),
                            "max_tokens" => builder.add_optional_literal(
                                &node,
                                ontology::MAX_TOKENS,
                                Some(llm_value),
                                &path,
                            ),
                            _ => builder.add_extension(USA_EXT, path.clone(), llm_value, path)?,
                        }
                    }
                }
                "bindings" => {
                    let Some(bindings) = value.as_array() else {
                        builder.record_lost("execution.bindings", "bindings is not an array");
                        continue;
                    };
                    for (index, binding) in bindings.iter().enumerate() {
                        self.translate_binding(builder, agent, index, binding)?;
                    }
                }
                _ => {
                    let path = format!("execution.{}", key);
                    builder.add_extension(USA_EXT, path.clone(), value, path)?;
                }
            }
        }
        Ok(())
    }

    fn translate_binding(&self, builder: &mut CanonicalBuilder, agent: &Subject, index: usize, binding: &Value) -> Result<()> {
        let path = format!("execution.bindings.{}", index);
        let protocol = get_path(binding, "protocol").and_then(Value::as_str);
        let Some(type_iri) = protocol.and_then(|p| {
            BINDING_PROTOCOLS
                .iter()
                .find(|(name, _)| *name == p)
                .map(|(_, iri)| *iri)
        }) else {
            // Unknown protocols survive as extensions rather than guessing a type
            builder.add_extension(USA_EXT, path.clone(), binding, path)?;
            return Ok(());
        };
        let node =
            builder.create_typed_blank_node(agent, ontology::HAS_BINDING, type_iri, "binding");
        builder.mark_mapped(format!("{}.protocol", path));
        if let Some(binding_obj) = binding.as_object() {
            for (key, value) in binding_obj {
                if key == "protocol" {
                    continue;
                }
                let field_path = format!("{}.{}", path, key);
                match key.as_str() {
                    "endpoint" => builder.add_optional_literal(
                        &node,
                        ontology::ENDPOINT,
                        Some(value),
                        &field_path,
                    ),
                    _ => builder.add_extension(USA_EXT, field_path.clone(), value, field_path)?,
                }
            }
        }
        Ok(())
    }

    fn rebuild_tools(canonical: &CanonicalAgent, agent: &Subject) -> Vec<Value> {
        let mut tools = Vec::new();
        for node in linked_nodes(canonical, agent, ontology::HAS_TOOL) {
            let mut tool = Map::new();
            if let Some(name) = literal_of(canonical, &node, ontology::NAME) {
                tool.insert("name".into(), json!(name));
            }
            if let Some(description) = literal_of(canonical, &node, ontology::DESCRIPTION) {
                tool.insert("description".into(), json!(description));
            }
            if let Some(parameters) = literal_of(canonical, &node, ontology::PARAMETERS) {
                if let Ok(parsed) = serde_json::from_str::<Value>(&parameters) {
                    tool.insert("parameters".into(), parsed);
                }
            }
            tools.push(Value::Object(tool));
        }
        tools
    }

    fn rebuild_memory(canonical: &CanonicalAgent, agent: &Subject) -> Map<String, Value> {
        let mut memory = Map::new();
        for node in linked_nodes(canonical, agent, ontology::HAS_MEMORY) {
            let Some(kind) = node_type(canonical, &node).and_then(|iri| {
                MEMORY_KINDS
                    .iter()
                    .find(|(_, type_iri)| *type_iri == iri)
                    .map(|(name, _)| *name)
            }) else {
                continue;
            };
            let mut config = Map::new();
            if let Some(capacity) = typed_literal_of(canonical, &node, ontology::CAPACITY) {
                config.insert("capacity".into(), capacity);
            }
            if let Some(persistent) = typed_literal_of(canonical, &node, ontology::PERSISTENT) {
                config.insert("persistent".into(), persistent);
            }
            memory.insert(kind.to_string(), Value::Object(config));
        }
        memory
    }

    fn rebuild_llm(canonical: &CanonicalAgent, agent: &Subject) -> Option<Map<String, Value>> {
        let node = linked_nodes(canonical, agent, ontology::HAS_LLM_CONFIG)
            .into_iter()
            .next()?;
        let mut llm = Map::new();
        if let Some(provider) = literal_of(canonical, &node, ontology::PROVIDER) {
            llm.insert("provider".into(), json!(provider));
        }
        if let Some(model) = literal_of(canonical, &node, ontology::MODEL) {
            llm.insert("model".into(), json!(model));
        }
        if let Some(temperature) = typed_literal_of(canonical, &node, ontology::TEMPERATURE) {
            llm.insert("temperature".into(), temperature);
        }
        if let Some(max_tokens) = typed_literal_of(canonical, &node, ontology::MAX_TOKENS) {
            llm.insert("max_tokens".into(), max_tokens);
        }
        Some(llm)
    }

    fn rebuild_bindings(canonical: &CanonicalAgent, agent: &Subject) -> Vec<Value> {
        let mut bindings = Vec::new();
        for node in linked_nodes(canonical, agent, ontology::HAS_BINDING) {
            let Some(protocol) = node_type(canonical, &node).and_then(|iri| {
                BINDING_PROTOCOLS
                    .iter()
                    .find(|(_, type_iri)| *type_iri == iri)
                    .map(|(name, _)| *name)
            }) else {
                continue;
            };
            let mut binding = Map::new();
            binding.insert("protocol".into(), json!(protocol));
            if let Some(endpoint) = literal_of(canonical, &node, ontology::ENDPOINT) {
                binding.insert("endpoint".into(), json!(endpoint));
            }
            bindings.push(Value::Object(binding));
        }
        bindings
    }
}

impl AgentAdapter for UsaAdapter {
    fn framework(&self) -> FrameworkTag {
        FrameworkTag::new(USA_FRAMEWORK)
    }

    fn name(&self) -> &'static str {
        "USA adapter"
    }

    fn version(&self) -> &'static str {
        "1.0.0"
    }

    fn extension_namespace(&self) -> &'static str {
        USA_EXT
    }

    fn validate_native(&self, native: &NativeAgent) -> ValidationReport {
        let mut report = ValidationReport::clean();
        let document = &native.document;

        let Some(root) = document.as_object() else {
            report.issues.push(ValidationIssue::error(
                "bad-type",
                "USA agent must be a JSON object",
                "",
            ));
            return report;
        };

        match get_path(document, "metadata.name") {
            Some(Value::String(name)) if !name.is_empty() => {}
            Some(Value::String(_)) => report.issues.push(ValidationIssue::error(
                "empty-field",
                "agent name must not be empty",
                "metadata.name",
            )),
            Some(_) => report.issues.push(ValidationIssue::error(
                "bad-type",
                "agent name must be a string",
                "metadata.name",
            )),
            None => report.issues.push(ValidationIssue::error(
                "missing-field",
                "agent name is required",
                "metadata.name",
            )),
        }

        if let Some(tags) = get_path(document, "metadata.tags") {
            if !tags.is_array() {
                report.issues.push(ValidationIssue::error(
                    "bad-type",
                    "tags must be an array",
                    "metadata.tags",
                ));
            }
        }

        if let Some(tools) = get_path(document, "capabilities.tools") {
            match tools.as_array() {
                Some(entries) => {
                    for (index, tool) in entries.iter().enumerate() {
                        if get_path(tool, "name").and_then(Value::as_str).is_none() {
                            report.issues.push(ValidationIssue::error(
                                "missing-field",
                                "tool name is required",
                                format!("capabilities.tools.{}.name", index),
                            ));
                        }
                    }
                }
                None => report.issues.push(ValidationIssue::error(
                    "bad-type",
                    "tools must be an array",
                    "capabilities.tools",
                )),
            }
        }

        if let Some(temperature) = get_path(document, "execution.llm.temperature") {
            match temperature.as_f64() {
                Some(t) if (0.0..=2.0).contains(&t) => {}
                Some(t) => report.issues.push(ValidationIssue::warning(
                    "out-of-range",
                    format!("temperature {} outside [0, 2]", t),
                    "execution.llm.temperature",
                )),
                None => report.issues.push(ValidationIssue::error(
                    "bad-type",
                    "temperature must be a number",
                    "execution.llm.temperature",
                )),
            }
        }

        if root.keys().any(|k| k == "identity") && get_path(document, "identity.role").is_none() {
            report.issues.push(ValidationIssue::warning(
                "missing-field",
                "identity without a role is unusual",
                "identity.role",
            ));
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
            .ok_or_else(|| ChrysalisError::translation("USA agent must be a JSON object"))?;

        for (key, value) in root {
            match key.as_str() {
                "metadata" => {
                    if let Some(section) = value.as_object() {
                        self.translate_metadata(&mut builder, &agent, section)?;
                    }
                }
                "identity" => {
                    if let Some(section) = value.as_object() {
                        self.translate_identity(&mut builder, &agent, section)?;
                    }
                }
                "capabilities" => {
                    if let Some(section) = value.as_object() {
                        for (cap_key, cap_value) in section {
                            match cap_key.as_str() {
                                "tools" => {
                                    if let Some(tools) = cap_value.as_array() {
                                        self.translate_tools(&mut builder, &agent, tools)?;
                                    }
                                }
                                "memory" => {
                                    if let Some(memory) = cap_value.as_object() {
                                        self.translate_memory(&mut builder, &agent, memory)?;
                                    }
                                }
                                _ => {
                                    let path = format!("capabilities.{}", cap_key);
                                    builder.add_extension(USA_EXT, path.clone(), cap_value, path)?;
                                }
                            }
                        }
                    }
                }
                "execution" => {
                    if let Some(section) = value.as_object() {
                        self.translate_execution(&mut builder, &agent, section)?;
                    }
                }
                EXTENSIONS_CARRY_KEY => {
                    // Foreign extensions riding through this framework
                    if let Ok(carried) =
                        serde_json::from_value::<Vec<ExtensionProperty>>(value.clone())
                    {
                        for extension in carried {
                            builder.carry_extension(extension);
                        }
                    }
                }
                SHADOW_KEY => {
                    // The embedded shadow is carrier state, not an agent field
                }
                _ if key.starts_with('_') => {
                    builder.record_lost(key.clone(), "runtime-only field");
                }
                _ => {
                    builder.add_extension(USA_EXT, key.clone(), value, key.clone())?;
                }
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

        let scalar_targets = [
            (ontology::NAME, "metadata.name"),
            (ontology::VERSION, "metadata.version"),
            (ontology::DESCRIPTION, "metadata.description"),
            (ontology::AUTHOR, "metadata.author"),
            (ontology::ROLE, "identity.role"),
            (ontology::GOAL, "identity.goal"),
            (ontology::BACKSTORY, "identity.backstory"),
            (ontology::DESIGNATION, "identity.designation"),
        ];
        for (predicate, path) in scalar_targets {
            if let Some(value) = literal_of(canonical, &agent, predicate) {
                crate::paths::set_path(&mut document, path, json!(value));
            }
        }

        let tags: Vec<Value> = objects_of(canonical, &agent, ontology::TAG)
            .into_iter()
            .filter_map(|t| t.as_literal().map(|l| json!(l.lexical.clone())))
            .collect();
        if !tags.is_empty() {
            crate::paths::set_path(&mut document, "metadata.tags", Value::Array(tags));
        }

        let tools = Self::rebuild_tools(canonical, &agent);
        if !tools.is_empty() {
            crate::paths::set_path(&mut document, "capabilities.tools", Value::Array(tools));
        }
        let memory = Self::rebuild_memory(canonical, &agent);
        if !memory.is_empty() {
            crate::paths::set_path(
                &mut document,
                "capabilities.memory",
                Value::Object(memory),
            );
        }
        if let Some(llm) = Self::rebuild_llm(canonical, &agent) {
            if !llm.is_empty() {
                crate::paths::set_path(&mut document, "execution.llm", Value::Object(llm));
            }
        }
        let bindings = Self::rebuild_bindings(canonical, &agent);
        if !bindings.is_empty() {
            crate::paths::set_path(
                &mut document,
                "execution.bindings",
                Value::Array(bindings),
            );
        }

        restore_all_by_source_path(&mut document, &canonical.extensions, USA_EXT);

        let foreign: Vec<&ExtensionProperty> = canonical
            .extensions
            .iter()
            .filter(|e| e.namespace != USA_EXT)
            .collect();
        if !foreign.is_empty() {
            crate::paths::set_path(
                &mut document,
                EXTENSIONS_CARRY_KEY,
                serde_json::to_value(&foreign)?,
            );
        }

        Ok(NativeAgent::new(self.framework(), document))
    }

    fn field_mappings(&self) -> Vec<FieldMapping> {
        vec![
            FieldMapping::new("metadata.name", ontology::NAME, FieldImportance::Core),
            FieldMapping::new("metadata.version", ontology::VERSION, FieldImportance::Peripheral),
            FieldMapping::new(
                "metadata.description",
                ontology::DESCRIPTION,
                FieldImportance::Peripheral,
            ),
            FieldMapping::new("metadata.author", ontology::AUTHOR, FieldImportance::Peripheral),
            FieldMapping::new("metadata.tags", ontology::TAG, FieldImportance::Peripheral),
            FieldMapping::new("identity.role", ontology::ROLE, FieldImportance::Core),
            FieldMapping::new("identity.goal", ontology::GOAL, FieldImportance::Core),
            FieldMapping::new(
                "identity.backstory",
                ontology::BACKSTORY,
                FieldImportance::Peripheral,
            ),
            FieldMapping::new(
                "identity.designation",
                ontology::DESIGNATION,
                FieldImportance::Standard,
            ),
            FieldMapping::new(
                "capabilities.tools",
                ontology::HAS_TOOL,
                FieldImportance::Standard,
            ),
            FieldMapping::new(
                "capabilities.memory",
                ontology::HAS_MEMORY,
                FieldImportance::Standard,
            ),
            FieldMapping::new(
                "execution.llm.provider",
                ontology::PROVIDER,
                FieldImportance::Core,
            ),
            FieldMapping::new("execution.llm.model", ontology::MODEL, FieldImportance::Core),
            FieldMapping::new(
                "execution.llm.temperature",
                ontology::TEMPERATURE,
                FieldImportance::Standard,
            ),
            FieldMapping::new(
                "execution.llm.max_tokens",
                ontology::MAX_TOKENS,
                FieldImportance::Standard,
            ),
            FieldMapping::new(
                "execution.bindings",
                ontology::HAS_BINDING,
                FieldImportance::Standard,
            ),
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

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_document() -> Value {
        json!({
            "metadata": {
                "name": "research-agent",
                "version": "1.2.0",
                "description": "Finds and summarizes sources",
                "tags": ["research", "web"],
                "icon": "robot.png"
            },
            "identity": {
                "role": "researcher",
                "goal": "surface trustworthy sources",
                "backstory": "trained on library science"
            },
            "capabilities": {
                "tools": [
                    {
                        "name": "web_search",
                        "description": "search the web",
                        "parameters": {"type": "object", "properties": {"query": {"type": "string"}}}
                    }
                ],
                "memory": {
                    "working": {"capacity": 10},
                    "episodic": {"persistent": true}
                }
            },
            "execution": {
                "llm": {
                    "provider": "openai",
                    "model": "gpt-4-turbo",
                    "temperature": 0.7,
                    "max_tokens": 4096
                },
                "bindings": [
                    {"protocol": "mcp", "endpoint": "stdio://local"}
                ]
            },
            "runtime_hints": {"retries": 3},
            "_session": {"last_run": "2026-01-01"}
        })
    }

    fn native() -> NativeAgent {
        NativeAgent::new("usa", sample_document())
    }

    #[test]
    fn validation_accepts_the_sample() {
        let report = UsaAdapter::new().validate_native(&native());
        assert!(report.is_valid(), "{:?}", report.issues);
    }

    #[test]
    fn validation_flags_missing_name_with_path() {
        let adapter = UsaAdapter::new();
        let report = adapter.validate_native(&NativeAgent::new(
            "usa",
            json!({"metadata": {"version": "1.0"}}),
        ));
        assert!(!report.is_valid());
        let error = report.errors().next().unwrap();
        assert_eq!(error.code, "missing-field");
        assert_eq!(error.field_path, "metadata.name");
    }

    #[test]
    fn to_canonical_maps_core_fields() {
        let canonical = UsaAdapter::new().to_canonical(&native()).unwrap();
        assert!(canonical.has_agent_type_quad());
        assert_eq!(canonical.literal_value(ontology::NAME), Some("research-agent"));
        assert_eq!(canonical.literal_value(ontology::ROLE), Some("researcher"));
        assert!(canonical
            .metadata
            .mapped_fields
            .contains(&"execution.llm.provider".to_string()));
    }

    #[test]
    fn unknown_fields_become_extensions() {
        let canonical = UsaAdapter::new().to_canonical(&native()).unwrap();
        assert!(canonical
            .metadata
            .unmapped_fields
            .contains(&"runtime_hints".to_string()));
        assert!(canonical
            .metadata
            .unmapped_fields
            .contains(&"metadata.icon".to_string()));
        let hint = canonical
            .extensions
            .iter()
            .find(|e| e.source_path == "runtime_hints")
            .unwrap();
        assert_eq!(hint.namespace, USA_EXT);
        assert_eq!(hint.json_value().unwrap(), json!({"retries": 3}));
    }

    #[test]
    fn runtime_fields_are_lost_with_warning() {
        let canonical = UsaAdapter::new().to_canonical(&native()).unwrap();
        assert!(canonical.metadata.lost_fields.contains(&"_session".to_string()));
        assert!(canonical
            .metadata
            .warnings
            .iter()
            .any(|w| w.contains("_session")));
    }

    #[test]
    fn round_trip_restores_mapped_and_unmapped_fields() {
        let adapter = UsaAdapter::new();
        let canonical = adapter.to_canonical(&native()).unwrap();
        let rebuilt = adapter.from_canonical(&canonical).unwrap();

        for path in [
            "metadata.name",
            "metadata.version",
            "metadata.description",
            "metadata.tags",
            "metadata.icon",
            "identity.role",
            "identity.goal",
            "identity.backstory",
            "capabilities.tools.0.name",
            "capabilities.tools.0.parameters",
            "capabilities.memory.working.capacity",
            "capabilities.memory.episodic.persistent",
            "execution.llm.provider",
            "execution.llm.model",
            "execution.llm.temperature",
            "execution.llm.max_tokens",
            "execution.bindings.0.protocol",
            "execution.bindings.0.endpoint",
            "runtime_hints",
        ] {
            assert_eq!(
                get_path(&rebuilt.document, path),
                get_path(&sample_document(), path),
                "path {} did not survive the round trip",
                path
            );
        }
    }

    #[test]
    fn fidelity_is_high_for_the_sample() {
        let canonical = UsaAdapter::new().to_canonical(&native()).unwrap();
        assert!(
            canonical.metadata.fidelity_score >= 0.9,
            "score {}",
            canonical.metadata.fidelity_score
        );
    }

    #[test]
    fn nonmappable_lists_extension_and_lost_values() {
        let nonmappable = UsaAdapter::new().nonmappable(&native()).unwrap();
        assert!(nonmappable.contains_key("runtime_hints"));
        assert!(nonmappable.contains_key("_session"));
        assert!(!nonmappable.contains_key("metadata.name"));
    }
}
