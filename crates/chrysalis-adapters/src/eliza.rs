//! ElizaOS framework adapter
//!
//! The ElizaOS shape is a character file: a flat JSON object with `name`,
//! a `system` prompt, array-valued `bio`, `lore`, and `topics`, a
//! `modelProvider` string, and a `settings` object carrying the model
//! name and sampling options. Conversation material (message and post
//! examples, style guides, knowledge) has no ontology counterpart and is
//! preserved as extensions, which keeps the fidelity of a character file
//! well below that of a configuration-oriented framework.

use serde_json::{json, Map, Value};

use chrysalis_core::errors::{ChrysalisError, Result};
use chrysalis_core::identifiers::{AgentId, FrameworkTag};
use chrysalis_core::model::namespaces::{ontology, rdf_type, ELIZA_EXT};
use chrysalis_core::model::{
    CanonicalAgent, ExtensionProperty, GraphName, NativeAgent, Subject, Term,
};

use crate::adapter::{AgentAdapter, FieldMapping, ValidationIssue, ValidationReport};
use crate::builder::CanonicalBuilder;
use crate::fidelity::{FidelityScorer, FieldImportance};
use crate::graph::{linked_nodes, literal_of, objects_of, typed_literal_of};
use crate::paths::{get_path, set_path};
use crate::restore::restore_all_by_source_path;
use crate::{EXTENSIONS_CARRY_KEY, SHADOW_KEY};

/// Framework tag served by this adapter
pub const ELIZA_FRAMEWORK: &str = "elizaos";

/// Adapter for the ElizaOS character-file shape
#[derive(Debug, Default, Clone, Copy)]
pub struct ElizaAdapter;

impl ElizaAdapter {
    /// Create the adapter
    pub fn new() -> Self {
        Self
    }

    fn agent_id(document: &Value) -> Result<AgentId> {
        let name = get_path(document, "name")
            .and_then(Value::as_str)
            .ok_or_else(|| ChrysalisError::validation_at("character name is required", "name"))?;
        Ok(AgentId::from_name(name))
    }

    fn translate_settings(
        &self,
        builder: &mut CanonicalBuilder,
        agent: &Subject,
        settings: &Map<String, Value>,
        provider: Option<&Value>,
    ) -> Result<()> {
        let node = builder.create_typed_blank_node(
            agent,
            ontology::HAS_LLM_CONFIG,
            ontology::LLM_CONFIG,
            "llm",
        );
        builder.add_optional_literal(&node, ontology::PROVIDER, provider, "modelProvider");
        for (key, value) in settings {
            let path = format!("settings.{}", key);
            match key.as_str() {
                "model" => builder.add_optional_literal(&node, ontology::MODEL, Some(value), &path),
                "temperature" => {
                    builder.add_optional_literal(&node, ontology::TEMPERATURE, Some(value), &path)
                }
                "maxTokens" => {
                    builder.add_optional_literal(&node, ontology::MAX_TOKENS, Some(value), &path)
                }
                _ => builder.add_extension(ELIZA_EXT, path.clone(), value, path)?,
            }
        }
        Ok(())
    }

    fn literal_array(canonical: &CanonicalAgent, agent: &Subject, predicate: &str) -> Vec<Value> {
        objects_of(canonical, agent, predicate)
            .into_iter()
            .filter_map(|t| t.as_literal().map(|l| json!(l.lexical.clone())))
            .collect()
    }
}

impl AgentAdapter for ElizaAdapter {
    fn framework(&self) -> FrameworkTag {
        FrameworkTag::new(ELIZA_FRAMEWORK)
    }

    fn name(&self) -> &'static str {
        "ElizaOS adapter"
    }

    fn version(&self) -> &'static str {
        "1.0.0"
    }

    fn extension_namespace(&self) -> &'static str {
        ELIZA_EXT
    }

    fn validate_native(&self, native: &NativeAgent) -> ValidationReport {
        let mut report = ValidationReport::clean();
        let document = &native.document;

        if !document.is_object() {
            report.issues.push(ValidationIssue::error(
                "bad-type",
                "character file must be a JSON object",
                "",
            ));
            return report;
        }

        match get_path(document, "name") {
            Some(Value::String(name)) if !name.is_empty() => {}
            Some(_) => report.issues.push(ValidationIssue::error(
                "bad-type",
                "character name must be a non-empty string",
                "name",
            )),
            None => report.issues.push(ValidationIssue::error(
                "missing-field",
                "character name is required",
                "name",
            )),
        }

        for array_field in ["bio", "lore", "topics", "adjectives", "clients", "plugins"] {
            if let Some(value) = get_path(document, array_field) {
                if !value.is_array() {
                    report.issues.push(ValidationIssue::error(
                        "bad-type",
                        format!("{} must be an array", array_field),
                        array_field,
                    ));
                }
            }
        }

        if let Some(provider) = get_path(document, "modelProvider") {
            if !provider.is_string() {
                report.issues.push(ValidationIssue::error(
                    "bad-type",
                    "modelProvider must be a string",
                    "modelProvider",
                ));
            }
        }

        if get_path(document, "system").is_none() {
            report.issues.push(ValidationIssue::warning(
                "missing-field",
                "character has no system prompt",
                "system",
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
            .ok_or_else(|| ChrysalisError::translation("character file must be a JSON object"))?;

        let provider = root.get("modelProvider");
        let mut settings_done = false;

        for (key, value) in root {
            match key.as_str() {
                "name" => builder.add_optional_literal(&agent, ontology::NAME, Some(value), "name"),
                "system" => {
                    builder.add_optional_literal(&agent, ontology::GOAL, Some(value), "system")
                }
                "bio" => {
                    if let Some(lines) = value.as_array() {
                        builder.add_literal_array(&agent, ontology::DESCRIPTION, lines, "bio");
                    }
                }
                "lore" => {
                    if let Some(lines) = value.as_array() {
                        builder.add_literal_array(&agent, ontology::BACKSTORY, lines, "lore");
                    }
                }
                "topics" => {
                    if let Some(topics) = value.as_array() {
                        builder.add_literal_array(&agent, ontology::TAG, topics, "topics");
                    }
                }
                "modelProvider" => {
                    // Mapped onto the LLM config node together with settings
                    if !settings_done && !root.contains_key("settings") {
                        self.translate_settings(&mut builder, &agent, &Map::new(), provider)?;
                        settings_done = true;
                    }
                }
                "settings" => {
                    if let Some(settings) = value.as_object() {
                        self.translate_settings(&mut builder, &agent, settings, provider)?;
                        settings_done = true;
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
                // username, adjectives, knowledge, clients, plugins, style,
                // messageExamples, postExamples and the rest of the
                // character's conversational surface
                _ => builder.add_extension(ELIZA_EXT, key.clone(), value, key.clone())?,
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

        if let Some(name) = literal_of(canonical, &agent, ontology::NAME) {
            set_path(&mut document, "name", json!(name));
        }
        if let Some(system) = literal_of(canonical, &agent, ontology::GOAL) {
            set_path(&mut document, "system", json!(system));
        }

        for (predicate, field) in [
            (ontology::DESCRIPTION, "bio"),
            (ontology::BACKSTORY, "lore"),
            (ontology::TAG, "topics"),
        ] {
            let lines = Self::literal_array(canonical, &agent, predicate);
            if !lines.is_empty() {
                set_path(&mut document, field, Value::Array(lines));
            }
        }

        if let Some(node) = linked_nodes(canonical, &agent, ontology::HAS_LLM_CONFIG)
            .into_iter()
            .next()
        {
            if let Some(provider) = literal_of(canonical, &node, ontology::PROVIDER) {
                set_path(&mut document, "modelProvider", json!(provider));
            }
            let mut settings = Map::new();
            if let Some(model) = literal_of(canonical, &node, ontology::MODEL) {
                settings.insert("model".into(), json!(model));
            }
            if let Some(temperature) = typed_literal_of(canonical, &node, ontology::TEMPERATURE) {
                settings.insert("temperature".into(), temperature);
            }
            if let Some(max_tokens) = typed_literal_of(canonical, &node, ontology::MAX_TOKENS) {
                settings.insert("maxTokens".into(), max_tokens);
            }
            if !settings.is_empty() {
                set_path(&mut document, "settings", Value::Object(settings));
            }
        }

        restore_all_by_source_path(&mut document, &canonical.extensions, ELIZA_EXT);

        let foreign: Vec<&ExtensionProperty> = canonical
            .extensions
            .iter()
            .filter(|e| e.namespace != ELIZA_EXT)
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
            FieldMapping::new("name", ontology::NAME, FieldImportance::Core),
            FieldMapping::new("system", ontology::GOAL, FieldImportance::Core),
            FieldMapping::new("bio", ontology::DESCRIPTION, FieldImportance::Peripheral),
            FieldMapping::new("lore", ontology::BACKSTORY, FieldImportance::Peripheral),
            FieldMapping::new("topics", ontology::TAG, FieldImportance::Peripheral),
            FieldMapping::new("modelProvider", ontology::PROVIDER, FieldImportance::Core),
            FieldMapping::new("settings.model", ontology::MODEL, FieldImportance::Core),
            FieldMapping::new(
                "settings.temperature",
                ontology::TEMPERATURE,
                FieldImportance::Standard,
            ),
            FieldMapping::new(
                "settings.maxTokens",
                ontology::MAX_TOKENS,
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
            "name": "sage",
            "username": "sage_bot",
            "system": "Answer with calm, sourced reasoning.",
            "bio": ["A patient explainer.", "Prefers primary sources."],
            "lore": ["Raised in a library."],
            "topics": ["history", "philosophy"],
            "adjectives": ["calm", "curious"],
            "clients": ["discord"],
            "plugins": ["@elizaos/plugin-web-search"],
            "modelProvider": "anthropic",
            "settings": {
                "model": "claude-sonnet",
                "temperature": 0.4,
                "voice": {"model": "en_US-neutral"}
            },
            "style": {"all": ["cite sources"], "chat": [], "post": []},
            "messageExamples": [[{"user": "u", "content": {"text": "hi"}}]]
        })
    }

    fn native() -> NativeAgent {
        NativeAgent::new("elizaos", sample_document())
    }

    #[test]
    fn validation_accepts_the_sample() {
        let report = ElizaAdapter::new().validate_native(&native());
        assert!(report.is_valid(), "{:?}", report.issues);
    }

    #[test]
    fn validation_flags_missing_name() {
        let report = ElizaAdapter::new()
            .validate_native(&NativeAgent::new("elizaos", json!({"bio": []})));
        assert!(!report.is_valid());
        assert_eq!(report.errors().next().unwrap().field_path, "name");
    }

    #[test]
    fn core_identity_maps_to_the_ontology() {
        let canonical = ElizaAdapter::new().to_canonical(&native()).unwrap();
        assert_eq!(canonical.literal_value(ontology::NAME), Some("sage"));
        assert_eq!(
            canonical.literal_value(ontology::GOAL),
            Some("Answer with calm, sourced reasoning.")
        );
        assert!(canonical.metadata.mapped_fields.contains(&"modelProvider".to_string()));
        assert!(canonical.metadata.mapped_fields.contains(&"settings.model".to_string()));
    }

    #[test]
    fn conversational_surface_is_preserved_as_extensions() {
        let canonical = ElizaAdapter::new().to_canonical(&native()).unwrap();
        for path in ["username", "adjectives", "clients", "plugins", "style", "messageExamples"] {
            assert!(
                canonical.metadata.unmapped_fields.contains(&path.to_string()),
                "{} should be an extension",
                path
            );
        }
    }

    #[test]
    fn round_trip_restores_the_character() {
        let adapter = ElizaAdapter::new();
        let canonical = adapter.to_canonical(&native()).unwrap();
        let rebuilt = adapter.from_canonical(&canonical).unwrap();
        assert_eq!(rebuilt.document, sample_document());
    }

    #[test]
    fn character_fidelity_is_honest_about_the_long_tail() {
        let canonical = ElizaAdapter::new().to_canonical(&native()).unwrap();
        let score = canonical.metadata.fidelity_score;
        assert!(score < 0.9, "character files should not score {}", score);
        assert!(score > 0.5);
    }

    #[test]
    fn provider_without_settings_still_maps() {
        let adapter = ElizaAdapter::new();
        let canonical = adapter
            .to_canonical(&NativeAgent::new(
                "elizaos",
                json!({"name": "bare", "modelProvider": "openai"}),
            ))
            .unwrap();
        let rebuilt = adapter.from_canonical(&canonical).unwrap();
        assert_eq!(rebuilt.document["modelProvider"], json!("openai"));
    }
}
