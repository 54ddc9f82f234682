//! Canonical namespaces and the agent ontology vocabulary
//!
//! All ontology predicates and classes live under the `chrysalis:` prefix.
//! Each concrete adapter owns one extension prefix; extension properties
//! never use the ontology prefix.

/// W3C RDF namespace
pub const RDF: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";

/// W3C XML Schema datatypes namespace
pub const XSD: &str = "http://www.w3.org/2001/XMLSchema#";

/// Chrysalis agent ontology namespace
pub const CHRYSALIS: &str = "https://chrysalis.dev/ontology#";

/// Base IRI for canonical agent identities
pub const AGENT_BASE: &str = "https://chrysalis.dev/agent/";

/// Base IRI for snapshot named graphs
pub const GRAPH_BASE: &str = "https://chrysalis.dev/graph/";

/// Extension namespace owned by the USA adapter
pub const USA_EXT: &str = "https://chrysalis.dev/ext/usa#";

/// Extension namespace owned by the LMOS adapter
pub const LMOS_EXT: &str = "https://chrysalis.dev/ext/lmos#";

/// Extension namespace owned by the ElizaOS adapter
pub const ELIZA_EXT: &str = "https://chrysalis.dev/ext/elizaos#";

/// IRI in the RDF namespace
pub fn rdf(local: &str) -> String {
    format!("{}{}", RDF, local)
}

/// IRI in the XSD namespace
pub fn xsd(local: &str) -> String {
    format!("{}{}", XSD, local)
}

/// IRI in the Chrysalis ontology namespace
pub fn chrysalis(local: &str) -> String {
    format!("{}{}", CHRYSALIS, local)
}

/// `rdf:type`
pub fn rdf_type() -> String {
    rdf("type")
}

/// Agent ontology classes and properties
///
/// Full IRIs, greppable and comparable with plain string equality.
pub mod ontology {
    /// Agent class
    pub const AGENT: &str = "https://chrysalis.dev/ontology#Agent";
    /// Tool class
    pub const TOOL: &str = "https://chrysalis.dev/ontology#Tool";
    /// LLM configuration class
    pub const LLM_CONFIG: &str = "https://chrysalis.dev/ontology#LLMConfig";
    /// Memory system class
    pub const MEMORY_SYSTEM: &str = "https://chrysalis.dev/ontology#MemorySystem";
    /// Working memory class
    pub const WORKING_MEMORY: &str = "https://chrysalis.dev/ontology#WorkingMemory";
    /// Episodic memory class
    pub const EPISODIC_MEMORY: &str = "https://chrysalis.dev/ontology#EpisodicMemory";
    /// Semantic memory class
    pub const SEMANTIC_MEMORY: &str = "https://chrysalis.dev/ontology#SemanticMemory";
    /// Procedural memory class
    pub const PROCEDURAL_MEMORY: &str = "https://chrysalis.dev/ontology#ProceduralMemory";
    /// Core memory class
    pub const CORE_MEMORY: &str = "https://chrysalis.dev/ontology#CoreMemory";
    /// MCP protocol binding class
    pub const MCP_BINDING: &str = "https://chrysalis.dev/ontology#MCPBinding";
    /// Agent-to-agent protocol binding class
    pub const A2A_BINDING: &str = "https://chrysalis.dev/ontology#A2ABinding";
    /// HTTP binding class
    pub const HTTP_BINDING: &str = "https://chrysalis.dev/ontology#HTTPBinding";
    /// WebSocket binding class
    pub const WEBSOCKET_BINDING: &str = "https://chrysalis.dev/ontology#WebSocketBinding";

    /// Agent display name
    pub const NAME: &str = "https://chrysalis.dev/ontology#name";
    /// Free-text description
    pub const DESCRIPTION: &str = "https://chrysalis.dev/ontology#description";
    /// Version string
    pub const VERSION: &str = "https://chrysalis.dev/ontology#version";
    /// Author
    pub const AUTHOR: &str = "https://chrysalis.dev/ontology#author";
    /// Classification tag (one quad per tag)
    pub const TAG: &str = "https://chrysalis.dev/ontology#tag";
    /// Agent role
    pub const ROLE: &str = "https://chrysalis.dev/ontology#role";
    /// Agent goal
    pub const GOAL: &str = "https://chrysalis.dev/ontology#goal";
    /// Agent backstory
    pub const BACKSTORY: &str = "https://chrysalis.dev/ontology#backstory";
    /// Designation (identity anchor component)
    pub const DESIGNATION: &str = "https://chrysalis.dev/ontology#designation";

    /// Link from agent to a tool
    pub const HAS_TOOL: &str = "https://chrysalis.dev/ontology#hasTool";
    /// Tool parameter schema (JSON literal)
    pub const PARAMETERS: &str = "https://chrysalis.dev/ontology#parameters";
    /// Link from agent to its LLM configuration
    pub const HAS_LLM_CONFIG: &str = "https://chrysalis.dev/ontology#hasLLMConfig";
    /// LLM provider
    pub const PROVIDER: &str = "https://chrysalis.dev/ontology#provider";
    /// LLM model name
    pub const MODEL: &str = "https://chrysalis.dev/ontology#model";
    /// Sampling temperature
    pub const TEMPERATURE: &str = "https://chrysalis.dev/ontology#temperature";
    /// Token limit
    pub const MAX_TOKENS: &str = "https://chrysalis.dev/ontology#maxTokens";

    /// Link from agent to a memory subsystem
    pub const HAS_MEMORY: &str = "https://chrysalis.dev/ontology#hasMemory";
    /// Memory capacity
    pub const CAPACITY: &str = "https://chrysalis.dev/ontology#capacity";
    /// Memory persistence flag
    pub const PERSISTENT: &str = "https://chrysalis.dev/ontology#persistent";

    /// Link from agent to a protocol binding
    pub const HAS_BINDING: &str = "https://chrysalis.dev/ontology#hasBinding";
    /// Binding endpoint URI
    pub const ENDPOINT: &str = "https://chrysalis.dev/ontology#endpoint";

    /// Framework the agent was ingested from
    pub const SOURCE_FRAMEWORK: &str = "https://chrysalis.dev/ontology#sourceFramework";

    /// Extension property class (store encoding of the extension bag)
    pub const EXTENSION: &str = "https://chrysalis.dev/ontology#Extension";
    /// Link from agent to an extension node
    pub const HAS_EXTENSION: &str = "https://chrysalis.dev/ontology#hasExtension";
    /// Extension namespace IRI
    pub const EXT_NAMESPACE: &str = "https://chrysalis.dev/ontology#extensionNamespace";
    /// Extension property name
    pub const EXT_PROPERTY: &str = "https://chrysalis.dev/ontology#extensionProperty";
    /// Extension value (JSON literal)
    pub const EXT_VALUE: &str = "https://chrysalis.dev/ontology#extensionValue";
    /// Extension source path in the native document
    pub const EXT_SOURCE_PATH: &str = "https://chrysalis.dev/ontology#extensionSourcePath";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn helpers_build_full_iris() {
        assert_eq!(rdf_type(), "http://www.w3.org/1999/02/22-rdf-syntax-ns#type");
        assert_eq!(xsd("string"), "http://www.w3.org/2001/XMLSchema#string");
        assert_eq!(chrysalis("Agent"), ontology::AGENT);
    }

    #[test]
    fn extension_prefixes_are_disjoint_from_ontology() {
        assert!(!USA_EXT.starts_with(CHRYSALIS));
        assert!(!LMOS_EXT.starts_with(CHRYSALIS));
        assert_ne!(USA_EXT, LMOS_EXT);
    }
}
