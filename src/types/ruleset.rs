//! Ruleset documents as stored in definition files and sent to the GitHub API.
//!
//! Only the parts of a ruleset that carry organization-scoped IDs are given
//! structure. Everything else is kept as raw JSON so a ruleset exported from
//! GitHub survives a load/rewrite/apply cycle untouched.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

use super::ids::{ActorId, OrgName, RepositoryId, RulesetId};

/// How a ruleset is enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Enforcement {
    Disabled,
    Active,
    Evaluate,
}

impl fmt::Display for Enforcement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Enforcement::Disabled => "disabled",
            Enforcement::Active => "active",
            Enforcement::Evaluate => "evaluate",
        };
        write!(f, "{}", s)
    }
}

/// A ruleset definition.
///
/// `name` is the identity key: a definition manages the organization ruleset
/// with the same name. `source` is the organization whose ID space the
/// team and role references in `bypass_actors` belong to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RulesetDocument {
    /// GitHub's ID for the ruleset, present in exported files.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RulesetId>,

    pub name: String,

    /// What the ruleset applies to (`branch`, `tag` or `push`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_type: Option<String>,

    /// The organization the IDs in this document were issued by.
    pub source: OrgName,

    pub enforcement: Enforcement,

    /// Ref and repository conditions, passed through uninterpreted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<serde_json::Value>,

    #[serde(default)]
    pub rules: Vec<Rule>,

    #[serde(default)]
    pub bypass_actors: Vec<BypassActor>,
}

// ─── Rules ────────────────────────────────────────────────────────────────────

/// The `type` tag of a rule that references workflow files in other repositories.
pub const WORKFLOWS_RULE_TYPE: &str = "workflows";

/// A single rule within a ruleset.
///
/// Only `workflows` rules reference organization-scoped entities, so they are
/// the only variant singled out. Every other rule is carried verbatim: its
/// parameters are re-emitted byte-for-byte.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "RawRule", into = "RawRule")]
pub enum Rule {
    /// A `workflows` rule. The parameters stay raw until the rule is rewritten.
    Workflows { parameters: Box<RawValue> },

    /// Any other rule type.
    Passthrough {
        rule_type: String,
        parameters: Option<Box<RawValue>>,
    },
}

impl Rule {
    /// Returns the rule's `type` tag.
    pub fn rule_type(&self) -> &str {
        match self {
            Rule::Workflows { .. } => WORKFLOWS_RULE_TYPE,
            Rule::Passthrough { rule_type, .. } => rule_type,
        }
    }

    /// Returns the raw parameter JSON, if the rule has any.
    pub fn raw_parameters(&self) -> Option<&str> {
        match self {
            Rule::Workflows { parameters } => Some(parameters.get()),
            Rule::Passthrough { parameters, .. } => parameters.as_deref().map(RawValue::get),
        }
    }
}

// `RawValue` has no equality; compare the exact JSON text instead.
impl PartialEq for Rule {
    fn eq(&self, other: &Self) -> bool {
        self.rule_type() == other.rule_type() && self.raw_parameters() == other.raw_parameters()
    }
}

impl Eq for Rule {}

/// Wire shape of a rule.
#[derive(Clone, Serialize, Deserialize)]
struct RawRule {
    #[serde(rename = "type")]
    rule_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    parameters: Option<Box<RawValue>>,
}

/// Error for a rule whose tag and parameters don't fit together.
#[derive(Debug, thiserror::Error)]
#[error("rule of type \"{0}\" is missing its parameters")]
pub struct MissingParameters(String);

impl TryFrom<RawRule> for Rule {
    type Error = MissingParameters;

    fn try_from(raw: RawRule) -> Result<Self, Self::Error> {
        if raw.rule_type == WORKFLOWS_RULE_TYPE {
            let parameters = raw.parameters.ok_or(MissingParameters(raw.rule_type))?;
            Ok(Rule::Workflows { parameters })
        } else {
            Ok(Rule::Passthrough {
                rule_type: raw.rule_type,
                parameters: raw.parameters,
            })
        }
    }
}

impl From<Rule> for RawRule {
    fn from(rule: Rule) -> Self {
        match rule {
            Rule::Workflows { parameters } => RawRule {
                rule_type: WORKFLOWS_RULE_TYPE.to_string(),
                parameters: Some(parameters),
            },
            Rule::Passthrough {
                rule_type,
                parameters,
            } => RawRule {
                rule_type,
                parameters,
            },
        }
    }
}

/// Decoded parameters of a `workflows` rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowsParameters {
    pub workflows: Vec<WorkflowRef>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub do_not_enforce_on_create: Option<bool>,
}

impl WorkflowsParameters {
    /// Decodes the raw parameters of a `workflows` rule.
    pub fn decode(raw: &RawValue) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw.get())
    }

    /// Encodes these parameters back into raw rule parameters.
    pub fn encode(&self) -> Result<Box<RawValue>, serde_json::Error> {
        serde_json::value::to_raw_value(self)
    }
}

/// A workflow file a `workflows` rule requires to pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowRef {
    /// The repository holding the workflow file, in the issuing
    /// organization's ID space.
    pub repository_id: RepositoryId,

    pub path: String,

    #[serde(rename = "ref", default)]
    pub git_ref: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha: Option<String>,
}

// ─── Bypass actors ────────────────────────────────────────────────────────────

/// The kind of identity a bypass actor refers to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ActorType {
    Team,
    RepositoryRole,
    Integration,
    OrganizationAdmin,
    DeployKey,
    /// An actor type this bot doesn't know about, kept verbatim.
    Other(String),
}

impl ActorType {
    pub fn as_str(&self) -> &str {
        match self {
            ActorType::Team => "Team",
            ActorType::RepositoryRole => "RepositoryRole",
            ActorType::Integration => "Integration",
            ActorType::OrganizationAdmin => "OrganizationAdmin",
            ActorType::DeployKey => "DeployKey",
            ActorType::Other(s) => s,
        }
    }
}

impl From<String> for ActorType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "Team" => ActorType::Team,
            "RepositoryRole" => ActorType::RepositoryRole,
            "Integration" => ActorType::Integration,
            "OrganizationAdmin" => ActorType::OrganizationAdmin,
            "DeployKey" => ActorType::DeployKey,
            _ => ActorType::Other(s),
        }
    }
}

impl From<ActorType> for String {
    fn from(t: ActorType) -> Self {
        match t {
            ActorType::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for ActorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An identity allowed to bypass a ruleset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BypassActor {
    /// Absent (or `null`) for actor types that have no ID, such as deploy keys.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor_id: Option<ActorId>,

    pub actor_type: ActorType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bypass_mode: Option<String>,
}

impl BypassActor {
    pub fn new(actor_id: u64, actor_type: ActorType) -> Self {
        BypassActor {
            actor_id: Some(ActorId(actor_id)),
            actor_type,
            bypass_mode: None,
        }
    }

    /// Returns the actor ID, treating a missing ID as 0.
    pub fn id(&self) -> ActorId {
        self.actor_id.unwrap_or(ActorId(0))
    }
}
