//! Domain entities: connection descriptors, API definitions, organizations
//! and API clients.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use crate::error::CoreError;

/// Which API surface a definition is exposed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ApiType {
    #[serde(rename = "REST")]
    Rest,
    GraphQL,
}

impl fmt::Display for ApiType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rest => write!(f, "REST"),
            Self::GraphQL => write!(f, "GraphQL"),
        }
    }
}

impl FromStr for ApiType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rest" => Ok(Self::Rest),
            "graphql" => Ok(Self::GraphQL),
            other => Err(CoreError::invalid_api_type(other)),
        }
    }
}

/// A single operation a definition may allow.
///
/// The ordering drives the canonical comma-encoded form ("GET,PUT,DELETE").
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Operation {
    Get,
    Put,
    Delete,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Operation {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "PUT" => Ok(Self::Put),
            "DELETE" => Ok(Self::Delete),
            other => Err(CoreError::invalid_operation(other)),
        }
    }
}

/// The set of operations an API definition allows, with the comma-encoded
/// wire form used by the admin surface ("GET,DELETE").
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperationSet(BTreeSet<Operation>);

impl OperationSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_ops(ops: impl IntoIterator<Item = Operation>) -> Self {
        Self(ops.into_iter().collect())
    }

    pub fn insert(&mut self, op: Operation) {
        self.0.insert(op);
    }

    pub fn allows(&self, op: Operation) -> bool {
        self.0.contains(&op)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Operation> + '_ {
        self.0.iter().copied()
    }
}

impl fmt::Display for OperationSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let encoded: Vec<&str> = self.0.iter().map(Operation::as_str).collect();
        write!(f, "{}", encoded.join(","))
    }
}

impl FromStr for OperationSet {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut set = BTreeSet::new();
        for token in s.split(',') {
            let token = token.trim();
            if token.is_empty() {
                continue;
            }
            set.insert(token.parse::<Operation>()?);
        }
        Ok(Self(set))
    }
}

impl Serialize for OperationSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for OperationSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Driver family of an external database, used to pick the SQL dialect and
/// metadata queries. Parsed from the stored driver identifier, or inferred
/// from the connection URL scheme when the identifier is absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DriverKind {
    Postgres,
    MySql,
    Sqlite,
}

impl DriverKind {
    /// Infer the driver from a connection URL scheme.
    pub fn from_url(url: &str) -> Result<Self, CoreError> {
        let scheme = url.split(':').next().unwrap_or_default();
        match scheme.to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "mysql" | "mariadb" => Ok(Self::MySql),
            "sqlite" => Ok(Self::Sqlite),
            _ => Err(CoreError::invalid_driver(url)),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Postgres => "postgres",
            Self::MySql => "mysql",
            Self::Sqlite => "sqlite",
        }
    }
}

impl fmt::Display for DriverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DriverKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "mysql" | "mariadb" => Ok(Self::MySql),
            "sqlite" => Ok(Self::Sqlite),
            other => Err(CoreError::invalid_driver(other)),
        }
    }
}

/// Stored metadata for an external database.
///
/// The `password` field holds the encrypted form once persisted; it is
/// decrypted only transiently when a connection is opened.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DbConnectionDescriptor {
    pub id: Uuid,
    pub name: String,
    pub url: String,
    pub username: String,
    pub password: String,
    pub driver: DriverKind,
}

/// Declarative mapping from a table + API type to the operations and
/// columns it exposes, owned by exactly one connection descriptor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiDefinition {
    pub id: Uuid,
    pub table_name: String,
    pub api_type: ApiType,
    pub allowed_operations: OperationSet,
    /// Explicit column allow-list; empty means all columns.
    #[serde(default)]
    pub included_columns: Vec<String>,
    pub connection_id: Uuid,
}

impl ApiDefinition {
    /// First-match lookup predicate: table name compares case-insensitively.
    pub fn matches(&self, table_name: &str, api_type: ApiType) -> bool {
        self.api_type == api_type && self.table_name.eq_ignore_ascii_case(table_name)
    }

    /// Parse a comma-encoded column list, dropping empty tokens.
    pub fn parse_columns(raw: &str) -> Vec<String> {
        raw.split(',')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Lifecycle status of an organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrganizationStatus {
    Active,
    Inactive,
    Suspended,
}

impl fmt::Display for OrganizationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => write!(f, "Active"),
            Self::Inactive => write!(f, "Inactive"),
            Self::Suspended => write!(f, "Suspended"),
        }
    }
}

impl FromStr for OrganizationStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            "suspended" => Ok(Self::Suspended),
            other => Err(CoreError::invalid_status(other)),
        }
    }
}

/// An organization that owns API clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Organization {
    pub id: Uuid,
    pub name: String,
    pub status: OrganizationStatus,
}

/// A machine client credentialed for the token endpoint.
///
/// `client_id` and the secret are generated once at first save; the secret
/// is stored encrypted and never regenerated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    pub id: Uuid,
    pub client_id: String,
    pub client_secret: String,
    pub organization_id: Uuid,
}
