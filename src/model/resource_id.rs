//! Hierarchical resource identifiers
//!
//! `/subscriptions/{sub}/resourceGroups/{rg}/providers/{namespace}/{type}/{name}`
//! optionally followed by `/{childType}/{childName}` pairs.

use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// A parsed resource id
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceId {
    subscription_id: String,
    resource_group: String,
    namespace: String,
    resource_type: String,
    name: String,
    children: Vec<(String, String)>,
}

impl ResourceId {
    pub fn new(
        subscription_id: &str,
        resource_group: &str,
        namespace: &str,
        resource_type: &str,
        name: &str,
    ) -> Self {
        Self {
            subscription_id: subscription_id.to_string(),
            resource_group: resource_group.to_string(),
            namespace: namespace.to_string(),
            resource_type: resource_type.to_string(),
            name: name.to_string(),
            children: Vec::new(),
        }
    }

    /// Id of a child nested under this resource
    pub fn child(&self, child_type: &str, child_name: &str) -> Self {
        let mut id = self.clone();
        id.children
            .push((child_type.to_string(), child_name.to_string()));
        id
    }

    /// Parse a resource id
    pub fn parse(raw: &str) -> Result<Self> {
        let invalid = || Error::InvalidResourceId(raw.to_string());

        let segments: Vec<&str> = raw.trim_matches('/').split('/').collect();
        if segments.len() < 8 || segments.len() % 2 != 0 || segments.iter().any(|s| s.is_empty())
        {
            return Err(invalid());
        }

        let expect = |idx: usize, literal: &str| -> Result<()> {
            if segments[idx].eq_ignore_ascii_case(literal) {
                Ok(())
            } else {
                Err(invalid())
            }
        };
        expect(0, "subscriptions")?;
        expect(2, "resourceGroups")?;
        expect(4, "providers")?;

        let children = segments[8..]
            .chunks(2)
            .map(|pair| (pair[0].to_string(), pair[1].to_string()))
            .collect();

        Ok(Self {
            subscription_id: segments[1].to_string(),
            resource_group: segments[3].to_string(),
            namespace: segments[5].to_string(),
            resource_type: segments[6].to_string(),
            name: segments[7].to_string(),
            children,
        })
    }

    pub fn subscription_id(&self) -> &str {
        &self.subscription_id
    }

    pub fn resource_group(&self) -> &str {
        &self.resource_group
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Type segment of the top-level resource (`routeTables`)
    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }

    /// Name of the innermost resource this id addresses
    pub fn name(&self) -> &str {
        self.children
            .last()
            .map_or(self.name.as_str(), |(_, name)| name.as_str())
    }

    /// Id of the top-level resource, without child segments
    pub fn parent(&self) -> Option<Self> {
        if self.children.is_empty() {
            return None;
        }
        let mut id = self.clone();
        id.children.pop();
        Some(id)
    }

    /// Whether the id addresses a resource of the given namespace and type
    pub fn is_type(&self, namespace: &str, resource_type: &str) -> bool {
        self.children.is_empty()
            && self.namespace.eq_ignore_ascii_case(namespace)
            && self.resource_type.eq_ignore_ascii_case(resource_type)
    }

    /// Path with each segment percent-encoded, for use in request URLs
    pub fn encoded_path(&self) -> String {
        self.segments()
            .map(|s| urlencoding::encode(s).into_owned())
            .fold(String::new(), |mut acc, s| {
                acc.push('/');
                acc.push_str(&s);
                acc
            })
    }

    fn segments(&self) -> impl Iterator<Item = &str> {
        [
            "subscriptions",
            self.subscription_id.as_str(),
            "resourceGroups",
            self.resource_group.as_str(),
            "providers",
            self.namespace.as_str(),
            self.resource_type.as_str(),
            self.name.as_str(),
        ]
        .into_iter()
        .chain(
            self.children
                .iter()
                .flat_map(|(t, n)| [t.as_str(), n.as_str()]),
        )
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in self.segments() {
            write!(f, "/{segment}")?;
        }
        Ok(())
    }
}

impl FromStr for ResourceId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Path of the collection of `resource_type` in a scope
pub fn collection_path(
    subscription_id: &str,
    resource_group: Option<&str>,
    namespace: &str,
    resource_type: &str,
) -> String {
    let sub = urlencoding::encode(subscription_id);
    match resource_group {
        Some(rg) => format!(
            "/subscriptions/{}/resourceGroups/{}/providers/{}/{}",
            sub,
            urlencoding::encode(rg),
            namespace,
            resource_type
        ),
        None => format!(
            "/subscriptions/{}/providers/{}/{}",
            sub, namespace, resource_type
        ),
    }
}
