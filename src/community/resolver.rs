use crate::api::{Gateway, RemoteError};
use crate::community::{parse_identifier, CommunityRef, Identifier, OwnerId};
use thiserror::Error;

/// Why an identifier could not be resolved
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("identifier is empty")]
    Empty,

    #[error("name lookup for '{name}' failed: {source}")]
    Lookup { name: String, source: RemoteError },

    #[error("'{name}' is not a community (type: {})", .kind.as_deref().unwrap_or("no result"))]
    NotACommunity { name: String, kind: Option<String> },
}

/// Resolves identifiers to owner ids, looking short names up remotely
pub struct Resolver<'a> {
    gateway: &'a Gateway,
}

impl<'a> Resolver<'a> {
    pub fn new(gateway: &'a Gateway) -> Self {
        Self { gateway }
    }

    /// Resolves one identifier
    ///
    /// Numeric forms are resolved locally. Short names cost one lookup call;
    /// only group, page and event results are accepted. Failures are reported
    /// as a diagnostic line and returned, never propagated further.
    pub async fn resolve(&self, raw: &str) -> Result<CommunityRef, ResolveError> {
        let result = match parse_identifier(raw) {
            Identifier::Owner(owner_id) => Ok(owner_id),
            Identifier::Empty => Err(ResolveError::Empty),
            Identifier::ScreenName(name) => self.lookup(name).await,
        };

        match result {
            Ok(owner_id) => Ok(CommunityRef {
                raw: raw.trim().to_string(),
                owner_id,
            }),
            Err(e) => {
                self.gateway
                    .reporter()
                    .warn(format!("Could not determine the id of {}: {}", raw.trim(), e));
                Err(e)
            }
        }
    }

    async fn lookup(&self, name: String) -> Result<OwnerId, ResolveError> {
        self.gateway
            .reporter()
            .info(format!("Resolving screen name: {}", name));

        let resolved = match self.gateway.resolve_screen_name(&name).await {
            Ok(resolved) => resolved,
            Err(source) => return Err(ResolveError::Lookup { name, source }),
        };

        match resolved {
            Some(r) if r.is_community() => match r.object_id {
                Some(id) => Ok(OwnerId::community(id)),
                None => Err(ResolveError::NotACommunity { name, kind: r.kind }),
            },
            Some(r) => Err(ResolveError::NotACommunity { name, kind: r.kind }),
            None => Err(ResolveError::NotACommunity { name, kind: None }),
        }
    }
}
