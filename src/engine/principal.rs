//! Claims-based identity carried on the context.
//!
//! Pure data: authentication middleware fills it in, authorizers and handlers
//! read it. Nothing in the engine interprets claims.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claim {
    pub kind: String,
    pub value: String,
}

impl Claim {
    pub fn new(kind: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Identity {
    authentication_type: Option<String>,
    claims: Vec<Claim>,
}

impl Identity {
    /// An authenticated identity.
    pub fn new(authentication_type: impl Into<String>, claims: Vec<Claim>) -> Self {
        Self {
            authentication_type: Some(authentication_type.into()),
            claims,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.authentication_type.is_some()
    }

    pub fn authentication_type(&self) -> Option<&str> {
        self.authentication_type.as_deref()
    }

    pub fn claims(&self) -> &[Claim] {
        &self.claims
    }

    pub fn add_claim(&mut self, claim: Claim) {
        self.claims.push(claim);
    }

    pub fn find_first(&self, kind: &str) -> Option<&Claim> {
        self.claims.iter().find(|c| c.kind == kind)
    }

    pub fn has_claim(&self, kind: &str, value: &str) -> bool {
        self.claims.iter().any(|c| c.kind == kind && c.value == value)
    }
}

/// All identities attached to the current request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Principal {
    identities: Vec<Identity>,
}

impl Principal {
    pub fn new(identity: Identity) -> Self {
        Self {
            identities: vec![identity],
        }
    }

    pub fn identities(&self) -> &[Identity] {
        &self.identities
    }

    /// The first identity, if any.
    pub fn identity(&self) -> Option<&Identity> {
        self.identities.first()
    }

    pub fn add_identity(&mut self, identity: Identity) {
        self.identities.push(identity);
    }

    pub fn is_authenticated(&self) -> bool {
        self.identities.iter().any(Identity::is_authenticated)
    }

    pub fn find_first(&self, kind: &str) -> Option<&Claim> {
        self.identities.iter().find_map(|i| i.find_first(kind))
    }

    pub fn has_claim(&self, kind: &str, value: &str) -> bool {
        self.identities.iter().any(|i| i.has_claim(kind, value))
    }

    pub fn is_in_role(&self, role: &str) -> bool {
        self.has_claim("role", role)
    }
}
