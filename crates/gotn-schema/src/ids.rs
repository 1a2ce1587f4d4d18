//! Opaque identifier types.
//!
//! Node and project ids are caller-supplied, non-empty opaque strings (§3).
//! We still wrap them in thin type aliases so call sites read as intent
//! rather than `String` soup; nothing here changes representation.

/// A micro-prompt node identifier. Caller-supplied, non-empty, opaque.
pub type NodeId = String;

/// A per-tenant project scope tag. Caller-supplied, non-empty, opaque.
pub type ProjectId = String;

/// Generate a fresh internal identifier (journal entry ids, run ids).
///
/// Unlike [`NodeId`]/[`ProjectId`], these are never caller-supplied, so a
/// UUID is appropriate: we only need global uniqueness, not human meaning.
pub fn new_internal_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
