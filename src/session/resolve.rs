//! Session resolution: new conversation or resumption of an existing one.

/// The resolution decision for one turn.
///
/// Fixed when the request arrives and never re-derived from later events:
/// the caller-supplied handle and the identifier the engine ultimately
/// confirms are independent signals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// True iff a non-empty handle was supplied.
    pub should_resume: bool,
    /// The handle as supplied, passed through to the engine untouched.
    pub supplied_id: Option<String>,
}

/// Decide whether this turn resumes an existing session.
///
/// Pure; blank handles count as absent.
#[must_use]
pub fn resolve(supplied: Option<&str>) -> Resolution {
    match supplied {
        Some(id) if !id.trim().is_empty() => Resolution {
            should_resume: true,
            supplied_id: Some(id.to_string()),
        },
        _ => Resolution {
            should_resume: false,
            supplied_id: None,
        },
    }
}

// ============================================================================
// Tests
// ============================================================================
