//! Event data models for trackpipe
//!
//! This module defines the core event structures used throughout the
//! pipeline: the immutable domain `Event` recorded at the call site and
//! the `WireEvent` representation POSTed to the collection endpoint.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::error::{ValidationError, ValidationErrorKind};

/// What an event is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubjectType {
    /// A product in the catalog
    #[serde(rename = "PRODUCT")]
    Product,
    /// A brand page
    #[serde(rename = "BRAND")]
    Brand,
    /// A generic page with no subject
    #[serde(rename = "PAGE")]
    Page,
}

impl SubjectType {
    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            SubjectType::Product => "PRODUCT",
            SubjectType::Brand => "BRAND",
            SubjectType::Page => "PAGE",
        }
    }
}

impl std::fmt::Display for SubjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Interaction performed on a subject
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    /// Subject was viewed
    #[serde(rename = "VIEW")]
    View,
    /// Subject was clicked
    #[serde(rename = "CLICK")]
    Click,
    /// Subject was added to the cart (products only)
    #[serde(rename = "CART_ADD")]
    CartAdd,
}

impl Action {
    /// Parse an action from a string, case-insensitive
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        match s.to_uppercase().as_str() {
            "VIEW" => Ok(Action::View),
            "CLICK" => Ok(Action::Click),
            "CART_ADD" => Ok(Action::CartAdd),
            _ => Err(ValidationError::new(
                ValidationErrorKind::UnknownAction,
                "action",
                format!("Unknown action: {}", s),
            )),
        }
    }

    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::View => "VIEW",
            Action::Click => "CLICK",
            Action::CartAdd => "CART_ADD",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Kind of tracked occurrence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// A generic page view, always accepted by the deduplicator
    PageView,
    /// An interaction with a product (view, click or cart-add)
    ProductInteraction(Action),
    /// An interaction with a brand (view or click)
    BrandInteraction(Action),
}

impl EventKind {
    /// Build an interaction kind, rejecting combinations the pipeline
    /// does not track
    pub fn interaction(subject: SubjectType, action: Action) -> Result<Self, ValidationError> {
        match (subject, action) {
            (SubjectType::Product, action) => Ok(EventKind::ProductInteraction(action)),
            (SubjectType::Brand, Action::CartAdd) => Err(ValidationError::new(
                ValidationErrorKind::InvalidAction,
                "action",
                "Brands cannot be added to the cart",
            )),
            (SubjectType::Brand, action) => Ok(EventKind::BrandInteraction(action)),
            (SubjectType::Page, _) => Err(ValidationError::new(
                ValidationErrorKind::InvalidAction,
                "subject_type",
                "Page views carry no interaction; use track_page_view",
            )),
        }
    }

    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::PageView => "PAGE_VIEW",
            EventKind::ProductInteraction(_) => "PRODUCT_INTERACTION",
            EventKind::BrandInteraction(_) => "BRAND_INTERACTION",
        }
    }

    /// The subject type this kind refers to
    pub fn subject_type(&self) -> SubjectType {
        match self {
            EventKind::PageView => SubjectType::Page,
            EventKind::ProductInteraction(_) => SubjectType::Product,
            EventKind::BrandInteraction(_) => SubjectType::Brand,
        }
    }

    /// The interaction action, if any
    pub fn action(&self) -> Option<Action> {
        match self {
            EventKind::PageView => None,
            EventKind::ProductInteraction(action) | EventKind::BrandInteraction(action) => {
                Some(*action)
            },
        }
    }

    /// Check if this is a generic page view
    pub fn is_page_view(&self) -> bool {
        matches!(self, EventKind::PageView)
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Key used by the deduplicator to collapse repeated emissions
///
/// Derived from (kind, subject, action); the action is carried inside
/// `EventKind`, so the pair is sufficient.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupeKey {
    kind: EventKind,
    subject_id: String,
}

/// One recorded occurrence of a tracked user action
///
/// Immutable once constructed; the queue attaches its own mutable
/// metadata (attempt count) without touching the event itself.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// Kind of occurrence
    pub kind: EventKind,

    /// Subject identifier; empty for generic page views
    pub subject_id: String,

    /// Subject slug; empty for generic page views
    pub subject_slug: String,

    /// Session this event belongs to
    pub session_id: String,

    /// Wall-clock timestamp, retained for reporting
    pub occurred_at: DateTime<Utc>,

    /// Monotonic timestamp, used for ordering and dedupe windows
    pub recorded_at: Instant,
}

impl Event {
    /// Create a new event stamped with the current time
    pub fn new(
        kind: EventKind,
        subject_id: impl Into<String>,
        subject_slug: impl Into<String>,
        session_id: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            subject_id: subject_id.into(),
            subject_slug: subject_slug.into(),
            session_id: session_id.into(),
            occurred_at: Utc::now(),
            recorded_at: Instant::now(),
        }
    }

    /// Create a generic page-view event
    pub fn page_view(session_id: impl Into<String>) -> Self {
        Self::new(EventKind::PageView, "", "", session_id)
    }

    /// Derive the deduplication key for this event
    pub fn dedupe_key(&self) -> DedupeKey {
        DedupeKey {
            kind: self.kind,
            subject_id: self.subject_id.clone(),
        }
    }

    /// Build the wire representation sent to the collection endpoint
    pub fn to_wire(&self) -> WireEvent {
        WireEvent {
            kind: self.kind.as_str().to_string(),
            subject_id: self.subject_id.clone(),
            subject_slug: self.subject_slug.clone(),
            session_id: self.session_id.clone(),
            occurred_at: self.occurred_at.to_rfc3339(),
            action: self.kind.action().map(|a| a.as_str().to_string()),
        }
    }
}

/// Event as serialized for the collection endpoint
///
/// A delivery batch is a JSON array of these objects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireEvent {
    /// Kind of occurrence (PAGE_VIEW, PRODUCT_INTERACTION, BRAND_INTERACTION)
    pub kind: String,

    /// Subject identifier; empty for generic page views
    pub subject_id: String,

    /// Subject slug; empty for generic page views
    pub subject_slug: String,

    /// Session this event belongs to
    pub session_id: String,

    /// When the event occurred (RFC3339 format)
    pub occurred_at: String,

    /// Interaction action; absent for page views
    pub action: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_parse() {
        assert_eq!(Action::parse("VIEW").unwrap(), Action::View);
        assert_eq!(Action::parse("click").unwrap(), Action::Click);
        assert_eq!(Action::parse("Cart_Add").unwrap(), Action::CartAdd);
        assert!(Action::parse("PURCHASE").is_err());
    }

    #[test]
    fn test_interaction_kind_validation() {
        assert_eq!(
            EventKind::interaction(SubjectType::Product, Action::CartAdd).unwrap(),
            EventKind::ProductInteraction(Action::CartAdd)
        );
        assert_eq!(
            EventKind::interaction(SubjectType::Brand, Action::Click).unwrap(),
            EventKind::BrandInteraction(Action::Click)
        );

        let err = EventKind::interaction(SubjectType::Brand, Action::CartAdd).unwrap_err();
        assert_eq!(err.kind, ValidationErrorKind::InvalidAction);

        assert!(EventKind::interaction(SubjectType::Page, Action::View).is_err());
    }

    #[test]
    fn test_kind_accessors() {
        let kind = EventKind::ProductInteraction(Action::Click);
        assert_eq!(kind.subject_type(), SubjectType::Product);
        assert_eq!(kind.action(), Some(Action::Click));
        assert!(!kind.is_page_view());

        assert_eq!(EventKind::PageView.action(), None);
        assert!(EventKind::PageView.is_page_view());
    }

    #[test]
    fn test_dedupe_key_same_for_identical_interactions() {
        let a = Event::new(
            EventKind::ProductInteraction(Action::CartAdd),
            "sku-42",
            "red-shoes",
            "session-1",
        );
        let b = Event::new(
            EventKind::ProductInteraction(Action::CartAdd),
            "sku-42",
            "red-shoes",
            "session-1",
        );
        assert_eq!(a.dedupe_key(), b.dedupe_key());
    }

    #[test]
    fn test_dedupe_key_differs_by_action() {
        let view = Event::new(
            EventKind::ProductInteraction(Action::View),
            "sku-42",
            "red-shoes",
            "session-1",
        );
        let click = Event::new(
            EventKind::ProductInteraction(Action::Click),
            "sku-42",
            "red-shoes",
            "session-1",
        );
        assert_ne!(view.dedupe_key(), click.dedupe_key());
    }

    #[test]
    fn test_page_view_wire_form() {
        let event = Event::page_view("session-1");
        let wire = event.to_wire();

        assert_eq!(wire.kind, "PAGE_VIEW");
        assert_eq!(wire.action, None);
        assert_eq!(wire.subject_id, "");
        assert_eq!(wire.session_id, "session-1");
    }

    #[test]
    fn test_wire_json_shape() {
        let event = Event::new(
            EventKind::BrandInteraction(Action::Click),
            "brand-7",
            "acme",
            "session-1",
        );

        let json = serde_json::to_string(&event.to_wire()).unwrap();
        assert!(json.contains("\"kind\":\"BRAND_INTERACTION\""));
        assert!(json.contains("\"subjectId\":\"brand-7\""));
        assert!(json.contains("\"subjectSlug\":\"acme\""));
        assert!(json.contains("\"sessionId\":\"session-1\""));
        assert!(json.contains("\"occurredAt\":"));
        assert!(json.contains("\"action\":\"CLICK\""));

        let deserialized: WireEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, event.to_wire());
    }
}
