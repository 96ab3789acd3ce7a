//! Access control and masking.
//!
//! These two pure, idempotent functions are the only path by which
//! `allowed` and `channels` leave the engine. Every read (point get,
//! discovery row, orphan listing) passes through both before an object
//! reaches the caller.

use graffiti_types::{GraffitiObject, Session};

/// Decide whether `viewer` may observe `object` at all.
///
/// An object without an allow-list is public. With one, only the owner
/// and the listed actors see it; the anonymous viewer never does.
pub fn is_visible(object: &GraffitiObject, viewer: Option<&Session>) -> bool {
    match &object.allowed {
        None => true,
        Some(allowed) => viewer.is_some_and(|session| {
            session.actor == object.actor || allowed.iter().any(|a| *a == session.actor)
        }),
    }
}

/// Rewrite the sensitive fields of a visible object for `viewer`.
///
/// The owner observes the object unchanged. Any other viewer observes:
/// - `allowed`: absent stays absent; otherwise reduced to just the viewer
///   (or emptied for the anonymous viewer);
/// - `channels`: the intersection with the channels the caller queried,
///   in the object's own order. Point reads query no channels, so
///   non-owners observe `channels = []` there.
pub fn mask(
    mut object: GraffitiObject,
    queried_channels: &[String],
    viewer: Option<&Session>,
) -> GraffitiObject {
    if viewer.is_some_and(|session| session.actor == object.actor) {
        return object;
    }

    object.allowed = object.allowed.map(|_| {
        viewer
            .map(|session| vec![session.actor.clone()])
            .unwrap_or_default()
    });
    object
        .channels
        .retain(|channel| queried_channels.contains(channel));
    object
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn object(allowed: Option<Vec<&str>>) -> GraffitiObject {
        GraffitiObject {
            url: "graffiti:local:alice~x".into(),
            actor: "alice".into(),
            value: json!({ "x": 1 }),
            channels: vec!["c1".into(), "c2".into()],
            allowed: allowed.map(|a| a.into_iter().map(String::from).collect()),
            last_modified: 1,
            tombstone: false,
        }
    }

    fn session(actor: &str) -> Session {
        Session::new(actor)
    }

    // -----------------------------------------------------------------------
    // Visibility
    // -----------------------------------------------------------------------

    #[test]
    fn public_objects_are_visible_to_everyone() {
        let obj = object(None);
        assert!(is_visible(&obj, None));
        assert!(is_visible(&obj, Some(&session("stranger"))));
    }

    #[test]
    fn restricted_objects_require_owner_or_listing() {
        let obj = object(Some(vec!["bob"]));
        assert!(is_visible(&obj, Some(&session("alice")))); // owner
        assert!(is_visible(&obj, Some(&session("bob")))); // listed
        assert!(!is_visible(&obj, Some(&session("carol"))));
        assert!(!is_visible(&obj, None));
    }

    #[test]
    fn empty_allow_list_is_owner_only() {
        let obj = object(Some(vec![]));
        assert!(is_visible(&obj, Some(&session("alice"))));
        assert!(!is_visible(&obj, Some(&session("bob"))));
    }

    // -----------------------------------------------------------------------
    // Masking
    // -----------------------------------------------------------------------

    #[test]
    fn owner_observes_the_object_unchanged() {
        let obj = object(Some(vec!["bob"]));
        let masked = mask(obj.clone(), &[], Some(&session("alice")));
        assert_eq!(masked, obj);
    }

    #[test]
    fn non_owner_allowed_is_reduced_to_the_viewer() {
        let obj = object(Some(vec!["bob", "carol"]));
        let masked = mask(obj, &["c1".into()], Some(&session("bob")));
        assert_eq!(masked.allowed, Some(vec!["bob".to_string()]));
    }

    #[test]
    fn absent_allowed_stays_absent() {
        let masked = mask(object(None), &[], Some(&session("bob")));
        assert_eq!(masked.allowed, None);
    }

    #[test]
    fn anonymous_viewer_gets_an_empty_allow_list() {
        let masked = mask(object(Some(vec!["bob"])), &[], None);
        assert_eq!(masked.allowed, Some(vec![]));
    }

    #[test]
    fn channels_intersect_with_the_query() {
        let masked = mask(object(None), &["c2".into(), "c9".into()], Some(&session("bob")));
        assert_eq!(masked.channels, vec!["c2".to_string()]);
    }

    #[test]
    fn point_reads_observe_no_channels() {
        let masked = mask(object(None), &[], Some(&session("bob")));
        assert!(masked.channels.is_empty());
    }

    #[test]
    fn mask_is_idempotent() {
        let queried = vec!["c1".to_string()];
        let viewer = session("bob");
        let once = mask(object(Some(vec!["bob"])), &queried, Some(&viewer));
        let twice = mask(once.clone(), &queried, Some(&viewer));
        assert_eq!(once, twice);
    }
}
