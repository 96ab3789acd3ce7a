//! The object-URL codec.
//!
//! An object url is `graffiti:local:` followed by the percent-encoded
//! actor, a single `~` separator, and the percent-encoded object id. The
//! component encoder escapes `~` itself, so a well-formed url contains the
//! separator exactly once and decoding is unambiguous for any actor or id
//! string.

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::error::TypeError;

/// Fixed scheme prefix of every object url.
pub const SCHEME_PREFIX: &str = "graffiti:local:";

/// Separator between the encoded actor and the encoded id.
const SEPARATOR: char = '~';

/// Percent-encodes everything but `[A-Za-z0-9._-]`. The separator `~` is
/// deliberately not exempted, keeping it unique in encoder output.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.');

/// Encode `(actor, id)` into a canonical object url.
///
/// Encoding is total: any pair of strings produces a decodable url.
pub fn encode_object_url(actor: &str, id: &str) -> String {
    format!(
        "{SCHEME_PREFIX}{}{SEPARATOR}{}",
        utf8_percent_encode(actor, COMPONENT),
        utf8_percent_encode(id, COMPONENT),
    )
}

/// Decode an object url into its `(actor, id)` pair.
///
/// Fails when the scheme prefix is missing, when the separator count is
/// not exactly one, or when a component carries undecodable
/// percent-escapes.
pub fn decode_object_url(url: &str) -> Result<(String, String), TypeError> {
    let rest = url
        .strip_prefix(SCHEME_PREFIX)
        .ok_or_else(|| TypeError::invalid_url(url, "missing scheme prefix"))?;

    let separators = rest.matches(SEPARATOR).count();
    if separators != 1 {
        return Err(TypeError::invalid_url(
            url,
            format!("expected exactly one separator, found {separators}"),
        ));
    }

    let (actor_enc, id_enc) = rest
        .split_once(SEPARATOR)
        .expect("separator count checked above");

    Ok((
        decode_component(url, actor_enc)?,
        decode_component(url, id_enc)?,
    ))
}

fn decode_component(url: &str, component: &str) -> Result<String, TypeError> {
    percent_decode_str(component)
        .decode_utf8()
        .map(|s| s.into_owned())
        .map_err(|e| TypeError::invalid_url(url, format!("invalid percent-encoding: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_plain_components() {
        let url = encode_object_url("alice", "obj-123");
        let (actor, id) = decode_object_url(&url).unwrap();
        assert_eq!(actor, "alice");
        assert_eq!(id, "obj-123");
    }

    #[test]
    fn roundtrip_components_containing_separator() {
        // A raw `~` in the actor must be escaped, not treated as the
        // separator.
        let url = encode_object_url("we~ird", "i~d");
        assert_eq!(url.matches('~').count(), 1);
        let (actor, id) = decode_object_url(&url).unwrap();
        assert_eq!(actor, "we~ird");
        assert_eq!(id, "i~d");
    }

    #[test]
    fn roundtrip_unicode_and_reserved_characters() {
        for actor in ["héllo", "a/b c", "with:colons", "100%"] {
            let url = encode_object_url(actor, "id");
            let (decoded, _) = decode_object_url(&url).unwrap();
            assert_eq!(decoded, actor);
        }
    }

    #[test]
    fn rejects_missing_scheme() {
        let err = decode_object_url("http://example.com/a~b").unwrap_err();
        assert!(matches!(err, TypeError::InvalidUrl { .. }));
    }

    #[test]
    fn rejects_wrong_separator_count() {
        assert!(decode_object_url("graffiti:local:noseparator").is_err());
        assert!(decode_object_url("graffiti:local:a~b~c").is_err());
    }

    #[test]
    fn rejects_bad_percent_escapes() {
        // %FF is not valid UTF-8 once decoded.
        let err = decode_object_url("graffiti:local:%FF~id").unwrap_err();
        assert!(matches!(err, TypeError::InvalidUrl { .. }));
    }

    #[test]
    fn encoded_actor_is_url_safe() {
        let url = encode_object_url("a b/c?d", "id");
        let tail = url.strip_prefix(SCHEME_PREFIX).unwrap();
        assert!(!tail.contains(' '));
        assert!(!tail.contains('/'));
        assert!(!tail.contains('?'));
    }
}
