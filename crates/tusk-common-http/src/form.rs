//! `application/x-www-form-urlencoded` bodies.
//!
//! Every reserved character is percent-encoded and space becomes `+`.
//! Repeated fields (`name[]`) are just repeated pairs at this level.

use url::form_urlencoded;

/// Encode name/value pairs. Order is preserved.
///
/// A `&HashMap` works too; its key order is unspecified.
pub fn encode_pairs<I, K, V>(pairs: I) -> String
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (name, value) in pairs {
        serializer.append_pair(name.as_ref(), value.as_ref());
    }
    serializer.finish()
}

/// Decode a form body back into ordered pairs.
pub fn decode(body: &str) -> Vec<(String, String)> {
    form_urlencoded::parse(body.as_bytes())
        .into_owned()
        .collect()
}
