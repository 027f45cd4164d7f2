//! Attribute helpers shared by the directive extractors.

use rustc_hash::FxHashMap;

use crate::compiler::ast::{Attribute, Element};

/// JSON-escapes a string, quotes included.
pub(crate) fn json_string(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

/// Builds the name→value attribute map. Later occurrences of a name win;
/// duplicate names are reported through `on_duplicate`.
pub(crate) fn make_attrs_map(
    attrs: &[Attribute],
    mut on_duplicate: impl FnMut(&str),
) -> FxHashMap<String, String> {
    let mut map = FxHashMap::default();
    for attr in attrs {
        if map.contains_key(&attr.name) {
            on_duplicate(&attr.name);
        }
        map.insert(attr.name.clone(), attr.value.clone());
    }
    map
}

/// Removes the first raw-list occurrence of `name` and returns its mapped
/// value. The attribute map is left untouched; it keeps every name seen for
/// downstream consumers.
pub(crate) fn get_and_remove_attr(el: &mut Element, name: &str) -> Option<String> {
    let value = el.attribute_map.get(name)?.clone();
    if let Some(pos) = el.attribute_list.iter().position(|attr| attr.name == name) {
        el.attribute_list.remove(pos);
    }
    Some(value)
}

/// Fetches a binding attribute: the dynamic `:name` / `v-bind:name` form is
/// preferred and returned raw; otherwise the static value is returned
/// JSON-escaped.
pub(crate) fn get_binding_attr(el: &mut Element, name: &str) -> Option<String> {
    let dynamic = get_and_remove_attr(el, &format!(":{name}"))
        .or_else(|| get_and_remove_attr(el, &format!("v-bind:{name}")));
    if let Some(value) = dynamic {
        return Some(value);
    }
    get_and_remove_attr(el, name).map(|value| json_string(&value))
}

/// Matches the permissive bracketed-or-bare directive expression pattern.
/// Returns `(matched_text, bare_expression)`: for `{{ expr }}` the full
/// delimited match and the trimmed inner expression, for a bare value the
/// value itself in both positions. Empty values do not match.
pub(crate) fn match_template_bracket(value: &str) -> Option<(String, String)> {
    if let Some(open) = value.find("{{") {
        let after = open + 2;
        if let Some(close) = value[after..].rfind("}}") {
            let full = value[open..after + close + 2].to_string();
            let inner = value[after..after + close].trim().to_string();
            return Some((full, inner));
        }
    }
    if value.trim().is_empty() {
        return None;
    }
    Some((value.to_string(), value.trim().to_string()))
}

/// Content of script and style elements is passed through without entity
/// decoding.
pub(crate) fn is_text_tag(tag: &str) -> bool {
    tag == "script" || tag == "style"
}

/// Tags whose side effects have no place in a template: `<style>`, and
/// `<script>` unless it declares a non-JS type.
pub(crate) fn is_forbidden_tag(el: &Element) -> bool {
    el.tag == "style"
        || (el.tag == "script"
            && el
                .attribute_map
                .get("type")
                .is_none_or(|t| t == "text/javascript"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bracketed_value_extracts_inner_expression() {
        let (full, inner) = match_template_bracket("{{ list }}").unwrap();
        assert_eq!(full, "{{ list }}");
        assert_eq!(inner, "list");
    }

    #[test]
    fn bare_value_matches_whole() {
        let (full, inner) = match_template_bracket("list").unwrap();
        assert_eq!(full, "list");
        assert_eq!(inner, "list");
    }

    #[test]
    fn empty_value_does_not_match() {
        assert!(match_template_bracket("").is_none());
    }

    #[test]
    fn json_string_escapes_quotes() {
        assert_eq!(json_string("a\"b"), "\"a\\\"b\"");
    }
}
