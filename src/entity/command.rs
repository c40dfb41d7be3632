/// Replace one version literal, arguments: the document uri and a [`super::Replacement`]
pub const REPLACE_VERSION: &str = "crates-lens.replaceVersion";
/// Apply the replacements collected during the last fetch, argument: the document uri
pub const UPDATE_ALL: &str = "crates-lens.updateAll";

pub fn supported_commands() -> Vec<String> {
    vec![REPLACE_VERSION.to_string(), UPDATE_ALL.to_string()]
}
