//! Shell completion support for --set overrides
//!
//! Valid override paths are read off the JSON Schema of [`ProfileConfig`],
//! so new workload fields become completable without touching this file.

use schemars::schema::{Schema, SchemaObject};
use schemars::schema_for;
use std::collections::{BTreeMap, BTreeSet};

use crate::config::ProfileConfig;

/// Bash completion script that completes `--set` keys via `complete-paths`
pub fn generate_bash_completion(bin_name: &str) -> String {
    format!(
        r#"# Bash completion for {bin_name}
#   source <({bin_name} completions bash)

_{bin_name}() {{
    local cur prev words cword
    _init_completion || return

    if [[ "$prev" == "--set" && "$cur" != *"="* ]]; then
        local keys
        keys=$({bin_name} complete-paths 2>/dev/null)
        COMPREPLY=( $(compgen -W "$keys" -S "=" -- "$cur") )
        compopt -o nospace
        return 0
    fi

    case "$prev" in
        -P|--profile)
            _filedir toml
            return 0
            ;;
        -l|--log-level)
            COMPREPLY=( $(compgen -W "trace debug info warn error" -- "$cur") )
            return 0
            ;;
    esac

    if [[ $cword -eq 1 ]]; then
        COMPREPLY=( $(compgen -W "generate schema completions help" -- "$cur") )
        return 0
    fi

    case "${{words[1]}}" in
        generate)
            COMPREPLY=( $(compgen -W "-P --profile --set --no-progress --json -l --log-level -h --help" -- "$cur") )
            ;;
        completions)
            COMPREPLY=( $(compgen -W "bash zsh fish elvish powershell" -- "$cur") )
            ;;
    esac
}}

complete -F _{bin_name} {bin_name}
"#
    )
}

/// Every dotted path `--set` accepts, sorted
pub fn get_config_paths() -> Vec<String> {
    let schema = schema_for!(ProfileConfig);
    let mut paths = BTreeSet::new();
    collect_object_paths(&schema.schema, "", &mut paths, &schema.definitions);
    paths.into_iter().collect()
}

fn collect_object_paths(
    schema: &SchemaObject,
    prefix: &str,
    paths: &mut BTreeSet<String>,
    definitions: &BTreeMap<String, Schema>,
) {
    if let Some(obj) = &schema.object {
        for (name, property) in &obj.properties {
            let path = if prefix.is_empty() { name.clone() } else { format!("{prefix}.{name}") };
            paths.insert(path.clone());
            collect_schema_paths(property, &path, paths, definitions);
        }
    }

    // Optional and referenced sub-tables are wrapped in allOf/anyOf
    if let Some(subschemas) = &schema.subschemas {
        let nested = subschemas.all_of.iter().chain(subschemas.any_of.iter()).flatten();
        for sub in nested {
            collect_schema_paths(sub, prefix, paths, definitions);
        }
    }
}

fn collect_schema_paths(
    schema: &Schema,
    prefix: &str,
    paths: &mut BTreeSet<String>,
    definitions: &BTreeMap<String, Schema>,
) {
    let Schema::Object(obj) = schema else {
        return;
    };

    match obj.reference.as_deref().and_then(|r| r.strip_prefix("#/definitions/")) {
        Some(name) => {
            if let Some(definition) = definitions.get(name) {
                collect_schema_paths(definition, prefix, paths, definitions);
            }
        }
        None => collect_object_paths(obj, prefix, paths, definitions),
    }
}
