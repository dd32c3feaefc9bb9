//! Symbol resolution: turns a raw variable token into a human-readable
//! description by walking the four scoping tables (global inputs, "Results
//! of Step N", the scope's dependency list, and operator/literal
//! shorthands). Grounded on
//! `ast_decoder/helpers/var_lookup.py::get_var_desc`/`get_target_var_desc`.
//!
//! Every lookup here degrades to returning the raw token text on any
//! failure (unknown prefix, malformed token, nothing found) — the
//! resolver never errors, per the `MalformedToken` policy.

use crate::defs::{split_var_token, Prefix};
use crate::entities::{Dependency, ProgramVersion, Scope};

fn operator_phrase(token: &str) -> Option<&'static str> {
    Some(match token {
        "=" => "[equals]",
        ">" => "[greater than]",
        "<" => "[less than]",
        "<=" => "[less than or equal to]",
        ">=" => "[greater than or equal to]",
        "!=" | "<>" => "[not equal to]",
        "@" => "[bitwise AND]",
        "^" => "[bitwise OR]",
        _ => return None,
    })
}

/// Describe `target_var` using the full scope (dependency list + program
/// version), falling back to the raw token wherever resolution fails.
pub fn describe_var(target_var: &str, scope: Scope, program: Option<&ProgramVersion>) -> String {
    if let Some(phrase) = operator_phrase(target_var) {
        return phrase.to_string();
    }

    if target_var.starts_with('{') || target_var.starts_with('[') {
        let trimmed = target_var.trim();
        if trimmed.len() >= 2 {
            let inner = trimmed[1..trimmed.len() - 1].trim();
            return if inner.is_empty() { "NULL".to_string() } else { inner.to_string() };
        }
        return "NULL".to_string();
    }

    let parsed = match split_var_token(target_var) {
        Some(v) => v,
        None => return target_var.to_string(),
    };

    if matches!(parsed.prefix, Prefix::GI | Prefix::LX | Prefix::IX) {
        if let Some(program) = program {
            for input in &program.data_dictionary.inputs {
                if input.index == parsed.index && input.line == program.line {
                    return if input.description.is_empty() {
                        target_var.to_string()
                    } else {
                        input.description.clone()
                    };
                }
            }
        }
        return target_var.to_string();
    }

    if parsed.prefix == Prefix::LS {
        return format!("Results of Step {}", parsed.index);
    }

    let find_by = |pred: fn(&Dependency) -> bool| -> Option<&Dependency> {
        scope.dependencies.iter().find(|dep| pred(dep) && matches_index(dep, parsed.index))
    };

    match parsed.prefix {
        Prefix::PL | Prefix::GL | Prefix::PQ | Prefix::GQ => {
            if let Some(dep) = find_by(Dependency::is_table_variable) {
                return non_empty_or(&dep.description, target_var);
            }
        }
        Prefix::GR | Prefix::PR => {
            if let Some(dep) = find_by(Dependency::is_result_variable) {
                return non_empty_or(&dep.description, target_var);
            }
        }
        Prefix::PC | Prefix::GC | Prefix::PP | Prefix::GP => {
            if let Some(dep) = scope
                .dependencies
                .iter()
                .find(|dep| dep.is_calculated_variable() && dep.calc_index == Some(parsed.index))
            {
                return non_empty_or(&dep.description, target_var);
            }
        }
        _ => {}
    }

    target_var.to_string()
}

fn matches_index(dep: &Dependency, index: u32) -> bool {
    dep.index == index
}

fn non_empty_or(description: &str, fallback: &str) -> String {
    if description.is_empty() { fallback.to_string() } else { description.to_string() }
}

/// Describe an assignment target when only the immediate dependency
/// context is known (no full scope list) — the "does this token refer to
/// the calculated variable we're currently decoding" shortcut.
/// Grounded on `get_target_var_desc`.
pub fn describe_target(target_var: &str, current: Option<&Dependency>) -> String {
    let current = match current {
        Some(dep) => dep,
        None => return target_var.to_string(),
    };

    let parsed = match split_var_token(target_var) {
        Some(v) => v,
        None => return target_var.to_string(),
    };

    if matches!(parsed.prefix, Prefix::PC | Prefix::GC | Prefix::PP | Prefix::GP)
        && current.calc_index == Some(parsed.index)
    {
        return non_empty_or(&current.description, target_var);
    }

    target_var.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::DependencyKind;

    fn program_with_input(line: &str, index: u32, description: &str) -> ProgramVersion {
        ProgramVersion {
            line: line.to_string(),
            data_dictionary: crate::entities::DataDictionary {
                inputs: vec![crate::entities::InputVariable {
                    line: line.to_string(),
                    index,
                    description: description.to_string(),
                    data_type: "string".to_string(),
                    category_id: "1".to_string(),
                }],
            },
            algorithms: vec![],
        }
    }

    #[test]
    fn resolves_global_input() {
        let program = program_with_input("AUTOP", 494, "Driver Age");
        let got = describe_var("GI_494", Scope::empty(), Some(&program));
        assert_eq!(got, "Driver Age");
    }

    #[test]
    fn falls_back_to_raw_on_wrong_line() {
        let program = program_with_input("AUTOP", 494, "Driver Age");
        let got = describe_var("GI_494", Scope::empty(), {
            let mut other = program.clone();
            other.line = "HOME".to_string();
            Some(&other)
        });
        assert_eq!(got, "GI_494");
    }

    #[test]
    fn resolves_results_of_step() {
        assert_eq!(describe_var("LS_7", Scope::empty(), None), "Results of Step 7");
    }

    #[test]
    fn resolves_calculated_variable_by_calc_index() {
        let dep = Dependency {
            kind: DependencyKind::Calculated,
            index: 1,
            calc_index: Some(691),
            description: "Total Premium".to_string(),
            dependency_vars: vec![],
            steps: vec![],
        };
        let deps = vec![dep];
        let scope = Scope { dependencies: &deps, current: None };
        assert_eq!(describe_var("GC_691", scope, None), "Total Premium");
    }

    #[test]
    fn falls_back_to_raw_token_when_unresolved() {
        assert_eq!(describe_var("GC_999", Scope::empty(), None), "GC_999");
        assert_eq!(describe_var("not-a-var", Scope::empty(), None), "not-a-var");
    }

    #[test]
    fn resolves_bracket_literal() {
        assert_eq!(describe_var("{ 5 }", Scope::empty(), None), "5");
        assert_eq!(describe_var("{}", Scope::empty(), None), "NULL");
    }

    #[test]
    fn resolves_operator_tokens() {
        assert_eq!(describe_var("<>", Scope::empty(), None), "[not equal to]");
    }

    #[test]
    fn describe_target_self_reference() {
        let dep = Dependency {
            kind: DependencyKind::Calculated,
            index: 1,
            calc_index: Some(456),
            description: "Base Rate".to_string(),
            dependency_vars: vec![],
            steps: vec![],
        };
        assert_eq!(describe_target("PC_456", Some(&dep)), "Base Rate");
        assert_eq!(describe_target("PC_456", None), "PC_456");
    }
}
