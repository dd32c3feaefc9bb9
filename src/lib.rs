//! Decoding a closed opcode enumeration into a typed AST plus rendered
//! English: tokenizer -> parser -> template renderer, in the style of
//! the vCPU's fetch/decode/execute split but for offline, single-pass
//! text decoding rather than execution. Pure, single-threaded, no I/O --
//! loading the program from its packaged form is out of scope (see
//! `entities::ProgramVersion`'s doc comment).

pub mod ast;
pub mod defs;
pub mod driver;
pub mod entities;
pub mod parser;
pub mod phrases;
pub mod render;
pub mod resolver;
pub mod token;
pub mod tokenizer;

pub use ast::Node;
pub use entities::{Algorithm, Dependency, Instruction, ProgramVersion, Scope};

use ratedecoder_templates::TemplateSet;

/// Decode a single instruction to its AST node and rendered English,
/// using `scope` for variable resolution and `program` for global-input
/// lookups. Never panics and never returns an `Err` -- every failure
/// mode in spec.md §7 degrades to a `Raw` fallback node instead.
pub fn decode(
    instruction: &Instruction,
    scope: Scope,
    program: Option<&ProgramVersion>,
    templates: &TemplateSet,
) -> Node {
    let mut node = parser::parse(instruction, scope, program);
    node.english = render::render(&node, templates);
    node
}

/// Decode every instruction reachable from one algorithm: its own
/// `steps`, then each calculated-variable dependency's `steps`,
/// recursively. See [`driver::decode_algorithm`].
pub fn decode_algorithm(
    algorithm: &Algorithm,
    program: Option<&ProgramVersion>,
    templates: &TemplateSet,
) -> Vec<Node> {
    driver::decode_algorithm(algorithm, program, templates)
}

/// Decode every algorithm in a program version, attaching each
/// instruction's AST to it in place (spec.md §6: "mutates instructions in
/// place"). An instruction whose `ast` is already set -- from an earlier
/// call -- is left untouched rather than re-decoded (spec.md §4.7).
///
/// Decoding itself needs a shared view of the whole program (global-input
/// resolution reads `data_dictionary`), so this runs in two passes: decode
/// everything against a shared reborrow first, then write the results
/// back once that borrow has ended.
pub fn decode_program(program: &mut ProgramVersion, templates: &TemplateSet) {
    let snapshot: &ProgramVersion = program;
    let all_nodes: Vec<Vec<Node>> =
        snapshot.algorithms.iter().map(|algorithm| decode_algorithm(algorithm, Some(snapshot), templates)).collect();

    for (algorithm, nodes) in program.algorithms.iter_mut().zip(all_nodes.iter()) {
        driver::attach_ast(algorithm, nodes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_a_simple_assignment_end_to_end() {
        let templates = TemplateSet::default_bundled();
        let instruction = Instruction {
            step: 1,
            ins_type: defs::Opcode::Arithmetic.to_code(),
            ins: "GI_1+GI_2".to_string(),
            ins_tar: Some("PC_5".to_string()),
            seq_t: None,
            seq_f: None,
            ast: None,
        };
        let node = decode(&instruction, Scope::empty(), None, &templates);
        assert!(matches!(node.kind, ast::NodeKind::Assignment(_)));
        assert!(node.english.starts_with("Set"));
    }

    #[test]
    fn decodes_an_unknown_opcode_to_a_raw_fallback_without_panicking() {
        let templates = TemplateSet::default_bundled();
        let instruction = Instruction {
            step: 1,
            ins_type: 888_888,
            ins: "???".to_string(),
            ins_tar: None,
            seq_t: None,
            seq_f: None,
            ast: None,
        };
        let node = decode(&instruction, Scope::empty(), None, &templates);
        assert!(matches!(node.kind, ast::NodeKind::Raw(_)));
    }
}
