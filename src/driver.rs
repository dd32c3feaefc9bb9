//! Walking an algorithm's instruction tree end to end: decode every step
//! directly on the algorithm, then recurse into each calculated-variable
//! dependency's own steps the same way. Grounded on
//! `repository/program_version_repository.py::process_all_instructions`.
//!
//! A single instruction's parse/render failure never aborts the walk --
//! it's caught and replaced with a `Raw` fallback node so the rest of
//! the program still decodes (the `DecodeFailure` policy, spec.md §7).
//!
//! [`decode_algorithm`] itself only reads instructions; [`attach_ast`]
//! writes the decoded nodes back onto them in place, skipping anything
//! whose `ast` is already set.

use ratedecoder_templates::TemplateSet;

use crate::ast::{Node, NodeKind};
use crate::entities::{Algorithm, Dependency, Instruction, ProgramVersion, Scope};
use crate::parser;
use crate::render;

/// Decode every instruction reachable from `algorithm`: its own `steps`,
/// then each calculated-variable dependency's `steps`, recursively.
/// Table/result/input dependencies carry no instructions of their own
/// and are never descended into. Instructions that already carry an
/// `ast` (from an earlier call, see [`attach_ast`]) are not re-decoded --
/// their cached node is reused.
pub fn decode_algorithm(
    algorithm: &Algorithm,
    program: Option<&ProgramVersion>,
    templates: &TemplateSet,
) -> Vec<Node> {
    let scope = Scope::for_algorithm(algorithm);
    let mut nodes = decode_steps(&algorithm.steps, scope, program, templates);
    for dep in &algorithm.dependency_vars {
        nodes.extend(decode_dependency(dep, program, templates));
    }
    nodes
}

fn decode_dependency(
    dependency: &Dependency,
    program: Option<&ProgramVersion>,
    templates: &TemplateSet,
) -> Vec<Node> {
    if !dependency.is_calculated_variable() {
        return Vec::new();
    }
    let scope = Scope::for_dependency(dependency);
    let mut nodes = decode_steps(&dependency.steps, scope, program, templates);
    for nested in &dependency.dependency_vars {
        nodes.extend(decode_dependency(nested, program, templates));
    }
    nodes
}

fn decode_steps(
    steps: &[Instruction],
    scope: Scope,
    program: Option<&ProgramVersion>,
    templates: &TemplateSet,
) -> Vec<Node> {
    steps
        .iter()
        .map(|instruction| decode_one(instruction, scope, program, templates))
        .collect()
}

fn decode_one(
    instruction: &Instruction,
    scope: Scope,
    program: Option<&ProgramVersion>,
    templates: &TemplateSet,
) -> Node {
    if let Some(cached) = instruction.ast.as_ref().and_then(|nodes| nodes.first()) {
        return cached.clone();
    }
    tracing::debug!("decoding step {} ({:?})", instruction.step, crate::defs::Opcode::from_code(instruction.ins_type));
    let mut node = parser::parse(instruction, scope, program);
    node.english = render::render(&node, templates);
    if matches!(node.kind, NodeKind::Raw(_)) {
        tracing::warn!("step {} fell back to a raw node: {}", instruction.step, node.english);
    }
    node
}

/// Walk `algorithm` in the same order [`decode_algorithm`] does and store
/// each already-decoded node back onto its instruction's `ast` field, for
/// instructions that don't have one yet. `nodes` must be the flat decode
/// result [`decode_algorithm`] returned for this same algorithm.
///
/// This is the in-place half of spec.md §4.7's "for each instruction whose
/// `ast` is still absent: ... store the AST in the instruction" -- kept
/// separate from decoding itself so `decode_algorithm` can stay a pure
/// function over `&Algorithm` (useful on its own, e.g. from `decode`),
/// while `decode_program` gets the mutate-in-place contract spec.md §6
/// requires.
pub fn attach_ast(algorithm: &mut Algorithm, nodes: &[Node]) {
    let mut idx = 0;
    attach_steps(&mut algorithm.steps, nodes, &mut idx);
    for dep in &mut algorithm.dependency_vars {
        attach_dependency(dep, nodes, &mut idx);
    }
}

fn attach_dependency(dependency: &mut Dependency, nodes: &[Node], idx: &mut usize) {
    if !dependency.is_calculated_variable() {
        return;
    }
    attach_steps(&mut dependency.steps, nodes, idx);
    for nested in &mut dependency.dependency_vars {
        attach_dependency(nested, nodes, idx);
    }
}

fn attach_steps(steps: &mut [Instruction], nodes: &[Node], idx: &mut usize) {
    for instruction in steps.iter_mut() {
        if instruction.ast.is_none() {
            if let Some(node) = nodes.get(*idx) {
                instruction.ast = Some(vec![node.clone()]);
            }
        }
        *idx += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{DependencyKind, Instruction};

    fn instr(step: u32, ins_type: i32, body: &str, tar: Option<&str>) -> Instruction {
        Instruction {
            step,
            ins_type,
            ins: body.to_string(),
            ins_tar: tar.map(str::to_string),
            seq_t: None,
            seq_f: None,
            ast: None,
        }
    }

    #[test]
    fn walks_algorithm_and_nested_calculated_dependency() {
        let nested = Dependency {
            kind: DependencyKind::Calculated,
            index: 1,
            calc_index: Some(10),
            description: "Nested Calc".to_string(),
            dependency_vars: vec![],
            steps: vec![instr(1, crate::defs::Opcode::Empty.to_code(), "", None)],
        };
        let table_dep = Dependency {
            kind: DependencyKind::Table,
            index: 2,
            calc_index: None,
            description: "Table Var".to_string(),
            dependency_vars: vec![],
            steps: vec![instr(1, crate::defs::Opcode::Empty.to_code(), "", None)],
        };
        let algorithm = Algorithm {
            description: "Root".to_string(),
            index: 1,
            dependency_vars: vec![nested, table_dep],
            steps: vec![instr(1, crate::defs::Opcode::Empty.to_code(), "", None)],
        };
        let templates = TemplateSet::default_bundled();
        let nodes = decode_algorithm(&algorithm, None, &templates);
        // root step + nested calculated-variable step; table dependency contributes none.
        assert_eq!(nodes.len(), 2);
    }

    #[test]
    fn attach_ast_stores_nodes_in_place_and_skips_already_decoded_instructions() {
        let nested = Dependency {
            kind: DependencyKind::Calculated,
            index: 1,
            calc_index: Some(10),
            description: "Nested Calc".to_string(),
            dependency_vars: vec![],
            steps: vec![instr(2, crate::defs::Opcode::Empty.to_code(), "", None)],
        };
        let mut algorithm = Algorithm {
            description: "Root".to_string(),
            index: 1,
            dependency_vars: vec![nested],
            steps: vec![instr(1, crate::defs::Opcode::Empty.to_code(), "", None)],
        };
        let templates = TemplateSet::default_bundled();
        let nodes = decode_algorithm(&algorithm, None, &templates);

        attach_ast(&mut algorithm, &nodes);
        assert_eq!(algorithm.steps[0].ast.as_ref().unwrap().len(), 1);
        assert_eq!(algorithm.dependency_vars[0].steps[0].ast.as_ref().unwrap().len(), 1);

        // A second attach pass over a node list with different content is a
        // no-op for instructions that already have an `ast`.
        let stale_nodes = vec![
            Node::raw_fallback(99, crate::defs::Opcode::Unknown, "stale"),
            Node::raw_fallback(99, crate::defs::Opcode::Unknown, "stale"),
        ];
        attach_ast(&mut algorithm, &stale_nodes);
        assert_eq!(algorithm.steps[0].ast.as_ref().unwrap()[0].step, 1);
    }
}
