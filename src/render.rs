//! Template substitution, ported from `ast_decoder/renderer.py`'s active
//! `render_node`. The original dispatches on the node's Python class and
//! builds a small context dict per class; this does the same by matching
//! on `NodeKind`, then substitutes `{{placeholder}}` text with no control
//! flow of its own -- multi-condition IFs and argument lists are
//! flattened to plain strings here, in Rust, before substitution runs.

use crate::ast::{Condition, Node, NodeKind};
use crate::phrases;
use ratedecoder_templates::TemplateSet;

/// Render one node's `english` text from its `template_id` and kind.
/// Falls back to whatever `english` already held (or an empty string)
/// when the template is missing or a placeholder can't be filled --
/// render failures degrade gracefully, they never abort decoding.
pub fn render(node: &Node, templates: &TemplateSet) -> String {
    if node.template_id.is_empty() {
        return node.english.clone();
    }
    let template = match templates.template(node.template_id) {
        Some(t) => t,
        None => return node.english.clone(),
    };
    let ctx = build_context(node);
    substitute(template, &ctx)
}

fn jump_text(target: Option<i32>, current_step: u32) -> String {
    match target {
        Some(t) => crate::defs::JumpIndex::classify(t, current_step).english(current_step),
        None => String::new(),
    }
}

fn jump_target_text(branch: &[Node], current_step: u32) -> String {
    match branch.first().map(|n| &n.kind) {
        Some(NodeKind::Jump(j)) => jump_text(j.target, current_step),
        Some(other) => describe_kind_value(other),
        None => String::new(),
    }
}

/// A short textual stand-in for a non-Jump branch head, used only when a
/// true/false branch's first node isn't itself a jump (rare, but the
/// renderer must still produce something rather than an empty string).
fn describe_kind_value(kind: &NodeKind) -> String {
    match kind {
        NodeKind::Raw(r) => r.value.clone(),
        NodeKind::Assignment(a) => a.var.clone(),
        _ => String::new(),
    }
}

/// `Compare.operator` already holds the resolver's bracketed phrase
/// (e.g. `"[equals]"`), set when the parser built the node -- unlike
/// `Arithmetic.operator`, which stays a raw symbol until render time.
fn compare_text(c: &crate::ast::Compare) -> String {
    format!("{} {} {}", c.left.value, c.operator, c.right.value)
}

fn condition_text(condition: &Option<Condition>) -> String {
    match condition {
        None => String::new(),
        Some(Condition::Compare(c)) => compare_text(c),
        Some(Condition::TypeCheck(t)) => format!("{} is {}", t.left.value, t.check_type),
        Some(Condition::Multi(m)) => {
            let joiner = format!(" {} ", m.joiner.label());
            m.conditions
                .iter()
                .map(compare_text)
                .collect::<Vec<_>>()
                .join(&joiner)
        }
    }
}

fn build_context(node: &Node) -> Vec<(&'static str, String)> {
    match &node.kind {
        NodeKind::Jump(j) => vec![("target", jump_text(j.target, node.step))],
        NodeKind::If(if_node) => vec![
            ("conditions", condition_text(&if_node.condition)),
            ("true_target", jump_target_text(&if_node.true_branch, node.step)),
            ("false_target", jump_target_text(&if_node.false_branch, node.step)),
        ],
        NodeKind::TypeCheck(t) => vec![
            ("conditions", format!("{} is {}", t.left.value, t.check_type)),
            ("true_target", String::new()),
            ("false_target", String::new()),
        ],
        NodeKind::Arithmetic(a) => {
            let round_spec = a
                .round_english
                .clone()
                .or_else(|| a.round_spec.as_deref().map(phrases::round_english))
                .unwrap_or_default();
            vec![
                ("left", a.left.value.clone()),
                ("operator", phrases::operator_english(&a.operator)),
                ("right", a.right.value.clone()),
                ("round_spec", round_spec),
            ]
        }
        NodeKind::Function(f) => {
            let args = f
                .args
                .iter()
                .map(|a| a.value.clone())
                .collect::<Vec<_>>()
                .join(", ");
            let round_spec = f
                .round_spec
                .as_deref()
                .map(phrases::round_english)
                .unwrap_or_default();
            vec![("name", f.name.clone()), ("args", args), ("round_spec", round_spec)]
        }
        NodeKind::Assignment(asn) => {
            let expr = render_expr(&asn.expr);
            vec![("var", asn.var.clone()), ("expr", expr)]
        }
        NodeKind::Compare(c) => vec![("conditions", compare_text(c))],
        NodeKind::Raw(r) => vec![("value", r.value.clone())],
    }
}

/// An `Assignment`'s `expr` is itself a `Node` (usually `Arithmetic` or
/// `Function`) that was never routed through `render` on its own -- the
/// original computes the RHS text inline rather than recursing through
/// `render_node` a second time, so this mirrors that by reusing the
/// same context builder without looking at `expr.template_id`.
fn render_expr(expr: &Node) -> String {
    match &expr.kind {
        NodeKind::Arithmetic(a) => {
            let round_spec = a
                .round_english
                .clone()
                .or_else(|| a.round_spec.as_deref().map(phrases::round_english))
                .unwrap_or_default();
            let mut text = format!(
                "{} {} {}",
                a.left.value,
                phrases::operator_english(&a.operator),
                a.right.value
            );
            if !round_spec.is_empty() {
                text.push_str(" (");
                text.push_str(&round_spec);
                text.push(')');
            }
            text
        }
        NodeKind::Function(f) => {
            let args = f
                .args
                .iter()
                .map(|a| a.value.clone())
                .collect::<Vec<_>>()
                .join(", ");
            format!("{}({})", f.name, args)
        }
        NodeKind::Raw(r) => r.value.clone(),
        _ => expr.english.clone(),
    }
}

fn substitute(template: &str, ctx: &[(&str, String)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        rest = &rest[start + 2..];
        match rest.find("}}") {
            Some(end) => {
                let key = rest[..end].trim();
                if let Some((_, value)) = ctx.iter().find(|(k, _)| *k == key) {
                    out.push_str(value);
                }
                rest = &rest[end + 2..];
            }
            None => {
                out.push_str("{{");
                break;
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Arithmetic, Compare, If, Jump, Raw};
    use crate::defs::Opcode;

    fn raw(value: &str) -> Raw {
        Raw { raw: value.to_string(), value: value.to_string(), kind: None }
    }

    fn templates() -> TemplateSet {
        TemplateSet::load_str(
            "templates:\n  \
             JUMP: 'Go to {{target}}'\n  \
             IF_COMPARE: 'If {{conditions}}, then {{true_target}} else {{false_target}}'\n  \
             ASSIGNMENT: 'Set {{var}} to {{expr}}'\n",
        )
        .unwrap()
    }

    #[test]
    fn renders_jump_target() {
        let node = Node::new(1, Opcode::NumericIf, "JUMP", NodeKind::Jump(Jump { target: Some(3) }));
        assert_eq!(render(&node, &templates()), "Go to Step 3");
    }

    #[test]
    fn renders_if_with_nested_jump_targets() {
        let true_branch = vec![Node::new(
            1,
            Opcode::NumericIf,
            "JUMP",
            NodeKind::Jump(Jump { target: Some(-1) }),
        )];
        let false_branch = vec![Node::new(
            1,
            Opcode::NumericIf,
            "JUMP",
            NodeKind::Jump(Jump { target: Some(-2) }),
        )];
        let if_node = If {
            condition: Some(Condition::Compare(Compare {
                left: raw("X"),
                operator: "[equals]".to_string(),
                right: raw("Y"),
                cond_op: None,
            })),
            true_branch,
            false_branch,
        };
        let node = Node::new(1, Opcode::NumericIf, "IF_COMPARE", NodeKind::If(if_node));
        let text = render(&node, &templates());
        assert_eq!(text, "If X [equals] Y, then DONE else EXIT_LOOP");
    }

    #[test]
    fn renders_assignment_from_arithmetic_expr() {
        let expr = Node::new(
            1,
            Opcode::Arithmetic,
            "",
            NodeKind::Arithmetic(Arithmetic {
                left: raw("A"),
                operator: "+".to_string(),
                right: raw("B"),
                round_spec: None,
                round_english: None,
            }),
        );
        let node = Node::new(
            1,
            Opcode::Arithmetic,
            "ASSIGNMENT",
            NodeKind::Assignment(crate::ast::Assignment {
                var: "Result".to_string(),
                expr: Box::new(expr),
                target: None,
                next_true: Vec::new(),
                next_false: Vec::new(),
            }),
        );
        assert_eq!(render(&node, &templates()), "Set Result to A + B");
    }

    #[test]
    fn missing_template_falls_back_to_existing_english() {
        let mut node =
            Node::new(1, Opcode::NumericIf, "NO_SUCH_TEMPLATE", NodeKind::Jump(Jump { target: None }));
        node.english = "fallback text".to_string();
        assert_eq!(render(&node, &templates()), "fallback text");
    }
}
