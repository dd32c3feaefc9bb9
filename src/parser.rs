//! Opcode-dispatched parsing: turns one [`Instruction`] into an
//! [`ast::Node`]. Grounded on `ast_decoder/parser.py`'s per-`InsType`
//! dispatch table and `decode_mif.py`'s multi-condition composer.
//!
//! Every parse function here is total: a malformed body never panics.
//! Most fall back to [`Node::raw_fallback`] (the `MalformedBody` policy
//! from spec.md §7); IF is the one exception, degrading to a `Compare`
//! whose `left` is the raw body instead (see [`malformed_if`]), per the
//! same section. `english` is left empty on every node `parse` returns —
//! filling it in is [`crate::render::render`]'s job.

use crate::ast::{
    Assignment, Compare, Condition, Function, If, Joiner, Jump, MultiCondition, Node, NodeKind,
    Raw, TypeCheck,
};
use crate::defs::{Opcode, MULTI_IF_SYMBOL};
use crate::entities::{Instruction, ProgramVersion, Scope};
use crate::resolver;
use crate::token::TokenKind;
use crate::tokenizer;

/// Decode one instruction within `scope` (the enclosing algorithm's or
/// dependency's sibling variable list) and `program` (for global-input
/// resolution). Never fails -- an opcode this registry doesn't
/// recognize, or a body this opcode's parser can't make sense of, comes
/// back as a `Raw` fallback node rather than an error.
pub fn parse(instruction: &Instruction, scope: Scope, program: Option<&ProgramVersion>) -> Node {
    let opcode = Opcode::from_code(instruction.ins_type);
    match opcode {
        Opcode::Unknown => Node::raw_fallback(
            instruction.step,
            opcode,
            format!("Unknown instruction type: {}", instruction.ins_type),
        ),
        Opcode::Arithmetic => parse_arithmetic(instruction, opcode, scope, program),
        Opcode::NumericIf
        | Opcode::IfAllAll
        | Opcode::IfNoAll
        | Opcode::IfAnyAll
        | Opcode::IfAllCurrentPath
        | Opcode::IfNoCurrentPath
        | Opcode::IfAnyCurrentPath
        | Opcode::IfDate => parse_if(instruction, opcode, scope, program),
        Opcode::Call => parse_function(instruction, opcode, scope, program),
        Opcode::Sort => parse_sort(instruction, opcode, scope, program),
        Opcode::Mask => parse_mask(instruction, opcode, scope, program),
        Opcode::SetString => parse_set_string(instruction, opcode, scope, program),
        Opcode::Empty => parse_empty(instruction, opcode),
        Opcode::StringConcat => parse_string_addition(instruction, opcode, scope, program),
        Opcode::DateDiffDays | Opcode::DateDiffMonths | Opcode::DateDiffYears | Opcode::DateAddition => {
            parse_date_diff(instruction, opcode, scope, program)
        }
        Opcode::IsAlpha | Opcode::IsDate | Opcode::IsNumeric => {
            parse_type_check(instruction, opcode, scope, program)
        }
        Opcode::FlagAllByUsageSet | Opcode::RankAllByUsageSetCondAsc | Opcode::RankAllByUsageSetCondDes => {
            parse_rank_flag(instruction, opcode, scope, program)
        }
        _ => parse_function(instruction, opcode, scope, program),
    }
}

/// `seq = None` (the field was never set) and `seq = Some(0)`
/// (explicitly "no branch") both mean there is nothing to jump to --
/// the step simply falls through to whatever comes next, so the branch
/// has no node at all rather than a `Jump` pointing at "next step".
/// Any other value (including the `ExitLoop`/`Done` sentinels) gets a
/// single `Jump` node.
fn jump_branch(step: u32, opcode: Opcode, seq: Option<i32>) -> Vec<Node> {
    match seq {
        None | Some(0) => Vec::new(),
        Some(target) => vec![Node::new(step, opcode, "JUMP", NodeKind::Jump(Jump { target: Some(target) }))],
    }
}

fn raw_node(step: u32, opcode: Opcode, raw: &str, value: String) -> Node {
    let mut node =
        Node::new(step, opcode, "", NodeKind::Raw(Raw { raw: raw.to_string(), value: value.clone(), kind: None }));
    node.english = value;
    node
}

fn wrap_assignment_if_targeted(instr: &Instruction, opcode: Opcode, scope: Scope, expr: Node) -> Node {
    match &instr.ins_tar {
        Some(target) => {
            let var = resolver::describe_target(target, scope.current);
            Node::new(
                instr.step,
                opcode,
                "ASSIGNMENT",
                NodeKind::Assignment(Assignment {
                    var,
                    expr: Box::new(expr),
                    target: Some(target.clone()),
                    next_true: jump_branch(instr.step, opcode, instr.seq_t),
                    next_false: jump_branch(instr.step, opcode, instr.seq_f),
                }),
            )
        }
        None => expr,
    }
}

// ---------------------------------------------------------------------
// Arithmetic
// ---------------------------------------------------------------------

fn strip_target_prefix(tokens: Vec<crate::token::Token>) -> Vec<crate::token::Token> {
    let mut tokens = tokens;
    if tokens.len() >= 2
        && tokens[0].kind == TokenKind::Target
        && tokens[1].kind == TokenKind::Op
        && tokens[1].value == "="
    {
        tokens.drain(0..2);
    }
    tokens
}

fn parse_arithmetic(instr: &Instruction, opcode: Opcode, scope: Scope, program: Option<&ProgramVersion>) -> Node {
    let tokens = strip_target_prefix(tokenizer::tokenize(&instr.ins, opcode, instr.ins_tar.as_deref()));

    let mut vars = tokens.iter().filter(|t| t.kind == TokenKind::Var);
    let (left_tok, right_tok) = (vars.next(), vars.next());
    let op_tok = tokens.iter().find(|t| t.kind == TokenKind::Op);
    let round_tok = tokens.iter().find(|t| t.kind == TokenKind::Round);

    let (left_tok, right_tok, op_tok) = match (left_tok, right_tok, op_tok) {
        (Some(l), Some(r), Some(o)) => (l, r, o),
        _ => {
            return Node::raw_fallback(
                instr.step,
                opcode,
                format!("Malformed arithmetic body: {:?}", instr.ins),
            )
        }
    };

    let left = Raw {
        raw: left_tok.value.clone(),
        value: resolver::describe_var(&left_tok.value, scope, program),
        kind: None,
    };
    let right = Raw {
        raw: right_tok.value.clone(),
        value: resolver::describe_var(&right_tok.value, scope, program),
        kind: None,
    };
    let arithmetic = crate::ast::Arithmetic {
        left,
        operator: op_tok.value.clone(),
        right,
        round_spec: round_tok.map(|t| t.value.clone()),
        round_english: round_tok.and_then(|t| t.description.clone()),
    };
    let expr = Node::new(instr.step, opcode, "", NodeKind::Arithmetic(arithmetic));
    wrap_assignment_if_targeted(instr, opcode, scope, expr)
}

// ---------------------------------------------------------------------
// Conditionals: single compare and multi-condition composition
//
// IF bodies are pipe-delimited, surrounded by a leading and trailing
// `|`: a single compare reads `|left|op|right|`, and a multi-condition
// body strings further `(joiner, left, op, right)` quadruples onto the
// same pipe-split token stream, e.g.
// `|GI_1|=|{A}|#|GI_2|=|{B}|^|GI_3|=|{C}|`. The joiner token sitting
// between two clauses is `#` for the base-to-multi transition (no
// joiner semantics of its own) or `^`/`+` for every clause after that.
// ---------------------------------------------------------------------

fn build_triple(parts: &[String], idx: usize, scope: Scope, program: Option<&ProgramVersion>) -> Option<Compare> {
    let left_raw = parts.get(idx)?;
    let op_raw = parts.get(idx + 1)?;
    let right_raw = parts.get(idx + 2)?;
    if left_raw.is_empty() || op_raw.is_empty() || right_raw.is_empty() {
        return None;
    }
    let left = Raw { raw: left_raw.clone(), value: resolver::describe_var(left_raw, scope, program), kind: None };
    let right = Raw { raw: right_raw.clone(), value: resolver::describe_var(right_raw, scope, program), kind: None };
    let operator = resolver::describe_var(op_raw, scope, program);
    Some(Compare { left, operator, right, cond_op: None })
}

/// Degrade policy for a body that doesn't carry the minimum three
/// fragments IF needs (spec.md §7 category 3, `MalformedBody`): the
/// whole raw body becomes `left`, with `op`/`right` left empty, rather
/// than a generic `Raw` error node -- the instruction is still an `If`.
fn malformed_if(instr: &Instruction, opcode: Opcode, scope: Scope, program: Option<&ProgramVersion>, raw: &str) -> Node {
    let left = Raw { raw: raw.to_string(), value: resolver::describe_var(raw, scope, program), kind: None };
    let condition = Condition::Compare(Compare {
        left,
        operator: String::new(),
        right: Raw { raw: String::new(), value: String::new(), kind: None },
        cond_op: None,
    });
    let if_node = If {
        condition: Some(condition),
        true_branch: jump_branch(instr.step, opcode, instr.seq_t),
        false_branch: jump_branch(instr.step, opcode, instr.seq_f),
    };
    Node::new(instr.step, opcode, "IF_COMPARE", NodeKind::If(if_node))
}

fn parse_if(instr: &Instruction, opcode: Opcode, scope: Scope, program: Option<&ProgramVersion>) -> Node {
    let raw = instr.ins.as_str();
    let parts: Vec<String> =
        tokenizer::tokenize_pipe(raw).into_iter().filter(|p| !p.is_empty()).collect();

    if parts.len() < 3 {
        return malformed_if(instr, opcode, scope, program, raw);
    }

    let mut conditions = Vec::new();
    let mut saw_or = false;
    let mut saw_and = false;

    let first = match build_triple(&parts, 0, scope, program) {
        Some(c) => c,
        None => return malformed_if(instr, opcode, scope, program, raw),
    };
    conditions.push(first);

    let mut idx = 3;
    let hash = MULTI_IF_SYMBOL.to_string();
    while idx < parts.len() {
        match parts[idx].as_str() {
            "^" => saw_or = true,
            "+" => saw_and = true,
            s if s == hash => {}
            _ => break,
        }
        idx += 1;
        match build_triple(&parts, idx, scope, program) {
            Some(c) => conditions.push(c),
            None => break,
        }
        idx += 3;
    }

    let condition = if conditions.len() == 1 {
        Condition::Compare(conditions.into_iter().next().unwrap())
    } else {
        let joiner = if saw_or { Joiner::Or } else if saw_and { Joiner::And } else { Joiner::Or };
        Condition::Multi(MultiCondition { conditions, joiner })
    };

    let if_node = If {
        condition: Some(condition),
        true_branch: jump_branch(instr.step, opcode, instr.seq_t),
        false_branch: jump_branch(instr.step, opcode, instr.seq_f),
    };
    Node::new(instr.step, opcode, "IF_COMPARE", NodeKind::If(if_node))
}

// ---------------------------------------------------------------------
// Type checks (IS_ALPHA / IS_DATE / IS_NUMERIC)
// ---------------------------------------------------------------------

fn parse_type_check(instr: &Instruction, opcode: Opcode, scope: Scope, program: Option<&ProgramVersion>) -> Node {
    let tokens = tokenizer::tokenize(&instr.ins, opcode, instr.ins_tar.as_deref());
    let left_tok = tokens.iter().find(|t| matches!(t.kind, TokenKind::Word | TokenKind::Var));
    let left = match left_tok {
        Some(t) => {
            Raw { raw: t.value.clone(), value: resolver::describe_var(&t.value, scope, program), kind: None }
        }
        None => {
            return Node::raw_fallback(
                instr.step,
                opcode,
                format!("Malformed type-check body: {:?}", instr.ins),
            )
        }
    };
    let check_type: &'static str = match opcode {
        Opcode::IsAlpha => "alphabetic",
        Opcode::IsDate => "a date",
        Opcode::IsNumeric => "numeric",
        _ => "of an unrecognized type",
    };
    Node::new(instr.step, opcode, "TYPE_CHECK", NodeKind::TypeCheck(TypeCheck { left, check_type }))
}

// ---------------------------------------------------------------------
// Generic function / data-source / date calls
// ---------------------------------------------------------------------

/// Function names are rendered PascalCase with no separators, matching
/// the two concrete examples spec.md §8 gives (`SetString`,
/// `DateDifference`) rather than the `SCREAMING_SNAKE_CASE` the
/// original's opcode labels use internally.
fn function_name(opcode: Opcode) -> String {
    use Opcode::*;
    match opcode {
        Sum | SumCurrentPath => "Sum",
        Abs => "Abs",
        StringLength => "Length",
        CountCategoryAvailable => "CountAvailable",
        CountCategoryInstance => "CountInstance",
        GetCategoryItem => "GetItem",
        SetCategoryItem => "SetItem",
        GetRankedCategoryItem => "GetRankedItem",
        SetRankedCategoryItem => "SetRankedItem",
        GetCategoryItemAvailable => "GetItemAvailable",
        SetCategoryItemAvailable => "SetItemAvailable",
        RankCategoryAvailable => "RankAvailable",
        RankCategoryInstance => "RankInstance",
        MathFuncExp => "Exp",
        MathFuncLog => "Log",
        MathFuncLog10 => "Log10",
        MathFuncExpe => "ExpE",
        MathFuncRand => "Rand",
        MathFuncFact => "Factorial",
        MathFuncSqrt => "Sqrt",
        MathFuncCeil => "Ceil",
        MathFuncFloor => "Floor",
        MathFuncEven => "RoundEven",
        MathFuncOdd => "RoundOdd",
        TrigFuncCos => "Cos",
        TrigFuncCosh => "Cosh",
        TrigFuncAcos => "Acos",
        TrigFuncAcosh => "Acosh",
        TrigFuncSin => "Sin",
        TrigFuncSinh => "Sinh",
        TrigFuncAsin => "Asin",
        TrigFuncAsinh => "Asinh",
        TrigFuncTan => "Tan",
        TrigFuncTanh => "Tanh",
        TrigFuncAtan => "Atan",
        TrigFuncAtanh => "Atanh",
        TrigFuncDeg => "ToDegrees",
        TrigFuncRad => "ToRadians",
        AssociateHrvValueToHrdValue => "AssociateHrvToHrd",
        QueryDataSource => "QueryDataSource",
        Call => "Call",
        other => return other.label().replace(' ', ""),
    }
    .to_string()
}

fn parse_function(instr: &Instruction, opcode: Opcode, scope: Scope, program: Option<&ProgramVersion>) -> Node {
    let tokens = tokenizer::tokenize(&instr.ins, opcode, instr.ins_tar.as_deref());
    let args: Vec<Raw> = tokens
        .iter()
        .filter(|t| matches!(t.kind, TokenKind::Word | TokenKind::Var))
        .map(|t| Raw { raw: t.value.clone(), value: resolver::describe_var(&t.value, scope, program), kind: None })
        .collect();
    let round_spec = tokens.iter().find(|t| t.kind == TokenKind::Round).map(|t| t.value.clone());
    let func = Function { name: function_name(opcode), args, round_spec };
    let expr = Node::new(instr.step, opcode, "FUNCTION_CALL", NodeKind::Function(func));
    wrap_assignment_if_targeted(instr, opcode, scope, expr)
}

fn parse_date_diff(instr: &Instruction, opcode: Opcode, scope: Scope, program: Option<&ProgramVersion>) -> Node {
    let tokens = tokenizer::tokenize(&instr.ins, opcode, instr.ins_tar.as_deref());
    let args: Vec<Raw> = tokens
        .iter()
        .filter(|t| matches!(t.kind, TokenKind::Word | TokenKind::Var))
        .map(|t| Raw { raw: t.value.clone(), value: resolver::describe_var(&t.value, scope, program), kind: None })
        .collect();
    let name = match opcode {
        Opcode::DateDiffDays | Opcode::DateDiffMonths | Opcode::DateDiffYears => "DateDifference",
        Opcode::DateAddition => "DateAddition",
        _ => "DateDifference",
    }
    .to_string();
    let func = Function { name, args, round_spec: None };
    let expr = Node::new(instr.step, opcode, "DATE_DIFF", NodeKind::Function(func));
    wrap_assignment_if_targeted(instr, opcode, scope, expr)
}

// ---------------------------------------------------------------------
// Sort / mask / rank-flag / empty / string addition
//
// These bypass the template renderer entirely, building their English
// text directly the way `parse_rank_flag`/`parse_sort`/`parse_mask` do
// in the original -- a `Raw` node with `template_id` left empty.
// `SET_STRING` is the one exception in this group: it renders through
// `FUNCTION_CALL` like any other function call, below.
// ---------------------------------------------------------------------

fn parse_sort(instr: &Instruction, opcode: Opcode, scope: Scope, program: Option<&ProgramVersion>) -> Node {
    let parts = tokenizer::tokenize_pipe_first(&instr.ins);
    let text = parts
        .iter()
        .map(|p| resolver::describe_var(p, scope, program))
        .collect::<Vec<_>>()
        .join(" then by ");
    raw_node(instr.step, opcode, &instr.ins, format!("Sort by {}", text))
}

fn parse_mask(instr: &Instruction, opcode: Opcode, scope: Scope, program: Option<&ProgramVersion>) -> Node {
    let parts = tokenizer::tokenize_pipe_first(&instr.ins);
    let text =
        parts.iter().map(|p| resolver::describe_var(p, scope, program)).collect::<Vec<_>>().join(", ");
    raw_node(instr.step, opcode, &instr.ins, format!("Mask on {}", text))
}

fn parse_rank_flag(instr: &Instruction, opcode: Opcode, scope: Scope, program: Option<&ProgramVersion>) -> Node {
    let parts = tokenizer::tokenize_rank_usage(&instr.ins);
    let text =
        parts.iter().map(|p| resolver::describe_var(p, scope, program)).collect::<Vec<_>>().join(", ");
    let verb = match opcode {
        Opcode::FlagAllByUsageSet => "Flag all by usage set",
        Opcode::RankAllByUsageSetCondAsc => "Rank all by usage set, ascending",
        Opcode::RankAllByUsageSetCondDes => "Rank all by usage set, descending",
        _ => "Rank/flag by usage set",
    };
    raw_node(instr.step, opcode, &instr.ins, format!("{} on {}", verb, text))
}

/// `SET_STRING` concatenates literal string pieces (which keep their
/// surrounding `{}` punctuation verbatim -- it's not a bracket literal
/// to resolve, it's the string itself) and variable references, so its
/// args are built straight off the `+`-split body rather than through
/// [`resolver::describe_var`], unlike every other function's args.
fn parse_set_string(instr: &Instruction, opcode: Opcode, scope: Scope, _program: Option<&ProgramVersion>) -> Node {
    let args: Vec<Raw> = tokenizer::tokenize_plus(&instr.ins)
        .into_iter()
        .map(|part| {
            let trimmed = part.trim().to_string();
            Raw { raw: trimmed.clone(), value: trimmed, kind: None }
        })
        .collect();
    let func = Function { name: "SetString".to_string(), args, round_spec: None };
    let expr = Node::new(instr.step, opcode, "FUNCTION_CALL", NodeKind::Function(func));
    wrap_assignment_if_targeted(instr, opcode, scope, expr)
}

fn parse_empty(instr: &Instruction, opcode: Opcode) -> Node {
    raw_node(instr.step, opcode, &instr.ins, "No operation".to_string())
}

fn parse_string_addition(instr: &Instruction, opcode: Opcode, scope: Scope, program: Option<&ProgramVersion>) -> Node {
    let tokens = tokenizer::tokenize(&instr.ins, opcode, instr.ins_tar.as_deref());
    let value = tokens
        .iter()
        .filter(|t| t.kind == TokenKind::Var)
        .map(|t| resolver::describe_var(&t.value, scope, program))
        .collect::<Vec<_>>()
        .join(" & ");
    match &instr.ins_tar {
        Some(target) => {
            let var = resolver::describe_target(target, scope.current);
            raw_node(instr.step, opcode, &instr.ins, format!("Set {} to {}", var, value))
        }
        None => raw_node(instr.step, opcode, &instr.ins, value),
    }
}
