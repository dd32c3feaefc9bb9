//! The seven opcode-dispatched tokenizer strategies, plus the distinct
//! multi-IF segment splitter. Grounded on `ast_decoder/tokenizer.py`'s
//! `dispatch_map` and on `helpers/parse_result.py::find_next_var` for the
//! scan strategy.

use crate::defs::Opcode;
use crate::token::Token;

/// Which strategy an opcode's body is tokenized with. One entry per
/// opcode, exactly as `tokenizer.py`'s `dispatch_map` keys every `InsType`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Strategy {
    Default,
    Pipe,
    Plus,
    PipeFirst,
    TildePipe,
    RankUsage,
    Scan,
}

/// The strategy a given opcode's body is tokenized with. Any opcode not
/// explicitly listed here falls back to [`Strategy::Default`], mirroring
/// `dispatch_map.get(ins_type, (tokenize_default, "DEFAULT"))`.
pub fn strategy_for(opcode: Opcode) -> Strategy {
    use Opcode::*;
    match opcode {
        Arithmetic | Call => Strategy::Scan,
        Mask => Strategy::PipeFirst,

        NumericIf | IfAllAll | IfNoAll | IfAnyAll | IfDate | IfAllCurrentPath
        | IfNoCurrentPath | IfAnyCurrentPath => Strategy::Scan,

        IsAlpha | IsDate | IsNumeric => Strategy::TildePipe,

        Sum | SumCurrentPath => Strategy::Plus,

        StringConcat => Strategy::Scan,
        SetString => Strategy::Plus,

        DateDiffDays | DateDiffMonths | DateDiffYears | DateAddition => Strategy::Pipe,

        GetCategoryItem | SetCategoryItem | GetRankedCategoryItem | SetRankedCategoryItem
        | GetCategoryItemAvailable | SetCategoryItemAvailable => Strategy::Pipe,

        CountCategoryAvailable | CountCategoryInstance => Strategy::Default,
        RankCategoryAvailable | RankCategoryInstance => Strategy::Pipe,

        FlagAllByUsageSet | RankAllByUsageSetCondAsc | RankAllByUsageSetCondDes => {
            Strategy::RankUsage
        }

        MathFuncExp | MathFuncLog | MathFuncLog10 | MathFuncExpe | MathFuncSqrt
        | MathFuncCeil | MathFuncFloor => Strategy::Pipe,
        MathFuncRand | MathFuncFact | MathFuncEven | MathFuncOdd => Strategy::Default,

        TrigFuncCos | TrigFuncCosh | TrigFuncAcos | TrigFuncAcosh | TrigFuncSin
        | TrigFuncSinh | TrigFuncAsin | TrigFuncAsinh | TrigFuncTan | TrigFuncTanh
        | TrigFuncAtan | TrigFuncAtanh | TrigFuncDeg | TrigFuncRad => Strategy::Pipe,

        AssociateHrvValueToHrdValue => Strategy::Default,
        QueryDataSource => Strategy::Pipe,

        _ => Strategy::Default,
    }
}

/// Entry point: tokenize `body` using the strategy registered for
/// `opcode`. `target`, when present, is the assignment's destination
/// variable — only the scan strategy consumes it (emitted as a leading
/// `TARGET`/`=` token pair, per `tokenize_scan`).
pub fn tokenize(body: &str, opcode: Opcode, target: Option<&str>) -> Vec<Token> {
    match strategy_for(opcode) {
        Strategy::Default => words(tokenize_default(body)),
        Strategy::Pipe => words(tokenize_pipe(body)),
        Strategy::Plus => words(tokenize_plus(body)),
        Strategy::PipeFirst => words(tokenize_pipe_first(body)),
        Strategy::TildePipe => words(tokenize_tilde_pipe(body)),
        Strategy::RankUsage => words(tokenize_rank_usage(body)),
        Strategy::Scan => tokenize_scan(body, opcode, target),
    }
}

fn words(raw_parts: Vec<String>) -> Vec<Token> {
    raw_parts.into_iter().map(Token::word).collect()
}

pub fn tokenize_default(raw: &str) -> Vec<String> {
    if raw.is_empty() { vec![] } else { vec![raw.to_string()] }
}

pub fn tokenize_pipe(raw: &str) -> Vec<String> {
    if raw.is_empty() { vec![] } else { raw.split('|').map(str::to_string).collect() }
}

pub fn tokenize_plus(raw: &str) -> Vec<String> {
    if raw.is_empty() { vec![] } else { raw.split('+').map(str::to_string).collect() }
}

pub fn tokenize_pipe_first(raw: &str) -> Vec<String> {
    if raw.is_empty() {
        return vec![];
    }
    match raw.find('|') {
        None => vec![raw.to_string()],
        Some(idx) => vec![raw[..idx].to_string(), raw[idx + 1..].to_string()],
    }
}

pub fn tokenize_tilde_pipe(raw: &str) -> Vec<String> {
    if raw.is_empty() {
        return vec![];
    }
    let core = match raw.find('~') {
        Some(idx) => &raw[idx + 1..],
        None => raw,
    };
    core.split('|').map(str::to_string).collect()
}

pub fn tokenize_rank_usage(raw: &str) -> Vec<String> {
    if raw.is_empty() {
        return vec![];
    }
    let core = if let Some(idx) = raw.find('~') {
        &raw[idx + 1..]
    } else if let Some(idx) = raw.find('|') {
        &raw[idx + 1..]
    } else {
        ""
    };
    core.split('|').map(str::to_string).collect()
}

/// The multi-IF segment splitter: the base clause (before the first `^`
/// or `+`) followed by each `^`/`+`-prefixed fragment, each with its
/// leading `~` stripped. This is the distinct token stream the
/// multi-clause composer (§4.5) feeds one clause at a time into the
/// single-clause IF parser.
pub fn tokenize_multi_if(raw: &str) -> Vec<String> {
    if raw.is_empty() {
        return vec![];
    }
    let split_at = raw.find(['^', '+']);
    let (base_raw, tail) = match split_at {
        Some(idx) => (&raw[..idx], &raw[idx..]),
        None => (raw, ""),
    };
    let base = strip_tilde_prefix(base_raw);
    let mut segments = vec![base.to_string()];

    let bytes = tail.as_bytes();
    let mut i = 0usize;
    while i < bytes.len() {
        let op = bytes[i] as char;
        if op != '^' && op != '+' {
            i += 1;
            continue;
        }
        let mut j = i + 1;
        while j < bytes.len() && bytes[j] as char != '^' && bytes[j] as char != '+' {
            j += 1;
        }
        let raw_seg = &tail[i + 1..j];
        let seg = strip_tilde_prefix(raw_seg);
        segments.push(format!("{}{}", op, seg));
        i = j;
    }
    segments
}

fn strip_tilde_prefix(s: &str) -> &str {
    match s.find('~') {
        Some(idx) => &s[idx + 1..],
        None => s,
    }
}

/// The character-scanning strategy: walks `body` byte by byte, splitting
/// on operator characters while tracking `{...}`/`[...]` bracket depth,
/// and recognizing a trailing round-spec after each operand.
/// Grounded on `helpers/parse_result.py::find_next_var`.
pub fn tokenize_scan(raw: &str, opcode: Opcode, target: Option<&str>) -> Vec<Token> {
    let mut tokens = Vec::new();
    if let Some(target) = target {
        tokens.push(Token::target(target));
        tokens.push(Token::op("=", "[equals]"));
    }

    let is_set_string = opcode == Opcode::SetString;
    let chars: Vec<char> = raw.chars().collect();
    let len = chars.len();
    let mut ptr = 0usize;

    while ptr < len {
        let scan = find_next_var(&chars, ptr, is_set_string);
        if scan.variable.is_empty() {
            break;
        }
        ptr = scan.next_ptr;
        tokens.push(Token::var(scan.variable));

        if !scan.round_token.is_empty() {
            let (desc, emit_token) = round_english(&scan.round_token, &scan.round_var);
            if emit_token {
                tokens.push(Token::round(scan.round_token, desc));
            }
        }

        if let Some(phrase) = scan.op_phrase {
            if scan.op_symbol != '!' {
                tokens.push(Token::op(scan.op_symbol.to_string(), phrase));
            }
        }
    }

    tokens
}

struct ScanResult {
    variable: String,
    op_symbol: char,
    op_phrase: Option<String>,
    round_var: String,
    round_token: String,
    next_ptr: usize,
}

fn is_operator(c: char) -> bool {
    matches!(c, '+' | '-' | '*' | '/' | '!' | '|' | '@' | '^' | '#')
}

/// Port of `find_next_var`: returns the next variable run starting at
/// `ptr`, the operator that terminated it (if any), and any rounding
/// suffix immediately following that operator.
fn find_next_var(chars: &[char], ptr: usize, is_set_string: bool) -> ScanResult {
    let len = chars.len();
    let mut ptr = ptr;

    if !is_set_string {
        while ptr < len && chars[ptr].is_whitespace() {
            ptr += 1;
        }
    }
    if ptr >= len {
        return done(ptr);
    }

    let var_start = ptr;
    let mut inside_brackets = false;
    while ptr < len {
        let c = chars[ptr];
        if !inside_brackets
            && is_operator(c)
            && ptr + 1 < len
            && !is_operator(chars[ptr + 1])
        {
            break;
        }
        if c == '{' || c == '[' {
            if ptr + 1 < len {
                if chars[ptr + 1] != '}' && chars[ptr + 1] != ']' {
                    inside_brackets = true;
                }
            } else {
                ptr += 1;
            }
        } else if inside_brackets && (c == '}' || c == ']') {
            inside_brackets = false;
        }
        ptr += 1;
    }

    let variable: String = chars[var_start..ptr].iter().collect();
    if variable.is_empty() {
        return done(ptr);
    }

    let mut op_symbol = '\0';
    let mut op_phrase = None;
    if ptr < len {
        op_symbol = chars[ptr];
        op_phrase = operator_to_phrase(op_symbol, &variable);
        ptr += 1;
    }

    let mut round_var = "NR".to_string();
    let mut round_token = String::new();
    let tail: String = chars[ptr.min(len)..].iter().collect();
    if tail.starts_with("RP") || tail.starts_with("RM") {
        if tail.len() == 2 {
            round_token = tail.clone();
            ptr += 2;
        } else {
            round_token = tail.chars().take(3).collect();
            ptr += round_token.chars().count();
        }
    } else if tail.starts_with("RN") {
        round_token = "RN".to_string();
        ptr += 2;
    } else if tail.starts_with('R') && !tail.starts_with("RV") {
        ptr += 1;
        let start = ptr;
        while ptr < len && chars[ptr].is_alphanumeric() {
            ptr += 1;
        }
        let suffix: String = chars[start..ptr].iter().collect();
        round_var = suffix.clone();
        round_token = format!("R{}", suffix);
    }

    ScanResult {
        variable,
        op_symbol,
        op_phrase,
        round_var,
        round_token,
        next_ptr: ptr,
    }
}

fn done(ptr: usize) -> ScanResult {
    ScanResult {
        variable: String::new(),
        op_symbol: '\0',
        op_phrase: None,
        round_var: "NR".to_string(),
        round_token: String::new(),
        next_ptr: ptr,
    }
}

fn operator_to_phrase(op: char, variable: &str) -> Option<String> {
    Some(match op {
        '+' => "plus".to_string(),
        '-' => {
            if variable == "GI_" {
                return None;
            }
            "minus".to_string()
        }
        '*' => "multiplied by".to_string(),
        '/' => "divided by".to_string(),
        '@' => "bitwise AND".to_string(),
        '^' => "bitwise OR".to_string(),
        '=' => "equals".to_string(),
        _ => return None,
    })
}

/// English phrasing for a round token, and whether a `ROUND` token should
/// be emitted at all (an `RS` marker is consumed silently).
/// Grounded on `tokenizer.py::tokenize_scan`'s `match round_token`.
fn round_english(round_token: &str, round_var: &str) -> (String, bool) {
    if let Some(places) = round_token.strip_prefix("RP") {
        (format!("Round Up {}", places), true)
    } else if let Some(places) = round_token.strip_prefix("RM") {
        (format!("Truncate {}", places), true)
    } else if round_token == "RN" {
        ("No Round".to_string(), true)
    } else if round_token == "RS" {
        (String::new(), false)
    } else {
        (format!("Round {}", round_var), true)
    }
}
