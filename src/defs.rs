//! Opcode enumeration and the variable-token grammar shared by the
//! tokenizer, parser and symbol resolver.
//!
//! Numeric discriminants match the legacy `InsType` table byte-for-byte;
//! they are load-bearing, not incidental, since instructions on disk carry
//! only the numeric code.

use num_derive::{FromPrimitive, ToPrimitive};
use util::EnumFromStr;
use util_derive::EnumFromStr;

/// One opcode from the closed, ~90-member instruction set.
///
/// `Unknown` is not part of the legacy numbering; it is the registry's
/// fallback discriminant for any numeric code the table doesn't recognize
/// (see [`Opcode::from_code`]).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, FromPrimitive, ToPrimitive)]
pub enum Opcode {
    Unknown = -1,

    Arithmetic = 0,
    NumericIf = 1,
    Call = 2,
    Sort = 3,
    Mask = 4,
    SetString = 5,
    Empty = 6,

    IfAllAll = 50,
    IfNoAll = 51,
    IfAnyAll = 52,
    IfAllCurrentPath = 53,
    IfNoCurrentPath = 54,
    IfAnyCurrentPath = 55,
    IfDate = 56,

    DateDiffDays = 57,
    DateDiffMonths = 58,
    DateDiffYears = 59,
    DateAddition = 126,

    Sum = 60,
    SumCurrentPath = 87,
    StringConcat = 86,

    Abs = 84,
    StringLength = 85,
    CountCategoryAvailable = 89,
    CountCategoryInstance = 90,

    GetCategoryItem = 120,
    SetCategoryItem = 121,
    GetRankedCategoryItem = 122,
    SetRankedCategoryItem = 123,
    GetCategoryItemAvailable = 124,
    SetCategoryItemAvailable = 125,
    RankCategoryAvailable = 93,
    RankCategoryInstance = 94,

    FlagAllByUsageSet = 113,
    RankAllByUsageSetCondAsc = 118,
    RankAllByUsageSetCondDes = 119,

    MathFuncExp = 127,
    MathFuncLog = 128,
    MathFuncLog10 = 129,
    MathFuncExpe = 130,
    MathFuncRand = 131,
    MathFuncFact = 132,
    MathFuncSqrt = 133,
    MathFuncCeil = 134,
    MathFuncFloor = 135,
    MathFuncEven = 136,
    MathFuncOdd = 137,

    TrigFuncCos = 138,
    TrigFuncCosh = 139,
    TrigFuncAcos = 140,
    TrigFuncAcosh = 141,
    TrigFuncSin = 142,
    TrigFuncSinh = 143,
    TrigFuncAsin = 144,
    TrigFuncAsinh = 145,
    TrigFuncTan = 146,
    TrigFuncTanh = 147,
    TrigFuncAtan = 148,
    TrigFuncAtanh = 149,
    TrigFuncDeg = 150,
    TrigFuncRad = 151,

    IsAlpha = 99,
    IsDate = 95,
    IsNumeric = 98,

    AssociateHrvValueToHrdValue = 110,
    QueryDataSource = 200,

    SetUnderwritingToFail = 254,
}

impl Opcode {
    /// Decode a numeric instruction-type code into an [`Opcode`], falling
    /// back to `Unknown` for any code outside the closed table.
    ///
    /// Mirrors `get_ins_type_def`: a missing or unparseable code is never
    /// an error, just `Unknown`.
    pub fn from_code(code: i32) -> Opcode {
        num_traits::FromPrimitive::from_i32(code).unwrap_or(Opcode::Unknown)
    }

    pub fn to_code(self) -> i32 {
        num_traits::ToPrimitive::to_i32(&self).unwrap_or(-1)
    }

    /// A human label derived from the variant name, e.g. `TrigFuncSin` ->
    /// `"Trig Func Sin"`. Used where the legacy code did
    /// `ins_type.name.replace("_", " ").title()`.
    pub fn label(self) -> String {
        let debug = format!("{:?}", self);
        let mut out = String::with_capacity(debug.len() + 8);
        for (i, c) in debug.char_indices() {
            if i > 0 && c.is_uppercase() {
                out.push(' ');
            }
            out.push(c);
        }
        out
    }
}

/// The two-letter variable-family prefix, e.g. `GI` in `GI_494`.
///
/// Every prefix the legacy scoping tables recognize (`VAR_PREFIXES`) is a
/// variant here; an unrecognized prefix is a resolver error, not a panic —
/// callers fall back to the raw token text.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, EnumFromStr)]
pub enum Prefix {
    LS,
    PL,
    GL,
    GI,
    GR,
    PR,
    PC,
    GC,
    PP,
    GP,
    IG,
    LX,
    IX,
    PQ,
    GQ,
}

/// The jump-index sentinel values a `seq_t`/`seq_f` field can carry,
/// distinct from an ordinary positive step number.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum JumpIndex {
    ExitLoop,
    Done,
    NextStep,
    Step(i32),
}

impl JumpIndex {
    pub fn classify(value: i32, current_step: u32) -> JumpIndex {
        match value {
            -2 => JumpIndex::ExitLoop,
            -1 => JumpIndex::Done,
            0 => JumpIndex::NextStep,
            n => JumpIndex::Step(n),
        }
        .resolved(current_step)
    }

    fn resolved(self, _current_step: u32) -> JumpIndex {
        self
    }

    /// English phrasing for a jump target, mirroring `get_next_step_english`.
    pub fn english(self, current_step: u32) -> String {
        match self {
            JumpIndex::ExitLoop => "EXIT_LOOP".to_string(),
            JumpIndex::Done => "DONE".to_string(),
            JumpIndex::NextStep => format!("Step {}", current_step + 1),
            JumpIndex::Step(n) => format!("Step {}", n),
        }
    }
}

pub const MULTI_IF_SYMBOL: char = '#';

/// A parsed variable token: its family prefix, numeric index, and an
/// optional sub-index after a `.` (e.g. `PC_456.2`).
#[derive(Clone, Debug)]
pub struct VarToken {
    pub prefix: Prefix,
    pub index: u32,
    pub sub_index: Option<u32>,
}

/// Split a raw variable token such as `"PC_456.2"`, `"~GI_123"`, or
/// `"DGR_4740"` into its prefix, index and optional sub-index.
///
/// Strips one leading `~` or `D`, then requires the `XX_<digits>` shape.
/// Any malformed token is reported as `None` so callers can fall back to
/// the raw text rather than aborting (`MalformedToken`, never panics).
pub fn split_var_token(token: &str) -> Option<VarToken> {
    let stripped = if let Some(rest) = token.strip_prefix('~') {
        rest
    } else if let Some(rest) = token.strip_prefix('D') {
        rest
    } else {
        token
    };

    if stripped.len() < 3 {
        return None;
    }
    let (prefix_str, rest) = stripped.split_at(2);
    let rest = rest.strip_prefix('_')?;

    let prefix = <Prefix as EnumFromStr>::from_str(prefix_str).ok()?;

    let (main, sub) = match rest.find('.') {
        Some(dot) => {
            let (main_str, sub_str) = (&rest[..dot], &rest[dot + 1..]);
            if main_str.is_empty() || sub_str.is_empty() {
                return None;
            }
            (main_str.parse::<u32>().ok()?, Some(sub_str.parse::<u32>().ok()?))
        }
        None => {
            if rest.is_empty() {
                return None;
            }
            (rest.parse::<u32>().ok()?, None)
        }
    };

    Some(VarToken { prefix, index: main, sub_index: sub })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opcode_round_trips_known_codes() {
        assert_eq!(Opcode::from_code(1), Opcode::NumericIf);
        assert_eq!(Opcode::from_code(494949), Opcode::Unknown);
        assert_eq!(Opcode::NumericIf.to_code(), 1);
    }

    #[test]
    fn opcode_label_splits_camel_case() {
        assert_eq!(Opcode::TrigFuncSin.label(), "Trig Func Sin");
    }

    #[test]
    fn split_var_token_basic() {
        let v = split_var_token("GI_494").unwrap();
        assert_eq!(v.prefix, Prefix::GI);
        assert_eq!(v.index, 494);
        assert!(v.sub_index.is_none());
    }

    #[test]
    fn split_var_token_strips_tilde_and_leading_d() {
        let v = split_var_token("~GI_123").unwrap();
        assert_eq!(v.index, 123);
        let v = split_var_token("DGR_4740").unwrap();
        assert_eq!(v.prefix, Prefix::GR);
        assert_eq!(v.index, 4740);
    }

    #[test]
    fn split_var_token_with_sub_index() {
        let v = split_var_token("PC_456.2").unwrap();
        assert_eq!(v.prefix, Prefix::PC);
        assert_eq!(v.index, 456);
        assert_eq!(v.sub_index, Some(2));
    }

    #[test]
    fn split_var_token_rejects_malformed() {
        assert!(split_var_token("nope").is_none());
        assert!(split_var_token("GI_").is_none());
        assert!(split_var_token("ZZ_5").is_none());
    }

    #[test]
    fn jump_index_classifies_sentinels() {
        assert_eq!(JumpIndex::classify(-2, 3), JumpIndex::ExitLoop);
        assert_eq!(JumpIndex::classify(-1, 3), JumpIndex::Done);
        assert_eq!(JumpIndex::classify(0, 3), JumpIndex::NextStep);
        assert_eq!(JumpIndex::classify(7, 3), JumpIndex::Step(7));
        assert_eq!(JumpIndex::classify(0, 3).english(3), "Step 4");
    }
}
