//! Small English-phrasing helpers used by the renderer, ported from
//! `ast_decoder/helpers/ins_helpers.py`.

/// Map a raw comparison/arithmetic operator symbol to its English phrase.
/// Anything unrecognized passes through unchanged.
pub fn operator_english(op: &str) -> String {
    match op {
        "=" => "equals".to_string(),
        ">" => "greater than".to_string(),
        "<" => "less than".to_string(),
        "<=" => "less than or equal to".to_string(),
        ">=" => "greater than or equal to".to_string(),
        "!=" | "<>" => "not equal to".to_string(),
        "@" => "bitwise AND".to_string(),
        "^" => "bitwise OR".to_string(),
        other => other.to_string(),
    }
}

/// English phrasing for an `ArithmeticNode`/`FunctionNode` round-spec,
/// ported from `get_round_english`.
pub fn round_english(round_spec: &str) -> String {
    if round_spec.is_empty() {
        return String::new();
    }
    if let Some(places) = round_spec.strip_prefix("RP") {
        let places = if places.is_empty() { "0" } else { places };
        return format!("Round Up {} place(s)", places);
    }
    if let Some(places) = round_spec.strip_prefix("RM") {
        let places = if places.is_empty() { "0" } else { places };
        return format!("Truncate {} place(s)", places);
    }
    if round_spec.starts_with("RN") {
        return "No Round".to_string();
    }
    if round_spec.starts_with("NR") || round_spec.starts_with("RS") {
        return round_spec.to_string();
    }
    if let Some(places) = round_spec.strip_prefix('R') {
        return format!("Round to {} place(s)", places);
    }
    round_spec.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operator_english_maps_known_symbols() {
        assert_eq!(operator_english("<>"), "not equal to");
        assert_eq!(operator_english("@"), "bitwise AND");
        assert_eq!(operator_english("~weird~"), "~weird~");
    }

    #[test]
    fn round_english_covers_every_prefix() {
        assert_eq!(round_english("RP2"), "Round Up 2 place(s)");
        assert_eq!(round_english("RM1"), "Truncate 1 place(s)");
        assert_eq!(round_english("RN"), "No Round");
        assert_eq!(round_english("RS"), "RS");
        assert_eq!(round_english("R2"), "Round to 2 place(s)");
        assert_eq!(round_english(""), "");
    }
}
