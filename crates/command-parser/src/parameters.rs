//! Parameter extraction for drone commands
//!
//! Each parameter is described by a [`ParameterSpec`]: ordered extraction
//! patterns plus unit and synonym tables. Numeric values are normalized to
//! centimeters or degrees and stored as integers.

use crate::error::Result;
use crate::normalize::normalize;
use crate::types::{CommandContext, Parameters};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::f64::consts::PI;

/// Value type of a parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterKind {
    Number,
    Enum,
    Text,
}

/// Static description of one extractable parameter
#[derive(Debug, Clone, Copy)]
pub struct ParameterSpec {
    pub name: &'static str,
    pub kind: ParameterKind,
    /// Capture group 1 holds the value, group 2 (numbers only) the unit
    pub patterns: &'static [&'static str],
    /// Unit token to canonical-unit multiplier
    pub units: &'static [(&'static str, f64)],
    /// Fixed phrases that stand for a numeric value (`半回転` = 180)
    pub phrases: &'static [(&'static str, f64)],
    /// Captured text to canonical value
    pub synonyms: &'static [(&'static str, &'static str)],
}

macro_rules! decimal {
    () => {
        r"(-?\d+(?:\.\d+)?)"
    };
}

/// A sign only counts at a token start, so the hyphen in `1-2m` is not a minus
macro_rules! number {
    () => {
        concat!(r"(?:^|[^0-9A-Za-z.])", decimal!())
    };
}

macro_rules! length_unit {
    () => {
        concat!(
            "(centimeters?|millimeters?|meters?",
            "|センチメートル|ミリメートル|メートル|センチ|ミリ|cm|mm|m)"
        )
    };
}

macro_rules! direction_word {
    () => {
        concat!(
            "(反時計回り|時計回り|左回り|右回り",
            "|前方|前進|後方|後退|後ろ|前|後|左|右|上昇|下降|上|下",
            "|counter-?clockwise|clockwise|forward|backward|back|left|right|up|down)"
        )
    };
}

const LENGTH_UNITS: &[(&str, f64)] = &[
    ("センチメートル", 1.0),
    ("ミリメートル", 0.1),
    ("メートル", 100.0),
    ("センチ", 1.0),
    ("ミリ", 0.1),
    ("centimeters", 1.0),
    ("centimeter", 1.0),
    ("millimeters", 0.1),
    ("millimeter", 0.1),
    ("meters", 100.0),
    ("meter", 100.0),
    ("cm", 1.0),
    ("mm", 0.1),
    ("m", 100.0),
];

const ANGLE_UNITS: &[(&str, f64)] = &[
    ("度", 1.0),
    ("°", 1.0),
    ("degrees", 1.0),
    ("degree", 1.0),
    ("deg", 1.0),
    ("ラジアン", 180.0 / PI),
    ("rad", 180.0 / PI),
];

const DIRECTION_SYNONYMS: &[(&str, &str)] = &[
    ("前", "forward"),
    ("前方", "forward"),
    ("前進", "forward"),
    ("forward", "forward"),
    ("後ろ", "back"),
    ("後", "back"),
    ("後方", "back"),
    ("後退", "back"),
    ("back", "back"),
    ("backward", "back"),
    ("左", "left"),
    ("left", "left"),
    ("右", "right"),
    ("right", "right"),
    ("上", "up"),
    ("上昇", "up"),
    ("up", "up"),
    ("下", "down"),
    ("下降", "down"),
    ("down", "down"),
    ("時計回り", "clockwise"),
    ("右回り", "clockwise"),
    ("clockwise", "clockwise"),
    ("反時計回り", "counterclockwise"),
    ("左回り", "counterclockwise"),
    ("counterclockwise", "counterclockwise"),
    ("counter-clockwise", "counterclockwise"),
];

const QUALITY_SYNONYMS: &[(&str, &str)] = &[
    ("最高画質", "high"),
    ("高画質", "high"),
    ("高品質", "high"),
    ("高解像度", "high"),
    ("最高", "high"),
    ("高", "high"),
    ("high", "high"),
    ("標準画質", "medium"),
    ("標準", "medium"),
    ("普通", "medium"),
    ("medium", "medium"),
    ("低画質", "low"),
    ("低品質", "low"),
    ("低", "low"),
    ("low", "low"),
];

/// Pairs of canonical directions that cannot both apply to one slot
const OPPOSITE_DIRECTIONS: &[(&str, &str)] = &[
    ("forward", "back"),
    ("left", "right"),
    ("up", "down"),
    ("clockwise", "counterclockwise"),
];

const DIRECTION: &str = "direction";

const DIRECTION_PATTERN: &str = direction_word!();

/// Words that contain a direction kanji without naming a direction.
/// Masked out before direction extraction and conflict detection.
const NON_DIRECTION_COMPOUNDS: &str = concat!(
    "以下|以上|以前|以降|午前|午後|直前|直後|名前|前回|最後|最上",
    "|地上|上空|上手|下手|上記|下記|後で|その後",
    r"|[\p{Han}&&[^前真斜右左]]後"
);

/// Parameter table, in extraction order
pub const PARAMETERS: &[ParameterSpec] = &[
    ParameterSpec {
        name: "distance",
        kind: ParameterKind::Number,
        patterns: &[
            concat!(
                number!(),
                r"\s*",
                length_unit!(),
                r"\s*(?:ほど|くらい|ぐらい)?\s*(?:移動|前進|後退|進|動|行)"
            ),
            concat!(number!(), r"\s*", length_unit!(), r"(?:[^a-z]|$)"),
        ],
        units: LENGTH_UNITS,
        phrases: &[],
        synonyms: &[],
    },
    ParameterSpec {
        name: "height",
        kind: ParameterKind::Number,
        patterns: &[
            concat!(r"(?:高さ|高度)\s*(?:を|は)?\s*", decimal!(), r"\s*", length_unit!()),
            concat!(
                number!(),
                r"\s*",
                length_unit!(),
                r"\s*(?:の高さ|の高度|上昇|下降|上が|下が|まで)"
            ),
            concat!(
                r"(?:altitude|height)\s*(?:of|to)?\s*",
                decimal!(),
                r"\s*(centimeters?|millimeters?|meters?|cm|mm|m)"
            ),
        ],
        units: LENGTH_UNITS,
        phrases: &[],
        synonyms: &[],
    },
    ParameterSpec {
        name: "angle",
        kind: ParameterKind::Number,
        patterns: &[
            concat!(number!(), r"\s*(度|°|degrees?|deg|ラジアン|rad)"),
            r"(半回転|一回転|1回転|一周)",
        ],
        units: ANGLE_UNITS,
        phrases: &[
            ("半回転", 180.0),
            ("一回転", 360.0),
            ("1回転", 360.0),
            ("一周", 360.0),
        ],
        synonyms: &[],
    },
    ParameterSpec {
        name: DIRECTION,
        kind: ParameterKind::Enum,
        // Particle-anchored forms first, the bare word as a fallback
        patterns: &[
            concat!(direction_word!(), r"\s*(?:に|へ|方向|向き)"),
            DIRECTION_PATTERN,
        ],
        units: &[],
        phrases: &[],
        synonyms: DIRECTION_SYNONYMS,
    },
    ParameterSpec {
        name: "quality",
        kind: ParameterKind::Enum,
        patterns: &[
            "(最高画質|高画質|高品質|高解像度|標準画質|低画質|低品質|high|medium|low)",
            r"画質\s*(?:を|は)?\s*([^\s、。を]+?)\s*(?:で|に)",
        ],
        units: &[],
        phrases: &[],
        synonyms: QUALITY_SYNONYMS,
    },
    ParameterSpec {
        name: "filename",
        kind: ParameterKind::Text,
        patterns: &[
            r"([A-Za-z0-9_\-]+\.(?:jpe?g|png|mp4|mov))",
            r"ファイル名\s*(?:を|は)?\s*「([^」]+)」",
            r"「([^」]+)」という名前",
        ],
        units: &[],
        phrases: &[],
        synonyms: &[],
    },
    ParameterSpec {
        name: "drone_id",
        kind: ParameterKind::Text,
        patterns: &[
            r"(drone-[a-z0-9][a-z0-9\-]*)",
            r"ドローン\s*([A-Za-z0-9][A-Za-z0-9\-]*)",
            r"(\d+)\s*番目?",
        ],
        units: &[],
        phrases: &[],
        synonyms: &[],
    },
];

/// Look up a parameter description by name
pub fn find_parameter(name: &str) -> Option<&'static ParameterSpec> {
    PARAMETERS.iter().find(|spec| spec.name == name)
}

struct CompiledParameter {
    spec: &'static ParameterSpec,
    patterns: Vec<Regex>,
}

/// Extracts typed parameter values from command text
pub struct ParameterExtractor {
    parameters: Vec<CompiledParameter>,
    directions: Regex,
    compounds: Regex,
}

impl ParameterExtractor {
    /// Compile the parameter table
    pub fn new() -> Result<Self> {
        let mut parameters = Vec::with_capacity(PARAMETERS.len());
        for spec in PARAMETERS {
            let patterns = spec
                .patterns
                .iter()
                .map(|p| Regex::new(&format!("(?i){}", p)))
                .collect::<std::result::Result<Vec<_>, _>>()?;
            parameters.push(CompiledParameter { spec, patterns });
        }

        Ok(Self {
            parameters,
            directions: Regex::new(&format!("(?i){}", DIRECTION_PATTERN))?,
            compounds: Regex::new(NON_DIRECTION_COMPOUNDS)?,
        })
    }

    /// Extract every parameter found in `text`, then fill gaps from `context`.
    ///
    /// For each parameter the first pattern that captures wins. Context
    /// values never overwrite an extracted value.
    pub fn extract(&self, text: &str, context: Option<&CommandContext>) -> Parameters {
        let text = normalize(text);
        let mut params = Parameters::new();

        for parameter in &self.parameters {
            let source = self.source_text(parameter.spec, &text);
            if let Some(value) = self.extract_one(parameter, &source) {
                params.insert(parameter.spec.name.to_string(), value);
            }
        }

        if let Some(context) = context {
            merge_context(&mut params, context);
        }

        tracing::debug!(?params, "extracted parameters");
        params
    }

    /// Whether any pattern of parameter `name` matches `text`
    pub fn matches(&self, name: &str, text: &str) -> bool {
        let text = normalize(text);
        self.parameters
            .iter()
            .find(|p| p.spec.name == name)
            .map(|p| {
                let source = self.source_text(p.spec, &text);
                p.patterns.iter().any(|re| re.is_match(&source))
            })
            .unwrap_or(false)
    }

    /// True when the text names two opposite directions (e.g. 前 and 後ろ)
    pub fn has_conflicting_directions(&self, text: &str) -> bool {
        let text = normalize(text);
        let text = self.compounds.replace_all(&text, " ");
        let found: Vec<&str> = self
            .directions
            .find_iter(&text)
            .filter_map(|m| canonical(DIRECTION_SYNONYMS, m.as_str()))
            .collect();

        OPPOSITE_DIRECTIONS
            .iter()
            .any(|(a, b)| found.contains(a) && found.contains(b))
    }

    /// Text a parameter is extracted from; directions skip compound words
    fn source_text<'a>(&self, spec: &ParameterSpec, text: &'a str) -> Cow<'a, str> {
        if spec.name == DIRECTION {
            self.compounds.replace_all(text, " ")
        } else {
            Cow::Borrowed(text)
        }
    }

    fn extract_one(
        &self,
        parameter: &CompiledParameter,
        text: &str,
    ) -> Option<serde_json::Value> {
        let spec = parameter.spec;
        for pattern in &parameter.patterns {
            let Some(captures) = pattern.captures(text) else {
                continue;
            };
            let Some(raw) = captures.get(1).map(|m| m.as_str()) else {
                continue;
            };

            let value = match spec.kind {
                ParameterKind::Number => {
                    let unit = captures.get(2).map(|m| m.as_str());
                    to_canonical_number(spec, raw, unit).map(serde_json::Value::from)
                }
                ParameterKind::Enum => Some(serde_json::Value::from(
                    canonical(spec.synonyms, raw).unwrap_or(raw),
                )),
                ParameterKind::Text => Some(serde_json::Value::from(raw)),
            };

            if value.is_some() {
                return value;
            }
        }
        None
    }
}

/// Copy context fields into `params` without overwriting existing keys
pub fn merge_context(params: &mut Parameters, context: &CommandContext) {
    for (key, value) in context {
        params.entry(key.clone()).or_insert_with(|| value.clone());
    }
}

/// Convert a captured number (or phrase) to an integer in the canonical unit
fn to_canonical_number(spec: &ParameterSpec, raw: &str, unit: Option<&str>) -> Option<i64> {
    let value = match raw.parse::<f64>() {
        Ok(number) => {
            let factor = match unit {
                Some(unit) => lookup(spec.units, unit)?,
                None => 1.0,
            };
            number * factor
        }
        Err(_) => lookup(spec.phrases, raw)?,
    };
    Some(value.round() as i64)
}

fn lookup(table: &[(&str, f64)], key: &str) -> Option<f64> {
    let key = key.to_lowercase();
    table.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
}

fn canonical(synonyms: &[(&'static str, &'static str)], raw: &str) -> Option<&'static str> {
    let key = raw.to_lowercase();
    synonyms.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn extractor() -> ParameterExtractor {
        ParameterExtractor::new().unwrap()
    }

    #[test]
    fn test_meters_and_centimeters_agree() {
        let ex = extractor();
        let a = ex.extract("前に2m移動", None);
        let b = ex.extract("前に200cm移動", None);
        assert_eq!(a.get("distance"), Some(&json!(200)));
        assert_eq!(a.get("distance"), b.get("distance"));
        assert_eq!(a.get("direction"), Some(&json!("forward")));
    }

    #[test]
    fn test_millimeters_round_to_centimeters() {
        let ex = extractor();
        let params = ex.extract("右に155mm移動", None);
        assert_eq!(params.get("distance"), Some(&json!(16)));
    }

    #[test]
    fn test_fractional_meters() {
        let ex = extractor();
        let params = ex.extract("後ろに1.5メートル進んで", None);
        assert_eq!(params.get("distance"), Some(&json!(150)));
        assert_eq!(params.get("direction"), Some(&json!("back")));
    }

    #[test]
    fn test_full_width_input() {
        let ex = extractor();
        let params = ex.extract("左に３ｍ移動", None);
        assert_eq!(params.get("distance"), Some(&json!(300)));
        assert_eq!(params.get("direction"), Some(&json!("left")));
    }

    #[test]
    fn test_negative_distance_is_kept() {
        let ex = extractor();
        let params = ex.extract("前に-2m移動", None);
        assert_eq!(params.get("distance"), Some(&json!(-200)));
    }

    #[test]
    fn test_angle_and_rotation_direction() {
        let ex = extractor();
        let params = ex.extract("時計回りに90度回転", None);
        assert_eq!(params.get("angle"), Some(&json!(90)));
        assert_eq!(params.get("direction"), Some(&json!("clockwise")));

        let params = ex.extract("反時計回りに45度回転", None);
        assert_eq!(params.get("direction"), Some(&json!("counterclockwise")));
    }

    #[test]
    fn test_angle_phrases_and_radians() {
        let ex = extractor();
        assert_eq!(ex.extract("半回転して", None).get("angle"), Some(&json!(180)));
        assert_eq!(ex.extract("右に一回転", None).get("angle"), Some(&json!(360)));
        assert_eq!(ex.extract("右に3.1416rad回転", None).get("angle"), Some(&json!(180)));
    }

    #[test]
    fn test_height() {
        let ex = extractor();
        let params = ex.extract("高度を3mにして", None);
        assert_eq!(params.get("height"), Some(&json!(300)));

        let params = ex.extract("50cm上昇", None);
        assert_eq!(params.get("height"), Some(&json!(50)));
        assert_eq!(params.get("direction"), Some(&json!("up")));
    }

    #[test]
    fn test_quality_synonyms_and_passthrough() {
        let ex = extractor();
        assert_eq!(ex.extract("高画質で写真", None).get("quality"), Some(&json!("high")));
        assert_eq!(ex.extract("画質を普通で撮影", None).get("quality"), Some(&json!("medium")));
        // Unknown quality words are kept as captured
        assert_eq!(
            ex.extract("画質をウルトラで撮影", None).get("quality"),
            Some(&json!("ウルトラ"))
        );
    }

    #[test]
    fn test_filename() {
        let ex = extractor();
        let params = ex.extract("写真を撮ってroof_01.jpgに保存", None);
        assert_eq!(params.get("filename"), Some(&json!("roof_01.jpg")));

        let params = ex.extract("ファイル名を「屋根」で写真", None);
        assert_eq!(params.get("filename"), Some(&json!("屋根")));
    }

    #[test]
    fn test_drone_identifiers() {
        let ex = extractor();
        assert_eq!(ex.extract("drone-01を離陸", None).get("drone_id"), Some(&json!("drone-01")));
        assert_eq!(ex.extract("ドローンA2を離陸", None).get("drone_id"), Some(&json!("A2")));
        assert_eq!(ex.extract("2番目を着陸", None).get("drone_id"), Some(&json!("2")));
        assert!(ex.extract("離陸", None).get("drone_id").is_none());
    }

    #[test]
    fn test_pattern_order_decides() {
        let ex = extractor();
        let params = ex.extract("前に2m、それから3m移動", None);
        assert_eq!(params.get("distance"), Some(&json!(300)));
        let params = ex.extract("前に2m", None);
        assert_eq!(params.get("distance"), Some(&json!(200)));
    }

    #[test]
    fn test_context_fills_gaps_only() {
        let ex = extractor();
        let mut context = CommandContext::new();
        context.insert("drone_id".to_string(), json!("drone-09"));
        context.insert("direction".to_string(), json!("back"));

        let params = ex.extract("前に2m移動", Some(&context));
        assert_eq!(params.get("direction"), Some(&json!("forward")));
        assert_eq!(params.get("drone_id"), Some(&json!("drone-09")));
    }

    #[test]
    fn test_conflicting_directions() {
        let ex = extractor();
        assert!(ex.has_conflicting_directions("前に後ろに2m移動"));
        assert!(ex.has_conflicting_directions("左右に移動"));
        assert!(!ex.has_conflicting_directions("上昇して前に移動"));
        assert!(!ex.has_conflicting_directions("前に2m移動"));
    }

    #[test]
    fn test_range_hyphen_is_not_a_sign() {
        let ex = extractor();
        let params = ex.extract("1-2m前に移動", None);
        assert_eq!(params.get("distance"), Some(&json!(200)));
        assert_eq!(ex.extract("右に30-45度回転", None).get("angle"), Some(&json!(45)));
        assert_eq!(ex.extract("前に 1.5m移動", None).get("distance"), Some(&json!(150)));
    }

    #[test]
    fn test_compound_words_are_not_directions() {
        let ex = extractor();
        let params = ex.extract("2m以下の高さで前に1m移動", None);
        assert_eq!(params.get("direction"), Some(&json!("forward")));
        assert_eq!(params.get("distance"), Some(&json!(100)));
        assert!(!ex.has_conflicting_directions("2m以下の高さで前に1m移動"));

        let params = ex.extract("離陸後に前に2m移動", None);
        assert_eq!(params.get("direction"), Some(&json!("forward")));
        assert!(!ex.has_conflicting_directions("離陸後に前に2m移動"));

        assert!(ex.extract("「屋根」という名前で撮影", None).get("direction").is_none());
        assert!(ex.extract("午後に撮影", None).get("direction").is_none());
    }

    #[test]
    fn test_particle_form_beats_bare_word() {
        let ex = extractor();
        let params = ex.extract("上昇したら右に1m移動", None);
        assert_eq!(params.get("direction"), Some(&json!("right")));
        assert_eq!(ex.extract("真上に50cm", None).get("direction"), Some(&json!("up")));
        // No particle at all still resolves through the bare word
        assert_eq!(ex.extract("50cm上昇", None).get("direction"), Some(&json!("up")));
    }

    #[test]
    fn test_kudasai_does_not_yield_direction() {
        let ex = extractor();
        assert!(ex.extract("移動して下さい", None).get("direction").is_none());
    }

    #[test]
    fn test_matches() {
        let ex = extractor();
        assert!(ex.matches("distance", "2m移動"));
        assert!(!ex.matches("distance", "移動して"));
        assert!(ex.matches("angle", "90度"));
        assert!(!ex.matches("no_such_parameter", "90度"));
    }
}
