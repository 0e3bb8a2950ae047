//! Drone action definitions
//!
//! The action table is plain data: adding an action means adding an entry
//! here, the matcher and evaluator pick it up by its identifier.

use serde::{Deserialize, Serialize};

/// How strict the execution bar is for an action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SafetyClass {
    Normal,
    /// Actions whose misfire is dangerous (takeoff, landing, emergency stop)
    Critical,
}

/// Static description of a drone action
#[derive(Debug, Clone, Copy)]
pub struct ActionSpec {
    /// Canonical action identifier
    pub action: &'static str,
    /// Match patterns (regular expressions, case-insensitive), in priority order.
    /// Plain-text patterns score as literal hits; ASCII patterns match whole words.
    pub patterns: &'static [&'static str],
    /// Surface or base forms that reinforce a pattern hit
    pub morphemes: &'static [&'static str],
    /// Parameters that must be present before the action may execute
    pub required_parameters: &'static [&'static str],
    /// Parameters the action accepts but does not need
    pub optional_parameters: &'static [&'static str],
    pub safety_class: SafetyClass,
}

impl ActionSpec {
    /// Whether `parameter` belongs to this action's parameter schema
    pub fn accepts(&self, parameter: &str) -> bool {
        self.required_parameters.contains(&parameter)
            || self.optional_parameters.contains(&parameter)
    }

    pub fn requires(&self, parameter: &str) -> bool {
        self.required_parameters.contains(&parameter)
    }

    pub fn is_critical(&self) -> bool {
        self.safety_class == SafetyClass::Critical
    }
}

/// All known actions. Order matters: on equal confidence the earlier entry wins.
pub const ACTIONS: &[ActionSpec] = &[
    ActionSpec {
        action: "emergency_stop",
        patterns: &[
            "緊急停止",
            "緊急",
            "停止",
            "止ま(れ|って)",
            "止めて",
            "止めろ",
            "ストップ",
            "emergency",
            "stop",
        ],
        morphemes: &["緊急停止", "緊急", "停止", "止まる", "ストップ"],
        required_parameters: &[],
        optional_parameters: &["drone_id"],
        safety_class: SafetyClass::Critical,
    },
    ActionSpec {
        action: "takeoff",
        patterns: &["離陸", "飛び立", "飛んで", "テイクオフ", "take ?off"],
        morphemes: &["離陸", "飛ぶ", "上がる", "飛び立つ"],
        required_parameters: &[],
        optional_parameters: &["height", "drone_id"],
        safety_class: SafetyClass::Critical,
    },
    ActionSpec {
        action: "land",
        patterns: &["着陸", "降り(て|ろ|る)", "ランディング", "land"],
        morphemes: &["着陸", "降りる"],
        required_parameters: &[],
        optional_parameters: &["drone_id"],
        safety_class: SafetyClass::Critical,
    },
    ActionSpec {
        action: "move",
        patterns: &[
            "移動",
            "前進",
            "後退",
            "進(んで|め|む)",
            "動(いて|け|かして)",
            "行(って|け)",
            "後ろに下が",
            "後ろへ下が",
            "後方に下が",
            "move",
        ],
        morphemes: &["移動", "前進", "後退", "進む", "動く", "行く", "下がる"],
        required_parameters: &["direction", "distance"],
        optional_parameters: &["drone_id"],
        safety_class: SafetyClass::Normal,
    },
    ActionSpec {
        action: "rotate",
        patterns: &["回転", "旋回", "回(って|れ|して)", "rotate", "turn"],
        morphemes: &["回転", "旋回", "回る", "回す"],
        required_parameters: &["direction", "angle"],
        optional_parameters: &["drone_id"],
        safety_class: SafetyClass::Normal,
    },
    ActionSpec {
        action: "altitude",
        patterns: &[
            "高度",
            "上昇",
            "下降",
            "高さ",
            "上が(って|れ)",
            "下が(って|れ)",
            "ascend",
            "descend",
        ],
        morphemes: &["高度", "上昇", "下降", "上がる", "下がる"],
        required_parameters: &["height"],
        optional_parameters: &["direction", "drone_id"],
        safety_class: SafetyClass::Normal,
    },
    ActionSpec {
        action: "photo",
        patterns: &[
            "写真",
            "撮影",
            "撮(って|れ|る)",
            "キャプチャ",
            "photo",
            "picture",
        ],
        morphemes: &["写真", "撮影", "撮る"],
        required_parameters: &[],
        optional_parameters: &["quality", "filename", "drone_id"],
        safety_class: SafetyClass::Normal,
    },
    ActionSpec {
        action: "detection",
        patterns: &["検出", "検知", "認識", "detect"],
        morphemes: &["検出", "検知", "認識"],
        required_parameters: &[],
        optional_parameters: &["drone_id"],
        safety_class: SafetyClass::Normal,
    },
    ActionSpec {
        action: "tracking",
        patterns: &["追跡", "追尾", "追いかけ", "追って", "track", "follow"],
        morphemes: &["追跡", "追尾", "追う"],
        required_parameters: &[],
        optional_parameters: &["drone_id"],
        safety_class: SafetyClass::Normal,
    },
    ActionSpec {
        action: "status",
        patterns: &["状態", "ステータス", "バッテリー", "status"],
        morphemes: &["状態", "ステータス", "バッテリー"],
        required_parameters: &[],
        optional_parameters: &["drone_id"],
        safety_class: SafetyClass::Normal,
    },
    ActionSpec {
        action: "disconnect",
        patterns: &["切断", "接続解除", "接続を解除", "切って", "disconnect"],
        morphemes: &["切断", "解除", "切る"],
        required_parameters: &[],
        optional_parameters: &["drone_id"],
        safety_class: SafetyClass::Normal,
    },
    ActionSpec {
        action: "connect",
        patterns: &["接続", "つな(いで|げて)", "connect"],
        morphemes: &["接続"],
        required_parameters: &[],
        optional_parameters: &["drone_id"],
        safety_class: SafetyClass::Normal,
    },
];

/// Look up an action by its canonical identifier
pub fn find_action(action: &str) -> Option<&'static ActionSpec> {
    ACTIONS.iter().find(|spec| spec.action == action)
}
