//! Password generation, strength scoring and vault-wide health analysis.

use std::collections::{HashMap, HashSet};

use rand::seq::SliceRandom;
use rand::{CryptoRng, Rng};
use serde::{Deserialize, Serialize};

use crate::store::ItemId;

/// Characters counted as "special" by both the generator and the scorer.
pub const SPECIAL_CHARS: &str = "!@#$%^&*()_+-=[]{}|;:,.<>?";

pub const MIN_LENGTH: usize = 8;
pub const MAX_LENGTH: usize = 128;

const COMMON_PATTERNS: &[&str] = &["123", "234", "345", "abc", "qwerty", "password", "admin"];

// ---------------------------------------------------------------------------
// Generation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PasswordPolicy {
    /// Clamped to `MIN_LENGTH..=MAX_LENGTH`.
    pub length: usize,
    pub uppercase: bool,
    pub lowercase: bool,
    pub digits: bool,
    pub special: bool,
    /// Drop look-alikes: `l`, `I`, `O`, `0`, `1`.
    pub exclude_ambiguous: bool,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            length: 16,
            uppercase: true,
            lowercase: true,
            digits: true,
            special: true,
            exclude_ambiguous: false,
        }
    }
}

/// Generate a password satisfying `policy`.
///
/// Each enabled class contributes at least one character. With no class
/// enabled the password falls back to ASCII letters and digits.
pub fn generate_password<R: Rng + CryptoRng + ?Sized>(rng: &mut R, policy: &PasswordPolicy) -> String {
    let length = policy.length.clamp(MIN_LENGTH, MAX_LENGTH);
    let ambiguous: &[char] = if policy.exclude_ambiguous {
        &['l', 'I', 'O', '0', '1']
    } else {
        &[]
    };
    let keep = |c: &char| !ambiguous.contains(c);

    let mut classes: Vec<Vec<char>> = Vec::new();
    if policy.lowercase {
        classes.push(('a'..='z').filter(keep).collect());
    }
    if policy.uppercase {
        classes.push(('A'..='Z').filter(keep).collect());
    }
    if policy.digits {
        classes.push(('0'..='9').filter(keep).collect());
    }
    if policy.special {
        classes.push(SPECIAL_CHARS.chars().collect());
    }
    if classes.is_empty() {
        classes.push(('a'..='z').chain('A'..='Z').chain('0'..='9').collect());
    }

    let pool: Vec<char> = classes.iter().flatten().copied().collect();
    let mut chars: Vec<char> = classes
        .iter()
        .filter_map(|set| set.choose(rng).copied())
        .collect();
    while chars.len() < length {
        if let Some(&c) = pool.choose(rng) {
            chars.push(c);
        }
    }
    chars.shuffle(rng);
    chars.into_iter().collect()
}

// ---------------------------------------------------------------------------
// Strength
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrengthLevel {
    Weak,
    Fair,
    Good,
    Strong,
}

impl StrengthLevel {
    fn from_score(score: u32) -> Self {
        match score {
            80.. => Self::Strong,
            60..=79 => Self::Good,
            40..=59 => Self::Fair,
            _ => Self::Weak,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrengthReport {
    pub score: u32,
    pub level: StrengthLevel,
    pub feedback: Vec<String>,
    pub length: usize,
    pub has_lowercase: bool,
    pub has_uppercase: bool,
    pub has_digits: bool,
    pub has_special: bool,
}

/// Score a password from 0 to 100 and explain what would improve it.
pub fn password_strength(password: &str) -> StrengthReport {
    let length = password.chars().count();
    if length == 0 {
        return StrengthReport {
            score: 0,
            level: StrengthLevel::Weak,
            feedback: vec!["Password is empty".to_string()],
            length: 0,
            has_lowercase: false,
            has_uppercase: false,
            has_digits: false,
            has_special: false,
        };
    }

    let mut score: i32 = 0;
    let mut feedback = Vec::new();

    score += match length {
        16.. => 30,
        12..=15 => 20,
        8..=11 => 10,
        _ => {
            feedback.push("Use at least 8 characters".to_string());
            0
        }
    };

    let has_lowercase = password.chars().any(char::is_lowercase);
    let has_uppercase = password.chars().any(char::is_uppercase);
    let has_digits = password.chars().any(|c| c.is_ascii_digit());
    let has_special = password.chars().any(|c| SPECIAL_CHARS.contains(c));

    for (present, hint) in [
        (has_lowercase, "Add lowercase letters"),
        (has_uppercase, "Add uppercase letters"),
        (has_digits, "Add numbers"),
        (has_special, "Add special characters"),
    ] {
        if present {
            score += 10;
        } else {
            feedback.push(hint.to_string());
        }
    }

    let unique = password.chars().collect::<HashSet<_>>().len();
    let ratio = unique as f64 / length as f64;
    if ratio > 0.8 {
        score += 20;
    } else if ratio > 0.6 {
        score += 15;
    } else if ratio > 0.4 {
        score += 10;
    } else {
        feedback.push("Avoid repeating characters".to_string());
    }

    let lowered = password.to_lowercase();
    if let Some(pattern) = COMMON_PATTERNS.iter().find(|p| lowered.contains(*p)) {
        score -= 10;
        feedback.push(format!("Avoid common patterns like '{pattern}'"));
    }

    if length >= 20 {
        score += 10;
    }

    let score = score.clamp(0, 100) as u32;
    if feedback.is_empty() {
        feedback.push("Password is strong!".to_string());
    }

    StrengthReport {
        score,
        level: StrengthLevel::from_score(score),
        feedback,
        length,
        has_lowercase,
        has_uppercase,
        has_digits,
        has_special,
    }
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

/// One decrypted password fed into [`analyze_health`].
#[derive(Debug, Clone)]
pub struct PasswordSample {
    pub id: ItemId,
    pub name: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRef {
    pub id: ItemId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoredItem {
    pub id: ItemId,
    pub name: String,
    pub score: u32,
    pub level: StrengthLevel,
    /// Only filled for weak items.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub feedback: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReusedGroup {
    /// First two characters followed by a fixed mask.
    pub password_preview: String,
    pub count: usize,
    pub items: Vec<ItemRef>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthLevel {
    Excellent,
    Good,
    Fair,
    Poor,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReport {
    pub overall_score: u32,
    pub overall_level: HealthLevel,
    pub total_passwords: usize,
    pub weak_count: usize,
    pub reused_count: usize,
    pub strong_count: usize,
    pub weak_passwords: Vec<ScoredItem>,
    pub reused_passwords: Vec<ReusedGroup>,
    pub strong_passwords: Vec<ScoredItem>,
    pub recommendations: Vec<String>,
}

/// Classify every password as weak or strong and group exact reuse.
pub fn analyze_health(samples: &[PasswordSample]) -> HealthReport {
    let mut weak = Vec::new();
    let mut strong = Vec::new();
    // Insertion-ordered grouping of identical passwords.
    let mut group_index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<(&str, Vec<ItemRef>)> = Vec::new();

    for sample in samples {
        let item = ItemRef {
            id: sample.id,
            name: sample.name.clone(),
        };
        match group_index.get(sample.password.as_str()) {
            Some(&i) => groups[i].1.push(item),
            None => {
                group_index.insert(&sample.password, groups.len());
                groups.push((&sample.password, vec![item]));
            }
        }

        let report = password_strength(&sample.password);
        if report.level <= StrengthLevel::Fair {
            weak.push(ScoredItem {
                id: sample.id,
                name: sample.name.clone(),
                score: report.score,
                level: report.level,
                feedback: report.feedback,
            });
        } else {
            strong.push(ScoredItem {
                id: sample.id,
                name: sample.name.clone(),
                score: report.score,
                level: report.level,
                feedback: Vec::new(),
            });
        }
    }

    let reused: Vec<ReusedGroup> = groups
        .into_iter()
        .filter(|(_, items)| items.len() > 1)
        .map(|(password, items)| ReusedGroup {
            password_preview: format!("{}******", password.chars().take(2).collect::<String>()),
            count: items.len(),
            items,
        })
        .collect();

    let total = samples.len();
    let overall_score = if total == 0 {
        100
    } else {
        let reused_items: usize = reused.iter().map(|g| g.items.len()).sum();
        let penalty = weak.len() * 10 + reused_items * 5;
        100usize.saturating_sub(penalty) as u32
    };
    let overall_level = match overall_score {
        80.. => HealthLevel::Excellent,
        60..=79 => HealthLevel::Good,
        40..=59 => HealthLevel::Fair,
        _ => HealthLevel::Poor,
    };
    let recommendations = recommendations(weak.len(), reused.len(), total);

    HealthReport {
        overall_score,
        overall_level,
        total_passwords: total,
        weak_count: weak.len(),
        reused_count: reused.len(),
        strong_count: strong.len(),
        weak_passwords: weak,
        reused_passwords: reused,
        strong_passwords: strong,
        recommendations,
    }
}

fn recommendations(weak: usize, reused: usize, total: usize) -> Vec<String> {
    if total == 0 {
        return vec!["Start storing passwords to monitor their health.".to_string()];
    }
    let mut out = Vec::new();
    if weak > 0 {
        out.push(format!("Update {weak} weak password(s) to stronger alternatives."));
    }
    if reused > 0 {
        out.push(format!("Change {reused} reused password(s) to unique ones."));
    }
    if weak == 0 && reused == 0 {
        out.push("Great job! All your passwords are strong and unique.".to_string());
    }
    out.push("Use the password generator to create strong, random passwords.".to_string());
    out.push("Consider enabling two-factor authentication where available.".to_string());
    out
}
