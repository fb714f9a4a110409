use once_cell::sync::Lazy;
use regex::Regex;

/// Category a rule's `criterion` string resolves to. Classification is a
/// case-insensitive substring check in a fixed priority order; anything
/// unrecognized falls through to `Other` and evaluates false.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleCriterion {
    Experience,
    Compensation,
    Location,
    Technology,
    Availability,
    Other(String),
}

impl RuleCriterion {
    pub fn classify(raw: &str) -> Self {
        let lowered = raw.to_lowercase();
        if lowered.contains("experience") {
            Self::Experience
        } else if lowered.contains("compensation")
            || lowered.contains("rate")
            || lowered.contains("salary")
        {
            Self::Compensation
        } else if lowered.contains("location") {
            Self::Location
        } else if lowered.contains("technology") || lowered.contains("skill") {
            Self::Technology
        } else if lowered.contains("availability") {
            Self::Availability
        } else {
            Self::Other(lowered)
        }
    }
}

/// Comparison operator extracted from a rule expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Le,
    Ge,
    Lt,
    Gt,
    Eq,
}

impl Comparison {
    pub fn holds(self, lhs: f64, rhs: f64) -> bool {
        match self {
            Self::Le => lhs <= rhs,
            Self::Ge => lhs >= rhs,
            Self::Lt => lhs < rhs,
            Self::Gt => lhs > rhs,
            Self::Eq => (lhs - rhs).abs() < f64::EPSILON,
        }
    }

    /// Exact-token mapping. A run of symbols that is not one of the known
    /// operators (e.g. `<=>` or mixed ASCII/Unicode forms) is rejected rather
    /// than guessed at.
    fn from_token(token: &str) -> Option<Self> {
        match token {
            "<=" | "≤" => Some(Self::Le),
            ">=" | "≥" => Some(Self::Ge),
            "<" => Some(Self::Lt),
            ">" => Some(Self::Gt),
            "=" | "==" => Some(Self::Eq),
            _ => None,
        }
    }
}

/// Typed parse result for one rule expression; evaluators never re-inspect the
/// raw text.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedRule {
    Experience {
        required_years: u32,
        technology: Option<String>,
    },
    Compensation {
        op: Comparison,
        threshold: u32,
    },
    Location(LocationTarget),
    Technology {
        needle: String,
    },
    Availability(AvailabilityTarget),
}

#[derive(Debug, Clone, PartialEq)]
pub enum LocationTarget {
    UsOnly,
    Remote,
    Europe,
    Contains(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum AvailabilityTarget {
    Hours { op: Comparison, hours: u32 },
    FullTime,
    PartTime,
}

/// Why a rule expression was rejected. Rejections are logged and count as a
/// failed match; they never abort the batch.
#[derive(Debug, thiserror::Error)]
pub enum RuleParseError {
    #[error("criterion '{0}' is not a recognized category")]
    UnrecognizedCriterion(String),
    #[error("expression '{expression}' has no recognized {category} phrasing")]
    UnrecognizedPhrasing {
        category: &'static str,
        expression: String,
    },
    #[error("operator '{0}' is ambiguous or malformed")]
    MalformedOperator(String),
}

static EXPERIENCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r">=?(\d+)\s*years?").expect("experience pattern compiles"));
static TECH_FILTER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"in\s+([a-z+\s]+)").expect("tech filter pattern compiles"));
static NUMBER_OP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([<>=≤≥]+)\s*\$?(\d+)").expect("comparison pattern compiles"));
static HOURS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([<>=≤≥]+)\s*(\d+)\s*hours?").expect("hours pattern compiles"));

/// Parse an expression under an already classified criterion.
pub fn parse(criterion: &RuleCriterion, expression: &str) -> Result<ParsedRule, RuleParseError> {
    let lowered = expression.to_lowercase();
    match criterion {
        RuleCriterion::Experience => parse_experience(&lowered),
        RuleCriterion::Compensation => parse_compensation(&lowered),
        RuleCriterion::Location => Ok(ParsedRule::Location(parse_location(&lowered))),
        RuleCriterion::Technology => Ok(ParsedRule::Technology {
            needle: strip_connectives(&lowered),
        }),
        RuleCriterion::Availability => parse_availability(&lowered),
        RuleCriterion::Other(raw) => Err(RuleParseError::UnrecognizedCriterion(raw.clone())),
    }
}

fn parse_experience(lowered: &str) -> Result<ParsedRule, RuleParseError> {
    let captures =
        EXPERIENCE_RE
            .captures(lowered)
            .ok_or_else(|| RuleParseError::UnrecognizedPhrasing {
                category: "experience",
                expression: lowered.to_string(),
            })?;
    let required_years = captures[1]
        .parse::<u32>()
        .map_err(|_| RuleParseError::UnrecognizedPhrasing {
            category: "experience",
            expression: lowered.to_string(),
        })?;

    let technology = TECH_FILTER_RE
        .captures(lowered)
        .map(|captures| captures[1].trim().to_string())
        .filter(|tech| !tech.is_empty());

    Ok(ParsedRule::Experience {
        required_years,
        technology,
    })
}

fn parse_compensation(lowered: &str) -> Result<ParsedRule, RuleParseError> {
    let captures =
        NUMBER_OP_RE
            .captures(lowered)
            .ok_or_else(|| RuleParseError::UnrecognizedPhrasing {
                category: "compensation",
                expression: lowered.to_string(),
            })?;
    let op = Comparison::from_token(&captures[1])
        .ok_or_else(|| RuleParseError::MalformedOperator(captures[1].to_string()))?;
    let threshold = captures[2]
        .parse::<u32>()
        .map_err(|_| RuleParseError::UnrecognizedPhrasing {
            category: "compensation",
            expression: lowered.to_string(),
        })?;

    Ok(ParsedRule::Compensation { op, threshold })
}

fn parse_location(lowered: &str) -> LocationTarget {
    if lowered.contains("us") && lowered.contains("only") {
        LocationTarget::UsOnly
    } else if lowered.contains("remote") {
        LocationTarget::Remote
    } else if lowered.contains("europe") {
        LocationTarget::Europe
    } else {
        LocationTarget::Contains(lowered.to_string())
    }
}

fn parse_availability(lowered: &str) -> Result<ParsedRule, RuleParseError> {
    if let Some(captures) = HOURS_RE.captures(lowered) {
        let op = Comparison::from_token(&captures[1])
            .ok_or_else(|| RuleParseError::MalformedOperator(captures[1].to_string()))?;
        let hours = captures[2]
            .parse::<u32>()
            .map_err(|_| RuleParseError::UnrecognizedPhrasing {
                category: "availability",
                expression: lowered.to_string(),
            })?;
        return Ok(ParsedRule::Availability(AvailabilityTarget::Hours {
            op,
            hours,
        }));
    }

    if lowered.contains("full-time") {
        Ok(ParsedRule::Availability(AvailabilityTarget::FullTime))
    } else if lowered.contains("part-time") {
        Ok(ParsedRule::Availability(AvailabilityTarget::PartTime))
    } else {
        Err(RuleParseError::UnrecognizedPhrasing {
            category: "availability",
            expression: lowered.to_string(),
        })
    }
}

/// Drop connective keywords ("has Python experience" -> "python") before the
/// substring containment check against collected technology tokens.
fn strip_connectives(lowered: &str) -> String {
    let mut stripped = lowered.to_string();
    for keyword in ["has", "experience", "with", "in"] {
        stripped = stripped.replace(keyword, "");
    }
    stripped.trim().to_string()
}
