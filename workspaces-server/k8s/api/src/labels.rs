use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
    str::FromStr,
};

/// All labels under this prefix are owned by the server and never exposed to
/// (or selectable by) end users.
pub const INTERNAL_DOMAIN: &str = "internal.workspaces.konflux-ci.dev/";

/// The workspace name chosen by its owner.
pub const DISPLAY_NAME: &str = "internal.workspaces.konflux-ci.dev/display-name";

/// The compliant username of the workspace owner.
pub const WORKSPACE_OWNER: &str = "internal.workspaces.konflux-ci.dev/owner";

/// Derived from `spec.visibility` when a workspace is cached. Never persisted.
pub const VISIBILITY: &str = "internal.workspaces.konflux-ci.dev/visibility";

/// Computed per request: whether the requesting user owns the workspace.
pub const IS_OWNER: &str = "workspaces.konflux-ci.dev/is-owner";

pub type Map = BTreeMap<String, String>;

pub type Expressions = Vec<Expression>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Expression {
    key: String,
    operator: Operator,
    values: BTreeSet<String>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Operator {
    In,
    NotIn,
    Exists,
    DoesNotExist,
}

/// Selects a set of objects by their labels.
#[derive(Clone, Debug, Eq, PartialEq, Default)]
pub struct Selector {
    match_labels: Option<Map>,
    match_expressions: Option<Expressions>,
}

#[derive(Debug, thiserror::Error, Eq, PartialEq)]
pub enum ParseError {
    #[error("empty requirement in label selector")]
    EmptyRequirement,

    #[error("invalid label key: {0:?}")]
    InvalidKey(String),

    #[error("unterminated value set in requirement: {0:?}")]
    UnterminatedSet(String),

    #[error("unexpected trailing input in requirement: {0:?}")]
    TrailingInput(String),
}

pub fn is_internal(key: &str) -> bool {
    key.starts_with(INTERNAL_DOMAIN)
}

// === Selector ===

impl Selector {
    pub fn from_expressions(exprs: Expressions) -> Self {
        Self {
            match_labels: None,
            match_expressions: Some(exprs),
        }
    }

    pub fn from_map(map: Map) -> Self {
        Self {
            match_labels: Some(map),
            match_expressions: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.match_labels.as_ref().map_or(true, |m| m.is_empty())
            && self.match_expressions.as_ref().map_or(true, |e| e.is_empty())
    }

    /// Iterates over every label key the selector places a requirement on.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        let labels = self.match_labels.iter().flat_map(|m| m.keys());
        let exprs = self.match_expressions.iter().flatten().map(|e| &e.key);
        labels.chain(exprs).map(String::as_str)
    }

    pub fn matches(&self, labels: &Map) -> bool {
        for expr in self.match_expressions.iter().flatten() {
            if !expr.matches(labels) {
                return false;
            }
        }

        if let Some(match_labels) = self.match_labels.as_ref() {
            for (k, v) in match_labels.iter() {
                if labels.get(k) != Some(v) {
                    return false;
                }
            }
        }

        true
    }

    fn push_label(&mut self, key: String, value: String) {
        self.match_labels
            .get_or_insert_with(Default::default)
            .insert(key, value);
    }

    fn push_expression(&mut self, expr: Expression) {
        self.match_expressions
            .get_or_insert_with(Default::default)
            .push(expr);
    }
}

/// Parses the Kubernetes label selector string syntax, e.g.
/// `env=prod,tier!=db,team in (a,b),!legacy`.
impl FromStr for Selector {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut selector = Self::default();
        if s.trim().is_empty() {
            return Ok(selector);
        }

        for req in split_requirements(s) {
            let req = req.trim();
            if req.is_empty() {
                return Err(ParseError::EmptyRequirement);
            }

            if let Some(key) = req.strip_prefix('!') {
                selector.push_expression(Expression::new(
                    parse_key(key)?,
                    Operator::DoesNotExist,
                    None::<String>,
                ));
            } else if let Some(open) = req.find('(') {
                let close = req
                    .rfind(')')
                    .ok_or_else(|| ParseError::UnterminatedSet(req.to_string()))?;
                if close < open {
                    return Err(ParseError::UnterminatedSet(req.to_string()));
                }
                if !req[close + 1..].trim().is_empty() {
                    return Err(ParseError::TrailingInput(req.to_string()));
                }
                let head = req[..open].trim_end();
                let (key, operator) = if let Some(key) = head.strip_suffix(" notin") {
                    (key, Operator::NotIn)
                } else if let Some(key) = head.strip_suffix(" in") {
                    (key, Operator::In)
                } else {
                    return Err(ParseError::InvalidKey(head.to_string()));
                };
                let values = req[open + 1..close]
                    .split(',')
                    .map(str::trim)
                    .filter(|v| !v.is_empty());
                selector.push_expression(Expression::new(parse_key(key)?, operator, values));
            } else if let Some((key, value)) = req.split_once("!=") {
                selector.push_expression(Expression::new(
                    parse_key(key)?,
                    Operator::NotIn,
                    Some(value.trim()),
                ));
            } else if let Some((key, value)) = req.split_once('=') {
                let value = value.strip_prefix('=').unwrap_or(value);
                selector.push_label(parse_key(key)?, value.trim().to_string());
            } else {
                selector.push_expression(Expression::new(
                    parse_key(req)?,
                    Operator::Exists,
                    None::<String>,
                ));
            }
        }

        Ok(selector)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        let mut sep = |f: &mut fmt::Formatter<'_>| {
            if !std::mem::replace(&mut first, false) {
                f.write_str(",")?;
            }
            Ok::<_, fmt::Error>(())
        };

        for (k, v) in self.match_labels.iter().flatten() {
            sep(f)?;
            write!(f, "{k}={v}")?;
        }
        for expr in self.match_expressions.iter().flatten() {
            sep(f)?;
            let values = || expr.values.iter().cloned().collect::<Vec<_>>().join(",");
            match expr.operator {
                Operator::In => write!(f, "{} in ({})", expr.key, values())?,
                Operator::NotIn => write!(f, "{} notin ({})", expr.key, values())?,
                Operator::Exists => write!(f, "{}", expr.key)?,
                Operator::DoesNotExist => write!(f, "!{}", expr.key)?,
            }
        }
        Ok(())
    }
}

impl std::iter::FromIterator<(String, String)> for Selector {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self::from_map(iter.into_iter().collect())
    }
}

impl std::iter::FromIterator<(&'static str, &'static str)> for Selector {
    fn from_iter<T: IntoIterator<Item = (&'static str, &'static str)>>(iter: T) -> Self {
        Self::from_map(
            iter.into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }
}

impl std::iter::FromIterator<Expression> for Selector {
    fn from_iter<T: IntoIterator<Item = Expression>>(iter: T) -> Self {
        Self::from_expressions(iter.into_iter().collect())
    }
}

/// Splits on commas that are not enclosed in a value set.
fn split_requirements(s: &str) -> Vec<&str> {
    let mut reqs = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in s.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                reqs.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    reqs.push(&s[start..]);
    reqs
}

fn parse_key(key: &str) -> Result<String, ParseError> {
    let key = key.trim();
    if key.is_empty() || key.contains(char::is_whitespace) || key.contains(['!', '=', '(', ')'])
    {
        return Err(ParseError::InvalidKey(key.to_string()));
    }
    Ok(key.to_string())
}

// === Expression ===

impl Expression {
    pub fn new<V: ToString>(
        key: impl Into<String>,
        operator: Operator,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        Self {
            key: key.into(),
            operator,
            values: values.into_iter().map(|v| v.to_string()).collect(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    fn matches(&self, labels: &Map) -> bool {
        match self.operator {
            Operator::In => labels
                .get(&self.key)
                .map_or(false, |v| self.values.contains(v)),
            Operator::NotIn => labels
                .get(&self.key)
                .map_or(true, |v| !self.values.contains(v)),
            Operator::Exists => labels.contains_key(&self.key),
            Operator::DoesNotExist => !labels.contains_key(&self.key),
        }
    }
}
