//! Filter expressions evaluated against a single record title.
//!
//! Supported grammar (a subset of the engine's filter language):
//!
//! ```text
//! filter  := run*
//! run     := prefix? (literal | "[" step+ "]")
//! prefix  := "+" | "-" | "~" | "="
//! literal := "[[" text "]]" | "\"" text "\"" | "'" text "'" | word
//! step    := "!"? operator "[" param "]"
//! ```
//!
//! Operators: `title`, `prefix`, `suffix`, `search` (case-insensitive
//! substring), `regexp`. Steps inside one bracket run are ANDed.
//!
//! Runs combine like the engine's: a plain run ORs its output into the
//! result, `-` removes its output, `+` re-filters the accumulated result
//! and `~` only applies when the result is still empty.

use regex::Regex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FilterError {
    #[error("unterminated {0} in filter `{1}`")]
    Unterminated(&'static str, String),

    #[error("unknown filter operator `{0}`")]
    UnknownOperator(String),

    #[error("invalid regexp `{0}`: {1}")]
    Regex(String, #[source] regex::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunPrefix {
    Or,
    And,
    Except,
    Else,
}

#[derive(Debug)]
enum Operator {
    Title(String),
    Prefix(String),
    Suffix(String),
    Search(String),
    Regexp(Regex),
}

#[derive(Debug)]
struct Step {
    negate: bool,
    op: Operator,
}

#[derive(Debug)]
enum RunBody {
    Literal(String),
    Steps(Vec<Step>),
}

#[derive(Debug)]
struct Run {
    prefix: RunPrefix,
    body: RunBody,
}

/// A parsed filter expression.
#[derive(Debug)]
pub struct Filter {
    runs: Vec<Run>,
}

impl Filter {
    /// Parse a filter expression.
    pub fn parse(expr: &str) -> Result<Self, FilterError> {
        let mut runs = Vec::new();
        let mut rest = expr.trim_start();

        while !rest.is_empty() {
            let (prefix, after) = match rest.as_bytes()[0] {
                b'+' => (RunPrefix::And, &rest[1..]),
                b'-' => (RunPrefix::Except, &rest[1..]),
                b'~' => (RunPrefix::Else, &rest[1..]),
                b'=' => (RunPrefix::Or, &rest[1..]),
                _ => (RunPrefix::Or, rest),
            };
            let (body, tail) = parse_run_body(after, expr)?;
            runs.push(Run { prefix, body });
            rest = tail.trim_start();
        }

        Ok(Self { runs })
    }

    /// Whether `title` survives the filter when it is the only input.
    pub fn matches(&self, title: &str) -> bool {
        let mut result: Vec<String> = Vec::new();

        for run in &self.runs {
            match run.prefix {
                RunPrefix::Or => {
                    for out in run.evaluate(&[title]) {
                        if !result.contains(&out) {
                            result.push(out);
                        }
                    }
                }
                RunPrefix::Except => {
                    let removed = run.evaluate(&[title]);
                    result.retain(|t| !removed.contains(t));
                }
                RunPrefix::And => {
                    let input: Vec<&str> = result.iter().map(String::as_str).collect();
                    result = run.evaluate(&input);
                }
                RunPrefix::Else => {
                    if result.is_empty() {
                        result = run.evaluate(&[title]);
                    }
                }
            }
        }

        result.iter().any(|t| t == title)
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }
}

impl Run {
    fn evaluate(&self, input: &[&str]) -> Vec<String> {
        match &self.body {
            RunBody::Literal(text) => vec![text.clone()],
            RunBody::Steps(steps) => input
                .iter()
                .filter(|title| steps.iter().all(|step| step.accepts(title)))
                .map(|title| title.to_string())
                .collect(),
        }
    }
}

impl Step {
    fn accepts(&self, title: &str) -> bool {
        let hit = match &self.op {
            Operator::Title(param) => title == param,
            Operator::Prefix(param) => title.starts_with(param.as_str()),
            Operator::Suffix(param) => title.ends_with(param.as_str()),
            Operator::Search(param) => title.to_lowercase().contains(&param.to_lowercase()),
            Operator::Regexp(re) => re.is_match(title),
        };
        hit != self.negate
    }
}

fn parse_run_body<'a>(input: &'a str, expr: &str) -> Result<(RunBody, &'a str), FilterError> {
    if let Some(body) = input.strip_prefix("[[") {
        let end = body
            .find("]]")
            .ok_or_else(|| FilterError::Unterminated("[[", expr.to_string()))?;
        return Ok((RunBody::Literal(body[..end].to_string()), &body[end + 2..]));
    }

    if let Some(body) = input.strip_prefix('[') {
        let (steps, tail) = parse_steps(body, expr)?;
        return Ok((RunBody::Steps(steps), tail));
    }

    for quote in ['"', '\''] {
        if let Some(body) = input.strip_prefix(quote) {
            let end = body
                .find(quote)
                .ok_or_else(|| FilterError::Unterminated("quote", expr.to_string()))?;
            return Ok((RunBody::Literal(body[..end].to_string()), &body[end + 1..]));
        }
    }

    let end = input.find(char::is_whitespace).unwrap_or(input.len());
    Ok((RunBody::Literal(input[..end].to_string()), &input[end..]))
}

/// Parse `op[param]op[param]...]`, consuming the closing bracket.
fn parse_steps<'a>(mut input: &'a str, expr: &str) -> Result<(Vec<Step>, &'a str), FilterError> {
    let mut steps = Vec::new();

    loop {
        if let Some(tail) = input.strip_prefix(']') {
            return Ok((steps, tail));
        }

        let (negate, body) = match input.strip_prefix('!') {
            Some(body) => (true, body),
            None => (false, input),
        };

        let open = body
            .find('[')
            .ok_or_else(|| FilterError::Unterminated("[", expr.to_string()))?;
        let name = body[..open].trim();
        let after = &body[open + 1..];
        let close = after
            .find(']')
            .ok_or_else(|| FilterError::Unterminated("[", expr.to_string()))?;
        let param = after[..close].to_string();

        let op = match name {
            "" | "title" => Operator::Title(param),
            "prefix" => Operator::Prefix(param),
            "suffix" => Operator::Suffix(param),
            "search" => Operator::Search(param),
            "regexp" => {
                let re = Regex::new(&param).map_err(|e| FilterError::Regex(param.clone(), e))?;
                Operator::Regexp(re)
            }
            other => return Err(FilterError::UnknownOperator(other.to_string())),
        };
        steps.push(Step { negate, op });
        input = &after[close + 1..];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TITLE: &str = "$:/plugins/me/foo";

    fn filter_matches(title: &str, expr: &str) -> Result<bool, FilterError> {
        Ok(Filter::parse(expr)?.matches(title))
    }

    #[test]
    fn test_empty_filter_matches_nothing() {
        assert!(!filter_matches(TITLE, "").unwrap());
        assert!(Filter::parse("   ").unwrap().is_empty());
    }

    #[test]
    fn test_literal_runs() {
        assert!(filter_matches(TITLE, "[[$:/plugins/me/foo]]").unwrap());
        assert!(filter_matches(TITLE, "other $:/plugins/me/foo").unwrap());
        assert!(!filter_matches(TITLE, "[[$:/plugins/me/bar]]").unwrap());
    }

    #[test]
    fn test_operators() {
        assert!(filter_matches(TITLE, "[prefix[$:/plugins/me/]]").unwrap());
        assert!(filter_matches(TITLE, "[suffix[/foo]]").unwrap());
        assert!(filter_matches(TITLE, "[search[ME/FO]]").unwrap());
        assert!(filter_matches(TITLE, "[regexp[f.o$]]").unwrap());
        assert!(filter_matches(TITLE, "[title[$:/plugins/me/foo]]").unwrap());
        assert!(!filter_matches(TITLE, "[prefix[$:/core]]").unwrap());
    }

    #[test]
    fn test_steps_are_anded_and_negatable() {
        assert!(filter_matches(TITLE, "[prefix[$:/plugins/]suffix[foo]]").unwrap());
        assert!(!filter_matches(TITLE, "[prefix[$:/plugins/]suffix[bar]]").unwrap());
        assert!(filter_matches(TITLE, "[prefix[$:/plugins/]!suffix[bar]]").unwrap());
    }

    #[test]
    fn test_run_prefixes() {
        assert!(!filter_matches(TITLE, "[prefix[$:/plugins/]] -[suffix[foo]]").unwrap());
        assert!(filter_matches(TITLE, "[prefix[$:/plugins/]] +[suffix[foo]]").unwrap());
        assert!(!filter_matches(TITLE, "[prefix[$:/plugins/]] +[suffix[bar]]").unwrap());
        assert!(filter_matches(TITLE, "[prefix[nope]] ~[suffix[foo]]").unwrap());
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            Filter::parse("[is[draft]]"),
            Err(FilterError::UnknownOperator(op)) if op == "is"
        ));
        assert!(matches!(
            Filter::parse("[[open"),
            Err(FilterError::Unterminated(..))
        ));
        assert!(matches!(
            Filter::parse("[regexp[(]]"),
            Err(FilterError::Regex(..))
        ));
    }
}
